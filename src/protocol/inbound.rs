//! Decoding of lines sent by the device.

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Kind of status line reported by the firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusKind {
    Ack,
    Err,
    Info,
}

/// One decoded line from the device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceMessage {
    /// `CALIB_P:<int>` raw pressure while the calibration stream is on
    CalibrationPressure { value: i32 },
    /// `P:<text>` runtime pressure readout, passed through for display
    Pressure { text: String },
    /// `JOY:<x>,<y>` centred joystick position
    Joystick { x: i32, y: i32 },
    /// `ACK:` / `ERR:` / `INFO:` status line, kept verbatim
    Status { kind: StatusKind, line: String },
    /// Anything else
    Unknown { line: String },
}

/// Decode one line (surrounding whitespace is ignored)
///
/// Returns `Ok(None)` for blank lines. Known prefixes with an unusable
/// payload are errors; callers drop such lines.
pub fn parse_line(raw: &str) -> Result<Option<DeviceMessage>, ProtocolError> {
    let line = raw.trim();
    if line.is_empty() {
        return Ok(None);
    }

    if let Some(payload) = line.strip_prefix("CALIB_P:") {
        let value = parse_int("CALIB_P", payload)?;
        return Ok(Some(DeviceMessage::CalibrationPressure { value }));
    }

    if let Some(payload) = line.strip_prefix("P:") {
        return Ok(Some(DeviceMessage::Pressure {
            text: payload.trim().to_string(),
        }));
    }

    if let Some(payload) = line.strip_prefix("JOY:") {
        let (x, y) = payload
            .split_once(',')
            .ok_or_else(|| ProtocolError::MalformedLine {
                line: line.to_string(),
                reason: "expected JOY:<x>,<y>".to_string(),
            })?;
        let x = parse_int("JOY.x", x)?;
        let y = parse_int("JOY.y", y)?;
        return Ok(Some(DeviceMessage::Joystick { x, y }));
    }

    let status = [
        ("ACK:", StatusKind::Ack),
        ("ERR:", StatusKind::Err),
        ("INFO:", StatusKind::Info),
    ];
    for (prefix, kind) in status {
        if line.starts_with(prefix) {
            return Ok(Some(DeviceMessage::Status {
                kind,
                line: line.to_string(),
            }));
        }
    }

    Ok(Some(DeviceMessage::Unknown {
        line: line.to_string(),
    }))
}

/// Decode raw bytes read from the port, skipping invalid UTF-8
pub fn parse_bytes(raw: &[u8]) -> Result<Option<DeviceMessage>, ProtocolError> {
    parse_line(&decode_skipping_invalid(raw))
}

/// Keep the valid UTF-8 runs of `raw`, dropping the bytes between them
fn decode_skipping_invalid(mut raw: &[u8]) -> String {
    let mut out = String::with_capacity(raw.len());
    loop {
        match std::str::from_utf8(raw) {
            Ok(valid) => {
                out.push_str(valid);
                return out;
            }
            Err(err) => {
                let (valid, rest) = raw.split_at(err.valid_up_to());
                out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                let skip = err.error_len().unwrap_or(rest.len());
                raw = &rest[skip..];
            }
        }
    }
}

fn parse_int(field: &str, value: &str) -> Result<i32, ProtocolError> {
    value
        .trim()
        .parse::<i32>()
        .map_err(|_| ProtocolError::InvalidNumber {
            field: field.to_string(),
            value: value.to_string(),
        })
}

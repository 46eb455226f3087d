//! Key name to firmware key code mapping.
//!
//! Printable single characters are sent as their byte value. Named keys use
//! the HID-keyboard codes the firmware expects.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::error::ProtocolError;

/// Code sent for a space, and for an unused second sector key
pub const SPACE: u8 = 32;

static SPECIAL_KEYS: Lazy<HashMap<&'static str, u8>> = Lazy::new(|| {
    HashMap::from([
        ("enter", 0xB0),
        ("esc", 0xB1),
        ("backspace", 0xB2),
        ("tab", 0xB3),
        ("space", SPACE),
        ("insert", 0xD1),
        ("delete", 0xD4),
        ("right", 0xD7),
        ("left", 0xD8),
        ("down", 0xD9),
        ("up", 0xDA),
        ("pageup", 0xD3),
        ("pagedown", 0xD6),
        ("home", 0xD2),
        ("end", 0xD5),
        ("capslock", 0xC1),
        ("f1", 0xC2),
        ("f2", 0xC3),
        ("f3", 0xC4),
        ("f4", 0xC5),
        ("f5", 0xC6),
        ("f6", 0xC7),
        ("f7", 0xC8),
        ("f8", 0xC9),
        ("f9", 0xCA),
        ("f10", 0xCB),
        ("f11", 0xCC),
        ("f12", 0xCD),
        // bare modifiers map to the left-hand keys
        ("shift", 0x81),
        ("ctrl", 0x80),
        ("alt", 0x82),
        ("win", 0x83),
        ("lshift", 0x81),
        ("lctrl", 0x80),
        ("lalt", 0x82),
        ("lwin", 0x83),
        ("rshift", 0x85),
        ("rctrl", 0x84),
        ("ralt", 0x86),
        ("rwin", 0x87),
    ])
});

/// Resolve one key binding
///
/// A literal `" "` is a space. Otherwise the string is trimmed and
/// lowercased; named keys are looked up, a single character maps to its
/// code point. Empty keys, unknown multi-character names and characters
/// above U+00FF (which do not fit the firmware's byte) yield `None`.
pub fn key_code(key: &str) -> Option<u8> {
    if key == " " {
        return Some(SPACE);
    }

    let normalized = key.trim().to_lowercase();
    if normalized.is_empty() {
        return None;
    }
    if let Some(&code) = SPECIAL_KEYS.get(normalized.as_str()) {
        return Some(code);
    }

    let mut chars = normalized.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => u8::try_from(u32::from(c)).ok(),
        _ => None,
    }
}

/// Resolve a sector binding of one or two whitespace separated keys
///
/// A missing second key is sent as a space.
pub fn sector_key_codes(sector: usize, binding: &str) -> Result<(u8, u8), ProtocolError> {
    let slot = format!("Sector {}", sector + 1);
    let normalized = binding.trim().to_lowercase();
    let mut parts = normalized.splitn(2, char::is_whitespace);

    let first = parts.next().filter(|s| !s.is_empty()).ok_or_else(|| {
        ProtocolError::InvalidKey {
            slot: slot.clone(),
            key: binding.to_string(),
        }
    })?;
    let second = parts.next().map(str::trim).unwrap_or(" ");

    let code1 = key_code(first).ok_or_else(|| ProtocolError::InvalidKey {
        slot: slot.clone(),
        key: first.to_string(),
    })?;
    let code2 = if second.is_empty() {
        SPACE
    } else {
        key_code(second).ok_or_else(|| ProtocolError::InvalidKey {
            slot,
            key: second.to_string(),
        })?
    };

    Ok((code1, code2))
}

//! Device line protocol.
//!
//! The firmware speaks newline-terminated ASCII in both directions. This
//! module only encodes and decodes lines; opening the port and reading
//! lines is left to the transport.

pub mod commands;
pub mod inbound;
pub mod keycodes;
pub mod schedule;

pub use commands::{apply_all_plan, keyboard_plan, DeviceCommand};
pub use inbound::{parse_bytes, parse_line, DeviceMessage, StatusKind};
pub use keycodes::{key_code, sector_key_codes};
pub use schedule::{connect_schedule, pace, ConnectSchedule, ScheduledCommand};

//! Bulk (system exclusive) frames
//!
//! Frame format, delimiters excluded:
//! - VENDOR (3 bytes): 00 00 66
//! - UNIT (1 byte): 0x14 main unit, 0x15 extender
//! - TYPE (1 byte): message type
//! - PAYLOAD: type-specific data

use serde::Serialize;
use thiserror::Error;

use crate::midi::MidiMessage;

/// Manufacturer id prefix
pub const VENDOR: [u8; 3] = [0x00, 0x00, 0x66];

/// Vendor + unit + type
pub const HEADER_LEN: usize = VENDOR.len() + 2;

/// Errors raised while parsing a bulk frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("frame too short ({0} bytes)")]
    TooShort(usize),
    #[error("vendor prefix mismatch")]
    VendorMismatch,
    #[error("unknown unit id 0x{0:02X}")]
    UnknownUnit(u8),
}

/// Unit id byte addressing the main unit or an extender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitId {
    #[default]
    Base = 0x14,
    Extender = 0x15,
}

impl TryFrom<u8> for UnitId {
    type Error = FrameError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x14 => Ok(UnitId::Base),
            0x15 => Ok(UnitId::Extender),
            other => Err(FrameError::UnknownUnit(other)),
        }
    }
}

/// Message type byte
pub mod frame_type {
    pub const TRANSPORT_CLICK: u8 = 10;
    /// 0..127 minutes
    pub const BACKLIGHT_TIMEOUT: u8 = 11;
    pub const TOUCHLESS_FADER: u8 = 12;
    /// strip, 0..5
    pub const TOUCH_SENSITIVITY: u8 = 14;
    pub const TIME_DISPLAY: u8 = 16;
    pub const MODE_DISPLAY: u8 = 17;
    /// offset, characters
    pub const DISPLAY: u8 = 18;
    pub const VERSION: u8 = 19;
    pub const VERSION_REPLY: u8 = 20;
    pub const METER_MODE: u8 = 32;
    pub const METER_ORIENTATION: u8 = 33;
    pub const FADER_HOME: u8 = 97;
    pub const LEDS_OFF: u8 = 98;
    pub const RESET: u8 = 99;
}

/// A validated bulk frame borrowing the message payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkFrame<'a> {
    pub unit: UnitId,
    pub kind: u8,
    pub payload: &'a [u8],
}

impl<'a> BulkFrame<'a> {
    /// Parse the bytes between the SysEx delimiters
    pub fn parse(data: &'a [u8]) -> Result<Self, FrameError> {
        if data.len() < HEADER_LEN {
            return Err(FrameError::TooShort(data.len()));
        }

        if data[..VENDOR.len()] != VENDOR {
            return Err(FrameError::VendorMismatch);
        }

        let unit = UnitId::try_from(data[VENDOR.len()])?;

        Ok(Self {
            unit,
            kind: data[VENDOR.len() + 1],
            payload: &data[HEADER_LEN..],
        })
    }

    /// Build the SysEx message for a frame
    pub fn message(unit: UnitId, kind: u8, payload: &[u8]) -> MidiMessage {
        let mut data = Vec::with_capacity(HEADER_LEN + payload.len());
        data.extend_from_slice(&VENDOR);
        data.push(unit as u8);
        data.push(kind);
        data.extend_from_slice(payload);
        MidiMessage::SysEx { data }
    }
}

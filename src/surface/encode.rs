//! Outbound message builders
//!
//! Every builder is a pure function returning the complete wire message, or
//! `None` when the request addresses something that does not exist (strip
//! above 7, function key above F16, ...). The value scales shared with the
//! decoder live here too so both directions stay in step.

use serde::Serialize;

use super::addr::{
    cc, note, AssignButton, AutomationButton, BankButton, GlobalButton, MarkerButton,
    ModifierButton, NavigationButton, StripButton, TransportButton, UtilityButton,
    CONTROL_CHANNEL, FUNCTION_KEYS, HEARTBEAT_CHANNEL, HEARTBEAT_NOTE, MAIN_FADER_CHANNEL, STRIPS,
    VELOCITY_OFF, VELOCITY_ON,
};
use super::display::{DisplayBuffer, BLOCK_WIDTH, ROWS};
use super::frame::{frame_type, BulkFrame, UnitId};
use super::state::VPotMode;
use super::time::{ASSIGNMENT_DIGITS, TIME_DIGITS};
use crate::midi::MidiMessage;

/// Pitch bend span of a fader; the top 16 steps are never sent
pub const FADER_RANGE: i16 = 16368;

const FADER_MIN: i16 = -8192;
const FADER_MAX: i16 = FADER_MIN + FADER_RANGE;

/// Highest meter nibble carrying a level
pub const METER_STEPS: u8 = 12;
pub const METER_FULL: u8 = 13;
pub const METER_OVERLOAD_SET: u8 = 14;
pub const METER_OVERLOAD_CLEAR: u8 = 15;

/// Relative steps above this do not fit the 6-bit magnitude
pub const MAX_ROTATION_STEPS: u8 = 63;
const COUNTER_CLOCKWISE: u8 = 0x40;

/// Pitch bend value to fader fraction
pub fn fader_fraction(value: i16) -> f32 {
    let clamped = value.clamp(FADER_MIN, FADER_MAX);
    (clamped - FADER_MIN) as f32 / FADER_RANGE as f32
}

fn fader_value(fraction: f32) -> i16 {
    (fraction.clamp(0.0, 1.0) * FADER_RANGE as f32).round() as i16 + FADER_MIN
}

/// Meter nibble 0-13 to level fraction
pub fn meter_level(nibble: u8) -> Option<f32> {
    match nibble {
        0..=METER_STEPS => Some(nibble as f32 / METER_STEPS as f32),
        METER_FULL => Some(1.0),
        _ => None,
    }
}

fn strip_index(strip: u8) -> Option<u8> {
    ((strip as usize) < STRIPS).then_some(strip)
}

fn note_message(note: u8, on: bool) -> MidiMessage {
    if on {
        MidiMessage::NoteOn {
            channel: CONTROL_CHANNEL,
            note,
            velocity: VELOCITY_ON,
        }
    } else {
        MidiMessage::NoteOff {
            channel: CONTROL_CHANNEL,
            note,
            velocity: VELOCITY_OFF,
        }
    }
}

fn control(controller: u8, value: u8) -> Option<MidiMessage> {
    (value <= 0x7F).then_some(MidiMessage::ControlChange {
        channel: CONTROL_CHANNEL,
        cc: controller,
        value,
    })
}

fn relative(steps: i8) -> Option<u8> {
    let magnitude = steps.unsigned_abs();
    if magnitude == 0 || magnitude > MAX_ROTATION_STEPS {
        return None;
    }
    Some(if steps < 0 { COUNTER_CLOCKWISE | magnitude } else { magnitude })
}

/// Meter level, rounded down to the nearest of 12 steps
pub fn encode_meter(strip: u8, fraction: f32) -> Option<MidiMessage> {
    let strip = strip_index(strip)?;
    let level = (fraction.clamp(0.0, 1.0) * METER_STEPS as f32).floor() as u8;
    Some(MidiMessage::ChannelPressure {
        channel: CONTROL_CHANNEL,
        pressure: strip << 4 | level,
    })
}

pub fn encode_meter_overload(strip: u8, overload: bool) -> Option<MidiMessage> {
    let strip = strip_index(strip)?;
    let nibble = if overload { METER_OVERLOAD_SET } else { METER_OVERLOAD_CLEAR };
    Some(MidiMessage::ChannelPressure {
        channel: CONTROL_CHANNEL,
        pressure: strip << 4 | nibble,
    })
}

pub fn encode_strip_fader(strip: u8, fraction: f32) -> Option<MidiMessage> {
    let channel = strip_index(strip)?;
    Some(MidiMessage::PitchBend {
        channel,
        value: fader_value(fraction),
    })
}

pub fn encode_main_fader(fraction: f32) -> Option<MidiMessage> {
    Some(MidiMessage::PitchBend {
        channel: MAIN_FADER_CHANNEL,
        value: fader_value(fraction),
    })
}

/// Seven characters of strip text on the main unit
pub fn encode_text(strip: u8, row: u8, text: &str) -> Option<MidiMessage> {
    encode_text_for(UnitId::Base, strip, row, text)
}

/// Seven characters of strip text, padded with spaces or truncated
pub fn encode_text_for(unit: UnitId, strip: u8, row: u8, text: &str) -> Option<MidiMessage> {
    let strip = strip_index(strip)? as usize;
    if row as usize >= ROWS {
        return None;
    }

    let mut payload = Vec::with_capacity(1 + BLOCK_WIDTH);
    payload.push(DisplayBuffer::offset(strip, row as usize) as u8);
    payload.extend(
        text.chars()
            .map(|c| if c.is_ascii() && !c.is_ascii_control() { c as u8 } else { b'?' })
            .chain(std::iter::repeat(b' '))
            .take(BLOCK_WIDTH),
    );

    Some(BulkFrame::message(unit, frame_type::DISPLAY, &payload))
}

/// LED ring display style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RingMode {
    /// One LED at the position
    #[default]
    Single = 0,
    /// Lit from the center towards the position
    Boost = 1,
    /// Lit from the left edge up to the position
    Bar = 2,
    /// Lit symmetrically out from the center
    Spread = 3,
}

impl RingMode {
    fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => RingMode::Single,
            1 => RingMode::Boost,
            2 => RingMode::Bar,
            _ => RingMode::Spread,
        }
    }
}

/// Packed LED ring controller value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RotaryLed {
    pub ring: RingMode,
    /// 0 = off, 1-11 = LED position
    pub position: u8,
    pub center: bool,
}

impl RotaryLed {
    pub fn from_byte(raw: u8) -> Self {
        Self {
            ring: RingMode::from_bits(raw >> 4),
            position: raw & 0x0F,
            center: raw & 0x40 != 0,
        }
    }

    pub fn to_byte(self) -> u8 {
        (self.center as u8) << 6 | (self.ring as u8) << 4 | (self.position & 0x0F)
    }

    /// Display mode and value the ring shows
    pub fn decode(self) -> (VPotMode, f32) {
        let p = self.position as f32;
        match (self.position, self.ring) {
            (0, _) => (VPotMode::Off, 0.0),
            (_, RingMode::Single | RingMode::Bar) => (VPotMode::Bar, p / 11.0),
            (_, RingMode::Spread) => (VPotMode::Bar, p / 6.0),
            (position, RingMode::Boost) if position < 6 => (VPotMode::Pan, -(6.0 - p) / 5.0),
            (_, RingMode::Boost) => (VPotMode::Pan, (p - 6.0) / 5.0),
        }
    }
}

impl From<RotaryLed> for u8 {
    fn from(led: RotaryLed) -> Self {
        led.to_byte()
    }
}

/// LED ring of a strip, `raw` as packed by `RotaryLed::to_byte`
pub fn encode_rotary_led(strip: u8, raw: u8) -> Option<MidiMessage> {
    control(cc::VPOT_LED + strip_index(strip)?, raw)
}

/// Relative encoder turn, negative = counter-clockwise
pub fn encode_vpot_rotation(strip: u8, steps: i8) -> Option<MidiMessage> {
    control(cc::VPOT_ROTATION + strip_index(strip)?, relative(steps)?)
}

/// Jog wheel turn, negative = counter-clockwise
pub fn encode_jog(steps: i8) -> Option<MidiMessage> {
    control(cc::JOG, relative(steps)?)
}

/// Raw 7-segment byte for a time digit, position 0 = rightmost
pub fn encode_time_digit(position: u8, raw: u8) -> Option<MidiMessage> {
    if position as usize >= TIME_DIGITS {
        return None;
    }
    control(cc::TIME_DIGIT + position, raw)
}

pub fn encode_assignment_digit(position: u8, raw: u8) -> Option<MidiMessage> {
    if position as usize >= ASSIGNMENT_DIGITS {
        return None;
    }
    control(cc::ASSIGNMENT_DIGIT + position, raw)
}

/// 7-segment byte showing `c`, with the decimal point when `dot` is set
pub fn segment_byte(c: char, dot: bool) -> Option<u8> {
    let code = match c {
        '@'..='_' => c as u8 - 64,
        ' '..='?' => c as u8,
        'a'..='z' => c.to_ascii_uppercase() as u8 - 64,
        _ => return None,
    };
    Some(if dot { code | 0x40 } else { code })
}

pub fn encode_heartbeat() -> Option<MidiMessage> {
    Some(MidiMessage::NoteOn {
        channel: HEARTBEAT_CHANNEL,
        note: HEARTBEAT_NOTE,
        velocity: VELOCITY_ON,
    })
}

pub fn encode_strip_button(strip: u8, button: StripButton, on: bool) -> Option<MidiMessage> {
    Some(note_message(button.note(strip)?, on))
}

/// Main fader touch
pub fn encode_touch(on: bool) -> Option<MidiMessage> {
    Some(note_message(note::MAIN_TOUCH, on))
}

fn encode_global<B: GlobalButton>(button: B, on: bool) -> Option<MidiMessage> {
    Some(note_message(button.note(), on))
}

pub fn encode_transport_button(button: TransportButton, on: bool) -> Option<MidiMessage> {
    encode_global(button, on)
}

pub fn encode_bank_button(button: BankButton, on: bool) -> Option<MidiMessage> {
    encode_global(button, on)
}

pub fn encode_modifier_button(button: ModifierButton, on: bool) -> Option<MidiMessage> {
    encode_global(button, on)
}

pub fn encode_navigation_button(button: NavigationButton, on: bool) -> Option<MidiMessage> {
    encode_global(button, on)
}

pub fn encode_automation_button(button: AutomationButton, on: bool) -> Option<MidiMessage> {
    encode_global(button, on)
}

pub fn encode_utility_button(button: UtilityButton, on: bool) -> Option<MidiMessage> {
    encode_global(button, on)
}

pub fn encode_marker_button(button: MarkerButton, on: bool) -> Option<MidiMessage> {
    encode_global(button, on)
}

pub fn encode_assign_button(button: AssignButton, on: bool) -> Option<MidiMessage> {
    encode_global(button, on)
}

/// Function key, index 0 = F1
pub fn encode_function_button(index: u8, on: bool) -> Option<MidiMessage> {
    if index >= FUNCTION_KEYS {
        return None;
    }
    Some(note_message(note::FUNCTION + index, on))
}

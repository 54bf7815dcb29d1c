//! Time code and assignment displays
//!
//! Both displays receive one raw 7-segment byte per digit, addressed right
//! to left. The raw bytes are the only state; numbers and text are derived
//! on read.

use serde::Serialize;

pub const TIME_DIGITS: usize = 10;
pub const ASSIGNMENT_DIGITS: usize = 2;

const DOT: u8 = 0x40;
const BLANK: u8 = b' ';

/// What the ten time digits count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeKind {
    #[default]
    Smpte,
    BarsBeats,
}

/// Decoded time display, 3-2-2-3 digit grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Time {
    Smpte {
        hours: u16,
        minutes: u8,
        seconds: u8,
        frames: u16,
    },
    BarsBeats {
        bars: u16,
        beats: u8,
        subdivision: u8,
        ticks: u16,
    },
}

/// Character shown by a raw segment byte, dot removed
///
/// Codes 0-31 are `@` through `_`, 32-63 are the ASCII characters they name.
pub fn segment_char(raw: u8) -> char {
    match raw & 0x3F {
        b if b < 32 => (b + 64) as char,
        b => b as char,
    }
}

/// Decimal value of a digit group; anything but 0-9 counts as 0
fn number(digits: &[u8]) -> u16 {
    digits.iter().fold(0, |acc, &raw| {
        let digit = segment_char(raw).to_digit(10).unwrap_or(0) as u16;
        acc * 10 + digit
    })
}

fn render(digits: &[u8]) -> String {
    let mut text = String::with_capacity(digits.len() * 2);
    for &raw in digits {
        text.push(segment_char(raw));
        if raw & DOT != 0 {
            text.push('.');
        }
    }
    text
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeDisplay {
    pub kind: TimeKind,
    digits: [u8; TIME_DIGITS],
}

impl Default for TimeDisplay {
    fn default() -> Self {
        Self {
            kind: TimeKind::default(),
            digits: [BLANK; TIME_DIGITS],
        }
    }
}

impl TimeDisplay {
    /// Store a digit; `position` 0 is the rightmost digit
    pub(crate) fn write(&mut self, position: usize, raw: u8) -> bool {
        match TIME_DIGITS.checked_sub(position + 1) {
            Some(index) => {
                self.digits[index] = raw;
                true
            }
            None => false,
        }
    }

    pub fn digits(&self) -> &[u8; TIME_DIGITS] {
        &self.digits
    }

    pub fn time(&self) -> Time {
        let d = &self.digits;
        match self.kind {
            TimeKind::Smpte => Time::Smpte {
                hours: number(&d[0..3]),
                minutes: number(&d[3..5]) as u8,
                seconds: number(&d[5..7]) as u8,
                frames: number(&d[7..10]),
            },
            TimeKind::BarsBeats => Time::BarsBeats {
                bars: number(&d[0..3]),
                beats: number(&d[3..5]) as u8,
                subdivision: number(&d[5..7]) as u8,
                ticks: number(&d[7..10]),
            },
        }
    }

    /// Characters as lit on the display, dots included
    pub fn text(&self) -> String {
        render(&self.digits)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignmentDisplay {
    digits: [u8; ASSIGNMENT_DIGITS],
}

impl Default for AssignmentDisplay {
    fn default() -> Self {
        Self {
            digits: [BLANK; ASSIGNMENT_DIGITS],
        }
    }
}

impl AssignmentDisplay {
    pub(crate) fn write(&mut self, position: usize, raw: u8) -> bool {
        match ASSIGNMENT_DIGITS.checked_sub(position + 1) {
            Some(index) => {
                self.digits[index] = raw;
                true
            }
            None => false,
        }
    }

    pub fn text(&self) -> String {
        render(&self.digits)
    }
}

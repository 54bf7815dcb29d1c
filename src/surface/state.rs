//! Surface state mirror
//!
//! Plain data owned by `Surface`. Only the dispatcher and the tick monitor
//! mutate it; applications read it through the accessors on `Surface`.

use std::marker::PhantomData;

use serde::Serialize;

use super::addr::GlobalButton;
use super::clock::Timestamp;
use super::display::{BLANK_BLOCK, ROWS};

/// Decoded LED ring display mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VPotMode {
    #[default]
    Off,
    /// Value in -1..=1 around the center
    Pan,
    /// Value from the left edge
    Bar,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VPotState {
    pub mode: VPotMode,
    pub center: bool,
    pub value: f32,
    pub clicked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FaderState {
    pub position: f32,
    pub touched: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StripButtons {
    pub arm: bool,
    pub mute: bool,
    pub solo: bool,
    pub select: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MeterState {
    pub level: f32,
    pub overload: bool,
    pub last_update: Option<Timestamp>,
}

/// One channel strip
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StripState {
    pub vpot: VPotState,
    pub fader: FaderState,
    pub buttons: StripButtons,
    pub meter: MeterState,
    /// Last notified display text per row
    pub(crate) display_cache: [[u8; 7]; ROWS],
}

impl Default for StripState {
    fn default() -> Self {
        Self {
            vpot: VPotState::default(),
            fader: FaderState::default(),
            buttons: StripButtons::default(),
            meter: MeterState::default(),
            display_cache: [BLANK_BLOCK; ROWS],
        }
    }
}

/// The main (master) fader
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MainState {
    pub position: f32,
    pub touched: bool,
}

/// Pressed state of every button of one global kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Latches<B> {
    pressed: [bool; 16],
    _kind: PhantomData<B>,
}

impl<B: GlobalButton> Latches<B> {
    pub fn is_pressed(&self, button: B) -> bool {
        self.pressed[button.index()]
    }

    pub(crate) fn set(&mut self, button: B, on: bool) {
        self.pressed[button.index()] = on;
    }

    /// Buttons currently held down
    pub fn pressed(&self) -> impl Iterator<Item = B> + '_ {
        B::ALL.iter().copied().filter(|&button| self.is_pressed(button))
    }
}

impl<B> Default for Latches<B> {
    fn default() -> Self {
        Self {
            pressed: [false; 16],
            _kind: PhantomData,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::addr::{MarkerButton, TransportButton};

    #[test]
    fn test_latches_track_each_button() {
        let mut latches = Latches::<TransportButton>::default();
        latches.set(TransportButton::Play, true);
        latches.set(TransportButton::Record, true);
        latches.set(TransportButton::Record, false);

        assert!(latches.is_pressed(TransportButton::Play));
        assert!(!latches.is_pressed(TransportButton::Record));
        assert_eq!(latches.pressed().collect::<Vec<_>>(), vec![TransportButton::Play]);
    }

    #[test]
    fn test_latch_capacity_covers_largest_table() {
        let mut latches = Latches::<MarkerButton>::default();
        latches.set(MarkerButton::End, true);
        assert!(latches.is_pressed(MarkerButton::End));
    }

    #[test]
    fn test_strip_defaults_are_blank() {
        let strip = StripState::default();
        assert_eq!(strip.vpot.mode, VPotMode::Off);
        assert_eq!(strip.display_cache, [*b"       "; 2]);
        assert!(strip.meter.last_update.is_none());
    }
}

//! Address map
//!
//! Wire addresses of every control on the surface. Strip controls occupy
//! eight contiguous slots starting at a per-kind base; global buttons each
//! sit on one fixed note on channel 1.

use serde::Serialize;

use crate::midi::MidiMessage;

/// Number of channel strips on one unit
pub const STRIPS: usize = 8;

/// Channel carrying all buttons, LED rings, meters and displays
pub const CONTROL_CHANNEL: u8 = 0;

/// Pitch bend channel of the main fader; strips use channels 0-7
pub const MAIN_FADER_CHANNEL: u8 = 8;

/// The host pings on channel 16 (0-based 15)
pub const HEARTBEAT_CHANNEL: u8 = 15;
pub const HEARTBEAT_NOTE: u8 = 127;

/// Button on/off velocities
pub const VELOCITY_ON: u8 = 127;
pub const VELOCITY_OFF: u8 = 0;

/// Note numbers on the control channel
pub mod note {
    pub const ARM: u8 = 0;
    pub const SOLO: u8 = 8;
    pub const MUTE: u8 = 16;
    pub const SELECT: u8 = 24;
    pub const VPOT_PUSH: u8 = 32;
    pub const FUNCTION: u8 = 54;
    pub const FADER_TOUCH: u8 = 104;
    pub const MAIN_TOUCH: u8 = 112;
    pub const SMPTE_LED: u8 = 113;
    pub const BEATS_LED: u8 = 114;
}

/// Controller numbers on the control channel
pub mod cc {
    /// Bit 0-5: steps, bit 6: counter-clockwise
    pub const VPOT_ROTATION: u8 = 16;
    /// Bit 0-3: position, bit 4-5: ring mode, bit 6: center dot
    pub const VPOT_LED: u8 = 48;
    /// 1 = clockwise, 65 = counter-clockwise
    pub const JOG: u8 = 60;
    /// Ten digits, the lowest controller drives the rightmost digit
    pub const TIME_DIGIT: u8 = 64;
    /// Two digits, right to left
    pub const ASSIGNMENT_DIGIT: u8 = 74;
    pub const ALL_SOUND_OFF: u8 = 120;
    pub const ALL_NOTES_OFF: u8 = 123;
}

pub const FUNCTION_KEYS: u8 = 16;

/// Check `base <= addr < base + 8` and return the strip index
pub fn strip_slot(addr: u8, base: u8) -> Option<u8> {
    addr.checked_sub(base).filter(|&strip| (strip as usize) < STRIPS)
}

fn valid_strip(strip: u8) -> bool {
    (strip as usize) < STRIPS
}

/// Per-strip note buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StripButton {
    Arm,
    Mute,
    Select,
    Solo,
    /// Touch-sensitive fader
    Touch,
    /// Rotary encoder push
    VPot,
}

impl StripButton {
    pub const ALL: [StripButton; 6] = [
        StripButton::Arm,
        StripButton::Mute,
        StripButton::Select,
        StripButton::Solo,
        StripButton::Touch,
        StripButton::VPot,
    ];

    pub const fn base(self) -> u8 {
        match self {
            StripButton::Arm => note::ARM,
            StripButton::Mute => note::MUTE,
            StripButton::Select => note::SELECT,
            StripButton::Solo => note::SOLO,
            StripButton::Touch => note::FADER_TOUCH,
            StripButton::VPot => note::VPOT_PUSH,
        }
    }

    /// Note number of this button on `strip`
    pub fn note(self, strip: u8) -> Option<u8> {
        valid_strip(strip).then(|| self.base() + strip)
    }

    /// Resolve a note number into (button, strip)
    pub fn from_note(note: u8) -> Option<(StripButton, u8)> {
        Self::ALL
            .iter()
            .find_map(|&button| strip_slot(note, button.base()).map(|strip| (button, strip)))
    }
}

/// A button with one fixed note number
pub trait GlobalButton: Copy + Sized + 'static {
    const ALL: &'static [Self];

    fn note(self) -> u8;

    /// Dense index into `ALL`
    fn index(self) -> usize;

    fn from_note(note: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|button| button.note() == note)
    }
}

macro_rules! global_buttons {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $note:expr),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl GlobalButton for $name {
            const ALL: &'static [Self] = &[$($name::$variant),+];

            fn note(self) -> u8 {
                match self {
                    $($name::$variant => $note),+
                }
            }

            fn index(self) -> usize {
                self as usize
            }
        }
    };
}

global_buttons! {
    /// Rotary encoder assignment
    AssignButton {
        Track = 40,
        Send = 41,
        Pan = 42,
        PlugIn = 43,
        Equalizer = 44,
        Instrument = 45,
    }
}

global_buttons! {
    /// Bank and channel shifting
    BankButton {
        Previous = 46,
        Next = 47,
        PreviousChannel = 48,
        NextChannel = 49,
        Flip = 50,
        Edit = 51,
    }
}

global_buttons! {
    ModifierButton {
        Shift = 70,
        Option = 71,
        Control = 72,
        Alt = 73,
    }
}

global_buttons! {
    AutomationButton {
        On = 74,
        Record = 75,
        Snapshot = 77,
        Touch = 78,
    }
}

global_buttons! {
    UtilityButton {
        Undo = 76,
        Redo = 79,
        Cancel = 80,
        Enter = 81,
        Marker = 82,
        Mixer = 83,
    }
}

global_buttons! {
    MarkerButton {
        PreviousFrame = 84,
        NextFrame = 85,
        Loop = 86,
        PointIn = 87,
        PointOut = 88,
        Home = 89,
        End = 90,
    }
}

global_buttons! {
    TransportButton {
        Rewind = 91,
        Forward = 92,
        Stop = 93,
        Play = 94,
        Record = 95,
    }
}

global_buttons! {
    NavigationButton {
        Up = 96,
        Down = 97,
        Left = 98,
        Right = 99,
        Zoom = 100,
        Scrub = 101,
    }
}

/// Function key index (0 = F1) for a note number
pub fn function_from_note(note: u8) -> Option<u8> {
    note.checked_sub(note::FUNCTION).filter(|&index| index < FUNCTION_KEYS)
}

/// Retarget a strip message to another strip
///
/// Accepts any message addressing one of the per-strip slots (push, arm,
/// solo, mute, select and touch notes, LED ring controllers, strip pitch
/// bend, meter pressure) and rewrites its address for `strip`. Every other
/// message shape, and `strip > 7`, yields `None`.
pub fn remap_strip(message: &MidiMessage, strip: u8) -> Option<MidiMessage> {
    if !valid_strip(strip) {
        return None;
    }

    match *message {
        MidiMessage::NoteOn { channel: CONTROL_CHANNEL, note, velocity } => {
            let (button, _) = StripButton::from_note(note)?;
            Some(MidiMessage::NoteOn {
                channel: CONTROL_CHANNEL,
                note: button.base() + strip,
                velocity,
            })
        }
        MidiMessage::NoteOff { channel: CONTROL_CHANNEL, note, velocity } => {
            let (button, _) = StripButton::from_note(note)?;
            Some(MidiMessage::NoteOff {
                channel: CONTROL_CHANNEL,
                note: button.base() + strip,
                velocity,
            })
        }
        MidiMessage::ControlChange { channel: CONTROL_CHANNEL, cc: controller, value } => {
            strip_slot(controller, cc::VPOT_LED)?;
            Some(MidiMessage::ControlChange {
                channel: CONTROL_CHANNEL,
                cc: cc::VPOT_LED + strip,
                value,
            })
        }
        MidiMessage::ChannelPressure { channel: CONTROL_CHANNEL, pressure } => {
            if !valid_strip(pressure >> 4) {
                return None;
            }
            Some(MidiMessage::ChannelPressure {
                channel: CONTROL_CHANNEL,
                pressure: strip << 4 | (pressure & 0x0F),
            })
        }
        MidiMessage::PitchBend { channel, value } if valid_strip(channel) => {
            Some(MidiMessage::PitchBend { channel: strip, value })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_strip_button_lookup() {
        assert_eq!(StripButton::from_note(0), Some((StripButton::Arm, 0)));
        assert_eq!(StripButton::from_note(27), Some((StripButton::Select, 3)));
        assert_eq!(StripButton::from_note(39), Some((StripButton::VPot, 7)));
        assert_eq!(StripButton::from_note(111), Some((StripButton::Touch, 7)));
        assert_eq!(StripButton::from_note(40), None);
        assert_eq!(StripButton::from_note(112), None);
        assert_eq!(StripButton::Mute.note(8), None);
    }

    #[test]
    fn test_global_button_tables_do_not_overlap() {
        let mut notes = Vec::new();
        notes.extend(AssignButton::ALL.iter().map(|b| b.note()));
        notes.extend(BankButton::ALL.iter().map(|b| b.note()));
        notes.extend(ModifierButton::ALL.iter().map(|b| b.note()));
        notes.extend(AutomationButton::ALL.iter().map(|b| b.note()));
        notes.extend(UtilityButton::ALL.iter().map(|b| b.note()));
        notes.extend(MarkerButton::ALL.iter().map(|b| b.note()));
        notes.extend(TransportButton::ALL.iter().map(|b| b.note()));
        notes.extend(NavigationButton::ALL.iter().map(|b| b.note()));
        notes.extend((0..FUNCTION_KEYS).map(|i| note::FUNCTION + i));

        let count = notes.len();
        notes.sort_unstable();
        notes.dedup();
        assert_eq!(notes.len(), count);
        assert!(notes.iter().all(|&n| StripButton::from_note(n).is_none()));
    }

    #[test]
    fn test_global_button_index_matches_table() {
        for (i, button) in MarkerButton::ALL.iter().enumerate() {
            assert_eq!(button.index(), i);
            assert_eq!(MarkerButton::from_note(button.note()), Some(*button));
        }
        assert_eq!(TransportButton::from_note(94), Some(TransportButton::Play));
        assert_eq!(function_from_note(54), Some(0));
        assert_eq!(function_from_note(69), Some(15));
        assert_eq!(function_from_note(70), None);
    }

    #[test]
    fn test_remap_rejects_unsupported_shapes() {
        let play = MidiMessage::NoteOn { channel: 0, note: 94, velocity: 127 };
        assert_eq!(remap_strip(&play, 2), None);

        let frame = MidiMessage::SysEx { data: vec![0x00, 0x00, 0x66, 0x14, 0x12, 0x00] };
        assert_eq!(remap_strip(&frame, 2), None);

        let main = MidiMessage::PitchBend { channel: 8, value: 0 };
        assert_eq!(remap_strip(&main, 2), None);

        let other_channel = MidiMessage::NoteOn { channel: 1, note: 0, velocity: 127 };
        assert_eq!(remap_strip(&other_channel, 2), None);

        let meter_out_of_range = MidiMessage::ChannelPressure { channel: 0, pressure: 0x85 };
        assert_eq!(remap_strip(&meter_out_of_range, 2), None);

        let mute = MidiMessage::NoteOn { channel: 0, note: 16, velocity: 127 };
        assert_eq!(remap_strip(&mute, 8), None);
    }

    #[test]
    fn test_remap_meter_keeps_level() {
        let meter = MidiMessage::ChannelPressure { channel: 0, pressure: 0x0E };
        assert_eq!(
            remap_strip(&meter, 5),
            Some(MidiMessage::ChannelPressure { channel: 0, pressure: 0x5E })
        );
    }

    fn strip_template() -> impl Strategy<Value = MidiMessage> {
        let base = prop::sample::select(StripButton::ALL.to_vec()).prop_map(StripButton::base).boxed();
        prop_oneof![
            (base.clone(), 0u8..8, 0u8..128).prop_map(|(b, s, velocity)| MidiMessage::NoteOn {
                channel: 0,
                note: b + s,
                velocity,
            }),
            (base, 0u8..8).prop_map(|(b, s)| MidiMessage::NoteOff {
                channel: 0,
                note: b + s,
                velocity: 0,
            }),
            (0u8..8, 0u8..128).prop_map(|(s, value)| MidiMessage::ControlChange {
                channel: 0,
                cc: cc::VPOT_LED + s,
                value,
            }),
            (0u8..8, 0u8..16).prop_map(|(s, level)| MidiMessage::ChannelPressure {
                channel: 0,
                pressure: s << 4 | level,
            }),
            (0u8..8, -8192i16..8192).prop_map(|(s, value)| MidiMessage::PitchBend { channel: s, value }),
        ]
    }

    proptest! {
        #[test]
        fn prop_remap_is_idempotent(message in strip_template(), strip in 0u8..8) {
            let once = remap_strip(&message, strip).unwrap();
            let twice = remap_strip(&once, strip).unwrap();
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_remap_is_a_bijection_on_strips(message in strip_template()) {
            let targets: Vec<MidiMessage> = (0..8u8)
                .map(|strip| remap_strip(&message, strip).unwrap())
                .collect();
            for (i, a) in targets.iter().enumerate() {
                for b in &targets[i + 1..] {
                    prop_assert_ne!(a, b);
                }
                // Retargeting back to the origin strip recovers the message.
                let origin = (0..8u8).find(|&s| remap_strip(a, s).as_ref() == Some(&message));
                prop_assert!(origin.is_some());
            }
        }
    }
}

//! Mackie Control surface codec
//!
//! Decodes the MIDI stream a DAW sends to an MCU surface into semantic
//! events, mirrors the resulting surface state and watches the host
//! heartbeat. The outbound direction lives in `encode`.

pub mod addr;
pub mod clock;
pub mod display;
pub mod encode;
pub mod event;
pub mod frame;
pub mod state;
pub mod time;

use std::time::Duration;

use tracing::trace;

use crate::midi::{format_hex, MidiMessage};

pub use addr::{
    remap_strip, AssignButton, AutomationButton, BankButton, GlobalButton, MarkerButton,
    ModifierButton, NavigationButton, StripButton, TransportButton, UtilityButton, STRIPS,
};
pub use clock::{SurfaceClock, Timestamp};
pub use display::DisplayChange;
pub use encode::{RingMode, RotaryLed};
pub use event::{EventSink, NullSink, SurfaceEvent};
pub use frame::{FrameError, UnitId};
pub use state::{FaderState, Latches, MainState, MeterState, StripButtons, StripState, VPotMode, VPotState};
pub use time::{Time, TimeKind};

use addr::{cc, note, CONTROL_CHANNEL, FUNCTION_KEYS, HEARTBEAT_CHANNEL, HEARTBEAT_NOTE, MAIN_FADER_CHANNEL, VELOCITY_OFF, VELOCITY_ON};
use display::DisplayBuffer;
use encode::{fader_fraction, meter_level, METER_OVERLOAD_CLEAR, METER_OVERLOAD_SET};
use frame::{frame_type, BulkFrame};
use time::{AssignmentDisplay, TimeDisplay, ASSIGNMENT_DIGITS, TIME_DIGITS};

/// Liveness and decay windows checked by `Surface::tick`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Silence after the last heartbeat before the host counts as gone
    pub heartbeat: Duration,
    /// Age after which a meter that stopped updating drops to zero
    pub meter_decay: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            heartbeat: Duration::from_secs(5),
            meter_decay: Duration::from_secs(1),
        }
    }
}

fn expired(now: Timestamp, since: Timestamp, window: Duration) -> bool {
    u128::from(now.elapsed_since(since)) > window.as_micros()
}

fn latch<B: GlobalButton>(latches: &mut Latches<B>, note: u8, on: bool) -> Option<B> {
    let button = B::from_note(note)?;
    latches.set(button, on);
    Some(button)
}

/// Everything `reset` returns to power-on defaults
#[derive(Debug, Default)]
struct Mirror {
    strips: [StripState; STRIPS],
    main: MainState,
    display: DisplayBuffer,
    time: TimeDisplay,
    assignment: AssignmentDisplay,
    transport: Latches<TransportButton>,
    bank: Latches<BankButton>,
    modifier: Latches<ModifierButton>,
    navigation: Latches<NavigationButton>,
    automation: Latches<AutomationButton>,
    utility: Latches<UtilityButton>,
    marker: Latches<MarkerButton>,
    assign: Latches<AssignButton>,
    function: [bool; FUNCTION_KEYS as usize],
    heartbeat: Option<Timestamp>,
}

/// State mirror of one surface, feeding decoded events into `S`
#[derive(Debug)]
pub struct Surface<S> {
    sink: S,
    timeouts: Timeouts,
    state: Mirror,
}

impl<S: EventSink> Surface<S> {
    pub fn new(sink: S) -> Self {
        Self::with_timeouts(sink, Timeouts::default())
    }

    pub fn with_timeouts(sink: S, timeouts: Timeouts) -> Self {
        Self {
            sink,
            timeouts,
            state: Mirror::default(),
        }
    }

    /// Return every piece of surface state to power-on defaults
    ///
    /// The sink and timeouts are kept. No events are emitted.
    pub fn reset(&mut self) {
        self.state = Mirror::default();
    }

    fn emit(&mut self, event: SurfaceEvent) {
        self.sink.on_event(event);
    }

    /// Decode one inbound message received at `now`
    pub fn dispatch(&mut self, message: &MidiMessage, now: Timestamp) {
        match *message {
            MidiMessage::NoteOn { channel, note, velocity } => self.dispatch_note(channel, note, velocity, now),
            MidiMessage::NoteOff { channel, note, .. } => self.dispatch_note(channel, note, VELOCITY_OFF, now),
            MidiMessage::ControlChange { channel, cc, value } => self.dispatch_control(channel, cc, value),
            MidiMessage::ChannelPressure { channel, pressure } => self.dispatch_pressure(channel, pressure, now),
            MidiMessage::PitchBend { channel, value } => self.dispatch_pitch_bend(channel, value),
            MidiMessage::SysEx { ref data } => self.dispatch_bulk(data),
            _ => trace!("Ignoring {}", message),
        }
    }

    /// Parse transport bytes and dispatch them
    pub fn dispatch_raw(&mut self, data: &[u8], now: Timestamp) {
        match MidiMessage::parse(data) {
            Some(message) => self.dispatch(&message, now),
            None => trace!("Dropping unparseable message: {}", format_hex(data)),
        }
    }

    fn dispatch_note(&mut self, channel: u8, note: u8, velocity: u8, now: Timestamp) {
        if channel == HEARTBEAT_CHANNEL && note == HEARTBEAT_NOTE {
            self.state.heartbeat = Some(now);
            return;
        }

        if channel != CONTROL_CHANNEL {
            trace!("Ignoring note {} on channel {}", note, channel + 1);
            return;
        }

        let on = velocity == VELOCITY_ON;

        if let Some((button, strip)) = StripButton::from_note(note) {
            let state = &mut self.state.strips[strip as usize];
            match button {
                StripButton::Arm => state.buttons.arm = on,
                StripButton::Mute => state.buttons.mute = on,
                StripButton::Select => state.buttons.select = on,
                StripButton::Solo => state.buttons.solo = on,
                StripButton::Touch => state.fader.touched = on,
                StripButton::VPot => state.vpot.clicked = on,
            }
            self.emit(SurfaceEvent::StripButton { strip, button, on });
            return;
        }

        if let Some(index) = addr::function_from_note(note) {
            self.state.function[index as usize] = on;
            self.emit(SurfaceEvent::Function { index, on });
            return;
        }

        match note {
            note::MAIN_TOUCH => {
                self.state.main.touched = on;
                self.emit(SurfaceEvent::MainTouch { on });
                return;
            }
            note::SMPTE_LED | note::BEATS_LED => {
                // The LED turning off carries no information
                if on {
                    let kind = if note == note::SMPTE_LED { TimeKind::Smpte } else { TimeKind::BarsBeats };
                    self.state.time.kind = kind;
                    self.emit(SurfaceEvent::Time { kind });
                }
                return;
            }
            _ => {}
        }

        let event = latch(&mut self.state.transport, note, on)
            .map(|button| SurfaceEvent::Transport { button, on })
            .or_else(|| latch(&mut self.state.bank, note, on).map(|button| SurfaceEvent::Bank { button, on }))
            .or_else(|| latch(&mut self.state.modifier, note, on).map(|button| SurfaceEvent::Modifier { button, on }))
            .or_else(|| latch(&mut self.state.navigation, note, on).map(|button| SurfaceEvent::Navigation { button, on }))
            .or_else(|| latch(&mut self.state.automation, note, on).map(|button| SurfaceEvent::Automation { button, on }))
            .or_else(|| latch(&mut self.state.utility, note, on).map(|button| SurfaceEvent::Utility { button, on }))
            .or_else(|| latch(&mut self.state.marker, note, on).map(|button| SurfaceEvent::Marker { button, on }))
            .or_else(|| latch(&mut self.state.assign, note, on).map(|button| SurfaceEvent::Assign { button, on }));

        match event {
            Some(event) => self.emit(event),
            None => trace!("Ignoring unmapped note {}", note),
        }
    }

    fn dispatch_control(&mut self, channel: u8, controller: u8, value: u8) {
        if channel != CONTROL_CHANNEL {
            trace!("Ignoring controller {} on channel {}", controller, channel + 1);
            return;
        }

        if let Some(strip) = addr::strip_slot(controller, cc::VPOT_LED) {
            let led = RotaryLed::from_byte(value);
            let (mode, level) = led.decode();

            let vpot = &mut self.state.strips[strip as usize].vpot;
            vpot.mode = mode;
            vpot.center = led.center;
            vpot.value = level;

            self.emit(SurfaceEvent::StripVPot {
                strip,
                raw: value,
                mode,
                center: led.center,
                value: level,
            });
            return;
        }

        let time_digit = controller.wrapping_sub(cc::TIME_DIGIT) as usize;
        let assignment_digit = controller.wrapping_sub(cc::ASSIGNMENT_DIGIT) as usize;

        if time_digit < TIME_DIGITS {
            self.state.time.write(time_digit, value);
            let kind = self.state.time.kind;
            self.emit(SurfaceEvent::Time { kind });
        } else if assignment_digit < ASSIGNMENT_DIGITS {
            self.state.assignment.write(assignment_digit, value);
            self.emit(SurfaceEvent::Assignment);
        } else if controller == cc::ALL_SOUND_OFF || controller == cc::ALL_NOTES_OFF {
            trace!("Controller {} resets the surface", controller);
            self.reset();
        } else {
            trace!("Ignoring unmapped controller {}", controller);
        }
    }

    fn dispatch_pressure(&mut self, channel: u8, pressure: u8, now: Timestamp) {
        if channel != CONTROL_CHANNEL {
            return;
        }

        let strip = pressure >> 4;
        if strip as usize >= STRIPS {
            trace!("Dropping meter for strip {}", strip);
            return;
        }

        let meter = &mut self.state.strips[strip as usize].meter;
        meter.last_update = Some(now);

        let nibble = pressure & 0x0F;
        let edge = match nibble {
            METER_OVERLOAD_SET | METER_OVERLOAD_CLEAR => {
                let overload = nibble == METER_OVERLOAD_SET;
                let changed = meter.overload != overload;
                meter.overload = overload;
                changed.then_some(overload)
            }
            level => {
                meter.level = meter_level(level).unwrap_or_default();
                None
            }
        };
        let (level, overload) = (meter.level, meter.overload);

        if let Some(overload) = edge {
            self.emit(SurfaceEvent::StripMeterOverload { strip, overload });
        }
        self.emit(SurfaceEvent::StripMeter { strip, level, overload });
    }

    fn dispatch_pitch_bend(&mut self, channel: u8, value: i16) {
        let position = fader_fraction(value);

        if (channel as usize) < STRIPS {
            self.state.strips[channel as usize].fader.position = position;
            self.emit(SurfaceEvent::StripFader { strip: channel, position });
        } else if channel == MAIN_FADER_CHANNEL {
            self.state.main.position = position;
            self.emit(SurfaceEvent::MainFader { position });
        } else {
            trace!("Ignoring pitch bend on channel {}", channel + 1);
        }
    }

    fn dispatch_bulk(&mut self, data: &[u8]) {
        let frame = match BulkFrame::parse(data) {
            Ok(frame) => frame,
            Err(e) => {
                trace!("Dropping bulk frame: {}", e);
                return;
            }
        };

        if frame.kind != frame_type::DISPLAY {
            trace!("Ignoring bulk frame type 0x{:02X}", frame.kind);
            return;
        }

        let Some(changes) = self.state.display.apply(frame.payload, &mut self.state.strips) else {
            return;
        };

        for DisplayChange { global, strip, row } in changes {
            self.emit(SurfaceEvent::StripDisplay { global, strip, row });
        }
    }

    /// Run the heartbeat and meter decay checks at `now`
    pub fn tick(&mut self, now: Timestamp) {
        if let Some(last) = self.state.heartbeat {
            if expired(now, last, self.timeouts.heartbeat) {
                self.state.heartbeat = None;
                self.emit(SurfaceEvent::HeartbeatTimeout);
            }
        }

        for strip in 0..STRIPS {
            let meter = &mut self.state.strips[strip].meter;
            if meter.level <= 0.0 {
                continue;
            }
            let Some(last) = meter.last_update else {
                continue;
            };
            if !expired(now, last, self.timeouts.meter_decay) {
                continue;
            }

            *meter = MeterState::default();
            self.emit(SurfaceEvent::StripMeter {
                strip: strip as u8,
                level: 0.0,
                overload: false,
            });
        }
    }
}

impl<S> Surface<S> {
    pub fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    pub fn strip(&self, strip: u8) -> Option<&StripState> {
        self.state.strips.get(strip as usize)
    }

    pub fn strips(&self) -> &[StripState; STRIPS] {
        &self.state.strips
    }

    pub fn main(&self) -> &MainState {
        &self.state.main
    }

    pub fn transport(&self) -> &Latches<TransportButton> {
        &self.state.transport
    }

    pub fn bank(&self) -> &Latches<BankButton> {
        &self.state.bank
    }

    pub fn modifier(&self) -> &Latches<ModifierButton> {
        &self.state.modifier
    }

    pub fn navigation(&self) -> &Latches<NavigationButton> {
        &self.state.navigation
    }

    pub fn automation(&self) -> &Latches<AutomationButton> {
        &self.state.automation
    }

    pub fn utility(&self) -> &Latches<UtilityButton> {
        &self.state.utility
    }

    pub fn marker(&self) -> &Latches<MarkerButton> {
        &self.state.marker
    }

    pub fn assign(&self) -> &Latches<AssignButton> {
        &self.state.assign
    }

    /// Function key state, index 0 = F1
    pub fn function(&self, index: u8) -> bool {
        self.state.function.get(index as usize).copied().unwrap_or(false)
    }

    /// Strip label with trailing spaces removed
    pub fn display_text(&self, strip: u8, row: u8) -> Option<String> {
        self.state.display.text(strip, row)
    }

    pub fn display_row(&self, row: u8) -> Option<String> {
        self.state.display.row_text(row)
    }

    pub fn time(&self) -> Time {
        self.state.time.time()
    }

    pub fn time_kind(&self) -> TimeKind {
        self.state.time.kind
    }

    pub fn time_text(&self) -> String {
        self.state.time.text()
    }

    pub fn assignment_text(&self) -> String {
        self.state.assignment.text()
    }

    /// A heartbeat arrived and has not timed out since
    pub fn is_connected(&self) -> bool {
        self.state.heartbeat.is_some()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface() -> Surface<Vec<SurfaceEvent>> {
        Surface::new(Vec::new())
    }

    fn at(millis: u32) -> Timestamp {
        Timestamp::from_millis(millis)
    }

    fn note_on(note: u8, velocity: u8) -> MidiMessage {
        MidiMessage::NoteOn { channel: 0, note, velocity }
    }

    fn heartbeat() -> MidiMessage {
        MidiMessage::NoteOn { channel: 15, note: 127, velocity: 127 }
    }

    fn meter(strip: u8, nibble: u8) -> MidiMessage {
        MidiMessage::ChannelPressure { channel: 0, pressure: strip << 4 | nibble }
    }

    #[test]
    fn test_select_press_and_release() {
        let mut surface = surface();

        surface.dispatch(&note_on(24 + 3, 127), at(0));
        assert!(surface.strip(3).unwrap().buttons.select);

        surface.dispatch(&MidiMessage::NoteOff { channel: 0, note: 27, velocity: 64 }, at(1));
        assert!(!surface.strip(3).unwrap().buttons.select);

        assert_eq!(
            surface.sink(),
            &vec![
                SurfaceEvent::StripButton { strip: 3, button: StripButton::Select, on: true },
                SurfaceEvent::StripButton { strip: 3, button: StripButton::Select, on: false },
            ]
        );
    }

    #[test]
    fn test_touch_and_push_update_strip() {
        let mut surface = surface();
        surface.dispatch(&note_on(104 + 1, 127), at(0));
        surface.dispatch(&note_on(32 + 2, 127), at(0));

        assert!(surface.strip(1).unwrap().fader.touched);
        assert!(surface.strip(2).unwrap().vpot.clicked);
    }

    #[test]
    fn test_partial_velocity_counts_as_release() {
        let mut surface = surface();
        surface.dispatch(&note_on(94, 127), at(0));
        surface.dispatch(&note_on(94, 100), at(0));

        assert!(!surface.transport().is_pressed(TransportButton::Play));
        assert_eq!(
            surface.sink().last(),
            Some(&SurfaceEvent::Transport { button: TransportButton::Play, on: false })
        );
    }

    #[test]
    fn test_global_button_kinds() {
        let mut surface = surface();
        for note in [47, 49, 70, 96, 74, 76, 86, 42, 56, 112] {
            surface.dispatch(&note_on(note, 127), at(0));
        }

        assert_eq!(
            surface.sink(),
            &vec![
                SurfaceEvent::Bank { button: BankButton::Next, on: true },
                SurfaceEvent::Bank { button: BankButton::NextChannel, on: true },
                SurfaceEvent::Modifier { button: ModifierButton::Shift, on: true },
                SurfaceEvent::Navigation { button: NavigationButton::Up, on: true },
                SurfaceEvent::Automation { button: AutomationButton::On, on: true },
                SurfaceEvent::Utility { button: UtilityButton::Undo, on: true },
                SurfaceEvent::Marker { button: MarkerButton::Loop, on: true },
                SurfaceEvent::Assign { button: AssignButton::Pan, on: true },
                SurfaceEvent::Function { index: 2, on: true },
                SurfaceEvent::MainTouch { on: true },
            ]
        );
        assert!(surface.bank().is_pressed(BankButton::NextChannel));
        assert!(surface.function(2));
        assert!(surface.main().touched);
    }

    #[test]
    fn test_unmapped_input_is_silent() {
        let mut surface = surface();
        surface.dispatch(&note_on(102, 127), at(0));
        surface.dispatch(&MidiMessage::NoteOn { channel: 1, note: 94, velocity: 127 }, at(0));
        surface.dispatch(&MidiMessage::ControlChange { channel: 0, cc: 1, value: 5 }, at(0));
        surface.dispatch(&MidiMessage::PitchBend { channel: 9, value: 0 }, at(0));
        surface.dispatch(&MidiMessage::ProgramChange { channel: 0, program: 3 }, at(0));
        surface.dispatch(&meter(8, 5), at(0));
        surface.dispatch(&MidiMessage::SysEx { data: vec![0x00, 0x00, 0x66, 0x14, 0x0A, 0x01] }, at(0));
        surface.dispatch_raw(&[0xF8], at(0));

        assert!(surface.sink().is_empty());
    }

    #[test]
    fn test_rotary_led_updates_vpot() {
        let mut surface = surface();
        surface.dispatch(&MidiMessage::ControlChange { channel: 0, cc: 50, value: 0x51 }, at(0));

        let vpot = surface.strip(2).unwrap().vpot;
        assert_eq!(vpot.mode, VPotMode::Pan);
        assert!(vpot.center);
        assert_eq!(vpot.value, -1.0);
        assert_eq!(
            surface.sink(),
            &vec![SurfaceEvent::StripVPot { strip: 2, raw: 0x51, mode: VPotMode::Pan, center: true, value: -1.0 }]
        );
    }

    #[test]
    fn test_pitch_bend_scaling() {
        let mut surface = surface();
        surface.dispatch(&MidiMessage::PitchBend { channel: 4, value: 8191 }, at(0));
        surface.dispatch(&MidiMessage::PitchBend { channel: 8, value: -8192 }, at(0));

        assert_eq!(surface.strip(4).unwrap().fader.position, 1.0);
        assert_eq!(surface.main().position, 0.0);
        assert_eq!(
            surface.sink(),
            &vec![
                SurfaceEvent::StripFader { strip: 4, position: 1.0 },
                SurfaceEvent::MainFader { position: 0.0 },
            ]
        );
    }

    #[test]
    fn test_meter_levels_and_overload_edges() {
        let mut surface = surface();
        surface.dispatch(&meter(1, 6), at(0));
        surface.dispatch(&meter(1, 14), at(1));
        surface.dispatch(&meter(1, 14), at(2));
        surface.dispatch(&meter(1, 13), at(3));
        surface.dispatch(&meter(1, 15), at(4));

        assert_eq!(
            surface.sink(),
            &vec![
                SurfaceEvent::StripMeter { strip: 1, level: 0.5, overload: false },
                SurfaceEvent::StripMeterOverload { strip: 1, overload: true },
                SurfaceEvent::StripMeter { strip: 1, level: 0.5, overload: true },
                SurfaceEvent::StripMeter { strip: 1, level: 0.5, overload: true },
                SurfaceEvent::StripMeter { strip: 1, level: 1.0, overload: true },
                SurfaceEvent::StripMeterOverload { strip: 1, overload: false },
                SurfaceEvent::StripMeter { strip: 1, level: 1.0, overload: false },
            ]
        );
        assert_eq!(surface.strip(1).unwrap().meter.last_update, Some(at(4)));
    }

    #[test]
    fn test_heartbeat_timeout_fires_once() {
        let mut surface = surface();
        surface.dispatch(&heartbeat(), at(1_000));
        assert!(surface.is_connected());

        surface.tick(at(6_000));
        assert!(surface.sink().is_empty());

        surface.tick(at(6_001));
        surface.tick(at(20_000));
        assert_eq!(surface.sink(), &vec![SurfaceEvent::HeartbeatTimeout]);
        assert!(!surface.is_connected());

        // A new heartbeat rearms the check
        surface.dispatch(&MidiMessage::NoteOff { channel: 15, note: 127, velocity: 0 }, at(21_000));
        surface.tick(at(26_001));
        assert_eq!(surface.sink().len(), 2);
    }

    #[test]
    fn test_heartbeat_survives_counter_wrap() {
        let mut surface = surface();
        surface.dispatch(&heartbeat(), Timestamp::from_micros(u32::MAX - 1_000));
        surface.tick(Timestamp::from_micros(1_000));
        assert!(surface.is_connected());
    }

    #[test]
    fn test_meter_decay() {
        let mut surface = surface();
        surface.dispatch(&meter(5, 6), at(100));

        surface.tick(at(1_100));
        assert_eq!(surface.strip(5).unwrap().meter.level, 0.5);

        surface.tick(at(1_101));
        surface.tick(at(3_000));
        assert_eq!(surface.strip(5).unwrap().meter, MeterState::default());
        assert_eq!(
            surface.sink()[1..],
            [SurfaceEvent::StripMeter { strip: 5, level: 0.0, overload: false }]
        );
    }

    #[test]
    fn test_custom_timeouts() {
        let timeouts = Timeouts {
            heartbeat: Duration::from_millis(100),
            meter_decay: Duration::from_millis(50),
        };
        let mut surface = Surface::with_timeouts(Vec::new(), timeouts);
        surface.dispatch(&heartbeat(), at(0));
        surface.dispatch(&meter(0, 12), at(0));

        surface.tick(at(101));
        assert_eq!(
            surface.sink()[1..],
            [
                SurfaceEvent::HeartbeatTimeout,
                SurfaceEvent::StripMeter { strip: 0, level: 0.0, overload: false },
            ]
        );
    }

    #[test]
    fn test_time_digits_and_kind() {
        let mut surface = surface();
        for (position, c) in b"0030201001".iter().rev().enumerate() {
            let cc = 64 + position as u8;
            surface.dispatch(&MidiMessage::ControlChange { channel: 0, cc, value: *c }, at(0));
        }
        assert_eq!(surface.time(), Time::Smpte { hours: 3, minutes: 2, seconds: 1, frames: 1 });

        surface.dispatch(&note_on(114, 127), at(0));
        assert_eq!(surface.time_kind(), TimeKind::BarsBeats);
        assert_eq!(
            surface.time(),
            Time::BarsBeats { bars: 3, beats: 2, subdivision: 1, ticks: 1 }
        );
        assert_eq!(surface.sink().last(), Some(&SurfaceEvent::Time { kind: TimeKind::BarsBeats }));
    }

    #[test]
    fn test_assignment_digits() {
        let mut surface = surface();
        surface.dispatch(&MidiMessage::ControlChange { channel: 0, cc: 75, value: 0x30 }, at(0));
        surface.dispatch(&MidiMessage::ControlChange { channel: 0, cc: 74, value: 0x37 }, at(0));

        assert_eq!(surface.assignment_text(), "07");
        assert_eq!(surface.sink(), &vec![SurfaceEvent::Assignment, SurfaceEvent::Assignment]);
    }

    #[test]
    fn test_all_notes_off_resets_state() {
        let mut surface = surface();
        surface.dispatch(&heartbeat(), at(0));
        surface.dispatch(&note_on(16, 127), at(0));
        surface.dispatch(&note_on(94, 127), at(0));
        surface.dispatch_raw(&[0xF0, 0x00, 0x00, 0x66, 0x14, 0x12, 0x00, b'K', b'i', b'c', b'k', 0xF7], at(0));
        let events = surface.sink().len();

        surface.dispatch(&MidiMessage::ControlChange { channel: 0, cc: 123, value: 0 }, at(0));

        assert_eq!(surface.sink().len(), events);
        assert!(!surface.strip(0).unwrap().buttons.mute);
        assert!(!surface.transport().is_pressed(TransportButton::Play));
        assert_eq!(surface.display_text(0, 0).as_deref(), Some(""));
        assert!(!surface.is_connected());

        // Blank caches: the same label notifies again
        surface.dispatch_raw(&[0xF0, 0x00, 0x00, 0x66, 0x14, 0x12, 0x00, b'K', b'i', b'c', b'k', 0xF7], at(0));
        assert_eq!(surface.sink().len(), events + 1);
    }
}

//! Decoded surface events and the sink receiving them

use serde::Serialize;

use super::addr::{
    AssignButton, AutomationButton, BankButton, MarkerButton, ModifierButton, NavigationButton,
    StripButton, TransportButton, UtilityButton,
};
use super::state::VPotMode;
use super::time::TimeKind;

/// One semantic change observed on the wire
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SurfaceEvent {
    StripButton {
        strip: u8,
        button: StripButton,
        on: bool,
    },
    StripFader {
        strip: u8,
        position: f32,
    },
    StripMeter {
        strip: u8,
        level: f32,
        overload: bool,
    },
    /// Overload edge, emitted before the matching `StripMeter`
    StripMeterOverload {
        strip: u8,
        overload: bool,
    },
    /// LED ring feedback, `raw` is the packed controller value
    StripVPot {
        strip: u8,
        raw: u8,
        mode: VPotMode,
        center: bool,
        value: f32,
    },
    StripDisplay {
        global: bool,
        strip: u8,
        row: u8,
    },
    MainFader {
        position: f32,
    },
    MainTouch {
        on: bool,
    },
    Transport {
        button: TransportButton,
        on: bool,
    },
    Bank {
        button: BankButton,
        on: bool,
    },
    Modifier {
        button: ModifierButton,
        on: bool,
    },
    Navigation {
        button: NavigationButton,
        on: bool,
    },
    Automation {
        button: AutomationButton,
        on: bool,
    },
    Utility {
        button: UtilityButton,
        on: bool,
    },
    Marker {
        button: MarkerButton,
        on: bool,
    },
    Assign {
        button: AssignButton,
        on: bool,
    },
    /// Function key, index 0 = F1
    Function {
        index: u8,
        on: bool,
    },
    /// A time digit or the time kind changed
    Time {
        kind: TimeKind,
    },
    Assignment,
    HeartbeatTimeout,
}

/// Receiver for decoded events
///
/// Implementors see every event kind and ignore what they don't need with a
/// wildcard arm.
pub trait EventSink {
    fn on_event(&mut self, event: SurfaceEvent);
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn on_event(&mut self, _event: SurfaceEvent) {}
}

impl EventSink for Vec<SurfaceEvent> {
    fn on_event(&mut self, event: SurfaceEvent) {
        self.push(event);
    }
}

impl<F> EventSink for F
where
    F: FnMut(SurfaceEvent),
{
    fn on_event(&mut self, event: SurfaceEvent) {
        self(event)
    }
}

//! Surface event printer for the monitor binary
//!
//! Renders decoded events either as coloured text lines or as one JSON
//! object per line.

use anyhow::{Context, Result};
use colored::*;
use serde::Serialize;

use crate::config::OutputFormat;
use crate::driver::discovery;
use crate::surface::{Surface, SurfaceEvent, Time, Timestamp, VPotMode};

/// Coarse grouping used to colour text output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventClass {
    Strip,
    Global,
    Display,
    Link,
}

impl EventClass {
    pub fn of(event: &SurfaceEvent) -> Self {
        match event {
            SurfaceEvent::StripButton { .. }
            | SurfaceEvent::StripFader { .. }
            | SurfaceEvent::StripMeter { .. }
            | SurfaceEvent::StripMeterOverload { .. }
            | SurfaceEvent::StripVPot { .. } => EventClass::Strip,
            SurfaceEvent::StripDisplay { .. } | SurfaceEvent::Time { .. } | SurfaceEvent::Assignment => {
                EventClass::Display
            }
            SurfaceEvent::HeartbeatTimeout => EventClass::Link,
            _ => EventClass::Global,
        }
    }

    fn paint(self, text: String) -> ColoredString {
        match self {
            EventClass::Strip => text.bright_cyan(),
            EventClass::Global => text.bright_green(),
            EventClass::Display => text.bright_magenta(),
            EventClass::Link => text.bright_red().bold(),
        }
    }
}

fn on_off(on: bool) -> &'static str {
    if on {
        "ON"
    } else {
        "off"
    }
}

fn button_name<B: Serialize>(button: &B) -> String {
    serde_json::to_value(button)
        .ok()
        .and_then(|value| value.as_str().map(str::to_string))
        .unwrap_or_default()
}

fn time_fields(time: Time) -> String {
    match time {
        Time::Smpte { hours, minutes, seconds, frames } => {
            format!("smpte {}:{:02}:{:02}:{:03}", hours, minutes, seconds, frames)
        }
        Time::BarsBeats { bars, beats, subdivision, ticks } => {
            format!("bars {} beat {} sub {} ticks {:03}", bars, beats, subdivision, ticks)
        }
    }
}

fn global<B: Serialize>(kind: &str, button: &B, on: bool) -> String {
    format!("{} {} {}", kind, button_name(button), on_off(on))
}

/// Human readable event line, with the display content it refers to
pub fn describe<S>(event: &SurfaceEvent, surface: &Surface<S>) -> String {
    match event {
        SurfaceEvent::StripButton { strip, button, on } => {
            format!("strip {} {} {}", strip + 1, button_name(button), on_off(*on))
        }
        SurfaceEvent::StripFader { strip, position } => {
            format!("strip {} fader {:.3}", strip + 1, position)
        }
        SurfaceEvent::StripMeter { strip, level, overload } => {
            let clip = if *overload { " CLIP" } else { "" };
            format!("strip {} meter {:.2}{}", strip + 1, level, clip)
        }
        SurfaceEvent::StripMeterOverload { strip, overload } => {
            format!("strip {} overload {}", strip + 1, on_off(*overload))
        }
        SurfaceEvent::StripVPot { strip, mode, center, value, .. } => {
            let mode = match mode {
                VPotMode::Off => "off",
                VPotMode::Pan => "pan",
                VPotMode::Bar => "bar",
            };
            let center = if *center { " (center)" } else { "" };
            format!("strip {} vpot {} {:+.2}{}", strip + 1, mode, value, center)
        }
        SurfaceEvent::StripDisplay { global, strip, row } => {
            if *global {
                let text = surface.display_row(*row).unwrap_or_default();
                format!("display row {} \"{}\"", row + 1, text.trim_end())
            } else {
                let text = surface.display_text(*strip, *row).unwrap_or_default();
                format!("strip {} row {} \"{}\"", strip + 1, row + 1, text)
            }
        }
        SurfaceEvent::MainFader { position } => format!("main fader {:.3}", position),
        SurfaceEvent::MainTouch { on } => format!("main touch {}", on_off(*on)),
        SurfaceEvent::Transport { button, on } => global("transport", button, *on),
        SurfaceEvent::Bank { button, on } => global("bank", button, *on),
        SurfaceEvent::Modifier { button, on } => global("modifier", button, *on),
        SurfaceEvent::Navigation { button, on } => global("navigation", button, *on),
        SurfaceEvent::Automation { button, on } => global("automation", button, *on),
        SurfaceEvent::Utility { button, on } => global("utility", button, *on),
        SurfaceEvent::Marker { button, on } => global("marker", button, *on),
        SurfaceEvent::Assign { button, on } => global("assign", button, *on),
        SurfaceEvent::Function { index, on } => format!("function F{} {}", index + 1, on_off(*on)),
        SurfaceEvent::Time { .. } => {
            format!("time \"{}\" {}", surface.time_text().trim(), time_fields(surface.time()))
        },
        SurfaceEvent::Assignment => format!("assignment \"{}\"", surface.assignment_text()),
        SurfaceEvent::HeartbeatTimeout => "host heartbeat lost".to_string(),
    }
}

#[derive(Serialize)]
struct JsonLine<'a> {
    time_us: u32,
    #[serde(flatten)]
    event: &'a SurfaceEvent,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

/// One JSON object for an event; display events carry their text
pub fn to_json<S>(event: &SurfaceEvent, surface: &Surface<S>, timestamp: Timestamp) -> Result<String> {
    let text = match event {
        SurfaceEvent::StripDisplay { global: true, row, .. } => surface.display_row(*row),
        SurfaceEvent::StripDisplay { strip, row, .. } => surface.display_text(*strip, *row),
        SurfaceEvent::Time { .. } => Some(surface.time_text()),
        SurfaceEvent::Assignment => Some(surface.assignment_text()),
        _ => None,
    };

    let line = JsonLine {
        time_us: timestamp.as_micros(),
        event,
        text,
    };

    serde_json::to_string(&line).context("Failed to serialize event")
}

/// Prints events in the configured format
#[derive(Debug, Clone, Copy)]
pub struct Sniffer {
    format: OutputFormat,
}

impl Sniffer {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn print_header(&self, port_name: &str) {
        if self.format == OutputFormat::Text {
            println!("{}", "=== MCU Surface Monitor ===".bold().cyan());
            println!("Listening on {}, press Ctrl+C to exit", port_name.bright_white());
            println!("{}\n", "─".repeat(60).dimmed());
        }
    }

    pub fn print_event<S>(&self, event: &SurfaceEvent, surface: &Surface<S>, timestamp: Timestamp) -> Result<()> {
        match self.format {
            OutputFormat::Json => println!("{}", to_json(event, surface, timestamp)?),
            OutputFormat::Text => {
                let millis = format!("{:010}", timestamp.as_micros() / 1000);
                let class = EventClass::of(event);
                println!("[{}ms] {}", millis.dimmed(), class.paint(describe(event, surface)));
            }
        }
        Ok(())
    }
}

/// List all input ports in a formatted way
pub fn list_ports_formatted() -> Result<()> {
    let inputs = discovery::discover_input_ports()?;

    println!("\n{}", "=== Available MIDI Input Ports ===".bold().cyan());

    if inputs.is_empty() {
        println!("  {}", "No input ports found".dimmed());
    } else {
        for port in inputs {
            let marker = if port.is_virtual {
                "[VIRTUAL]".yellow()
            } else {
                "[PHYSICAL]".green()
            };
            println!("  {:>2}: {} {}", port.index, marker, port.name);
        }
    }

    println!();
    Ok(())
}

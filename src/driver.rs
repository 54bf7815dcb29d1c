//! MIDI input driver
//!
//! Opens the input port the host drives and forwards every message, stamped
//! on arrival, to the monitor loop.

use anyhow::{Context, Result};
use midir::{Ignore, MidiInput, MidiInputConnection, MidiInputPort};
use tokio::sync::mpsc;
use tracing::{debug, info, trace};

use crate::midi::{format_hex, MidiMessage};
use crate::surface::{SurfaceClock, Timestamp};

/// Buffered messages between the MIDI thread and the monitor loop
const CHANNEL_CAPACITY: usize = 1000;

/// MIDI message received from the host
#[derive(Debug, Clone)]
pub struct SurfaceInput {
    pub timestamp: Timestamp,
    pub message: MidiMessage,
    pub raw_data: Vec<u8>,
}

/// Input side of one surface port
pub struct SurfaceDriver {
    /// MIDI input connection
    input_conn: Option<MidiInputConnection<()>>,

    /// Input sender handed to the MIDI callback
    input_tx: mpsc::Sender<SurfaceInput>,

    /// Input receiver
    input_rx: Option<mpsc::Receiver<SurfaceInput>>,

    /// Input port name pattern
    input_port_name: String,

    clock: SurfaceClock,
}

/// Case-insensitive substring match, as port names differ per OS
pub fn port_matches(name: &str, pattern: &str) -> bool {
    name.to_lowercase().contains(&pattern.to_lowercase())
}

impl SurfaceDriver {
    pub fn new(input_port_name: impl Into<String>, clock: SurfaceClock) -> Self {
        let (input_tx, input_rx) = mpsc::channel(CHANNEL_CAPACITY);

        Self {
            input_conn: None,
            input_tx,
            input_rx: Some(input_rx),
            input_port_name: input_port_name.into(),
            clock,
        }
    }

    /// Find an input port by substring match
    fn find_input_port(midi_in: &MidiInput, pattern: &str) -> Option<(MidiInputPort, String)> {
        for port in midi_in.ports() {
            if let Ok(name) = midi_in.port_name(&port) {
                if port_matches(&name, pattern) {
                    debug!("Found port '{}' matching pattern '{}'", name, pattern);
                    return Some((port, name));
                }
            }
        }
        None
    }

    /// Connect to the input port
    pub fn connect(&mut self) -> Result<()> {
        self.disconnect();

        info!("Connecting to surface input '{}'", self.input_port_name);

        let mut midi_in = MidiInput::new("MCU-Surface-Input").context("Failed to create MIDI input")?;

        // Display frames are SysEx, which midir drops by default
        midi_in.ignore(Ignore::None);

        debug!("Found {} MIDI input ports", midi_in.port_count());

        let (in_port, port_name) = Self::find_input_port(&midi_in, &self.input_port_name)
            .ok_or_else(|| anyhow::anyhow!("Input port '{}' not found", self.input_port_name))?;

        info!("Connecting to input port: {}", port_name);

        let input_tx = self.input_tx.clone();
        let clock = self.clock;

        let input_conn = midi_in
            .connect(
                &in_port,
                "MCU-Surface",
                move |_timestamp, data, _| {
                    let timestamp = clock.now();

                    match MidiMessage::parse(data) {
                        Some(message) => {
                            let input = SurfaceInput {
                                timestamp,
                                message,
                                raw_data: data.to_vec(),
                            };
                            // Never block the MIDI thread
                            if input_tx.try_send(input).is_err() {
                                trace!("Monitor busy, dropped {}", format_hex(data));
                            }
                        }
                        None => debug!("Failed to parse MIDI: {}", format_hex(data)),
                    }
                },
                (),
            )
            .map_err(|e| anyhow::anyhow!("Failed to connect to input port: {}", e))?;

        self.input_conn = Some(input_conn);

        info!("Surface input connected");

        Ok(())
    }

    /// Disconnect from the input port
    pub fn disconnect(&mut self) {
        if self.input_conn.take().is_some() {
            info!("Surface input disconnected");
        }
    }

    pub fn is_connected(&self) -> bool {
        self.input_conn.is_some()
    }

    /// Take the input receiver; only the first call gets it
    pub fn take_input_receiver(&mut self) -> Option<mpsc::Receiver<SurfaceInput>> {
        self.input_rx.take()
    }
}

impl Drop for SurfaceDriver {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// MIDI port discovery utilities
pub mod discovery {
    use super::*;

    /// Information about a MIDI port
    #[derive(Debug, Clone)]
    pub struct PortInfo {
        pub index: usize,
        pub name: String,
        pub is_virtual: bool,
    }

    pub fn is_virtual_port(name: &str) -> bool {
        name.contains("Virtual") || name.contains("loopMIDI") || name.contains("IAC")
    }

    /// Discover input ports
    pub fn discover_input_ports() -> Result<Vec<PortInfo>> {
        let midi_in = MidiInput::new("MCU-Surface-Discovery")?;

        let mut port_infos = Vec::new();
        for (index, port) in midi_in.ports().iter().enumerate() {
            if let Ok(name) = midi_in.port_name(port) {
                port_infos.push(PortInfo {
                    index,
                    is_virtual: is_virtual_port(&name),
                    name,
                });
            }
        }

        Ok(port_infos)
    }
}

//! Mackie Control Universal surface codec
//!
//! `surface` holds the protocol core: decoding host messages into surface
//! events, mirroring surface state and encoding outbound messages. The other
//! modules support the `mcu-surface` monitor binary.

pub mod config;
pub mod driver;
pub mod midi;
pub mod sniffer;
pub mod surface;

//! MCU surface monitor
//!
//! Listens to the MIDI stream a DAW sends to a Mackie Control surface and
//! prints the decoded surface events.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mcu_surface::config::MonitorConfig;
use mcu_surface::driver::SurfaceDriver;
use mcu_surface::midi::format_hex;
use mcu_surface::sniffer::{self, Sniffer};
use mcu_surface::surface::{Surface, SurfaceClock, SurfaceEvent, Timestamp};

/// MCU surface monitor - decode what a DAW sends to a Mackie Control surface
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Input port name pattern, overrides midi.input_port
    #[arg(short, long)]
    port: Option<String>,

    /// List available MIDI input ports
    #[arg(long)]
    list_ports: bool,

    /// Print events and logs as JSON lines
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    init_logging(&args.log_level, args.json)?;

    if args.list_ports {
        return sniffer::list_ports_formatted();
    }

    let config = load_config(&args).await?;
    info!("Monitoring input port pattern '{}'", config.midi.input_port);

    run_monitor(config, shutdown_signal()).await?;

    info!("Monitor shutdown complete");
    Ok(())
}

/// Config file if present, otherwise defaults for `--port`
async fn load_config(args: &Args) -> Result<MonitorConfig> {
    let config = match &args.port {
        Some(port) if !Path::new(&args.config).exists() => {
            debug!("No config file at {}, using defaults", args.config);
            MonitorConfig::for_port(port.clone())
        }
        _ => {
            info!("Configuration file: {}", args.config);
            MonitorConfig::read(&args.config).await?
        }
    };

    let config = config.with_overrides(args.port.as_deref(), args.json);
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

async fn run_monitor(config: MonitorConfig, shutdown: impl std::future::Future<Output = ()>) -> Result<()> {
    let clock = SurfaceClock::new();

    let mut driver = SurfaceDriver::new(config.midi.input_port.clone(), clock);
    driver.connect()?;

    let mut input_rx = driver
        .take_input_receiver()
        .ok_or_else(|| anyhow::anyhow!("Failed to get surface input receiver"))?;

    let sniffer = Sniffer::new(config.output.format);
    sniffer.print_header(&config.midi.input_port);

    let mut surface = Surface::with_timeouts(Vec::new(), config.surface.timeouts());

    let mut ticker = tokio::time::interval(config.surface.tick_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            Some(input) = input_rx.recv() => {
                trace!("Received: {} | {}", format_hex(&input.raw_data), input.message);

                let was_connected = surface.is_connected();
                surface.dispatch(&input.message, input.timestamp);
                if !was_connected && surface.is_connected() {
                    info!("Host heartbeat detected");
                }

                flush_events(&sniffer, &mut surface, input.timestamp)?;
            }

            _ = ticker.tick() => {
                let now = clock.now();
                surface.tick(now);
                flush_events(&sniffer, &mut surface, now)?;
            }

            _ = &mut shutdown => {
                info!("Shutdown signal received, stopping monitor");
                break;
            }
        }
    }

    driver.disconnect();
    Ok(())
}

/// Print and drain everything the surface decoded since the last call
fn flush_events(sniffer: &Sniffer, surface: &mut Surface<Vec<SurfaceEvent>>, now: Timestamp) -> Result<()> {
    let events = std::mem::take(surface.sink_mut());

    for event in &events {
        if let SurfaceEvent::HeartbeatTimeout = event {
            warn!("No heartbeat from host for {:?}", surface.timeouts().heartbeat);
        }
        sniffer.print_event(event, surface, now)?;
    }

    Ok(())
}

fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    // Events own stdout; logs go to stderr
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    if json {
        tracing_subscriber::registry().with(filter).with(layer.json()).init();
    } else {
        tracing_subscriber::registry().with(filter).with(layer).init();
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

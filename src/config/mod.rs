//! Configuration management for the surface monitor
//!
//! Handles loading, parsing and validating the YAML configuration file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::fs;

use crate::surface::Timeouts;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MonitorConfig {
    pub midi: MidiConfig,
    #[serde(default)]
    pub surface: SurfaceConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// MIDI port configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MidiConfig {
    /// Case-insensitive substring of the input port name
    pub input_port: String,
}

/// Surface timing
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SurfaceConfig {
    #[serde(default = "default_heartbeat_timeout")]
    pub heartbeat_timeout_ms: u64,
    #[serde(default = "default_meter_decay")]
    pub meter_decay_ms: u64,
    /// How often the monitor runs the timeout checks
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            heartbeat_timeout_ms: default_heartbeat_timeout(),
            meter_decay_ms: default_meter_decay(),
            tick_interval_ms: default_tick_interval(),
        }
    }
}

impl SurfaceConfig {
    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            heartbeat: Duration::from_millis(self.heartbeat_timeout_ms),
            meter_decay: Duration::from_millis(self.meter_decay_ms),
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Event output configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

/// How decoded events are printed
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Timestamps are 32-bit microsecond counters; longer windows never expire
const MAX_WINDOW_MS: u64 = u32::MAX as u64 / 1000;

impl MonitorConfig {
    /// Default configuration listening on `input_port`
    pub fn for_port(input_port: impl Into<String>) -> Self {
        Self {
            midi: MidiConfig {
                input_port: input_port.into(),
            },
            surface: SurfaceConfig::default(),
            output: OutputConfig::default(),
        }
    }

    /// Load configuration from file with validation
    pub async fn load(path: &str) -> Result<Self> {
        let config = Self::read(path).await?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file without validating it
    ///
    /// For callers that still override fields before calling `validate`.
    pub async fn read(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path))?;

        serde_yaml::from_str(&contents).with_context(|| format!("Failed to parse YAML config: {}", path))
    }

    /// Apply command line overrides on top of the file settings
    pub fn with_overrides(mut self, input_port: Option<&str>, json: bool) -> Self {
        if let Some(port) = input_port {
            self.midi.input_port = port.to_string();
        }
        if json {
            self.output.format = OutputFormat::Json;
        }
        self
    }

    /// Validate configuration for correctness and consistency
    pub fn validate(&self) -> Result<()> {
        if self.midi.input_port.trim().is_empty() {
            anyhow::bail!("MIDI input_port cannot be empty");
        }

        let surface = &self.surface;
        if surface.tick_interval_ms == 0 {
            anyhow::bail!("surface.tick_interval_ms must be greater than 0");
        }
        if surface.heartbeat_timeout_ms == 0 || surface.heartbeat_timeout_ms > MAX_WINDOW_MS {
            anyhow::bail!(
                "surface.heartbeat_timeout_ms must be between 1 and {} (got {})",
                MAX_WINDOW_MS,
                surface.heartbeat_timeout_ms
            );
        }
        if surface.meter_decay_ms == 0 || surface.meter_decay_ms > MAX_WINDOW_MS {
            anyhow::bail!(
                "surface.meter_decay_ms must be between 1 and {} (got {})",
                MAX_WINDOW_MS,
                surface.meter_decay_ms
            );
        }

        Ok(())
    }
}

// Default value functions
fn default_heartbeat_timeout() -> u64 { 5000 }
fn default_meter_decay() -> u64 { 1000 }
fn default_tick_interval() -> u64 { 100 }

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, contents: &str) -> Result<String> {
        let path = dir.path().join("config.yaml");
        fs::write(&path, contents)?;
        Ok(path.to_string_lossy().to_string())
    }

    #[tokio::test]
    async fn test_minimal_config_uses_defaults() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = write_config(
            &temp_dir,
            r#"
midi:
  input_port: "X-Touch"
"#,
        )?;

        let config = MonitorConfig::load(&path).await?;

        assert_eq!(config.midi.input_port, "X-Touch");
        assert_eq!(config.surface.heartbeat_timeout_ms, 5000);
        assert_eq!(config.surface.meter_decay_ms, 1000);
        assert_eq!(config.surface.tick_interval(), Duration::from_millis(100));
        assert_eq!(config.output.format, OutputFormat::Text);
        assert_eq!(config.surface.timeouts(), Timeouts::default());

        Ok(())
    }

    #[tokio::test]
    async fn test_port_override_replaces_empty_file_port() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = write_config(
            &temp_dir,
            r#"
midi:
  input_port: ""
"#,
        )?;

        assert!(MonitorConfig::load(&path).await.is_err());

        let config = MonitorConfig::read(&path).await?.with_overrides(Some("MCU Pro"), true);
        config.validate()?;

        assert_eq!(config.midi.input_port, "MCU Pro");
        assert_eq!(config.output.format, OutputFormat::Json);

        Ok(())
    }

    #[tokio::test]
    async fn test_full_config() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = write_config(
            &temp_dir,
            r#"
midi:
  input_port: "MCU Pro"
surface:
  heartbeat_timeout_ms: 2500
  meter_decay_ms: 300
  tick_interval_ms: 20
output:
  format: json
"#,
        )?;

        let config = MonitorConfig::load(&path).await?;

        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.surface.timeouts().heartbeat, Duration::from_millis(2500));
        assert_eq!(config.surface.timeouts().meter_decay, Duration::from_millis(300));

        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_configs_are_rejected() -> Result<()> {
        let temp_dir = TempDir::new()?;

        let path = write_config(&temp_dir, "midi:\n  input_port: \"\"\n")?;
        let err = MonitorConfig::load(&path).await.unwrap_err();
        assert!(err.to_string().contains("input_port"));

        let path = write_config(
            &temp_dir,
            "midi:\n  input_port: \"X-Touch\"\nsurface:\n  tick_interval_ms: 0\n",
        )?;
        let err = MonitorConfig::load(&path).await.unwrap_err();
        assert!(err.to_string().contains("tick_interval_ms"));

        let path = write_config(&temp_dir, "surface:\n  meter_decay_ms: 10\n")?;
        assert!(MonitorConfig::load(&path).await.is_err());

        Ok(())
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = MonitorConfig::load("/nonexistent/config.yaml").await.unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}

// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Configuration for the connection manager.
//!
//! Settings are read from a TOML file; every field has a default so an empty
//! file (or no file at all) yields a working configuration.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Root settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Settings {
    /// Port selection and addressing
    #[serde(default)]
    pub midi: MidiSettings,
    /// Query timing
    #[serde(default)]
    pub query: QuerySettings,
    /// Listener thread tuning
    #[serde(default)]
    pub listener: ListenerSettings,
}

impl Settings {
    /// Load settings from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let settings = Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings from a TOML string
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Serialize to a TOML string
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save settings to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let text = self.to_toml()?;
        fs::write(path.as_ref(), text)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.midi.unit_id > 15 {
            return Err(Error::Config(format!(
                "unit_id must be 0-15, got {}",
                self.midi.unit_id
            )));
        }
        if !(1..=16).contains(&self.midi.channel) {
            return Err(Error::Config(format!(
                "channel must be 1-16, got {}",
                self.midi.channel
            )));
        }
        if self.query.timeout_ms == 0 {
            return Err(Error::Config("query timeout must be positive".into()));
        }
        if !(MIN_DELAY_MS..=MAX_DELAY_MS).contains(&self.query.delay_ms) {
            return Err(Error::Config(format!(
                "query delay must be {}-{} ms, got {}",
                MIN_DELAY_MS, MAX_DELAY_MS, self.query.delay_ms
            )));
        }
        if self.query.retry_count == 0 {
            return Err(Error::Config("retry_count must be at least 1".into()));
        }
        if self.listener.poll_interval_ms == 0 {
            return Err(Error::Config("listener poll interval must be positive".into()));
        }
        Ok(())
    }
}

const MIN_DELAY_MS: u64 = 100;
const MAX_DELAY_MS: u64 = 5000;

/// MIDI port and addressing settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MidiSettings {
    /// Input port to open on startup
    #[serde(default)]
    pub input_port: Option<String>,
    /// Output port to open on startup
    #[serde(default)]
    pub output_port: Option<String>,
    /// SysEx unit id (0-15)
    #[serde(default)]
    pub unit_id: u8,
    /// MIDI channel (1-16)
    #[serde(default = "default_channel")]
    pub channel: u8,
}

impl MidiSettings {
    /// Channel as a 0-15 index
    pub fn channel_index(&self) -> u8 {
        self.channel.saturating_sub(1).min(15)
    }
}

fn default_channel() -> u8 {
    1
}

impl Default for MidiSettings {
    fn default() -> Self {
        Self {
            input_port: None,
            output_port: None,
            unit_id: 0,
            channel: default_channel(),
        }
    }
}

/// Query/response timing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuerySettings {
    /// How long a single query waits for its response
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Pause between queries of a bulk read
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    /// Attempts per parameter in a bulk read
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
}

impl QuerySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

fn default_timeout_ms() -> u64 {
    3000
}
fn default_delay_ms() -> u64 {
    400
}
fn default_retry_count() -> u32 {
    3
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            delay_ms: default_delay_ms(),
            retry_count: default_retry_count(),
        }
    }
}

/// Listener thread tuning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListenerSettings {
    /// Longest single wait on the input port before re-checking for stop
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// How long disconnect waits for the listener to exit
    #[serde(default = "default_join_timeout_ms")]
    pub join_timeout_ms: u64,
}

impl ListenerSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }
}

fn default_poll_interval_ms() -> u64 {
    5
}
fn default_join_timeout_ms() -> u64 {
    2000
}

impl Default for ListenerSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            join_timeout_ms: default_join_timeout_ms(),
        }
    }
}

//! RPC configuration parameters
//!
//! Addresses, timeouts and limits for the TCP transport and serve loop.
//! Values come from defaults or a JSON file supplied by the caller.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Smallest accepted `max_frame_size`; a bare error reply always fits.
pub const MIN_FRAME_SIZE: u32 = 64;

/// Transport and serve-loop configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    // --- Addresses ---
    /// Address the server listens on
    pub bind_addr: String,
    /// Address the client connects to
    pub connect_addr: String,

    // --- Timeouts ---
    /// TCP connect timeout (milliseconds)
    pub connect_timeout_ms: u32,
    /// How long a client waits for a reply (milliseconds)
    pub recv_timeout_ms: u32,
    /// Write timeout for a single message (milliseconds)
    pub send_timeout_ms: u32,
    /// Server accept/receive poll granularity for observing the stop signal
    pub poll_interval_ms: u32,

    // --- Limits ---
    /// Largest message payload accepted off the wire (bytes)
    pub max_frame_size: u32,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5555".into(),
            connect_addr: "127.0.0.1:5555".into(),

            connect_timeout_ms: 5000,
            recv_timeout_ms: 5000,
            send_timeout_ms: 5000,
            poll_interval_ms: 50,

            max_frame_size: 16 * 1024 * 1024, // 16 MiB
        }
    }
}

impl RpcConfig {
    /// Parse a JSON document, filling missing fields from defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.connect_timeout_ms == 0 || self.recv_timeout_ms == 0 || self.send_timeout_ms == 0 {
            return Err(Error::Config("timeouts must be non-zero".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::Config("poll_interval_ms must be non-zero".into()));
        }
        if self.max_frame_size < MIN_FRAME_SIZE {
            return Err(Error::Config(format!(
                "max_frame_size must be at least {MIN_FRAME_SIZE}"
            )));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.connect_timeout_ms))
    }

    pub fn recv_timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.recv_timeout_ms))
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.send_timeout_ms))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.poll_interval_ms))
    }

    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size as usize
    }
}

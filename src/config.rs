//! Configuration for the queued client
//!
//! Centralized configuration with sensible defaults. The daemon address has
//! no default: both observed daemon builds listen on different ports, so the
//! caller always names the endpoint.

use std::time::Duration;

use crate::error::{QueueError, Result};

/// Port used by the older `push`/`pop`/`qsize` daemon
pub const LEGACY_PORT: u16 = 21021;

/// Port used by the `enqueue`/`dequeue`/`size` daemon
pub const DEFAULT_PORT: u16 = 21012;

/// Default upper bound on a job body declared by a reply (16 MB)
pub const DEFAULT_MAX_JOB_SIZE: usize = 16 * 1024 * 1024;

/// Connection configuration for a client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    // -------------------------------------------------------------------------
    // Endpoint
    // -------------------------------------------------------------------------
    /// Daemon address (host:port)
    pub addr: String,

    // -------------------------------------------------------------------------
    // Socket Options
    // -------------------------------------------------------------------------
    /// Connect timeout (milliseconds, 0 = OS default)
    pub connect_timeout_ms: u64,

    /// Read timeout (milliseconds, 0 = block forever)
    pub read_timeout_ms: u64,

    /// Write timeout (milliseconds, 0 = block forever)
    pub write_timeout_ms: u64,

    /// Disable Nagle's algorithm
    pub nodelay: bool,

    // -------------------------------------------------------------------------
    // Protocol Limits
    // -------------------------------------------------------------------------
    /// Largest job body a reply may declare
    pub max_job_size: usize,
}

impl ClientConfig {
    /// Create a new config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Shorthand for a config with only the address set
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            connect_timeout_ms: 5000,
            read_timeout_ms: 0,
            write_timeout_ms: 0,
            nodelay: true,
            max_job_size: DEFAULT_MAX_JOB_SIZE,
        }
    }

    pub(crate) fn connect_timeout(&self) -> Option<Duration> {
        millis(self.connect_timeout_ms)
    }

    pub(crate) fn read_timeout(&self) -> Option<Duration> {
        millis(self.read_timeout_ms)
    }

    pub(crate) fn write_timeout(&self) -> Option<Duration> {
        millis(self.write_timeout_ms)
    }
}

fn millis(ms: u64) -> Option<Duration> {
    if ms > 0 {
        Some(Duration::from_millis(ms))
    } else {
        None
    }
}

/// Builder for ClientConfig
#[derive(Default)]
pub struct ClientConfigBuilder {
    addr: Option<String>,
    connect_timeout_ms: Option<u64>,
    read_timeout_ms: Option<u64>,
    write_timeout_ms: Option<u64>,
    nodelay: Option<bool>,
    max_job_size: Option<usize>,
}

impl ClientConfigBuilder {
    /// Set the daemon address (host:port)
    pub fn addr(mut self, addr: impl Into<String>) -> Self {
        self.addr = Some(addr.into());
        self
    }

    /// Set the connect timeout (in milliseconds)
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.connect_timeout_ms = Some(ms);
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.read_timeout_ms = Some(ms);
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.write_timeout_ms = Some(ms);
        self
    }

    /// Enable or disable TCP_NODELAY
    pub fn nodelay(mut self, nodelay: bool) -> Self {
        self.nodelay = Some(nodelay);
        self
    }

    /// Set the largest job body a reply may declare (in bytes)
    pub fn max_job_size(mut self, size: usize) -> Self {
        self.max_job_size = Some(size);
        self
    }

    pub fn build(self) -> Result<ClientConfig> {
        let addr = self
            .addr
            .filter(|a| !a.trim().is_empty())
            .ok_or_else(|| QueueError::Config("daemon address is required".to_string()))?;

        let mut config = ClientConfig::new(addr);
        if let Some(ms) = self.connect_timeout_ms {
            config.connect_timeout_ms = ms;
        }
        if let Some(ms) = self.read_timeout_ms {
            config.read_timeout_ms = ms;
        }
        if let Some(ms) = self.write_timeout_ms {
            config.write_timeout_ms = ms;
        }
        if let Some(nodelay) = self.nodelay {
            config.nodelay = nodelay;
        }
        if let Some(size) = self.max_job_size {
            if size == 0 {
                return Err(QueueError::Config("max_job_size must be positive".to_string()));
            }
            config.max_job_size = size;
        }

        Ok(config)
    }
}

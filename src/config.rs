//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::Path;
use std::time::Duration;

use crate::error::{BridgeError, Result};
use crate::net::MAX_DATAGRAM_SIZE;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub sampling: SamplingConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// UDP endpoint configuration
#[derive(Debug, Deserialize, Clone)]
pub struct NetworkConfig {
    #[serde(default = "default_broadcast_addr")]
    pub broadcast_addr: String,

    #[serde(default = "default_broadcast_port")]
    pub broadcast_port: u16,

    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    #[serde(default = "default_recv_buffer_size")]
    pub recv_buffer_size: usize,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

/// Sampling configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SamplingConfig {
    #[serde(default = "default_engine_count")]
    pub engine_count: usize,

    #[serde(default = "default_wow_count")]
    pub wow_count: usize,

    #[serde(default = "default_gear_count")]
    pub gear_count: usize,

    /// Cycle rate used when the CLI drives the bridge itself
    #[serde(default = "default_rate_hz")]
    pub rate_hz: u32,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub log_dir: String,
}

// Default value functions
fn default_broadcast_addr() -> String { "127.255.255.255".to_string() }
fn default_broadcast_port() -> u16 { 34390 }
fn default_listen_addr() -> String { "127.0.0.1".to_string() }
fn default_listen_port() -> u16 { 34391 }
fn default_recv_buffer_size() -> usize { 1024 }
fn default_poll_interval_ms() -> u64 { 10 }

fn default_engine_count() -> usize { 4 }
fn default_wow_count() -> usize { 4 }
fn default_gear_count() -> usize { 3 }
fn default_rate_hz() -> u32 { 60 }

fn default_log_level() -> String { "info".to_string() }

/// X-Plane engine data refs are float[16]
pub const MAX_ENGINES: usize = 16;

/// X-Plane gear data refs are float[10]
pub const MAX_GEAR: usize = 10;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            broadcast_addr: default_broadcast_addr(),
            broadcast_port: default_broadcast_port(),
            listen_addr: default_listen_addr(),
            listen_port: default_listen_port(),
            recv_buffer_size: default_recv_buffer_size(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            engine_count: default_engine_count(),
            wow_count: default_wow_count(),
            gear_count: default_gear_count(),
            rate_hz: default_rate_hz(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_dir: String::new(),
        }
    }
}

impl NetworkConfig {
    /// Outbound telemetry target
    ///
    /// # Errors
    ///
    /// Returns error if `broadcast_addr` is not an IPv4 address
    pub fn broadcast_target(&self) -> Result<SocketAddr> {
        let ip = parse_ipv4("broadcast_addr", &self.broadcast_addr)?;
        Ok(SocketAddr::V4(SocketAddrV4::new(ip, self.broadcast_port)))
    }

    /// Local endpoint the inbound listener binds to
    ///
    /// # Errors
    ///
    /// Returns error if `listen_addr` is not an IPv4 address
    pub fn listen_endpoint(&self) -> Result<SocketAddr> {
        let ip = parse_ipv4("listen_addr", &self.listen_addr)?;
        Ok(SocketAddr::V4(SocketAddrV4::new(ip, self.listen_port)))
    }

    /// Bounded wait of one listener receive
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn parse_ipv4(field: &str, value: &str) -> Result<Ipv4Addr> {
    value.parse::<Ipv4Addr>().map_err(|_| {
        BridgeError::Config(toml::de::Error::custom(format!(
            "{} '{}' is not a valid IPv4 address",
            field, value
        )))
    })
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use telem_bridge::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        let target = self.network.broadcast_target()?;
        let listen = self.network.listen_endpoint()?;

        if self.network.broadcast_port == 0 || self.network.listen_port == 0 {
            return Err(BridgeError::Config(
                toml::de::Error::custom("broadcast_port and listen_port must be non-zero")
            ));
        }

        // A shared endpoint would loop outbound telemetry back into the listener
        if target.ip() == listen.ip() && target.port() == listen.port() {
            return Err(BridgeError::Config(
                toml::de::Error::custom("broadcast_port must differ from listen_port on the same address")
            ));
        }

        if self.network.recv_buffer_size < 64 || self.network.recv_buffer_size > MAX_DATAGRAM_SIZE {
            return Err(BridgeError::Config(
                toml::de::Error::custom(format!("recv_buffer_size must be between 64 and {}", MAX_DATAGRAM_SIZE))
            ));
        }

        if self.network.poll_interval_ms == 0 || self.network.poll_interval_ms > 1000 {
            return Err(BridgeError::Config(
                toml::de::Error::custom("poll_interval_ms must be between 1 and 1000")
            ));
        }

        if self.sampling.engine_count == 0 || self.sampling.engine_count > MAX_ENGINES {
            return Err(BridgeError::Config(
                toml::de::Error::custom(format!("engine_count must be between 1 and {}", MAX_ENGINES))
            ));
        }

        for (name, value) in [
            ("wow_count", self.sampling.wow_count),
            ("gear_count", self.sampling.gear_count),
        ] {
            if value == 0 || value > MAX_GEAR {
                return Err(BridgeError::Config(
                    toml::de::Error::custom(format!("{} must be between 1 and {}", name, MAX_GEAR))
                ));
            }
        }

        if self.sampling.rate_hz == 0 || self.sampling.rate_hz > 1000 {
            return Err(BridgeError::Config(
                toml::de::Error::custom("rate_hz must be between 1 and 1000")
            ));
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(BridgeError::Config(
                toml::de::Error::custom("log level must be one of: trace, debug, info, warn, error")
            ));
        }

        Ok(())
    }
}

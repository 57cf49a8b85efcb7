//! # Error Types
//!
//! Custom error types for the telemetry bridge using `thiserror`.

use thiserror::Error;

/// Main error type for the telemetry bridge
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Telemetry line could not be decoded
    #[error("Wire format error: {0}")]
    Wire(String),

    /// Socket creation, binding or configuration failed
    #[error("Socket error: {0}")]
    Socket(String),

    /// Encoded line does not fit in one UDP datagram
    #[error("Datagram of {size} bytes exceeds maximum {max}")]
    PayloadTooLarge { size: usize, max: usize },

    /// Bridge was started twice without a stop in between
    #[error("Bridge already started")]
    AlreadyStarted,

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for the telemetry bridge
pub type Result<T> = std::result::Result<T, BridgeError>;

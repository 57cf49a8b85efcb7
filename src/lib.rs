//! # Telemetry Bridge Library
//!
//! Broadcast flight simulator telemetry over UDP for force-feedback processing.
//!
//! This library samples simulator state once per host frame, encodes it as a
//! flat `key=value;` text line and broadcasts it as a single datagram, while a
//! separate listener thread receives inbound control datagrams.

pub mod bridge;
pub mod config;
pub mod error;
pub mod net;
pub mod plugin;
pub mod sim;
pub mod telemetry;
pub mod wire;

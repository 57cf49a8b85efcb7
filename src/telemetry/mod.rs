//! # Telemetry Module
//!
//! Turns simulator state into one keyed [`Snapshot`] per sampling cycle.
//!
//! This module handles:
//! - Unit conversion constants
//! - Fixed-precision value formatting
//! - The fixed telemetry key set
//! - Reading every tracked data ref into a snapshot

pub mod builder;
pub mod format;
pub mod snapshot;
pub mod units;

pub use builder::SnapshotBuilder;
pub use snapshot::Snapshot;

//! # Wire Module
//!
//! The telemetry line grammar: `(<key>=<value>;)*`, one line per datagram,
//! no escaping. Array values separate their elements with `~`.

pub mod decoder;
pub mod encoder;

pub use decoder::{decode_datagram, decode_line, TelemetryValue};
pub use encoder::encode;

/// Terminates every `key=value` record
pub const FIELD_TERMINATOR: char = ';';

/// Separates a key from its value
pub const KEY_VALUE_SEPARATOR: char = '=';

/// Separates elements inside an array value
pub const ARRAY_SEPARATOR: char = '~';

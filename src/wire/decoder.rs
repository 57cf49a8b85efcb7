//! # Telemetry Line Decoder
//!
//! Parses telemetry lines the way the receiving application does: split on
//! `;`, then on the first `=`. Field order carries no meaning.

use serde::Serialize;

use super::{ARRAY_SEPARATOR, FIELD_TERMINATOR, KEY_VALUE_SEPARATOR};
use crate::error::{BridgeError, Result};
use crate::telemetry::Snapshot;

/// Decode a telemetry line into a snapshot
///
/// Empty segments (including the one after the final `;`) are skipped.
///
/// # Errors
///
/// Returns error if:
/// - A segment has no `=`
/// - A segment has an empty key
/// - A key appears twice
///
/// # Examples
///
/// ```
/// use telem_bridge::wire::decode_line;
///
/// let snapshot = decode_line("G=1.000;N=Cessna172;")?;
/// assert_eq!(snapshot.get("N"), Some("Cessna172"));
/// # Ok::<(), telem_bridge::error::BridgeError>(())
/// ```
pub fn decode_line(line: &str) -> Result<Snapshot> {
    let mut snapshot = Snapshot::new();

    for segment in line.split(FIELD_TERMINATOR).filter(|s| !s.is_empty()) {
        let (key, value) = segment.split_once(KEY_VALUE_SEPARATOR).ok_or_else(|| {
            BridgeError::Wire(format!("Record without '{}': {:?}", KEY_VALUE_SEPARATOR, segment))
        })?;

        if key.is_empty() {
            return Err(BridgeError::Wire(format!("Record with empty key: {:?}", segment)));
        }

        if snapshot.insert(key, value).is_some() {
            return Err(BridgeError::Wire(format!("Duplicate key: {}", key)));
        }
    }

    Ok(snapshot)
}

/// Decode a received datagram
///
/// Trailing NUL bytes and line endings are ignored.
///
/// # Errors
///
/// Returns error if the payload is not UTF-8 or [`decode_line`] fails
pub fn decode_datagram(payload: &[u8]) -> Result<Snapshot> {
    let line = std::str::from_utf8(payload)
        .map_err(|e| BridgeError::Wire(format!("Datagram is not UTF-8: {}", e)))?;

    decode_line(line.trim_end_matches(['\0', '\r', '\n']))
}

/// A field value typed the way the receiver reads it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TelemetryValue {
    Number(f64),
    Array(Vec<f64>),
    Text(String),
}

impl TelemetryValue {
    /// Type a raw field value
    ///
    /// Values containing `~` become arrays when every element is numeric;
    /// anything non-numeric stays text.
    ///
    /// # Examples
    ///
    /// ```
    /// use telem_bridge::wire::TelemetryValue;
    ///
    /// assert_eq!(TelemetryValue::parse("1.500"), TelemetryValue::Number(1.5));
    /// assert_eq!(TelemetryValue::parse("1.000~2.000"), TelemetryValue::Array(vec![1.0, 2.0]));
    /// assert_eq!(TelemetryValue::parse("XPLANE"), TelemetryValue::Text("XPLANE".into()));
    /// ```
    pub fn parse(raw: &str) -> Self {
        if raw.contains(ARRAY_SEPARATOR) {
            let elements: std::result::Result<Vec<f64>, _> =
                raw.split(ARRAY_SEPARATOR).map(str::parse::<f64>).collect();

            return match elements {
                Ok(values) => TelemetryValue::Array(values),
                Err(_) => TelemetryValue::Text(raw.to_string()),
            };
        }

        match raw.parse::<f64>() {
            Ok(value) => TelemetryValue::Number(value),
            Err(_) => TelemetryValue::Text(raw.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TelemetryValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[f64]> {
        match self {
            TelemetryValue::Array(values) => Some(values.as_slice()),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            TelemetryValue::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }
}

//! # Telemetry Line Encoder
//!
//! Serializes a [`Snapshot`] into one flat text line.

use super::{FIELD_TERMINATOR, KEY_VALUE_SEPARATOR};
use crate::telemetry::Snapshot;

/// Encode a snapshot as `key=value;` records in snapshot key order
///
/// No escaping is performed; snapshot values never contain `=` or `;`.
///
/// # Examples
///
/// ```
/// use telem_bridge::telemetry::Snapshot;
/// use telem_bridge::wire::encode;
///
/// let mut snapshot = Snapshot::new();
/// snapshot.insert("G", "1.000");
/// snapshot.insert("N", "Cessna172");
///
/// assert_eq!(encode(&snapshot), "G=1.000;N=Cessna172;");
/// ```
pub fn encode(snapshot: &Snapshot) -> String {
    let capacity = snapshot.iter().map(|(k, v)| k.len() + v.len() + 2).sum();
    let mut line = String::with_capacity(capacity);

    for (key, value) in snapshot.iter() {
        line.push_str(key);
        line.push(KEY_VALUE_SEPARATOR);
        line.push_str(value);
        line.push(FIELD_TERMINATOR);
    }

    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SamplingConfig;
    use crate::sim::SyntheticSim;
    use crate::telemetry::snapshot::keys;
    use crate::telemetry::SnapshotBuilder;

    #[test]
    fn test_encode_empty() {
        assert_eq!(encode(&Snapshot::new()), "");
    }

    #[test]
    fn test_encode_single_field() {
        let mut snapshot = Snapshot::new();
        snapshot.insert("src", "XPLANE");
        assert_eq!(encode(&snapshot), "src=XPLANE;");
    }

    #[test]
    fn test_encode_empty_value() {
        let mut snapshot = Snapshot::new();
        snapshot.insert("N", "");
        assert_eq!(encode(&snapshot), "N=;");
    }

    #[test]
    fn test_encode_array_value() {
        let mut snapshot = Snapshot::new();
        snapshot.insert("Gear", "1.000~1.000~0.500");
        assert_eq!(encode(&snapshot), "Gear=1.000~1.000~0.500;");
    }

    #[test]
    fn test_encode_every_record_terminated() {
        let sim = SyntheticSim::cessna();
        let snapshot = SnapshotBuilder::resolve(&sim, &SamplingConfig::default()).build(&sim);
        let line = encode(&snapshot);

        assert!(line.ends_with(';'));
        assert!(!line.contains('\n'));
        assert_eq!(line.matches(';').count(), keys::ALL.len());
        assert_eq!(line.matches('=').count(), keys::ALL.len());
    }

    #[test]
    fn test_encode_is_deterministic() {
        let sim = SyntheticSim::cessna();
        let builder = SnapshotBuilder::resolve(&sim, &SamplingConfig::default());

        assert_eq!(encode(&builder.build(&sim)), encode(&builder.build(&sim)));
    }
}

//! # Snapshot Builder
//!
//! Reads every tracked data ref through a [`SimAccessor`] and produces the
//! cycle's [`Snapshot`]. Pure function of current simulator state: no
//! sockets, no wire grammar.
//!
//! ## Composite Fields
//!
//! | Key | Components |
//! |-----|------------|
//! | `AccBody` | `local_ax`, `local_ay`, `local_az`, each ft/s² → g |
//! | `VelAcf` | `vx_acf_axis`, `vy_acf_axis`, `-vz_acf_axis` |
//!
//! ## Usage
//!
//! ```
//! use telem_bridge::config::SamplingConfig;
//! use telem_bridge::sim::SyntheticSim;
//! use telem_bridge::telemetry::SnapshotBuilder;
//!
//! let sim = SyntheticSim::cessna();
//! let builder = SnapshotBuilder::resolve(&sim, &SamplingConfig::default());
//! let snapshot = builder.build(&sim);
//!
//! assert_eq!(snapshot.get("N"), Some("Cessna_172SP"));
//! assert_eq!(snapshot.get("G"), Some("1.000"));
//! ```

use super::format::{format_array, format_converted, format_float, format_int, sanitize_text, strip_extension};
use super::snapshot::{keys, Snapshot, SOURCE_TAG};
use super::units::Conversion;
use crate::config::SamplingConfig;
use crate::sim::{DataRef, DataRefs, SimAccessor};
use crate::wire::ARRAY_SEPARATOR;

/// Builds one [`Snapshot`] per sampling cycle from resolved data refs
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    refs: DataRefs,
    engine_count: usize,
    wow_count: usize,
    gear_count: usize,
}

impl SnapshotBuilder {
    /// Create a builder over already-resolved handles
    pub fn new(refs: DataRefs, sampling: &SamplingConfig) -> Self {
        Self {
            refs,
            engine_count: sampling.engine_count,
            wow_count: sampling.wow_count,
            gear_count: sampling.gear_count,
        }
    }

    /// Resolve every data ref through `sim` and create a builder
    pub fn resolve<A: SimAccessor + ?Sized>(sim: &A, sampling: &SamplingConfig) -> Self {
        Self::new(DataRefs::resolve(sim), sampling)
    }

    /// Handles this builder reads
    pub fn refs(&self) -> &DataRefs {
        &self.refs
    }

    /// Snapshot the current simulator state
    ///
    /// Every key in [`keys::ALL`] is present; unresolved sources read as zero.
    pub fn build<A: SimAccessor + ?Sized>(&self, sim: &A) -> Snapshot {
        let r = &self.refs;
        let mut snapshot = Snapshot::new();

        let aircraft = sim.aircraft_model();
        snapshot.insert(keys::SOURCE, SOURCE_TAG);
        snapshot.insert(keys::AIRCRAFT_NAME, sanitize_text(strip_extension(&aircraft.file_name)));

        let paused = format_int(read_int(sim, r.paused));
        snapshot.insert(keys::STOP, paused.clone());
        snapshot.insert(keys::SIM_PAUSED, paused);
        snapshot.insert(keys::SIM_ON_GROUND, format_int(read_int(sim, r.on_ground)));
        snapshot.insert(keys::RETRACTABLE_GEAR, format_int(read_int(sim, r.gear_retractable)));
        snapshot.insert(keys::TIME, format_float(sim.elapsed_time()));

        let scalars = [
            (keys::G_NORMAL, r.g_normal, Conversion::Identity),
            (keys::G_AXIAL, r.g_axial, Conversion::Identity),
            (keys::G_SIDE, r.g_side, Conversion::Identity),
            (keys::TRUE_AIRSPEED, r.true_airspeed, Conversion::Identity),
            (keys::AIR_DENSITY, r.air_density, Conversion::Identity),
            (keys::DYNAMIC_PRESSURE, r.dynamic_pressure, Conversion::Identity),
            (keys::ANGLE_OF_ATTACK, r.alpha, Conversion::Identity),
            (keys::WARN_ALPHA, r.stall_warn_alpha, Conversion::Identity),
            (keys::SIDE_SLIP, r.beta, Conversion::Identity),
            (keys::VNE, r.vne, Conversion::KnotsToMps),
            (keys::VSO, r.vso, Conversion::KnotsToMps),
            (keys::VFE, r.vfe, Conversion::KnotsToMps),
            (keys::VLE, r.vle, Conversion::KnotsToMps),
            (keys::RUDDER_DEFLECTION, r.rudder_left, Conversion::Identity),
            (keys::RUDDER_DEFLECTION_LEFT, r.rudder_left, Conversion::Identity),
            (keys::RUDDER_DEFLECTION_RIGHT, r.rudder_right, Conversion::Identity),
            (keys::FLAPS, r.flap_ratio, Conversion::Identity),
        ];
        for (key, data_ref, conversion) in scalars {
            snapshot.insert(key, format_converted(read_float(sim, data_ref), conversion));
        }

        let arrays = [
            (keys::WEIGHT_ON_WHEELS, r.tire_deflection, self.wow_count, Conversion::Identity),
            (keys::ENGINE_RPM, r.engine_tacrad, self.engine_count, Conversion::RadPerSecToRpm),
            (keys::ENGINE_PERCENT, r.engine_n1, self.engine_count, Conversion::Identity),
            (keys::PROP_RPM, r.prop_tacrad, self.engine_count, Conversion::RadPerSecToRpm),
            (keys::PROP_THRUST, r.prop_thrust, self.engine_count, Conversion::Identity),
            (keys::GEAR, r.gear_deploy, self.gear_count, Conversion::Identity),
        ];
        for (key, data_ref, len, conversion) in arrays {
            snapshot.insert(key, format_array(&read_array(sim, data_ref, len), conversion));
        }

        let acc = r.acc_local.map(|data_ref| read_float(sim, data_ref));
        snapshot.insert(keys::ACC_BODY, format_array(&acc, Conversion::FeetPerSec2ToG));

        // Receiver expects forward velocity positive; X-Plane's z axis points aft
        let [vx, vy, vz] = r.vel_acf.map(|data_ref| read_float(sim, data_ref));
        snapshot.insert(keys::VEL_ACF, join_vector(&[vx, vy, -vz]));

        snapshot
    }
}

fn join_vector(components: &[f32]) -> String {
    components
        .iter()
        .map(|&c| format_float(c))
        .collect::<Vec<_>>()
        .join(&ARRAY_SEPARATOR.to_string())
}

fn read_float<A: SimAccessor + ?Sized>(sim: &A, data_ref: Option<DataRef>) -> f32 {
    data_ref.map(|r| sim.read_float(r)).unwrap_or(0.0)
}

fn read_int<A: SimAccessor + ?Sized>(sim: &A, data_ref: Option<DataRef>) -> i32 {
    data_ref.map(|r| sim.read_int(r)).unwrap_or(0)
}

fn read_array<A: SimAccessor + ?Sized>(sim: &A, data_ref: Option<DataRef>, len: usize) -> Vec<f32> {
    let mut values = vec![0.0; len];
    if let Some(r) = data_ref {
        sim.read_float_array(r, 0, &mut values);
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{datarefs, SyntheticSim};

    fn build(sim: &SyntheticSim) -> Snapshot {
        SnapshotBuilder::resolve(sim, &SamplingConfig::default()).build(sim)
    }

    #[test]
    fn test_all_keys_present() {
        let snapshot = build(&SyntheticSim::cessna());
        assert_eq!(snapshot.len(), keys::ALL.len());
        for key in keys::ALL {
            assert!(snapshot.contains_key(key), "missing {}", key);
        }
    }

    #[test]
    fn test_all_keys_present_without_data_refs() {
        let sim = SyntheticSim::new();
        let snapshot = build(&sim);

        assert_eq!(snapshot.len(), keys::ALL.len());
        assert_eq!(snapshot.get(keys::AIRCRAFT_NAME), Some(""));
        assert_eq!(snapshot.get(keys::SIM_PAUSED), Some("0"));
        assert_eq!(snapshot.get(keys::G_NORMAL), Some("0.000"));
        assert_eq!(snapshot.get(keys::ENGINE_RPM), Some("0.000~0.000~0.000~0.000"));
        assert_eq!(snapshot.get(keys::GEAR), Some("0.000~0.000~0.000"));
    }

    #[test]
    fn test_source_and_name() {
        let mut sim = SyntheticSim::cessna();
        sim.set_aircraft("Cessna172.acf", "Aircraft/Cessna172.acf");
        let snapshot = build(&sim);

        assert_eq!(snapshot.get(keys::SOURCE), Some("XPLANE"));
        assert_eq!(snapshot.get(keys::AIRCRAFT_NAME), Some("Cessna172"));

        sim.set_aircraft("NoExtensionName", "");
        assert_eq!(build(&sim).get(keys::AIRCRAFT_NAME), Some("NoExtensionName"));
    }

    #[test]
    fn test_aircraft_name_sanitized() {
        let mut sim = SyntheticSim::new();
        sim.set_aircraft("odd;name=1.acf", "");
        assert_eq!(build(&sim).get(keys::AIRCRAFT_NAME), Some("odd_name_1"));
    }

    #[test]
    fn test_pause_flags() {
        let mut sim = SyntheticSim::cessna();
        sim.set_int(datarefs::PAUSED, 1);
        let snapshot = build(&sim);

        assert_eq!(snapshot.get(keys::STOP), Some("1"));
        assert_eq!(snapshot.get(keys::SIM_PAUSED), Some("1"));
        assert_eq!(snapshot.get(keys::SIM_ON_GROUND), Some("1"));
        assert_eq!(snapshot.get(keys::RETRACTABLE_GEAR), Some("0"));
    }

    #[test]
    fn test_elapsed_time() {
        let mut sim = SyntheticSim::new();
        sim.set_elapsed_time(12.5);
        assert_eq!(build(&sim).get(keys::TIME), Some("12.500"));
    }

    #[test]
    fn test_speed_limits_converted() {
        let mut sim = SyntheticSim::new();
        sim.set_float(datarefs::VNE, 100.0);
        sim.set_float(datarefs::VSO, 0.0);
        let snapshot = build(&sim);

        assert_eq!(snapshot.get(keys::VNE), Some("51.444"));
        assert_eq!(snapshot.get(keys::VSO), Some("0.000"));
    }

    #[test]
    fn test_engine_arrays() {
        let mut sim = SyntheticSim::new();
        sim.set_float_array(datarefs::ENGINE_TACRAD, vec![10.0, 20.0, 0.0, 0.0, 99.0]);
        sim.set_float_array(datarefs::ENGINE_N1, vec![50.0, 60.0]);
        let snapshot = build(&sim);

        // Only engine_count elements are read, in order
        assert_eq!(snapshot.get(keys::ENGINE_RPM), Some("95.493~190.986~0.000~0.000"));
        // Short source arrays pad with zero
        assert_eq!(snapshot.get(keys::ENGINE_PERCENT), Some("50.000~60.000~0.000~0.000"));
    }

    #[test]
    fn test_array_lengths_follow_config() {
        let sim = SyntheticSim::cessna();
        let sampling = SamplingConfig {
            engine_count: 2,
            wow_count: 6,
            gear_count: 1,
            ..SamplingConfig::default()
        };
        let snapshot = SnapshotBuilder::resolve(&sim, &sampling).build(&sim);

        let separators = |key: &str| snapshot.get(key).unwrap().matches('~').count();
        assert_eq!(separators(keys::ENGINE_RPM), 1);
        assert_eq!(separators(keys::PROP_THRUST), 1);
        assert_eq!(separators(keys::WEIGHT_ON_WHEELS), 5);
        assert_eq!(separators(keys::GEAR), 0);
    }

    #[test]
    fn test_rudder_deflection() {
        let mut sim = SyntheticSim::new();
        sim.set_float(datarefs::RUDDER_LEFT, 4.0);
        sim.set_float(datarefs::RUDDER_RIGHT, -3.0);
        let snapshot = build(&sim);

        assert_eq!(snapshot.get(keys::RUDDER_DEFLECTION), Some("4.000"));
        assert_eq!(snapshot.get(keys::RUDDER_DEFLECTION_LEFT), Some("4.000"));
        assert_eq!(snapshot.get(keys::RUDDER_DEFLECTION_RIGHT), Some("-3.000"));
    }

    #[test]
    fn test_acc_body_composite() {
        let mut sim = SyntheticSim::new();
        sim.set_float(datarefs::ACC_LOCAL_X, 100.0);
        sim.set_float(datarefs::ACC_LOCAL_Y, 0.0);
        sim.set_float(datarefs::ACC_LOCAL_Z, -100.0);

        assert_eq!(build(&sim).get(keys::ACC_BODY), Some("3.108~0.000~-3.108"));
    }

    #[test]
    fn test_vel_acf_negates_z() {
        let mut sim = SyntheticSim::new();
        sim.set_float(datarefs::VEL_ACF_X, 1.0);
        sim.set_float(datarefs::VEL_ACF_Y, 2.0);
        sim.set_float(datarefs::VEL_ACF_Z, -50.0);

        assert_eq!(build(&sim).get(keys::VEL_ACF), Some("1.000~2.000~50.000"));
    }

    #[test]
    fn test_values_free_of_delimiters() {
        let mut sim = SyntheticSim::cessna();
        sim.advance(3.0);
        let snapshot = build(&sim);

        for (key, value) in snapshot.iter() {
            assert!(!value.contains(';') && !value.contains('='), "{}={}", key, value);
        }
    }
}

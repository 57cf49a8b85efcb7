//! # Telemetry Snapshot
//!
//! One sampling cycle's complete keyed record. Keys are unique and iterate
//! in a stable (sorted) order so the encoded line is reproducible.

use std::collections::BTreeMap;

/// Value of the `src` field identifying the sending simulator
pub const SOURCE_TAG: &str = "XPLANE";

/// Telemetry keys, as the receiving application reads them
pub mod keys {
    /// Sending simulator
    pub const SOURCE: &str = "src";
    /// Aircraft name (model file name without extension)
    pub const AIRCRAFT_NAME: &str = "N";
    /// Pause state, duplicated for older receivers
    pub const STOP: &str = "STOP";
    pub const SIM_PAUSED: &str = "SimPaused";
    pub const SIM_ON_GROUND: &str = "SimOnGround";
    pub const RETRACTABLE_GEAR: &str = "RetractableGear";
    /// Elapsed simulator time in seconds
    pub const TIME: &str = "T";
    pub const G_NORMAL: &str = "G";
    pub const G_AXIAL: &str = "Gaxil";
    pub const G_SIDE: &str = "Gside";
    pub const TRUE_AIRSPEED: &str = "TAS";
    pub const AIR_DENSITY: &str = "AirDensity";
    pub const DYNAMIC_PRESSURE: &str = "DynPressure";
    pub const ANGLE_OF_ATTACK: &str = "AoA";
    pub const WARN_ALPHA: &str = "WarnAlpha";
    pub const SIDE_SLIP: &str = "SideSlip";
    pub const VNE: &str = "Vne";
    pub const VSO: &str = "Vso";
    pub const VFE: &str = "Vfe";
    pub const VLE: &str = "Vle";
    pub const WEIGHT_ON_WHEELS: &str = "WeightOnWheels";
    pub const ENGINE_RPM: &str = "EngRPM";
    pub const ENGINE_PERCENT: &str = "EngPCT";
    pub const PROP_RPM: &str = "PropRPM";
    pub const PROP_THRUST: &str = "PropThrust";
    pub const RUDDER_DEFLECTION: &str = "RudderDefl";
    pub const RUDDER_DEFLECTION_LEFT: &str = "RudderDefl_l";
    pub const RUDDER_DEFLECTION_RIGHT: &str = "RudderDefl_r";
    /// Body acceleration x~y~z in g
    pub const ACC_BODY: &str = "AccBody";
    /// Aircraft-axis velocity x~y~z in m/s
    pub const VEL_ACF: &str = "VelAcf";
    pub const FLAPS: &str = "Flaps";
    pub const GEAR: &str = "Gear";

    /// Every key present in a built snapshot
    pub const ALL: &[&str] = &[
        SOURCE, AIRCRAFT_NAME, STOP, SIM_PAUSED, SIM_ON_GROUND, RETRACTABLE_GEAR,
        TIME, G_NORMAL, G_AXIAL, G_SIDE,
        TRUE_AIRSPEED, AIR_DENSITY, DYNAMIC_PRESSURE, ANGLE_OF_ATTACK, WARN_ALPHA, SIDE_SLIP,
        VNE, VSO, VFE, VLE,
        WEIGHT_ON_WHEELS, ENGINE_RPM, ENGINE_PERCENT, PROP_RPM, PROP_THRUST,
        RUDDER_DEFLECTION, RUDDER_DEFLECTION_LEFT, RUDDER_DEFLECTION_RIGHT,
        ACC_BODY, VEL_ACF, FLAPS, GEAR,
    ];
}

/// Ordered mapping of field name to its wire text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    fields: BTreeMap<String, String>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, returning the value it replaced
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.fields.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

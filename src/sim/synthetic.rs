//! # Synthetic Simulator
//!
//! In-process [`SimAccessor`] backed by a name → value table. The CLI uses it
//! to drive the bridge without a simulator attached; tests use it to pin
//! exact inputs.

use std::collections::HashMap;

use super::datarefs;
use super::{AircraftModel, DataRef, SimAccessor};

/// Value stored behind a synthetic data ref
#[derive(Debug, Clone, PartialEq)]
pub enum SimValue {
    Float(f32),
    Int(i32),
    FloatArray(Vec<f32>),
}

/// Table-driven simulator state
#[derive(Debug, Clone, Default)]
pub struct SyntheticSim {
    index: HashMap<String, usize>,
    values: Vec<SimValue>,
    elapsed: f32,
    aircraft: AircraftModel,
}

impl SyntheticSim {
    /// Empty simulator: no data refs published, no aircraft loaded
    pub fn new() -> Self {
        Self::default()
    }

    /// A parked Cessna 172 with the engine idling, every catalogue ref published
    pub fn cessna() -> Self {
        let mut sim = Self::new();
        sim.set_aircraft(
            "Cessna_172SP.acf",
            "Aircraft/Laminar Research/Cessna 172SP/Cessna_172SP.acf",
        );

        sim.set_int(datarefs::PAUSED, 0);
        sim.set_int(datarefs::ON_GROUND, 1);
        sim.set_int(datarefs::GEAR_RETRACTABLE, 0);
        sim.set_float(datarefs::FLAP_RATIO, 0.0);
        sim.set_float_array(datarefs::GEAR_DEPLOY, vec![1.0; 10]);
        sim.set_float(datarefs::G_AXIAL, 0.0);
        sim.set_float(datarefs::G_NORMAL, 1.0);
        sim.set_float(datarefs::G_SIDE, 0.0);
        sim.set_float(datarefs::ACC_LOCAL_X, 0.0);
        sim.set_float(datarefs::ACC_LOCAL_Y, 0.0);
        sim.set_float(datarefs::ACC_LOCAL_Z, 0.0);
        sim.set_float(datarefs::VEL_ACF_X, 0.0);
        sim.set_float(datarefs::VEL_ACF_Y, 0.0);
        sim.set_float(datarefs::VEL_ACF_Z, 0.0);
        sim.set_float(datarefs::TRUE_AIRSPEED, 0.0);
        sim.set_float(datarefs::AIR_DENSITY, 1.225);
        sim.set_float(datarefs::DYNAMIC_PRESSURE, 0.0);
        sim.set_float_array(datarefs::PROP_THRUST, single_engine(120.0));
        sim.set_float(datarefs::ALPHA, 0.0);
        sim.set_float(datarefs::STALL_WARN_ALPHA, 16.0);
        sim.set_float(datarefs::BETA, 0.0);
        sim.set_float_array(datarefs::TIRE_DEFLECTION, vec![0.02, 0.03, 0.03, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        sim.set_float_array(datarefs::ENGINE_TACRAD, single_engine(73.3));
        sim.set_float_array(datarefs::ENGINE_N1, single_engine(27.0));
        sim.set_float_array(datarefs::PROP_TACRAD, single_engine(73.3));
        sim.set_float(datarefs::RUDDER_LEFT, 0.0);
        sim.set_float(datarefs::RUDDER_RIGHT, 0.0);
        sim.set_float(datarefs::VNE, 163.0);
        sim.set_float(datarefs::VSO, 48.0);
        sim.set_float(datarefs::VFE, 110.0);
        sim.set_float(datarefs::VLE, 0.0);
        sim
    }

    /// Publish or overwrite a float data ref
    pub fn set_float(&mut self, name: &str, value: f32) {
        self.set(name, SimValue::Float(value));
    }

    /// Publish or overwrite an integer data ref
    pub fn set_int(&mut self, name: &str, value: i32) {
        self.set(name, SimValue::Int(value));
    }

    /// Publish or overwrite a float array data ref
    pub fn set_float_array(&mut self, name: &str, values: Vec<f32>) {
        self.set(name, SimValue::FloatArray(values));
    }

    pub fn set_elapsed_time(&mut self, seconds: f32) {
        self.elapsed = seconds;
    }

    pub fn set_aircraft(&mut self, file_name: &str, path: &str) {
        self.aircraft = AircraftModel {
            file_name: file_name.to_string(),
            path: path.to_string(),
        };
    }

    /// Current value of a published data ref
    pub fn value(&self, name: &str) -> Option<&SimValue> {
        self.index.get(name).map(|&i| &self.values[i])
    }

    /// Step the clock and move the airframe through a gentle taxi oscillation
    pub fn advance(&mut self, dt: f32) {
        self.elapsed += dt;
        let phase = self.elapsed * 0.5;

        self.set_float(datarefs::G_NORMAL, 1.0 + 0.05 * phase.sin());
        self.set_float(datarefs::G_SIDE, 0.02 * (phase * 1.3).cos());
        self.set_float(datarefs::ACC_LOCAL_X, 0.3 * phase.sin());
        self.set_float(datarefs::RUDDER_LEFT, 5.0 * (phase * 0.7).sin());
        self.set_float(datarefs::RUDDER_RIGHT, 5.0 * (phase * 0.7).sin());
        self.set_float(datarefs::VEL_ACF_Z, -5.0 - phase.sin());
        self.set_float(datarefs::TRUE_AIRSPEED, 5.0 + phase.sin());
    }

    fn set(&mut self, name: &str, value: SimValue) {
        match self.index.get(name) {
            Some(&i) => self.values[i] = value,
            None => {
                self.index.insert(name.to_string(), self.values.len());
                self.values.push(value);
            }
        }
    }
}

fn single_engine(value: f32) -> Vec<f32> {
    let mut values = vec![0.0; 16];
    values[0] = value;
    values
}

impl SimAccessor for SyntheticSim {
    fn find_data_ref(&self, name: &str) -> Option<DataRef> {
        self.index.get(name).copied().map(DataRef)
    }

    fn read_float(&self, data_ref: DataRef) -> f32 {
        match self.values.get(data_ref.0) {
            Some(SimValue::Float(v)) => *v,
            Some(SimValue::Int(v)) => *v as f32,
            Some(SimValue::FloatArray(values)) => values.first().copied().unwrap_or(0.0),
            None => 0.0,
        }
    }

    fn read_int(&self, data_ref: DataRef) -> i32 {
        match self.values.get(data_ref.0) {
            Some(SimValue::Int(v)) => *v,
            Some(SimValue::Float(v)) => *v as i32,
            Some(SimValue::FloatArray(values)) => values.first().map(|v| *v as i32).unwrap_or(0),
            None => 0,
        }
    }

    fn read_float_array(&self, data_ref: DataRef, offset: usize, out: &mut [f32]) -> usize {
        match self.values.get(data_ref.0) {
            Some(SimValue::FloatArray(values)) => {
                let available = values.get(offset..).unwrap_or(&[]);
                let count = available.len().min(out.len());
                out[..count].copy_from_slice(&available[..count]);
                count
            }
            _ => 0,
        }
    }

    fn elapsed_time(&self) -> f32 {
        self.elapsed
    }

    fn aircraft_model(&self) -> AircraftModel {
        self.aircraft.clone()
    }
}

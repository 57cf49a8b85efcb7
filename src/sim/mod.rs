//! # Simulator Access Module
//!
//! Narrow, typed view of the host simulator's data access API.
//!
//! This module handles:
//! - The [`SimAccessor`] capability trait the sampler reads through
//! - The catalogue of data refs the bridge tracks and their one-time resolution
//! - An in-process [`synthetic::SyntheticSim`] used by the CLI and tests

pub mod datarefs;
pub mod synthetic;

pub use datarefs::DataRefs;
pub use synthetic::SyntheticSim;

/// Opaque handle to a resolved simulator variable
///
/// Handles are issued by [`SimAccessor::find_data_ref`] and stay valid for
/// the lifetime of the host session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataRef(pub usize);

/// The user aircraft as reported by the host
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AircraftModel {
    /// Model file name, e.g. `Cessna_172SP.acf`
    pub file_name: String,
    /// Full path of the model file
    pub path: String,
}

/// Read access to simulator state
///
/// Production hosts implement this over the simulator SDK; tests and the CLI
/// use [`SyntheticSim`]. All reads are synchronous and must not block.
pub trait SimAccessor {
    /// Resolve a data ref by name, `None` if the host does not publish it
    fn find_data_ref(&self, name: &str) -> Option<DataRef>;

    /// Read a scalar float
    fn read_float(&self, data_ref: DataRef) -> f32;

    /// Read a scalar integer or boolean
    fn read_int(&self, data_ref: DataRef) -> i32;

    /// Copy array elements starting at `offset` into `out`
    ///
    /// Returns the number of elements written. Elements past that count are
    /// left untouched.
    fn read_float_array(&self, data_ref: DataRef, offset: usize, out: &mut [f32]) -> usize;

    /// Seconds since the simulator started
    fn elapsed_time(&self) -> f32;

    /// The user aircraft (aircraft index 0)
    fn aircraft_model(&self) -> AircraftModel;
}

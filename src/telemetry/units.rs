//! # Unit Conversions
//!
//! Scalar multipliers from simulator units to the units the receiver expects.

/// Knots to meters per second
pub const KT_TO_MPS: f32 = 0.51444;

/// Radians per second to revolutions per minute
pub const RADPS_TO_RPM: f32 = 9.5493;

/// Feet per second squared to g
pub const FPS2_TO_G: f32 = 0.031081;

/// Conversion applied to a field before formatting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Conversion {
    #[default]
    Identity,
    KnotsToMps,
    RadPerSecToRpm,
    FeetPerSec2ToG,
}

impl Conversion {
    /// Multiplier for this conversion
    #[must_use]
    pub const fn factor(self) -> f32 {
        match self {
            Conversion::Identity => 1.0,
            Conversion::KnotsToMps => KT_TO_MPS,
            Conversion::RadPerSecToRpm => RADPS_TO_RPM,
            Conversion::FeetPerSec2ToG => FPS2_TO_G,
        }
    }

    #[inline]
    #[must_use]
    pub fn apply(self, value: f32) -> f32 {
        value * self.factor()
    }
}

//! Scales used to convert between physical and non-dimensional quantities.
use crate::Real;
use serde::{Deserialize, Serialize};

/// Provides the characteristic scales of a simulation.
///
/// Values read from spatial databases are divided by the relevant scale once at
/// initialization, and multiplied again when they are reported.
pub trait Nondimensional<T: Real> {
    fn length_scale(&self) -> T;
    fn pressure_scale(&self) -> T;
    fn time_scale(&self) -> T;
    fn density_scale(&self) -> T;

    fn nondimensionalize(&self, value: T, scale: T) -> T {
        value / scale
    }

    fn dimensionalize(&self, value: T, scale: T) -> T {
        value * scale
    }

    /// Non-dimensionalizes all values in place.
    fn nondimensionalize_all(&self, values: &mut [T], scale: T) {
        for v in values {
            *v = self.nondimensionalize(*v, scale);
        }
    }

    /// Dimensionalizes all values in place.
    fn dimensionalize_all(&self, values: &mut [T], scale: T) {
        for v in values {
            *v = self.dimensionalize(*v, scale);
        }
    }
}

/// Plain characteristic scales.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scales<T> {
    pub length: T,
    pub pressure: T,
    pub time: T,
    pub density: T,
}

impl<T: Real> Default for Scales<T> {
    fn default() -> Self {
        Self {
            length: T::one(),
            pressure: T::one(),
            time: T::one(),
            density: T::one(),
        }
    }
}

impl<T: Real> Nondimensional<T> for Scales<T> {
    fn length_scale(&self) -> T {
        self.length
    }

    fn pressure_scale(&self) -> T {
        self.pressure
    }

    fn time_scale(&self) -> T {
        self.time
    }

    fn density_scale(&self) -> T {
        self.density
    }
}

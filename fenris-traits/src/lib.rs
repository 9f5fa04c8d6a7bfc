//! Core traits shared by the `fenris-fault` crates.
//!
//! Besides the [`Real`] scalar alias, this crate holds the interfaces of the collaborators
//! that fault computations consume but do not implement themselves: unit scales used for
//! non-dimensionalization and spatial databases that provide material parameters.
use nalgebra::RealField;

pub use nalgebra;

pub mod spatialdb;
pub mod units;

pub use spatialdb::{SpatialDatabase, UniformDatabase};
pub use units::{Nondimensional, Scales};

pub trait Real: RealField + Copy + Send + Sync {}

impl<T: RealField + Copy + Send + Sync> Real for T {}

//! Friction models for cohesive fault interfaces.
//!
//! A friction model maps the local slip state of a fault vertex to a shear resistance. The
//! models are pure functions of time, slip, slip rate and normal traction together with a
//! small, fixed set of per-vertex properties and state variables. Properties are read once
//! from a spatial database, state variables are advanced once per completed time step.
use fenris_traits::{Nondimensional, Real};
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};

mod slip_weakening_time;
mod store;

pub use slip_weakening_time::*;
pub use store::*;

/// Errors produced while configuring friction models.
#[derive(Debug)]
pub enum FrictionError {
    /// A database value violates the admissible range of a property.
    InvalidProperty { property: &'static str, message: String },
    /// The spatial database could not provide values at a vertex.
    Database { vertex: usize, report: eyre::Report },
    /// The database returned a different number of values than requested.
    ValueCountMismatch { expected: usize, actual: usize },
    /// A vertex without friction data was queried.
    UnknownVertex(usize),
}

impl Display for FrictionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidProperty { property, message } => {
                write!(f, "invalid value for friction property '{}': {}", property, message)
            }
            Self::Database { vertex, report } => {
                write!(f, "failed to query friction parameters at vertex {}: {}", vertex, report)
            }
            Self::ValueCountMismatch { expected, actual } => {
                write!(f, "expected {} database values, got {}", expected, actual)
            }
            Self::UnknownVertex(vertex) => write!(f, "no friction data for vertex {}", vertex),
        }
    }
}

impl Error for FrictionError {}

/// A friction constitutive model.
///
/// Implementors describe which database values they need, how to turn those values into
/// properties and state variables, and how friction evolves with slip.
pub trait FrictionModel<T: Real>: Sync {
    type Properties: Clone + Debug + Send + Sync;
    type State: Clone + Debug + Send + Sync;

    /// Names of the spatial database values that define the properties, in the order
    /// expected by [`FrictionModel::properties_from_db`].
    fn db_properties(&self) -> &'static [&'static str];

    /// Names of the spatial database values that define the initial state.
    fn db_state_vars(&self) -> &'static [&'static str];

    /// Validates database values and converts them to properties.
    fn properties_from_db(&self, db_values: &[T]) -> Result<Self::Properties, FrictionError>;

    fn state_vars_from_db(&self, db_values: &[T]) -> Result<Self::State, FrictionError>;

    /// The state used when no state database is supplied.
    fn initial_state(&self) -> Self::State;

    fn nondim_properties<N: Nondimensional<T> + ?Sized>(&self, properties: &mut Self::Properties, normalizer: &N);

    fn dim_properties<N: Nondimensional<T> + ?Sized>(&self, properties: &mut Self::Properties, normalizer: &N);

    fn nondim_state_vars<N: Nondimensional<T> + ?Sized>(&self, state: &mut Self::State, normalizer: &N);

    fn dim_state_vars<N: Nondimensional<T> + ?Sized>(&self, state: &mut Self::State, normalizer: &N);

    /// Computes the friction resistance.
    fn calc_friction(
        &self,
        t: T,
        slip: T,
        slip_rate: T,
        normal_traction: T,
        properties: &Self::Properties,
        state: &Self::State,
    ) -> T;

    /// Computes the derivative of the friction resistance with respect to slip.
    fn calc_friction_deriv(
        &self,
        t: T,
        slip: T,
        slip_rate: T,
        normal_traction: T,
        properties: &Self::Properties,
        state: &Self::State,
    ) -> T;

    /// Advances the state variables once a time step has been completed.
    fn update_state_vars(
        &self,
        t: T,
        slip: T,
        slip_rate: T,
        normal_traction: T,
        state: &mut Self::State,
        properties: &Self::Properties,
    );
}

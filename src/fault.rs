//! Faults with prescribed slip, enforced through Lagrange multipliers on cohesive cells.
mod config;
mod fields;
mod geometry;
mod kinematic;
mod source;

pub use config::*;
pub use fields::*;
pub use geometry::*;
pub use kinematic::*;
pub use source::*;

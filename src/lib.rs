pub mod assembly;
pub mod cohesive;
pub mod connectivity;
pub mod context;
pub mod element;
pub mod error;
pub mod fault;
pub mod mesh;
pub mod partition;
pub mod quadrature;
pub mod section;
pub mod sieve;
pub mod solution;

pub mod traits {
    pub use fenris_traits::*;
}

pub mod friction {
    pub use fenris_friction::*;
}

pub extern crate nalgebra;
pub extern crate nalgebra_sparse;

pub use fenris_traits::Real;

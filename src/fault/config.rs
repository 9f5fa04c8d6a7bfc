use fenris_traits::Real;
use nalgebra::convert;
use serde::{Deserialize, Serialize};

fn default_up_dir() -> [f64; 3] {
    [0.0, 0.0, 1.0]
}

fn default_normal_dir() -> [f64; 3] {
    [1.0, 0.0, 0.0]
}

fn default_use_solution_increment() -> bool {
    true
}

/// Parameters of a single fault.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FaultConfig {
    /// Name of the fault, and of the mesh vertex group holding its vertices.
    pub label: String,
    /// Material id of the cohesive cells of the fault.
    pub id: i32,
    /// Direction used to tell up-dip from down-dip on inclined faults.
    #[serde(default = "default_up_dir")]
    pub up_dir: [f64; 3],
    /// Preferred normal direction, pointing from the footwall to the hanging wall.
    #[serde(default = "default_normal_dir")]
    pub normal_dir: [f64; 3],
    /// Whether the solver works with displacement increments. Otherwise cumulative slip is
    /// reset before each update.
    #[serde(default = "default_use_solution_increment")]
    pub use_solution_increment: bool,
}

impl FaultConfig {
    pub fn new(label: impl Into<String>, id: i32) -> Self {
        Self {
            label: label.into(),
            id,
            up_dir: default_up_dir(),
            normal_dir: default_normal_dir(),
            use_solution_increment: default_use_solution_increment(),
        }
    }

    pub fn with_up_dir(mut self, up_dir: [f64; 3]) -> Self {
        self.up_dir = up_dir;
        self
    }

    pub fn with_normal_dir(mut self, normal_dir: [f64; 3]) -> Self {
        self.normal_dir = normal_dir;
        self
    }

    pub fn with_solution_increment(mut self, use_solution_increment: bool) -> Self {
        self.use_solution_increment = use_solution_increment;
        self
    }

    pub(crate) fn up_dir<T: Real>(&self) -> [T; 3] {
        self.up_dir.map(convert)
    }

    pub(crate) fn normal_dir<T: Real>(&self) -> [T; 3] {
        self.normal_dir.map(convert)
    }
}

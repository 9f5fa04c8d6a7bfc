//! Sources of prescribed slip on kinematic faults.
use crate::error::FaultError;
use crate::mesh::Mesh;
use crate::section::{Field, Section, VectorFieldType};
use crate::sieve::Point;
use fenris_traits::{Nondimensional, Real, SpatialDatabase};
use log::debug;
use nalgebra::convert;
use serde::{Deserialize, Serialize};

/// A generator of slip on the vertices of a fault mesh.
pub trait SlipSource<T: Real>: Sync {
    /// Time at which the source starts to contribute, in non-dimensional units once the
    /// source has been initialized.
    fn origin_time(&self) -> T;

    /// Sets up the source for the given fault mesh. Called once before any slip is computed.
    fn initialize(&mut self, fault_mesh: &Mesh<T>, normalizer: &dyn Nondimensional<T>) -> Result<(), FaultError>;

    /// Adds the slip of this source at time `t` to `slip`.
    fn slip(&self, slip: &mut Section<T>, t: T) -> Result<(), FaultError>;

    fn final_slip(&self) -> Result<&Field<T>, FaultError>;

    fn slip_time(&self) -> Result<&Field<T>, FaultError>;
}

/// How slip evolves in time at a single vertex.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SlipFunction {
    /// The final slip is reached instantaneously at the slip time.
    Step,
    /// Slip grows linearly with a constant slip rate from the slip time onward.
    ConstantRate,
}

impl SlipFunction {
    /// Adds the slip after `elapsed` time since the origin time of the source.
    ///
    /// `values` is the final slip for [`SlipFunction::Step`] and the slip rate for
    /// [`SlipFunction::ConstantRate`].
    pub fn add_slip<T: Real>(&self, values: &[T], slip_time: T, elapsed: T, output: &mut [T]) {
        match self {
            Self::Step => {
                if elapsed >= slip_time {
                    for (s, v) in output.iter_mut().zip(values) {
                        *s += *v;
                    }
                }
            }
            Self::ConstantRate => {
                if elapsed > slip_time {
                    let duration = elapsed - slip_time;
                    for (s, v) in output.iter_mut().zip(values) {
                        *s += *v * duration;
                    }
                }
            }
        }
    }

    fn field_label(&self) -> &'static str {
        match self {
            Self::Step => "final_slip",
            Self::ConstantRate => "slip_rate",
        }
    }
}

/// Parameters of a [`KinematicSource`].
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KinematicSourceConfig {
    /// Origin time of the source in physical units.
    #[serde(default)]
    pub origin_time: f64,
    pub slip_function: SlipFunction,
}

/// Database value names of the slip components, ordered like the rows of the fault
/// orientation.
pub fn slip_component_names(space_dim: usize) -> &'static [&'static str] {
    match space_dim {
        1 => &["fault-opening"],
        2 => &["left-lateral-slip", "fault-opening"],
        _ => &["left-lateral-slip", "reverse-slip", "fault-opening"],
    }
}

/// Database value name of the time of slip initiation relative to the origin time.
pub const SLIP_TIME_DB_VALUE: &str = "slip-time";

/// A slip source with per-vertex slip and slip time read from a spatial database.
///
/// Slip components are given in the local fault basis: left-lateral, reverse and opening in
/// 3D, left-lateral and opening in 2D and opening in 1D.
pub struct KinematicSource<T: Real> {
    label: String,
    config: KinematicSourceConfig,
    origin_time: T,
    database: Box<dyn SpatialDatabase<T>>,
    slip_values: Option<Field<T>>,
    slip_time: Option<Field<T>>,
}

impl<T: Real> std::fmt::Debug for KinematicSource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KinematicSource")
            .field("label", &self.label)
            .field("config", &self.config)
            .field("origin_time", &self.origin_time)
            .field("initialized", &self.slip_values.is_some())
            .finish()
    }
}

impl<T: Real> KinematicSource<T> {
    pub fn new(
        label: impl Into<String>,
        config: KinematicSourceConfig,
        database: impl SpatialDatabase<T> + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            config,
            origin_time: convert(config.origin_time),
            database: Box::new(database),
            slip_values: None,
            slip_time: None,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn config(&self) -> &KinematicSourceConfig {
        &self.config
    }

    fn not_initialized(&self) -> FaultError {
        FaultError::invariant(format!("slip source '{}' has not been initialized", self.label))
    }

    fn query(&self, vertex: Point, location: &[T], names: &[&str]) -> Result<Vec<T>, FaultError> {
        let values = self.database.query(location, names).map_err(|report| {
            FaultError::configuration(
                format!("slip source '{}'", self.label),
                format!(
                    "could not find parameters at fault vertex {} ({:?}): {}",
                    vertex, location, report
                ),
            )
        })?;
        if values.len() != names.len() {
            return Err(FaultError::configuration(
                format!("slip source '{}'", self.label),
                format!("expected {} values from database, got {}", names.len(), values.len()),
            ));
        }
        Ok(values)
    }
}

impl<T: Real> SlipSource<T> for KinematicSource<T> {
    fn origin_time(&self) -> T {
        self.origin_time
    }

    fn initialize(&mut self, fault_mesh: &Mesh<T>, normalizer: &dyn Nondimensional<T>) -> Result<(), FaultError> {
        let space_dim = fault_mesh.space_dim();
        let component_names = slip_component_names(space_dim);
        let length_scale = normalizer.length_scale();
        let time_scale = normalizer.time_scale();
        let slip_scale = match self.config.slip_function {
            SlipFunction::Step => length_scale,
            SlipFunction::ConstantRate => length_scale / time_scale,
        };

        let vertices = fault_mesh.vertices();
        let mut slip_values = Section::with_uniform_fiber(vertices.iter().copied(), space_dim);
        let mut slip_time = Section::with_uniform_fiber(vertices.iter().copied(), 1);
        for &vertex in &vertices {
            let mut location = fault_mesh.vertex_coordinates(vertex)?.to_vec();
            normalizer.dimensionalize_all(&mut location, length_scale);

            let mut values = self.query(vertex, &location, component_names)?;
            normalizer.nondimensionalize_all(&mut values, slip_scale);
            slip_values.update_point(vertex, &values)?;

            let time = self.query(vertex, &location, &[SLIP_TIME_DB_VALUE])?;
            let time = normalizer.nondimensionalize(time[0], time_scale);
            slip_time.update_point(vertex, &[time])?;
        }

        self.origin_time = normalizer.nondimensionalize(convert(self.config.origin_time), time_scale);
        self.slip_values = Some(
            Field::new(self.config.slip_function.field_label(), slip_values)
                .with_scale(slip_scale)
                .with_vector_field_type(VectorFieldType::Vector),
        );
        self.slip_time = Some(
            Field::new("slip_time", slip_time)
                .with_scale(time_scale)
                .with_vector_field_type(VectorFieldType::Scalar),
        );
        debug!(
            "Initialized slip source '{}' on {} fault vertices",
            self.label,
            vertices.len()
        );
        Ok(())
    }

    fn slip(&self, slip: &mut Section<T>, t: T) -> Result<(), FaultError> {
        let slip_values = self
            .slip_values
            .as_ref()
            .ok_or_else(|| self.not_initialized())?
            .section();
        let slip_time = self
            .slip_time
            .as_ref()
            .ok_or_else(|| self.not_initialized())?
            .section();
        let elapsed = t - self.origin_time;
        for vertex in slip_values.points() {
            let values = slip_values.restrict_point(vertex)?;
            let vertex_slip_time = slip_time.restrict_point(vertex)?[0];
            let output = slip.restrict_point_mut(vertex)?;
            self.config
                .slip_function
                .add_slip(values, vertex_slip_time, elapsed, output);
        }
        Ok(())
    }

    fn final_slip(&self) -> Result<&Field<T>, FaultError> {
        self.slip_values.as_ref().ok_or_else(|| self.not_initialized())
    }

    fn slip_time(&self) -> Result<&Field<T>, FaultError> {
        self.slip_time.as_ref().ok_or_else(|| self.not_initialized())
    }
}

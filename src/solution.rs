//! Solution fields of the domain mesh consumed by fault integrators.
use crate::error::FaultError;
use crate::mesh::Mesh;
use crate::section::{Field, Fields, Section, VectorFieldType};
use fenris_traits::Real;

/// Displacement at the beginning of the current time step.
pub const DISP_T: &str = "disp(t)";
/// Displacement increment over the current time step.
pub const DISP_INCR: &str = "dispIncr(t->t+dt)";

/// Named vector fields over the vertices of the domain mesh.
///
/// Requesting a field that has not been added is an invariant violation: the driver is
/// responsible for providing every field an integrator reads.
#[derive(Debug, Clone, PartialEq)]
pub struct SolutionFields<T> {
    fields: Fields<T>,
}

impl<T> Default for SolutionFields<T> {
    fn default() -> Self {
        Self {
            fields: Fields::default(),
        }
    }
}

impl<T: Real> SolutionFields<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates zeroed vector fields with one `space_dim` block per vertex of the mesh.
    pub fn with_zeroed<'a>(mesh: &Mesh<T>, names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut fields = Self::new();
        for name in names {
            let section = Section::with_uniform_fiber(mesh.vertices(), mesh.space_dim());
            let field = Field::new(name, section).with_vector_field_type(VectorFieldType::Vector);
            fields.add(name, field);
        }
        fields
    }

    pub fn add(&mut self, name: impl Into<String>, field: Field<T>) {
        self.fields.add(name, field);
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.has_field(name)
    }

    pub fn get(&self, name: &str) -> Result<&Field<T>, FaultError> {
        self.fields.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Field<T>, FaultError> {
        self.fields.get_mut(name)
    }

    /// Sets the values of a vertex in the named field.
    pub fn set_vertex(&mut self, name: &str, vertex: usize, values: &[T]) -> Result<(), FaultError> {
        self.get_mut(name)?
            .section_mut()
            .update_point(vertex, values)
    }
}

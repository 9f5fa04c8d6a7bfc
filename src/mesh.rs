//! Unstructured meshes built on top of a [`Sieve`].
use crate::connectivity::CellType;
use crate::error::FaultError;
use crate::section::Section;
use crate::sieve::{Point, Sieve, Stratification};
use fenris_traits::Real;
use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet};

pub mod procedural;

/// Name of the integer label holding the material id of each cell.
pub const MATERIAL_ID_LABEL: &str = "material-id";

/// A mesh of points with coordinates and labels.
///
/// The incidence structure lives in a [`Sieve`]. Vertices are the points of depth 0, cells the
/// points of height 0. Cell cones list the cell vertices in local order.
#[derive(Debug, Clone)]
pub struct Mesh<T> {
    sieve: Sieve,
    strata: Stratification,
    dimension: usize,
    space_dim: usize,
    coordinates: Section<T>,
    labels: BTreeMap<String, BTreeMap<Point, i32>>,
    vertex_groups: BTreeMap<String, BTreeSet<Point>>,
}

impl<T: Real> Mesh<T> {
    /// Creates an empty mesh of the given topological and spatial dimension.
    pub fn new(dimension: usize, space_dim: usize) -> Self {
        Self {
            sieve: Sieve::new(),
            strata: Stratification::default(),
            dimension,
            space_dim,
            coordinates: Section::new(),
            labels: BTreeMap::new(),
            vertex_groups: BTreeMap::new(),
        }
    }

    /// Creates a mesh from vertex coordinates and cell connectivity.
    ///
    /// Cells are numbered first (`0 .. num_cells`), followed by the vertices, so that vertex
    /// `i` of `vertices` becomes point `num_cells + i`. Every cell gets material id 0.
    pub fn from_cells<V, C>(dimension: usize, vertices: &[V], cells: &[C]) -> Result<Self, FaultError>
    where
        V: AsRef<[T]>,
        C: AsRef<[usize]>,
    {
        let space_dim = vertices
            .first()
            .map(|v| v.as_ref().len())
            .unwrap_or(dimension);
        let mut mesh = Self::new(dimension, space_dim);
        let num_cells = cells.len();

        for (i, v) in vertices.iter().enumerate() {
            let v = v.as_ref();
            if v.len() != space_dim {
                return Err(FaultError::configuration(
                    format!("vertex {}", i),
                    format!("expected {} coordinates, got {}", space_dim, v.len()),
                ));
            }
            let point = num_cells + i;
            mesh.sieve.add_point(point);
            mesh.coordinates.add_point(point, space_dim)?;
            mesh.coordinates.update_point(point, v)?;
        }

        for (cell, connectivity) in cells.iter().enumerate() {
            let connectivity = connectivity.as_ref();
            if let Some(&invalid) = connectivity.iter().find(|&&v| v >= vertices.len()) {
                return Err(FaultError::configuration(
                    format!("cell {}", cell),
                    format!("vertex index {} out of bounds", invalid),
                ));
            }
            let cone = connectivity.iter().map(|v| num_cells + v).collect_vec();
            mesh.sieve.set_cone(cell, &cone);
            mesh.set_label(MATERIAL_ID_LABEL, cell, 0);
        }

        mesh.stratify();
        Ok(mesh)
    }

    /// Recomputes depth and height of all points after the sieve has been modified.
    pub fn stratify(&mut self) {
        self.strata = self.sieve.stratify();
    }

    pub fn sieve(&self) -> &Sieve {
        &self.sieve
    }

    /// Mutable access to the incidence structure.
    ///
    /// Call [`Mesh::stratify`] once modifications are complete.
    pub fn sieve_mut(&mut self) -> &mut Sieve {
        &mut self.sieve
    }

    pub fn stratification(&self) -> &Stratification {
        &self.strata
    }

    /// Topological dimension of the cells.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn space_dim(&self) -> usize {
        self.space_dim
    }

    pub fn coordinates(&self) -> &Section<T> {
        &self.coordinates
    }

    pub fn coordinates_mut(&mut self) -> &mut Section<T> {
        &mut self.coordinates
    }

    pub fn vertices(&self) -> Vec<Point> {
        self.strata.depth_stratum(0)
    }

    pub fn cells(&self) -> Vec<Point> {
        self.strata.height_stratum(0)
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices().len()
    }

    pub fn num_cells(&self) -> usize {
        self.cells().len()
    }

    pub fn is_vertex(&self, point: Point) -> bool {
        self.strata.depth_of(point) == Some(0)
    }

    /// Vertices of a cell in local order.
    pub fn cell_vertices(&self, cell: Point) -> Vec<Point> {
        self.sieve.cone(cell).collect()
    }

    pub fn num_cell_corners(&self, cell: Point) -> usize {
        self.sieve.cone_size(cell)
    }

    pub fn cell_type(&self, cell: Point) -> Result<CellType, FaultError> {
        CellType::from_dimension_and_corners(self.dimension, self.num_cell_corners(cell))
    }

    pub fn vertex_coordinates(&self, vertex: Point) -> Result<&[T], FaultError> {
        self.coordinates.restrict_point(vertex)
    }

    /// Coordinates of the cell vertices, concatenated in local order.
    pub fn cell_coordinates(&self, cell: Point) -> Result<Vec<T>, FaultError> {
        let mut coords = Vec::with_capacity(self.space_dim * self.num_cell_corners(cell));
        for v in self.sieve.cone(cell) {
            coords.extend_from_slice(self.coordinates.restrict_point(v)?);
        }
        Ok(coords)
    }

    pub fn max_point(&self) -> Option<Point> {
        self.sieve.max_point()
    }

    pub fn set_label(&mut self, name: &str, point: Point, value: i32) {
        self.labels
            .entry(name.to_string())
            .or_default()
            .insert(point, value);
    }

    pub fn label(&self, name: &str, point: Point) -> Option<i32> {
        self.labels.get(name).and_then(|label| label.get(&point).copied())
    }

    pub fn has_label(&self, name: &str) -> bool {
        self.labels.contains_key(name)
    }

    /// Points with the given label value, in ascending order.
    pub fn label_stratum(&self, name: &str, value: i32) -> Vec<Point> {
        self.labels
            .get(name)
            .map(|label| {
                label
                    .iter()
                    .filter(|(_, v)| **v == value)
                    .map(|(p, _)| *p)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn set_vertex_group(&mut self, name: impl Into<String>, vertices: impl IntoIterator<Item = Point>) {
        self.vertex_groups
            .insert(name.into(), vertices.into_iter().collect());
    }

    pub fn has_vertex_group(&self, name: &str) -> bool {
        self.vertex_groups.contains_key(name)
    }

    pub fn vertex_group(&self, name: &str) -> Result<&BTreeSet<Point>, FaultError> {
        self.vertex_groups.get(name).ok_or_else(|| {
            FaultError::configuration(name, format!("mesh is missing the vertex group '{}'", name))
        })
    }
}

//! Construction of cohesive cells along a fault.
//!
//! Given the vertices that lie on a fault, the builder
//!
//! 1. collects the faces of cells that lie entirely on the fault into a standalone fault mesh,
//! 2. duplicates every fault vertex and rewrites the connectivity of one of the two cells
//!    adjacent to each fault face so that it uses the duplicates,
//! 3. inserts a zero-thickness cohesive cell for every fault face, with the cone
//!    `[positive side][negative side][Lagrange vertices]`.
//!
//! The cell with the larger id of the two cells adjacent to a face is the one that gets
//! rewritten (the negative side).
use crate::connectivity::CellType;
use crate::context::Context;
use crate::error::FaultError;
use crate::mesh::{Mesh, MATERIAL_ID_LABEL};
use crate::sieve::{Point, Sieve};
use fenris_traits::Real;
use itertools::Itertools;
use log::{debug, info, warn};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Options for the construction of cohesive cells.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CohesiveOptions {
    /// Whether cohesive cells carry Lagrange multiplier vertices.
    pub lagrange_constraints: bool,
    /// Material id given to the cohesive cells.
    pub material_id: i32,
}

impl Default for CohesiveOptions {
    fn default() -> Self {
        Self {
            lagrange_constraints: true,
            material_id: 100,
        }
    }
}

/// The result of splitting a mesh along a fault.
#[derive(Debug, Clone)]
pub struct CohesiveTopology<T> {
    fault_mesh: Mesh<T>,
    renumbering: BTreeMap<Point, Point>,
    constraint_vertices: BTreeMap<Point, Point>,
    cohesive_cells: Vec<Point>,
    cohesive_to_fault: BTreeMap<Point, Point>,
    fault_renumbering: BTreeMap<Point, Point>,
    material_id: i32,
}

impl<T: Real> CohesiveTopology<T> {
    /// Splits `mesh` along the surface spanned by `fault_vertices`.
    ///
    /// The domain mesh is modified in place: cells on the negative side of the fault are
    /// rewritten to use duplicated vertices, and cohesive cells and Lagrange vertices are
    /// added. All new ids are allocated above the largest point id of the mesh.
    pub fn create(
        mesh: &mut Mesh<T>,
        fault_vertices: impl IntoIterator<Item = Point>,
        options: &CohesiveOptions,
        ctx: &Context,
    ) -> Result<Self, FaultError> {
        let _stage = ctx.stage("cohesive topology");

        if mesh.dimension() == 0 {
            return Err(FaultError::configuration("mesh", "cannot create a fault in a 0D mesh"));
        }

        let fault_vertices: BTreeSet<Point> = fault_vertices.into_iter().collect();
        if let Some(v) = fault_vertices.iter().find(|v| !mesh.is_vertex(**v)) {
            return Err(FaultError::configuration(
                format!("fault vertex {}", v),
                "point is not a vertex of the mesh",
            ));
        }
        if fault_vertices.is_empty() {
            warn!("Creating cohesive topology from an empty set of fault vertices");
        }

        let first_new_id = mesh.max_point().map(|p| p + 1).unwrap_or(0);
        let fault_sieve = build_fault_sieve(mesh, &fault_vertices, first_new_id)?;
        // Faces are the only points of the fault sieve with both a cone and a support
        let faces = fault_sieve
            .cap_points()
            .filter(|p| fault_sieve.cone_size(*p) > 0)
            .collect_vec();

        let fault_mesh = create_fault_mesh(mesh, &fault_sieve, &faces)?;

        let mut next_id = first_new_id;
        let mut allocate = || {
            let id = next_id;
            next_id += 1;
            id
        };

        let fault_mesh_vertices = fault_mesh.vertices();
        let renumbering: BTreeMap<_, _> = fault_mesh_vertices
            .iter()
            .map(|v| (*v, allocate()))
            .collect();
        let constraint_vertices: BTreeMap<_, _> = if options.lagrange_constraints {
            fault_mesh_vertices
                .iter()
                .map(|v| (*v, allocate()))
                .collect()
        } else {
            BTreeMap::new()
        };

        // Rewrite the cell on the negative side of every fault face
        for &face in &faces {
            let cell = fault_sieve
                .support(face)
                .max()
                .ok_or_else(|| FaultError::invariant(format!("fault face {} has no adjacent cell", face)))?;
            let cone = mesh
                .cell_vertices(cell)
                .into_iter()
                .map(|v| renumbering.get(&v).copied().unwrap_or(v))
                .collect_vec();
            debug!("Replacing cone of cell {} with {:?}", cell, cone);
            mesh.sieve_mut().set_cone(cell, &cone);
        }

        // Duplicated and Lagrange vertices start out at the position of the fault vertex
        for (original, new_vertex) in renumbering.iter().chain(&constraint_vertices) {
            let coords = mesh.vertex_coordinates(*original)?.to_vec();
            let coordinates = mesh.coordinates_mut();
            coordinates.add_point(*new_vertex, coords.len())?;
            coordinates.update_point(*new_vertex, &coords)?;
            mesh.sieve_mut().add_point(*new_vertex);
        }

        let mut cohesive_cells = Vec::with_capacity(faces.len());
        let mut cohesive_to_fault = BTreeMap::new();
        for &face in &faces {
            let positive = fault_mesh.cell_vertices(face);
            let negative = positive.iter().map(|v| renumbering[v]).collect_vec();
            let lagrange = positive
                .iter()
                .filter_map(|v| constraint_vertices.get(v).copied())
                .collect_vec();
            let cone = [positive, negative, lagrange].concat();

            let cell = allocate();
            debug!("Adding cohesive cell {} for fault face {} with cone {:?}", cell, face, cone);
            mesh.sieve_mut().set_cone(cell, &cone);
            mesh.set_label(MATERIAL_ID_LABEL, cell, options.material_id);
            cohesive_cells.push(cell);
            cohesive_to_fault.insert(cell, face);
        }
        mesh.stratify();

        let fault_renumbering = if options.lagrange_constraints {
            constraint_vertices
                .iter()
                .map(|(fault_vertex, lagrange)| (*lagrange, *fault_vertex))
                .collect()
        } else {
            fault_mesh_vertices.iter().map(|v| (*v, *v)).collect()
        };

        info!(
            "Created fault with {} faces and {} vertices, inserted {} cohesive cells",
            faces.len(),
            fault_mesh_vertices.len(),
            cohesive_cells.len()
        );

        Ok(Self {
            fault_mesh,
            renumbering,
            constraint_vertices,
            cohesive_cells,
            cohesive_to_fault,
            fault_renumbering,
            material_id: options.material_id,
        })
    }

    /// The fault surface mesh.
    ///
    /// Its cells are the fault faces, its vertices the original (positive side) fault vertices.
    pub fn fault_mesh(&self) -> &Mesh<T> {
        &self.fault_mesh
    }

    /// Map from original fault vertices to their duplicates.
    pub fn renumbering(&self) -> &BTreeMap<Point, Point> {
        &self.renumbering
    }

    /// Map from fault vertices to Lagrange multiplier vertices, empty without Lagrange
    /// constraints.
    pub fn constraint_vertices(&self) -> &BTreeMap<Point, Point> {
        &self.constraint_vertices
    }

    pub fn cohesive_cells(&self) -> &[Point] {
        &self.cohesive_cells
    }

    /// Map from cohesive cells to the corresponding faces of the fault mesh.
    pub fn cohesive_to_fault(&self) -> &BTreeMap<Point, Point> {
        &self.cohesive_to_fault
    }

    /// Map from domain vertices carrying fault unknowns to vertices of the fault mesh.
    pub fn fault_renumbering(&self) -> &BTreeMap<Point, Point> {
        &self.fault_renumbering
    }

    pub fn material_id(&self) -> i32 {
        self.material_id
    }
}

/// Collects fault faces into a sieve with arrows `vertex -> face -> cell`.
///
/// Face ids start at `first_face_id`.
fn build_fault_sieve<T: Real>(
    mesh: &Mesh<T>,
    fault_vertices: &BTreeSet<Point>,
    first_face_id: Point,
) -> Result<Sieve, FaultError> {
    let mut fault_sieve = Sieve::new();
    let mut processed = FxHashSet::default();
    let mut next_face = first_face_id;

    for &fault_vertex in fault_vertices {
        debug!("Checking fault vertex {}", fault_vertex);
        for cell in mesh.sieve().support(fault_vertex) {
            if !processed.insert(cell) {
                continue;
            }
            let cell_type = mesh.cell_type(cell)?;
            let face_size = cell_type.num_face_vertices();
            let cone = mesh.cell_vertices(cell);
            let face = cone
                .iter()
                .copied()
                .filter(|v| fault_vertices.contains(v))
                .collect_vec();

            if face.len() > face_size {
                return Err(FaultError::configuration(
                    format!("cell {}", cell),
                    format!(
                        "invalid fault mesh: cell has {} vertices on the fault, but its faces have {}",
                        face.len(),
                        face_size
                    ),
                ));
            }
            if face.len() < face_size {
                continue;
            }
            if cell_type.oriented_face(&cone, &face).is_none() {
                return Err(FaultError::configuration(
                    format!("cell {}", cell),
                    format!("fault vertices {:?} do not form a face of the cell", face),
                ));
            }

            let existing = fault_sieve.join(&face);
            match existing.as_slice() {
                [] => {
                    let new_face = next_face;
                    next_face += 1;
                    debug!("Adding fault face {} with vertices {:?}", new_face, face);
                    for (color, v) in face.iter().enumerate() {
                        fault_sieve.add_arrow(*v, new_face, color);
                    }
                    fault_sieve.add_arrow(new_face, cell, 0);
                }
                [existing_face] => {
                    let num_cells = fault_sieve.support_size(*existing_face);
                    if num_cells >= 2 {
                        return Err(FaultError::configuration(
                            format!("fault face {}", existing_face),
                            format!(
                                "non-manifold fault: face with vertices {:?} borders more than two cells",
                                face
                            ),
                        ));
                    }
                    fault_sieve.add_arrow(*existing_face, cell, num_cells);
                }
                _ => {
                    return Err(FaultError::configuration(
                        format!("cell {}", cell),
                        format!("invalid fault sieve: multiple faces from vertex set {:?}", face),
                    ))
                }
            }
        }
    }

    Ok(fault_sieve)
}

/// Creates the standalone fault mesh from the fault sieve.
///
/// Each face is ordered like the outward face of its lower-id cell, so that all faces share
/// one orientation with normals pointing from the positive to the negative side.
fn create_fault_mesh<T: Real>(mesh: &Mesh<T>, fault_sieve: &Sieve, faces: &[Point]) -> Result<Mesh<T>, FaultError> {
    let mut fault_mesh = Mesh::new(mesh.dimension() - 1, mesh.space_dim());

    for &face in faces {
        let face_vertices = fault_sieve.cone(face).collect_vec();
        let positive_cell = fault_sieve
            .support(face)
            .min()
            .ok_or_else(|| FaultError::invariant(format!("fault face {} has no adjacent cell", face)))?;
        let cell_vertices = mesh.cell_vertices(positive_cell);
        let oriented = mesh
            .cell_type(positive_cell)
            .map(|cell_type: CellType| cell_type.oriented_face(&cell_vertices, &face_vertices))?
            .ok_or_else(|| {
                FaultError::invariant(format!(
                    "fault face {} is not a face of its cell {}",
                    face, positive_cell
                ))
            })?;
        fault_mesh.sieve_mut().set_cone(face, &oriented);
    }

    for v in faces
        .iter()
        .flat_map(|face| fault_sieve.cone(*face))
        .collect::<BTreeSet<_>>()
    {
        let coords = mesh.vertex_coordinates(v)?;
        let fault_coordinates = fault_mesh.coordinates_mut();
        fault_coordinates.add_point(v, coords.len())?;
        fault_coordinates.update_point(v, coords)?;
    }

    fault_mesh.stratify();
    Ok(fault_mesh)
}

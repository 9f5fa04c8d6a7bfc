//! Per-vertex geometry of fault surfaces: local orientation and tributary area.
//!
//! Both fields are accumulated from cell contributions. Cells are processed in parallel, each
//! producing its own contributions, which are then added to the section serially. The result
//! is completed across partitions before it is read.
use crate::element::FaultQuadrature;
use crate::error::FaultError;
use crate::mesh::Mesh;
use crate::partition::Communicator;
use crate::section::{Field, Section, VectorFieldType};
use crate::sieve::Point;
use fenris_traits::Real;
use log::{debug, trace};
use rayon::prelude::*;

/// Contributions of one cell to each of its vertices.
type CellContributions<T> = Vec<(Point, Vec<T>)>;

fn checked_cell_coordinates<T: Real>(
    fault_mesh: &Mesh<T>,
    quadrature: &FaultQuadrature<T>,
    cell: Point,
) -> Result<Vec<T>, FaultError> {
    let coords = fault_mesh.cell_coordinates(cell)?;
    let expected = quadrature.space_dim() * quadrature.num_corners();
    if coords.len() != expected {
        return Err(FaultError::configuration(
            format!("fault cell {}", cell),
            format!(
                "cell has {} coordinates, but the reference cell needs {}",
                coords.len(),
                expected
            ),
        ));
    }
    Ok(coords)
}

/// Computes the orientation of the fault at every vertex of the fault mesh.
///
/// At each vertex the field holds `space_dim` rows of length `space_dim`: along-strike, up-dip
/// (3D only) and normal directions. Contributions of all cells sharing a vertex are summed,
/// completed across partitions and normalized row by row. For 2D faults in 3D the dip
/// direction is flipped everywhere if the normal of the first vertex points away from
/// `normal_dir`.
pub fn compute_orientation<T: Real>(
    fault_mesh: &Mesh<T>,
    quadrature: &FaultQuadrature<T>,
    up_dir: &[T; 3],
    normal_dir: &[T; 3],
    comm: &dyn Communicator<T>,
) -> Result<Field<T>, FaultError> {
    let space_dim = quadrature.space_dim();
    let orientation_size = space_dim * space_dim;
    let reference_cell = quadrature.reference_cell();
    let vertices = fault_mesh.vertices();
    let mut orientation = Section::with_uniform_fiber(vertices.iter().copied(), orientation_size);

    let contributions = fault_mesh
        .cells()
        .into_par_iter()
        .map(|cell| -> Result<CellContributions<T>, FaultError> {
            let coords = checked_cell_coordinates(fault_mesh, quadrature, cell)?;
            fault_mesh
                .cell_vertices(cell)
                .into_iter()
                .enumerate()
                .map(|(local_index, vertex)| {
                    let xi = reference_cell.vertex::<T>(local_index);
                    let jacobian = reference_cell.jacobian(&coords, space_dim, &xi);
                    let vertex_orientation = reference_cell.orientation(&jacobian, up_dir)?;
                    // Stored row by row
                    let rows = vertex_orientation.transpose().as_slice().to_vec();
                    Ok((vertex, rows))
                })
                .collect()
        })
        .collect::<Result<Vec<_>, _>>()?;

    for (vertex, rows) in contributions.iter().flatten() {
        orientation.update_add_point(*vertex, rows)?;
    }
    comm.complete(&mut orientation)?;

    for &vertex in &vertices {
        let values = orientation.restrict_point_mut(vertex)?;
        for (row_index, row) in values.chunks_exact_mut(space_dim).enumerate() {
            let magnitude = row.iter().fold(T::zero(), |acc, x| acc + *x * *x).sqrt();
            if magnitude <= T::zero() {
                return Err(FaultError::invariant(format!(
                    "orientation row {} at fault vertex {} has zero length",
                    row_index, vertex
                )));
            }
            for x in row.iter_mut() {
                *x /= magnitude;
            }
        }
        trace!("Orientation at fault vertex {}: {:?}", vertex, values);
    }

    if fault_mesh.dimension() == 2 {
        if let Some(&first) = vertices.first() {
            // With the dip flipped the local basis is left-handed, but positive slip values
            // then mean left-lateral, reverse and opening for the preferred normal
            let normal = &orientation.restrict_point(first)?[6..9];
            let normal_dot = (0..3).fold(T::zero(), |acc, d| acc + normal[d] * normal_dir[d]);
            if normal_dot < T::zero() {
                debug!("Flipping dip direction of fault surface");
                for &vertex in &vertices {
                    for x in &mut orientation.restrict_point_mut(vertex)?[3..6] {
                        *x = -*x;
                    }
                }
            }
        }
    }

    Ok(Field::new("orientation", orientation))
}

/// Computes the tributary area of every vertex of the fault mesh.
///
/// The area of a vertex is the integral of its basis function over all cells containing it.
pub fn compute_area<T: Real>(
    fault_mesh: &Mesh<T>,
    quadrature: &FaultQuadrature<T>,
    comm: &dyn Communicator<T>,
) -> Result<Field<T>, FaultError> {
    let mut area = Section::with_uniform_fiber(fault_mesh.vertices(), 1);

    let contributions = fault_mesh
        .cells()
        .into_par_iter()
        .map(|cell| -> Result<CellContributions<T>, FaultError> {
            let coords = checked_cell_coordinates(fault_mesh, quadrature, cell)?;
            let basis_areas = quadrature.basis_areas(&coords)?;
            Ok(fault_mesh
                .cell_vertices(cell)
                .into_iter()
                .zip(basis_areas)
                .map(|(vertex, area)| (vertex, vec![area]))
                .collect())
        })
        .collect::<Result<Vec<_>, _>>()?;

    for (vertex, value) in contributions.iter().flatten() {
        area.update_add_point(*vertex, value)?;
    }
    comm.complete(&mut area)?;

    Ok(Field::new("area", area).with_vector_field_type(VectorFieldType::Scalar))
}

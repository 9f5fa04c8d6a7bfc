use crate::{split_mesh, two_triangles};
use fenris_fault::element::{FaultQuadrature, ReferenceCell};
use fenris_fault::error::ErrorCategory;
use fenris_fault::fault::{compute_area, compute_orientation};
use fenris_fault::mesh::procedural::{create_rectangular_uniform_hex_mesh, select_vertices_on_plane};
use fenris_fault::mesh::Mesh;
use fenris_fault::partition::SerialCommunicator;
use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use nalgebra::Matrix3;
use proptest::array::uniform3;
use proptest::prelude::*;
use std::f64::consts::FRAC_1_SQRT_2;

const UP: [f64; 3] = [0.0, 0.0, 1.0];
const NORMAL: [f64; 3] = [1.0, 0.0, 0.0];

fn hex_fault(cells: [usize; 3], axis: usize) -> Mesh<f64> {
    let [nx, ny, nz] = cells;
    let mut mesh = create_rectangular_uniform_hex_mesh(1.0, nx, ny, nz);
    let fault_vertices = select_vertices_on_plane(&mesh, axis, 1.0, 1e-9);
    split_mesh(&mut mesh, "fault", &fault_vertices)
        .fault_mesh()
        .clone()
}

fn quad_quadrature() -> FaultQuadrature<f64> {
    FaultQuadrature::with_default_rule(ReferenceCell::Quad4, 3).unwrap()
}

#[test]
fn orientation_of_diagonal_line() {
    let mut mesh = two_triangles();
    let topology = split_mesh(&mut mesh, "fault", &[2, 5]);
    let quadrature = FaultQuadrature::with_default_rule(ReferenceCell::Line2, 2).unwrap();

    let orientation =
        compute_orientation(topology.fault_mesh(), &quadrature, &UP, &NORMAL, &SerialCommunicator).unwrap();
    assert_eq!(orientation.label(), "orientation");
    let expected = [-FRAC_1_SQRT_2, -FRAC_1_SQRT_2, -FRAC_1_SQRT_2, FRAC_1_SQRT_2];
    for vertex in [2, 5] {
        let values = orientation.section().restrict_point(vertex).unwrap();
        for (value, expected) in values.iter().zip(&expected) {
            assert_scalar_eq!(*value, *expected, comp = abs, tol = 1e-12);
        }
    }

    let area = compute_area(topology.fault_mesh(), &quadrature, &SerialCommunicator).unwrap();
    assert_eq!(area.label(), "area");
    for vertex in [2, 5] {
        let value = area.section().restrict_point(vertex).unwrap()[0];
        assert_scalar_eq!(value, FRAC_1_SQRT_2, comp = abs, tol = 1e-12);
    }
}

#[test]
fn orientation_of_vertical_plane() {
    let fault_mesh = hex_fault([2, 2, 2], 0);
    let orientation = compute_orientation(&fault_mesh, &quad_quadrature(), &UP, &NORMAL, &SerialCommunicator).unwrap();

    #[rustfmt::skip]
    let expected = Matrix3::new(
        0.0, 1.0, 0.0,
        0.0, 0.0, 1.0,
        1.0, 0.0, 0.0,
    );
    for vertex in fault_mesh.vertices() {
        let values = orientation.section().restrict_point(vertex).unwrap();
        let rows = Matrix3::from_row_slice(values);
        assert_matrix_eq!(rows, expected, comp = abs, tol = 1e-12);
    }
}

#[test]
fn dip_is_flipped_when_normal_points_away_from_preferred_direction() {
    let fault_mesh = hex_fault([2, 1, 1], 0);
    let normal_dir = [-1.0, 0.0, 0.0];
    let orientation =
        compute_orientation(&fault_mesh, &quad_quadrature(), &UP, &normal_dir, &SerialCommunicator).unwrap();

    #[rustfmt::skip]
    let expected = Matrix3::new(
        0.0, 1.0,  0.0,
        0.0, 0.0, -1.0,
        1.0, 0.0,  0.0,
    );
    for vertex in fault_mesh.vertices() {
        let rows = Matrix3::from_row_slice(orientation.section().restrict_point(vertex).unwrap());
        assert_matrix_eq!(rows, expected, comp = abs, tol = 1e-12);
    }
}

#[test]
fn horizontal_fault_uses_fallback_strike() {
    let fault_mesh = hex_fault([1, 1, 2], 2);
    let orientation = compute_orientation(&fault_mesh, &quad_quadrature(), &UP, &NORMAL, &SerialCommunicator).unwrap();

    #[rustfmt::skip]
    let expected = Matrix3::new(
        1.0, 0.0, 0.0,
        0.0, 1.0, 0.0,
        0.0, 0.0, 1.0,
    );
    for vertex in fault_mesh.vertices() {
        let rows = Matrix3::from_row_slice(orientation.section().restrict_point(vertex).unwrap());
        assert_matrix_eq!(rows, expected, comp = abs, tol = 1e-12);
    }
}

#[test]
fn degenerate_fault_cells_are_invariant_violations() {
    let fault_mesh = Mesh::from_cells(1, &[[0.5, 0.5], [0.5, 0.5]], &[[0, 1]]).unwrap();
    let quadrature = FaultQuadrature::with_default_rule(ReferenceCell::Line2, 2).unwrap();

    let err = compute_orientation(&fault_mesh, &quadrature, &UP, &NORMAL, &SerialCommunicator).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::InvariantViolation);
    let err = compute_area(&fault_mesh, &quadrature, &SerialCommunicator).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::InvariantViolation);
}

#[test]
fn quadrature_must_match_fault_cells() {
    // A line in 3D cannot be integrated with a rule for lines in 2D
    let fault_mesh = Mesh::from_cells(1, &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]], &[[0, 1]]).unwrap();
    let quadrature = FaultQuadrature::with_default_rule(ReferenceCell::Line2, 2).unwrap();
    let err = compute_area(&fault_mesh, &quadrature, &SerialCommunicator).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Configuration);
}

fn hex_fault_strategy() -> impl Strategy<Value = ([usize; 3], usize)> {
    (uniform3(1usize..3), 0usize..3).prop_map(|(mut cells, axis)| {
        cells[axis] = 2;
        (cells, axis)
    })
}

proptest! {
    #[test]
    fn orientation_is_orthonormal_and_area_sums_to_fault_area((cells, axis) in hex_fault_strategy()) {
        let fault_mesh = hex_fault(cells, axis);
        let quadrature = quad_quadrature();
        let orientation = compute_orientation(&fault_mesh, &quadrature, &UP, &NORMAL, &SerialCommunicator).unwrap();
        let area = compute_area(&fault_mesh, &quadrature, &SerialCommunicator).unwrap();

        for vertex in fault_mesh.vertices() {
            let rows = Matrix3::from_row_slice(orientation.section().restrict_point(vertex).unwrap());
            let product = rows * rows.transpose();
            assert_matrix_eq!(product, Matrix3::identity(), comp = abs, tol = 1e-12);
            // The normal is aligned with the axis the plane is perpendicular to
            prop_assert!((rows[(2, axis)] - 1.0).abs() < 1e-12);
        }

        let expected_area: usize = (0..3).filter(|d| *d != axis).map(|d| cells[d]).product();
        let total_area: f64 = area.section().values().iter().sum();
        prop_assert!((total_area - expected_area as f64).abs() < 1e-12);
    }
}

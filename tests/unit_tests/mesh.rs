use crate::two_triangles;
use fenris_fault::connectivity::CellType;
use fenris_fault::error::ErrorCategory;
use fenris_fault::mesh::procedural::{
    create_rectangular_uniform_hex_mesh, create_rectangular_uniform_quad_mesh, create_rectangular_uniform_tet_mesh,
    create_rectangular_uniform_tri_mesh, create_uniform_segment_mesh, select_vertices_on_plane,
};
use fenris_fault::mesh::{Mesh, MATERIAL_ID_LABEL};
use proptest::prelude::*;

#[test]
fn from_cells_numbers_cells_before_vertices() {
    let mesh = two_triangles();
    assert_eq!(mesh.dimension(), 2);
    assert_eq!(mesh.space_dim(), 2);
    assert_eq!(mesh.cells(), vec![0, 1]);
    assert_eq!(mesh.vertices(), vec![2, 3, 4, 5]);
    assert_eq!(mesh.cell_vertices(0), vec![2, 3, 5]);
    assert_eq!(mesh.cell_vertices(1), vec![2, 5, 4]);
    assert_eq!(mesh.vertex_coordinates(5).unwrap(), &[1.0, 1.0]);
    assert_eq!(mesh.cell_coordinates(1).unwrap(), vec![0.0, 0.0, 1.0, 1.0, 0.0, 1.0]);
    assert_eq!(mesh.cell_type(0).unwrap(), CellType::Tri3);
    assert_eq!(mesh.label(MATERIAL_ID_LABEL, 1), Some(0));
    assert_eq!(mesh.max_point(), Some(5));
}

#[test]
fn from_cells_rejects_invalid_input() {
    let err = Mesh::<f64>::from_cells(2, &[[0.0, 0.0], [1.0, 0.0]], &[[0, 1, 2]]).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Configuration);

    let vertices: [&[f64]; 2] = [&[0.0, 0.0], &[1.0]];
    let err = Mesh::<f64>::from_cells(1, &vertices, &[[0, 1]]).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Configuration);
}

#[test]
fn labels_and_vertex_groups() {
    let mut mesh = two_triangles();
    mesh.set_label(MATERIAL_ID_LABEL, 1, 3);
    assert_eq!(mesh.label_stratum(MATERIAL_ID_LABEL, 3), vec![1]);
    assert_eq!(mesh.label_stratum(MATERIAL_ID_LABEL, 0), vec![0]);
    assert!(mesh.label_stratum("missing", 0).is_empty());
    assert!(!mesh.has_label("missing"));

    mesh.set_vertex_group("fault", [5, 2]);
    assert!(mesh.has_vertex_group("fault"));
    assert_eq!(mesh.vertex_group("fault").unwrap().iter().copied().collect::<Vec<_>>(), vec![2, 5]);
    assert!(mesh.vertex_group("other").is_err());
}

#[test]
fn procedural_mesh_sizes() {
    let segments = create_uniform_segment_mesh(0.5, 4);
    assert_eq!((segments.num_cells(), segments.num_vertices()), (4, 5));
    assert_eq!(segments.vertex_coordinates(8).unwrap(), &[2.0]);

    let quads = create_rectangular_uniform_quad_mesh(1.0, 3, 2);
    assert_eq!((quads.num_cells(), quads.num_vertices()), (6, 12));

    let tris = create_rectangular_uniform_tri_mesh(1.0, 3, 2);
    assert_eq!((tris.num_cells(), tris.num_vertices()), (12, 12));

    let hexes = create_rectangular_uniform_hex_mesh(1.0, 2, 2, 1);
    assert_eq!((hexes.num_cells(), hexes.num_vertices()), (4, 18));
    assert_eq!(hexes.cell_type(0).unwrap(), CellType::Hex8);

    let tets = create_rectangular_uniform_tet_mesh(1.0, 1, 1, 2);
    assert_eq!((tets.num_cells(), tets.num_vertices()), (12, 12));
    assert_eq!(tets.cell_type(0).unwrap(), CellType::Tet4);
}

#[test]
fn plane_selection() {
    let mesh = create_rectangular_uniform_quad_mesh(0.5, 4, 2);
    let vertices = select_vertices_on_plane(&mesh, 0, 1.0, 1e-9);
    assert_eq!(vertices.len(), 3);
    for v in vertices {
        assert_eq!(mesh.vertex_coordinates(v).unwrap()[0], 1.0);
    }
}

/// Signed volume of a tetrahedron.
fn tet_volume(coords: &[f64]) -> f64 {
    let edge = |i: usize, d: usize| coords[3 * i + d] - coords[d];
    let (a, b, c) = (
        [edge(1, 0), edge(1, 1), edge(1, 2)],
        [edge(2, 0), edge(2, 1), edge(2, 2)],
        [edge(3, 0), edge(3, 1), edge(3, 2)],
    );
    let det = a[0] * (b[1] * c[2] - b[2] * c[1]) - a[1] * (b[0] * c[2] - b[2] * c[0]) + a[2] * (b[0] * c[1] - b[1] * c[0]);
    det / 6.0
}

proptest! {
    #[test]
    fn procedural_tets_are_positively_oriented_and_fill_the_box(nx in 1usize..3, ny in 1usize..3, nz in 1usize..3) {
        let mesh = create_rectangular_uniform_tet_mesh(1.0, nx, ny, nz);
        let mut total = 0.0;
        for cell in mesh.cells() {
            let volume = tet_volume(&mesh.cell_coordinates(cell).unwrap());
            prop_assert!(volume > 0.0);
            total += volume;
        }
        prop_assert!((total - (nx * ny * nz) as f64).abs() < 1e-12);
    }
}

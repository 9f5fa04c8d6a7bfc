use crate::{split_mesh, two_triangles};
use fenris_fault::cohesive::{CohesiveOptions, CohesiveTopology};
use fenris_fault::context::Context;
use fenris_fault::error::{ErrorCategory, FaultError};
use fenris_fault::mesh::procedural::{
    create_rectangular_uniform_hex_mesh, create_rectangular_uniform_tet_mesh, create_rectangular_uniform_tri_mesh,
    create_uniform_segment_mesh, select_vertices_on_plane,
};
use fenris_fault::mesh::{Mesh, MATERIAL_ID_LABEL};
use fenris_fault::sieve::Point;
use proptest::prelude::*;
use std::collections::BTreeSet;

fn create(mesh: &mut Mesh<f64>, fault_vertices: &[Point], options: &CohesiveOptions) -> Result<CohesiveTopology<f64>, FaultError> {
    CohesiveTopology::create(mesh, fault_vertices.iter().copied(), options, &Context::new())
}

#[test]
fn diagonal_fault_in_two_triangles() {
    let mut mesh = two_triangles();
    let topology = split_mesh(&mut mesh, "fault", &[2, 5]);

    // One fault face whose cone follows the outward face of cell 0
    let fault_mesh = topology.fault_mesh();
    assert_eq!(fault_mesh.dimension(), 1);
    assert_eq!(fault_mesh.space_dim(), 2);
    assert_eq!(fault_mesh.vertices(), vec![2, 5]);
    let faces = fault_mesh.cells();
    assert_eq!(faces.len(), 1);
    assert_eq!(fault_mesh.cell_vertices(faces[0]), vec![5, 2]);
    assert_eq!(fault_mesh.vertex_coordinates(5).unwrap(), &[1.0, 1.0]);

    // Duplicates first, then Lagrange vertices, then the cohesive cell
    assert_eq!(topology.renumbering().iter().map(|(a, b)| (*a, *b)).collect::<Vec<_>>(), vec![(2, 6), (5, 7)]);
    assert_eq!(
        topology.constraint_vertices().iter().map(|(a, b)| (*a, *b)).collect::<Vec<_>>(),
        vec![(2, 8), (5, 9)]
    );
    assert_eq!(topology.cohesive_cells(), &[10]);
    assert_eq!(topology.cohesive_to_fault().get(&10), Some(&faces[0]));
    assert_eq!(
        topology.fault_renumbering().iter().map(|(a, b)| (*a, *b)).collect::<Vec<_>>(),
        vec![(8, 2), (9, 5)]
    );

    // The cell with the larger id now uses the duplicates
    assert_eq!(mesh.cell_vertices(0), vec![2, 3, 5]);
    assert_eq!(mesh.cell_vertices(1), vec![6, 7, 4]);
    assert_eq!(mesh.cell_vertices(10), vec![5, 2, 7, 6, 9, 8]);
    assert_eq!(mesh.label(MATERIAL_ID_LABEL, 10), Some(100));
    assert_eq!(mesh.cells(), vec![0, 1, 10]);
    assert_eq!(mesh.vertices(), vec![2, 3, 4, 5, 6, 7, 8, 9]);

    for (original, duplicate) in topology.renumbering() {
        assert_eq!(
            mesh.vertex_coordinates(*original).unwrap(),
            mesh.vertex_coordinates(*duplicate).unwrap()
        );
    }
    assert_eq!(mesh.vertex_coordinates(9).unwrap(), &[1.0, 1.0]);
}

#[test]
fn cohesive_cells_without_lagrange_constraints() {
    let mut mesh = two_triangles();
    let options = CohesiveOptions {
        lagrange_constraints: false,
        material_id: 7,
    };
    let topology = create(&mut mesh, &[2, 5], &options).unwrap();

    assert!(topology.constraint_vertices().is_empty());
    assert_eq!(topology.cohesive_cells(), &[8]);
    assert_eq!(mesh.cell_vertices(8), vec![5, 2, 7, 6]);
    assert_eq!(mesh.label(MATERIAL_ID_LABEL, 8), Some(7));
    assert_eq!(topology.material_id(), 7);
    assert_eq!(
        topology.fault_renumbering().iter().map(|(a, b)| (*a, *b)).collect::<Vec<_>>(),
        vec![(2, 2), (5, 5)]
    );
}

#[test]
fn interior_vertex_of_segment_mesh() {
    let mut mesh = create_uniform_segment_mesh(1.0, 2);
    // Cells 0 and 1, vertices 2, 3 and 4 at x = 0, 1, 2
    let topology = split_mesh(&mut mesh, "fault", &[3]);

    assert_eq!(topology.fault_mesh().dimension(), 0);
    assert_eq!(topology.fault_mesh().vertices(), vec![3]);
    assert_eq!(topology.fault_mesh().num_cells(), 1);
    assert_eq!(mesh.cell_vertices(1), vec![5, 4]);
    assert_eq!(mesh.cell_vertices(7), vec![3, 5, 6]);
}

#[test]
fn too_many_fault_vertices_in_a_cell() {
    let mut mesh = two_triangles();
    let err = create(&mut mesh, &[2, 3, 5], &CohesiveOptions::default()).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Configuration);
    assert!(err.to_string().contains("cell 0"), "{}", err);
}

#[test]
fn fault_vertices_must_form_a_face() {
    let mut mesh = Mesh::from_cells(2, &[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]], &[[0, 1, 2, 3]]).unwrap();
    // Opposite corners of the quadrilateral
    let err = create(&mut mesh, &[1, 3], &CohesiveOptions::default()).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Configuration);
    assert!(err.to_string().contains("do not form a face"), "{}", err);
}

#[test]
fn non_manifold_fault_is_rejected() {
    // Three triangles sharing the edge between the first two vertices
    let vertices = [[0.0, 0.0], [1.0, 0.0], [0.5, 1.0], [0.5, -1.0], [0.5, 2.0]];
    let cells = [[0, 1, 2], [1, 0, 3], [0, 1, 4]];
    let mut mesh = Mesh::from_cells(2, &vertices, &cells).unwrap();
    let err = create(&mut mesh, &[3, 4], &CohesiveOptions::default()).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Configuration);
    assert!(err.to_string().contains("non-manifold"), "{}", err);
}

#[test]
fn fault_points_must_be_vertices() {
    let mut mesh = two_triangles();
    let err = create(&mut mesh, &[0, 2], &CohesiveOptions::default()).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Configuration);
}

#[test]
fn empty_fault_leaves_mesh_unchanged() {
    let mut mesh = two_triangles();
    let topology = create(&mut mesh, &[], &CohesiveOptions::default()).unwrap();
    assert!(topology.cohesive_cells().is_empty());
    assert_eq!(topology.fault_mesh().num_vertices(), 0);
    assert_eq!(mesh.cells(), vec![0, 1]);
    assert_eq!(mesh.cell_vertices(1), vec![2, 5, 4]);
}

#[test]
fn planar_fault_through_hexahedra() {
    let mut mesh = create_rectangular_uniform_hex_mesh(1.0, 2, 2, 1);
    let fault_vertices = select_vertices_on_plane(&mesh, 0, 1.0, 1e-9);
    assert_eq!(fault_vertices.len(), 6);
    let topology = split_mesh(&mut mesh, "fault", &fault_vertices);

    assert_eq!(topology.fault_mesh().dimension(), 2);
    assert_eq!(topology.fault_mesh().num_cells(), 2);
    assert_eq!(topology.fault_mesh().num_vertices(), 6);
    assert_eq!(topology.cohesive_cells().len(), 2);
    for cell in topology.cohesive_cells() {
        assert_eq!(mesh.num_cell_corners(*cell), 12);
    }
    // 18 original, 6 duplicated and 6 Lagrange vertices
    assert_eq!(mesh.num_vertices(), 30);
}

#[test]
fn planar_fault_through_tetrahedra() {
    let mut mesh = create_rectangular_uniform_tet_mesh(1.0, 2, 1, 1);
    let fault_vertices = select_vertices_on_plane(&mesh, 0, 1.0, 1e-9);
    let topology = split_mesh(&mut mesh, "fault", &fault_vertices);

    // Each square of the plane is split into two triangles
    assert_eq!(topology.fault_mesh().num_cells(), 2);
    assert_eq!(topology.cohesive_cells().len(), 2);
    for cell in topology.cohesive_cells() {
        assert_eq!(mesh.num_cell_corners(*cell), 9);
    }
}

proptest! {
    #[test]
    fn renumbering_is_injective_and_above_existing_ids(cells_x in 2usize..5, cells_y in 1usize..4) {
        let mut mesh = create_rectangular_uniform_tri_mesh(1.0, cells_x, cells_y);
        let max_point = mesh.max_point().unwrap();
        let fault_vertices = select_vertices_on_plane(&mesh, 0, 1.0, 1e-9);
        let topology = split_mesh(&mut mesh, "fault", &fault_vertices);

        let duplicates: BTreeSet<_> = topology.renumbering().values().copied().collect();
        let lagrange: BTreeSet<_> = topology.constraint_vertices().values().copied().collect();
        prop_assert_eq!(duplicates.len(), fault_vertices.len());
        prop_assert_eq!(lagrange.len(), fault_vertices.len());
        prop_assert!(duplicates.is_disjoint(&lagrange));
        prop_assert!(duplicates.iter().chain(&lagrange).all(|p| *p > max_point));
        prop_assert!(topology.cohesive_cells().iter().all(|p| *p > max_point && !duplicates.contains(p) && !lagrange.contains(p)));

        prop_assert_eq!(topology.cohesive_cells().len(), cells_y);
        for &cell in topology.cohesive_cells() {
            let cone = mesh.cell_vertices(cell);
            prop_assert_eq!(cone.len(), 6);
            for m in 0..2 {
                prop_assert_eq!(topology.renumbering()[&cone[m]], cone[2 + m]);
                prop_assert_eq!(topology.constraint_vertices()[&cone[m]], cone[4 + m]);
            }
        }

        // No regular cell uses both a fault vertex and its duplicate
        for cell in mesh.label_stratum(MATERIAL_ID_LABEL, 0) {
            let cone = mesh.cell_vertices(cell);
            for (original, duplicate) in topology.renumbering() {
                prop_assert!(!(cone.contains(original) && cone.contains(duplicate)));
            }
        }
    }
}

//! Basic procedural mesh generation routines.
//!
//! All meshes are axis-aligned boxes with one corner at the origin. Cells are numbered in
//! row-major order with x varying fastest, so that neighboring cells across any grid plane
//! have consistently ordered ids.
use crate::mesh::Mesh;
use crate::sieve::Point;
use fenris_traits::Real;
use itertools::iproduct;
use nalgebra::convert;

fn from_cells_unchecked<T: Real>(dimension: usize, vertices: &[Vec<T>], cells: &[Vec<usize>]) -> Mesh<T> {
    Mesh::from_cells(dimension, vertices, cells).expect("Procedural connectivity is always valid")
}

fn coordinate<T: Real>(index: usize, cell_size: T) -> T {
    convert::<f64, T>(index as f64) * cell_size
}

/// A 1D mesh of `num_cells` segments starting at the origin.
pub fn create_uniform_segment_mesh<T: Real>(cell_size: T, num_cells: usize) -> Mesh<T> {
    let vertices: Vec<_> = (0..=num_cells)
        .map(|i| vec![coordinate(i, cell_size)])
        .collect();
    let cells: Vec<_> = (0..num_cells).map(|i| vec![i, i + 1]).collect();
    from_cells_unchecked(1, &vertices, &cells)
}

fn grid_vertices_2d<T: Real>(cell_size: T, cells_x: usize, cells_y: usize) -> Vec<Vec<T>> {
    iproduct!(0..=cells_y, 0..=cells_x)
        .map(|(j, i)| vec![coordinate(i, cell_size), coordinate(j, cell_size)])
        .collect()
}

/// A rectangle of `cells_x` by `cells_y` counter-clockwise quadrilaterals.
pub fn create_rectangular_uniform_quad_mesh<T: Real>(cell_size: T, cells_x: usize, cells_y: usize) -> Mesh<T> {
    let vertices = grid_vertices_2d(cell_size, cells_x, cells_y);
    let v = |i: usize, j: usize| (cells_x + 1) * j + i;
    let cells: Vec<_> = iproduct!(0..cells_y, 0..cells_x)
        .map(|(j, i)| vec![v(i, j), v(i + 1, j), v(i + 1, j + 1), v(i, j + 1)])
        .collect();
    from_cells_unchecked(2, &vertices, &cells)
}

/// A rectangle where every square is split into two counter-clockwise triangles.
pub fn create_rectangular_uniform_tri_mesh<T: Real>(cell_size: T, cells_x: usize, cells_y: usize) -> Mesh<T> {
    let vertices = grid_vertices_2d(cell_size, cells_x, cells_y);
    let v = |i: usize, j: usize| (cells_x + 1) * j + i;
    let mut cells = Vec::with_capacity(2 * cells_x * cells_y);
    for (j, i) in iproduct!(0..cells_y, 0..cells_x) {
        cells.push(vec![v(i, j), v(i + 1, j), v(i + 1, j + 1)]);
        cells.push(vec![v(i, j), v(i + 1, j + 1), v(i, j + 1)]);
    }
    from_cells_unchecked(2, &vertices, &cells)
}

fn grid_vertices_3d<T: Real>(cell_size: T, cells: [usize; 3]) -> Vec<Vec<T>> {
    let [nx, ny, nz] = cells;
    iproduct!(0..=nz, 0..=ny, 0..=nx)
        .map(|(k, j, i)| {
            vec![
                coordinate(i, cell_size),
                coordinate(j, cell_size),
                coordinate(k, cell_size),
            ]
        })
        .collect()
}

/// The eight corners of the grid cube `(i, j, k)`, indexed by bits `x | y << 1 | z << 2`.
fn cube_corners(cells: [usize; 3], i: usize, j: usize, k: usize) -> [usize; 8] {
    let [nx, ny, _] = cells;
    let v = |i: usize, j: usize, k: usize| ((ny + 1) * k + j) * (nx + 1) + i;
    let mut corners = [0; 8];
    for (bits, corner) in corners.iter_mut().enumerate() {
        *corner = v(i + (bits & 1), j + ((bits >> 1) & 1), k + ((bits >> 2) & 1));
    }
    corners
}

/// A box of hexahedra with the standard (counter-clockwise bottom, then top) vertex order.
pub fn create_rectangular_uniform_hex_mesh<T: Real>(
    cell_size: T,
    cells_x: usize,
    cells_y: usize,
    cells_z: usize,
) -> Mesh<T> {
    let dims = [cells_x, cells_y, cells_z];
    let vertices = grid_vertices_3d(cell_size, dims);
    let cells: Vec<_> = iproduct!(0..cells_z, 0..cells_y, 0..cells_x)
        .map(|(k, j, i)| {
            let c = cube_corners(dims, i, j, k);
            vec![c[0], c[1], c[3], c[2], c[4], c[5], c[7], c[6]]
        })
        .collect();
    from_cells_unchecked(3, &vertices, &cells)
}

/// A box where every cube is split into six positively oriented tetrahedra sharing the main
/// diagonal of the cube.
pub fn create_rectangular_uniform_tet_mesh<T: Real>(
    cell_size: T,
    cells_x: usize,
    cells_y: usize,
    cells_z: usize,
) -> Mesh<T> {
    // Axis permutations together with their parity
    const PERMUTATIONS: [([usize; 3], bool); 6] = [
        ([0, 1, 2], true),
        ([1, 2, 0], true),
        ([2, 0, 1], true),
        ([0, 2, 1], false),
        ([2, 1, 0], false),
        ([1, 0, 2], false),
    ];

    let dims = [cells_x, cells_y, cells_z];
    let vertices = grid_vertices_3d(cell_size, dims);
    let mut cells = Vec::with_capacity(6 * cells_x * cells_y * cells_z);
    for (k, j, i) in iproduct!(0..cells_z, 0..cells_y, 0..cells_x) {
        let c = cube_corners(dims, i, j, k);
        for ([a, b, _], even) in PERMUTATIONS {
            let p1 = 1 << a;
            let p2 = p1 | (1 << b);
            if even {
                cells.push(vec![c[0], c[p1], c[p2], c[7]]);
            } else {
                cells.push(vec![c[0], c[p1], c[7], c[p2]]);
            }
        }
    }
    from_cells_unchecked(3, &vertices, &cells)
}

/// Vertices whose coordinate along `axis` lies within `tolerance` of `value`.
pub fn select_vertices_on_plane<T: Real>(mesh: &Mesh<T>, axis: usize, value: T, tolerance: T) -> Vec<Point> {
    mesh.vertices()
        .into_iter()
        .filter(|&v| {
            mesh.vertex_coordinates(v)
                .ok()
                .and_then(|x| x.get(axis).copied())
                .map(|x| (x - value).abs() <= tolerance)
                .unwrap_or(false)
        })
        .collect()
}

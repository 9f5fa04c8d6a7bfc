//! Reference cells of fault surfaces and their geometry.
//!
//! A fault surface has one dimension less than the domain it lives in. Its cells are points
//! (1D domains), line segments (2D domains), or triangles and quadrilaterals (3D domains).
//! Besides basis functions and Jacobians, each reference cell knows how to turn a Jacobian into
//! a local orthonormal basis of along-strike, up-dip and normal directions.
use crate::connectivity::CellType;
use crate::error::FaultError;
use crate::quadrature::{line_gauss, point_rule, quadrilateral_gauss, triangle_rule, Quadrature};
use fenris_traits::Real;
use nalgebra::{DMatrix, Vector3};
use numeric_literals::replace_float_literals;

/// Below this norm a cross product with the up direction is considered degenerate.
const HORIZONTAL_TOLERANCE: f64 = 1.0e-6;

/// Linear reference cells for fault surfaces.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ReferenceCell {
    Point,
    Line2,
    Tri3,
    Quad4,
}

impl ReferenceCell {
    pub fn from_cell_type(cell_type: CellType) -> Result<Self, FaultError> {
        match cell_type {
            CellType::Point1 => Ok(Self::Point),
            CellType::Segment2 => Ok(Self::Line2),
            CellType::Tri3 => Ok(Self::Tri3),
            CellType::Quad4 => Ok(Self::Quad4),
            other => Err(FaultError::configuration(
                "reference cell",
                format!("{:?} cells cannot be fault surface cells", other),
            )),
        }
    }

    /// The reference cell of the faces of the given volumetric cell type.
    pub fn for_faces_of(cell_type: CellType) -> Result<Self, FaultError> {
        match cell_type {
            CellType::Segment2 => Ok(Self::Point),
            CellType::Tri3 | CellType::Quad4 => Ok(Self::Line2),
            CellType::Tet4 => Ok(Self::Tri3),
            CellType::Hex8 => Ok(Self::Quad4),
            CellType::Point1 => Err(FaultError::configuration(
                "reference cell",
                "point cells have no faces",
            )),
        }
    }

    pub fn cell_dim(&self) -> usize {
        match self {
            Self::Point => 0,
            Self::Line2 => 1,
            Self::Tri3 | Self::Quad4 => 2,
        }
    }

    pub fn num_corners(&self) -> usize {
        match self {
            Self::Point => 1,
            Self::Line2 => 2,
            Self::Tri3 => 3,
            Self::Quad4 => 4,
        }
    }

    /// Reference coordinates of the corners, `cell_dim` values per corner.
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn vertices<T: Real>(&self) -> Vec<T> {
        match self {
            Self::Point => Vec::new(),
            Self::Line2 => vec![-1.0, 1.0],
            Self::Tri3 => vec![-1.0, -1.0, 1.0, -1.0, -1.0, 1.0],
            Self::Quad4 => vec![-1.0, -1.0, 1.0, -1.0, 1.0, 1.0, -1.0, 1.0],
        }
    }

    pub fn vertex<T: Real>(&self, index: usize) -> Vec<T> {
        let d = self.cell_dim();
        self.vertices::<T>()[d * index..d * (index + 1)].to_vec()
    }

    /// The rule used by default for integrals over the cell.
    pub fn default_quadrature<T: Real>(&self) -> Quadrature<T> {
        match self {
            Self::Point => point_rule(),
            Self::Line2 => line_gauss(2),
            Self::Tri3 => triangle_rule(3).expect("Three-point triangle rule always exists"),
            Self::Quad4 => quadrilateral_gauss(2),
        }
    }

    /// Values of all basis functions at the reference point `xi`.
    #[rustfmt::skip]
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn evaluate_basis<T: Real>(&self, xi: &[T]) -> Vec<T> {
        match self {
            Self::Point => vec![1.0],
            Self::Line2 => vec![(1.0 - xi[0]) / 2.0, (1.0 + xi[0]) / 2.0],
            Self::Tri3 => vec![
                -(xi[0] + xi[1]) / 2.0,
                (1.0 + xi[0]) / 2.0,
                (1.0 + xi[1]) / 2.0,
            ],
            Self::Quad4 => {
                let phi = |alpha: T, beta: T| (1.0 + alpha * xi[0]) * (1.0 + beta * xi[1]) / 4.0;
                vec![
                    phi(-1.0, -1.0),
                    phi( 1.0, -1.0),
                    phi( 1.0,  1.0),
                    phi(-1.0,  1.0),
                ]
            }
        }
    }

    /// Reference gradients of all basis functions, one column per basis function.
    #[rustfmt::skip]
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn gradients<T: Real>(&self, xi: &[T]) -> DMatrix<T> {
        match self {
            Self::Point => DMatrix::zeros(0, 1),
            Self::Line2 => DMatrix::from_row_slice(1, 2, &[-0.5, 0.5]),
            Self::Tri3 => DMatrix::from_row_slice(2, 3, &[
                -0.5, 0.5, 0.0,
                -0.5, 0.0, 0.5,
            ]),
            Self::Quad4 => {
                let mut gradients = DMatrix::zeros(2, 4);
                let signs = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
                for (i, (alpha, beta)) in signs.into_iter().enumerate() {
                    gradients[(0, i)] = alpha * (1.0 + beta * xi[1]) / 4.0;
                    gradients[(1, i)] = beta * (1.0 + alpha * xi[0]) / 4.0;
                }
                gradients
            }
        }
    }

    /// The Jacobian `dx/dxi` (`space_dim x cell_dim`) at `xi` for a cell with the given corner
    /// coordinates (`space_dim` values per corner).
    pub fn jacobian<T: Real>(&self, coords: &[T], space_dim: usize, xi: &[T]) -> DMatrix<T> {
        assert_eq!(coords.len(), space_dim * self.num_corners(), "one set of coordinates per corner");
        let gradients = self.gradients(xi);
        let mut jacobian = DMatrix::zeros(space_dim, self.cell_dim());
        for v in 0..self.num_corners() {
            for d in 0..space_dim {
                for c in 0..self.cell_dim() {
                    jacobian[(d, c)] += coords[v * space_dim + d] * gradients[(c, v)];
                }
            }
        }
        jacobian
    }

    /// The surface measure of the Jacobian, i.e. the ratio of physical to reference length
    /// (or area).
    pub fn jacobian_det<T: Real>(&self, jacobian: &DMatrix<T>) -> Result<T, FaultError> {
        let (space_dim, cell_dim) = jacobian.shape();
        let det = match (cell_dim, space_dim) {
            (0, _) => T::one(),
            (1, _) => jacobian.column(0).norm(),
            (2, 2) => jacobian.determinant().abs(),
            (2, 3) => {
                let j0 = Vector3::new(jacobian[(0, 0)], jacobian[(1, 0)], jacobian[(2, 0)]);
                let j1 = Vector3::new(jacobian[(0, 1)], jacobian[(1, 1)], jacobian[(2, 1)]);
                j0.cross(&j1).norm()
            }
            _ => {
                return Err(FaultError::configuration(
                    "reference cell",
                    format!("unsupported {}D cell in {}D space", cell_dim, space_dim),
                ))
            }
        };
        if det <= T::zero() {
            return Err(FaultError::invariant("degenerate fault cell with zero Jacobian determinant"));
        }
        Ok(det)
    }

    /// Local orientation derived from the Jacobian, stored as `space_dim x space_dim` rows.
    ///
    /// Rows are (along-strike, up-dip, normal) for surfaces in 3D, (along-fault, normal) for
    /// lines in 2D and the single normal `[1]` for points in 1D. The along-fault direction of a
    /// line is its tangent; its normal is the tangent rotated clockwise. The strike of a surface
    /// is `up x normal`, falling back to `e_y x normal` if the surface is horizontal.
    pub fn orientation<T: Real>(&self, jacobian: &DMatrix<T>, up_dir: &[T; 3]) -> Result<DMatrix<T>, FaultError> {
        let (space_dim, cell_dim) = jacobian.shape();
        match (cell_dim, space_dim) {
            (0, 1) => Ok(DMatrix::from_element(1, 1, T::one())),
            (1, 2) => {
                let (j0, j1) = (jacobian[(0, 0)], jacobian[(1, 0)]);
                Ok(DMatrix::from_row_slice(2, 2, &[j0, j1, j1, -j0]))
            }
            (2, 3) => {
                let j0 = Vector3::new(jacobian[(0, 0)], jacobian[(1, 0)], jacobian[(2, 0)]);
                let j1 = Vector3::new(jacobian[(0, 1)], jacobian[(1, 1)], jacobian[(2, 1)]);
                let normal = j0
                    .cross(&j1)
                    .try_normalize(T::zero())
                    .ok_or_else(|| FaultError::invariant("degenerate fault cell without a normal"))?;

                let tolerance = nalgebra::convert::<f64, T>(HORIZONTAL_TOLERANCE);
                let up = Vector3::new(up_dir[0], up_dir[1], up_dir[2]);
                let mut strike = up.cross(&normal);
                if strike.norm() < tolerance {
                    strike = Vector3::y().cross(&normal);
                }
                let strike = strike.try_normalize(T::zero()).ok_or_else(|| {
                    FaultError::invariant("cannot determine strike direction of fault cell")
                })?;
                let dip = normal.cross(&strike);

                let mut orientation = DMatrix::zeros(3, 3);
                for (row, dir) in [strike, dip, normal].iter().enumerate() {
                    for d in 0..3 {
                        orientation[(row, d)] = dir[d];
                    }
                }
                Ok(orientation)
            }
            _ => Err(FaultError::configuration(
                "reference cell",
                format!("no orientation for {}D cells in {}D space", cell_dim, space_dim),
            )),
        }
    }
}

/// Geometry of a single cell at all quadrature points.
#[derive(Debug, Clone, PartialEq)]
pub struct CellGeometry<T: Real> {
    pub jacobians: Vec<DMatrix<T>>,
    pub jacobian_dets: Vec<T>,
}

/// A reference cell together with a quadrature rule, evaluating cell geometry at quadrature
/// points.
#[derive(Debug, Clone, PartialEq)]
pub struct FaultQuadrature<T: Real> {
    cell: ReferenceCell,
    quadrature: Quadrature<T>,
    space_dim: usize,
    // Basis values, one row per quadrature point
    basis: DMatrix<T>,
}

impl<T: Real> FaultQuadrature<T> {
    pub fn new(cell: ReferenceCell, quadrature: Quadrature<T>, space_dim: usize) -> Result<Self, FaultError> {
        if quadrature.dim() != cell.cell_dim() {
            return Err(FaultError::configuration(
                "quadrature",
                format!(
                    "quadrature rule of dimension {} does not match reference cell of dimension {}",
                    quadrature.dim(),
                    cell.cell_dim()
                ),
            ));
        }
        if space_dim != cell.cell_dim() + 1 {
            return Err(FaultError::configuration(
                "quadrature",
                format!("{}D fault cells cannot live in {}D space", cell.cell_dim(), space_dim),
            ));
        }
        let mut basis = DMatrix::zeros(quadrature.num_points(), cell.num_corners());
        for q in 0..quadrature.num_points() {
            for (i, phi) in cell.evaluate_basis(quadrature.point(q)).into_iter().enumerate() {
                basis[(q, i)] = phi;
            }
        }
        Ok(Self {
            cell,
            quadrature,
            space_dim,
            basis,
        })
    }

    /// Uses the default quadrature rule of the reference cell.
    pub fn with_default_rule(cell: ReferenceCell, space_dim: usize) -> Result<Self, FaultError> {
        Self::new(cell, cell.default_quadrature(), space_dim)
    }

    pub fn reference_cell(&self) -> ReferenceCell {
        self.cell
    }

    pub fn cell_dim(&self) -> usize {
        self.cell.cell_dim()
    }

    pub fn space_dim(&self) -> usize {
        self.space_dim
    }

    pub fn num_basis(&self) -> usize {
        self.cell.num_corners()
    }

    pub fn num_corners(&self) -> usize {
        self.cell.num_corners()
    }

    pub fn num_quad_pts(&self) -> usize {
        self.quadrature.num_points()
    }

    pub fn quad_wts(&self) -> &[T] {
        self.quadrature.weights()
    }

    /// Basis values at quadrature points, one row per point.
    pub fn basis(&self) -> &DMatrix<T> {
        &self.basis
    }

    pub fn compute_geometry(&self, cell_coords: &[T]) -> Result<CellGeometry<T>, FaultError> {
        let mut jacobians = Vec::with_capacity(self.num_quad_pts());
        let mut jacobian_dets = Vec::with_capacity(self.num_quad_pts());
        for q in 0..self.num_quad_pts() {
            let jacobian = self
                .cell
                .jacobian(cell_coords, self.space_dim, self.quadrature.point(q));
            jacobian_dets.push(self.cell.jacobian_det(&jacobian)?);
            jacobians.push(jacobian);
        }
        Ok(CellGeometry {
            jacobians,
            jacobian_dets,
        })
    }

    /// Contribution of each basis function to the area of the cell, `sum_q w_q |J_q| phi_i(x_q)`.
    pub fn basis_areas(&self, cell_coords: &[T]) -> Result<Vec<T>, FaultError> {
        let geometry = self.compute_geometry(cell_coords)?;
        let mut areas = vec![T::zero(); self.num_basis()];
        for (q, (w, det)) in self.quad_wts().iter().zip(&geometry.jacobian_dets).enumerate() {
            let wt = *w * *det;
            for (i, area) in areas.iter_mut().enumerate() {
                *area += wt * self.basis[(q, i)];
            }
        }
        Ok(areas)
    }
}

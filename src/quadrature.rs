//! Quadrature rules for the reference cells of fault surfaces.
//!
//! Reference cells use the domain `[-1, 1]^d`. The reference triangle has vertices
//! `(-1, -1)`, `(1, -1)` and `(-1, 1)`.
use fenris_traits::Real;
use nalgebra::convert;
use std::f64::consts::PI;

/// Weights and points of a quadrature rule on a `dim`-dimensional reference domain.
///
/// Points are stored consecutively, `dim` coordinates per point.
#[derive(Debug, Clone, PartialEq)]
pub struct Quadrature<T> {
    dim: usize,
    weights: Vec<T>,
    points: Vec<T>,
}

impl<T: Real> Quadrature<T> {
    pub fn from_weights_and_points(dim: usize, weights: Vec<T>, points: Vec<T>) -> Self {
        assert_eq!(weights.len() * dim, points.len(), "each weight needs exactly one point");
        Self { dim, weights, points }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn num_points(&self) -> usize {
        self.weights.len()
    }

    pub fn weights(&self) -> &[T] {
        &self.weights
    }

    pub fn point(&self, index: usize) -> &[T] {
        &self.points[self.dim * index..self.dim * (index + 1)]
    }

    /// Integrates `f` over the reference domain.
    pub fn integrate(&self, f: impl Fn(&[T]) -> T) -> T {
        self.weights
            .iter()
            .enumerate()
            .fold(T::zero(), |acc, (i, w)| acc + *w * f(self.point(i)))
    }
}

/// Recurrence relation for Legendre polynomials.
///
/// Derivatives are only defined in the open interval (-1, 1).
struct LegendreRecurrence {
    n: usize,
    x: f64,
    // p_n(x)
    p1: f64,
    // p_{n - 1}(x)
    p2: f64,
}

impl LegendreRecurrence {
    fn evaluate(n: usize, x: f64) -> Self {
        //  m P_m(x) = (2m - 1) * x P_{m - 1}(x) - (m - 1) P_{m - 2}(x)
        let mut p1 = 1.0;
        let mut p2 = 0.0;
        for m in 1..=n {
            let m = m as f64;
            let p3 = p2;
            p2 = p1;
            p1 = ((2.0 * m - 1.0) * x * p2 - (m - 1.0) * p3) / m;
        }
        Self { n, x, p1, p2 }
    }

    fn value_and_derivative(&self) -> (f64, f64) {
        let n = self.n as f64;
        let x = self.x;
        (self.p1, n * (x * self.p1 - self.p2) / (x * x - 1.0))
    }
}

const MAX_NEWTON_ITERATIONS: usize = 100;

/// Gauss-Legendre weights and points on `[-1, 1]` computed in double precision.
///
/// # Panics
///
/// Panics if zero points are requested.
fn gauss_f64(num_points: usize) -> (Vec<f64>, Vec<f64>) {
    let n = num_points;
    assert!(n > 0, "number of points must be positive");
    let m = (n + 1) / 2;

    let mut points = Vec::with_capacity(n);
    let mut weights = Vec::with_capacity(n);

    // Only find the first m roots, the remaining ones follow by symmetry
    for i in 0..m {
        let mut x = (PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        let mut iterations = 0;
        // Newton's method, returning the derivative at the converged root
        let dp = loop {
            let (p, dp) = LegendreRecurrence::evaluate(n, x).value_and_derivative();
            let dx = -p / dp;
            x += dx;
            iterations += 1;
            if dx.abs() <= 1e-15 || iterations >= MAX_NEWTON_ITERATIONS {
                break LegendreRecurrence::evaluate(n, x).value_and_derivative().1;
            }
        };
        points.push(x);
        weights.push(2.0 / ((1.0 - x * x) * dp * dp));
    }

    for i in m..n {
        let mirror = n - i - 1;
        points.push(-points[mirror]);
        weights.push(weights[mirror]);
    }

    (weights, points)
}

/// The trivial rule of a point cell.
pub fn point_rule<T: Real>() -> Quadrature<T> {
    Quadrature::from_weights_and_points(0, vec![T::one()], Vec::new())
}

/// Gauss quadrature on `[-1, 1]`, exact for polynomials of degree `2 n - 1`.
pub fn line_gauss<T: Real>(num_points: usize) -> Quadrature<T> {
    let (weights, points) = gauss_f64(num_points);
    Quadrature::from_weights_and_points(
        1,
        weights.into_iter().map(convert).collect(),
        points.into_iter().map(convert).collect(),
    )
}

/// Tensor-product Gauss quadrature on `[-1, 1]^2`.
pub fn quadrilateral_gauss<T: Real>(points_per_dim: usize) -> Quadrature<T> {
    let (weights_1d, points_1d) = gauss_f64(points_per_dim);
    let mut weights = Vec::new();
    let mut points = Vec::new();
    for (w_j, x_j) in weights_1d.iter().zip(&points_1d) {
        for (w_i, x_i) in weights_1d.iter().zip(&points_1d) {
            weights.push(convert(w_i * w_j));
            points.push(convert(*x_i));
            points.push(convert(*x_j));
        }
    }
    Quadrature::from_weights_and_points(2, weights, points)
}

/// Symmetric quadrature on the reference triangle.
///
/// Supported point counts are 1 (exact for linear polynomials) and 3 (exact for quadratics).
pub fn triangle_rule<T: Real>(num_points: usize) -> Option<Quadrature<T>> {
    let (weights, points): (Vec<f64>, Vec<f64>) = match num_points {
        1 => (vec![2.0], vec![-1.0 / 3.0, -1.0 / 3.0]),
        3 => (
            vec![2.0 / 3.0; 3],
            vec![-2.0 / 3.0, -2.0 / 3.0, 1.0 / 3.0, -2.0 / 3.0, -2.0 / 3.0, 1.0 / 3.0],
        ),
        _ => return None,
    };
    Some(Quadrature::from_weights_and_points(
        2,
        weights.into_iter().map(convert).collect(),
        points.into_iter().map(convert).collect(),
    ))
}

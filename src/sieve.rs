//! Incidence structure of unstructured meshes.
//!
//! A [`Sieve`] relates integer points (vertices, edges, faces and cells) through arrows
//! `from -> to`, meaning that `from` lies in the cone of `to`. Each arrow carries a color,
//! the local position of `from` in the cone of `to`. Cones are always reported in color order,
//! since basis function evaluation and degree of freedom ordering depend on it.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Identifier of a vertex, edge, face or cell.
pub type Point = usize;

/// One end of an incidence arrow together with its color.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Arrow {
    pub point: Point,
    pub color: usize,
}

/// Incidence relations stored as two arena-style maps from points to arrows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sieve {
    cones: BTreeMap<Point, Vec<Arrow>>,
    supports: BTreeMap<Point, Vec<Arrow>>,
}

impl Sieve {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a point without any incidence relations.
    pub fn add_point(&mut self, point: Point) {
        self.cones.entry(point).or_default();
        self.supports.entry(point).or_default();
    }

    /// Adds `from` to the cone of `to` at the given color.
    ///
    /// Adding an arrow that already exists replaces its color.
    pub fn add_arrow(&mut self, from: Point, to: Point, color: usize) {
        self.add_point(from);
        self.add_point(to);

        let cone = self.cones.entry(to).or_default();
        cone.retain(|arrow| arrow.point != from);
        let position = cone.partition_point(|arrow| arrow.color <= color);
        cone.insert(position, Arrow { point: from, color });

        let support = self.supports.entry(from).or_default();
        support.retain(|arrow| arrow.point != to);
        let position = support.partition_point(|arrow| arrow.point < to);
        support.insert(position, Arrow { point: to, color });
    }

    /// Points in the cone of `point`, ordered by color.
    pub fn cone(&self, point: Point) -> impl '_ + Iterator<Item = Point> {
        self.cone_arrows(point).iter().map(|arrow| arrow.point)
    }

    pub fn cone_arrows(&self, point: Point) -> &[Arrow] {
        self.cones.get(&point).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Points in the support of `point`, ordered by point id.
    pub fn support(&self, point: Point) -> impl '_ + Iterator<Item = Point> {
        self.support_arrows(point).iter().map(|arrow| arrow.point)
    }

    pub fn support_arrows(&self, point: Point) -> &[Arrow] {
        self.supports.get(&point).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn cone_size(&self, point: Point) -> usize {
        self.cone_arrows(point).len()
    }

    pub fn support_size(&self, point: Point) -> usize {
        self.support_arrows(point).len()
    }

    pub fn max_cone_size(&self) -> usize {
        self.cones.values().map(Vec::len).max().unwrap_or(0)
    }

    /// Removes all arrows pointing into `point`.
    pub fn clear_cone(&mut self, point: Point) {
        if let Some(cone) = self.cones.get_mut(&point) {
            let removed = std::mem::take(cone);
            for arrow in removed {
                if let Some(support) = self.supports.get_mut(&arrow.point) {
                    support.retain(|a| a.point != point);
                }
            }
        }
    }

    /// Replaces the cone of `point` with the given points, colored by position.
    pub fn set_cone(&mut self, point: Point, cone: &[Point]) {
        self.clear_cone(point);
        for (color, &p) in cone.iter().enumerate() {
            self.add_arrow(p, point, color);
        }
    }

    /// Points whose cone contains every one of the given points.
    pub fn join(&self, points: &[Point]) -> Vec<Point> {
        let (first, rest) = match points.split_first() {
            Some(split) => split,
            None => return Vec::new(),
        };
        self.support(*first)
            .filter(|&candidate| {
                rest.iter()
                    .all(|p| self.cone_arrows(candidate).iter().any(|arrow| arrow.point == *p))
            })
            .collect()
    }

    /// The point followed by all points transitively in its cone.
    ///
    /// Points are visited breadth-first in color order and reported once.
    pub fn closure(&self, point: Point) -> Vec<Point> {
        let mut visited = BTreeSet::new();
        let mut closure = Vec::new();
        let mut queue = VecDeque::from([point]);
        while let Some(p) = queue.pop_front() {
            if visited.insert(p) {
                closure.push(p);
                queue.extend(self.cone(p));
            }
        }
        closure
    }

    pub fn contains(&self, point: Point) -> bool {
        self.cones.contains_key(&point) || self.supports.contains_key(&point)
    }

    /// All points of the sieve in ascending order.
    pub fn points(&self) -> impl '_ + Iterator<Item = Point> {
        self.cones.keys().copied()
    }

    pub fn num_points(&self) -> usize {
        self.cones.len()
    }

    pub fn max_point(&self) -> Option<Point> {
        self.cones.keys().next_back().copied()
    }

    /// Points that have a non-empty cone.
    pub fn base_points(&self) -> impl '_ + Iterator<Item = Point> {
        self.cones
            .iter()
            .filter(|(_, cone)| !cone.is_empty())
            .map(|(p, _)| *p)
    }

    /// Points that have a non-empty support.
    pub fn cap_points(&self) -> impl '_ + Iterator<Item = Point> {
        self.supports
            .iter()
            .filter(|(_, support)| !support.is_empty())
            .map(|(p, _)| *p)
    }

    /// Classifies all points by depth and height.
    pub fn stratify(&self) -> Stratification {
        let mut depth = BTreeMap::new();
        let mut height = BTreeMap::new();
        for p in self.points() {
            compute_level(p, &self.cones, &mut depth);
            compute_level(p, &self.supports, &mut height);
        }
        Stratification { depth, height }
    }
}

/// Length of the longest chain of arrows from `point` through `adjacency`.
fn compute_level(point: Point, adjacency: &BTreeMap<Point, Vec<Arrow>>, levels: &mut BTreeMap<Point, usize>) -> usize {
    if let Some(level) = levels.get(&point) {
        return *level;
    }
    let level = adjacency
        .get(&point)
        .map(|arrows| {
            arrows
                .iter()
                .map(|arrow| compute_level(arrow.point, adjacency, levels) + 1)
                .max()
                .unwrap_or(0)
        })
        .unwrap_or(0);
    levels.insert(point, level);
    level
}

/// Depth and height of every point of a sieve.
///
/// Vertices have depth 0 and cells have height 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stratification {
    depth: BTreeMap<Point, usize>,
    height: BTreeMap<Point, usize>,
}

impl Stratification {
    pub fn depth_of(&self, point: Point) -> Option<usize> {
        self.depth.get(&point).copied()
    }

    pub fn height_of(&self, point: Point) -> Option<usize> {
        self.height.get(&point).copied()
    }

    /// Points of the given depth in ascending order.
    pub fn depth_stratum(&self, depth: usize) -> Vec<Point> {
        self.depth
            .iter()
            .filter(|(_, d)| **d == depth)
            .map(|(p, _)| *p)
            .collect()
    }

    /// Points of the given height in ascending order.
    pub fn height_stratum(&self, height: usize) -> Vec<Point> {
        self.height
            .iter()
            .filter(|(_, h)| **h == height)
            .map(|(p, _)| *p)
            .collect()
    }

    /// The depth of the sieve, i.e. the largest depth of any point.
    pub fn depth(&self) -> usize {
        self.depth.values().copied().max().unwrap_or(0)
    }
}

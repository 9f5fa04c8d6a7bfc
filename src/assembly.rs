//! Assembly of global matrices from per-element contributions.
//!
//! Elements are abstract here: anything that can report which global nodes it couples (and,
//! for matrices, a dense element matrix) can be assembled into a CSR matrix. Nodes are
//! blocks of `solution_dim` consecutive degrees of freedom, numbered by a [`DofOrdering`].
use crate::error::FaultError;
use crate::mesh::Mesh;
use crate::sieve::Point;
use fenris_traits::Real;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;

pub mod global;
pub mod local;

/// Maps mesh vertices to blocks of global degrees of freedom.
///
/// Vertices are numbered in ascending point order. Each vertex owns `block_size`
/// consecutive degrees of freedom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DofOrdering {
    nodes: BTreeMap<Point, usize>,
    block_size: usize,
}

impl DofOrdering {
    pub fn new(vertices: impl IntoIterator<Item = Point>, block_size: usize) -> Self {
        let nodes = vertices
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .enumerate()
            .map(|(index, vertex)| (vertex, index))
            .collect();
        Self { nodes, block_size }
    }

    /// One block of `space_dim` degrees of freedom per vertex of the mesh.
    pub fn from_mesh<T: Real>(mesh: &Mesh<T>) -> Self {
        Self::new(mesh.vertices(), mesh.space_dim())
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_dofs(&self) -> usize {
        self.block_size * self.nodes.len()
    }

    pub fn node_index(&self, vertex: Point) -> Option<usize> {
        self.nodes.get(&vertex).copied()
    }

    /// Like [`DofOrdering::node_index`], but a missing vertex is an error.
    pub fn try_node_index(&self, vertex: Point) -> Result<usize, FaultError> {
        self.node_index(vertex).ok_or_else(|| {
            FaultError::invariant(format!("vertex {} has no degrees of freedom in the ordering", vertex))
        })
    }

    /// The range of global degrees of freedom of the vertex.
    pub fn dof_range(&self, vertex: Point) -> Option<Range<usize>> {
        self.node_index(vertex)
            .map(|node| self.block_size * node..self.block_size * (node + 1))
    }
}

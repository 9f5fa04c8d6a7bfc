//! Cell types and their local face connectivity.
use crate::error::FaultError;
use serde::{Deserialize, Serialize};

/// The volumetric cell types a fault can cut through.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellType {
    /// A single vertex, the "cell" of a point mesh.
    Point1,
    Segment2,
    Tri3,
    Quad4,
    Tet4,
    Hex8,
}

impl CellType {
    /// Determines the cell type from the topological dimension of the mesh and the number
    /// of corners of the cell.
    pub fn from_dimension_and_corners(dimension: usize, num_corners: usize) -> Result<Self, FaultError> {
        match (dimension, num_corners) {
            (0, 1) => Ok(Self::Point1),
            (1, 2) => Ok(Self::Segment2),
            (2, 3) => Ok(Self::Tri3),
            (2, 4) => Ok(Self::Quad4),
            (3, 4) => Ok(Self::Tet4),
            (3, 8) => Ok(Self::Hex8),
            _ => Err(FaultError::configuration(
                "cell type",
                format!(
                    "unsupported cell with {} corners in a mesh of dimension {}",
                    num_corners, dimension
                ),
            )),
        }
    }

    pub fn dimension(&self) -> usize {
        match self {
            Self::Point1 => 0,
            Self::Segment2 => 1,
            Self::Tri3 | Self::Quad4 => 2,
            Self::Tet4 | Self::Hex8 => 3,
        }
    }

    pub fn num_corners(&self) -> usize {
        match self {
            Self::Point1 => 1,
            Self::Segment2 => 2,
            Self::Tri3 => 3,
            Self::Quad4 | Self::Tet4 => 4,
            Self::Hex8 => 8,
        }
    }

    /// The number of vertices of a face (a facet of codimension one) of the cell.
    ///
    /// This is the authoritative face size used both to build cohesive cells and to validate
    /// fault vertex sets.
    pub fn num_face_vertices(&self) -> usize {
        match self {
            Self::Point1 => 0,
            Self::Segment2 => 1,
            Self::Tri3 | Self::Quad4 => 2,
            Self::Tet4 => 3,
            Self::Hex8 => 4,
        }
    }

    pub fn num_faces(&self) -> usize {
        self.local_faces().len()
    }

    /// Local vertex indices of each face.
    ///
    /// Faces are ordered so that their normals point towards the exterior of a positively
    /// oriented cell.
    pub fn local_faces(&self) -> &'static [&'static [usize]] {
        match self {
            Self::Point1 => &[],
            Self::Segment2 => &[&[0], &[1]],
            Self::Tri3 => &[&[0, 1], &[1, 2], &[2, 0]],
            Self::Quad4 => &[&[0, 1], &[1, 2], &[2, 3], &[3, 0]],
            Self::Tet4 => &[&[0, 2, 1], &[0, 1, 3], &[1, 2, 3], &[0, 3, 2]],
            Self::Hex8 => &[
                &[3, 2, 1, 0],
                &[0, 1, 5, 4],
                &[1, 2, 6, 5],
                &[2, 3, 7, 6],
                &[4, 7, 3, 0],
                &[5, 6, 7, 4],
            ],
        }
    }

    /// Finds the outward-oriented face of a cell consisting of exactly the given vertices.
    ///
    /// Returns the face vertices (as global indices from `cell_vertices`) in oriented order.
    pub fn oriented_face(&self, cell_vertices: &[usize], face_vertices: &[usize]) -> Option<Vec<usize>> {
        if cell_vertices.len() != self.num_corners() {
            return None;
        }
        self.local_faces()
            .iter()
            .map(|face| face.iter().map(|&i| cell_vertices[i]).collect::<Vec<_>>())
            .find(|face| face.len() == face_vertices.len() && face.iter().all(|v| face_vertices.contains(v)))
    }
}

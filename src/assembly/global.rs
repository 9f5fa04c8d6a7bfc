use crate::assembly::local::{ElementConnectivityAssembler, ElementMatrixAssembler};
use crate::error::FaultError;

use nalgebra::{DMatrix, DMatrixViewMut, RealField, Scalar};
use nalgebra_sparse::pattern::SparsityPattern;
use nalgebra_sparse::CsrMatrix;

use std::cell::RefCell;
use std::collections::BTreeSet;

/// An assembler for CSR matrices.
#[derive(Debug, Clone)]
pub struct CsrAssembler<T: Scalar> {
    // All members are buffers that help prevent unnecessary allocations
    // when assembling multiple matrices with the same assembler
    workspace: RefCell<CsrAssemblerWorkspace<T>>,
}

impl<T: Scalar> Default for CsrAssembler<T> {
    fn default() -> Self {
        Self {
            workspace: RefCell::new(CsrAssemblerWorkspace::default()),
        }
    }
}

#[derive(Debug, Clone)]
struct CsrAssemblerWorkspace<T: Scalar> {
    connectivity_permutation: Vec<usize>,
    element_global_nodes: Vec<usize>,
    element_matrix: DMatrix<T>,
}

impl<T: Scalar> Default for CsrAssemblerWorkspace<T> {
    fn default() -> Self {
        Self {
            connectivity_permutation: Vec::new(),
            element_global_nodes: Vec::new(),
            element_matrix: DMatrix::from_row_slice(0, 0, &[]),
        }
    }
}

impl<T: Scalar> CsrAssembler<T> {
    pub fn assemble_pattern(&self, element_assembler: &dyn ElementConnectivityAssembler) -> SparsityPattern {
        // Collecting into a BTreeSet stores each matrix entry exactly once, even though
        // neighboring elements produce many duplicate entries
        let sdim = element_assembler.solution_dim();
        let mut matrix_entries = BTreeSet::new();
        let mut element_global_nodes = Vec::new();
        for i in 0..element_assembler.num_elements() {
            let element_node_count = element_assembler.element_node_count(i);
            element_global_nodes.resize(element_node_count, usize::MAX);
            element_assembler.populate_element_nodes(&mut element_global_nodes, i);

            for node_i in &element_global_nodes {
                for node_j in &element_global_nodes {
                    for s_i in 0..sdim {
                        for s_j in 0..sdim {
                            matrix_entries.insert((sdim * node_i + s_i, sdim * node_j + s_j));
                        }
                    }
                }
            }
        }

        let num_rows = sdim * element_assembler.num_nodes();
        let mut offsets = Vec::with_capacity(num_rows + 1);
        let mut column_indices = Vec::with_capacity(matrix_entries.len());

        offsets.push(0);
        for (i, j) in matrix_entries {
            // Loop to correctly handle consecutive empty rows
            while i + 1 > offsets.len() {
                offsets.push(column_indices.len());
            }
            column_indices.push(j);
        }

        while offsets.len() < (num_rows + 1) {
            offsets.push(column_indices.len());
        }

        SparsityPattern::try_from_offsets_and_indices(num_rows, num_rows, offsets, column_indices)
            .expect("Pattern built from sorted, unique entries is always valid")
    }
}

impl<T: RealField + Copy> CsrAssembler<T> {
    pub fn assemble(&self, element_assembler: &dyn ElementMatrixAssembler<T>) -> Result<CsrMatrix<T>, FaultError> {
        let pattern = self.assemble_pattern(element_assembler.as_connectivity_assembler());
        let initial_matrix_values = vec![T::zero(); pattern.nnz()];
        let mut matrix = CsrMatrix::try_from_pattern_and_values(pattern, initial_matrix_values)
            .expect("Number of values matches the pattern");
        self.assemble_into_csr(&mut matrix, element_assembler)?;
        Ok(matrix)
    }

    /// Adds element matrices into an existing matrix.
    ///
    /// The sparsity pattern of `csr` must contain every entry coupled by the elements.
    pub fn assemble_into_csr(
        &self,
        csr: &mut CsrMatrix<T>,
        element_assembler: &dyn ElementMatrixAssembler<T>,
    ) -> Result<(), FaultError> {
        let sdim = element_assembler.solution_dim();
        let expected_dim = sdim * element_assembler.num_nodes();
        if csr.nrows() != expected_dim || csr.ncols() != expected_dim {
            return Err(FaultError::invariant(format!(
                "matrix of size {}x{} does not match {} degrees of freedom",
                csr.nrows(),
                csr.ncols(),
                expected_dim
            )));
        }

        // Reuse previously allocated buffers
        let ws = &mut *self.workspace.borrow_mut();
        let connectivity_permutation = &mut ws.connectivity_permutation;
        let element_global_nodes = &mut ws.element_global_nodes;
        let element_matrix = &mut ws.element_matrix;

        for i in 0..element_assembler.num_elements() {
            let element_node_count = element_assembler.element_node_count(i);
            let element_matrix_dim = sdim * element_node_count;

            element_global_nodes.resize(element_node_count, 0);
            element_matrix.resize_mut(element_matrix_dim, element_matrix_dim, T::zero());
            element_matrix.fill(T::zero());

            let matrix_view = DMatrixViewMut::from(&mut *element_matrix);
            element_assembler.assemble_element_matrix_into(i, matrix_view)?;
            element_assembler.populate_element_nodes(element_global_nodes, i);

            connectivity_permutation.clear();
            connectivity_permutation.extend(0..element_node_count);
            connectivity_permutation.sort_unstable_by_key(|i| element_global_nodes[*i]);

            for (local_node_idx, global_node_idx) in element_global_nodes.iter().enumerate() {
                for s in 0..sdim {
                    let local_row_index = sdim * local_node_idx + s;
                    let global_row_index = sdim * *global_node_idx + s;
                    let mut csr_row = csr.row_mut(global_row_index);
                    let (column_indices, values) = csr_row.cols_and_values_mut();

                    let local_row: Vec<T> = element_matrix.row(local_row_index).iter().copied().collect();
                    add_element_row_to_csr_row(
                        column_indices,
                        values,
                        element_global_nodes,
                        connectivity_permutation,
                        sdim,
                        &local_row,
                    )
                    .map_err(|column| {
                        FaultError::invariant(format!(
                            "entry ({}, {}) is not part of the sparsity pattern",
                            global_row_index, column
                        ))
                    })?;
                }
            }
        }

        Ok(())
    }
}

/// Adds a row of an element matrix to the matching entries of a CSR row.
///
/// Returns the global column index that could not be found in the row, if any.
fn add_element_row_to_csr_row<T: RealField + Copy>(
    column_indices: &[usize],
    values: &mut [T],
    node_connectivity: &[usize],
    sorted_permutation: &[usize],
    dim: usize,
    local_row: &[T],
) -> Result<(), usize> {
    assert_eq!(node_connectivity.len(), sorted_permutation.len());
    assert_eq!(node_connectivity.len() * dim, local_row.len());
    assert!(dim >= 1);

    // Nodes are visited in ascending global order, so a single forward pass over the
    // (sorted) column indices finds every entry
    let mut csr_col_idx_iter = column_indices.iter().copied().enumerate();

    for &node_local_idx in sorted_permutation {
        let node_global_idx = node_connectivity[node_local_idx];

        for i in 0..dim {
            let local_col_idx = dim * node_local_idx + i;
            let global_col_index = dim * node_global_idx + i;

            let (local_csr_col_idx, _) = csr_col_idx_iter
                .find(|(_, csr_col_idx)| *csr_col_idx == global_col_index)
                .ok_or(global_col_index)?;
            values[local_csr_col_idx] += local_row[local_col_idx];
        }
    }
    Ok(())
}

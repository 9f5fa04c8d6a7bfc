use fenris_fault::assembly::global::CsrAssembler;
use fenris_fault::assembly::local::{ElementConnectivityAssembler, ElementMatrixAssembler};
use fenris_fault::assembly::DofOrdering;
use fenris_fault::error::{ErrorCategory, FaultError};
use nalgebra::{DMatrix, DMatrixViewMut};
use nalgebra_sparse::CsrMatrix;

/// Unit springs between pairs of nodes with two degrees of freedom each.
struct Springs {
    num_nodes: usize,
    pairs: Vec<[usize; 2]>,
}

impl ElementConnectivityAssembler for Springs {
    fn solution_dim(&self) -> usize {
        2
    }

    fn num_elements(&self) -> usize {
        self.pairs.len()
    }

    fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    fn element_node_count(&self, _element_index: usize) -> usize {
        2
    }

    fn populate_element_nodes(&self, output: &mut [usize], element_index: usize) {
        output.copy_from_slice(&self.pairs[element_index]);
    }
}

impl ElementMatrixAssembler<f64> for Springs {
    fn assemble_element_matrix_into(&self, _element_index: usize, mut output: DMatrixViewMut<f64>) -> Result<(), FaultError> {
        for d in 0..2 {
            output[(d, d)] = 1.0;
            output[(2 + d, 2 + d)] = 1.0;
            output[(d, 2 + d)] = -1.0;
            output[(2 + d, d)] = -1.0;
        }
        Ok(())
    }

    fn as_connectivity_assembler(&self) -> &dyn ElementConnectivityAssembler {
        self
    }
}

#[test]
fn dof_ordering_numbers_vertices_in_ascending_order() {
    let ordering = DofOrdering::new([12, 3, 7, 3], 3);
    assert_eq!(ordering.num_nodes(), 3);
    assert_eq!(ordering.num_dofs(), 9);
    assert_eq!(ordering.block_size(), 3);
    assert_eq!(ordering.node_index(7), Some(1));
    assert_eq!(ordering.dof_range(12), Some(6..9));
    assert_eq!(ordering.node_index(4), None);
    let err = ordering.try_node_index(4).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::InvariantViolation);
}

#[test]
fn pattern_contains_blocks_of_coupled_nodes() {
    // The third node is not coupled to anything
    let springs = Springs {
        num_nodes: 4,
        pairs: vec![[0, 1], [3, 1]],
    };
    let pattern = CsrAssembler::<f64>::default().assemble_pattern(&springs);
    assert_eq!(pattern.major_dim(), 8);
    assert_eq!(pattern.nnz(), 7 * 4);
    assert!(pattern.lane(4).is_empty());
    assert_eq!(pattern.lane(0), &[0, 1, 2, 3]);
    assert_eq!(pattern.lane(2), &[0, 1, 2, 3, 6, 7]);
}

#[test]
fn assembled_matrix_sums_element_contributions() {
    let springs = Springs {
        num_nodes: 3,
        pairs: vec![[0, 1], [2, 1]],
    };
    let matrix = CsrAssembler::default().assemble(&springs).unwrap();

    #[rustfmt::skip]
    let expected = DMatrix::from_row_slice(6, 6, &[
         1.0,  0.0, -1.0,  0.0,  0.0,  0.0,
         0.0,  1.0,  0.0, -1.0,  0.0,  0.0,
        -1.0,  0.0,  2.0,  0.0, -1.0,  0.0,
         0.0, -1.0,  0.0,  2.0,  0.0, -1.0,
         0.0,  0.0, -1.0,  0.0,  1.0,  0.0,
         0.0,  0.0,  0.0, -1.0,  0.0,  1.0,
    ]);
    assert_eq!(DMatrix::from(&matrix), expected);
}

#[test]
fn assembly_into_incompatible_matrix_fails() {
    let springs = Springs {
        num_nodes: 3,
        pairs: vec![[0, 1], [2, 1]],
    };
    let assembler = CsrAssembler::default();

    let mut wrong_size = CsrMatrix::identity(4);
    let err = assembler
        .assemble_into_csr(&mut wrong_size, &springs)
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::InvariantViolation);

    // Right size, but the pattern lacks the off-diagonal blocks
    let mut diagonal = CsrMatrix::identity(6);
    let err = assembler
        .assemble_into_csr(&mut diagonal, &springs)
        .unwrap_err();
    assert!(err.to_string().contains("sparsity pattern"), "{}", err);
}

use crate::error::FaultError;
use nalgebra::{DMatrixViewMut, Scalar};

pub trait ElementConnectivityAssembler {
    fn solution_dim(&self) -> usize;

    fn num_elements(&self) -> usize;

    fn num_nodes(&self) -> usize;

    fn element_node_count(&self, element_index: usize) -> usize;

    fn populate_element_nodes(&self, output: &mut [usize], element_index: usize);
}

pub trait ElementMatrixAssembler<T: Scalar>: ElementConnectivityAssembler {
    /// Writes the element matrix of the given element into `output`.
    ///
    /// `output` is square with dimension `solution_dim * element_node_count` and is zeroed
    /// before the call.
    fn assemble_element_matrix_into(
        &self,
        element_index: usize,
        output: DMatrixViewMut<T>,
    ) -> Result<(), FaultError>;

    fn as_connectivity_assembler(&self) -> &dyn ElementConnectivityAssembler;
}

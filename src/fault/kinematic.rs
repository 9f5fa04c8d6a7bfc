//! Kinematic faults: prescribed slip enforced with Lagrange multipliers.
//!
//! Each cohesive cell couples, for every vertex of its fault face, a vertex `i` on the
//! positive side, its duplicate `j` on the negative side and a Lagrange multiplier vertex `k`.
//! With `R` the orientation of the fault at the vertex (rows along-strike, up-dip, normal) and
//! `w` the share of the vertex area that belongs to the cell, the residual contributions are
//!
//! ```text
//! r_i += R^T l_k w
//! r_j -= R^T l_k w
//! r_k -= R (u_j - u_i) w
//! ```
//!
//! and the prescribed slip `d` is added directly to `r_k`, so that the constraint equation
//! reads `R (u_j - u_i) = d`.
use crate::assembly::global::CsrAssembler;
use crate::assembly::local::{ElementConnectivityAssembler, ElementMatrixAssembler};
use crate::assembly::DofOrdering;
use crate::cohesive::CohesiveTopology;
use crate::context::Context;
use crate::element::FaultQuadrature;
use crate::error::{FaultError, RequestKind};
use crate::fault::{compute_area, compute_orientation, FaultConfig, SlipSource, VertexFieldRequest};
use crate::mesh::{Mesh, MATERIAL_ID_LABEL};
use crate::partition::Communicator;
use crate::section::{Field, Fields, Section, VectorFieldType};
use crate::sieve::Point;
use crate::solution::{SolutionFields, DISP_INCR, DISP_T};
use fenris_traits::{Nondimensional, Real};
use itertools::{izip, Itertools};
use log::{debug, info, trace};
use nalgebra::DMatrixViewMut;
use nalgebra_sparse::pattern::SparsityPattern;
use nalgebra_sparse::CsrMatrix;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fmt;
use std::fmt::{Debug, Formatter};

const SLIP: &str = "slip";
const CUMULATIVE_SLIP: &str = "cumulative slip";
const ORIENTATION: &str = "orientation";
const AREA: &str = "area";
const VECTOR_BUFFER: &str = "buffer (vector)";

/// A cohesive cell prepared for assembly.
#[derive(Debug, Clone)]
struct ConstraintCell<T> {
    cell: Point,
    /// Domain vertices `[i..][j..][k..]`.
    cone: Vec<Point>,
    /// Fault mesh vertex of each constraint.
    fault_vertices: Vec<Point>,
    /// Share of the area of each fault vertex that belongs to this cell.
    weights: Vec<T>,
}

impl<T> ConstraintCell<T> {
    fn num_constraints(&self) -> usize {
        self.fault_vertices.len()
    }

    /// Positive side, negative side and Lagrange vertex of a constraint.
    fn constraint_vertices(&self, index: usize) -> (Point, Point, Point) {
        let n = self.num_constraints();
        (self.cone[index], self.cone[n + index], self.cone[2 * n + index])
    }
}

/// Data available once the fault has been initialized.
#[derive(Debug, Clone)]
struct FaultState<T: Real> {
    fault_mesh: Mesh<T>,
    fault_renumbering: BTreeMap<Point, Point>,
    constraint_cells: Vec<ConstraintCell<T>>,
    fields: Fields<T>,
    length_scale: T,
    pressure_scale: T,
}

/// A fault with prescribed slip.
pub struct KinematicFault<T: Real> {
    config: FaultConfig,
    quadrature: FaultQuadrature<T>,
    sources: BTreeMap<String, Box<dyn SlipSource<T>>>,
    state: Option<FaultState<T>>,
    needs_new_jacobian: bool,
}

impl<T: Real> Debug for KinematicFault<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("KinematicFault")
            .field("config", &self.config)
            .field("quadrature", &self.quadrature)
            .field("sources", &self.sources.keys().collect_vec())
            .field("initialized", &self.state.is_some())
            .field("needs_new_jacobian", &self.needs_new_jacobian)
            .finish()
    }
}

impl<T: Real> KinematicFault<T> {
    pub fn new(config: FaultConfig, quadrature: FaultQuadrature<T>) -> Self {
        Self {
            config,
            quadrature,
            sources: BTreeMap::new(),
            state: None,
            needs_new_jacobian: true,
        }
    }

    pub fn config(&self) -> &FaultConfig {
        &self.config
    }

    pub fn label(&self) -> &str {
        &self.config.label
    }

    pub fn quadrature(&self) -> &FaultQuadrature<T> {
        &self.quadrature
    }

    fn configuration_error(&self, message: impl Into<String>) -> FaultError {
        FaultError::configuration(format!("fault '{}'", self.config.label), message)
    }

    fn state(&self) -> Result<&FaultState<T>, FaultError> {
        self.state
            .as_ref()
            .ok_or_else(|| FaultError::invariant(format!("fault '{}' has not been initialized", self.config.label)))
    }

    fn state_mut(&mut self) -> Result<&mut FaultState<T>, FaultError> {
        let label = &self.config.label;
        self.state
            .as_mut()
            .ok_or_else(|| FaultError::invariant(format!("fault '{}' has not been initialized", label)))
    }

    /// Replaces the slip sources of the fault. Sources are kept ordered by name.
    pub fn set_sources(
        &mut self,
        names: &[&str],
        sources: Vec<Box<dyn SlipSource<T>>>,
    ) -> Result<(), FaultError> {
        if names.len() != sources.len() {
            return Err(self.configuration_error(format!(
                "mismatch in number of slip source names ({}) and slip sources ({})",
                names.len(),
                sources.len()
            )));
        }
        self.sources = names
            .iter()
            .map(|name| name.to_string())
            .zip(sources)
            .collect();
        Ok(())
    }

    pub fn source_names(&self) -> impl '_ + Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    /// Checks that the mesh and the quadrature rule fit together.
    pub fn verify_configuration(&self, mesh: &Mesh<T>) -> Result<(), FaultError> {
        let label = &self.config.label;
        if !mesh.has_vertex_group(label) {
            return Err(self.configuration_error(format!(
                "mesh missing group of vertices '{}' for fault",
                label
            )));
        }

        let dimension = mesh.dimension().checked_sub(1);
        if dimension != Some(self.quadrature.cell_dim()) {
            return Err(self.configuration_error(format!(
                "dimension of reference cell in quadrature scheme ({}) does not match dimension of \
                 cells in mesh ({}) for fault '{}'",
                self.quadrature.cell_dim(),
                mesh.dimension() as i64 - 1,
                label
            )));
        }

        let num_corners = self.quadrature.num_corners();
        for cell in mesh.label_stratum(MATERIAL_ID_LABEL, self.config.id) {
            let cell_num_corners = mesh.num_cell_corners(cell);
            if 3 * num_corners != cell_num_corners {
                return Err(self.configuration_error(format!(
                    "number of vertices in reference cell ({}) is not compatible with number of \
                     vertices ({}) in cohesive cell {} for fault '{}'",
                    num_corners, cell_num_corners, cell, label
                )));
            }
        }
        Ok(())
    }

    /// Allocates the fault fields and computes the fault geometry.
    ///
    /// `mesh` is the domain mesh after insertion of the cohesive cells of `topology`.
    pub fn initialize(
        &mut self,
        mesh: &Mesh<T>,
        topology: &CohesiveTopology<T>,
        normalizer: &dyn Nondimensional<T>,
        comm: &dyn Communicator<T>,
        ctx: &Context,
    ) -> Result<(), FaultError> {
        let _stage = ctx.stage("fault");

        if topology.material_id() != self.config.id {
            return Err(self.configuration_error(format!(
                "cohesive cells have material id {}, but the fault has id {}",
                topology.material_id(),
                self.config.id
            )));
        }
        let fault_mesh = topology.fault_mesh().clone();
        if fault_mesh.dimension() != self.quadrature.cell_dim() || mesh.space_dim() != self.quadrature.space_dim() {
            return Err(self.configuration_error(format!(
                "quadrature for {}D cells in {}D space cannot integrate a {}D fault in {}D space",
                self.quadrature.cell_dim(),
                self.quadrature.space_dim(),
                fault_mesh.dimension(),
                mesh.space_dim()
            )));
        }

        for source in self.sources.values_mut() {
            source.initialize(&fault_mesh, normalizer)?;
        }

        let space_dim = mesh.space_dim();
        let length_scale = normalizer.length_scale();
        let mut fields = Fields::new();
        let slip = Field::new("slip", Section::with_uniform_fiber(fault_mesh.vertices(), space_dim))
            .with_scale(length_scale)
            .with_vector_field_type(VectorFieldType::Vector);
        let cumulative_slip = Field::new("cumulative_slip", slip.section().clone_layout())
            .with_scale(length_scale)
            .with_vector_field_type(VectorFieldType::Vector);
        fields.add(SLIP, slip);
        fields.add(CUMULATIVE_SLIP, cumulative_slip);

        let orientation = compute_orientation(
            &fault_mesh,
            &self.quadrature,
            &self.config.up_dir(),
            &self.config.normal_dir(),
            comm,
        )?;
        let area = compute_area(&fault_mesh, &self.quadrature, comm)?;

        let constraint_cells = self.constraint_cells(mesh, topology, &fault_mesh, area.section())?;
        fields.add(ORIENTATION, orientation);
        fields.add(AREA, area);

        info!(
            "Initialized fault '{}' with {} vertices and {} cohesive cells",
            self.config.label,
            fault_mesh.num_vertices(),
            constraint_cells.len()
        );
        self.state = Some(FaultState {
            fault_mesh,
            fault_renumbering: topology.fault_renumbering().clone(),
            constraint_cells,
            fields,
            length_scale,
            pressure_scale: normalizer.pressure_scale(),
        });
        self.needs_new_jacobian = true;
        Ok(())
    }

    fn constraint_cells(
        &self,
        mesh: &Mesh<T>,
        topology: &CohesiveTopology<T>,
        fault_mesh: &Mesh<T>,
        area: &Section<T>,
    ) -> Result<Vec<ConstraintCell<T>>, FaultError> {
        let num_corners = self.quadrature.num_corners();
        topology
            .cohesive_to_fault()
            .iter()
            .map(|(&cell, &face)| {
                let cone = mesh.cell_vertices(cell);
                if cone.len() != 3 * num_corners {
                    return Err(self.configuration_error(format!(
                        "cohesive cell {} has {} vertices, expected {} (are Lagrange constraints enabled?)",
                        cell,
                        cone.len(),
                        3 * num_corners
                    )));
                }
                let fault_vertices = cone[2 * num_corners..]
                    .iter()
                    .map(|v| {
                        topology.fault_renumbering().get(v).copied().ok_or_else(|| {
                            FaultError::invariant(format!(
                                "Lagrange vertex {} of cohesive cell {} is not on the fault",
                                v, cell
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                let coords = fault_mesh.cell_coordinates(face)?;
                let cell_areas = self.quadrature.basis_areas(&coords)?;
                let weights = izip!(&fault_vertices, &cell_areas)
                    .map(|(vertex, cell_area)| {
                        let vertex_area = area.restrict_point(*vertex)?[0];
                        if vertex_area <= T::zero() {
                            return Err(FaultError::invariant(format!(
                                "fault vertex {} has zero tributary area",
                                vertex
                            )));
                        }
                        Ok(*cell_area / vertex_area)
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(ConstraintCell {
                    cell,
                    cone,
                    fault_vertices,
                    weights,
                })
            })
            .collect()
    }

    /// Adds the contributions of the cohesive cells to the residual.
    ///
    /// The displacement at the end of the time step is `disp(t) + dispIncr(t->t+dt)`. The
    /// residual is not completed across partitions, which is left to the caller once all
    /// contributions have been added.
    pub fn integrate_residual(
        &self,
        residual: &mut Section<T>,
        t: T,
        fields: &SolutionFields<T>,
        ctx: &Context,
    ) -> Result<(), FaultError> {
        let _stage = ctx.stage("fault residual");
        let state = self.state()?;
        let disp = fields.get(DISP_T)?.section();
        let disp_incr = fields.get(DISP_INCR)?.section();
        let orientation = state.fields.get(ORIENTATION)?.section();
        let space_dim = self.quadrature.space_dim();
        trace!("Integrating residual of fault '{}' at t = {:?}", self.config.label, t);

        let contributions = state
            .constraint_cells
            .par_iter()
            .map(|constraint_cell| -> Result<Vec<T>, FaultError> {
                let mut u = Vec::with_capacity(constraint_cell.cone.len() * space_dim);
                for &v in &constraint_cell.cone {
                    let u_t = disp.restrict_point(v)?;
                    let du = disp_incr.restrict_point(v)?;
                    u.extend(u_t.iter().zip(du).map(|(a, b)| *a + *b));
                }

                let n = constraint_cell.num_constraints();
                let mut cell_residual = vec![T::zero(); u.len()];
                for (m, (fault_vertex, w)) in izip!(&constraint_cell.fault_vertices, &constraint_cell.weights).enumerate() {
                    let rotation = orientation.restrict_point(*fault_vertex)?;
                    let (i, j, k) = (m * space_dim, (n + m) * space_dim, (2 * n + m) * space_dim);
                    for d in 0..space_dim {
                        for kd in 0..space_dim {
                            let r = rotation[kd * space_dim + d] * *w;
                            cell_residual[i + d] += u[k + kd] * r;
                            cell_residual[j + d] -= u[k + kd] * r;
                            cell_residual[k + kd] -= (u[j + d] - u[i + d]) * r;
                        }
                    }
                }
                Ok(cell_residual)
            })
            .collect::<Result<Vec<_>, _>>()?;

        for (constraint_cell, cell_residual) in state.constraint_cells.iter().zip(&contributions) {
            trace!("Residual of cohesive cell {}: {:?}", constraint_cell.cell, cell_residual);
            for (v, values) in constraint_cell
                .cone
                .iter()
                .zip(cell_residual.chunks_exact(space_dim))
            {
                residual.update_add_point(*v, values)?;
            }
        }
        Ok(())
    }

    /// Computes the slip at time `t` and adds it to the residual of the Lagrange multipliers.
    pub fn integrate_residual_assembled(&mut self, residual: &mut Section<T>, t: T) -> Result<(), FaultError> {
        let sources = &self.sources;
        let state = self
            .state
            .as_mut()
            .ok_or_else(|| FaultError::invariant(format!("fault '{}' has not been initialized", self.config.label)))?;

        let slip = state.fields.get_mut(SLIP)?.section_mut();
        slip.zero();
        for (name, source) in sources {
            if t >= source.origin_time() {
                trace!("Adding slip of source '{}' at t = {:?}", name, t);
                source.slip(slip, t)?;
            }
        }

        let slip = state.fields.get(SLIP)?.section();
        for (&vertex_mesh, &vertex_fault) in &state.fault_renumbering {
            residual.update_add_point(vertex_mesh, slip.restrict_point(vertex_fault)?)?;
        }
        Ok(())
    }

    fn constraint_assembler<'a>(&'a self, ordering: &'a DofOrdering) -> Result<ConstraintAssembler<'a, T>, FaultError> {
        let state = self.state()?;
        let space_dim = self.quadrature.space_dim();
        if ordering.block_size() != space_dim {
            return Err(FaultError::invariant(format!(
                "degree of freedom blocks of size {} do not match the {}D fault",
                ordering.block_size(),
                space_dim
            )));
        }
        let orientation = state.fields.get(ORIENTATION)?.section();

        let mut elements = Vec::new();
        for constraint_cell in &state.constraint_cells {
            for (m, (fault_vertex, weight)) in izip!(&constraint_cell.fault_vertices, &constraint_cell.weights).enumerate() {
                let (i, j, k) = constraint_cell.constraint_vertices(m);
                let rotation = orientation.restrict_point(*fault_vertex)?;
                let lagrange_node = ordering.try_node_index(k)?;
                for (side, sign) in [(i, -T::one()), (j, T::one())] {
                    elements.push(ConstraintElement {
                        nodes: [ordering.try_node_index(side)?, lagrange_node],
                        scale: sign * *weight,
                        rotation,
                    });
                }
            }
        }
        Ok(ConstraintAssembler {
            space_dim,
            num_nodes: ordering.num_nodes(),
            elements,
        })
    }

    /// The sparsity pattern of the Jacobian blocks coupling fault sides and Lagrange
    /// multipliers.
    pub fn jacobian_pattern(&self, ordering: &DofOrdering) -> Result<SparsityPattern, FaultError> {
        let assembler = self.constraint_assembler(ordering)?;
        Ok(CsrAssembler::<T>::default().assemble_pattern(&assembler))
    }

    /// Adds the direction cosines of the constraints to the Jacobian.
    ///
    /// `jacobian` must contain the entries of [`KinematicFault::jacobian_pattern`].
    pub fn integrate_jacobian_assembled(
        &mut self,
        jacobian: &mut CsrMatrix<T>,
        ordering: &DofOrdering,
    ) -> Result<(), FaultError> {
        let assembler = self.constraint_assembler(ordering)?;
        CsrAssembler::default().assemble_into_csr(jacobian, &assembler)?;
        debug!(
            "Assembled {} constraint blocks of fault '{}'",
            assembler.elements.len(),
            self.config.label
        );
        self.needs_new_jacobian = false;
        Ok(())
    }

    pub fn needs_new_jacobian(&self) -> bool {
        self.needs_new_jacobian
    }

    /// Accumulates the slip of the completed time step into the cumulative slip.
    pub fn update_state_vars(&mut self, t: T) -> Result<(), FaultError> {
        let use_solution_increment = self.config.use_solution_increment;
        let state = self.state_mut()?;
        let slip = state.fields.get(SLIP)?.section().clone();
        let cumulative_slip = state.fields.get_mut(CUMULATIVE_SLIP)?.section_mut();
        if !use_solution_increment {
            cumulative_slip.zero();
        }
        cumulative_slip.add_assign(&slip)?;
        trace!("Updated cumulative slip at t = {:?}", t);
        Ok(())
    }

    /// A fault field by its internal name (`slip`, `cumulative slip`, `orientation`, `area`).
    pub fn field(&self, name: &str) -> Result<&Field<T>, FaultError> {
        self.state()?.fields.get(name)
    }

    pub fn fault_mesh(&self) -> Result<&Mesh<T>, FaultError> {
        Ok(&self.state()?.fault_mesh)
    }

    fn unknown_request(&self, kind: RequestKind, name: &str) -> FaultError {
        FaultError::UnknownRequest {
            kind,
            name: name.to_string(),
            fault: self.config.label.clone(),
        }
    }

    /// Returns a vertex field for output.
    ///
    /// `fields` is only needed for `traction_change`, which is computed from `disp(t)`.
    pub fn vertex_field(&mut self, name: &str, fields: Option<&SolutionFields<T>>) -> Result<&Field<T>, FaultError> {
        let request: VertexFieldRequest = name
            .parse()
            .map_err(|_| self.unknown_request(RequestKind::VertexField, name))?;
        let cohesive_dim = self.state()?.fault_mesh.dimension();
        let space_dim = self.quadrature.space_dim();

        let fibration = match request {
            VertexFieldRequest::Slip => return self.field(CUMULATIVE_SLIP),
            VertexFieldRequest::StrikeDir if cohesive_dim > 0 => Some((0, "strike_dir")),
            VertexFieldRequest::DipDir if cohesive_dim == 2 => Some((1, "dip_dir")),
            VertexFieldRequest::NormalDir => Some((cohesive_dim, "normal_dir")),
            VertexFieldRequest::FinalSlip(ref source) | VertexFieldRequest::SlipTime(ref source) => {
                let slip_source = self
                    .sources
                    .get(source)
                    .ok_or_else(|| self.unknown_request(RequestKind::VertexField, name))?;
                return match request {
                    VertexFieldRequest::FinalSlip(_) => slip_source.final_slip(),
                    _ => slip_source.slip_time(),
                };
            }
            VertexFieldRequest::TractionChange => None,
            _ => return Err(self.unknown_request(RequestKind::VertexField, name)),
        };

        let buffer = match fibration {
            Some((index, label)) => {
                let section = self.field(ORIENTATION)?.fibration(index, space_dim)?;
                Field::new(label, section).with_vector_field_type(VectorFieldType::Vector)
            }
            None => {
                let disp = fields
                    .ok_or_else(|| FaultError::invariant(format!("missing field '{}'", DISP_T)))?
                    .get(DISP_T)?;
                self.traction_change(disp)?
            }
        };

        let state = self.state_mut()?;
        state.fields.add(VECTOR_BUFFER, buffer);
        state.fields.get(VECTOR_BUFFER)
    }

    /// Fault tractions from the Lagrange multipliers of `disp`, divided by the vertex area.
    fn traction_change(&self, disp: &Field<T>) -> Result<Field<T>, FaultError> {
        let state = self.state()?;
        let area = state.fields.get(AREA)?.section();
        let mut tractions = state.fields.get(SLIP)?.section().clone_layout();
        for (&vertex_mesh, &vertex_fault) in &state.fault_renumbering {
            let vertex_area = area.restrict_point(vertex_fault)?[0];
            let values = disp
                .section()
                .restrict_point(vertex_mesh)?
                .iter()
                .map(|x| *x / vertex_area)
                .collect_vec();
            tractions.update_point(vertex_fault, &values)?;
        }
        Ok(Field::new("traction_change", tractions)
            .with_scale(state.pressure_scale)
            .with_vector_field_type(VectorFieldType::Vector))
    }

    /// Cell fields are not provided by kinematic faults.
    pub fn cell_field(&self, name: &str) -> Result<&Field<T>, FaultError> {
        Err(self.unknown_request(RequestKind::CellField, name))
    }

    /// The length scale the slip fields are expressed in.
    pub fn length_scale(&self) -> Result<T, FaultError> {
        Ok(self.state()?.length_scale)
    }
}

/// One constraint coupling a fault side with its Lagrange multiplier.
struct ConstraintElement<'a, T> {
    /// Side node and Lagrange node.
    nodes: [usize; 2],
    /// Sign of the side times the area weight.
    scale: T,
    rotation: &'a [T],
}

struct ConstraintAssembler<'a, T> {
    space_dim: usize,
    num_nodes: usize,
    elements: Vec<ConstraintElement<'a, T>>,
}

impl<'a, T: Real> ElementConnectivityAssembler for ConstraintAssembler<'a, T> {
    fn solution_dim(&self) -> usize {
        self.space_dim
    }

    fn num_elements(&self) -> usize {
        self.elements.len()
    }

    fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    fn element_node_count(&self, _element_index: usize) -> usize {
        2
    }

    fn populate_element_nodes(&self, output: &mut [usize], element_index: usize) {
        output.copy_from_slice(&self.elements[element_index].nodes);
    }
}

impl<'a, T: Real> ElementMatrixAssembler<T> for ConstraintAssembler<'a, T> {
    fn assemble_element_matrix_into(
        &self,
        element_index: usize,
        mut output: DMatrixViewMut<T>,
    ) -> Result<(), FaultError> {
        let element = &self.elements[element_index];
        let sdim = self.space_dim;
        // Side-Lagrange block is scale * R^T, Lagrange-side block is scale * R
        for k in 0..sdim {
            for d in 0..sdim {
                let entry = element.scale * element.rotation[k * sdim + d];
                output[(d, sdim + k)] = entry;
                output[(sdim + k, d)] = entry;
            }
        }
        Ok(())
    }

    fn as_connectivity_assembler(&self) -> &dyn ElementConnectivityAssembler {
        self
    }
}

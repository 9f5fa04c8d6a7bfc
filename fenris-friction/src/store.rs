use crate::{FrictionError, FrictionModel};
use fenris_traits::{Nondimensional, Real, SpatialDatabase};
use log::debug;
use std::collections::BTreeMap;
use std::marker::PhantomData;

/// Per-vertex friction properties and state variables for a single friction model.
///
/// Properties and the initial state are queried from spatial databases once, at
/// construction, and kept in non-dimensional form. State variables are advanced by
/// [`FrictionVertexStore::update_state`] after each completed time step.
#[derive(Debug, Clone)]
pub struct FrictionVertexStore<T: Real, M: FrictionModel<T>> {
    model: M,
    index: BTreeMap<usize, usize>,
    properties: Vec<M::Properties>,
    state: Vec<M::State>,
    marker: PhantomData<T>,
}

impl<T, M> FrictionVertexStore<T, M>
where
    T: Real,
    M: FrictionModel<T>,
{
    /// Queries properties (and optionally initial state) at each vertex.
    ///
    /// Vertex coordinates are expected in non-dimensional form, they are scaled by the length
    /// scale before the databases are queried.
    pub fn initialize<I, C, N>(
        model: M,
        vertices: I,
        properties_db: &dyn SpatialDatabase<T>,
        state_db: Option<&dyn SpatialDatabase<T>>,
        normalizer: &N,
    ) -> Result<Self, FrictionError>
    where
        I: IntoIterator<Item = (usize, C)>,
        C: AsRef<[T]>,
        N: Nondimensional<T> + ?Sized,
    {
        let mut index = BTreeMap::new();
        let mut properties = Vec::new();
        let mut state = Vec::new();
        let length_scale = normalizer.length_scale();

        for (vertex, coords) in vertices {
            let location: Vec<T> = coords
                .as_ref()
                .iter()
                .map(|&x| normalizer.dimensionalize(x, length_scale))
                .collect();

            let db_values = properties_db
                .query(&location, model.db_properties())
                .map_err(|report| FrictionError::Database { vertex, report })?;
            let mut vertex_properties = model.properties_from_db(&db_values)?;
            model.nondim_properties(&mut vertex_properties, normalizer);

            let mut vertex_state = match state_db {
                Some(db) => {
                    let db_values = db
                        .query(&location, model.db_state_vars())
                        .map_err(|report| FrictionError::Database { vertex, report })?;
                    model.state_vars_from_db(&db_values)?
                }
                None => model.initial_state(),
            };
            model.nondim_state_vars(&mut vertex_state, normalizer);

            index.insert(vertex, properties.len());
            properties.push(vertex_properties);
            state.push(vertex_state);
        }

        debug!("Initialized friction data for {} vertices", properties.len());

        Ok(Self {
            model,
            index,
            properties,
            state,
            marker: PhantomData,
        })
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn num_vertices(&self) -> usize {
        self.properties.len()
    }

    /// Vertices with friction data, in ascending order.
    pub fn vertices(&self) -> impl '_ + Iterator<Item = usize> {
        self.index.keys().copied()
    }

    fn local_index(&self, vertex: usize) -> Result<usize, FrictionError> {
        self.index
            .get(&vertex)
            .copied()
            .ok_or(FrictionError::UnknownVertex(vertex))
    }

    pub fn properties(&self, vertex: usize) -> Result<&M::Properties, FrictionError> {
        Ok(&self.properties[self.local_index(vertex)?])
    }

    pub fn state(&self, vertex: usize) -> Result<&M::State, FrictionError> {
        Ok(&self.state[self.local_index(vertex)?])
    }

    /// Properties at a vertex converted back to physical units.
    pub fn dimensional_properties<N>(&self, vertex: usize, normalizer: &N) -> Result<M::Properties, FrictionError>
    where
        N: Nondimensional<T> + ?Sized,
    {
        let mut properties = self.properties(vertex)?.clone();
        self.model.dim_properties(&mut properties, normalizer);
        Ok(properties)
    }

    /// State variables at a vertex converted back to physical units.
    pub fn dimensional_state<N>(&self, vertex: usize, normalizer: &N) -> Result<M::State, FrictionError>
    where
        N: Nondimensional<T> + ?Sized,
    {
        let mut state = self.state(vertex)?.clone();
        self.model.dim_state_vars(&mut state, normalizer);
        Ok(state)
    }

    pub fn friction(&self, vertex: usize, t: T, slip: T, slip_rate: T, normal_traction: T) -> Result<T, FrictionError> {
        let i = self.local_index(vertex)?;
        Ok(self
            .model
            .calc_friction(t, slip, slip_rate, normal_traction, &self.properties[i], &self.state[i]))
    }

    pub fn friction_deriv(
        &self,
        vertex: usize,
        t: T,
        slip: T,
        slip_rate: T,
        normal_traction: T,
    ) -> Result<T, FrictionError> {
        let i = self.local_index(vertex)?;
        Ok(self
            .model
            .calc_friction_deriv(t, slip, slip_rate, normal_traction, &self.properties[i], &self.state[i]))
    }

    pub fn update_state(
        &mut self,
        vertex: usize,
        t: T,
        slip: T,
        slip_rate: T,
        normal_traction: T,
    ) -> Result<(), FrictionError> {
        let i = self.local_index(vertex)?;
        self.model
            .update_state_vars(t, slip, slip_rate, normal_traction, &mut self.state[i], &self.properties[i]);
        Ok(())
    }
}

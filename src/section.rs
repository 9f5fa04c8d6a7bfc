//! Per-point data attached to mesh points.
use crate::error::FaultError;
use crate::sieve::{Point, Sieve};
use fenris_traits::Real;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Location of the values of a single point in a [`Section`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Fiber {
    offset: usize,
    dim: usize,
}

/// A map from points to contiguous slices of values.
///
/// The layout (the atlas of fibers) is fixed once points have been added. Values of all points
/// are stored in a single vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Section<T> {
    atlas: BTreeMap<Point, Fiber>,
    values: Vec<T>,
}

impl<T> Default for Section<T> {
    fn default() -> Self {
        Self {
            atlas: BTreeMap::new(),
            values: Vec::new(),
        }
    }
}

fn missing_point(point: Point) -> FaultError {
    FaultError::invariant(format!("point {} is not part of the section", point))
}

fn dimension_mismatch(point: Point, expected: usize, actual: usize) -> FaultError {
    FaultError::invariant(format!(
        "fiber dimension mismatch at point {}: expected {} values, got {}",
        point, expected, actual
    ))
}

impl<T: Real> Section<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a zeroed section with the same fiber dimension for every point.
    pub fn with_uniform_fiber(points: impl IntoIterator<Item = Point>, fiber_dim: usize) -> Self {
        let mut section = Self::new();
        for p in points {
            // Points are new or repeated with the same dimension, so this cannot fail
            let _ = section.add_point(p, fiber_dim);
        }
        section
    }

    /// Adds a point with zeroed values.
    ///
    /// Adding a point twice is allowed only with the same fiber dimension.
    pub fn add_point(&mut self, point: Point, fiber_dim: usize) -> Result<(), FaultError> {
        if let Some(fiber) = self.atlas.get(&point) {
            if fiber.dim != fiber_dim {
                return Err(dimension_mismatch(point, fiber.dim, fiber_dim));
            }
            return Ok(());
        }
        let offset = self.values.len();
        self.values.resize(offset + fiber_dim, T::zero());
        self.atlas.insert(point, Fiber { offset, dim: fiber_dim });
        Ok(())
    }

    pub fn has_point(&self, point: Point) -> bool {
        self.atlas.contains_key(&point)
    }

    /// Points of the section in ascending order.
    pub fn points(&self) -> impl '_ + Iterator<Item = Point> {
        self.atlas.keys().copied()
    }

    pub fn num_points(&self) -> usize {
        self.atlas.len()
    }

    /// The fiber dimension of the point, zero for points outside the section.
    pub fn fiber_dimension(&self, point: Point) -> usize {
        self.atlas.get(&point).map(|fiber| fiber.dim).unwrap_or(0)
    }

    pub fn storage_size(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.values
    }

    pub fn restrict_point(&self, point: Point) -> Result<&[T], FaultError> {
        let fiber = self.atlas.get(&point).ok_or_else(|| missing_point(point))?;
        Ok(&self.values[fiber.offset..fiber.offset + fiber.dim])
    }

    pub fn restrict_point_mut(&mut self, point: Point) -> Result<&mut [T], FaultError> {
        let fiber = *self.atlas.get(&point).ok_or_else(|| missing_point(point))?;
        Ok(&mut self.values[fiber.offset..fiber.offset + fiber.dim])
    }

    pub fn update_point(&mut self, point: Point, values: &[T]) -> Result<(), FaultError> {
        let fiber = self.restrict_point_mut(point)?;
        if fiber.len() != values.len() {
            return Err(dimension_mismatch(point, fiber.len(), values.len()));
        }
        fiber.copy_from_slice(values);
        Ok(())
    }

    pub fn update_add_point(&mut self, point: Point, values: &[T]) -> Result<(), FaultError> {
        let fiber = self.restrict_point_mut(point)?;
        if fiber.len() != values.len() {
            return Err(dimension_mismatch(point, fiber.len(), values.len()));
        }
        for (v, x) in fiber.iter_mut().zip(values) {
            *v += *x;
        }
        Ok(())
    }

    /// Concatenated values of all points in the closure of `point` that belong to the section.
    pub fn restrict_closure(&self, sieve: &Sieve, point: Point) -> Vec<T> {
        let mut result = Vec::new();
        for p in sieve.closure(point) {
            if let Ok(values) = self.restrict_point(p) {
                result.extend_from_slice(values);
            }
        }
        result
    }

    /// Adds consecutive chunks of `values` to the points in the closure of `point`.
    ///
    /// The layout of `values` is the layout returned by [`Section::restrict_closure`].
    pub fn update_add_closure(&mut self, sieve: &Sieve, point: Point, values: &[T]) -> Result<(), FaultError> {
        let closure: Vec<_> = sieve
            .closure(point)
            .into_iter()
            .filter(|p| self.has_point(*p))
            .collect();
        let expected: usize = closure.iter().map(|p| self.fiber_dimension(*p)).sum();
        if expected != values.len() {
            return Err(dimension_mismatch(point, expected, values.len()));
        }
        let mut offset = 0;
        for p in closure {
            let dim = self.fiber_dimension(p);
            self.update_add_point(p, &values[offset..offset + dim])?;
            offset += dim;
        }
        Ok(())
    }

    pub fn zero(&mut self) {
        self.values.fill(T::zero());
    }

    /// A zeroed section with the same layout.
    pub fn clone_layout(&self) -> Self {
        Self {
            atlas: self.atlas.clone(),
            values: vec![T::zero(); self.values.len()],
        }
    }

    pub fn same_layout(&self, other: &Self) -> bool {
        self.atlas == other.atlas
    }

    pub fn copy_from(&mut self, other: &Self) -> Result<(), FaultError> {
        if !self.same_layout(other) {
            return Err(FaultError::invariant("cannot copy between sections with different layouts"));
        }
        self.values.copy_from_slice(&other.values);
        Ok(())
    }

    /// Adds the values of `other` to this section.
    pub fn add_assign(&mut self, other: &Self) -> Result<(), FaultError> {
        if !self.same_layout(other) {
            return Err(FaultError::invariant("cannot add sections with different layouts"));
        }
        for (v, x) in self.values.iter_mut().zip(&other.values) {
            *v += *x;
        }
        Ok(())
    }

    pub fn scale_values(&mut self, scale: T) {
        for v in &mut self.values {
            *v *= scale;
        }
    }
}

/// How the values of a field should be interpreted.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VectorFieldType {
    Scalar,
    Vector,
    Tensor,
    Other,
}

/// A labeled [`Section`] with a physical scale.
#[derive(Debug, Clone, PartialEq)]
pub struct Field<T> {
    label: String,
    scale: T,
    vector_field_type: VectorFieldType,
    section: Section<T>,
}

impl<T: Real> Field<T> {
    pub fn new(label: impl Into<String>, section: Section<T>) -> Self {
        Self {
            label: label.into(),
            scale: T::one(),
            vector_field_type: VectorFieldType::Other,
            section,
        }
    }

    pub fn with_scale(mut self, scale: T) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_vector_field_type(mut self, vector_field_type: VectorFieldType) -> Self {
        self.vector_field_type = vector_field_type;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub fn scale(&self) -> T {
        self.scale
    }

    pub fn set_scale(&mut self, scale: T) {
        self.scale = scale;
    }

    pub fn vector_field_type(&self) -> VectorFieldType {
        self.vector_field_type
    }

    pub fn set_vector_field_type(&mut self, vector_field_type: VectorFieldType) {
        self.vector_field_type = vector_field_type;
    }

    pub fn section(&self) -> &Section<T> {
        &self.section
    }

    pub fn section_mut(&mut self) -> &mut Section<T> {
        &mut self.section
    }

    pub fn into_section(self) -> Section<T> {
        self.section
    }

    /// Extracts the `index`-th block of `width` consecutive values at every point.
    pub fn fibration(&self, index: usize, width: usize) -> Result<Section<T>, FaultError> {
        let mut result = Section::new();
        for p in self.section.points() {
            let values = self.section.restrict_point(p)?;
            let begin = index * width;
            let block = values.get(begin..begin + width).ok_or_else(|| {
                FaultError::invariant(format!(
                    "field '{}' has no fibration {} of width {} at point {}",
                    self.label, index, width, p
                ))
            })?;
            result.add_point(p, width)?;
            result.update_point(p, block)?;
        }
        Ok(result)
    }

    /// A copy of the values in physical units.
    pub fn dimensionalized(&self) -> Section<T> {
        let mut section = self.section.clone();
        section.scale_values(self.scale);
        section
    }
}

/// A registry of named fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Fields<T> {
    fields: BTreeMap<String, Field<T>>,
}

impl<T> Default for Fields<T> {
    fn default() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }
}

impl<T: Real> Fields<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field, replacing any field with the same name.
    pub fn add(&mut self, name: impl Into<String>, field: Field<T>) {
        self.fields.insert(name.into(), field);
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Result<&Field<T>, FaultError> {
        self.fields
            .get(name)
            .ok_or_else(|| FaultError::invariant(format!("missing field '{}'", name)))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Field<T>, FaultError> {
        self.fields
            .get_mut(name)
            .ok_or_else(|| FaultError::invariant(format!("missing field '{}'", name)))
    }

    pub fn remove(&mut self, name: &str) -> Option<Field<T>> {
        self.fields.remove(name)
    }

    pub fn names(&self) -> impl '_ + Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

//! Spatial databases map physical locations to named parameter values.
use crate::Real;
use eyre::eyre;
use std::collections::BTreeMap;

/// A source of spatially varying parameters.
///
/// Any closure `Fn(&[T], &[&str]) -> eyre::Result<Vec<T>>` is a spatial database.
pub trait SpatialDatabase<T: Real>: Sync {
    /// Returns one value per requested name at the given location, in the order of `names`.
    fn query(&self, location: &[T], names: &[&str]) -> eyre::Result<Vec<T>>;
}

impl<T, F> SpatialDatabase<T> for F
where
    T: Real,
    F: Fn(&[T], &[&str]) -> eyre::Result<Vec<T>> + Sync,
{
    fn query(&self, location: &[T], names: &[&str]) -> eyre::Result<Vec<T>> {
        self(location, names)
    }
}

/// A database that returns the same values everywhere.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformDatabase<T> {
    label: String,
    values: BTreeMap<String, T>,
}

impl<T: Real> UniformDatabase<T> {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, name: impl Into<String>, value: T) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl<T: Real> SpatialDatabase<T> for UniformDatabase<T> {
    fn query(&self, _location: &[T], names: &[&str]) -> eyre::Result<Vec<T>> {
        names
            .iter()
            .map(|name| {
                self.values
                    .get(*name)
                    .copied()
                    .ok_or_else(|| eyre!("spatial database '{}' has no value named '{}'", self.label, name))
            })
            .collect()
    }
}

//! Resolved constructor arguments.

use std::any::{Any, type_name};
use std::sync::Arc;

use crate::error::{ConstructionError, ConstructionFailure, ContainerError, NotFoundError, Result};
use crate::instance::Instance;
use crate::key::Identifier;

/// The resolved values for a constructor or callable, in declaration order.
///
/// Constructors read their arguments by parameter name:
///
/// ```
/// use joinery_container::arguments::Arguments;
/// use joinery_container::instance::Instance;
///
/// let args = Arguments::new("Server")
///     .with("port", Instance::new(8080u16));
///
/// let port: u16 = args.cloned("port").unwrap();
/// assert_eq!(port, 8080);
/// assert!(args.get::<String>("port").is_err());
/// assert!(args.get::<u16>("host").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct Arguments {
    owner: Identifier,
    values: Vec<(String, Instance)>,
}

impl Arguments {
    /// Creates an empty argument list for the constructor of `owner`.
    pub fn new(owner: impl Into<Identifier>) -> Self {
        Self {
            owner: owner.into(),
            values: Vec::new(),
        }
    }

    pub(crate) fn with_capacity(owner: Identifier, capacity: usize) -> Self {
        Self {
            owner,
            values: Vec::with_capacity(capacity),
        }
    }

    /// Appends the value for parameter `name`.
    pub fn with(mut self, name: impl Into<String>, value: Instance) -> Self {
        self.push(name, value);
        self
    }

    pub(crate) fn push(&mut self, name: impl Into<String>, value: Instance) {
        self.values.push((name.into(), value));
    }

    /// The type or callable these arguments belong to.
    pub fn owner(&self) -> &Identifier {
        &self.owner
    }

    /// Returns the untyped value of parameter `name`.
    ///
    /// # Errors
    /// [`ContainerError::NotFound`] if no parameter has that name.
    pub fn instance(&self, name: &str) -> Result<&Instance> {
        self.values
            .iter()
            .find(|(param, _)| param == name)
            .map(|(_, value)| value)
            .ok_or_else(|| {
                ContainerError::NotFound(NotFoundError::Argument {
                    owner: self.owner.to_string(),
                    parameter: name.to_string(),
                })
            })
    }

    /// Returns a shared handle to parameter `name` as a `T`.
    ///
    /// # Errors
    /// - [`ContainerError::NotFound`] if no parameter has that name
    /// - [`ContainerError::Construction`] if the value is not a `T`
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
        let value = self.instance(name)?;
        value.downcast::<T>().ok_or_else(|| {
            ContainerError::Construction(ConstructionError {
                type_name: self.owner.to_string(),
                required_by: None,
                failure: ConstructionFailure::TypeMismatch {
                    parameter: name.to_string(),
                    expected: type_name::<T>(),
                    found: value.type_name(),
                },
            })
        })
    }

    /// Like [`get`](Self::get), but clones the value out of its handle.
    ///
    /// Handy for primitives and for trait objects stored as `Arc<dyn Trait>`.
    pub fn cloned<T: Any + Send + Sync + Clone>(&self, name: &str) -> Result<T> {
        self.get::<T>(name).map(|value| T::clone(&value))
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if there are no arguments.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates `(parameter, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Instance)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }
}

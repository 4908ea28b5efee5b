//! Binding registry: owns every key of a container.
//!
//! The registry maps an [`Identifier`] to a [`Binding`]: the payload the key
//! is bound to, its [`Lifetime`], and the cell a singleton caches its value
//! in. It enforces the unique-key invariant; producing values is the
//! [`Resolver`](crate::resolver::Resolver)'s job.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use joinery_support::rendering::suggest_similar;
use once_cell::sync::OnceCell;
use tracing::{debug, trace};

use crate::error::{ContainerError, DuplicateKeyError, NotFoundError, Result};
use crate::instance::Instance;
use crate::key::Identifier;
use crate::lifetime::Lifetime;
use crate::signature::Callable;

const MAX_SUGGESTIONS: usize = 3;

/// What a key is bound to. The tag is chosen at bind time.
#[derive(Debug, Clone)]
pub enum Payload {
    /// A ready value, returned as-is by every lookup.
    Value(Instance),
    /// A type built through the introspector on lookup.
    Type(Identifier),
    /// A callable invoked, with resolved parameters, on lookup.
    Factory(Callable),
}

impl Payload {
    /// A materialized value.
    ///
    /// A string bound this way stays a string, even when its text
    /// happens to name a registered type.
    pub fn value<T: Any + Send + Sync>(value: T) -> Self {
        Payload::Value(Instance::new(value))
    }

    /// A type pending construction.
    pub fn of_type(type_name: impl Into<Identifier>) -> Self {
        Payload::Type(type_name.into())
    }

    /// A callable pending invocation.
    pub fn factory(callable: Callable) -> Self {
        Payload::Factory(callable)
    }

    /// Returns `true` if the payload needs no resolution.
    pub fn is_value(&self) -> bool {
        matches!(self, Payload::Value(_))
    }
}

impl From<Instance> for Payload {
    fn from(instance: Instance) -> Self {
        Payload::Value(instance)
    }
}

impl From<Callable> for Payload {
    fn from(callable: Callable) -> Self {
        Payload::Factory(callable)
    }
}

/// One registry slot.
pub struct Binding {
    key: Identifier,
    payload: Payload,
    lifetime: Lifetime,
    cache: OnceCell<Instance>,
}

impl Binding {
    fn new(key: Identifier, payload: Payload, lifetime: Lifetime) -> Self {
        Self {
            key,
            payload,
            lifetime,
            cache: OnceCell::new(),
        }
    }

    pub fn key(&self) -> &Identifier {
        &self.key
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// Returns `true` once lookups no longer produce anything: the payload
    /// is a value, or a singleton has cached its first result.
    pub fn is_materialized(&self) -> bool {
        self.payload.is_value() || self.cache.get().is_some()
    }

    /// The value every lookup returns, if the binding is materialized.
    pub fn materialized(&self) -> Option<Instance> {
        match &self.payload {
            Payload::Value(value) => Some(value.clone()),
            _ => self.cache.get().cloned(),
        }
    }

    pub(crate) fn cache(&self) -> &OnceCell<Instance> {
        &self.cache
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("key", &self.key)
            .field("payload", &self.payload)
            .field("lifetime", &self.lifetime)
            .field("materialized", &self.is_materialized())
            .finish()
    }
}

/// Stores the bindings of one container.
///
/// Every operation takes `&self` and is safe to call from several threads;
/// no map lock is held while a binding's value is produced, so resolution
/// can look up other keys of the same registry.
#[derive(Default)]
pub struct Registry {
    bindings: DashMap<Identifier, Arc<Binding>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `key` to `payload`.
    ///
    /// # Errors
    /// Returns [`ContainerError::DuplicateKey`] if the key is already
    /// bound; the existing binding is left untouched.
    pub fn bind(
        &self,
        key: impl Into<Identifier>,
        payload: Payload,
        lifetime: Lifetime,
    ) -> Result<()> {
        let key = key.into();

        match self.bindings.entry(key.clone()) {
            Entry::Occupied(_) => Err(ContainerError::DuplicateKey(DuplicateKeyError { key })),
            Entry::Vacant(slot) => {
                debug!(key = %key, lifetime = %lifetime, value = payload.is_value(), "Bound entry");
                slot.insert(Arc::new(Binding::new(key, payload, lifetime)));
                Ok(())
            }
        }
    }

    /// Binds `key` to `payload` as a singleton.
    pub fn singleton(&self, key: impl Into<Identifier>, payload: Payload) -> Result<()> {
        self.bind(key, payload, Lifetime::Singleton)
    }

    /// Replaces the binding of `key` in one step, dropping any cached value.
    ///
    /// # Errors
    /// Returns [`ContainerError::NotFound`] if the key is not bound.
    pub fn rebind(
        &self,
        key: impl Into<Identifier>,
        payload: Payload,
        lifetime: Lifetime,
    ) -> Result<()> {
        let key = key.into();

        let Some(mut slot) = self.bindings.get_mut(key.as_str()) else {
            return Err(self.missing(key.as_str()));
        };
        debug!(key = %key, lifetime = %lifetime, "Rebound entry");
        *slot = Arc::new(Binding::new(key, payload, lifetime));
        Ok(())
    }

    /// Removes the binding of `key`.
    ///
    /// # Errors
    /// Returns [`ContainerError::NotFound`] if the key is not bound.
    pub fn unbind(&self, key: &str) -> Result<()> {
        match self.bindings.remove(key) {
            Some((key, _)) => {
                debug!(key = %key, "Unbound entry");
                Ok(())
            }
            None => Err(self.missing(key)),
        }
    }

    /// Returns `true` if `key` is bound.
    ///
    /// A bound key can still fail to resolve.
    pub fn has(&self, key: &str) -> bool {
        self.bindings.contains_key(key)
    }

    /// Returns the binding of `key`.
    pub fn lookup(&self, key: &str) -> Option<Arc<Binding>> {
        let binding = self.bindings.get(key).map(|slot| Arc::clone(slot.value()));
        trace!(key, found = binding.is_some(), "Registry lookup");
        binding
    }

    /// Returns whether the binding of `key` is materialized.
    ///
    /// # Errors
    /// Returns [`ContainerError::NotFound`] if the key is not bound.
    pub fn is_materialized(&self, key: &str) -> Result<bool> {
        self.lookup(key)
            .map(|binding| binding.is_materialized())
            .ok_or_else(|| self.missing(key))
    }

    /// Removes every binding.
    pub fn clear(&self) {
        debug!(removed = self.bindings.len(), "Cleared registry");
        self.bindings.clear();
    }

    /// Returns the number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns true if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Sorted list of bound keys.
    pub fn keys(&self) -> Vec<Identifier> {
        let mut keys: Vec<_> = self.bindings.iter().map(|slot| slot.key().clone()).collect();
        keys.sort();
        keys
    }

    /// Bound keys with names similar to `key` (for "did you mean?" hints).
    pub fn similar_keys(&self, key: &str) -> Vec<Identifier> {
        let keys = self.keys();
        suggest_similar(key, &keys, MAX_SUGGESTIONS)
            .into_iter()
            .map(Identifier::from)
            .collect()
    }

    /// Builds the error for a key that is not bound.
    pub(crate) fn missing(&self, key: &str) -> ContainerError {
        ContainerError::NotFound(NotFoundError::Entry {
            key: Identifier::new(key),
            suggestions: self.similar_keys(key),
        })
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("keys", &self.keys())
            .finish()
    }
}

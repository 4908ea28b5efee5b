//! Binding lifetimes.
//!
//! A lifetime determines how long a resolved binding value lives:
//! - [`Lifetime::Singleton`]: built once, cached by the binding
//! - [`Lifetime::Transient`]: built again on every lookup
use std::fmt;

/// Defines whether a binding caches the value it produces.
///
/// Materialized values (see [`Payload::Value`](crate::registry::Payload::Value))
/// are returned as-is whatever their lifetime.
///
/// # Examples
/// ```
/// use joinery_container::lifetime::Lifetime;
///
/// assert_eq!(Lifetime::from(true), Lifetime::Singleton);
/// assert_eq!(Lifetime::default(), Lifetime::Transient);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifetime {
    /// One instance shared by every lookup of the binding.
    ///
    /// Created on first lookup, lives until the binding is removed or
    /// the registry is dropped.
    ///
    /// # When to use
    /// - Connection pools
    /// - Loggers and configuration objects
    /// - Shared caches
    Singleton,

    /// New instance created on every lookup.
    ///
    /// # When to use
    /// - Lightweight stateless services
    /// - Objects with mutable state that shouldn't be shared
    #[default]
    Transient,
}

impl Lifetime {
    /// Returns `true` if values of this lifetime are cached.
    #[inline]
    pub fn is_singleton(&self) -> bool {
        matches!(self, Lifetime::Singleton)
    }
}

impl From<bool> for Lifetime {
    /// Maps a `singleton` flag to a lifetime.
    fn from(singleton: bool) -> Self {
        if singleton {
            Lifetime::Singleton
        } else {
            Lifetime::Transient
        }
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifetime::Singleton => write!(f, "Singleton"),
            Lifetime::Transient => write!(f, "Transient"),
        }
    }
}

//! # The Container: heart of Joinery
//!
//! Pairs one [`Registry`] with one [`TypeIntrospector`] and exposes the
//! registry operations together with resolution.
//!
//! # Architecture
//! ```text
//! ContainerBuilder  ──build()──>  Container ──get()/construct()/invoke()──> Resolver
//!   (seed data)                   │                                          │
//!                                 ├── Registry (bindings, singleton cells) <─┤
//!                                 └── TypeIntrospector (signatures) <────────┘
//! ```
//!
//! # Examples
//! ```rust
//! use joinery_container::prelude::*;
//! use std::sync::Arc;
//!
//! trait Logger: Send + Sync {
//!     fn log(&self, msg: &str) -> String;
//! }
//!
//! struct ConsoleLogger;
//! impl Logger for ConsoleLogger {
//!     fn log(&self, msg: &str) -> String { format!("[console] {msg}") }
//! }
//!
//! struct UserService {
//!     logger: Arc<dyn Logger>,
//! }
//!
//! let catalog = TypeCatalog::new()
//!     .with(TypeDescriptor::builder("ConsoleLogger")
//!         .build(|_| Ok(Arc::new(ConsoleLogger) as Arc<dyn Logger>)))
//!     .with(TypeDescriptor::builder("UserService")
//!         .param("logger", "Logger")
//!         .build(|args| Ok(UserService { logger: args.cloned("logger")? })));
//!
//! let container = Container::builder()
//!     .introspector(catalog)
//!     .singleton("Logger", "ConsoleLogger")
//!     .transient("UserService", "UserService")
//!     .build()
//!     .expect("Failed to build container");
//!
//! let service = container.resolve::<UserService>("UserService").expect("Failed to resolve");
//! assert_eq!(service.logger.log("hi"), "[console] hi");
//! ```

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

use tracing::{info, instrument, trace};

use crate::error::{ContainerError, Result, TypeMismatchError};
use crate::instance::Instance;
use crate::introspect::{TypeCatalog, TypeIntrospector};
use crate::key::Identifier;
use crate::lifetime::Lifetime;
use crate::registry::{Payload, Registry};
use crate::resolver::{Overrides, Resolver};
use crate::seed::Seed;
use crate::signature::Callable;

/// Commonly used items.
pub mod prelude {
    pub use crate::arguments::Arguments;
    pub use crate::container::{Container, ContainerBuilder};
    pub use crate::error::{ContainerError, Result};
    pub use crate::instance::Instance;
    pub use crate::introspect::{StaticType, TypeCatalog, TypeIntrospector};
    pub use crate::key::Identifier;
    pub use crate::lifetime::Lifetime;
    pub use crate::registry::Payload;
    pub use crate::resolver::Overrides;
    pub use crate::seed::Seed;
    pub use crate::signature::{Callable, Parameter, TypeDescriptor};
}

// ============================================================
// ContainerBuilder
// ============================================================

/// Builds a [`Container`] from seed data.
///
/// Entries are bound in the order they were added when
/// [`build()`](ContainerBuilder::build) runs; the first duplicate key aborts
/// the build.
///
/// # Examples
/// ```rust,ignore
/// let container = Container::builder()
///     .introspector(catalog)
///     .value("db.url", String::from("postgres://localhost"))
///     .singleton("Database", "PgDatabase")
///     .transient("UserService", "UserService")
///     .build()?;
/// ```
#[must_use]
pub struct ContainerBuilder {
    introspector: Option<Arc<dyn TypeIntrospector>>,
    seed: Seed,
}

impl ContainerBuilder {
    fn new() -> Self {
        Self {
            introspector: None,
            seed: Seed::new(),
        }
    }

    /// Sets the signature source. Defaults to [`TypeCatalog::discover`].
    pub fn introspector(self, introspector: impl TypeIntrospector + 'static) -> Self {
        self.shared_introspector(Arc::new(introspector))
    }

    /// Sets a signature source shared with other containers.
    pub fn shared_introspector(mut self, introspector: Arc<dyn TypeIntrospector>) -> Self {
        self.introspector = Some(introspector);
        self
    }

    // ── Values ──

    /// Binds a materialized value, returned as-is on every lookup.
    pub fn value<T: Any + Send + Sync>(mut self, key: impl Into<Identifier>, value: T) -> Self {
        self.seed = self.seed.value(key, value);
        self
    }

    // ── Types ──

    /// Binds a type constructed on every lookup.
    pub fn transient(mut self, key: impl Into<Identifier>, type_name: impl Into<Identifier>) -> Self {
        self.seed = self.seed.transient(key, type_name);
        self
    }

    /// Binds a type constructed once, on first lookup.
    pub fn singleton(mut self, key: impl Into<Identifier>, type_name: impl Into<Identifier>) -> Self {
        self.seed = self.seed.singleton(key, type_name);
        self
    }

    // ── Factories ──

    /// Binds a callable invoked on lookup (once, for singletons).
    pub fn factory(mut self, key: impl Into<Identifier>, callable: Callable, lifetime: Lifetime) -> Self {
        self.seed = self.seed.factory(key, callable, lifetime);
        self
    }

    /// Binds any payload.
    pub fn bind(mut self, key: impl Into<Identifier>, payload: Payload, lifetime: Lifetime) -> Self {
        self.seed = self.seed.push(key, payload, lifetime);
        self
    }

    // ── Seed data ──

    /// Appends seed entries, e.g. deserialized from a config file.
    pub fn seed(mut self, seed: Seed) -> Self {
        self.seed = self.seed.extend(seed);
        self
    }

    // ── Build ──

    /// Builds the container, binding every seed entry in order.
    ///
    /// # Errors
    /// [`ContainerError::DuplicateKey`] for the first key seeded twice.
    #[instrument(skip(self), name = "container_build")]
    pub fn build(self) -> Result<Container> {
        info!(entries = self.seed.len(), "Building container");

        let introspector = match self.introspector {
            Some(introspector) => introspector,
            None => Arc::new(TypeCatalog::discover()),
        };
        let container = Container::with_introspector(introspector);
        self.seed.apply(container.registry())?;

        info!(bound = container.len(), "Container built successfully ✓");
        Ok(container)
    }
}

impl fmt::Debug for ContainerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerBuilder")
            .field("introspector", &self.introspector.is_some())
            .field("seed", &self.seed.len())
            .finish()
    }
}

// ═══════════════════════════════════════════
// Container
// ═══════════════════════════════════════════

/// Thread-safe dependency injection container.
///
/// Bindings can be added and removed at any time; lookups never hold a map
/// lock while constructing, so constructors may resolve through the same
/// container.
pub struct Container {
    registry: Registry,
    introspector: Arc<dyn TypeIntrospector>,
}

impl Container {
    /// Create a new builder.
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    /// Creates an empty container over `introspector`.
    pub fn new(introspector: impl TypeIntrospector + 'static) -> Self {
        Self::with_introspector(Arc::new(introspector))
    }

    /// Creates an empty container over a shared introspector.
    pub fn with_introspector(introspector: Arc<dyn TypeIntrospector>) -> Self {
        Self {
            registry: Registry::new(),
            introspector,
        }
    }

    // ── Registry operations ──

    /// See [`Registry::bind`].
    pub fn bind(&self, key: impl Into<Identifier>, payload: Payload, lifetime: Lifetime) -> Result<()> {
        self.registry.bind(key, payload, lifetime)
    }

    /// See [`Registry::singleton`].
    pub fn singleton(&self, key: impl Into<Identifier>, payload: Payload) -> Result<()> {
        self.registry.singleton(key, payload)
    }

    /// See [`Registry::rebind`].
    pub fn rebind(&self, key: impl Into<Identifier>, payload: Payload, lifetime: Lifetime) -> Result<()> {
        self.registry.rebind(key, payload, lifetime)
    }

    /// See [`Registry::unbind`].
    pub fn unbind(&self, key: &str) -> Result<()> {
        self.registry.unbind(key)
    }

    /// Returns `true` if `key` is bound. A bound key may still fail to
    /// resolve.
    pub fn has(&self, key: &str) -> bool {
        self.registry.has(key)
    }

    /// Binds every seed entry in order, stopping at the first duplicate.
    pub fn seed(&self, seed: Seed) -> Result<()> {
        seed.apply(&self.registry)
    }

    /// See [`Registry::clear`].
    pub fn clear(&self) {
        self.registry.clear();
    }

    /// See [`Registry::is_materialized`].
    pub fn is_materialized(&self, key: &str) -> Result<bool> {
        self.registry.is_materialized(key)
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Sorted bound keys.
    pub fn keys(&self) -> Vec<Identifier> {
        self.registry.keys()
    }

    // ── Resolution ──

    /// Returns the value bound to `key`.
    ///
    /// ```rust,ignore
    /// let logger = container.get("LoggerIface")?;
    /// ```
    pub fn get(&self, key: &str) -> Result<Instance> {
        trace!(key, "Resolving");
        self.resolver().get(key)
    }

    /// Returns the value bound to `key` as a `T`.
    ///
    /// # Errors
    /// As [`get`](Self::get), plus [`ContainerError::TypeMismatch`] if the
    /// value is not a `T`.
    pub fn resolve<T: Any + Send + Sync>(&self, key: &str) -> Result<Arc<T>> {
        let instance = self.get(key)?;
        instance.downcast::<T>().ok_or_else(|| {
            ContainerError::TypeMismatch(TypeMismatchError {
                key: Identifier::new(key),
                expected: type_name::<T>(),
                found: instance.type_name(),
            })
        })
    }

    /// Builds `type_name` directly, without binding it.
    pub fn construct(&self, type_name: &str, overrides: &Overrides) -> Result<Instance> {
        trace!(type_name, overrides = overrides.len(), "Constructing directly");
        self.resolver().construct(type_name, overrides)
    }

    /// Resolves the parameters of `callable` and calls it.
    pub fn invoke(&self, callable: &Callable, overrides: &Overrides) -> Result<Instance> {
        self.resolver().invoke(callable, overrides)
    }

    /// A fresh resolver over this container's registry and introspector.
    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(self.introspector.as_ref()).with_registry(&self.registry)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn introspector(&self) -> &Arc<dyn TypeIntrospector> {
        &self.introspector
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("registered", &self.registry.len())
            .finish()
    }
}

//! Type introspection.
//!
//! Rust has no runtime reflection, so the resolver learns constructor
//! signatures from an explicit table. [`TypeCatalog`] is that table; it is
//! filled at startup with [`TypeCatalog::register`], or collected from
//! [`StaticType`] items submitted with [`inventory::submit!`] anywhere in
//! the program via [`TypeCatalog::discover`].
//!
//! ```
//! use joinery_container::introspect::{TypeCatalog, TypeIntrospector};
//! use joinery_container::signature::TypeDescriptor;
//!
//! struct Clock;
//!
//! let catalog = TypeCatalog::new();
//! catalog.register(TypeDescriptor::builder("Clock").build(|_| Ok(Clock)));
//!
//! assert!(catalog.is_constructible("Clock"));
//! assert!(!catalog.is_constructible("Calendar"));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::arguments::Arguments;
use crate::error::Result;
use crate::instance::Instance;
use crate::key::Identifier;
use crate::signature::{Parameter, TypeDescriptor};

/// Answers what the resolver needs to know about a type name.
///
/// Implement this to plug in another signature source (generated code, a
/// plugin table, ...). [`TypeCatalog`] is the stock implementation.
pub trait TypeIntrospector: Send + Sync {
    /// Returns the signature of `type_name`, or `None` if it is not
    /// constructible.
    fn describe(&self, type_name: &str) -> Option<Arc<TypeDescriptor>>;

    /// Returns `true` if `type_name` can be constructed.
    fn is_constructible(&self, type_name: &str) -> bool {
        self.describe(type_name).is_some()
    }
}

/// A constructible type registered at link time.
///
/// Parameters are `(name, identifier)` pairs; `None` declares a parameter
/// without a type identifier.
///
/// ```
/// use joinery_container::arguments::Arguments;
/// use joinery_container::error::Result;
/// use joinery_container::instance::Instance;
/// use joinery_container::introspect::StaticType;
///
/// struct Clock;
///
/// fn build_clock(_: &Arguments) -> Result<Instance> {
///     Ok(Instance::new(Clock))
/// }
///
/// inventory::submit! {
///     StaticType::new("Clock", &[], build_clock)
/// }
/// # fn main() {}
/// ```
pub struct StaticType {
    name: &'static str,
    parameters: &'static [(&'static str, Option<&'static str>)],
    construct: fn(&Arguments) -> Result<Instance>,
}

impl StaticType {
    pub const fn new(
        name: &'static str,
        parameters: &'static [(&'static str, Option<&'static str>)],
        construct: fn(&Arguments) -> Result<Instance>,
    ) -> Self {
        Self {
            name,
            parameters,
            construct,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Converts the static entry into a descriptor.
    pub fn descriptor(&self) -> TypeDescriptor {
        let construct = self.construct;
        self.parameters
            .iter()
            .fold(TypeDescriptor::builder(self.name), |builder, (name, identifier)| {
                match identifier {
                    Some(identifier) => builder.param(*name, *identifier),
                    None => builder.untyped(*name),
                }
            })
            .build_instance(move |args| construct(args))
    }
}

inventory::collect!(StaticType);

/// Thread-safe table of constructible types, keyed by type name.
#[derive(Default)]
pub struct TypeCatalog {
    types: RwLock<HashMap<Identifier, Arc<TypeDescriptor>>>,
}

impl TypeCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog holding every [`StaticType`] linked into the
    /// program.
    pub fn discover() -> Self {
        let catalog = Self::new();
        for entry in inventory::iter::<StaticType> {
            catalog.register(entry.descriptor());
        }
        debug!(types = catalog.len(), "Discovered link-time types");
        catalog
    }

    /// Registers a descriptor, returning the one it replaced.
    pub fn register(&self, descriptor: TypeDescriptor) -> Option<Arc<TypeDescriptor>> {
        let name = descriptor.name().clone();
        debug!(type_name = %name, parameters = descriptor.parameters().len(), "Registered type");
        let previous = self.types.write().insert(name, Arc::new(descriptor));
        if let Some(ref previous) = previous {
            debug!(type_name = %previous.name(), "Replaced previous descriptor");
        }
        previous
    }

    /// Builder-style [`register`](Self::register).
    #[must_use]
    pub fn with(self, descriptor: TypeDescriptor) -> Self {
        self.register(descriptor);
        self
    }

    /// Removes a type, returning its descriptor.
    pub fn unregister(&self, type_name: &str) -> Option<Arc<TypeDescriptor>> {
        self.types.write().remove(type_name)
    }

    /// Returns the parameters of `type_name`, if it is known.
    pub fn parameters(&self, type_name: &str) -> Option<Vec<Parameter>> {
        self.describe(type_name)
            .map(|descriptor| descriptor.parameters().to_vec())
    }

    /// Sorted names of all registered types.
    pub fn names(&self) -> Vec<Identifier> {
        let mut names: Vec<_> = self.types.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.types.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.read().is_empty()
    }
}

impl TypeIntrospector for TypeCatalog {
    fn describe(&self, type_name: &str) -> Option<Arc<TypeDescriptor>> {
        let found = self.types.read().get(type_name).cloned();
        trace!(type_name, found = found.is_some(), "Introspecting");
        found
    }
}

impl fmt::Debug for TypeCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeCatalog")
            .field("types", &self.names())
            .finish()
    }
}

//! Resolution engine.
//!
//! The [`Resolver`] turns identifiers and type names into instances. For
//! each constructor parameter it tries, in order:
//!
//! 1. the per-call [`Overrides`],
//! 2. the attached [`Registry`] (materializing the binding if needed),
//! 3. constructing the parameter's type directly through the
//!    [`TypeIntrospector`].
//!
//! The first failure aborts the whole call. Re-entering a key or type that
//! is still being built fails with
//! [`ContainerError::CircularDependency`] instead of recursing forever.
//!
//! ```
//! use joinery_container::introspect::TypeCatalog;
//! use joinery_container::resolver::{Overrides, Resolver};
//! use joinery_container::signature::TypeDescriptor;
//! use std::sync::Arc;
//!
//! struct Engine;
//! struct Car { engine: Arc<Engine> }
//!
//! let catalog = TypeCatalog::new()
//!     .with(TypeDescriptor::builder("Engine").build(|_| Ok(Engine)))
//!     .with(TypeDescriptor::builder("Car")
//!         .param("engine", "Engine")
//!         .build(|args| Ok(Car { engine: args.get("engine")? })));
//!
//! // No registry needed: Engine is constructed on the fly.
//! let car = Resolver::new(&catalog).construct("Car", &Overrides::new()).unwrap();
//! assert!(car.is::<Car>());
//! ```

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, trace, warn};

use crate::arguments::Arguments;
use crate::error::{
    CircularDependencyError, ConstructionError, ConstructionFailure, ContainerError,
    NotFoundError, Result,
};
use crate::instance::Instance;
use crate::introspect::TypeIntrospector;
use crate::key::Identifier;
use crate::registry::{Binding, Payload, Registry};
use crate::signature::{Callable, Parameter};

/// Values that take precedence over the registry for one call.
///
/// ```
/// use joinery_container::instance::Instance;
/// use joinery_container::resolver::Overrides;
///
/// let overrides = Overrides::new().with("db.url", Instance::new(String::from("sqlite::memory:")));
/// assert!(overrides.contains("db.url"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    values: HashMap<Identifier, Instance>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the value used for `identifier`.
    #[must_use]
    pub fn with(mut self, identifier: impl Into<Identifier>, value: Instance) -> Self {
        self.insert(identifier, value);
        self
    }

    pub fn insert(&mut self, identifier: impl Into<Identifier>, value: Instance) -> Option<Instance> {
        self.values.insert(identifier.into(), value)
    }

    pub fn get(&self, identifier: &str) -> Option<&Instance> {
        self.values.get(identifier)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.values.contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<Identifier>> FromIterator<(K, Instance)> for Overrides {
    fn from_iter<I: IntoIterator<Item = (K, Instance)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Outcome of looking up one parameter.
enum Lookup {
    /// A value is available from the overrides or the registry.
    Bound(Instance),
    /// Nothing provides the identifier; construct it directly.
    Unbound(Identifier),
    /// The parameter has no type identifier.
    InvalidParameter,
}

/// A step of the current resolution path.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Frame {
    Entry(Identifier),
    Type(Identifier),
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Entry(key) => write!(f, "\"{key}\""),
            Frame::Type(name) => write!(f, "{name}"),
        }
    }
}

/// Resolves identifiers, constructs types and invokes callables.
///
/// A resolver borrows an introspector and, optionally, a registry. It is
/// cheap to create; [`Container`](crate::container::Container) makes one per
/// call. A resolver stays usable after an error.
pub struct Resolver<'a> {
    introspector: &'a dyn TypeIntrospector,
    registry: Option<&'a Registry>,
    path: Vec<Frame>,
}

impl<'a> Resolver<'a> {
    /// Creates a standalone resolver: parameters come from overrides or are
    /// constructed directly.
    pub fn new(introspector: &'a dyn TypeIntrospector) -> Self {
        Self {
            introspector,
            registry: None,
            path: Vec::new(),
        }
    }

    /// Attaches a registry consulted for parameters, and used by
    /// [`get`](Self::get).
    pub fn with_registry(mut self, registry: &'a Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Returns the value bound to `key`.
    ///
    /// Value payloads are returned as-is. Types and factories are produced
    /// on every call for transient bindings, and once for singletons.
    ///
    /// # Errors
    /// [`ContainerError::NotFound`] if the key is not bound (or no registry
    /// is attached); otherwise any error raised while producing the value.
    pub fn get(&mut self, key: &str) -> Result<Instance> {
        let Some(registry) = self.registry else {
            return Err(ContainerError::NotFound(NotFoundError::Entry {
                key: Identifier::new(key),
                suggestions: Vec::new(),
            }));
        };
        let binding = registry.lookup(key).ok_or_else(|| registry.missing(key))?;
        self.materialize(&binding)
    }

    /// Builds an instance of `type_name`, resolving its constructor
    /// parameters recursively.
    ///
    /// # Errors
    /// - [`ContainerError::Construction`] if the type (or a parameter type
    ///   that nothing provides) is unknown, or a constructor fails
    /// - [`ContainerError::NotFound`] if a parameter has no type identifier
    /// - [`ContainerError::CircularDependency`] on a cycle
    pub fn construct(&mut self, type_name: &str, overrides: &Overrides) -> Result<Instance> {
        self.construct_type(type_name, overrides, None)
    }

    /// Resolves the parameters of `callable` like constructor parameters,
    /// then calls it.
    pub fn invoke(&mut self, callable: &Callable, overrides: &Overrides) -> Result<Instance> {
        trace!(callable = %callable.name(), "Invoking");
        let args = self.resolve_arguments(callable.name(), callable.parameters(), overrides)?;
        callable.call(&args)
    }

    fn materialize(&mut self, binding: &Binding) -> Result<Instance> {
        if let Some(value) = binding.materialized() {
            trace!(key = %binding.key(), "Returning materialized value");
            return Ok(value);
        }

        let depth = self.enter(Frame::Entry(binding.key().clone()))?;
        let result = if binding.lifetime().is_singleton() {
            binding
                .cache()
                .get_or_try_init(|| {
                    self.produce(binding)
                        .inspect(|_| debug!(key = %binding.key(), "Materialized singleton"))
                })
                .cloned()
        } else {
            self.produce(binding)
        };
        self.path.truncate(depth);
        result
    }

    /// Produces a fresh value for a binding. Registry-driven construction
    /// starts from empty overrides.
    fn produce(&mut self, binding: &Binding) -> Result<Instance> {
        let overrides = Overrides::new();
        match binding.payload() {
            Payload::Value(value) => Ok(value.clone()),
            Payload::Type(type_name) => self.construct_type(type_name.as_str(), &overrides, None),
            Payload::Factory(callable) => self.invoke(callable, &overrides),
        }
    }

    fn construct_type(
        &mut self,
        type_name: &str,
        overrides: &Overrides,
        required_by: Option<&Identifier>,
    ) -> Result<Instance> {
        let descriptor = self.introspector.describe(type_name).ok_or_else(|| {
            ContainerError::Construction(ConstructionError {
                type_name: type_name.to_string(),
                required_by: required_by.map(ToString::to_string),
                failure: ConstructionFailure::UnknownType,
            })
        })?;

        let depth = self.enter(Frame::Type(descriptor.name().clone()))?;
        trace!(type_name, parameters = descriptor.parameters().len(), "Constructing");
        let result = self
            .resolve_arguments(descriptor.name(), descriptor.parameters(), overrides)
            .and_then(|args| descriptor.instantiate(&args));
        self.path.truncate(depth);
        result
    }

    fn resolve_arguments(
        &mut self,
        owner: &Identifier,
        parameters: &[Parameter],
        overrides: &Overrides,
    ) -> Result<Arguments> {
        let mut args = Arguments::with_capacity(owner.clone(), parameters.len());

        for parameter in parameters {
            let value = match self.lookup(parameter, overrides)? {
                Lookup::Bound(value) => value,
                Lookup::Unbound(identifier) => {
                    self.construct_type(identifier.as_str(), overrides, Some(owner))?
                }
                Lookup::InvalidParameter => {
                    return Err(ContainerError::NotFound(NotFoundError::UntypedParameter {
                        owner: owner.to_string(),
                        parameter: parameter.name().to_string(),
                    }));
                }
            };
            args.push(parameter.name(), value);
        }

        Ok(args)
    }

    fn lookup(&mut self, parameter: &Parameter, overrides: &Overrides) -> Result<Lookup> {
        let Some(identifier) = parameter.identifier() else {
            return Ok(Lookup::InvalidParameter);
        };

        if let Some(value) = overrides.get(identifier.as_str()) {
            return Ok(Lookup::Bound(value.clone()));
        }

        if let Some(binding) = self.registry.and_then(|registry| registry.lookup(identifier.as_str())) {
            return self.materialize(&binding).map(Lookup::Bound);
        }

        Ok(Lookup::Unbound(identifier.clone()))
    }

    /// Pushes a frame, failing if it is already on the path. Returns the
    /// depth to truncate back to.
    fn enter(&mut self, frame: Frame) -> Result<usize> {
        if let Some(start) = self.path.iter().position(|f| *f == frame) {
            let mut chain: Vec<String> = self.path[start..].iter().map(ToString::to_string).collect();
            chain.push(frame.to_string());

            warn!(cycle = ?chain, "Circular dependency detected!");
            return Err(ContainerError::CircularDependency(CircularDependencyError { chain }));
        }

        let depth = self.path.len();
        self.path.push(frame);
        Ok(depth)
    }
}

impl fmt::Debug for Resolver<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("registry", &self.registry.is_some())
            .field("depth", &self.path.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspect::TypeCatalog;
    use crate::lifetime::Lifetime;
    use crate::signature::TypeDescriptor;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ClassC {
        id: usize,
    }

    struct ClassB {
        obj: Arc<ClassC>,
    }

    struct ClassD;

    struct ClassE {
        obj: Arc<ClassD>,
    }

    fn catalog(counter: Arc<AtomicUsize>) -> TypeCatalog {
        TypeCatalog::new()
            .with(TypeDescriptor::builder("ClassC").build(move |_| {
                Ok(ClassC {
                    id: counter.fetch_add(1, Ordering::SeqCst) + 1,
                })
            }))
            .with(
                TypeDescriptor::builder("ClassB")
                    .param("obj", "InterfaceC")
                    .build(|args| Ok(ClassB { obj: args.get("obj")? })),
            )
            .with(TypeDescriptor::builder("ClassD").build(|_| Ok(ClassD)))
            .with(
                TypeDescriptor::builder("ClassE")
                    .param("obj", "ClassD")
                    .build(|args| Ok(ClassE { obj: args.get("obj")? })),
            )
            .with(
                TypeDescriptor::builder("ClassF")
                    .untyped("someObject")
                    .build(|_| Ok(())),
            )
    }

    #[test]
    fn construct_without_parameters() {
        let types = catalog(Arc::default());
        let out = Resolver::new(&types).construct("ClassD", &Overrides::new()).unwrap();
        assert!(out.is::<ClassD>());
    }

    #[test]
    fn construct_builds_unbound_parameters_directly() {
        let types = catalog(Arc::default());
        let mut resolver = Resolver::new(&types);

        let first = resolver.construct("ClassE", &Overrides::new()).unwrap();
        let second = resolver.construct("ClassE", &Overrides::new()).unwrap();

        assert!(first.downcast::<ClassE>().is_some());
        assert!(!first.ptr_eq(&second));
    }

    #[test]
    fn construct_unknown_type_fails() {
        let types = catalog(Arc::default());
        let err = Resolver::new(&types)
            .construct("InvalidClassName123123", &Overrides::new())
            .unwrap_err();

        match err {
            ContainerError::Construction(e) => {
                assert_eq!(e.type_name, "InvalidClassName123123");
                assert!(e.required_by.is_none());
                assert!(matches!(e.failure, ConstructionFailure::UnknownType));
            }
            other => panic!("Expected Construction, got: {other:?}"),
        }
    }

    #[test]
    fn unresolvable_parameter_names_requirer() {
        let types = catalog(Arc::default());
        let err = Resolver::new(&types).construct("ClassB", &Overrides::new()).unwrap_err();

        match err {
            ContainerError::Construction(e) => {
                assert_eq!(e.type_name, "InterfaceC");
                assert_eq!(e.required_by.as_deref(), Some("ClassB"));
            }
            other => panic!("Expected Construction, got: {other:?}"),
        }
    }

    #[test]
    fn untyped_parameter_is_not_found() {
        let types = catalog(Arc::default());
        let err = Resolver::new(&types).construct("ClassF", &Overrides::new()).unwrap_err();

        match err {
            ContainerError::NotFound(NotFoundError::UntypedParameter { owner, parameter }) => {
                assert_eq!(owner, "ClassF");
                assert_eq!(parameter, "someObject");
            }
            other => panic!("Expected NotFound, got: {other:?}"),
        }
    }

    #[test]
    fn overrides_supply_parameters() {
        let counter = Arc::new(AtomicUsize::new(0));
        let types = catalog(counter.clone());
        let c = Instance::new(ClassC { id: 99 });
        let overrides = Overrides::new().with("InterfaceC", c.clone());

        let mut resolver = Resolver::new(&types);
        let first = resolver.construct("ClassB", &overrides).unwrap().downcast::<ClassB>().unwrap();
        let second = resolver.construct("ClassB", &overrides).unwrap().downcast::<ClassB>().unwrap();

        assert_eq!(first.obj.id, 99);
        assert!(Arc::ptr_eq(&first.obj, &second.obj));
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn overrides_win_over_registry() {
        let types = catalog(Arc::default());
        let registry = Registry::new();
        registry
            .bind("InterfaceC", Payload::value(ClassC { id: 1 }), Lifetime::Transient)
            .unwrap();

        let overrides = Overrides::new().with("InterfaceC", Instance::new(ClassC { id: 2 }));
        let out = Resolver::new(&types)
            .with_registry(&registry)
            .construct("ClassB", &overrides)
            .unwrap();

        assert_eq!(out.downcast::<ClassB>().unwrap().obj.id, 2);
    }

    #[test]
    fn registry_value_is_shared_across_constructions() {
        let types = catalog(Arc::default());
        let registry = Registry::new();
        registry
            .bind("InterfaceC", Payload::value(ClassC { id: 1 }), Lifetime::Transient)
            .unwrap();

        let mut resolver = Resolver::new(&types).with_registry(&registry);
        let first = resolver.construct("ClassB", &Overrides::new()).unwrap().downcast::<ClassB>().unwrap();
        let second = resolver.construct("ClassB", &Overrides::new()).unwrap().downcast::<ClassB>().unwrap();

        assert_eq!(first.obj.id, 1);
        assert!(Arc::ptr_eq(&first.obj, &second.obj));
    }

    #[test]
    fn get_without_registry_is_not_found() {
        let types = catalog(Arc::default());
        assert!(Resolver::new(&types).get("ClassD").unwrap_err().is_not_found());
    }

    #[test]
    fn invoke_resolves_callable_parameters() {
        let types = catalog(Arc::default());
        let registry = Registry::new();
        registry
            .bind("greeting", Payload::value(String::from("hello")), Lifetime::Transient)
            .unwrap();

        let callable = Callable::builder("greet")
            .param("greeting", "greeting")
            .param("d", "ClassD")
            .build(|args| {
                let _d = args.get::<ClassD>("d")?;
                Ok(format!("{} world", args.get::<String>("greeting")?))
            });

        let out = Resolver::new(&types)
            .with_registry(&registry)
            .invoke(&callable, &Overrides::new())
            .unwrap();
        assert_eq!(out.downcast_ref::<String>().map(String::as_str), Some("hello world"));
    }

    #[test]
    fn invoke_with_untyped_parameter_fails() {
        let types = catalog(Arc::default());
        let callable = Callable::builder("broken").untyped("x").build(|_| Ok(()));
        let err = Resolver::new(&types).invoke(&callable, &Overrides::new()).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn self_cycle_is_detected_and_resolver_recovers() {
        let types = TypeCatalog::new()
            .with(TypeDescriptor::builder("Loop").param("me", "Loop").build(|_| Ok(())))
            .with(TypeDescriptor::builder("ClassD").build(|_| Ok(ClassD)));

        let mut resolver = Resolver::new(&types);
        match resolver.construct("Loop", &Overrides::new()).unwrap_err() {
            ContainerError::CircularDependency(e) => assert_eq!(e.chain, ["Loop", "Loop"]),
            other => panic!("Expected CircularDependency, got: {other:?}"),
        }

        assert!(resolver.construct("ClassD", &Overrides::new()).is_ok());
    }

    #[test]
    fn cycle_through_registry_entries() {
        let types = TypeCatalog::new()
            .with(TypeDescriptor::builder("AImpl").param("b", "B").build(|_| Ok(())))
            .with(TypeDescriptor::builder("BImpl").param("a", "A").build(|_| Ok(())));
        let registry = Registry::new();
        registry.singleton("A", Payload::of_type("AImpl")).unwrap();
        registry.bind("B", Payload::of_type("BImpl"), Lifetime::Transient).unwrap();

        let err = Resolver::new(&types).with_registry(&registry).get("A").unwrap_err();
        match err {
            ContainerError::CircularDependency(e) => {
                assert_eq!(e.chain, ["\"A\"", "AImpl", "\"B\"", "BImpl", "\"A\""]);
            }
            other => panic!("Expected CircularDependency, got: {other:?}"),
        }
        assert!(!registry.is_materialized("A").unwrap());
    }
}

//! Constructor and callable signatures.
//!
//! A [`TypeDescriptor`] is what the resolver knows about a constructible
//! type: its name, its ordered parameters, and the function that builds it
//! from resolved [`Arguments`]. A [`Callable`] has the same shape, with no
//! type behind it.
//!
//! # Examples
//! ```
//! use joinery_container::signature::TypeDescriptor;
//! use std::sync::Arc;
//!
//! struct Engine;
//! struct Car { engine: Arc<Engine> }
//!
//! let car = TypeDescriptor::builder("Car")
//!     .param("engine", "Engine")
//!     .build(|args| Ok(Car { engine: args.get("engine")? }));
//!
//! assert_eq!(car.name().as_str(), "Car");
//! assert_eq!(car.parameters()[0].identifier().map(|id| id.as_str()), Some("Engine"));
//! ```

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::arguments::Arguments;
use crate::error::Result;
use crate::instance::Instance;
use crate::key::Identifier;

/// Type-erased body of a constructor or callable.
pub type ConstructFn = Arc<dyn Fn(&Arguments) -> Result<Instance> + Send + Sync>;

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    name: String,
    identifier: Option<Identifier>,
}

impl Parameter {
    /// A parameter resolved through `identifier`.
    pub fn typed(name: impl Into<String>, identifier: impl Into<Identifier>) -> Self {
        Self {
            name: name.into(),
            identifier: Some(identifier.into()),
        }
    }

    /// A parameter with no type identifier.
    ///
    /// Resolving it always fails with
    /// [`NotFoundError::UntypedParameter`](crate::error::NotFoundError::UntypedParameter).
    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identifier: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The identifier looked up in overrides and the registry, or
    /// constructed directly.
    pub fn identifier(&self) -> Option<&Identifier> {
        self.identifier.as_ref()
    }
}

/// A function whose parameters are resolved by the container.
///
/// Use it with [`Resolver::invoke`](crate::resolver::Resolver::invoke), or
/// bind it with [`Payload::factory`](crate::registry::Payload::factory) to
/// compute a binding's value on demand.
#[derive(Clone)]
pub struct Callable {
    name: Identifier,
    parameters: Vec<Parameter>,
    function: ConstructFn,
}

impl Callable {
    /// Starts describing a callable called `name` (used in errors and logs).
    pub fn builder(name: impl Into<Identifier>) -> SignatureBuilder<Callable> {
        SignatureBuilder::new(name.into())
    }

    pub fn name(&self) -> &Identifier {
        &self.name
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Calls the function with already resolved arguments.
    pub fn call(&self, args: &Arguments) -> Result<Instance> {
        (self.function)(args)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .finish()
    }
}

/// Signature of a constructible type.
#[derive(Clone)]
pub struct TypeDescriptor {
    constructor: Callable,
}

impl TypeDescriptor {
    /// Starts describing the constructor of type `name`.
    pub fn builder(name: impl Into<Identifier>) -> SignatureBuilder<TypeDescriptor> {
        SignatureBuilder::new(name.into())
    }

    pub fn name(&self) -> &Identifier {
        &self.constructor.name
    }

    /// Constructor parameters in declaration order.
    pub fn parameters(&self) -> &[Parameter] {
        &self.constructor.parameters
    }

    /// Runs the constructor with already resolved arguments.
    pub fn instantiate(&self, args: &Arguments) -> Result<Instance> {
        self.constructor.call(args)
    }
}

impl From<Callable> for TypeDescriptor {
    fn from(constructor: Callable) -> Self {
        Self { constructor }
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", self.name())
            .field("parameters", &self.parameters())
            .finish()
    }
}

/// Builds a [`TypeDescriptor`] or a [`Callable`] parameter by parameter.
#[must_use]
pub struct SignatureBuilder<S> {
    name: Identifier,
    parameters: Vec<Parameter>,
    _target: PhantomData<fn() -> S>,
}

impl<S: From<Callable>> SignatureBuilder<S> {
    fn new(name: Identifier) -> Self {
        Self {
            name,
            parameters: Vec::new(),
            _target: PhantomData,
        }
    }

    /// Declares a parameter resolved through `identifier`.
    pub fn param(mut self, name: impl Into<String>, identifier: impl Into<Identifier>) -> Self {
        self.parameters.push(Parameter::typed(name, identifier));
        self
    }

    /// Declares a parameter with no type identifier.
    pub fn untyped(mut self, name: impl Into<String>) -> Self {
        self.parameters.push(Parameter::untyped(name));
        self
    }

    /// Declares an already built [`Parameter`].
    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Finishes the signature with a function producing a `T`.
    ///
    /// The value is wrapped in an [`Instance`]; to hand out a trait object,
    /// produce an `Arc<dyn Trait>` and read it back with
    /// [`Arguments::cloned`].
    pub fn build<T, F>(self, function: F) -> S
    where
        T: Any + Send + Sync,
        F: Fn(&Arguments) -> Result<T> + Send + Sync + 'static,
    {
        self.build_instance(move |args| function(args).map(Instance::new))
    }

    /// Finishes the signature with a function producing an [`Instance`].
    pub fn build_instance<F>(self, function: F) -> S
    where
        F: Fn(&Arguments) -> Result<Instance> + Send + Sync + 'static,
    {
        S::from(Callable {
            name: self.name,
            parameters: self.parameters,
            function: Arc::new(function),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameters_keep_declaration_order() {
        let descriptor = TypeDescriptor::builder("Server")
            .param("host", "db.host")
            .untyped("options")
            .param("port", "db.port")
            .build(|_| Ok(()));

        let names: Vec<&str> = descriptor.parameters().iter().map(Parameter::name).collect();
        assert_eq!(names, ["host", "options", "port"]);
        assert!(descriptor.parameters()[1].identifier().is_none());
    }

    #[test]
    fn instantiate_runs_constructor() {
        let descriptor = TypeDescriptor::builder("Doubler")
            .param("n", "number")
            .build(|args| Ok(args.cloned::<i32>("n")? * 2));

        let args = Arguments::new("Doubler").with("n", Instance::new(21i32));
        let out = descriptor.instantiate(&args).unwrap();
        assert_eq!(out.downcast_ref::<i32>(), Some(&42));
    }

    #[test]
    fn build_instance_keeps_handle() {
        let shared = Instance::new(String::from("shared"));
        let descriptor = TypeDescriptor::builder("Shared").build_instance({
            let shared = shared.clone();
            move |_| Ok(shared.clone())
        });

        let out = descriptor.instantiate(&Arguments::new("Shared")).unwrap();
        assert!(out.ptr_eq(&shared));
    }

    #[test]
    fn callable_calls_function() {
        let callable = Callable::builder("greet")
            .param("name", "user.name")
            .build(|args| Ok(format!("hello {}", args.get::<String>("name")?)));

        let args = Arguments::new("greet").with("name", Instance::new(String::from("ada")));
        let out = callable.call(&args).unwrap();
        assert_eq!(out.downcast_ref::<String>().map(String::as_str), Some("hello ada"));
        assert_eq!(callable.name(), &Identifier::new("greet"));
    }

    #[test]
    fn debug_lists_parameters() {
        let descriptor = TypeDescriptor::builder("Car").param("engine", "Engine").build(|_| Ok(()));
        let debug = format!("{descriptor:?}");
        assert!(debug.contains("Car"));
        assert!(debug.contains("engine"));
    }
}

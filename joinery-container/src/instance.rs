//! Type-erased shared values.

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

use joinery_support::rendering::shorten_type_name;

/// A shared handle to a resolved value of any type.
///
/// Everything the container hands out is an `Instance`: primitives bound
/// with [`Payload::value`](crate::registry::Payload::value), objects built
/// by a constructor, results of factories. Cloning clones the handle, so a
/// singleton returned twice is the same allocation.
///
/// # Examples
/// ```
/// use joinery_container::instance::Instance;
///
/// let greeting = Instance::new(String::from("hello"));
/// assert_eq!(greeting.downcast_ref::<String>().map(String::as_str), Some("hello"));
/// assert!(greeting.downcast::<i64>().is_none());
///
/// let copy = greeting.clone();
/// assert!(copy.ptr_eq(&greeting));
/// ```
#[derive(Clone)]
pub struct Instance {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Instance {
    /// Wraps an owned value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    /// Wraps an already shared value without re-allocating it.
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            value,
            type_name: type_name::<T>(),
        }
    }

    /// Returns a typed handle if the value is a `T`.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.value.clone().downcast::<T>().ok()
    }

    /// Borrows the value if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Returns `true` if the value is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Full name of the wrapped type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if both handles point at the same allocation.
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Instance({})", shorten_type_name(self.type_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Port(u16);

    #[test]
    fn downcast_matching_type() {
        let instance = Instance::new(Port(8080));
        assert_eq!(instance.downcast::<Port>().as_deref(), Some(&Port(8080)));
        assert!(instance.is::<Port>());
    }

    #[test]
    fn downcast_other_type_fails() {
        let instance = Instance::new(42i64);
        assert!(instance.downcast::<i32>().is_none());
        assert!(instance.downcast_ref::<String>().is_none());
    }

    #[test]
    fn from_arc_keeps_allocation() {
        let shared = Arc::new(Port(1));
        let instance = Instance::from_arc(shared.clone());
        let back = instance.downcast::<Port>().unwrap();
        assert!(Arc::ptr_eq(&shared, &back));
    }

    #[test]
    fn separate_instances_are_not_identical() {
        let a = Instance::new(Port(1));
        let b = Instance::new(Port(1));
        assert!(!a.ptr_eq(&b));
        assert!(a.ptr_eq(&a.clone()));
    }

    #[test]
    fn debug_shows_short_type() {
        let instance = Instance::new(Port(1));
        assert_eq!(format!("{instance:?}"), "Instance(Port)");
        assert!(instance.type_name().ends_with("Port"));
    }
}

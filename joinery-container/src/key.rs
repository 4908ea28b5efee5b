//! Binding identifiers.
//!
//! An [`Identifier`] names a binding in the registry, a constructible type
//! in the catalog, or the type a constructor parameter asks for. It is a
//! plain string, so interface names, primitive keys (`"db.url"`) and Rust
//! type names all live in the same namespace.

use std::any::type_name;
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use joinery_support::rendering::shorten_type_name;

/// Uniquely identifies a binding within one registry.
///
/// Cloning is cheap: the text is shared.
///
/// # Examples
/// ```
/// use joinery_container::key::Identifier;
///
/// let key = Identifier::new("database_url");
/// assert_eq!(key.as_str(), "database_url");
///
/// // Keys may also be derived from a Rust type
/// struct ConsoleLogger;
/// assert_eq!(Identifier::of::<ConsoleLogger>().as_str(), "ConsoleLogger");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(Arc<str>);

impl Identifier {
    /// Creates an identifier from any string.
    #[inline]
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// Creates an identifier from the shortened path of type `T`.
    ///
    /// `my_app::logging::ConsoleLogger` becomes `ConsoleLogger`, and
    /// `alloc::sync::Arc<dyn my_app::Logger>` becomes `Arc<dyn Logger>`.
    ///
    /// # Examples
    /// ```
    /// use joinery_container::key::Identifier;
    ///
    /// assert_eq!(Identifier::of::<String>().as_str(), "String");
    /// ```
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::new(shorten_type_name(type_name::<T>()))
    }

    /// Returns the identifier text.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Identifier {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Identifier {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Identifier {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl From<&String> for Identifier {
    fn from(name: &String) -> Self {
        Self::new(name)
    }
}

impl From<&Identifier> for Identifier {
    fn from(key: &Identifier) -> Self {
        key.clone()
    }
}

impl PartialEq<str> for Identifier {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for Identifier {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({:?})", &*self.0)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MyStruct;

    #[test]
    fn key_of_type() {
        let key = Identifier::of::<MyStruct>();
        assert_eq!(key, "MyStruct");
    }

    #[test]
    fn key_of_trait_object() {
        trait Logger {}
        let key = Identifier::of::<dyn Logger>();
        assert_eq!(key, "dyn Logger");
    }

    #[test]
    fn key_equality_same_text() {
        assert_eq!(Identifier::new("a"), Identifier::from(String::from("a")));
    }

    #[test]
    fn key_inequality_different_text() {
        assert_ne!(Identifier::new("a"), Identifier::new("A"));
    }

    #[test]
    fn key_in_hashmap_looked_up_by_str() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(Identifier::new("greeting"), "hello");
        map.insert(Identifier::of::<i32>(), "i32");
        assert_eq!(map.get("greeting"), Some(&"hello"));
        assert_eq!(map.get("i32"), Some(&"i32"));
        assert_eq!(map.get("bool"), None);
    }

    #[test]
    fn display_and_debug() {
        let key = Identifier::new("LoggerIface");
        assert_eq!(format!("{key}"), "LoggerIface");
        assert_eq!(format!("{key:?}"), "Identifier(\"LoggerIface\")");
    }
}

//! Error types for Joinery container operations.
//!
//! Every failure says which key, type or parameter was involved, and
//! where possible how to fix it.

use std::fmt;

use joinery_support::rendering::{render_chain, shorten_type_name};

use crate::key::Identifier;

/// Boxed error raised by user constructors and factories.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for all Joinery operations.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    /// A key was bound while another binding already used it.
    #[error("{}", .0)]
    DuplicateKey(DuplicateKeyError),

    /// An entry, a parameter type, or an argument was not found.
    #[error("{}", .0)]
    NotFound(NotFoundError),

    /// A type could not be introspected or instantiated.
    #[error(transparent)]
    Construction(ConstructionError),

    /// A bound value was requested as another type.
    #[error("{}", .0)]
    TypeMismatch(TypeMismatchError),

    /// Resolution re-entered a key or type that was still being built.
    #[error("{}", .0)]
    CircularDependency(CircularDependencyError),
}

impl ContainerError {
    /// Wraps an error raised by the constructor of `type_name`.
    ///
    /// # Examples
    /// ```
    /// use joinery_container::error::ContainerError;
    ///
    /// let io = std::io::Error::other("connection refused");
    /// let err = ContainerError::failed("Database", io);
    /// assert!(err.to_string().contains("Database"));
    /// ```
    pub fn failed(type_name: impl Into<String>, source: impl Into<BoxError>) -> Self {
        ContainerError::Construction(ConstructionError {
            type_name: type_name.into(),
            required_by: None,
            failure: ConstructionFailure::Failed(source.into()),
        })
    }

    /// Returns `true` for [`ContainerError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, ContainerError::NotFound(_))
    }
}

/// Error when binding a key that is already bound.
#[derive(Debug)]
pub struct DuplicateKeyError {
    pub key: Identifier,
}

impl fmt::Display for DuplicateKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "An entry with the id \"{}\" already exists", self.key)?;
        write!(
            f,
            "\n  Hint: Use .rebind() to replace it, or .unbind() it first"
        )
    }
}

/// Error when something the resolution needed does not exist.
#[derive(Debug)]
pub enum NotFoundError {
    /// No binding for the key.
    Entry {
        key: Identifier,
        /// Bound keys with similar names
        suggestions: Vec<Identifier>,
    },

    /// A parameter of `owner` declares no type identifier, so there is
    /// nothing to look up or construct for it.
    UntypedParameter { owner: String, parameter: String },

    /// A constructor asked its arguments for a parameter it never declared.
    Argument { owner: String, parameter: String },
}

impl fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotFoundError::Entry { key, suggestions } => {
                write!(
                    f,
                    "Could not locate an entry in the container with the id \"{key}\""
                )?;
                if !suggestions.is_empty() {
                    write!(f, "\n  Did you mean one of:")?;
                    for suggestion in suggestions {
                        write!(f, "\n    - {suggestion}")?;
                    }
                }
                Ok(())
            }
            NotFoundError::UntypedParameter { owner, parameter } => {
                write!(
                    f,
                    "Constructor parameter \"{parameter}\" of {owner} could not be created: it has no type"
                )?;
                write!(
                    f,
                    "\n  Hint: Declare it with .param(\"{parameter}\", \"<identifier>\")"
                )
            }
            NotFoundError::Argument { owner, parameter } => {
                write!(
                    f,
                    "{owner} has no parameter named \"{parameter}\""
                )
            }
        }
    }
}

/// Error when a type cannot be built.
#[derive(Debug)]
pub struct ConstructionError {
    /// The type that failed
    pub type_name: String,
    /// The type whose parameter asked for it (if any)
    pub required_by: Option<String>,
    pub failure: ConstructionFailure,
}

/// Why a [`ConstructionError`] happened.
#[derive(Debug)]
pub enum ConstructionFailure {
    /// The introspector does not know the type.
    UnknownType,

    /// An argument holds a value of another type than the constructor expects.
    TypeMismatch {
        parameter: String,
        expected: &'static str,
        found: &'static str,
    },

    /// The constructor itself returned an error.
    Failed(BoxError),
}

impl fmt::Display for ConstructionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.failure {
            ConstructionFailure::UnknownType => {
                write!(f, "Failed to introspect type \"{}\": it is not registered", self.type_name)?;
            }
            ConstructionFailure::TypeMismatch {
                parameter,
                expected,
                found,
            } => {
                write!(
                    f,
                    "Failed to construct {}: parameter \"{parameter}\" expected {expected}, found {found}",
                    self.type_name
                )?;
            }
            ConstructionFailure::Failed(source) => {
                write!(f, "Failed to construct {}: {source}", self.type_name)?;
            }
        }

        if let Some(ref parent) = self.required_by {
            write!(f, "\n  Required by: {parent}")?;
        }

        if matches!(self.failure, ConstructionFailure::UnknownType) {
            write!(
                f,
                "\n  Hint: Bind the identifier, or register a type descriptor named \"{}\"",
                self.type_name
            )?;
        }
        Ok(())
    }
}

impl std::error::Error for ConstructionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.failure {
            ConstructionFailure::Failed(source) => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Error when a bound value is read back as a type it does not have.
#[derive(Debug)]
pub struct TypeMismatchError {
    pub key: Identifier,
    pub expected: &'static str,
    pub found: &'static str,
}

impl fmt::Display for TypeMismatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "The entry \"{}\" holds {}, but was requested as {}",
            self.key,
            shorten_type_name(self.found),
            shorten_type_name(self.expected)
        )?;
        write!(f, "\n  Hint: Use .get() for the untyped value")
    }
}

/// Error when a circular dependency is detected during resolution.
///
/// Shows the full chain so you can see WHERE the cycle is.
#[derive(Debug)]
pub struct CircularDependencyError {
    /// The chain of keys and types that forms the cycle.
    /// Example: ["A", "B", "C", "A"]
    pub chain: Vec<String>,
}

impl fmt::Display for CircularDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Circular dependency detected:\n  ")?;
        write!(f, "{}", render_chain(&self.chain))?;
        write!(
            f,
            "\n  Hint: Break the cycle by restructuring your dependencies"
        )
    }
}

/// Convenient Result type for Joinery operations.
pub type Result<T> = std::result::Result<T, ContainerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_key_error_display() {
        let err = ContainerError::DuplicateKey(DuplicateKeyError {
            key: Identifier::new("LoggerIface"),
        });

        let msg = format!("{err}");
        assert!(msg.contains("\"LoggerIface\" already exists"));
        assert!(msg.contains("rebind"));
    }

    #[test]
    fn not_found_entry_lists_suggestions() {
        let err = ContainerError::NotFound(NotFoundError::Entry {
            key: Identifier::new("Loger"),
            suggestions: vec![Identifier::new("Logger")],
        });

        let msg = format!("{err}");
        assert!(msg.contains("with the id \"Loger\""));
        assert!(msg.contains("- Logger"));
        assert!(err.is_not_found());
    }

    #[test]
    fn untyped_parameter_names_the_parameter() {
        let err = ContainerError::NotFound(NotFoundError::UntypedParameter {
            owner: "ClassF".into(),
            parameter: "someObject".into(),
        });

        let msg = format!("{err}");
        assert!(msg.contains("Constructor parameter \"someObject\""));
        assert!(msg.contains("ClassF"));
    }

    #[test]
    fn unknown_type_mentions_requirer() {
        let err = ContainerError::Construction(ConstructionError {
            type_name: "InterfaceB".into(),
            required_by: Some("ClassA".into()),
            failure: ConstructionFailure::UnknownType,
        });

        let msg = format!("{err}");
        assert!(msg.contains("\"InterfaceB\""));
        assert!(msg.contains("Required by: ClassA"));
        assert!(!err.is_not_found());
    }

    #[test]
    fn failed_keeps_source_message() {
        let err = ContainerError::failed("Database", std::io::Error::other("refused"));
        let msg = format!("{err}");
        assert!(msg.contains("Failed to construct Database: refused"));
    }

    #[test]
    fn failed_exposes_source() {
        use std::error::Error as _;

        let err = ContainerError::failed("Database", std::io::Error::other("refused"));
        let source = err.source().expect("constructor error should be the source");
        assert_eq!(source.to_string(), "refused");
        assert!(source.downcast_ref::<std::io::Error>().is_some());
    }

    #[test]
    fn unknown_type_has_no_source() {
        use std::error::Error as _;

        let err = ContainerError::Construction(ConstructionError {
            type_name: "Ghost".into(),
            required_by: None,
            failure: ConstructionFailure::UnknownType,
        });
        assert!(err.source().is_none());
    }

    #[test]
    fn type_mismatch_names_the_entry() {
        let err = ContainerError::TypeMismatch(TypeMismatchError {
            key: Identifier::new("greeting"),
            expected: "i64",
            found: "alloc::string::String",
        });

        let msg = format!("{err}");
        assert!(msg.contains("\"greeting\" holds String, but was requested as i64"));
        assert!(!msg.contains("construct"));
    }

    #[test]
    fn circular_dependency_error_display() {
        let err = ContainerError::CircularDependency(CircularDependencyError {
            chain: vec!["A".into(), "B".into(), "A".into()],
        });

        let msg = format!("{err}");
        assert!(msg.contains("Circular"));
        assert!(msg.contains("A → B → A"));
    }
}

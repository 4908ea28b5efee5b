//! Core container implementation for Joinery DI.

pub mod arguments;
pub mod container;
pub mod error;
pub mod instance;
pub mod introspect;
pub mod key;
pub mod lifetime;
pub mod registry;
pub mod resolver;
pub mod seed;
pub mod signature;

pub use container::{Container, ContainerBuilder, prelude};
pub use error::{ContainerError, Result};
pub use instance::Instance;
pub use key::Identifier;
pub use lifetime::Lifetime;

/// Re-exported for [`StaticType`](introspect::StaticType) submissions.
pub use inventory;

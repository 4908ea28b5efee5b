//! # Joinery: a string-keyed dependency injection container for Rust
//!
//! Bind identifiers to values, types or factories; Joinery builds types by
//! resolving their constructor parameters through the same container.
//!
//! ```
//! use joinery::prelude::*;
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
//! let container = Container::builder()
//!     .introspector(catalog)
//!     .singleton("Engine", "Engine")
//!     .transient("Car", "Car")
//!     .build()
//!     .unwrap();
//!
//! let a = container.resolve::<Car>("Car").unwrap();
//! let b = container.resolve::<Car>("Car").unwrap();
//! assert!(Arc::ptr_eq(&a.engine, &b.engine));
//! ```

pub use joinery_container::*;
pub use joinery_support::*;

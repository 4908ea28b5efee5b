//! Seed data applied to a registry when a container is built.
//!
//! A [`Seed`] is an ordered list of `key -> payload` entries. It can be put
//! together in code or deserialized with serde from a map whose values are
//! plain scalars (bound as values) or `{ class, singleton }` tables (bound as
//! types pending construction):
//!
//! ```
//! use joinery_container::seed::Seed;
//!
//! let seed: Seed = serde_json::from_str(r#"{
//!     "greeting": "hello",
//!     "retries": 3,
//!     "LoggerIface": { "class": "ConsoleLogger", "singleton": true }
//! }"#).unwrap();
//!
//! let keys: Vec<&str> = seed.iter().map(|(key, _)| key.as_str()).collect();
//! assert_eq!(keys, ["greeting", "retries", "LoggerIface"]);
//! ```

use std::any::Any;
use std::fmt;

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use tracing::debug;

use crate::error::Result;
use crate::key::Identifier;
use crate::lifetime::Lifetime;
use crate::registry::{Payload, Registry};
use crate::signature::Callable;

/// One seeded binding.
#[derive(Debug, Clone)]
pub struct SeedEntry {
    pub payload: Payload,
    pub lifetime: Lifetime,
}

/// Ordered seed data. Duplicate keys are kept so that applying the seed
/// reports them.
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct Seed {
    entries: Vec<(Identifier, SeedEntry)>,
}

impl Seed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a materialized value.
    pub fn value<T: Any + Send + Sync>(self, key: impl Into<Identifier>, value: T) -> Self {
        self.push(key, Payload::value(value), Lifetime::Transient)
    }

    /// Appends a type constructed on every lookup.
    pub fn transient(self, key: impl Into<Identifier>, type_name: impl Into<Identifier>) -> Self {
        self.push(key, Payload::of_type(type_name), Lifetime::Transient)
    }

    /// Appends a type constructed once.
    pub fn singleton(self, key: impl Into<Identifier>, type_name: impl Into<Identifier>) -> Self {
        self.push(key, Payload::of_type(type_name), Lifetime::Singleton)
    }

    /// Appends a factory.
    pub fn factory(self, key: impl Into<Identifier>, callable: Callable, lifetime: Lifetime) -> Self {
        self.push(key, Payload::factory(callable), lifetime)
    }

    pub fn push(mut self, key: impl Into<Identifier>, payload: Payload, lifetime: Lifetime) -> Self {
        self.entries.push((key.into(), SeedEntry { payload, lifetime }));
        self
    }

    /// Appends all entries of `other`, keeping their order.
    pub fn extend(mut self, other: Seed) -> Self {
        self.entries.extend(other.entries);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Identifier, &SeedEntry)> {
        self.entries.iter().map(|(key, entry)| (key, entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Binds every entry in order.
    ///
    /// # Errors
    /// Stops at the first [`DuplicateKey`](crate::error::ContainerError::DuplicateKey).
    /// Entries bound before it stay bound.
    pub fn apply(self, registry: &Registry) -> Result<()> {
        let count = self.entries.len();
        for (key, entry) in self.entries {
            registry.bind(key, entry.payload, entry.lifetime)?;
        }
        debug!(entries = count, "Applied seed");
        Ok(())
    }
}

impl<K: Into<Identifier>> FromIterator<(K, Payload)> for Seed {
    fn from_iter<I: IntoIterator<Item = (K, Payload)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Seed::new(), |seed, (key, payload)| seed.push(key, payload, Lifetime::Transient))
    }
}

#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct ClassEntry {
    class: String,
    #[serde(default)]
    singleton: bool,
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Class(ClassEntry),
    Bool(bool),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    Text(String),
}

impl From<RawEntry> for SeedEntry {
    fn from(raw: RawEntry) -> Self {
        let (payload, lifetime) = match raw {
            RawEntry::Class(ClassEntry { class, singleton }) => {
                (Payload::of_type(class), Lifetime::from(singleton))
            }
            RawEntry::Bool(value) => (Payload::value(value), Lifetime::Transient),
            RawEntry::Integer(value) => (Payload::value(value), Lifetime::Transient),
            RawEntry::Unsigned(value) => (Payload::value(value), Lifetime::Transient),
            RawEntry::Float(value) => (Payload::value(value), Lifetime::Transient),
            RawEntry::Text(value) => (Payload::value(value), Lifetime::Transient),
        };
        SeedEntry { payload, lifetime }
    }
}

struct SeedVisitor;

impl<'de> Visitor<'de> for SeedVisitor {
    type Value = Seed;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of keys to scalar values or { class, singleton } tables")
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<Seed, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, raw)) = map.next_entry::<String, RawEntry>()? {
            entries.push((Identifier::from(key), SeedEntry::from(raw)));
        }
        Ok(Seed { entries })
    }
}

impl<'de> Deserialize<'de> for Seed {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(SeedVisitor)
    }
}

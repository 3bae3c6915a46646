//! Identifiers of logical apis
//!
//! A single router can serve several independently documented apis.
//! Each endpoint declares which api(s) it belongs to through the `id` key of its documentation
//! and each documentation route requests the api(s) it describes the same way.

use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde_json::Value;

/// Identifier used when nothing is declared
pub const DEFAULT_API_ID: &str = "default";

/// How an identifier may be declared in a documentation fragment
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    /// `"id": "frontend"`
    One(String),
    /// `"id": ["frontend", "monitoring"]`
    Many(Vec<String>),
}

/// A normalized set of api identifiers
///
/// Never empty: declarations which are absent, empty or malformed fall back to
/// [`DEFAULT_API_ID`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentifierSet(BTreeSet<String>);

impl IdentifierSet {
    /// Parses the value of an `id` key
    pub fn from_declared(declared: Option<&Value>) -> Self {
        let ids = declared
            .and_then(|value| OneOrMany::deserialize(value).ok())
            .map(Self::from)
            .unwrap_or_default();
        if ids.0.is_empty() {
            Self::default()
        } else {
            ids
        }
    }

    /// Checks whether the two sets share at least one identifier
    pub fn intersects(&self, other: &Self) -> bool {
        !self.0.is_disjoint(&other.0)
    }

    /// Adds all identifiers from `other`
    pub fn extend(&mut self, other: Self) {
        self.0.extend(other.0);
    }

    /// Checks whether the set contains `id`
    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    /// Iterates over the identifiers in lexical order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Converts the set back into its declaration form
    ///
    /// A singleton set becomes a plain string.
    pub fn to_value(&self) -> Value {
        match self.0.len() {
            1 => Value::from(self.0.iter().next().cloned().unwrap_or_default()),
            _ => Value::from(self.0.iter().cloned().collect::<Vec<_>>()),
        }
    }
}

impl Default for IdentifierSet {
    fn default() -> Self {
        Self(BTreeSet::from([DEFAULT_API_ID.to_string()]))
    }
}

impl From<OneOrMany> for IdentifierSet {
    fn from(value: OneOrMany) -> Self {
        match value {
            OneOrMany::One(id) => Self(BTreeSet::from([id])),
            OneOrMany::Many(ids) => Self(ids.into_iter().collect()),
        }
    }
}

impl From<&str> for IdentifierSet {
    fn from(value: &str) -> Self {
        Self(BTreeSet::from([value.to_string()]))
    }
}

impl fmt::Display for IdentifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids = self.iter();
        if let Some(first) = ids.next() {
            write!(f, "{first}")?;
        }
        for id in ids {
            write!(f, ", {id}")?;
        }
        Ok(())
    }
}

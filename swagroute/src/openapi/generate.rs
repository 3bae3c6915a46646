//! Assembles a swagger document from the routing table

use std::mem;

use serde::ser::SerializeMap;
use serde::Serialize;
use serde::Serializer;
use serde_json::Value;
use swagroute_core::fragment::deep_merge;
use swagroute_core::fragment::strip_keys;
use swagroute_core::fragment::DocFragment;
use swagroute_core::fragment::OPERATION_LEVEL_KEYS;
use swagroute_core::identifier::IdentifierSet;
use swagroute_core::router::RouteEntry;
use tracing::debug;
use tracing::instrument;
use tracing::trace;

use crate::error::AssembleError;
use crate::openapi::merge::merge_endpoint;
use crate::openapi::path::normalize_path;
use crate::openapi::select::is_endpoint_selected;
use crate::openapi::select::is_selected;

/// The value of the document's `swagger` key
pub const SWAGGER_VERSION: &str = "2.0";

/// The operations of a single path, keyed by their lowercase method
pub type PathItem = DocFragment;

/// The document's `paths` in declaration order
///
/// Two routes whose paths normalize to the same template are kept as two separate entries.
/// They are serialized as repeated keys of the same json object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paths(Vec<(String, PathItem)>);

impl Paths {
    /// Appends an entry
    pub fn push(&mut self, path: String, item: PathItem) {
        self.0.push((path, item));
    }

    /// Retrieves the first entry for `path`
    pub fn get(&self, path: &str) -> Option<&PathItem> {
        self.0
            .iter()
            .find_map(|(key, item)| (key == path).then_some(item))
    }

    /// Iterates over all entries in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PathItem)> {
        self.0.iter().map(|(path, item)| (path.as_str(), item))
    }

    /// The number of entries
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Are there no entries?
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Paths {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (path, item) in &self.0 {
            map.serialize_entry(path, item)?;
        }
        map.end()
    }
}

/// A swagger 2.0 document
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledDocument {
    /// The apis this document describes
    ///
    /// Not part of the serialized document.
    pub api_ids: IdentifierSet,

    /// All top level keys except `paths`
    pub fields: DocFragment,

    /// The documented operations
    pub paths: Paths,
}

impl Serialize for AssembledDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry("paths", &self.paths)?;
        map.end()
    }
}

/// Assembles the document described by `skeleton` from `routes`
///
/// The skeleton's `id` selects which api to document.
/// Its remaining keys become the document's top level keys,
/// except those only meaningful on operations (`parameters`, `responses`, ...).
///
/// Items of the skeleton's `paths` are merged into the first route entry with the same path.
/// Those without a matching route come before all route entries.
///
/// The only possible error is an endpoint's coercion adapter failing.
#[instrument(level = "debug", skip_all)]
pub fn assemble(
    skeleton: &DocFragment,
    routes: &[RouteEntry],
) -> Result<AssembledDocument, AssembleError> {
    let api_ids = IdentifierSet::from_declared(skeleton.get("id"));

    let mut top_level = skeleton.clone();
    strip_keys(&mut top_level, OPERATION_LEVEL_KEYS);
    let declared_paths = top_level.get("paths").cloned();
    strip_keys(&mut top_level, &["paths"]);

    let mut fields = DocFragment::new();
    fields.insert("swagger".to_string(), Value::from(SWAGGER_VERSION));
    deep_merge(&mut fields, top_level);

    let mut declared_items = Vec::new();
    match declared_paths {
        Some(Value::Object(declared)) => {
            for (path, item) in declared {
                match item {
                    Value::Object(item) => declared_items.push((path, item)),
                    _ => debug!(%path, "Ignoring non-object path item in skeleton"),
                }
            }
        }
        Some(_) => debug!("Ignoring non-object paths in skeleton"),
        None => {}
    }

    let mut route_items: Vec<(String, PathItem)> = Vec::new();
    for route in routes {
        if !is_selected(route, &api_ids) {
            trace!(path = %route.path, "Skipping route of another api");
            continue;
        }

        let mut item = PathItem::new();
        for (method, endpoint) in &route.methods {
            let endpoint = endpoint
                .as_ref()
                .filter(|endpoint| is_endpoint_selected(endpoint, &api_ids));
            let operation =
                merge_endpoint(method, endpoint).map_err(|source| AssembleError::Coercion {
                    method: method.clone(),
                    path: route.path.clone(),
                    source,
                })?;
            match operation {
                Some(operation) => {
                    item.insert(
                        method.as_str().to_ascii_lowercase(),
                        Value::Object(operation),
                    );
                }
                None => trace!(path = %route.path, %method, "Skipping undocumented endpoint"),
            }
        }

        if !item.is_empty() {
            route_items.push((normalize_path(&route.path), item));
        }
    }

    // A declared item is absorbed by the first route entry with its path, the route winning.
    // Declared items without a matching route lead the list.
    let mut paths = Paths::default();
    for (path, declared) in declared_items {
        match route_items.iter_mut().find(|(route_path, _)| *route_path == path) {
            Some((_, item)) => {
                let mut merged = declared;
                deep_merge(&mut merged, mem::take(item));
                *item = merged;
            }
            None => paths.push(path, declared),
        }
    }
    for (path, item) in route_items {
        paths.push(path, item);
    }

    debug!(%api_ids, paths = paths.len(), "Assembled openapi document");
    Ok(AssembledDocument {
        api_ids,
        fields,
        paths,
    })
}

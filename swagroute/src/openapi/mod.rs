//! Generates swagger 2.0 documents for your application
//!
//! Documents are assembled from the routing table an [`ApiRouter`](swagroute_core::ApiRouter)
//! records while routes are registered.
//! Use [`OpenapiRouterExt::openapi_route`] to serve one.

use serde_json::Value;
use swagroute_core::fragment::deep_merge;
use swagroute_core::fragment::DocFragment;
use swagroute_core::identifier::IdentifierSet;
use swagroute_core::router::RouteEntry;

pub use crate::openapi::generate::assemble;
pub use crate::openapi::generate::AssembledDocument;
pub use crate::openapi::generate::PathItem;
pub use crate::openapi::generate::Paths;
pub use crate::openapi::generate::SWAGGER_VERSION;
pub use crate::openapi::handler::serve_openapi;
pub use crate::openapi::merge::merge_endpoint;
pub use crate::openapi::merge::Operation;
pub use crate::openapi::path::normalize_path;
pub use crate::openapi::router_ext::OpenapiRouterExt;
pub use crate::openapi::select::is_endpoint_selected;
pub use crate::openapi::select::is_selected;
use crate::error::AssembleError;

mod generate;
mod handler;
mod merge;
mod path;
mod router_ext;
mod select;

/// Builder used to configure the skeleton of a generated document
///
/// ```
/// # use swagroute::core::ApiRouter;
/// # use swagroute::openapi::OpenapiBuilder;
/// let router = ApiRouter::new();
/// let document = OpenapiBuilder::new()
///     .info("Calculator", "1.0.0")
///     .api_id("frontend")
///     .build(router.routes())
///     .unwrap();
/// assert!(document.paths.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct OpenapiBuilder {
    skeleton: DocFragment,
    api_ids: Option<IdentifierSet>,
}

impl OpenapiBuilder {
    /// Creates a builder for an empty skeleton
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges swagger content into the skeleton
    pub fn skeleton(&mut self, fragment: DocFragment) -> &mut Self {
        deep_merge(&mut self.skeleton, fragment);
        self
    }

    /// Sets the document's `info` object
    pub fn info(&mut self, title: &str, version: &str) -> &mut Self {
        let mut info = DocFragment::new();
        info.insert("title".to_string(), Value::from(title));
        info.insert("version".to_string(), Value::from(version));

        let mut fragment = DocFragment::new();
        fragment.insert("info".to_string(), Value::Object(info));
        self.skeleton(fragment)
    }

    /// Adds an api to document
    ///
    /// If no api is added, the one declared by the skeleton's `id` is used.
    /// If that is missing too, the `"default"` api is documented.
    pub fn api_id(&mut self, id: &str) -> &mut Self {
        self.api_ids
            .get_or_insert_with(|| IdentifierSet::from(id))
            .extend(IdentifierSet::from(id));
        self
    }

    /// Returns the skeleton which would be used by [`OpenapiBuilder::build`]
    pub fn to_skeleton(&self) -> DocFragment {
        let mut skeleton = self.skeleton.clone();
        if let Some(api_ids) = &self.api_ids {
            skeleton.insert("id".to_string(), api_ids.to_value());
        }
        skeleton
    }

    /// Assembles the document for `routes`
    pub fn build(&self, routes: &[RouteEntry]) -> Result<AssembledDocument, AssembleError> {
        assemble(&self.to_skeleton(), routes)
    }
}

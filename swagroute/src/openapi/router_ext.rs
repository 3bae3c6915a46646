//! [`ApiRouter`] extension trait

use swagroute_core::fragment::DocFragment;
use swagroute_core::middleware::catch_unwind::CatchUnwindMiddleware;
use swagroute_core::router::EndpointDefaults;
use swagroute_core::ApiRouter;
use swagroute_core::Endpoint;

use crate::openapi::handler::serve_openapi;

/// Extension trait for [`ApiRouter`]
///
/// It provides convenient methods for adding openapi related metadata
/// to a router's endpoints (for example tags) and for serving documents.
pub trait OpenapiRouterExt {
    /// Adds a tag to all endpoints in this router
    fn openapi_tag(self, tag: &str) -> Self;

    /// Creates a new router with a tag
    ///
    /// (Shorthand for `ApiRouter::new().openapi_tag(...)`)
    fn with_openapi_tag(tag: &str) -> Self;

    /// Associates an api with all endpoints in this router
    ///
    /// ```
    /// # use swagroute::openapi::OpenapiRouterExt;
    /// # use swagroute::core::ApiRouter;
    /// ApiRouter::new()
    ///     .nest(
    ///         "/api/frontend",
    ///         ApiRouter::new()
    ///             .api_id("frontend"),
    ///     )
    ///     .nest(
    ///         "/api/monitoring",
    ///         ApiRouter::new()
    ///             .api_id("monitoring"),
    ///     );
    /// ```
    fn api_id(self, id: &str) -> Self;

    /// Creates a new router with an api
    ///
    /// (Shorthand for `ApiRouter::new().api_id(...)`)
    fn with_api_id(id: &str) -> Self;

    /// Adds a route serving the swagger document described by `skeleton`
    ///
    /// The skeleton's `id` selects the api(s) to document.
    /// Its other keys (`info`, `host`, ...) are copied into the document.
    ///
    /// The route itself is never documented.
    ///
    /// ```
    /// # use serde_json::json;
    /// # use swagroute::core::fragment::fragment;
    /// # use swagroute::core::ApiRouter;
    /// # use swagroute::openapi::OpenapiRouterExt;
    /// ApiRouter::new()
    ///     .openapi_route(
    ///         "/docs/frontend.json",
    ///         fragment(json!({ "id": "frontend", "info": { "title": "Frontend" } })),
    ///     )
    ///     .openapi_route(
    ///         "/docs/monitoring.json",
    ///         fragment(json!({ "id": "monitoring", "info": { "title": "Monitoring" } })),
    ///     );
    /// ```
    fn openapi_route(self, path: &str, skeleton: DocFragment) -> Self;
}

impl OpenapiRouterExt for ApiRouter {
    fn openapi_tag(self, tag: &str) -> Self {
        self.defaults(EndpointDefaults::tag(tag))
    }

    fn with_openapi_tag(tag: &str) -> Self {
        Self::new().openapi_tag(tag)
    }

    fn api_id(self, id: &str) -> Self {
        self.defaults(EndpointDefaults::api_id(id))
    }

    fn with_api_id(id: &str) -> Self {
        Self::new().api_id(id)
    }

    fn openapi_route(mut self, path: &str, skeleton: DocFragment) -> Self {
        let slot = self.route_table_slot();
        let endpoint = Endpoint::get(
            move |matched: axum::extract::MatchedPath, method: axum::http::Method| async move {
                serve_openapi(&slot, matched.as_str(), &method)
            },
        )
        .docs(skeleton)
        .exclude_from_docs()
        .interceptor(CatchUnwindMiddleware::default());
        self.endpoint(path, endpoint)
    }
}

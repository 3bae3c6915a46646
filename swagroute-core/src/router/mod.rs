use std::convert::Infallible;
use std::sync::Arc;
use std::sync::OnceLock;

use axum::extract::Request;
use axum::handler::Handler;
use axum::http::Method;
use axum::response::IntoResponse;
use axum::routing::MethodFilter;
use axum::routing::Route;
use axum::routing::Router;
use indexmap::IndexMap;
use tower::Layer;
use tower::Service;
use tracing::warn;

pub use self::endpoint::{ChainLink, Endpoint, EndpointData};
use crate::identifier::IdentifierSet;
use crate::middleware::ApiMiddleware;

mod endpoint;

/// An `ApiRouter` combines several [`Endpoint`]s under a common path.
///
/// Next to the underlying axum router it records every endpoint's documentation.
/// Once all routes have been added, [`ApiRouter::finish`] splits the two
/// into the axum router and the compiled routing table.
#[derive(Debug, Default)]
pub struct ApiRouter {
    /// The routing table in declaration order
    routes: Vec<RouteEntry>,

    /// The underlying axum router
    router: Router,

    /// Documentation implicitly added to all endpoints added to this router
    defaults: EndpointDefaults,

    /// Slots waiting for the compiled routing table
    slots: Vec<RouteTableSlot>,
}

impl ApiRouter {
    /// Creates a new router
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new router with defaults
    ///
    /// (Shorthand for `ApiRouter::new().defaults(...)`)
    pub fn with_defaults(defaults: EndpointDefaults) -> Self {
        Self::new().defaults(defaults)
    }

    /// Adds an endpoint to the router
    ///
    /// If `path` has already been declared in this router, `endpoint`'s method is added to it.
    pub fn endpoint(mut self, path: &str, endpoint: Endpoint) -> Self {
        let Endpoint {
            method,
            method_router,
            mut data,
        } = endpoint;
        self.defaults.apply(&mut data);
        self.router = self.router.route(path, method_router);
        self.declare(path, method, Some(data));
        self
    }

    /// Adds a handler without any documentation to the router
    ///
    /// The handler will be listed in the routing table but never documented.
    ///
    /// # Panics
    /// If `method` is not supported by axum's router.
    #[track_caller]
    pub fn route_undocumented<H, T>(mut self, path: &str, method: Method, handler: H) -> Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        let Ok(filter) = MethodFilter::try_from(method.clone()) else {
            panic!("The method {method} can't be routed");
        };
        self.router = self.router.route(path, axum::routing::on(filter, handler));
        self.declare(path, method, None);
        self
    }

    /// Adds [`EndpointDefaults`] to every endpoint added to this router.
    ///
    /// The defaults will be added to all endpoints,
    /// regardless of whether the endpoint was added before or after this method was called.
    ///
    /// If defaults have already been added then the two will be merged.
    pub fn defaults(mut self, defaults: EndpointDefaults) -> Self {
        for data in self.endpoints_mut() {
            defaults.apply(data);
        }
        self.defaults.merge(defaults);
        self
    }

    /// Wraps all endpoints in a documented middleware.
    ///
    /// Like [`Router::route_layer`] the middleware only applies to the endpoints added so far.
    pub fn middleware(mut self, middleware: impl ApiMiddleware) -> Self {
        let link = ChainLink::of(&middleware);
        for data in self.endpoints_mut() {
            data.middleware_chain.insert(0, link.clone());
        }
        self.router = self.router.route_layer(middleware.into_layer());
        self
    }

    /// Creates a slot which will be filled with the compiled routing table by [`ApiRouter::finish`]
    ///
    /// Handlers which need to inspect the whole application (like a documentation endpoint)
    /// capture the slot when they are added.
    pub fn route_table_slot(&mut self) -> RouteTableSlot {
        let slot = RouteTableSlot::default();
        self.slots.push(slot.clone());
        slot
    }

    /// The routing table compiled so far
    pub fn routes(&self) -> &[RouteEntry] {
        &self.routes
    }

    /// Splits the router into the axum router and the compiled routing table
    pub fn finish(self) -> (Router, Arc<[RouteEntry]>) {
        let table: Arc<[RouteEntry]> = Arc::from(self.routes);
        for slot in self.slots {
            if slot.0.set(table.clone()).is_err() {
                warn!("Route table slot has already been filled");
            }
        }
        (self.router, table)
    }

    /// Calls [`Router::nest`] while preserving api information
    #[track_caller]
    pub fn nest(mut self, path: &str, other: ApiRouter) -> Self {
        if path.is_empty() || path == "/" {
            panic!("Nesting at the root is not supported. Use merge instead.");
        }
        if !path.starts_with('/') {
            panic!("Paths must start with a slash.");
        }

        for mut route in other.routes {
            // Code taken from `path_for_nested_route` in `axum/src/routing/path_router.rs`
            route.path = if path.ends_with('/') {
                format!("{path}{}", route.path.trim_start_matches('/'))
            } else if route.path == "/" {
                path.into()
            } else {
                format!("{path}{}", route.path)
            };

            self.push_route(route);
        }
        self.slots.extend(other.slots);

        self.router = self.router.nest(path, other.router);
        self
    }

    /// Calls [`Router::merge`] while preserving api information
    pub fn merge(mut self, other: ApiRouter) -> Self {
        for route in other.routes {
            self.push_route(route);
        }
        self.slots.extend(other.slots);
        self.router = self.router.merge(other.router);
        self
    }

    /// Apply a [`tower::Layer`] to all routes in the router.
    ///
    /// The layer is not documented, use [`ApiRouter::middleware`] for that.
    ///
    /// See [`Router::layer`] for more details.
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<Route> + Clone + Send + Sync + 'static,
        L::Service: Service<Request> + Clone + Send + Sync + 'static,
        <L::Service as Service<Request>>::Response: IntoResponse + 'static,
        <L::Service as Service<Request>>::Error: Into<Infallible> + 'static,
        <L::Service as Service<Request>>::Future: Send + 'static,
    {
        self.router = self.router.layer(layer);
        self
    }

    /// Adds a [`RouteEntry`] from another router after applying this router's defaults to it
    ///
    /// Entries are never coalesced, even if an entry with the same path exists.
    fn push_route(&mut self, mut route: RouteEntry) {
        for data in route.methods.values_mut().flatten() {
            self.defaults.apply(data);
        }
        self.routes.push(route);
    }

    /// Records a method in the routing table
    fn declare(&mut self, path: &str, method: Method, data: Option<EndpointData>) {
        match self.routes.iter_mut().find(|route| route.path == path) {
            Some(route) => {
                route.methods.insert(method, data);
            }
            None => self.routes.push(RouteEntry {
                path: path.to_string(),
                methods: IndexMap::from([(method, data)]),
            }),
        }
    }

    fn endpoints_mut(&mut self) -> impl Iterator<Item = &mut EndpointData> {
        self.routes
            .iter_mut()
            .flat_map(|route| route.methods.values_mut().flatten())
    }
}

/// A path and the documentation of the methods it handles
///
/// The methods are kept in declaration order.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    /// The route's path in axum's syntax i.e. url without the host information
    pub path: String,

    /// The route's methods, `None` for handlers added without documentation
    pub methods: IndexMap<Method, Option<EndpointData>>,
}

impl RouteEntry {
    /// The api(s) this route belongs to
    ///
    /// This is the union of its endpoints' apis.
    pub fn api_ids(&self) -> IdentifierSet {
        self.methods
            .values()
            .flatten()
            .map(EndpointData::api_ids)
            .reduce(|mut ids, other| {
                ids.extend(other);
                ids
            })
            .unwrap_or_default()
    }
}

/// Documentation an [`ApiRouter`] adds to all its endpoints
#[derive(Debug, Clone, Default)]
pub struct EndpointDefaults {
    /// Tags to add to every operation
    pub tags: Vec<String>,

    /// Apis every endpoint should belong to
    pub api_ids: Option<IdentifierSet>,
}

impl EndpointDefaults {
    /// Defaults adding a single tag
    pub fn tag(tag: &str) -> Self {
        Self {
            tags: vec![tag.to_string()],
            api_ids: None,
        }
    }

    /// Defaults adding a single api
    pub fn api_id(id: &str) -> Self {
        Self {
            tags: Vec::new(),
            api_ids: Some(IdentifierSet::from(id)),
        }
    }

    /// Merges `other` into `self`
    pub fn merge(&mut self, other: Self) {
        for tag in other.tags {
            if !self.tags.contains(&tag) {
                self.tags.push(tag);
            }
        }
        if let Some(other) = other.api_ids {
            match &mut self.api_ids {
                Some(ids) => ids.extend(other),
                None => self.api_ids = Some(other),
            }
        }
    }

    /// Applies the defaults to an endpoint
    pub fn apply(&self, data: &mut EndpointData) {
        for tag in &self.tags {
            data.add_tag(tag);
        }
        if let Some(ids) = &self.api_ids {
            data.add_api_ids(ids.clone());
        }
    }
}

/// Receives the compiled routing table once [`ApiRouter::finish`] is called
#[derive(Debug, Clone, Default)]
pub struct RouteTableSlot(Arc<OnceLock<Arc<[RouteEntry]>>>);

impl RouteTableSlot {
    /// Retrieves the routing table
    ///
    /// Returns `None` until the router has been finished.
    pub fn get(&self) -> Option<&Arc<[RouteEntry]>> {
        self.0.get()
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http;
    use axum::http::StatusCode;
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;
    use crate::fragment::DocFragment;
    use crate::fragment::fragment;
    use crate::middleware::SimpleApiMiddleware;

    #[derive(Clone)]
    struct Documented(&'static str);
    impl SimpleApiMiddleware for Documented {
        fn documentation(&self) -> Option<DocFragment> {
            Some(fragment(json!({ "x-layer": self.0 })))
        }
    }

    fn paths(router: &ApiRouter) -> Vec<&str> {
        router.routes().iter().map(|route| route.path.as_str()).collect()
    }

    #[test]
    fn methods_of_one_path_share_an_entry() {
        let router = ApiRouter::new()
            .endpoint("/users", Endpoint::get(|| async {}))
            .endpoint("/users/{id}", Endpoint::get(|| async {}))
            .endpoint("/users", Endpoint::post(|| async {}));

        assert_eq!(paths(&router), ["/users", "/users/{id}"]);
        let methods: Vec<_> = router.routes()[0].methods.keys().cloned().collect();
        assert_eq!(methods, [Method::GET, Method::POST]);
    }

    #[test]
    fn nest_prefixes_paths() {
        let router = ApiRouter::new()
            .endpoint("/status", Endpoint::get(|| async {}))
            .nest(
                "/api",
                ApiRouter::new()
                    .endpoint("/", Endpoint::get(|| async {}))
                    .endpoint("/users", Endpoint::get(|| async {})),
            )
            .nest(
                "/v2/",
                ApiRouter::new().endpoint("/users", Endpoint::get(|| async {})),
            );

        assert_eq!(paths(&router), ["/status", "/api", "/api/users", "/v2/users"]);
    }

    #[test]
    #[should_panic]
    fn nest_at_root_panics() {
        let _ = ApiRouter::new().nest("/", ApiRouter::new());
    }

    #[test]
    fn merge_never_coalesces() {
        let router = ApiRouter::new()
            .endpoint("/a", Endpoint::get(|| async {}))
            .merge(ApiRouter::new().endpoint("/a", Endpoint::post(|| async {})));

        assert_eq!(paths(&router), ["/a", "/a"]);
    }

    #[test]
    fn defaults_apply_before_and_after() {
        let router = ApiRouter::new()
            .endpoint("/before", Endpoint::get(|| async {}))
            .defaults(EndpointDefaults::tag("math"))
            .defaults(EndpointDefaults::api_id("calc"))
            .endpoint("/after", Endpoint::get(|| async {}).tag("io"))
            .route_undocumented("/raw", Method::GET, || async {});

        for route in &router.routes()[..2] {
            let data = route.methods[&Method::GET].as_ref().unwrap();
            assert!(data.tags.contains(&"math".to_string()));
            assert_eq!(data.api_ids(), IdentifierSet::from("calc"));
        }
        assert!(router.routes()[2].methods[&Method::GET].is_none());
        assert_eq!(router.routes()[2].api_ids(), IdentifierSet::default());
    }

    #[test]
    fn nested_endpoints_receive_outer_defaults() {
        let router = ApiRouter::with_defaults(EndpointDefaults::api_id("outer")).nest(
            "/inner",
            ApiRouter::with_defaults(EndpointDefaults::api_id("inner"))
                .endpoint("/x", Endpoint::get(|| async {})),
        );

        let ids = router.routes()[0].api_ids();
        assert!(ids.contains("inner"));
        assert!(ids.contains("outer"));
    }

    #[test]
    fn later_middlewares_are_outer() {
        let router = ApiRouter::new()
            .endpoint("/x", Endpoint::get(|| async {}))
            .middleware(Documented("inner"))
            .middleware(Documented("outer"))
            .endpoint("/y", Endpoint::get(|| async {}));

        let chain = &router.routes()[0].methods[&Method::GET]
            .as_ref()
            .unwrap()
            .middleware_chain;
        let layers: Vec<_> = chain
            .iter()
            .map(|link| link.documentation_overrides.as_ref().unwrap()["x-layer"].clone())
            .collect();
        assert_eq!(layers, [json!("outer"), json!("inner")]);

        let unwrapped = router.routes()[1].methods[&Method::GET].as_ref().unwrap();
        assert!(unwrapped.middleware_chain.is_empty());
    }

    #[tokio::test]
    async fn finish_fills_slots() {
        let mut router = ApiRouter::new().endpoint("/x", Endpoint::get(|| async { "x" }));
        let slot = router.route_table_slot();
        assert!(slot.get().is_none());

        let (router, table) = router.finish();
        assert_eq!(slot.get().map(|table| table.len()), Some(1));
        assert_eq!(table[0].path, "/x");

        let response = router
            .oneshot(http::Request::get("/x").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

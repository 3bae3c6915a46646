//! A single handler together with its documentation

use std::any::type_name;
use std::sync::Arc;

use axum::handler::Handler;
use axum::http::Method;
use axum::routing::MethodFilter;
use axum::routing::MethodRouter;
use serde_json::Value;

use crate::coercion::CoercionAdapter;
use crate::fragment::DocFragment;
use crate::fragment::deep_merge;
use crate::identifier::IdentifierSet;
use crate::middleware::ApiMiddleware;

/// Documentation metadata of an endpoint i.e. a route's method
#[derive(Debug, Clone, Default)]
pub struct EndpointData {
    /// Swagger content declared directly on the endpoint
    ///
    /// Its `id` key declares the api(s) this endpoint belongs to.
    pub documentation_overrides: Option<DocFragment>,

    /// Should this endpoint be omitted from every document?
    pub excluded_from_docs: bool,

    /// The operation's tags without duplicates
    pub tags: Vec<String>,

    /// The operation's summary
    pub summary: Option<String>,

    /// The operation's description
    pub description: Option<String>,

    /// Adapter describing the endpoint's parameters and responses
    pub coercion_adapter: Option<Arc<dyn CoercionAdapter>>,

    /// Middlewares wrapping the endpoint, the outermost first
    pub middleware_chain: Vec<ChainLink>,

    /// Interceptors wrapping the endpoint's handler, the outermost first
    pub interceptor_chain: Vec<ChainLink>,
}

impl EndpointData {
    /// The api(s) this endpoint belongs to
    pub fn api_ids(&self) -> IdentifierSet {
        IdentifierSet::from_declared(
            self.documentation_overrides
                .as_ref()
                .and_then(|overrides| overrides.get("id")),
        )
    }

    /// Adds the endpoint to more apis
    ///
    /// An endpoint which didn't declare any api yet will only belong to `ids` afterward.
    pub fn add_api_ids(&mut self, ids: IdentifierSet) {
        let overrides = self.documentation_overrides.get_or_insert_default();
        let ids = match overrides.get("id") {
            Some(declared) => {
                let mut declared = IdentifierSet::from_declared(Some(declared));
                declared.extend(ids);
                declared
            }
            None => ids,
        };
        overrides.insert("id".to_string(), ids.to_value());
    }

    /// Adds a tag unless it is already present
    pub fn add_tag(&mut self, tag: &str) {
        if !self.tags.iter().any(|existing| existing == tag) {
            self.tags.push(tag.to_string());
        }
    }
}

/// A middleware's (or interceptor's) contribution to an endpoint's documentation
#[derive(Debug, Clone)]
pub struct ChainLink {
    /// The middleware's type name
    pub name: &'static str,

    /// The swagger content the middleware adds to every endpoint it wraps
    pub documentation_overrides: Option<DocFragment>,
}

impl ChainLink {
    /// Captures the documentation of a middleware
    pub fn of<M: ApiMiddleware>(middleware: &M) -> Self {
        Self {
            name: type_name::<M>(),
            documentation_overrides: middleware.documentation(),
        }
    }
}

/// A handler for a single method and its [`EndpointData`]
///
/// Add it to an [`ApiRouter`](super::ApiRouter) using [`ApiRouter::endpoint`](super::ApiRouter::endpoint).
#[derive(Debug)]
pub struct Endpoint {
    pub(super) method: Method,
    pub(super) method_router: MethodRouter,
    pub(super) data: EndpointData,
}

macro_rules! method_constructors {
    ($($name:ident => $method:ident,)*) => {$(
        #[doc = concat!("Creates an endpoint handling `", stringify!($method), "` requests")]
        pub fn $name<H, T>(handler: H) -> Self
        where
            H: Handler<T, ()>,
            T: 'static,
        {
            Self::new(Method::$method, handler)
        }
    )*};
}

impl Endpoint {
    /// Creates an endpoint handling `method` requests
    ///
    /// # Panics
    /// If `method` is not supported by axum's router.
    #[track_caller]
    pub fn new<H, T>(method: Method, handler: H) -> Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        let Ok(filter) = MethodFilter::try_from(method.clone()) else {
            panic!("The method {method} can't be routed");
        };
        Self {
            method,
            method_router: axum::routing::on(filter, handler),
            data: EndpointData::default(),
        }
    }

    method_constructors! {
        get => GET,
        post => POST,
        put => PUT,
        patch => PATCH,
        delete => DELETE,
        head => HEAD,
        options => OPTIONS,
    }

    /// The method this endpoint handles
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The endpoint's documentation
    pub fn data(&self) -> &EndpointData {
        &self.data
    }

    /// Sets the operation's summary
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.data.summary = Some(summary.into());
        self
    }

    /// Sets the operation's description
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.data.description = Some(description.into());
        self
    }

    /// Adds a tag to the operation
    pub fn tag(mut self, tag: &str) -> Self {
        self.data.add_tag(tag);
        self
    }

    /// Adds the endpoint to an api
    pub fn api_id(mut self, id: &str) -> Self {
        self.data.add_api_ids(IdentifierSet::from(id));
        self
    }

    /// Merges swagger content into the endpoint's own documentation
    ///
    /// This content wins against everything else contributing to the operation.
    pub fn docs(mut self, fragment: DocFragment) -> Self {
        deep_merge(self.data.documentation_overrides.get_or_insert_default(), fragment);
        self
    }

    /// Sets a single key in the endpoint's own documentation
    pub fn doc(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.data
            .documentation_overrides
            .get_or_insert_default()
            .insert(key.to_string(), value.into());
        self
    }

    /// Omits the endpoint from every document
    pub fn exclude_from_docs(mut self) -> Self {
        self.data.excluded_from_docs = true;
        self
    }

    /// Sets the adapter describing the endpoint's parameters and responses
    pub fn coercion(mut self, adapter: impl CoercionAdapter) -> Self {
        self.data.coercion_adapter = Some(Arc::new(adapter));
        self
    }

    /// Wraps the handler in a middleware
    ///
    /// Later interceptors wrap earlier ones.
    pub fn interceptor(mut self, interceptor: impl ApiMiddleware) -> Self {
        self.data
            .interceptor_chain
            .insert(0, ChainLink::of(&interceptor));
        self.method_router = self.method_router.route_layer(interceptor.into_layer());
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::fragment::fragment;
    use crate::middleware::SimpleApiMiddleware;

    #[derive(Clone)]
    struct Documented(&'static str);
    impl SimpleApiMiddleware for Documented {
        fn documentation(&self) -> Option<DocFragment> {
            Some(fragment(json!({ "x-layer": self.0 })))
        }
    }

    #[test]
    fn api_ids_replace_implicit_default() {
        let endpoint = Endpoint::get(|| async {}).api_id("other");
        assert_eq!(endpoint.data().api_ids(), IdentifierSet::from("other"));

        let mut data = endpoint.data;
        data.add_api_ids(IdentifierSet::from("admin"));
        assert_eq!(
            data.documentation_overrides.unwrap()["id"],
            json!(["admin", "other"])
        );
    }

    #[test]
    fn undeclared_api_is_default() {
        assert_eq!(EndpointData::default().api_ids(), IdentifierSet::default());
    }

    #[test]
    fn tags_are_deduplicated() {
        let endpoint = Endpoint::post(|| async {})
            .tag("math")
            .tag("io")
            .tag("math");
        assert_eq!(endpoint.data().tags, ["math", "io"]);
        assert_eq!(*endpoint.method(), Method::POST);
    }

    #[test]
    fn docs_are_merged() {
        let endpoint = Endpoint::get(|| async {})
            .docs(fragment(json!({ "responses": { "200": {} } })))
            .docs(fragment(json!({ "responses": { "404": {} } })))
            .doc("deprecated", true);

        assert_eq!(
            Value::Object(endpoint.data.documentation_overrides.unwrap()),
            json!({ "responses": { "200": {}, "404": {} }, "deprecated": true })
        );
    }

    #[test]
    fn later_interceptors_are_outer() {
        let endpoint = Endpoint::get(|| async {})
            .interceptor(Documented("inner"))
            .interceptor(Documented("outer"));

        let layers: Vec<_> = endpoint
            .data()
            .interceptor_chain
            .iter()
            .map(|link| link.documentation_overrides.as_ref().unwrap()["x-layer"].clone())
            .collect();
        assert_eq!(layers, [json!("outer"), json!("inner")]);
        assert!(endpoint.data().middleware_chain.is_empty());
    }
}

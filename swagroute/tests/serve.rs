use axum::body::Body;
use axum::http::Request;
use axum::http::StatusCode;
use axum::Router;
use schemars::JsonSchema;
use serde_json::json;
use serde_json::Value;
use swagroute::core::coercion::SchemaCoercion;
use swagroute::core::fragment::fragment;
use swagroute::core::fragment::DocFragment;
use swagroute::core::middleware::catch_unwind::CatchUnwindMiddleware;
use swagroute::core::ApiRouter;
use swagroute::core::Endpoint;
use swagroute::openapi::OpenapiRouterExt;
use tower::ServiceExt;

#[derive(JsonSchema)]
#[allow(dead_code)]
struct Operands {
    a: i64,
    b: i64,
}

async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn path_keys(document: &Value) -> Vec<&str> {
    document["paths"]
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect()
}

fn calculator() -> Router {
    let (router, _) = ApiRouter::new()
        .endpoint(
            "/plus",
            Endpoint::get(|| async { "3" })
                .tag("math")
                .summary("adds numbers")
                .coercion(
                    SchemaCoercion::new()
                        .query::<Operands>()
                        .response::<i64>(StatusCode::OK, "The sum"),
                ),
        )
        .endpoint("/minus", Endpoint::get(|| async { "-1" }).api_id("other"))
        .openapi_route(
            "/docs/default.json",
            fragment(json!({ "id": "default", "info": { "title": "Calculator", "version": "1.0" } })),
        )
        .openapi_route("/docs/other.json", fragment(json!({ "id": "other" })))
        .finish();
    router
}

#[tokio::test]
async fn default_api() {
    let (status, document) = get_json(calculator(), "/docs/default.json").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(document["swagger"], "2.0");
    assert_eq!(
        document["info"],
        json!({ "title": "Calculator", "version": "1.0" })
    );
    assert!(document.get("id").is_none());
    assert_eq!(path_keys(&document), ["/plus"]);

    let plus = &document["paths"]["/plus"]["get"];
    assert_eq!(plus["tags"], json!(["math"]));
    assert_eq!(plus["summary"], "adds numbers");
    assert_eq!(plus["parameters"][0]["name"], "a");
    assert_eq!(plus["parameters"][1]["name"], "b");
    assert_eq!(plus["responses"]["200"]["description"], "The sum");
}

#[tokio::test]
async fn other_api() {
    let (status, document) = get_json(calculator(), "/docs/other.json").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        document,
        json!({ "swagger": "2.0", "paths": { "/minus": { "get": {} } } })
    );
}

#[tokio::test]
async fn handlers_still_work() {
    let response = calculator()
        .oneshot(Request::get("/plus").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn broken_adapter_is_a_server_error() {
    let (router, _) = ApiRouter::new()
        .endpoint(
            "/broken",
            Endpoint::get(|| async {}).coercion(SchemaCoercion::new().query::<i64>()),
        )
        .openapi_route("/openapi.json", DocFragment::new())
        .finish();

    let (status, body) = get_json(router, "/openapi.json").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({ "status_code": 500, "message": "Internal Server Error" })
    );
}

#[tokio::test]
async fn nested_router_with_api_id() {
    let api = ApiRouter::new()
        .openapi_route("/openapi.json", DocFragment::new())
        .endpoint("/users/{id}", Endpoint::get(|| async {}))
        .endpoint("/files/{*rest}", Endpoint::post(|| async {}))
        .api_id("internal");
    let (router, _) = ApiRouter::new()
        .endpoint("/health", Endpoint::get(|| async {}))
        .nest("/api", api)
        .finish();

    let (status, document) = get_json(router, "/api/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(path_keys(&document), ["/api/users/{id}", "/api/files/{rest}"]);
    assert!(document["paths"]["/api/files/{rest}"]["post"].is_object());
}

#[tokio::test]
async fn middleware_documentation() {
    let (router, _) = ApiRouter::new()
        .endpoint("/plus", Endpoint::get(|| async {}))
        .middleware(CatchUnwindMiddleware::default())
        .openapi_route("/openapi.json", DocFragment::new())
        .finish();

    let (_, document) = get_json(router, "/openapi.json").await;
    assert_eq!(
        document["paths"]["/plus"]["get"],
        json!({ "responses": { "500": { "description": "Internal server error" } } })
    );
}

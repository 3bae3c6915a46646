use axum::extract::Query;
use axum::http::StatusCode;
use axum::Json;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use swagroute::core::coercion::SchemaCoercion;
use swagroute::core::fragment::fragment;
use swagroute::core::middleware::catch_unwind::CatchUnwindMiddleware;
use swagroute::core::ApiRouter;
use swagroute::core::Endpoint;
use swagroute::openapi::OpenapiRouterExt;
use swagroute::settings::Settings;
use swagroute::Swagroute;
use tracing::debug;

#[derive(Debug, Deserialize, JsonSchema)]
struct Operands {
    /// The left operand
    a: i64,
    /// The right operand
    b: i64,
}

async fn plus(Query(Operands { a, b }): Query<Operands>) -> Json<i64> {
    debug!(a, b, "Adding");
    Json(a.wrapping_add(b))
}

async fn minus(Query(Operands { a, b }): Query<Operands>) -> Json<i64> {
    debug!(a, b, "Subtracting");
    Json(a.wrapping_sub(b))
}

fn operands() -> SchemaCoercion {
    SchemaCoercion::new()
        .query::<Operands>()
        .response::<i64>(StatusCode::OK, "The result")
        .empty_response(StatusCode::BAD_REQUEST, "Invalid operands")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    Swagroute::new(Settings::from_env()?)?
        .add_routes(
            ApiRouter::with_openapi_tag("math")
                .endpoint(
                    "/plus",
                    Endpoint::get(plus)
                        .summary("adds numbers")
                        .coercion(operands()),
                )
                .endpoint(
                    "/minus",
                    Endpoint::get(minus)
                        .api_id("other")
                        .summary("subtracts numbers")
                        .coercion(operands()),
                )
                .middleware(CatchUnwindMiddleware::default()),
        )
        .add_routes(
            ApiRouter::new()
                .openapi_route(
                    "/docs/default.json",
                    fragment(json!({
                        "id": "default",
                        "info": { "title": "Calculator", "version": "1.0.0" },
                    })),
                )
                .openapi_route(
                    "/docs/other.json",
                    fragment(json!({
                        "id": "other",
                        "info": { "title": "Other calculator", "version": "1.0.0" },
                    })),
                ),
        )
        .start()
        .await?;

    Ok(())
}

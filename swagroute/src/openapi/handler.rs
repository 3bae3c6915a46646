//! Serves an assembled document over http

use axum::http::Method;
use axum::Json;
use swagroute_core::api_error::ApiError;
use swagroute_core::api_error::ApiResult;
use swagroute_core::fragment::DocFragment;
use swagroute_core::router::RouteEntry;
use swagroute_core::router::RouteTableSlot;
use tracing::debug;

use crate::openapi::generate::assemble;
use crate::openapi::generate::AssembledDocument;

/// Assembles the document for the documentation route at `path` and `method`
///
/// The route's own documentation is used as the skeleton.
/// This way the skeleton can still be changed after the route has been registered,
/// for example by router defaults adding an api id.
pub fn serve_openapi(
    slot: &RouteTableSlot,
    path: &str,
    method: &Method,
) -> ApiResult<Json<AssembledDocument>> {
    let routes = slot
        .get()
        .ok_or_else(|| ApiError::server_error("The routing table has not been finished"))?;

    // axum answers HEAD requests with the GET handler
    let method = if *method == Method::HEAD {
        &Method::GET
    } else {
        method
    };
    let skeleton = find_skeleton(routes, path, method)
        .ok_or_else(|| ApiError::server_error("Documentation route is not in the routing table"))?;

    debug!(path, "Serving openapi document");
    let document = assemble(&skeleton, routes)
        .map_err(ApiError::map_server_error("Failed to assemble openapi document"))?;
    Ok(Json(document))
}

fn find_skeleton(routes: &[RouteEntry], path: &str, method: &Method) -> Option<DocFragment> {
    routes
        .iter()
        .filter(|route| route.path == path)
        .find_map(|route| route.methods.get(method)?.as_ref())
        .map(|data| data.documentation_overrides.clone().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use serde_json::json;
    use swagroute_core::fragment::fragment;
    use swagroute_core::ApiRouter;
    use swagroute_core::Endpoint;

    use super::*;

    #[test]
    fn unfinished_router() {
        let mut router = ApiRouter::new();
        let slot = router.route_table_slot();

        let error = serve_openapi(&slot, "/openapi.json", &Method::GET).unwrap_err();
        assert_eq!(
            error.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn skeleton_is_looked_up() {
        let mut router = ApiRouter::new()
            .endpoint("/plus", Endpoint::get(|| async {}).summary("adds numbers"))
            .endpoint(
                "/openapi.json",
                Endpoint::get(|| async {})
                    .docs(fragment(json!({ "info": { "title": "Calculator" } })))
                    .exclude_from_docs(),
            );
        let slot = router.route_table_slot();
        let _ = router.finish();

        let Json(document) = serve_openapi(&slot, "/openapi.json", &Method::HEAD).unwrap();
        assert_eq!(
            serde_json::to_value(&document).unwrap(),
            json!({
                "swagger": "2.0",
                "info": { "title": "Calculator" },
                "paths": { "/plus": { "get": { "summary": "adds numbers" } } },
            })
        );

        assert!(serve_openapi(&slot, "/missing", &Method::GET).is_err());
    }
}

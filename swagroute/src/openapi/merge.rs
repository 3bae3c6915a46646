//! Layers all documentation contributed to an endpoint into a single operation

use axum::http::Method;
use serde_json::Value;
use swagroute_core::coercion::CoercionError;
use swagroute_core::coercion::FragmentKind;
use swagroute_core::fragment::deep_merge;
use swagroute_core::fragment::strip_keys;
use swagroute_core::fragment::DocFragment;
use swagroute_core::fragment::DOCUMENT_LEVEL_KEYS;
use swagroute_core::router::EndpointData;
use tracing::trace;

/// A swagger 2.0 operation object
pub type Operation = DocFragment;

/// Merges an endpoint's documentation into an [`Operation`]
///
/// Returns `None` if the endpoint has no documentation data or is excluded from docs.
///
/// The sources are merged in the following order, later ones winning any conflict:
/// 1. the middleware chain, outermost first
/// 2. the interceptor chain, outermost first
/// 3. the coercion adapter
/// 4. the endpoint's tags, summary and description
/// 5. the endpoint's own documentation
///
/// Keys only meaningful on the document (`info`, `host`, ...) are dropped from every source.
/// This includes the chains and the adapter, not only the endpoint's own documentation,
/// so a middleware can't leak an `info` or `host` into an operation either.
pub fn merge_endpoint(
    method: &Method,
    endpoint: Option<&EndpointData>,
) -> Result<Option<Operation>, CoercionError> {
    let Some(endpoint) = endpoint else {
        return Ok(None);
    };
    if endpoint.excluded_from_docs {
        return Ok(None);
    }

    let mut operation = Operation::new();

    for link in endpoint
        .middleware_chain
        .iter()
        .chain(&endpoint.interceptor_chain)
    {
        if let Some(fragment) = &link.documentation_overrides {
            trace!(%method, middleware = link.name, "Merging middleware documentation");
            merge_into_operation(&mut operation, fragment.clone());
        }
    }

    if let Some(adapter) = &endpoint.coercion_adapter {
        let fragment = adapter.documentation_fragment(FragmentKind::OpenapiFragment, endpoint)?;
        merge_into_operation(&mut operation, fragment);
    }

    let mut annotations = DocFragment::new();
    if !endpoint.tags.is_empty() {
        annotations.insert("tags".to_string(), Value::from(endpoint.tags.clone()));
    }
    if let Some(summary) = &endpoint.summary {
        annotations.insert("summary".to_string(), Value::from(summary.as_str()));
    }
    if let Some(description) = &endpoint.description {
        annotations.insert("description".to_string(), Value::from(description.as_str()));
    }
    deep_merge(&mut operation, annotations);

    if let Some(overrides) = &endpoint.documentation_overrides {
        merge_into_operation(&mut operation, overrides.clone());
    }

    Ok(Some(operation))
}

fn merge_into_operation(operation: &mut Operation, mut fragment: DocFragment) {
    strip_keys(&mut fragment, DOCUMENT_LEVEL_KEYS);
    deep_merge(operation, fragment);
}

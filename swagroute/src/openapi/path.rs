//! Converts axum's path syntax into swagger's path templates

use std::sync::LazyLock;

use regex::Regex;

/// Matches a catch-all parameter in braces like `{*rest}`
static BRACED_WILDCARD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\*([^{}/]+)\}").expect("invalid regex"));

/// Matches a whole segment using the legacy `:name` or `*name` syntax
static LEGACY_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[:*]([^{}/]+)$").expect("invalid regex"));

/// Normalizes a route's path into a swagger path template
///
/// - `/users/{id}` stays as it is
/// - `/files/{*rest}` becomes `/files/{rest}`
/// - `/users/:id` and `/files/*rest` become `/users/{id}` and `/files/{rest}`
///
/// Segments which don't match any of those are passed through unchanged.
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| match LEGACY_SEGMENT.captures(segment) {
            Some(captures) => format!("{{{}}}", &captures[1]),
            None => BRACED_WILDCARD.replace_all(segment, "{$1}").into_owned(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

//! Errors produced by swagroute

use std::io;

use axum::http::Method;
use swagroute_core::coercion::CoercionError;
use thiserror::Error;

/// Error type for starting swagroute
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum SwagrouteError {
    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("Failed to load settings: {0}")]
    Settings(#[from] envy::Error),

    #[error("Failed to initialize tracing: {0}")]
    Tracing(#[from] tracing_subscriber::util::TryInitError),
}

/// Error produced while assembling a document
///
/// Assembly itself never fails, only an endpoint's coercion adapter might.
#[derive(Debug, Error)]
pub enum AssembleError {
    /// An endpoint's coercion adapter failed to produce its fragment
    #[error("Failed to document {method} {path}: {source}")]
    Coercion {
        /// The endpoint's method
        method: Method,
        /// The endpoint's path as declared in the router
        path: String,
        /// The adapter's error
        source: CoercionError,
    },
}

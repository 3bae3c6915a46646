//! This module holds the error returned from handlers

use std::error::Error;
use std::fmt;
use std::panic::Location;

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use schemars::JsonSchema;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;
use tracing::error;

/// A type alias that includes the ApiError
pub type ApiResult<T> = Result<T, ApiError>;

/// The common error that is returned from the handlers
#[derive(Debug, Error)]
pub struct ApiError {
    /// Http status code to use for the response
    pub status_code: ApiErrorStatusCode,

    /// An arbitrary string literal describing the error
    pub context: Option<&'static str>,

    /// Location where the error originated from
    pub location: &'static Location<'static>,

    /// The error's underlying source
    pub source: Option<Box<dyn Error + Send + Sync + 'static>>,

    /// Message of the panic this error has been created for
    pub panic_message: Option<String>,
}

/// Http status codes available for [`ApiError`]
#[derive(Debug, Copy, Clone)]
pub enum ApiErrorStatusCode {
    /// `400`
    BadRequest,
    /// `500`
    ServerError,
}

impl ApiErrorStatusCode {
    /// Converts the status code into `http`'s type
    pub fn to_http(&self) -> StatusCode {
        match self {
            ApiErrorStatusCode::BadRequest => StatusCode::BAD_REQUEST,
            ApiErrorStatusCode::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// The response body sent for an [`ApiError`]
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ApiErrorResponse {
    /// The response's status code
    pub status_code: u16,

    /// Rough description of the error
    ///
    /// Details are only logged, never sent to the client.
    pub message: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            ApiErrorStatusCode::BadRequest => write!(f, "Bad Request")?,
            ApiErrorStatusCode::ServerError => write!(f, "Server Error")?,
        }
        if let Some(context) = self.context {
            write!(f, " '{context}'")?;
        }
        if let Some(source) = &self.source {
            write!(f, " cause by '{source}'")?;
        }
        if let Some(message) = &self.panic_message {
            write!(f, " panicked with '{message}'")?;
        }
        write!(f, " at '{}'", self.location)
    }
}

impl ApiError {
    /// Constructs a new `ApiError` with [`ApiErrorStatusCode::BadRequest`]
    #[track_caller]
    pub fn bad_request(context: &'static str) -> Self {
        Self::new(ApiErrorStatusCode::BadRequest, Some(context))
    }

    /// Constructs a new `ApiError` with [`ApiErrorStatusCode::ServerError`]
    #[track_caller]
    pub fn server_error(context: &'static str) -> Self {
        Self::new(ApiErrorStatusCode::ServerError, Some(context))
    }

    /// Adds a source to the `ApiError`
    pub fn with_source(self, source: impl Error + Send + Sync + 'static) -> Self {
        self.with_boxed_source(source.into())
    }

    /// Adds a source to the `ApiError`
    pub fn with_boxed_source(mut self, source: Box<dyn Error + Send + Sync + 'static>) -> Self {
        self.source = Some(source);
        self
    }

    /// Adds the message of a caught panic to the `ApiError`
    pub fn with_panic_message(mut self, message: Option<&str>) -> Self {
        self.panic_message = message.map(str::to_string);
        self
    }

    /// Adds a location to the `ApiError`
    ///
    /// Normally the location which is added automatically is enough.
    pub fn with_manual_location(mut self, location: &'static Location<'static>) -> Self {
        self.location = location;
        self
    }

    /// Creates a closure for wrapping any error into an `ApiError::server_error`
    ///
    /// This is just a less noisy shorthand for `|error| ApiError::server_error("...").with_source(error)`.
    #[track_caller]
    pub fn map_server_error<E: Error + Send + Sync + 'static>(
        context: &'static str,
    ) -> impl Fn(E) -> Self {
        let location = Location::caller();
        move |error| {
            Self::server_error(context)
                .with_source(error)
                .with_manual_location(location)
        }
    }

    /// Emit a tracing event `error!` or `debug!` describing the `ApiError`
    pub fn emit_tracing_event(&self) {
        let Self {
            status_code,
            context,
            location,
            source,
            panic_message,
        } = &self;

        match status_code {
            ApiErrorStatusCode::BadRequest => {
                debug!(
                    error.status_code = status_code.to_http().as_u16(),
                    error.status_message = status_code.to_http().as_str(),
                    error.context = context,
                    error.file = location.file(),
                    error.line = location.line(),
                    error.column = location.column(),
                    error.display = source.as_ref().map(tracing::field::display),
                    error.debug = source.as_ref().map(tracing::field::debug),
                    "Client error"
                );
            }
            ApiErrorStatusCode::ServerError => {
                error!(
                    error.status_code = status_code.to_http().as_u16(),
                    error.status_message = status_code.to_http().as_str(),
                    error.context = context,
                    error.file = location.file(),
                    error.line = location.line(),
                    error.column = location.column(),
                    error.display = source.as_ref().map(tracing::field::display),
                    error.debug = source.as_ref().map(tracing::field::debug),
                    error.panic = panic_message.as_deref(),
                    "Server error"
                );
            }
        }
    }

    /// Constructs a new `ApiError`
    #[track_caller]
    fn new(status_code: ApiErrorStatusCode, context: Option<&'static str>) -> Self {
        Self {
            status_code,
            context,
            location: Location::caller(),
            source: None,
            panic_message: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.emit_tracing_event();

        let status_code = self.status_code.to_http();
        let response = ApiErrorResponse {
            status_code: status_code.as_u16(),
            message: status_code
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string(),
        };

        (status_code, Json(response)).into_response()
    }
}

trait IntoServerError: Into<Box<dyn Error + Send + Sync + 'static>> {}
impl<E: IntoServerError> From<E> for ApiError {
    #[track_caller]
    fn from(value: E) -> Self {
        Self {
            status_code: ApiErrorStatusCode::ServerError,
            context: None,
            location: Location::caller(),
            source: Some(value.into()),
            panic_message: None,
        }
    }
}
impl IntoServerError for serde_json::Error {}
impl IntoServerError for crate::coercion::CoercionError {}
impl IntoServerError for anyhow::Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_contains_context_and_source() {
        let error = ApiError::server_error("Failed to assemble")
            .with_source(std::io::Error::other("disk on fire"));
        let display = error.to_string();
        assert!(display.starts_with("Server Error 'Failed to assemble' cause by 'disk on fire'"));
        assert!(display.contains("api_error.rs"));
    }

    #[test]
    fn response_hides_details() {
        let response = ApiError::bad_request("Invalid operands").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn conversion_from_errors() {
        let json_error = serde_json::from_str::<u8>("x").unwrap_err();
        let error = ApiError::from(json_error);
        assert!(matches!(error.status_code, ApiErrorStatusCode::ServerError));
        assert!(error.source.is_some());
    }
}

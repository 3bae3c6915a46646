//! Core concepts of swagroute
//!
//! - [`ApiRouter`] records a documented routing table next to an axum router
//! - [`fragment`] defines the documentation fragments and how they are merged
//! - [`coercion`] describes how parameter and response types contribute documentation
#![warn(missing_docs)]

pub use self::router::ApiRouter;
pub use self::router::Endpoint;

pub mod re_exports {
    //! Re-exports of crates used in swagroute's public api
    pub use axum;
    pub use schemars;
    pub use serde_json;
}

pub mod api_error;
pub mod coercion;
pub mod fragment;
pub mod identifier;
pub mod middleware;
pub mod router;

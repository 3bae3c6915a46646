//! Serve swagger 2.0 documents generated from your axum routes
//!
//! Routes are registered on a [`ApiRouter`](core::ApiRouter) as documented
//! [`Endpoint`](core::Endpoint)s.
//! Any router can then serve documents describing one or more of its apis
//! through [`OpenapiRouterExt::openapi_route`](openapi::OpenapiRouterExt::openapi_route).

pub mod core {
    //! Re-export of [`swagroute_core`]
    pub use swagroute_core::*;
}

pub use crate::swagroute::*;

pub mod error;
pub mod logging;
pub mod openapi;
pub mod settings;
mod swagroute;

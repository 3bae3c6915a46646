//! A middleware wraps a group of handler to alter their behaviour.
//!
//! The contained traits are essentially simpler versions of [`tower::Layer`]
//! which can describe their effect on the wrapped endpoints' documentation.

use std::convert::Infallible;
use std::ops::ControlFlow;
use std::task::Context;
use std::task::Poll;

use axum::extract::Request;
use axum::response::IntoResponse;
use axum::response::Response;
use futures_lite::future::Boxed;
use tower::Layer;
use tower::Service;

use crate::fragment::DocFragment;

pub mod catch_unwind;

/// A middleware wraps a group of handler to alter their behaviour.
///
/// This trait is an even simpler version of [`ApiMiddleware`].
/// Its methods run before and after the actual endpoint handler,
/// but can't alter the actual execution of the handler.
///
/// If you can't express your logic with this trait,
/// feel free to use `ApiMiddleware` or even [`tower::Layer`] instead.
pub trait SimpleApiMiddleware: Clone + Send + Sync + 'static {
    /// Swagger content this middleware adds to every endpoint it wraps
    ///
    /// For example a `401` response for an authentication middleware.
    fn documentation(&self) -> Option<DocFragment> {
        None
    }

    /// Pre-process a request and might choose to return a response without running the handler.
    fn pre_handler(
        &mut self,
        request: Request,
    ) -> impl Future<Output = ControlFlow<Response, Request>> + Send {
        async move { ControlFlow::Continue(request) }
    }

    /// Post-process the handler's response
    fn post_handler(&mut self, response: Response) -> impl Future<Output = Response> + Send {
        async move { response }
    }
}

/// A middleware wraps a group of handler to alter their behaviour.
///
/// This trait is a simplified version of [`tower::Layer`]s.
/// It is specialized for the usage with swagroute (`axum` under the hood)
/// but can be converted into a `Layer` implementation through the [`MiddlewareLayer`] adapter.
///
/// You can try [`SimpleApiMiddleware`] for the simplest use cases.
///
/// # Restrictions compared to `Layer`
///
/// - only supports [`AxumService`]s (i.e., [`tower::Service`] intended for `axum`)
/// - does not support back-pressure (i.e., `Layer::poll_ready`)
/// - clones `Self` on every request
///
/// Those restrictions seem reasonable for any layer written for axum by an application author.
///
/// If they are too limiting, feel free to user `Layer` instead.
pub trait ApiMiddleware: Clone + Send + Sync + 'static {
    /// Swagger content this middleware adds to every endpoint it wraps
    fn documentation(&self) -> Option<DocFragment> {
        None
    }

    /// Processes a request
    fn call<S: AxumService>(
        self,
        inner: S,
        request: Request,
    ) -> impl Future<Output = Result<Response, Infallible>> + Send + 'static;

    /// Wraps the middleware in an adapter to implement [`tower::Layer`]
    fn into_layer(self) -> MiddlewareLayer<Self>
    where
        Self: Sized,
    {
        MiddlewareLayer(self)
    }
}

impl<T: SimpleApiMiddleware> ApiMiddleware for T {
    fn documentation(&self) -> Option<DocFragment> {
        SimpleApiMiddleware::documentation(self)
    }

    async fn call<S: AxumService>(
        mut self,
        mut inner: S,
        request: Request,
    ) -> Result<Response, Infallible> {
        Ok(match self.pre_handler(request).await {
            ControlFlow::Continue(request) => {
                let response = inner.call(request).await.into_response();
                self.post_handler(response).await
            }
            ControlFlow::Break(response) => response,
        })
    }
}

/// Adapter to implement [`tower::Layer`] for [`ApiMiddleware`]s
#[derive(Copy, Clone, Debug)]
pub struct MiddlewareLayer<M>(pub M);

impl<M, S> Layer<S> for MiddlewareLayer<M>
where
    M: ApiMiddleware,
{
    type Service = MiddlewareService<M, S>;
    fn layer(&self, inner: S) -> Self::Service {
        MiddlewareService {
            inner,
            middleware: self.0.clone(),
        }
    }
}

/// [`tower::Service`] produce by [`MiddlewareLayer`]
#[derive(Copy, Clone, Debug)]
pub struct MiddlewareService<M, S> {
    inner: S,
    middleware: M,
}

impl<M, S> Service<Request> for MiddlewareService<M, S>
where
    M: ApiMiddleware,
    S: AxumService,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Boxed<Result<Response, Infallible>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let not_ready_inner = self.inner.clone();
        let ready_inner = std::mem::replace(&mut self.inner, not_ready_inner);
        let middleware = self.middleware.clone();

        Box::pin(middleware.call(ready_inner, request))
    }
}

/// Trait alias for [`tower::Service`] constraint to be used by axum
pub trait AxumService:
    Service<Request, Error = Infallible, Response: IntoResponse, Future: Send + 'static>
    + Clone
    + Send
    + 'static
{
}
impl<T> AxumService for T where
    T: Service<Request, Error = Infallible, Response: IntoResponse, Future: Send + 'static>
        + Clone
        + Send
        + 'static
{
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    use super::*;
    use crate::router::ApiRouter;
    use crate::router::Endpoint;

    #[derive(Clone)]
    struct RequireHeader;
    impl SimpleApiMiddleware for RequireHeader {
        async fn pre_handler(&mut self, request: Request) -> ControlFlow<Response, Request> {
            if request.headers().contains_key("x-token") {
                ControlFlow::Continue(request)
            } else {
                ControlFlow::Break(StatusCode::UNAUTHORIZED.into_response())
            }
        }
    }

    #[tokio::test]
    async fn pre_handler_short_circuits() {
        let (router, _) = ApiRouter::new()
            .endpoint("/secret", Endpoint::get(|| async { "secret" }))
            .middleware(RequireHeader)
            .finish();

        let denied = router
            .clone()
            .oneshot(http::Request::get("/secret").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

        let allowed = router
            .oneshot(
                http::Request::get("/secret")
                    .header("x-token", "1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(allowed.status(), StatusCode::OK);
    }

    #[test]
    fn undocumented_by_default() {
        assert!(ApiMiddleware::documentation(&RequireHeader).is_none());
    }
}

//! Session registry middleware for tower applications.
//!
//! This module provides [`SessionLayer`], which gives every request its own
//! [`Registry`] so that handlers can resolve sessions through
//! [`SessionStore::get`](crate::SessionStore::get).

use std::task::{Context, Poll};

use http::Request;
use tower::{Layer, Service};
use tower_cookies::Cookies;

use crate::Registry;

/// A Tower Middleware inserting a [`Registry`] into each request.
#[derive(Clone, Debug)]
pub struct SessionService<S> {
    inner: S,
}

impl<ReqBody, S> Service<Request<ReqBody>> for SessionService<S>
where
    S: Service<Request<ReqBody>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    #[inline]
    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        match req.extensions().get::<Cookies>().cloned() {
            Some(cookies) => {
                req.extensions_mut().insert(Registry::new(cookies));
            }
            None => {
                tracing::error!("cookies not found in the request extensions");
            }
        }

        self.inner.call(req)
    }
}

/// Layer to apply [`SessionService`] middleware.
///
/// Must be wrapped by [`tower_cookies::CookieManagerLayer`], i.e. added
/// before it on an axum `Router`.
///
/// # Example
///
/// ```rust
/// use sealstore::SessionLayer;
/// use tower::ServiceBuilder;
/// use tower_cookies::CookieManagerLayer;
///
/// let layers = ServiceBuilder::new()
///     .layer(CookieManagerLayer::new())
///     .layer(SessionLayer::new());
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct SessionLayer;

impl SessionLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for SessionLayer {
    type Service = SessionService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SessionService { inner }
    }
}

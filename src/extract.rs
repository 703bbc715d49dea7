use axum_core::extract::FromRequestParts;
use http::{StatusCode, request::Parts};

use crate::Registry;

/// Axum Extractor for [`Registry`].
impl<S> FromRequestParts<S> for Registry
where
    S: Sync + Send,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Registry>().cloned().ok_or_else(|| {
            tracing::error!("session registry not found in the request extensions");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "session registry not found in the request extensions",
            )
        })
    }
}

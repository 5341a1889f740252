//! Per-request cancellation derived from the application's shutdown token.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::convert::Infallible;
use tokio_util::sync::CancellationToken;

/// A child of the state's root [`CancellationToken`].
///
/// The child is cancelled when the root is (server shutdown) and can be
/// cancelled on its own without affecting other requests. Storage calls made on
/// behalf of the request should race against it.
///
/// ```ignore
/// async fn list(RequestCancellation(token): RequestCancellation) -> impl IntoResponse {
///     service.list(&token).await
/// }
/// ```
pub struct RequestCancellation(pub CancellationToken);

impl<S> FromRequestParts<S> for RequestCancellation
where
    CancellationToken: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(_parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(RequestCancellation(CancellationToken::from_ref(state).child_token()))
    }
}

//! Body extractor that never rejects: malformed or missing JSON becomes `T::default()`.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Like `axum::Json`, but tolerant: any body that does not decode as `T`
/// (empty, not JSON, wrong shape, wrong content type) yields `T::default()`.
#[derive(Debug, Clone, Default)]
pub struct LenientJson<T>(pub T);

impl<T, S> FromRequest<S> for LenientJson<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = match Bytes::from_request(req, state).await {
            Ok(b) => b,
            Err(e) => {
                debug!("unreadable request body, using default: {e}");
                return Ok(Self(T::default()));
            }
        };
        match serde_json::from_slice::<T>(&bytes) {
            Ok(v) => Ok(Self(v)),
            Err(e) => {
                debug!(len = bytes.len(), "undecodable JSON body, using default: {e}");
                Ok(Self(T::default()))
            }
        }
    }
}

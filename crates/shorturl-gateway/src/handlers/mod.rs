mod health;
mod link;
mod redirect;

pub use health::health_handler;
pub use link::{resolve_handler, shorten_handler};
pub use redirect::redirect_handler;

use std::future::Future;

use shorturl_core::ResolveError;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Runs a resolver call under the per-request deadline.
async fn within_deadline<T, F>(state: &AppState, call: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, ResolveError>>,
{
    let timeout = state.request_timeout();
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result.map_err(AppError::from),
        Err(_) => Err(AppError::DeadlineExceeded(timeout)),
    }
}

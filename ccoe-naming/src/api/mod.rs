//! Client for the naming convention service

pub mod client;
pub mod error;
pub mod naming;
pub mod resources;
pub mod vms;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use client::{Client, ClientConfig, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT};
pub use error::ApiError;
pub use naming::{LooseRecord, NamingApi, NamingKind};

use std::future::Future;
use tfplug::context::Context;

/// Runs an API call until it finishes or `ctx` is cancelled, whichever comes first
pub async fn cancellable<T>(
    ctx: &Context,
    call: impl Future<Output = Result<T, ApiError>>,
) -> Result<T, ApiError> {
    tokio::select! {
        biased;
        _ = ctx.cancelled() => Err(ApiError::Cancelled),
        result = call => result,
    }
}

//! Clients for interacting with a mint ledger node: a JSON-RPC transport
//! abstraction, the broadcast/account-lookup [`Provider`] and the
//! [`CommitWatch`] that waits on the node's websocket event stream for a
//! specific transaction to be committed.

mod commit_watch;
mod provider;
pub mod transports;

pub use commit_watch::{Commit, CommitWatch, WaitError, COMMIT_TIMEOUT};
pub use provider::{Account, Provider, Receipt};
pub use transports::{Http, MockProvider, MockResponse, RpcError};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;
use thiserror::Error;

/// Trait which must be implemented by data transports to be used with a
/// mint ledger JSON-RPC provider.
#[async_trait]
pub trait JsonRpcClient: Debug + Send + Sync {
    /// A JSON-RPC Error
    type Error: std::error::Error + Into<ProviderError> + Send + Sync;

    /// Sends a request with the provided method and the params serialized as
    /// JSON
    async fn request<T, R>(&self, method: &str, params: T) -> Result<R, Self::Error>
    where
        T: Serialize + Send + Sync,
        R: DeserializeOwned;
}

/// An error thrown when making a call to the provider
#[derive(Debug, Error)]
pub enum ProviderError {
    /// An internal error in the JSON-RPC client
    #[error(transparent)]
    JsonRpcClientError(Box<dyn std::error::Error + Send + Sync>),

    /// An error during HTTP transport
    #[error(transparent)]
    HTTPError(#[from] reqwest::Error),

    #[error("Deserialization Error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}

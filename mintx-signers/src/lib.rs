//! Remote signing and the sign–broadcast–confirm orchestration.
//!
//! [`RemoteSigner`] exchanges a canonical payload for a signature with a
//! signing daemon over HTTP. [`Client`] ties a signer and a
//! [`mintx_providers::Provider`] together into the full submission pipeline.

mod client;
mod remote;

pub use client::{Client, ClientError, Outcome, SubmitOptions};
pub use remote::{RemoteSigner, SignerError};

use async_trait::async_trait;
use mintx_core::types::{Address, Signature};
use std::fmt::Debug;

/// Trait for signing a canonical transaction payload on behalf of an
/// account.
#[async_trait]
pub trait Signer: Debug + Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Signs the payload with the key held for `address`.
    async fn sign(&self, payload: &[u8], address: Address) -> Result<Signature, Self::Error>;
}

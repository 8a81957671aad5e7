//! mintx
//!
//! Assembles mint ledger transactions, has them signed by a remote signing
//! daemon, broadcasts them over JSON-RPC and, on request, waits on the node's
//! websocket event stream until the transaction is committed.
//!
//! This crate is a facade over the workspace members. Most users want
//! [`signers::Client`] together with a [`providers::Provider`] and a
//! [`signers::RemoteSigner`]:
//!
//! ```no_run
//! use mintx::core::types::{Address, Transaction, TxInput};
//! use mintx::providers::{Http, Provider};
//! use mintx::signers::{Client, RemoteSigner, SubmitOptions};
//! use std::str::FromStr;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let node = url::Url::parse("http://localhost:46657/")?;
//! let provider = Provider::new(Http::new(node.clone()));
//! let signer = RemoteSigner::new(url::Url::parse("http://localhost:4767")?);
//! let client = Client::new(provider, node, "mint-testnet").with_signer(signer);
//!
//! let to = Address::from_str("43AEA1C8F26B3876C39F620CD6186AA433832888")?;
//! let from = Address::from_str("9F6BA3E0338EA4B8D9FBF3256F0FC1F9D5D77D1B")?;
//! let tx = Transaction::send(TxInput::new(from, 100, 5), to, 100);
//! let outcome = client.sign_and_broadcast(tx, SubmitOptions::committed()).await?;
//! # Ok(())
//! # }
//! ```

pub use mintx_core as core;
pub use mintx_providers as providers;
pub use mintx_signers as signers;

pub mod prelude {
    pub use super::core::types::*;
    pub use super::providers::{Http, Provider};
    pub use super::signers::{Client, Outcome, RemoteSigner, Signer, SubmitOptions};
}

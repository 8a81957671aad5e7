//! The sign → broadcast → wait pipeline.

use crate::{RemoteSigner, Signer};

use mintx_core::types::{Address, Bytes, Transaction, TxHash};
use mintx_providers::{CommitWatch, JsonRpcClient, Provider, ProviderError, WaitError};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// A client that sequences signing, broadcasting and waiting for a
/// transaction to be committed.
#[derive(Clone, Debug)]
pub struct Client<P, S = RemoteSigner> {
    provider: Provider<P>,
    node_url: Url,
    chain_id: String,
    signer: Option<S>,
}

/// Which stages of the pipeline to run. All stages default to off; an
/// unsigned, unbroadcast invocation is a deliberate dry run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SubmitOptions {
    pub sign: bool,
    pub broadcast: bool,
    pub wait: bool,
}

impl SubmitOptions {
    /// Sign and broadcast without waiting for the commit event.
    pub fn broadcast() -> Self {
        Self { sign: true, broadcast: true, wait: false }
    }

    /// Sign, broadcast and block until the ledger confirms inclusion.
    pub fn committed() -> Self {
        Self { sign: true, broadcast: true, wait: true }
    }
}

/// The terminal value of a submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Outcome {
    /// The transaction hash from the node's receipt; known as soon as the
    /// broadcast is accepted.
    pub hash: TxHash,

    /// For contract-creating calls, the locally derived contract address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<Address>,

    /// Execution return value, populated only when waiting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_value: Option<Bytes>,

    /// Execution exception, populated only when waiting. This is a
    /// semantic failure reported by the ledger, not a pipeline error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("error calling signing daemon: {0}")]
    Signer(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("no signer configured")]
    NoSigner,

    /// A multi-input transaction was built with an empty input list, so
    /// there is nothing to sign with or correlate commit events against.
    #[error("transaction has no inputs")]
    NoInputs,

    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Subscribing failed before anything was broadcast; nothing was
    /// submitted.
    #[error("error subscribing to commit events: {0}")]
    Subscription(#[source] WaitError),

    /// The node accepted the transaction but observing its confirmation
    /// failed. The receipt's hash survives in the error.
    #[error("transaction {hash} was accepted but confirmation failed: {source}")]
    Confirmation {
        hash: TxHash,
        #[source]
        source: WaitError,
    },
}

impl<P, S> Client<P, S>
where
    P: JsonRpcClient,
    S: Signer,
{
    /// Creates a client against a node. `node_url` doubles as the base the
    /// websocket event endpoint is derived from.
    pub fn new(provider: Provider<P>, node_url: Url, chain_id: impl Into<String>) -> Self {
        Self { provider, node_url, chain_id: chain_id.into(), signer: None }
    }

    /// Sets the signer used when submission requests signing.
    pub fn with_signer(mut self, signer: S) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Returns a reference to the client's provider
    pub fn provider(&self) -> &Provider<P> {
        &self.provider
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    /// Computes the transaction's sign bytes, exchanges them for a
    /// signature keyed by the primary input address, and injects the
    /// signature into that input's slot.
    pub async fn sign_transaction(&self, tx: &mut Transaction) -> Result<(), ClientError> {
        let signer = self.signer.as_ref().ok_or(ClientError::NoSigner)?;
        let sign_bytes = tx.sign_bytes(&self.chain_id);
        let input = tx.signable_input().ok_or(ClientError::NoInputs)?;
        let signature = signer
            .sign(&sign_bytes, input.address)
            .await
            .map_err(|e| ClientError::Signer(Box::new(e)))?;
        debug!(addr = %input.address, "signature received");
        *input.signature = Some(signature);
        Ok(())
    }

    /// Runs the pipeline stages selected in `options`.
    ///
    /// Returns `Ok(None)` when broadcasting was not requested (dry run). A
    /// signing failure aborts before anything reaches the network. When
    /// waiting, the subscription is live before the transaction is
    /// broadcast, so the commit event cannot slip past between the two.
    pub async fn sign_and_broadcast(
        &self,
        mut tx: Transaction,
        options: SubmitOptions,
    ) -> Result<Option<Outcome>, ClientError> {
        if options.sign {
            self.sign_transaction(&mut tx).await?;
        }

        if !options.broadcast {
            return Ok(None);
        }

        let watch = if options.wait {
            let input_address = tx.input_address().ok_or(ClientError::NoInputs)?;
            let watch = CommitWatch::subscribe(
                &self.node_url,
                &self.chain_id,
                input_address,
                tx.tx_id(&self.chain_id),
            )
            .await
            .map_err(ClientError::Subscription)?;
            Some(watch)
        } else {
            None
        };

        let receipt = self.provider.broadcast_tx(&tx).await?;
        let mut outcome = Outcome {
            hash: receipt.tx_hash,
            contract_address: tx.created_contract_address(),
            return_value: None,
            exception: None,
        };

        if let Some(watch) = watch {
            debug!(hash = %outcome.hash, "waiting for transaction to be committed");
            match watch.wait().await {
                Ok(commit) => {
                    outcome.return_value = Some(commit.return_value);
                    outcome.exception = commit.exception;
                }
                // the broadcast already succeeded; keep the hash next to
                // the confirmation failure instead of erasing it
                Err(source) => {
                    return Err(ClientError::Confirmation { hash: outcome.hash, source })
                }
            }
        }

        Ok(Some(outcome))
    }
}

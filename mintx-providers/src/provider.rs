use crate::{transports::MockProvider, JsonRpcClient, ProviderError};

use mintx_core::types::{Address, PublicKey, Transaction, TxHash};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt::Debug;

/// The node's acknowledgment that a transaction was accepted into its
/// pending pool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Receipt {
    pub tx_hash: TxHash,
}

/// An account record as returned by the node's account lookup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub address: Address,
    #[serde(default)]
    pub pub_key: Option<PublicKey>,
    pub sequence: u64,
    #[serde(default)]
    pub balance: u64,
}

/// An abstract provider for submitting transactions to a mint ledger node
/// over a [`JsonRpcClient`] transport.
#[derive(Clone, Debug)]
pub struct Provider<P> {
    inner: P,
}

impl<P: JsonRpcClient> Provider<P> {
    /// Instantiate a new provider with a backing transport.
    pub fn new(transport: P) -> Self {
        Self { inner: transport }
    }

    /// The backing transport.
    pub fn as_ref(&self) -> &P {
        &self.inner
    }

    async fn request<T, R>(&self, method: &str, params: T) -> Result<R, ProviderError>
    where
        T: Serialize + Send + Sync,
        R: DeserializeOwned,
    {
        self.inner.request(method, params).await.map_err(Into::into)
    }

    /// Submits a signed transaction to the node's pending pool.
    ///
    /// Node rejections are returned verbatim; nothing here interprets
    /// node-specific error strings.
    pub async fn broadcast_tx(&self, tx: &Transaction) -> Result<Receipt, ProviderError> {
        self.request("broadcast_tx", (tx,)).await
    }

    /// Looks up an account record by address.
    pub async fn get_account(&self, address: Address) -> Result<Account, ProviderError> {
        self.request("get_account", (address,)).await
    }

    /// The sequence number the account's next transaction must carry.
    pub async fn next_sequence(&self, address: Address) -> Result<u64, ProviderError> {
        let account = self.get_account(address).await?;
        Ok(account.sequence + 1)
    }
}

impl Provider<MockProvider> {
    /// Returns a `Provider` instantiated with an internal "mock" transport.
    pub fn mocked() -> (Self, MockProvider) {
        let mock = MockProvider::new();
        let provider = Self::new(mock.clone());
        (provider, mock)
    }
}

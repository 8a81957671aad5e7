use crate::{JsonRpcClient, ProviderError};

use super::common::{Request, Response, RpcError};
use async_trait::async_trait;
use reqwest::{Client, Error as ReqwestError};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fmt::Debug,
    str::FromStr,
    sync::atomic::{AtomicU64, Ordering},
};
use thiserror::Error;
use url::Url;

/// A low-level JSON-RPC Client over HTTP.
///
/// # Example
///
/// ```no_run
/// use mintx_providers::{Http, JsonRpcClient};
/// use std::str::FromStr;
///
/// # async fn foo() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = Http::from_str("http://localhost:46657/")?;
/// let status: serde_json::Value = transport.request("status", ()).await?;
/// # Ok(())
/// # }
/// ```
pub struct Http {
    id: AtomicU64,
    client: Client,
    url: Url,
}

impl Debug for Http {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Http {{ id: {:?}, url: {} }}", self.id, self.url)
    }
}

#[derive(Error, Debug)]
/// Error thrown when sending an HTTP request
pub enum HttpClientError {
    /// Thrown if the request failed
    #[error(transparent)]
    ReqwestError(#[from] ReqwestError),

    /// Thrown if the node rejected the request
    #[error(transparent)]
    RpcError(#[from] RpcError),

    #[error("Deserialization Error: {err}. Response: {text}")]
    /// Serde JSON Error
    SerdeJson { err: serde_json::Error, text: String },
}

impl From<HttpClientError> for ProviderError {
    fn from(src: HttpClientError) -> Self {
        match src {
            HttpClientError::ReqwestError(err) => ProviderError::HTTPError(err),
            _ => ProviderError::JsonRpcClientError(Box::new(src)),
        }
    }
}

#[async_trait]
impl JsonRpcClient for Http {
    type Error = HttpClientError;

    /// Sends a POST request with the provided method and the params serialized
    /// as JSON over HTTP
    async fn request<T, R>(&self, method: &str, params: T) -> Result<R, HttpClientError>
    where
        T: Serialize + Send + Sync,
        R: DeserializeOwned,
    {
        let next_id = self.id.fetch_add(1, Ordering::SeqCst).to_string();
        let payload = Request::new(&next_id, method, params);

        let res = self.client.post(self.url.as_ref()).json(&payload).send().await?;
        let body = res.bytes().await?;

        let response: Response<R> = serde_json::from_slice(&body).map_err(|err| {
            HttpClientError::SerdeJson { err, text: String::from_utf8_lossy(&body).to_string() }
        })?;

        Ok(response.into_result()?)
    }
}

impl Http {
    /// Initializes a new HTTP Client
    pub fn new(url: impl Into<Url>) -> Self {
        Self::new_with_client(url, Client::new())
    }

    /// The Url to which requests are made
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Allows to customize the transport by providing your own http client
    pub fn new_with_client(url: impl Into<Url>, client: Client) -> Self {
        Self { id: AtomicU64::new(1), client, url: url.into() }
    }
}

impl FromStr for Http {
    type Err = url::ParseError;

    fn from_str(src: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(src)?;
        Ok(Http::new(url))
    }
}

impl Clone for Http {
    fn clone(&self) -> Self {
        Self { id: AtomicU64::new(1), client: self.client.clone(), url: self.url.clone() }
    }
}

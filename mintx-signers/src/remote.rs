//! HTTP client for the remote signing daemon.

use crate::Signer;
use async_trait::async_trait;
use mintx_core::types::{Address, Signature};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

/// A signer that delegates to a signing daemon over HTTP, keyed by account
/// address. One outbound request per call; retry policy belongs to the
/// caller.
#[derive(Clone, Debug)]
pub struct RemoteSigner {
    url: Url,
    client: reqwest::Client,
}

/// Error thrown when exchanging a payload for a signature
#[derive(Debug, Error)]
pub enum SignerError {
    /// Rejected locally, before any request is issued
    #[error("cannot sign an empty payload")]
    EmptyPayload,

    /// The configured daemon URL cannot carry the /sign path
    #[error("invalid signing daemon endpoint: {0}")]
    Endpoint(#[from] url::ParseError),

    /// Thrown if the exchange itself failed
    #[error("error calling signing daemon: {0}")]
    Transport(#[from] reqwest::Error),

    /// Thrown on a non-2xx response
    #[error("signing daemon returned {0}")]
    Status(reqwest::StatusCode),

    /// An application-level error reported by the daemon; distinct from a
    /// transport failure
    #[error("signing daemon error: {0}")]
    Service(String),

    /// Thrown if the returned signature was not valid hex
    #[error("signature is bad hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// Thrown if the returned signature had the wrong size
    #[error("signature must be 64 bytes, got {0}")]
    InvalidLength(usize),
}

#[derive(Serialize)]
struct SignRequest {
    hash: String,
    addr: String,
}

#[derive(Deserialize)]
struct SignResponse {
    #[serde(rename = "Response", default)]
    response: String,
    #[serde(rename = "Error", default)]
    error: String,
}

impl RemoteSigner {
    /// Creates a signer talking to the daemon at `url`.
    pub fn new(mut url: Url) -> Self {
        // normalize so the /sign path joins cleanly
        if !url.path().ends_with('/') {
            url.set_path(&format!("{}/", url.path()));
        }
        Self { url, client: reqwest::Client::new() }
    }

    /// The daemon endpoint requests are made against.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl Signer for RemoteSigner {
    type Error = SignerError;

    async fn sign(&self, payload: &[u8], address: Address) -> Result<Signature, SignerError> {
        if payload.is_empty() {
            return Err(SignerError::EmptyPayload);
        }
        let body = SignRequest {
            hash: hex::encode_upper(payload),
            addr: address.to_string(),
        };
        let url = self.url.join("sign")?;
        debug!(addr = %address, url = %url, "requesting signature");

        let res = self.client.post(url).json(&body).send().await?;
        if !res.status().is_success() {
            return Err(SignerError::Status(res.status()));
        }
        let response: SignResponse = res.json().await?;
        parse_sign_response(response)
    }
}

fn parse_sign_response(response: SignResponse) -> Result<Signature, SignerError> {
    // a daemon-reported error invalidates the whole response, regardless of
    // what the Response field carries
    if !response.error.is_empty() {
        return Err(SignerError::Service(response.error));
    }
    let bytes = hex::decode(&response.response)?;
    Signature::from_slice(&bytes).map_err(|_| SignerError::InvalidLength(bytes.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn addr() -> Address {
        Address::from_str("9F6BA3E0338EA4B8D9FBF3256F0FC1F9D5D77D1B").unwrap()
    }

    #[tokio::test]
    async fn empty_payload_fails_before_any_request() {
        // an unroutable endpoint: reaching the network would error
        // differently than EmptyPayload
        let signer = RemoteSigner::new(Url::parse("http://255.255.255.255:1").unwrap());
        let err = signer.sign(&[], addr()).await.unwrap_err();
        assert!(matches!(err, SignerError::EmptyPayload));
    }

    #[tokio::test]
    async fn non_base_endpoint_is_an_error_not_a_panic() {
        let signer = RemoteSigner::new(Url::parse("mailto:signer@example.org").unwrap());
        let err = signer.sign(&[1u8], addr()).await.unwrap_err();
        assert!(matches!(err, SignerError::Endpoint(_)));
    }

    #[test]
    fn daemon_error_never_yields_a_signature() {
        let response = SignResponse {
            response: hex::encode_upper([7u8; 64]),
            error: "unknown address".to_string(),
        };
        let err = parse_sign_response(response).unwrap_err();
        assert!(matches!(err, SignerError::Service(ref s) if s == "unknown address"));
    }

    #[test]
    fn malformed_signature_hex_is_an_error() {
        let response = SignResponse { response: "zz".to_string(), error: String::new() };
        assert!(matches!(parse_sign_response(response).unwrap_err(), SignerError::InvalidHex(_)));
    }

    #[test]
    fn short_signature_is_an_error() {
        let response = SignResponse { response: "AABB".to_string(), error: String::new() };
        assert!(matches!(
            parse_sign_response(response).unwrap_err(),
            SignerError::InvalidLength(2)
        ));
    }

    #[test]
    fn valid_signature_decodes() {
        let response =
            SignResponse { response: hex::encode_upper([7u8; 64]), error: String::new() };
        assert_eq!(parse_sign_response(response).unwrap(), Signature([7u8; 64]));
    }

    #[test]
    fn base_url_is_normalized_for_path_join() {
        let signer = RemoteSigner::new(Url::parse("http://localhost:4767").unwrap());
        assert_eq!(signer.url().join("sign").unwrap().as_str(), "http://localhost:4767/sign");
    }
}

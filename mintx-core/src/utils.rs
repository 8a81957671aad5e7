//! Hashing helpers shared by the transaction model.

use crate::types::{Address, PublicKey, TxHash};
use sha2::{Digest, Sha256};

/// Compute the SHA-256 digest of all the given data.
pub fn sha256<T: AsRef<[u8]>>(bytes: T) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(bytes.as_ref());
    hasher.finalize().into()
}

/// The chain-scoped identity of canonical transaction bytes.
pub fn tx_hash(sign_bytes: &[u8]) -> TxHash {
    TxHash(sha256(sign_bytes))
}

/// Derive the address a contract-creating call will deploy to.
///
/// The node derives the same address, but a client must never trust it from
/// the wire: it is a pure function of the creator and the creator's
/// pre-increment sequence number.
pub fn contract_address(creator: &Address, sequence: u64) -> Address {
    let mut hasher = Sha256::new();
    hasher.update(creator.as_bytes());
    hasher.update(sequence.to_be_bytes());
    let digest = hasher.finalize();
    let mut out = [0u8; Address::LEN];
    out.copy_from_slice(&digest[..Address::LEN]);
    Address(out)
}

/// Derive an account address from its ed25519 public key.
pub fn address_from_pub_key(pub_key: &PublicKey) -> Address {
    let digest = sha256(pub_key.as_bytes());
    let mut out = [0u8; Address::LEN];
    out.copy_from_slice(&digest[..Address::LEN]);
    Address(out)
}

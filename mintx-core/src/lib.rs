//! Mint ledger data types and canonical encodings.
//!
//! This library provides the transaction variants understood by a mint ledger
//! node, their canonical sign-byte encoding (the payload a signing daemon
//! signs over) and the chain-scoped transaction identity derived from it.
//! _It is recommended to use the `types` and `utils` re-exports to simplify
//! your imports._

pub mod types;
pub mod utils;

pub use types::ParseError;

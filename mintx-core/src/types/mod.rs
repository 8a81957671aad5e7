//! Primitive newtypes and transaction types.

mod events;
mod permissions;
mod transaction;

pub use events::{acc_input_event, TxEvent};
pub use permissions::{PermArgs, Permission};
pub use transaction::{
    BondTx, CallTx, NameTx, PermissionsTx, RebondTx, SendTx, SignableInput, Transaction, TxInput,
    TxOutput, UnbondTx,
};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Error thrown when parsing primitives out of user supplied strings.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The string was not valid hex
    #[error("{0} is bad hex: {1}")]
    InvalidHex(&'static str, hex::FromHexError),

    /// The hex decoded to the wrong number of bytes
    #[error("{0} must be {1} bytes, got {2}")]
    InvalidLength(&'static str, usize, usize),

    /// A required field was not supplied
    #[error("{0} must be given")]
    Missing(&'static str),

    /// A boolean argument was neither "true" nor "false"
    #[error("unknown boolean value {0:?}, expected true or false")]
    InvalidBool(String),

    /// The permission name is not known to the ledger
    #[error("unknown permission {0:?}")]
    UnknownPermission(String),

    /// The permission function is not one the PermissionsTx supports
    #[error("invalid permission function {0:?}")]
    UnknownPermFunction(String),

    /// A permission function received the wrong number of arguments
    #[error("{0} takes {1} arguments, got {2}")]
    WrongArgCount(&'static str, usize, usize),
}

macro_rules! fixed_hex {
    ($(#[$doc:meta])* $name:ident, $len:expr) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub [u8; $len]);

        impl Default for $name {
            fn default() -> Self {
                Self([0u8; $len])
            }
        }

        impl $name {
            pub const LEN: usize = $len;

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// Builds the value out of a byte slice, checking the length.
            pub fn from_slice(bytes: &[u8]) -> Result<Self, ParseError> {
                if bytes.len() != $len {
                    return Err(ParseError::InvalidLength(
                        stringify!($name),
                        $len,
                        bytes.len(),
                    ));
                }
                let mut out = [0u8; $len];
                out.copy_from_slice(bytes);
                Ok(Self(out))
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode_upper(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl FromStr for $name {
            type Err = ParseError;

            fn from_str(src: &str) -> Result<Self, Self::Err> {
                let bytes = hex::decode(src)
                    .map_err(|e| ParseError::InvalidHex(stringify!($name), e))?;
                Self::from_slice(&bytes)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&hex::encode_upper(self.0))
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let value = String::deserialize(deserializer)?;
                value.parse().map_err(de::Error::custom)
            }
        }
    };
}

fixed_hex!(
    /// A 20 byte account address, rendered as uppercase hex.
    Address,
    20
);
fixed_hex!(
    /// A 32 byte chain-scoped transaction identity.
    TxHash,
    32
);
fixed_hex!(
    /// An ed25519 public key.
    PublicKey,
    32
);
fixed_hex!(
    /// An ed25519 signature as returned by the signing daemon.
    Signature,
    64
);

/// Wrapper around `Vec<u8>` that serializes as a bare uppercase hex string,
/// matching the node's wire convention for data payloads and return values.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Bytes(pub Vec<u8>);

impl Bytes {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl AsRef<[u8]> for Bytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(src: Vec<u8>) -> Self {
        Self(src)
    }
}

impl fmt::Display for Bytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(&self.0))
    }
}

impl FromStr for Bytes {
    type Err = ParseError;

    fn from_str(src: &str) -> Result<Self, Self::Err> {
        hex::decode(src)
            .map(Bytes)
            .map_err(|e| ParseError::InvalidHex("data", e))
    }
}

impl Serialize for Bytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode_upper(&self.0))
    }
}

impl<'de> Deserialize<'de> for Bytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_formats_addresses() {
        let addr: Address = "9F6BA3E0338EA4B8D9FBF3256F0FC1F9D5D77D1B".parse().unwrap();
        assert_eq!(addr.to_string(), "9F6BA3E0338EA4B8D9FBF3256F0FC1F9D5D77D1B");
        // lowercase input is accepted, output is canonical uppercase
        let lower: Address = "9f6ba3e0338ea4b8d9fbf3256f0fc1f9d5d77d1b".parse().unwrap();
        assert_eq!(addr, lower);
    }

    #[test]
    fn rejects_bad_hex() {
        let err = "zz".parse::<Address>().unwrap_err();
        assert!(matches!(err, ParseError::InvalidHex("Address", _)));
    }

    #[test]
    fn rejects_wrong_length() {
        let err = "AABB".parse::<Address>().unwrap_err();
        assert!(matches!(err, ParseError::InvalidLength("Address", 20, 2)));
    }

    #[test]
    fn bytes_round_trips_through_serde() {
        let data: Bytes = "DEADBEEF".parse().unwrap();
        let json = serde_json::to_string(&data).unwrap();
        assert_eq!(json, "\"DEADBEEF\"");
        let back: Bytes = serde_json::from_str(&json).unwrap();
        assert_eq!(back, data);
    }
}

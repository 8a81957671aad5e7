//! Transaction variants and their canonical sign-byte encoding.
//!
//! A transaction serializes on the wire as a tagged JSON tuple
//! `[type_id, payload]`. The sign bytes are a separate, deterministic
//! document scoped by the chain identifier and stripped of the public key
//! and signature slots, so the payload a signer commits to is reproducible
//! and cannot be replayed across chains.

use super::{Address, Bytes, PermArgs, PublicKey, Signature, TxHash};
use crate::utils;
use serde::{de, ser::SerializeTuple, Deserialize, Deserializer, Serialize, Serializer};

pub const TYPE_SEND: u8 = 0x01;
pub const TYPE_CALL: u8 = 0x02;
pub const TYPE_NAME: u8 = 0x03;
pub const TYPE_BOND: u8 = 0x11;
pub const TYPE_UNBOND: u8 = 0x12;
pub const TYPE_REBOND: u8 = 0x13;
pub const TYPE_PERMISSIONS: u8 = 0x20;

/// A value-bearing input to a transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    pub address: Address,
    pub amount: u64,
    pub sequence: u64,
    #[serde(default)]
    pub pub_key: Option<PublicKey>,
    #[serde(default)]
    pub signature: Option<Signature>,
}

impl TxInput {
    pub fn new(address: Address, amount: u64, sequence: u64) -> Self {
        Self { address, amount, sequence, pub_key: None, signature: None }
    }

    pub fn with_pub_key(mut self, pub_key: PublicKey) -> Self {
        self.pub_key = Some(pub_key);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    pub address: Address,
    pub amount: u64,
}

impl TxOutput {
    pub fn new(address: Address, amount: u64) -> Self {
        Self { address, amount }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendTx {
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallTx {
    pub input: TxInput,
    /// Target contract. `None` creates a new contract.
    pub address: Option<Address>,
    pub gas_limit: u64,
    pub fee: u64,
    pub data: Bytes,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameTx {
    pub input: TxInput,
    pub name: String,
    pub data: Bytes,
    pub fee: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionsTx {
    pub input: TxInput,
    pub args: PermArgs,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondTx {
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbondTx {
    pub address: Address,
    pub height: u64,
    #[serde(default)]
    pub signature: Option<Signature>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebondTx {
    pub address: Address,
    pub height: u64,
    #[serde(default)]
    pub signature: Option<Signature>,
}

/// The variants of transaction a mint ledger node accepts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transaction {
    Send(SendTx),
    Call(CallTx),
    Name(NameTx),
    Permissions(PermissionsTx),
    Bond(BondTx),
    Unbond(UnbondTx),
    Rebond(RebondTx),
}

/// The primary input of a transaction: the address the signer is keyed by
/// and the slot its signature is injected into.
///
/// Multi-input variants sign with their first input.
pub struct SignableInput<'a> {
    pub address: Address,
    pub signature: &'a mut Option<Signature>,
}

impl Transaction {
    pub fn send(input: TxInput, to: Address, amount: u64) -> Self {
        Self::Send(SendTx { inputs: vec![input], outputs: vec![TxOutput::new(to, amount)] })
    }

    pub fn call(
        input: TxInput,
        address: Option<Address>,
        gas_limit: u64,
        fee: u64,
        data: Bytes,
    ) -> Self {
        Self::Call(CallTx { input, address, gas_limit, fee, data })
    }

    pub fn name(input: TxInput, name: String, data: Bytes, fee: u64) -> Self {
        Self::Name(NameTx { input, name, data, fee })
    }

    pub fn permissions(input: TxInput, args: PermArgs) -> Self {
        Self::Permissions(PermissionsTx { input, args })
    }

    pub fn bond(input: TxInput, validator: Address, amount: u64) -> Self {
        Self::Bond(BondTx { inputs: vec![input], outputs: vec![TxOutput::new(validator, amount)] })
    }

    pub fn unbond(address: Address, height: u64) -> Self {
        Self::Unbond(UnbondTx { address, height, signature: None })
    }

    pub fn rebond(address: Address, height: u64) -> Self {
        Self::Rebond(RebondTx { address, height, signature: None })
    }

    pub fn type_id(&self) -> u8 {
        match self {
            Self::Send(_) => TYPE_SEND,
            Self::Call(_) => TYPE_CALL,
            Self::Name(_) => TYPE_NAME,
            Self::Permissions(_) => TYPE_PERMISSIONS,
            Self::Bond(_) => TYPE_BOND,
            Self::Unbond(_) => TYPE_UNBOND,
            Self::Rebond(_) => TYPE_REBOND,
        }
    }

    /// The address of the primary input, used to key the remote signer and
    /// to derive the commit event identifier. `None` when a multi-input
    /// variant carries no inputs at all.
    pub fn input_address(&self) -> Option<Address> {
        match self {
            Self::Send(t) => t.inputs.first().map(|i| i.address),
            Self::Call(t) => Some(t.input.address),
            Self::Name(t) => Some(t.input.address),
            Self::Permissions(t) => Some(t.input.address),
            Self::Bond(t) => t.inputs.first().map(|i| i.address),
            Self::Unbond(t) => Some(t.address),
            Self::Rebond(t) => Some(t.address),
        }
    }

    /// Exposes the primary input's signature slot for injection. `None` when
    /// a multi-input variant carries no inputs at all.
    pub fn signable_input(&mut self) -> Option<SignableInput<'_>> {
        match self {
            Self::Send(t) => first_input(&mut t.inputs),
            Self::Call(t) => Some(SignableInput {
                address: t.input.address,
                signature: &mut t.input.signature,
            }),
            Self::Name(t) => Some(SignableInput {
                address: t.input.address,
                signature: &mut t.input.signature,
            }),
            Self::Permissions(t) => Some(SignableInput {
                address: t.input.address,
                signature: &mut t.input.signature,
            }),
            Self::Bond(t) => first_input(&mut t.inputs),
            Self::Unbond(t) => Some(SignableInput {
                address: t.address,
                signature: &mut t.signature,
            }),
            Self::Rebond(t) => Some(SignableInput {
                address: t.address,
                signature: &mut t.signature,
            }),
        }
    }

    /// The canonical, signature-free byte encoding signed over, scoped by
    /// the chain identifier.
    pub fn sign_bytes(&self, chain_id: &str) -> Vec<u8> {
        match self {
            Self::Send(t) => sign_doc(
                chain_id,
                TYPE_SEND,
                SendSign { inputs: inputs_sign(&t.inputs), outputs: &t.outputs },
            ),
            Self::Call(t) => sign_doc(
                chain_id,
                TYPE_CALL,
                CallSign {
                    address: &t.address,
                    data: &t.data,
                    fee: t.fee,
                    gas_limit: t.gas_limit,
                    input: input_sign(&t.input),
                },
            ),
            Self::Name(t) => sign_doc(
                chain_id,
                TYPE_NAME,
                NameSign { data: &t.data, fee: t.fee, input: input_sign(&t.input), name: &t.name },
            ),
            Self::Permissions(t) => sign_doc(
                chain_id,
                TYPE_PERMISSIONS,
                PermissionsSign { args: &t.args, input: input_sign(&t.input) },
            ),
            Self::Bond(t) => sign_doc(
                chain_id,
                TYPE_BOND,
                SendSign { inputs: inputs_sign(&t.inputs), outputs: &t.outputs },
            ),
            Self::Unbond(t) => sign_doc(
                chain_id,
                TYPE_UNBOND,
                HeightSign { address: &t.address, height: t.height },
            ),
            Self::Rebond(t) => sign_doc(
                chain_id,
                TYPE_REBOND,
                HeightSign { address: &t.address, height: t.height },
            ),
        }
    }

    /// Chain-scoped transaction identity, used to correlate commit events.
    pub fn tx_id(&self, chain_id: &str) -> TxHash {
        utils::tx_hash(&self.sign_bytes(chain_id))
    }

    /// For a contract-creating call, the address the contract will deploy
    /// to; `None` for every other transaction.
    pub fn created_contract_address(&self) -> Option<Address> {
        match self {
            Self::Call(t) if t.address.is_none() => {
                Some(utils::contract_address(&t.input.address, t.input.sequence))
            }
            _ => None,
        }
    }
}

fn first_input(inputs: &mut [TxInput]) -> Option<SignableInput<'_>> {
    inputs
        .first_mut()
        .map(|i| SignableInput { address: i.address, signature: &mut i.signature })
}

// ---------------------------------------------------------------------------
// sign document

// Field declaration order below is the canonical field order of the sign
// document. Changing it invalidates every signature ever produced.

#[derive(Serialize)]
struct SignDoc<'a, T: Serialize> {
    chain_id: &'a str,
    tx: (u8, T),
}

#[derive(Serialize)]
struct InputSign<'a> {
    address: &'a Address,
    amount: u64,
    sequence: u64,
}

#[derive(Serialize)]
struct SendSign<'a> {
    inputs: Vec<InputSign<'a>>,
    outputs: &'a [TxOutput],
}

#[derive(Serialize)]
struct CallSign<'a> {
    address: &'a Option<Address>,
    data: &'a Bytes,
    fee: u64,
    gas_limit: u64,
    input: InputSign<'a>,
}

#[derive(Serialize)]
struct NameSign<'a> {
    data: &'a Bytes,
    fee: u64,
    input: InputSign<'a>,
    name: &'a str,
}

#[derive(Serialize)]
struct PermissionsSign<'a> {
    args: &'a PermArgs,
    input: InputSign<'a>,
}

#[derive(Serialize)]
struct HeightSign<'a> {
    address: &'a Address,
    height: u64,
}

fn input_sign(input: &TxInput) -> InputSign<'_> {
    InputSign { address: &input.address, amount: input.amount, sequence: input.sequence }
}

fn inputs_sign(inputs: &[TxInput]) -> Vec<InputSign<'_>> {
    inputs.iter().map(input_sign).collect()
}

fn sign_doc<T: Serialize>(chain_id: &str, type_id: u8, payload: T) -> Vec<u8> {
    // the sign document is built from plain structs and strings, so
    // serialization cannot fail
    serde_json::to_vec(&SignDoc { chain_id, tx: (type_id, payload) })
        .expect("sign document serialization is infallible")
}

// ---------------------------------------------------------------------------
// wire form: `[type_id, payload]`

impl Serialize for Transaction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.type_id())?;
        match self {
            Self::Send(t) => tuple.serialize_element(t)?,
            Self::Call(t) => tuple.serialize_element(t)?,
            Self::Name(t) => tuple.serialize_element(t)?,
            Self::Permissions(t) => tuple.serialize_element(t)?,
            Self::Bond(t) => tuple.serialize_element(t)?,
            Self::Unbond(t) => tuple.serialize_element(t)?,
            Self::Rebond(t) => tuple.serialize_element(t)?,
        }
        tuple.end()
    }
}

impl<'de> Deserialize<'de> for Transaction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (type_id, payload): (u8, serde_json::Value) = Deserialize::deserialize(deserializer)?;
        let tx = match type_id {
            TYPE_SEND => Self::Send(from_payload(payload)?),
            TYPE_CALL => Self::Call(from_payload(payload)?),
            TYPE_NAME => Self::Name(from_payload(payload)?),
            TYPE_PERMISSIONS => Self::Permissions(from_payload(payload)?),
            TYPE_BOND => Self::Bond(from_payload(payload)?),
            TYPE_UNBOND => Self::Unbond(from_payload(payload)?),
            TYPE_REBOND => Self::Rebond(from_payload(payload)?),
            other => {
                return Err(de::Error::custom(format!("unknown transaction type {other:#04x}")))
            }
        };
        Ok(tx)
    }
}

fn from_payload<T: de::DeserializeOwned, E: de::Error>(payload: serde_json::Value) -> Result<T, E> {
    serde_json::from_value(payload).map_err(de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PermArgs, Permission};
    use std::str::FromStr;

    const CHAIN: &str = "mint-testnet";

    fn input() -> TxInput {
        TxInput::new(
            Address::from_str("9F6BA3E0338EA4B8D9FBF3256F0FC1F9D5D77D1B").unwrap(),
            100,
            5,
        )
    }

    fn to_addr() -> Address {
        Address::from_str("AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA").unwrap()
    }

    fn all_kinds() -> Vec<Transaction> {
        vec![
            Transaction::send(input(), to_addr(), 100),
            Transaction::call(input(), Some(to_addr()), 1000, 2, "01020304".parse().unwrap()),
            Transaction::call(input(), None, 1000, 2, "60606040".parse().unwrap()),
            Transaction::name(input(), "myname".into(), "BEEF".parse().unwrap(), 4),
            Transaction::permissions(
                input(),
                PermArgs::SetBase { address: to_addr(), permission: Permission::Send, value: true },
            ),
            Transaction::bond(input(), to_addr(), 100),
            Transaction::unbond(to_addr(), 12345),
            Transaction::rebond(to_addr(), 12345),
        ]
    }

    #[test]
    fn sign_bytes_stable_under_reserialization() {
        for tx in all_kinds() {
            let wire = serde_json::to_string(&tx).unwrap();
            let decoded: Transaction = serde_json::from_str(&wire).unwrap();
            assert_eq!(decoded.sign_bytes(CHAIN), tx.sign_bytes(CHAIN), "kind {}", tx.type_id());
            assert_eq!(decoded, tx);
        }
    }

    #[test]
    fn sign_bytes_exclude_signature() {
        for mut tx in all_kinds() {
            let before = tx.sign_bytes(CHAIN);
            *tx.signable_input().unwrap().signature = Some(Signature([3u8; 64]));
            assert_eq!(tx.sign_bytes(CHAIN), before, "kind {}", tx.type_id());
        }
    }

    #[test]
    fn sign_bytes_scoped_by_chain_id() {
        let tx = Transaction::send(input(), to_addr(), 100);
        assert_ne!(tx.sign_bytes("chain-a"), tx.sign_bytes("chain-b"));
        assert_ne!(tx.tx_id("chain-a"), tx.tx_id("chain-b"));
    }

    #[test]
    fn identity_differs_per_transaction() {
        let a = Transaction::send(input(), to_addr(), 100);
        let mut other_input = input();
        other_input.sequence += 1;
        let b = Transaction::send(other_input, to_addr(), 100);
        // same sender, different transaction: identities must not collide
        assert_ne!(a.tx_id(CHAIN), b.tx_id(CHAIN));
    }

    #[test]
    fn signable_input_targets_first_input() {
        let mut tx = Transaction::send(input(), to_addr(), 100);
        let slot = tx.signable_input().unwrap();
        assert_eq!(slot.address, input().address);
        *slot.signature = Some(Signature([9u8; 64]));
        match tx {
            Transaction::Send(t) => assert_eq!(t.inputs[0].signature, Some(Signature([9u8; 64]))),
            _ => unreachable!(),
        }
    }

    #[test]
    fn contract_address_only_for_creation_calls() {
        let create = Transaction::call(input(), None, 1000, 2, Bytes::default());
        let invoke = Transaction::call(input(), Some(to_addr()), 1000, 2, Bytes::default());
        let derived = create.created_contract_address().unwrap();
        assert_eq!(derived, utils::contract_address(&input().address, 5));
        assert!(invoke.created_contract_address().is_none());
        assert!(Transaction::send(input(), to_addr(), 1).created_contract_address().is_none());
    }

    #[test]
    fn empty_input_list_has_no_primary_input() {
        // public fields and the wire form both admit an empty input list
        let mut tx: Transaction = serde_json::from_str(r#"[1,{"inputs":[],"outputs":[]}]"#).unwrap();
        assert_eq!(tx.input_address(), None);
        assert!(tx.signable_input().is_none());

        let mut bond = Transaction::Bond(BondTx { inputs: vec![], outputs: vec![] });
        assert_eq!(bond.input_address(), None);
        assert!(bond.signable_input().is_none());
    }

    #[test]
    fn rejects_unknown_wire_tag() {
        let err = serde_json::from_str::<Transaction>("[99,{}]").unwrap_err();
        assert!(err.to_string().contains("unknown transaction type"));
    }
}

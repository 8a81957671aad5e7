//! Commit event payloads delivered over the node's websocket stream.

use super::{Address, Bytes, Transaction};
use serde::{Deserialize, Serialize};

/// The event identifier the node fires when an account's input is consumed.
///
/// The scheme is the node's convention; treat it as an opaque external
/// constant.
pub fn acc_input_event(address: &Address) -> String {
    format!("Acc/{address}/Input")
}

/// The payload of a commit event: the executed transaction, its return
/// value and, when execution failed semantically, the exception text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TxEvent {
    pub tx: Transaction,
    #[serde(rename = "return", default)]
    pub return_value: Bytes,
    #[serde(default)]
    pub exception: String,
}

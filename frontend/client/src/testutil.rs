//! Scripted doubles for the injected chain and wallet capabilities.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use serde_json::{json, Value};

use crate::abi::{self, Address};
use crate::amount::TokenAmount;
use crate::errors::{ClientError, Result};
use crate::provider::Provider;
use crate::workflow::{Signer, TxRequest};

pub const CAMPAIGN: Address = Address::new([0x11; 20]);
pub const PAYMENT_TOKEN: Address = Address::new([0x22; 20]);
pub const FEE_TOKEN: Address = Address::new([0x33; 20]);

/// Hex-encode one ABI word, 0x-prefixed.
pub fn word_hex(amount: TokenAmount) -> String {
    format!("0x{}", hex::encode(amount.to_abi_word()))
}

/// JSON-RPC double: `eth_call` results keyed by calldata, receipts keyed by
/// transaction hash. Unstubbed calls come back unreachable, unstubbed
/// receipts come back pending.
#[derive(Default)]
pub struct MockProvider {
    calls: Mutex<HashMap<String, std::result::Result<String, String>>>,
    receipts: Mutex<HashMap<String, Value>>,
    eth_calls: Mutex<usize>,
}

impl MockProvider {
    pub fn stub_call(&self, data: &str, result: &str) {
        self.calls
            .lock()
            .unwrap()
            .insert(data.to_string(), Ok(result.to_string()));
    }

    pub fn stub_getter(&self, signature: &str, result: &str) {
        self.stub_call(&abi::encode_call(signature, &[]), result);
    }

    pub fn revert_getter(&self, signature: &str, message: &str) {
        self.calls.lock().unwrap().insert(
            abi::encode_call(signature, &[]),
            Err(message.to_string()),
        );
    }

    pub fn stub_receipt(&self, hash: &str, status: &str) {
        self.receipts.lock().unwrap().insert(
            hash.to_string(),
            json!({ "transactionHash": hash, "status": status }),
        );
    }

    /// Number of `eth_call` requests served so far.
    pub fn eth_call_count(&self) -> usize {
        *self.eth_calls.lock().unwrap()
    }
}

impl Provider for MockProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        match method {
            "eth_call" => {
                *self.eth_calls.lock().unwrap() += 1;
                let data = params[0]["data"].as_str().unwrap_or_default().to_string();
                match self.calls.lock().unwrap().get(&data) {
                    Some(Ok(result)) => Ok(json!(result)),
                    Some(Err(message)) => Err(ClientError::ContractCallReverted(message.clone())),
                    None => Err(ClientError::ContractUnreachable(format!(
                        "no stub for calldata {data}"
                    ))),
                }
            }
            "eth_getTransactionReceipt" => {
                let hash = params[0].as_str().unwrap_or_default();
                Ok(self
                    .receipts
                    .lock()
                    .unwrap()
                    .get(hash)
                    .cloned()
                    .unwrap_or(Value::Null))
            }
            other => Err(ClientError::ContractUnreachable(format!(
                "unexpected method {other}"
            ))),
        }
    }
}

/// Wallet double: records every transaction request and replays a scripted
/// queue of hashes or rejections.
#[derive(Default)]
pub struct MockSigner {
    account: Option<Address>,
    sent: Mutex<Vec<TxRequest>>,
    responses: Mutex<VecDeque<Result<String>>>,
}

impl MockSigner {
    pub fn new(account: Address) -> Self {
        MockSigner {
            account: Some(account),
            ..Default::default()
        }
    }

    pub fn disconnected() -> Self {
        MockSigner::default()
    }

    pub fn queue_hash(&self, hash: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(hash.to_string()));
    }

    pub fn queue_rejection(&self) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(ClientError::UserRejectedSignature));
    }

    pub fn sent(&self) -> Vec<TxRequest> {
        self.sent.lock().unwrap().clone()
    }
}

impl Signer for MockSigner {
    fn account(&self) -> Option<Address> {
        self.account
    }

    async fn send_transaction(&self, tx: &TxRequest) -> Result<String> {
        self.sent.lock().unwrap().push(tx.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(ClientError::ContractUnreachable(
                    "no scripted signer response".to_string(),
                ))
            })
    }
}

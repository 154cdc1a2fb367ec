//! Minimal ABI codec for the fixed contract surface this client speaks.
//!
//! Only the shapes actually sent and read are implemented: 4-byte selectors,
//! static 32-byte words (uint256, address, bool) and the dynamic `string`
//! head/tail encoding used by automation registration. Return data is
//! decoded word-by-word; anything that does not fit the expected shape is a
//! malformed response, not a guess.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};

use crate::amount::TokenAmount;
use crate::errors::{ClientError, Result};

// ─────────────────────────────────────────────────────────
// Addresses
// ─────────────────────────────────────────────────────────

/// A 20-byte EVM account or contract address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; 20]);

impl Address {
    pub const fn new(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Encode as a left-padded 32-byte ABI word.
    pub fn to_abi_word(self) -> [u8; 32] {
        let mut word = [0u8; 32];
        word[12..].copy_from_slice(&self.0);
        word
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped)
            .map_err(|_| ClientError::Config(format!("invalid address: {s}")))?;
        let bytes: [u8; 20] = bytes
            .try_into()
            .map_err(|_| ClientError::Config(format!("invalid address length: {s}")))?;
        Ok(Address(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ─────────────────────────────────────────────────────────
// Call encoding
// ─────────────────────────────────────────────────────────

/// One encodable argument value.
#[derive(Debug, Clone)]
pub enum AbiValue {
    /// 1e18 fixed-point uint256.
    Amount(TokenAmount),
    /// Plain unsigned integer (gas limits, counters).
    Uint(u128),
    Address(Address),
    Bool(bool),
    /// Dynamic UTF-8 string.
    Str(String),
}

/// Compute the 4-byte function selector for a canonical signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let digest = Keccak256::digest(signature.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

/// Encode a call to `signature` with `args` as 0x-prefixed calldata.
///
/// Static values land in the head; dynamic strings put their offset in the
/// head and length-prefixed, zero-padded bytes in the tail.
pub fn encode_call(signature: &str, args: &[AbiValue]) -> String {
    let head_len = args.len() * 32;
    let mut head: Vec<[u8; 32]> = Vec::with_capacity(args.len());
    let mut tail: Vec<u8> = Vec::new();

    for arg in args {
        match arg {
            AbiValue::Amount(amount) => head.push(amount.to_abi_word()),
            AbiValue::Uint(value) => head.push(uint_word(*value)),
            AbiValue::Address(address) => head.push(address.to_abi_word()),
            AbiValue::Bool(flag) => head.push(uint_word(*flag as u128)),
            AbiValue::Str(text) => {
                head.push(uint_word((head_len + tail.len()) as u128));
                let bytes = text.as_bytes();
                tail.extend_from_slice(&uint_word(bytes.len() as u128));
                tail.extend_from_slice(bytes);
                let padding = (32 - bytes.len() % 32) % 32;
                tail.resize(tail.len() + padding, 0);
            }
        }
    }

    let mut data = Vec::with_capacity(4 + head_len + tail.len());
    data.extend_from_slice(&selector(signature));
    for word in &head {
        data.extend_from_slice(word);
    }
    data.extend_from_slice(&tail);
    format!("0x{}", hex::encode(data))
}

fn uint_word(value: u128) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

// ─────────────────────────────────────────────────────────
// Return decoding
// ─────────────────────────────────────────────────────────

/// Decode a 0x-hex `eth_call` result into its first 32-byte word.
pub fn decode_word(data: &str) -> Result<[u8; 32]> {
    let stripped = data.strip_prefix("0x").unwrap_or(data);
    let bytes = hex::decode(stripped)
        .map_err(|e| ClientError::ContractUnreachable(format!("malformed call result: {e}")))?;
    if bytes.len() < 32 {
        return Err(ClientError::ContractUnreachable(format!(
            "call returned {} bytes, expected at least 32",
            bytes.len()
        )));
    }
    let mut word = [0u8; 32];
    word.copy_from_slice(&bytes[..32]);
    Ok(word)
}

pub fn decode_bool(data: &str) -> Result<bool> {
    Ok(decode_word(data)?[31] != 0)
}

pub fn decode_u64(data: &str) -> Result<u64> {
    let word = decode_word(data)?;
    if word[..24].iter().any(|b| *b != 0) {
        return Err(ClientError::ContractUnreachable(
            "uint value exceeds the supported range".to_string(),
        ));
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&word[24..]);
    Ok(u64::from_be_bytes(buf))
}

pub fn decode_amount(data: &str) -> Result<TokenAmount> {
    TokenAmount::from_abi_word(&decode_word(data)?)
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────

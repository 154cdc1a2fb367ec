//! Exact 18-decimal fixed-point token amounts.
//!
//! Money-like contract fields arrive as 1e18-scaled integers and stay
//! integers end to end; binary floating point never touches them. Parsing
//! user input and formatting for display are exact string/integer
//! conversions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{ClientError, Result};

/// Number of decimals in the on-chain fixed-point representation.
pub const DECIMALS: u32 = 18;

/// Base units per whole token (10^18).
const UNIT: u128 = 1_000_000_000_000_000_000;

/// A token amount in 1e18 base units.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TokenAmount(u128);

impl TokenAmount {
    pub const ZERO: TokenAmount = TokenAmount(0);

    pub const fn from_base_units(units: u128) -> Self {
        TokenAmount(units)
    }

    pub const fn from_whole(tokens: u64) -> Self {
        TokenAmount(tokens as u128 * UNIT)
    }

    pub const fn base_units(self) -> u128 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Whole-token part, truncating any fraction. Counters that the contract
    /// reports 1e18-scaled (e.g. voting sessions) are read through this.
    pub const fn whole_units(self) -> u128 {
        self.0 / UNIT
    }

    /// Parse a user-entered decimal string into base units.
    ///
    /// Rejects non-numeric input, more than 18 fractional digits, and
    /// non-positive values. This is the fast-fail validation that runs
    /// before any transaction is submitted.
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || ClientError::InvalidAmount(input.to_string());
        let s = input.trim();

        let (whole_part, frac_part) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if !whole_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }
        if frac_part.len() > DECIMALS as usize {
            return Err(invalid());
        }

        let whole: u128 = if whole_part.is_empty() {
            0
        } else {
            whole_part.parse().map_err(|_| invalid())?
        };
        let frac: u128 = if frac_part.is_empty() {
            0
        } else {
            let parsed: u128 = frac_part.parse().map_err(|_| invalid())?;
            parsed * 10u128.pow(DECIMALS - frac_part.len() as u32)
        };

        let units = whole
            .checked_mul(UNIT)
            .and_then(|w| w.checked_add(frac))
            .ok_or_else(invalid)?;
        if units == 0 {
            return Err(invalid());
        }
        Ok(TokenAmount(units))
    }

    /// Decode a 32-byte big-endian ABI word. The upper 16 bytes must be
    /// zero: larger values do not occur for the token scales this client
    /// handles and are treated as a malformed response.
    pub fn from_abi_word(word: &[u8; 32]) -> Result<Self> {
        if word[..16].iter().any(|b| *b != 0) {
            return Err(ClientError::ContractUnreachable(
                "uint256 value exceeds the supported range".to_string(),
            ));
        }
        let mut buf = [0u8; 16];
        buf.copy_from_slice(&word[16..]);
        Ok(TokenAmount(u128::from_be_bytes(buf)))
    }

    /// Encode as a 32-byte big-endian ABI word.
    pub fn to_abi_word(self) -> [u8; 32] {
        let mut word = [0u8; 32];
        word[16..].copy_from_slice(&self.0.to_be_bytes());
        word
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / UNIT;
        let frac = self.0 % UNIT;
        if frac == 0 {
            write!(f, "{whole}")
        } else {
            let digits = format!("{frac:018}");
            write!(f, "{whole}.{}", digits.trim_end_matches('0'))
        }
    }
}

impl FromStr for TokenAmount {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        TokenAmount::parse(s)
    }
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────

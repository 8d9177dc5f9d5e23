//! Minimal ABI helpers for the handful of contract calls the SDK makes.
//!
//! Only static `address` and `uint256` arguments are needed, so every
//! argument and return value is a single 32-byte word.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use cosmwasm_std::Uint256;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

const WORD: usize = 32;

/// `approve(address,uint256)`
pub const APPROVE_SELECTOR: [u8; 4] = [0x09, 0x5e, 0xa7, 0xb3];
/// `mint(address)` on the reward token minter
pub const MINT_SELECTOR: [u8; 4] = [0x6a, 0x62, 0x78, 0x42];
/// `allowance(address,address)`
pub const ALLOWANCE_SELECTOR: [u8; 4] = [0xdd, 0x62, 0xed, 0x3e];
/// `balanceOf(address)`
pub const BALANCE_OF_SELECTOR: [u8; 4] = [0x70, 0xa0, 0x82, 0x31];
/// `claimable_tokens(address)` on a liquidity gauge
pub const CLAIMABLE_TOKENS_SELECTOR: [u8; 4] = [0x33, 0x13, 0x45, 0x83];
/// `getLastCompletedReportDelta()` on the Lido oracle
pub const REPORT_DELTA_SELECTOR: [u8; 4] = [0x53, 0x46, 0x49, 0xc4];
/// `working_balances(address)` on a liquidity gauge
pub const WORKING_BALANCES_SELECTOR: [u8; 4] = [0x13, 0xec, 0xb1, 0xca];
/// `inflation_rate()` on a liquidity gauge, reward tokens per second
pub const INFLATION_RATE_SELECTOR: [u8; 4] = [0x18, 0x06, 0x92, 0xd0];
/// `gauge_relative_weight(address)` on the gauge controller
pub const GAUGE_RELATIVE_WEIGHT_SELECTOR: [u8; 4] = [0x62, 0x07, 0xd8, 0x66];

/// Allowance used for unlimited staking approvals
pub const MAX_UINT256: Uint256 = Uint256::MAX;

fn address_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("valid address regex"))
}

/// A 20-byte EVM account or contract address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Address([u8; 20]);

impl Address {
    /// Left-pad the address into a 32-byte ABI word
    pub fn to_word(&self) -> [u8; WORD] {
        let mut word = [0u8; WORD];
        word[WORD - 20..].copy_from_slice(&self.0);
        word
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !address_pattern().is_match(s) {
            return Err(Error::Abi(format!("Invalid address: {}", s)));
        }
        let raw = hex::decode(&s[2..]).map_err(|e| Error::Abi(format!("Invalid address: {}", e)))?;
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&raw);
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Check whether a string is a well-formed `0x` address
pub fn is_valid_address(s: &str) -> bool {
    address_pattern().is_match(s)
}

/// A single ABI argument
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Address(Address),
    Uint(Uint256),
}

impl Token {
    fn to_word(&self) -> [u8; WORD] {
        match self {
            Token::Address(addr) => addr.to_word(),
            Token::Uint(value) => value.to_be_bytes(),
        }
    }
}

/// Encode a call: 4-byte selector followed by one word per argument
pub fn encode_call(selector: [u8; 4], args: &[Token]) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + args.len() * WORD);
    data.extend_from_slice(&selector);
    for arg in args {
        data.extend_from_slice(&arg.to_word());
    }
    data
}

/// Hex-encode call data with a `0x` prefix, the form JSON-RPC expects
pub fn to_hex_data(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

/// Decode `0x`-prefixed return data into its 32-byte words
pub fn decode_words(data: &str) -> Result<Vec<Uint256>, Error> {
    let trimmed = data.strip_prefix("0x").unwrap_or(data);
    let bytes =
        hex::decode(trimmed).map_err(|e| Error::Abi(format!("Invalid return data: {}", e)))?;
    if bytes.len() % WORD != 0 {
        return Err(Error::Abi(format!(
            "Return data length {} is not a multiple of {}",
            bytes.len(),
            WORD
        )));
    }

    Ok(bytes
        .chunks_exact(WORD)
        .map(|chunk| {
            let mut word = [0u8; WORD];
            word.copy_from_slice(chunk);
            Uint256::from_be_bytes(word)
        })
        .collect())
}

/// Decode return data that must contain at least `expected` words
pub fn decode_exact(data: &str, expected: usize) -> Result<Vec<Uint256>, Error> {
    let words = decode_words(data)?;
    if words.len() < expected {
        return Err(Error::Abi(format!(
            "Expected {} return words, got {}",
            expected,
            words.len()
        )));
    }
    Ok(words)
}

/// Parse a `0x`-prefixed hex quantity (block numbers, status codes)
pub fn parse_quantity(value: &str) -> Result<u64, Error> {
    let trimmed = value.strip_prefix("0x").unwrap_or(value);
    u64::from_str_radix(trimmed, 16)
        .map_err(|e| Error::Abi(format!("Invalid quantity {}: {}", value, e)))
}

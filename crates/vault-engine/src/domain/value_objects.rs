//! # Domain Value Objects
//!
//! Immutable value types shared by every engine component.

use super::errors::EngineError;
use primitive_types::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Block height on a Substrate chain.
pub type BlockNumber = u32;

/// Largest SS58 network identifier (14 bits).
pub const MAX_SS58_PREFIX: u16 = 0x3FFF;

fn parse_hex_32(text: &str) -> Result<[u8; 32], String> {
    let stripped = text.strip_prefix("0x").unwrap_or(text);
    let bytes = hex::decode(stripped).map_err(|e| e.to_string())?;
    <[u8; 32]>::try_from(bytes.as_slice()).map_err(|_| format!("expected 32 bytes, got {}", bytes.len()))
}

/// A 32-byte account public key.
///
/// Equality, ordering and hashing look at the raw key only. The same key
/// rendered under two network prefixes is the same `Address`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 32]);

impl Address {
    /// Wrap a raw public key.
    pub const fn from_public_key(key: [u8; 32]) -> Self {
        Self(key)
    }

    /// Raw public key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Canonical, network-independent text form (`0x` + hex public key).
    pub fn canonical_key(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Abbreviated form for log lines.
    pub fn short(&self) -> String {
        format!("0x{}..{}", hex::encode(&self.0[..3]), hex::encode(&self.0[29..]))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.short())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_key())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.canonical_key())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse_hex_32(&text).map(Self).map_err(serde::de::Error::custom)
    }
}

/// SS58 network identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ss58Prefix(u16);

impl Ss58Prefix {
    /// Polkadot relay chain.
    pub const POLKADOT: Self = Self(0);
    /// Kusama relay chain.
    pub const KUSAMA: Self = Self(2);
    /// Generic Substrate / Westend.
    pub const SUBSTRATE: Self = Self(42);

    /// Validate and wrap a prefix.
    pub fn new(value: u16) -> Result<Self, EngineError> {
        if value > MAX_SS58_PREFIX {
            return Err(EngineError::InvalidAddressFormat(format!(
                "network prefix {} exceeds {}",
                value, MAX_SS58_PREFIX
            )));
        }
        Ok(Self(value))
    }

    /// Numeric value.
    pub fn value(&self) -> u16 {
        self.0
    }
}

macro_rules! hash_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name([u8; 32]);

        impl $name {
            /// Wrap raw digest bytes.
            pub const fn new(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            /// Raw digest bytes.
            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            /// `0x`-prefixed lowercase hex.
            pub fn to_hex(&self) -> String {
                format!("0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }

        impl FromStr for $name {
            type Err = EngineError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_hex_32(s)
                    .map(Self)
                    .map_err(|e| EngineError::CallDecode(format!("{}: {}", stringify!($name), e)))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let text = String::deserialize(deserializer)?;
                parse_hex_32(&text).map(Self).map_err(serde::de::Error::custom)
            }
        }
    };
}

hash_newtype!(
    /// BLAKE2b-256 digest identifying a proposed call.
    CallHash
);

hash_newtype!(
    /// Block hash.
    BlockHash
);

/// Where a multisig proposal was first created.
///
/// Identical call hashes proposed at different times are told apart by this.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timepoint {
    /// Block height of the creating extrinsic.
    pub height: BlockNumber,
    /// Extrinsic index within that block.
    pub index: u32,
}

impl Timepoint {
    /// Create a timepoint.
    pub fn new(height: BlockNumber, index: u32) -> Self {
        Self { height, index }
    }
}

/// Chain identifier, e.g. `polkadot`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChainId(pub String);

impl ChainId {
    /// Create from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow as str.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fungible token.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    /// Stable token id.
    pub id: String,
    /// Ticker symbol.
    pub symbol: String,
    /// Number of decimals between minimal units and display units.
    pub decimals: u8,
    /// Chain the token lives on.
    pub chain_id: ChainId,
}

/// Token amount in minimal indivisible units.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// Token identity.
    pub token: Token,
    /// Amount in minimal units.
    pub amount: U256,
}

impl Balance {
    /// Create a balance.
    pub fn new(token: Token, amount: impl Into<U256>) -> Self {
        Self {
            token,
            amount: amount.into(),
        }
    }

    /// Zero of `token`.
    pub fn zero(token: Token) -> Self {
        Self {
            token,
            amount: U256::zero(),
        }
    }

    /// Add two balances of the same token.
    pub fn checked_add(&self, other: &Balance) -> Result<Balance, EngineError> {
        if self.token.id != other.token.id {
            return Err(EngineError::TokenMismatch {
                left: self.token.id.clone(),
                right: other.token.id.clone(),
            });
        }
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or_else(|| EngineError::BalanceOverflow(self.token.id.clone()))?;
        Ok(Balance {
            token: self.token.clone(),
            amount,
        })
    }

    /// Render in display units, trailing zeros trimmed (`1.5`, `0.0001`, `12`).
    pub fn format_units(&self) -> String {
        // 10^78 overflows; such a token can only be shown in raw units.
        let Some(unit) = U256::from(10u8).checked_pow(U256::from(self.token.decimals)) else {
            return self.amount.to_string();
        };
        let whole = self.amount / unit;
        let frac = self.amount % unit;
        if frac.is_zero() {
            return whole.to_string();
        }
        let digits = format!("{:0>width$}", frac.to_string(), width = self.token.decimals as usize);
        format!("{}.{}", whole, digits.trim_end_matches('0'))
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.format_units(), self.token.symbol)
    }
}

/// Raw SCALE-encoded call bytes.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallData(Vec<u8>);

impl CallData {
    /// Wrap call bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Parse `0x`-prefixed (or bare) hex.
    pub fn from_hex(text: &str) -> Result<Self, EngineError> {
        let stripped = text.strip_prefix("0x").unwrap_or(text);
        hex::decode(stripped)
            .map(Self)
            .map_err(|e| EngineError::CallDecode(format!("call data hex: {}", e)))
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// `0x`-prefixed hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.0))
    }

    /// Byte length.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for zero-length call data.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for CallData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CallData({} bytes)", self.0.len())
    }
}

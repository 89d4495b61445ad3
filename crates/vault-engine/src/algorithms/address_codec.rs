//! # Address Codec
//!
//! SS58 text encoding of 32-byte account keys.
//!
//! Layout: `base58(prefix || public_key || checksum)` where `prefix` is one byte
//! for network ids below 64 and two bytes up to 16383, and `checksum` is the first
//! two bytes of `BLAKE2b-512("SS58PRE" || prefix || public_key)`.
//!
//! Different networks render the same key differently, so anything that compares
//! addresses must compare decoded keys, never text.

use super::hashing::blake2_512;
use crate::domain::{Address, EngineError, Ss58Prefix};

const SS58_CONTEXT: &[u8] = b"SS58PRE";
const KEY_LEN: usize = 32;
const CHECKSUM_LEN: usize = 2;

fn checksum(body: &[u8]) -> [u8; CHECKSUM_LEN] {
    let hash = blake2_512(&[SS58_CONTEXT, body]);
    [hash[0], hash[1]]
}

fn encode_prefix(prefix: Ss58Prefix) -> Vec<u8> {
    let ident = prefix.value();
    match ident {
        0..=63 => vec![ident as u8],
        _ => {
            let first = (((ident & 0b0000_0000_1111_1100) as u8) >> 2) | 0b0100_0000;
            let second = ((ident >> 8) as u8) | (((ident & 0b0000_0000_0000_0011) as u8) << 6);
            vec![first, second]
        }
    }
}

/// Decode SS58 text, returning the key and the network prefix it carried.
pub fn decode_with_prefix(text: &str) -> Result<(Address, Ss58Prefix), EngineError> {
    let data = bs58::decode(text)
        .into_vec()
        .map_err(|e| EngineError::InvalidAddressFormat(format!("{:?}: {}", text, e)))?;

    let (prefix_len, ident) = match data.first().copied() {
        Some(b @ 0..=63) => (1, b as u16),
        Some(b @ 64..=127) => {
            let second = *data.get(1).ok_or_else(|| {
                EngineError::InvalidAddressFormat(format!("{:?}: truncated prefix", text))
            })?;
            let lower = (b << 2) | (second >> 6);
            let upper = second & 0b0011_1111;
            (2, (lower as u16) | ((upper as u16) << 8))
        }
        Some(b) => {
            return Err(EngineError::InvalidAddressFormat(format!(
                "{:?}: reserved prefix byte {}",
                text, b
            )))
        }
        None => return Err(EngineError::InvalidAddressFormat("empty address".to_string())),
    };

    let expected_len = prefix_len + KEY_LEN + CHECKSUM_LEN;
    if data.len() != expected_len {
        return Err(EngineError::InvalidAddressFormat(format!(
            "{:?}: {} bytes, expected {}",
            text,
            data.len(),
            expected_len
        )));
    }

    let body = &data[..prefix_len + KEY_LEN];
    if checksum(body) != data[prefix_len + KEY_LEN..] {
        return Err(EngineError::InvalidChecksum(text.to_string()));
    }

    let mut key = [0u8; KEY_LEN];
    key.copy_from_slice(&data[prefix_len..prefix_len + KEY_LEN]);
    Ok((Address::from_public_key(key), Ss58Prefix::new(ident)?))
}

/// Decode SS58 text under any network prefix.
pub fn decode(text: &str) -> Result<Address, EngineError> {
    decode_with_prefix(text).map(|(address, _)| address)
}

/// Encode `address` for network `prefix`.
pub fn encode(address: &Address, prefix: Ss58Prefix) -> String {
    let mut body = encode_prefix(prefix);
    body.extend_from_slice(address.as_bytes());
    let sum = checksum(&body);
    body.extend_from_slice(&sum);
    bs58::encode(body).into_string()
}

/// Compare two addresses by raw public key.
pub fn equals(a: &Address, b: &Address) -> bool {
    a.as_bytes() == b.as_bytes()
}

/// Compare two SS58 strings by the key they encode.
pub fn equals_text(a: &str, b: &str) -> Result<bool, EngineError> {
    Ok(equals(&decode(a)?, &decode(b)?))
}

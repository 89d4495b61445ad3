//! # Multisig Account Derivation
//!
//! The multisig account is a deterministic function of the signer set and the
//! threshold: `BLAKE2b-256("modlpy/utilisuba" || SCALE(sorted signers) || threshold)`.

use super::hashing::blake2_256;
use crate::domain::{Address, Multisig};
use parity_scale_codec::Encode;

const MULTISIG_SEED: &[u8; 16] = b"modlpy/utilisuba";

/// Derive the multisig account for `signers` (any order) and `threshold`.
pub fn derive_multisig_address(signers: &[Address], threshold: u16) -> Address {
    let mut sorted: Vec<[u8; 32]> = signers.iter().map(|s| *s.as_bytes()).collect();
    sorted.sort_unstable();

    let entropy = (MULTISIG_SEED, sorted, threshold).using_encoded(blake2_256);
    Address::from_public_key(entropy)
}

/// Multisigs in which at least one locally controlled account is a signer.
pub fn active_multisigs<'a>(multisigs: &'a [Multisig], local_accounts: &[Address]) -> Vec<&'a Multisig> {
    multisigs
        .iter()
        .filter(|m| m.signers().iter().any(|s| local_accounts.contains(s)))
        .collect()
}

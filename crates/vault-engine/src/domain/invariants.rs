//! # Domain Invariants
//!
//! Business rules that must always hold true.

use super::entities::{Multisig, TransactionApprovals};
use super::errors::EngineError;

/// Blocked reason when execution needs call data that never resolved.
pub const BLOCKED_MISSING_CALL_DATA: &str = "missing call data";

/// Blocked reason for config changes with siblings in flight.
pub const BLOCKED_OTHER_PENDING: &str = "must resolve other pending transactions first";

/// Invariant: `1 <= threshold <= signers`.
pub fn invariant_threshold(threshold: u16, signers: usize) -> Result<(), EngineError> {
    if threshold == 0 || threshold as usize > signers {
        return Err(EngineError::InvalidThreshold { threshold, signers });
    }
    Ok(())
}

/// Invariant: one approval entry per current signer, nothing else.
pub fn invariant_approvals_complete(multisig: &Multisig, approvals: &TransactionApprovals) -> bool {
    approvals.len() == multisig.signers().len()
        && multisig
            .signers()
            .iter()
            .all(|signer| approvals.get(signer).is_some())
}

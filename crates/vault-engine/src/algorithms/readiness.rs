//! # Execution Readiness
//!
//! Pure decision of whether a pending transaction can be executed now.
//!
//! Rules, first match wins:
//!
//! 1. fewer approvals than the threshold -> `NeedsMoreApprovals`
//! 2. config change while any other proposal is open on chain, assembled or
//!    not -> `Blocked`
//! 3. call data missing -> `Blocked`
//! 4. otherwise -> `ReadyToExecute`

use crate::domain::{
    CallHash, Multisig, Transaction, BLOCKED_MISSING_CALL_DATA, BLOCKED_OTHER_PENDING,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a fully approved transaction cannot execute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockedReason {
    /// A config change must be the only pending proposal.
    OtherPendingTransactions,
    /// Execution needs the full call bytes.
    MissingCallData,
}

impl BlockedReason {
    /// User-facing reason text.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OtherPendingTransactions => BLOCKED_OTHER_PENDING,
            Self::MissingCallData => BLOCKED_MISSING_CALL_DATA,
        }
    }
}

impl fmt::Display for BlockedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Readiness verdict.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Readiness {
    /// Final approval may execute the call.
    ReadyToExecute,
    /// This many more approvals are required.
    NeedsMoreApprovals(usize),
    /// Approved but not executable.
    Blocked(BlockedReason),
}

impl Readiness {
    /// True for [`Readiness::ReadyToExecute`].
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::ReadyToExecute)
    }
}

/// Evaluate `transaction` against `multisig` and every call hash still open
/// on chain.
///
/// `pending` must include proposals that were excluded from the assembled list,
/// and may contain `transaction` itself; it is ignored when looking for other
/// proposals.
pub fn evaluate_readiness(
    transaction: &Transaction,
    multisig: &Multisig,
    pending: &[CallHash],
) -> Readiness {
    let threshold = multisig.threshold() as usize;
    let approved = transaction.approvals().approved_count();
    if approved < threshold {
        return Readiness::NeedsMoreApprovals(threshold - approved);
    }

    if transaction.is_config_change()
        && pending
            .iter()
            .any(|other| *other != transaction.call_hash())
    {
        return Readiness::Blocked(BlockedReason::OtherPendingTransactions);
    }

    if transaction.call_data().is_none() {
        return Readiness::Blocked(BlockedReason::MissingCallData);
    }

    Readiness::ReadyToExecute
}

//! # Approval Aggregation
//!
//! Merges the approver list stored on chain with the multisig's current signer
//! set. The chain may render approvers under another network prefix, list keys
//! that are no longer signers, or (rarely) return garbage. None of that aborts
//! the aggregation.

use super::address_codec;
use crate::domain::{Address, CallHash, DataQualityWarning, Multisig, TransactionApprovals};
use vault_telemetry::log_tx_event;

/// Result of aggregating one record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Aggregation {
    /// One flag per current signer.
    pub approvals: TransactionApprovals,
    /// Approver entries that were excluded.
    pub warnings: Vec<DataQualityWarning>,
}

/// Build the per-signer approval map for `call_hash`.
///
/// A signer is approved iff some decodable approver has the same public key.
/// Undecodable and foreign approvers are logged and excluded.
pub fn aggregate(multisig: &Multisig, call_hash: CallHash, raw_approvers: &[String]) -> Aggregation {
    let mut warnings = Vec::new();
    let mut approvers: Vec<Address> = Vec::with_capacity(raw_approvers.len());

    for raw in raw_approvers {
        match address_codec::decode(raw) {
            Ok(address) => {
                if !multisig.is_signer(&address) {
                    log_tx_event!(
                        warn,
                        "approval-aggregator",
                        "chain listed an approver that is not a current signer",
                        call_hash,
                        approver = %address
                    );
                    warnings.push(DataQualityWarning::ForeignApprover { call_hash, address });
                }
                approvers.push(address);
            }
            Err(e) => {
                log_tx_event!(
                    warn,
                    "approval-aggregator",
                    "chain returned an approval that is not a valid address",
                    call_hash,
                    raw = %raw,
                    error = %e
                );
                warnings.push(DataQualityWarning::UndecodableApprover {
                    call_hash,
                    raw: raw.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    let entries = multisig
        .signers()
        .iter()
        .map(|signer| {
            let approved = approvers
                .iter()
                .any(|approver| address_codec::equals(approver, signer));
            (*signer, approved)
        })
        .collect();

    Aggregation {
        approvals: TransactionApprovals::from_entries(entries),
        warnings,
    }
}

/// First locally controlled signer that still has to approve.
pub fn next_transaction_signer(
    approvals: &TransactionApprovals,
    local_accounts: &[Address],
) -> Option<Address> {
    local_accounts
        .iter()
        .find(|account| approvals.get(account) == Some(false))
        .copied()
}

//! # Domain Entities
//!
//! Multisig definition, raw chain snapshots and the assembled `Transaction`.

use super::chains::Chain;
use super::errors::EngineError;
use super::invariants::invariant_threshold;
use super::value_objects::{Address, Balance, BlockNumber, CallData, CallHash, ChainId, Timepoint};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A vault: an on-chain account controlled by `threshold` of `signers`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Multisig {
    /// User-chosen display name.
    pub name: String,
    /// Chain the multisig lives on.
    pub chain: Chain,
    signers: Vec<Address>,
    threshold: u16,
    multisig_address: Address,
    proxy_address: Option<Address>,
}

impl Multisig {
    /// Build a multisig, deriving its account from signers and threshold.
    ///
    /// Signer order is preserved for display; duplicates are rejected.
    pub fn new(
        name: impl Into<String>,
        chain: Chain,
        signers: Vec<Address>,
        threshold: u16,
        proxy_address: Option<Address>,
    ) -> Result<Self, EngineError> {
        invariant_threshold(threshold, signers.len())?;

        let mut seen = HashSet::with_capacity(signers.len());
        for signer in &signers {
            if !seen.insert(*signer) {
                return Err(EngineError::InvalidMultisig(format!(
                    "duplicate signer {}",
                    signer.short()
                )));
            }
        }

        let multisig_address = crate::algorithms::derive_multisig_address(&signers, threshold);
        Ok(Self {
            name: name.into(),
            chain,
            signers,
            threshold,
            multisig_address,
            proxy_address,
        })
    }

    /// Build a multisig from an imported definition, checking the claimed address.
    pub fn import(
        name: impl Into<String>,
        chain: Chain,
        signers: Vec<Address>,
        threshold: u16,
        multisig_address: Address,
        proxy_address: Option<Address>,
    ) -> Result<Self, EngineError> {
        let multisig = Self::new(name, chain, signers, threshold, proxy_address)?;
        if multisig.multisig_address != multisig_address {
            return Err(EngineError::InvalidMultisig(format!(
                "address {} does not match signers/threshold (expected {})",
                multisig_address.short(),
                multisig.multisig_address.short()
            )));
        }
        Ok(multisig)
    }

    /// Signers in configuration order.
    pub fn signers(&self) -> &[Address] {
        &self.signers
    }

    /// Approvals required to execute.
    pub fn threshold(&self) -> u16 {
        self.threshold
    }

    /// Derived multisig account.
    pub fn multisig_address(&self) -> Address {
        self.multisig_address
    }

    /// Pure proxy controlled by the multisig, if any.
    pub fn proxy_address(&self) -> Option<Address> {
        self.proxy_address
    }

    /// Account that holds the vault's assets.
    pub fn asset_address(&self) -> Address {
        self.proxy_address.unwrap_or(self.multisig_address)
    }

    /// Chain identifier.
    pub fn chain_id(&self) -> &ChainId {
        &self.chain.id
    }

    /// Whether `address` is a current signer.
    pub fn is_signer(&self, address: &Address) -> bool {
        self.signers.contains(address)
    }
}

/// The chain's `Multisig` storage entry, with addresses as the chain returned them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMultisigRecord {
    /// Creation timepoint.
    pub when: Timepoint,
    /// Reserved deposit in minimal units.
    pub deposit: u128,
    /// Account that opened the proposal (SS58 text).
    pub depositor: String,
    /// Approving accounts (SS58 text, any network prefix).
    pub approvals: Vec<String>,
}

/// A proxy definition entry as stored on chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawProxyDefinition {
    /// Delegate account (SS58 text).
    pub delegate: String,
    /// Proxy type name, e.g. `Any`.
    pub proxy_type: String,
    /// Announcement delay in blocks.
    pub delay: BlockNumber,
}

/// One pending proposal read during a refresh.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawPendingTransaction {
    /// Call hash (storage key).
    pub call_hash: CallHash,
    /// Storage record.
    pub record: RawMultisigRecord,
    /// Timestamp of the creation block, when it could be read.
    pub created_at: Option<DateTime<Utc>>,
}

/// Per-signer approval flags for one transaction.
///
/// Holds exactly one entry per current signer, in signer order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TransactionApprovals {
    entries: Vec<(Address, bool)>,
}

impl TransactionApprovals {
    pub(crate) fn from_entries(entries: Vec<(Address, bool)>) -> Self {
        Self { entries }
    }

    /// Approval flag for `signer`, `None` if not a signer.
    pub fn get(&self, signer: &Address) -> Option<bool> {
        self.entries
            .iter()
            .find(|(address, _)| address == signer)
            .map(|(_, approved)| *approved)
    }

    /// Number of signers that approved.
    pub fn approved_count(&self) -> usize {
        self.entries.iter().filter(|(_, approved)| *approved).count()
    }

    /// Number of entries (equals signer count).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the multisig has no signers.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(signer, approved)` in signer order.
    pub fn iter(&self) -> impl Iterator<Item = (&Address, bool)> {
        self.entries.iter().map(|(address, approved)| (address, *approved))
    }

    /// Signers that have not approved yet.
    pub fn pending_signers(&self) -> Vec<Address> {
        self.entries
            .iter()
            .filter(|(_, approved)| !*approved)
            .map(|(address, _)| *address)
            .collect()
    }
}

/// New configuration proposed by a config-change transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeConfigDetails {
    /// New signer set.
    pub signers: Vec<Address>,
    /// New threshold.
    pub threshold: u16,
}

/// A transfer destination.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecipient {
    /// Destination account.
    pub address: Address,
    /// Amount sent.
    pub balance: Balance,
}

/// Coarse transaction category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    /// One transfer.
    Transfer,
    /// Batch of transfers.
    MultiSend,
    /// Signer set / threshold change.
    ChangeConfig,
    /// Any other valid call.
    Advanced,
}

/// Structured view of a call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecodedCall {
    /// Simple transfer.
    Transfer {
        /// Destination and amount.
        recipient: TransactionRecipient,
    },
    /// Batched-recipients transfer.
    MultiSend {
        /// Destinations and amounts.
        recipients: Vec<TransactionRecipient>,
    },
    /// Configuration change.
    ChangeConfig {
        /// Proposed configuration.
        details: ChangeConfigDetails,
    },
    /// Valid call the engine does not interpret.
    Advanced {
        /// Pallet index of the outermost interpreted call.
        pallet_index: u8,
        /// Call index within the pallet.
        call_index: u8,
    },
}

impl DecodedCall {
    /// Category of this call.
    pub fn kind(&self) -> TransactionType {
        match self {
            Self::Transfer { .. } => TransactionType::Transfer,
            Self::MultiSend { .. } => TransactionType::MultiSend,
            Self::ChangeConfig { .. } => TransactionType::ChangeConfig,
            Self::Advanced { .. } => TransactionType::Advanced,
        }
    }

    /// Transfer recipients (empty for non-transfer calls).
    pub fn recipients(&self) -> &[TransactionRecipient] {
        match self {
            Self::Transfer { recipient } => std::slice::from_ref(recipient),
            Self::MultiSend { recipients } => recipients,
            _ => &[],
        }
    }
}

/// Resolved off-chain call data, as cached.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRecord {
    /// Hash the bytes were verified against.
    pub call_hash: CallHash,
    /// Full call bytes.
    pub call_data: CallData,
    /// Human description supplied by the proposer.
    pub description: String,
    /// Config-change payload, when the proposal is one.
    pub change_config: Option<ChangeConfigDetails>,
    /// When the record entered the cache.
    pub fetched_at: DateTime<Utc>,
}

/// Description shown when call data could not be resolved.
pub const DETAILS_UNAVAILABLE: &str = "Transaction details unavailable";

/// A pending transaction, ready for presentation.
///
/// Only [`TransactionAssembler`](crate::application::TransactionAssembler) builds these.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Transaction {
    call_hash: CallHash,
    chain_id: ChainId,
    timepoint: Timepoint,
    created_at: Option<DateTime<Utc>>,
    executed_at: Option<DateTime<Utc>>,
    description: String,
    decoded: Option<DecodedCall>,
    approvals: TransactionApprovals,
    call_data: Option<CallData>,
    depositor: Option<Address>,
}

impl Transaction {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        call_hash: CallHash,
        chain_id: ChainId,
        timepoint: Timepoint,
        created_at: Option<DateTime<Utc>>,
        description: String,
        decoded: Option<DecodedCall>,
        approvals: TransactionApprovals,
        call_data: Option<CallData>,
        depositor: Option<Address>,
    ) -> Self {
        Self {
            call_hash,
            chain_id,
            timepoint,
            created_at,
            executed_at: None,
            description,
            decoded,
            approvals,
            call_data,
            depositor,
        }
    }

    /// Call hash.
    pub fn call_hash(&self) -> CallHash {
        self.call_hash
    }

    /// Chain id.
    pub fn chain_id(&self) -> &ChainId {
        &self.chain_id
    }

    /// Creation timepoint (needed to approve or cancel on chain).
    pub fn timepoint(&self) -> Timepoint {
        self.timepoint
    }

    /// Creation time, if the block timestamp was readable.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// Execution time. Always `None` for pending transactions.
    pub fn executed_at(&self) -> Option<DateTime<Utc>> {
        self.executed_at
    }

    /// Human description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Structured call, when call data resolved and decoded.
    pub fn decoded(&self) -> Option<&DecodedCall> {
        self.decoded.as_ref()
    }

    /// Approval flags.
    pub fn approvals(&self) -> &TransactionApprovals {
        &self.approvals
    }

    /// Raw call bytes, when resolved.
    pub fn call_data(&self) -> Option<&CallData> {
        self.call_data.as_ref()
    }

    /// Account that opened the proposal.
    pub fn depositor(&self) -> Option<Address> {
        self.depositor
    }

    /// Whether this changes the multisig's own signers or threshold.
    pub fn is_config_change(&self) -> bool {
        matches!(self.decoded, Some(DecodedCall::ChangeConfig { .. }))
    }

    /// Only the depositor may cancel a proposal.
    pub fn can_cancel(&self, account: &Address) -> bool {
        self.depositor.as_ref() == Some(account)
    }
}

/// A chain or metadata condition that was tolerated during a refresh.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataQualityWarning {
    /// Approver text the chain returned failed to decode.
    UndecodableApprover {
        /// Affected transaction
        call_hash: CallHash,
        /// Text as returned
        raw: String,
        /// Decode error
        reason: String,
    },
    /// Approver decoded but is not a current signer.
    ForeignApprover {
        /// Affected transaction
        call_hash: CallHash,
        /// Approver key
        address: Address,
    },
    /// Record vanished between the listing read and the detail read.
    StaleRead {
        /// Call hash that was listed
        call_hash: CallHash,
    },
    /// Proxy delegate text failed to decode.
    UndecodableDelegate {
        /// Text as returned
        raw: String,
        /// Decode error
        reason: String,
    },
    /// Creation block hash or timestamp could not be read.
    BlockMetadataUnavailable {
        /// Affected transaction
        call_hash: CallHash,
        /// Failure
        reason: String,
    },
    /// Call data resolved but could not be decoded.
    MalformedCallData {
        /// Affected transaction
        call_hash: CallHash,
        /// Decode error
        reason: String,
    },
}

/// A transaction dropped from a refresh because of a hard error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionFailure {
    /// Affected transaction.
    pub call_hash: CallHash,
    /// Cause.
    pub error: EngineError,
}

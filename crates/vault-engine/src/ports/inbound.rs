//! # Inbound Ports
//!
//! API trait defining what the vault engine offers to a presentation layer.

use crate::algorithms::{Delegatees, Readiness};
use crate::domain::{
    Address, Balance, CallHash, ChainId, DataQualityWarning, EngineError, Multisig, Transaction,
    TransactionFailure,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

/// Result of one refresh of a multisig's pending transactions.
#[derive(Clone, Debug)]
pub struct PendingSnapshot {
    /// Refresh identifier, for log correlation.
    pub id: Uuid,
    /// Refresh generation. Later refreshes have larger generations.
    pub generation: u64,
    /// Multisig account the snapshot describes.
    pub multisig_address: Address,
    /// Chain of the multisig.
    pub chain_id: ChainId,
    /// When the refresh completed.
    pub refreshed_at: DateTime<Utc>,
    /// Pending transactions, newest first.
    pub transactions: Vec<Transaction>,
    /// Tolerated data problems.
    pub warnings: Vec<DataQualityWarning>,
    /// Transactions dropped because of hard errors.
    pub failures: Vec<TransactionFailure>,
}

impl PendingSnapshot {
    /// Find a transaction by call hash.
    pub fn get(&self, call_hash: &CallHash) -> Option<&Transaction> {
        self.transactions.iter().find(|tx| tx.call_hash() == *call_hash)
    }

    /// Call hashes of every proposal still open on chain, including those
    /// reported in `failures`.
    pub fn pending_call_hashes(&self) -> Vec<CallHash> {
        self.transactions
            .iter()
            .map(Transaction::call_hash)
            .chain(self.failures.iter().map(|failure| failure.call_hash))
            .collect()
    }
}

/// Presentation data for one pending transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionReview {
    /// Transaction reviewed.
    pub call_hash: CallHash,
    /// Readiness verdict.
    pub readiness: Readiness,
    /// Estimated execution fee, when an estimator answered in time.
    pub estimated_fee: Option<Balance>,
}

/// Vault engine API - inbound port.
#[async_trait]
pub trait VaultApi: Send + Sync {
    /// Rebuild the pending transaction list of `multisig`.
    ///
    /// Starting a refresh supersedes any refresh still in progress; the older
    /// one returns [`EngineError::Superseded`] and is never published.
    async fn refresh(&self, multisig: &Multisig) -> Result<Arc<PendingSnapshot>, EngineError>;

    /// Readiness and fee for every transaction in `snapshot`.
    async fn review(&self, multisig: &Multisig, snapshot: &PendingSnapshot) -> Vec<TransactionReview>;

    /// `Any`-type delegates of `proxy`.
    async fn proxy_delegatees(
        &self,
        chain: &ChainId,
        proxy: &Address,
    ) -> Result<Delegatees, EngineError>;

    /// Latest published snapshot.
    fn latest_snapshot(&self) -> Option<Arc<PendingSnapshot>>;

    /// Receive every published snapshot.
    fn subscribe(&self) -> watch::Receiver<Option<Arc<PendingSnapshot>>>;
}

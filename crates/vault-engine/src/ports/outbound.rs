//! # Outbound Ports
//!
//! Traits for external dependencies (chain storage, the call-data metadata
//! service, fee estimation, chain connections).

use crate::domain::{
    Address, Balance, BlockHash, BlockNumber, CallHash, ChainId, EngineError, Multisig,
    RawMultisigRecord, RawProxyDefinition, Timepoint, Transaction,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// Read access to chain storage - outbound port.
///
/// All reads are idempotent. Absence is a value, not an error.
#[async_trait]
pub trait ChainStorageReader: Send + Sync {
    /// Call hashes with an open proposal for `multisig`.
    async fn list_multisig_call_hashes(
        &self,
        chain: &ChainId,
        multisig: &Address,
    ) -> Result<Vec<CallHash>, EngineError>;

    /// The proposal record for `call_hash`, `None` if it no longer exists.
    async fn get_multisig_record(
        &self,
        chain: &ChainId,
        multisig: &Address,
        call_hash: &CallHash,
    ) -> Result<Option<RawMultisigRecord>, EngineError>;

    /// Hash of the block at `height`.
    async fn get_block_hash(
        &self,
        chain: &ChainId,
        height: BlockNumber,
    ) -> Result<BlockHash, EngineError>;

    /// Timestamp of `block_hash` in unix milliseconds.
    async fn get_block_timestamp(
        &self,
        chain: &ChainId,
        block_hash: &BlockHash,
    ) -> Result<u64, EngineError>;

    /// Proxy definitions registered for `proxy`.
    async fn get_proxy_definitions(
        &self,
        chain: &ChainId,
        proxy: &Address,
    ) -> Result<Vec<RawProxyDefinition>, EngineError>;
}

/// Opens live chain connections - outbound port.
#[async_trait]
pub trait ChainConnector: Send + Sync {
    /// Live connection type.
    type Connection: ChainStorageReader + 'static;

    /// Connect to `endpoint`.
    async fn connect(&self, endpoint: &str) -> Result<Self::Connection, EngineError>;
}

/// Metadata service lookup key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallDataQuery {
    /// Chain id as known to the service.
    pub chain_id: ChainId,
    /// Multisig account in the chain's own SS58 encoding.
    pub multisig: String,
    /// Creation timepoint of the proposal.
    pub timepoint: Timepoint,
}

/// Config-change payload as stored by the metadata service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawChangeConfig {
    /// Proposed threshold.
    pub new_threshold: u16,
    /// Proposed signers (SS58 text).
    pub new_members: Vec<String>,
}

/// Call metadata as returned by the service, unvalidated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCallMetadata {
    /// Hex call bytes, `0x` prefix optional.
    pub call_data: String,
    /// Proposer's description.
    pub description: String,
    /// Config-change payload.
    pub change_config_details: Option<RawChangeConfig>,
}

/// Off-chain call data source - outbound port.
#[async_trait]
pub trait CallDataBackend: Send + Sync {
    /// Fetch metadata for one proposal. `Ok(None)` when the service has no entry.
    async fn fetch_call_data(
        &self,
        query: &CallDataQuery,
    ) -> Result<Option<RawCallMetadata>, EngineError>;
}

/// Fee estimation for executing a transaction - outbound port.
#[async_trait]
pub trait FeeEstimator: Send + Sync {
    /// Estimated fee for submitting the final approval of `transaction`.
    async fn estimate_fee(
        &self,
        multisig: &Multisig,
        transaction: &Transaction,
    ) -> Result<Balance, EngineError>;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Base timestamp of block 0 in [`MockChainStorage`].
pub const MOCK_GENESIS_MILLIS: u64 = 1_700_000_000_000;

/// Block time in [`MockChainStorage`].
pub const MOCK_BLOCK_MILLIS: u64 = 6_000;

/// In-memory chain storage.
///
/// Block hashes encode the height, and the timestamp of block `h` is
/// `MOCK_GENESIS_MILLIS + h * MOCK_BLOCK_MILLIS` unless overridden.
#[derive(Default)]
pub struct MockChainStorage {
    records: Mutex<Vec<(Address, CallHash, RawMultisigRecord)>>,
    vanishing: Mutex<HashSet<CallHash>>,
    timestamps: Mutex<HashMap<BlockNumber, u64>>,
    failing_heights: Mutex<HashSet<BlockNumber>>,
    proxies: Mutex<HashMap<Address, Vec<RawProxyDefinition>>>,
    list_delay: Mutex<Option<Duration>>,
    /// Fail every read with `ChainUnavailable`.
    pub should_fail: AtomicBool,
    /// Number of `get_block_hash` calls served.
    pub block_hash_reads: AtomicU64,
    /// Number of `list_multisig_call_hashes` calls served.
    pub list_reads: AtomicU64,
}

impl MockChainStorage {
    /// Empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an open proposal.
    pub fn insert_record(&self, multisig: Address, call_hash: CallHash, record: RawMultisigRecord) {
        let mut records = self.records.lock();
        records.retain(|(m, h, _)| !(*m == multisig && *h == call_hash));
        records.push((multisig, call_hash, record));
    }

    /// Remove a proposal, as if executed or cancelled.
    pub fn remove_record(&self, multisig: &Address, call_hash: &CallHash) {
        self.records
            .lock()
            .retain(|(m, h, _)| !(m == multisig && h == call_hash));
    }

    /// Keep `call_hash` in listings but return no detail record for it.
    pub fn vanish_after_listing(&self, call_hash: CallHash) {
        self.vanishing.lock().insert(call_hash);
    }

    /// Override the timestamp of block `height`.
    pub fn set_block_timestamp(&self, height: BlockNumber, millis: u64) {
        self.timestamps.lock().insert(height, millis);
    }

    /// Make block metadata reads for `height` fail.
    pub fn fail_block(&self, height: BlockNumber) {
        self.failing_heights.lock().insert(height);
    }

    /// Register proxy definitions for `proxy`.
    pub fn set_proxies(&self, proxy: Address, definitions: Vec<RawProxyDefinition>) {
        self.proxies.lock().insert(proxy, definitions);
    }

    /// Delay listing reads.
    pub fn set_list_delay(&self, delay: Option<Duration>) {
        *self.list_delay.lock() = delay;
    }

    /// Block hash the mock assigns to `height`.
    pub fn block_hash_for(height: BlockNumber) -> BlockHash {
        let mut bytes = [0u8; 32];
        bytes[..4].copy_from_slice(&height.to_be_bytes());
        bytes[31] = 0xB1;
        BlockHash::new(bytes)
    }

    fn height_of(hash: &BlockHash) -> BlockNumber {
        let b = hash.as_bytes();
        BlockNumber::from_be_bytes([b[0], b[1], b[2], b[3]])
    }

    fn check_available(&self) -> Result<(), EngineError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(EngineError::ChainUnavailable("Mock failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ChainStorageReader for MockChainStorage {
    async fn list_multisig_call_hashes(
        &self,
        _chain: &ChainId,
        multisig: &Address,
    ) -> Result<Vec<CallHash>, EngineError> {
        self.check_available()?;
        self.list_reads.fetch_add(1, Ordering::SeqCst);
        let delay = *self.list_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self
            .records
            .lock()
            .iter()
            .filter(|(m, _, _)| m == multisig)
            .map(|(_, h, _)| *h)
            .collect())
    }

    async fn get_multisig_record(
        &self,
        _chain: &ChainId,
        multisig: &Address,
        call_hash: &CallHash,
    ) -> Result<Option<RawMultisigRecord>, EngineError> {
        self.check_available()?;
        if self.vanishing.lock().contains(call_hash) {
            return Ok(None);
        }
        Ok(self
            .records
            .lock()
            .iter()
            .find(|(m, h, _)| m == multisig && h == call_hash)
            .map(|(_, _, record)| record.clone()))
    }

    async fn get_block_hash(
        &self,
        _chain: &ChainId,
        height: BlockNumber,
    ) -> Result<BlockHash, EngineError> {
        self.check_available()?;
        self.block_hash_reads.fetch_add(1, Ordering::SeqCst);
        if self.failing_heights.lock().contains(&height) {
            return Err(EngineError::ChainUnavailable(format!("block {} unreadable", height)));
        }
        Ok(Self::block_hash_for(height))
    }

    async fn get_block_timestamp(
        &self,
        _chain: &ChainId,
        block_hash: &BlockHash,
    ) -> Result<u64, EngineError> {
        self.check_available()?;
        let height = Self::height_of(block_hash);
        let custom = self.timestamps.lock().get(&height).copied();
        Ok(custom.unwrap_or(MOCK_GENESIS_MILLIS + height as u64 * MOCK_BLOCK_MILLIS))
    }

    async fn get_proxy_definitions(
        &self,
        _chain: &ChainId,
        proxy: &Address,
    ) -> Result<Vec<RawProxyDefinition>, EngineError> {
        self.check_available()?;
        Ok(self.proxies.lock().get(proxy).cloned().unwrap_or_default())
    }
}

/// In-memory metadata service.
#[derive(Default)]
pub struct MockCallDataBackend {
    entries: Mutex<HashMap<CallDataQuery, RawCallMetadata>>,
    delay: Mutex<Option<Duration>>,
    /// Fail every fetch with `MetadataService`.
    pub should_fail: AtomicBool,
    /// Number of fetches served (including failed ones).
    pub fetches: AtomicU64,
}

impl MockCallDataBackend {
    /// Empty service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register metadata for `query`.
    pub fn insert(&self, query: CallDataQuery, metadata: RawCallMetadata) {
        self.entries.lock().insert(query, metadata);
    }

    /// Delay every fetch.
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock() = delay;
    }

    /// Fetches served so far.
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CallDataBackend for MockCallDataBackend {
    async fn fetch_call_data(
        &self,
        query: &CallDataQuery,
    ) -> Result<Option<RawCallMetadata>, EngineError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(EngineError::MetadataService("Mock failure".to_string()));
        }
        Ok(self.entries.lock().get(query).cloned())
    }
}

/// Fee estimator returning a fixed fee.
pub struct MockFeeEstimator {
    /// Fee returned for every transaction.
    pub fee: Balance,
    /// Delay before answering.
    pub delay: Option<Duration>,
    /// Fail every estimate.
    pub should_fail: bool,
}

#[async_trait]
impl FeeEstimator for MockFeeEstimator {
    async fn estimate_fee(
        &self,
        _multisig: &Multisig,
        _transaction: &Transaction,
    ) -> Result<Balance, EngineError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.should_fail {
            return Err(EngineError::ChainUnavailable("Mock failure".to_string()));
        }
        Ok(self.fee.clone())
    }
}

/// Connector handing out [`MockChainStorage`] connections.
///
/// Endpoints listed in `down` refuse connections.
#[derive(Default)]
pub struct MockChainConnector {
    /// Endpoints that refuse to connect.
    pub down: Mutex<HashSet<String>>,
    /// Connection attempts so far.
    pub attempts: AtomicU64,
    /// Storage shared by every connection.
    pub storage: std::sync::Arc<MockChainStorage>,
}

/// A connection produced by [`MockChainConnector`].
pub struct MockConnection {
    /// Endpoint this connection was opened to.
    pub endpoint: String,
    storage: std::sync::Arc<MockChainStorage>,
}

#[async_trait]
impl ChainStorageReader for MockConnection {
    async fn list_multisig_call_hashes(
        &self,
        chain: &ChainId,
        multisig: &Address,
    ) -> Result<Vec<CallHash>, EngineError> {
        self.storage.list_multisig_call_hashes(chain, multisig).await
    }

    async fn get_multisig_record(
        &self,
        chain: &ChainId,
        multisig: &Address,
        call_hash: &CallHash,
    ) -> Result<Option<RawMultisigRecord>, EngineError> {
        self.storage.get_multisig_record(chain, multisig, call_hash).await
    }

    async fn get_block_hash(
        &self,
        chain: &ChainId,
        height: BlockNumber,
    ) -> Result<BlockHash, EngineError> {
        self.storage.get_block_hash(chain, height).await
    }

    async fn get_block_timestamp(
        &self,
        chain: &ChainId,
        block_hash: &BlockHash,
    ) -> Result<u64, EngineError> {
        self.storage.get_block_timestamp(chain, block_hash).await
    }

    async fn get_proxy_definitions(
        &self,
        chain: &ChainId,
        proxy: &Address,
    ) -> Result<Vec<RawProxyDefinition>, EngineError> {
        self.storage.get_proxy_definitions(chain, proxy).await
    }
}

#[async_trait]
impl ChainConnector for MockChainConnector {
    type Connection = MockConnection;

    async fn connect(&self, endpoint: &str) -> Result<MockConnection, EngineError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.down.lock().contains(endpoint) {
            return Err(EngineError::ChainUnavailable(format!("{} refused connection", endpoint)));
        }
        Ok(MockConnection {
            endpoint: endpoint.to_string(),
            storage: self.storage.clone(),
        })
    }
}

//! # Vault Service
//!
//! Application service orchestrating a refresh:
//!
//! 1. list the open call hashes of the multisig
//! 2. read every record and its creation block metadata concurrently
//! 3. assemble transactions
//! 4. publish the snapshot unless a newer refresh has started meanwhile

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use futures::future::join_all;
use lru::LruCache;
use parking_lot::Mutex;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;
use vault_telemetry::{log_event, log_tx_event};

use super::assembler::TransactionAssembler;
use super::call_data_resolver::CallDataResolver;
use crate::adapters::JsonCacheStore;
use crate::algorithms::{any_delegatees, evaluate_readiness, Delegatees};
use crate::config::EngineConfig;
use crate::domain::{
    Address, Balance, BlockHash, BlockNumber, CallHash, ChainId, DataQualityWarning, EngineError,
    Multisig, RawPendingTransaction, Transaction, TransactionFailure,
};
use crate::ports::{
    CallDataBackend, ChainStorageReader, FeeEstimator, PendingSnapshot, TransactionReview, VaultApi,
};

type DetailRead = Result<Option<(RawPendingTransaction, Option<DataQualityWarning>)>, EngineError>;

/// Vault service - owns the resolver, the assembler and the published snapshot.
pub struct VaultService<C: ChainStorageReader, B: CallDataBackend> {
    /// Configuration.
    config: EngineConfig,
    /// Chain storage.
    chain: Arc<C>,
    /// Call-data resolver (shared with the assembler).
    resolver: Arc<CallDataResolver<B>>,
    /// Transaction assembler.
    assembler: TransactionAssembler<B>,
    /// Optional fee estimator.
    fee_estimator: Option<Arc<dyn FeeEstimator>>,
    /// Generation of the most recently started refresh.
    generation: AtomicU64,
    /// Block hash by height.
    block_hashes: Mutex<LruCache<(ChainId, BlockNumber), BlockHash>>,
    /// Block timestamp (unix millis) by hash.
    block_times: Mutex<LruCache<(ChainId, BlockHash), u64>>,
    /// Published snapshots.
    snapshots: watch::Sender<Option<Arc<PendingSnapshot>>>,
}

impl<C: ChainStorageReader + 'static, B: CallDataBackend + 'static> VaultService<C, B> {
    /// Create a service.
    pub fn new(config: EngineConfig, chain: Arc<C>, backend: Arc<B>) -> Self {
        let resolver = Arc::new(CallDataResolver::new(
            backend,
            config.call_data_cache_size,
            config.call_data_timeout(),
            config.call_data_max_age(),
        ));
        let block_cache = NonZeroUsize::new(config.block_cache_size).unwrap_or(NonZeroUsize::MIN);
        let (snapshots, _) = watch::channel(None);
        Self {
            assembler: TransactionAssembler::new(resolver.clone()),
            resolver,
            chain,
            fee_estimator: None,
            generation: AtomicU64::new(0),
            block_hashes: Mutex::new(LruCache::new(block_cache)),
            block_times: Mutex::new(LruCache::new(block_cache)),
            snapshots,
            config,
        }
    }

    /// Attach a fee estimator used by [`VaultApi::review`].
    pub fn with_fee_estimator(mut self, estimator: Arc<dyn FeeEstimator>) -> Self {
        self.fee_estimator = Some(estimator);
        self
    }

    /// The call-data resolver.
    pub fn resolver(&self) -> &Arc<CallDataResolver<B>> {
        &self.resolver
    }

    /// Configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Load the persisted call-data cache, if a cache path is configured.
    pub fn restore_cache(&self) -> Result<usize, EngineError> {
        match &self.config.cache_path {
            Some(path) => JsonCacheStore::new(path.clone()).restore(&self.resolver),
            None => Ok(0),
        }
    }

    /// Persist the call-data cache, if a cache path is configured.
    pub fn persist_cache(&self) -> Result<(), EngineError> {
        match &self.config.cache_path {
            Some(path) => JsonCacheStore::new(path.clone()).persist(&self.resolver),
            None => Ok(()),
        }
    }

    /// Whether `address` is an `Any`-type delegate of `proxy`.
    pub async fn is_proxy_delegatee(
        &self,
        chain: &ChainId,
        proxy: &Address,
        address: &Address,
    ) -> Result<bool, EngineError> {
        let found = self.proxy_delegatees(chain, proxy).await?;
        Ok(found.delegatees.contains(address))
    }

    /// Internal: bound a chain read by the configured timeout.
    async fn chain_read<T>(
        &self,
        operation: &str,
        read: impl Future<Output = Result<T, EngineError>> + Send,
    ) -> Result<T, EngineError> {
        let limit = self.config.chain_read_timeout();
        tokio::time::timeout(limit, read)
            .await
            .map_err(|_| EngineError::Timeout {
                operation: operation.to_string(),
                after_ms: limit.as_millis() as u64,
            })?
    }

    /// Internal: creation time of `height`, memoised per chain.
    async fn block_time(&self, chain: &ChainId, height: BlockNumber) -> Result<DateTime<Utc>, EngineError> {
        let hash_key = (chain.clone(), height);
        let cached_hash = self.block_hashes.lock().get(&hash_key).copied();
        let block_hash = match cached_hash {
            Some(hash) => hash,
            None => {
                let hash = self
                    .chain_read("get_block_hash", self.chain.get_block_hash(chain, height))
                    .await?;
                self.block_hashes.lock().put(hash_key, hash);
                hash
            }
        };

        let time_key = (chain.clone(), block_hash);
        let cached_time = self.block_times.lock().get(&time_key).copied();
        let millis = match cached_time {
            Some(millis) => millis,
            None => {
                let millis = self
                    .chain_read(
                        "get_block_timestamp",
                        self.chain.get_block_timestamp(chain, &block_hash),
                    )
                    .await?;
                self.block_times.lock().put(time_key, millis);
                millis
            }
        };

        i64::try_from(millis)
            .ok()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .ok_or_else(|| EngineError::ChainUnavailable(format!("block {} timestamp {} out of range", height, millis)))
    }

    /// Internal: read one record and its creation time.
    async fn read_pending(&self, multisig: &Multisig, call_hash: CallHash) -> DetailRead {
        let chain = multisig.chain_id();
        let record = self
            .chain_read(
                "get_multisig_record",
                self.chain
                    .get_multisig_record(chain, &multisig.multisig_address(), &call_hash),
            )
            .await?;
        let Some(record) = record else {
            return Ok(None);
        };

        let (created_at, warning) = match self.block_time(chain, record.when.height).await {
            Ok(time) => (Some(time), None),
            Err(e) => {
                log_tx_event!(
                    warn,
                    "vault-service",
                    "creation time unavailable",
                    call_hash,
                    height = record.when.height,
                    error = %e
                );
                (
                    None,
                    Some(DataQualityWarning::BlockMetadataUnavailable {
                        call_hash,
                        reason: e.to_string(),
                    }),
                )
            }
        };

        Ok(Some((
            RawPendingTransaction {
                call_hash,
                record,
                created_at,
            },
            warning,
        )))
    }

    fn check_current(&self, generation: u64) -> Result<(), EngineError> {
        let latest = self.generation.load(Ordering::SeqCst);
        if latest != generation {
            log_event!(info, "vault-service", "refresh superseded, discarding", generation = generation, latest = latest);
            return Err(EngineError::Superseded { generation, latest });
        }
        Ok(())
    }

    async fn estimate(
        &self,
        estimator: &dyn FeeEstimator,
        multisig: &Multisig,
        transaction: &Transaction,
    ) -> Option<Balance> {
        let limit = self.config.fee_estimate_timeout();
        match tokio::time::timeout(limit, estimator.estimate_fee(multisig, transaction)).await {
            Ok(Ok(fee)) => Some(fee),
            Ok(Err(e)) => {
                log_tx_event!(warn, "vault-service", "fee estimate failed", transaction.call_hash(), error = %e);
                None
            }
            Err(_) => {
                log_tx_event!(warn, "vault-service", "fee estimate timed out", transaction.call_hash());
                None
            }
        }
    }
}

#[async_trait]
impl<C: ChainStorageReader + 'static, B: CallDataBackend + 'static> VaultApi for VaultService<C, B> {
    async fn refresh(&self, multisig: &Multisig) -> Result<Arc<PendingSnapshot>, EngineError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let id = Uuid::new_v4();
        let multisig_address = multisig.multisig_address();
        let chain = multisig.chain_id();
        log_event!(
            debug,
            "vault-service",
            "refresh started",
            id = %id,
            generation = generation,
            multisig = %multisig_address,
            chain = %chain
        );

        let call_hashes = self
            .chain_read(
                "list_multisig_call_hashes",
                self.chain.list_multisig_call_hashes(chain, &multisig_address),
            )
            .await?;
        self.check_current(generation)?;

        let reads = join_all(
            call_hashes
                .iter()
                .map(|call_hash| self.read_pending(multisig, *call_hash)),
        )
        .await;

        let mut raws = Vec::with_capacity(reads.len());
        let mut warnings = Vec::new();
        let mut failures = Vec::new();
        for (call_hash, read) in call_hashes.into_iter().zip(reads) {
            match read {
                Ok(Some((raw, warning))) => {
                    raws.push(raw);
                    warnings.extend(warning);
                }
                Ok(None) => {
                    log_tx_event!(info, "vault-service", "record vanished after listing, no longer pending", call_hash);
                    warnings.push(DataQualityWarning::StaleRead { call_hash });
                }
                Err(error) => {
                    log_tx_event!(warn, "vault-service", "record read failed", call_hash, error = %error);
                    failures.push(TransactionFailure { call_hash, error });
                }
            }
        }

        let assembled = self.assembler.assemble(multisig, raws).await;
        self.check_current(generation)?;

        warnings.extend(assembled.warnings);
        failures.extend(assembled.failures);
        let snapshot = Arc::new(PendingSnapshot {
            id,
            generation,
            multisig_address,
            chain_id: chain.clone(),
            refreshed_at: Utc::now(),
            transactions: assembled.transactions,
            warnings,
            failures,
        });

        let published = self.snapshots.send_if_modified(|current| {
            let newer = current.as_ref().map_or(true, |s| s.generation < generation);
            if newer {
                *current = Some(snapshot.clone());
            }
            newer
        });
        if !published {
            let latest = self.generation.load(Ordering::SeqCst);
            return Err(EngineError::Superseded { generation, latest });
        }

        log_event!(
            info,
            "vault-service",
            "refresh published",
            id = %id,
            generation = generation,
            pending = snapshot.transactions.len(),
            warnings = snapshot.warnings.len(),
            failures = snapshot.failures.len()
        );
        Ok(snapshot)
    }

    async fn review(&self, multisig: &Multisig, snapshot: &PendingSnapshot) -> Vec<TransactionReview> {
        let fees = match &self.fee_estimator {
            Some(estimator) => {
                join_all(
                    snapshot
                        .transactions
                        .iter()
                        .map(|tx| self.estimate(estimator.as_ref(), multisig, tx)),
                )
                .await
            }
            None => vec![None; snapshot.transactions.len()],
        };

        let pending = snapshot.pending_call_hashes();
        snapshot
            .transactions
            .iter()
            .zip(fees)
            .map(|(tx, estimated_fee)| TransactionReview {
                call_hash: tx.call_hash(),
                readiness: evaluate_readiness(tx, multisig, &pending),
                estimated_fee,
            })
            .collect()
    }

    async fn proxy_delegatees(
        &self,
        chain: &ChainId,
        proxy: &Address,
    ) -> Result<Delegatees, EngineError> {
        let definitions = self
            .chain_read("get_proxy_definitions", self.chain.get_proxy_definitions(chain, proxy))
            .await?;
        Ok(any_delegatees(&definitions))
    }

    fn latest_snapshot(&self) -> Option<Arc<PendingSnapshot>> {
        self.snapshots.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<Arc<PendingSnapshot>>> {
        self.snapshots.subscribe()
    }
}

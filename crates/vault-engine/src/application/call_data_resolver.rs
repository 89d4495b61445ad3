//! # Call Data Resolver
//!
//! Resolves a proposal's call hash to its full call bytes and description.
//!
//! - Cache hits are answered synchronously, without touching the service.
//! - Concurrent misses for the same key share one fetch and one result.
//! - Every fetch is bounded by a timeout. Failures become
//!   [`Resolution::NotFound`] and are never cached, so the next refresh retries.
//! - Returned bytes must hash to the requested call hash.

use crate::algorithms::{address_codec, blake2_256};
use crate::domain::{
    invariant_threshold, Address, CallData, CallHash, CallRecord, ChainId, ChangeConfigDetails,
    Multisig, Timepoint,
};
use crate::ports::{CallDataBackend, CallDataQuery, RawCallMetadata};
use chrono::Utc;
use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use vault_telemetry::log_tx_event;

/// Cache and coalescing key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallDataKey {
    /// Chain of the multisig.
    pub chain_id: ChainId,
    /// Multisig account.
    pub multisig: Address,
    /// Proposal call hash.
    pub call_hash: CallHash,
}

impl CallDataKey {
    /// Key for `call_hash` proposed on `multisig`.
    pub fn new(multisig: &Multisig, call_hash: CallHash) -> Self {
        Self {
            chain_id: multisig.chain_id().clone(),
            multisig: multisig.multisig_address(),
            call_hash,
        }
    }
}

/// Why no call data is available.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NotFoundReason {
    /// The service has no entry for this proposal.
    NotIndexed,
    /// The service failed.
    Unavailable(String),
    /// The service did not answer in time.
    TimedOut,
    /// The returned bytes do not hash to the call hash.
    HashMismatch,
    /// The returned payload is unusable.
    InvalidPayload(String),
}

/// Outcome of a resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Verified call data.
    Found(Arc<CallRecord>),
    /// Details unavailable.
    NotFound(NotFoundReason),
}

impl Resolution {
    /// The record, if found.
    pub fn record(&self) -> Option<&Arc<CallRecord>> {
        match self {
            Self::Found(record) => Some(record),
            Self::NotFound(_) => None,
        }
    }
}

/// Persisted cache entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedCallData {
    /// Cache key.
    pub key: CallDataKey,
    /// Cached record.
    pub record: CallRecord,
}

/// Cached, coalescing call-data resolver. The only writer of the call-data cache.
pub struct CallDataResolver<B: CallDataBackend> {
    backend: Arc<B>,
    cache: Mutex<LruCache<CallDataKey, Arc<CallRecord>>>,
    in_flight: Mutex<HashMap<CallDataKey, Arc<OnceCell<Resolution>>>>,
    fetch_timeout: Duration,
    max_age: chrono::Duration,
    fetches: AtomicU64,
}

impl<B: CallDataBackend> CallDataResolver<B> {
    /// Create a resolver over `backend`.
    pub fn new(
        backend: Arc<B>,
        capacity: usize,
        fetch_timeout: Duration,
        max_age: chrono::Duration,
    ) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            backend,
            cache: Mutex::new(LruCache::new(capacity)),
            in_flight: Mutex::new(HashMap::new()),
            fetch_timeout,
            max_age,
            fetches: AtomicU64::new(0),
        }
    }

    /// Synchronous cache read. Expired entries are dropped and not returned.
    pub fn cached(&self, key: &CallDataKey) -> Option<Arc<CallRecord>> {
        let mut cache = self.cache.lock();
        let expired = match cache.get(key) {
            Some(record) => Utc::now() - record.fetched_at > self.max_age,
            None => return None,
        };
        if expired {
            cache.pop(key);
            return None;
        }
        cache.get(key).cloned()
    }

    /// Resolve call data for `call_hash`, proposed on `multisig` at `timepoint`.
    pub async fn resolve(
        &self,
        multisig: &Multisig,
        call_hash: CallHash,
        timepoint: Timepoint,
    ) -> Resolution {
        let key = CallDataKey::new(multisig, call_hash);
        if let Some(record) = self.cached(&key) {
            return Resolution::Found(record);
        }

        let cell = {
            let mut in_flight = self.in_flight.lock();
            in_flight
                .entry(key.clone())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let resolution = cell
            .get_or_init(|| self.fetch(multisig, &key, timepoint))
            .await
            .clone();

        {
            let mut in_flight = self.in_flight.lock();
            if in_flight.get(&key).is_some_and(|current| Arc::ptr_eq(current, &cell)) {
                in_flight.remove(&key);
            }
        }

        resolution
    }

    async fn fetch(&self, multisig: &Multisig, key: &CallDataKey, timepoint: Timepoint) -> Resolution {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let query = CallDataQuery {
            chain_id: key.chain_id.clone(),
            multisig: address_codec::encode(&key.multisig, multisig.chain.ss58_prefix),
            timepoint,
        };

        let raw = match tokio::time::timeout(self.fetch_timeout, self.backend.fetch_call_data(&query)).await {
            Err(_) => {
                log_tx_event!(
                    warn,
                    "call-data-resolver",
                    "metadata fetch timed out",
                    key.call_hash,
                    after_ms = self.fetch_timeout.as_millis() as u64
                );
                return Resolution::NotFound(NotFoundReason::TimedOut);
            }
            Ok(Err(e)) => {
                log_tx_event!(warn, "call-data-resolver", "metadata fetch failed", key.call_hash, error = %e);
                return Resolution::NotFound(NotFoundReason::Unavailable(e.to_string()));
            }
            Ok(Ok(None)) => {
                log_tx_event!(debug, "call-data-resolver", "no metadata indexed", key.call_hash);
                return Resolution::NotFound(NotFoundReason::NotIndexed);
            }
            Ok(Ok(Some(raw))) => raw,
        };

        match verify(key.call_hash, raw) {
            Ok(record) => {
                let record = Arc::new(record);
                self.cache.lock().put(key.clone(), record.clone());
                Resolution::Found(record)
            }
            Err(reason) => {
                log_tx_event!(
                    warn,
                    "call-data-resolver",
                    "metadata rejected",
                    key.call_hash,
                    reason = ?reason
                );
                Resolution::NotFound(reason)
            }
        }
    }

    /// Drop one entry.
    pub fn invalidate(&self, key: &CallDataKey) {
        self.cache.lock().pop(key);
    }

    /// Drop every entry older than the max age. Returns how many were dropped.
    pub fn prune_expired(&self) -> usize {
        let now = Utc::now();
        let mut cache = self.cache.lock();
        let expired: Vec<CallDataKey> = cache
            .iter()
            .filter(|(_, record)| now - record.fetched_at > self.max_age)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            cache.pop(key);
        }
        expired.len()
    }

    /// Cache contents, least recently used first.
    pub fn export(&self) -> Vec<CachedCallData> {
        self.cache
            .lock()
            .iter()
            .rev()
            .map(|(key, record)| CachedCallData {
                key: key.clone(),
                record: record.as_ref().clone(),
            })
            .collect()
    }

    /// Load persisted entries. Expired or corrupted entries are skipped.
    pub fn import(&self, entries: Vec<CachedCallData>) -> usize {
        let now = Utc::now();
        let mut cache = self.cache.lock();
        let mut loaded = 0;
        for entry in entries {
            let intact = entry.key.call_hash == entry.record.call_hash
                && blake2_256(entry.record.call_data.as_bytes()) == *entry.key.call_hash.as_bytes();
            if !intact || now - entry.record.fetched_at > self.max_age {
                continue;
            }
            cache.put(entry.key, Arc::new(entry.record));
            loaded += 1;
        }
        loaded
    }

    /// Number of cached entries.
    pub fn cache_len(&self) -> usize {
        self.cache.lock().len()
    }

    /// Number of backend fetches started.
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::SeqCst)
    }
}

fn verify(call_hash: CallHash, raw: RawCallMetadata) -> Result<CallRecord, NotFoundReason> {
    let call_data = CallData::from_hex(&raw.call_data)
        .map_err(|e| NotFoundReason::InvalidPayload(e.to_string()))?;
    if blake2_256(call_data.as_bytes()) != *call_hash.as_bytes() {
        return Err(NotFoundReason::HashMismatch);
    }

    let change_config = match raw.change_config_details {
        Some(details) => {
            let signers = details
                .new_members
                .iter()
                .map(|member| address_codec::decode(member))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| NotFoundReason::InvalidPayload(e.to_string()))?;
            invariant_threshold(details.new_threshold, signers.len())
                .map_err(|e| NotFoundReason::InvalidPayload(e.to_string()))?;
            Some(ChangeConfigDetails {
                signers,
                threshold: details.new_threshold,
            })
        }
        None => None,
    };

    Ok(CallRecord {
        call_hash,
        call_data,
        description: raw.description,
        change_config,
        fetched_at: Utc::now(),
    })
}

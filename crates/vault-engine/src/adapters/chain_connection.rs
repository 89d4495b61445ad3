//! # Managed Chain Connection
//!
//! [`ManagedChainReader`] is the single owner of the live connection to one
//! chain. The rest of the engine only sees [`ChainStorageReader`] reads.
//!
//! Connecting walks the chain's endpoints in preference order, retrying the
//! whole list with exponential backoff. A read that fails with
//! `ChainUnavailable` drops the connection, reconnects, and is retried once.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use vault_telemetry::log_event;

use crate::config::EngineConfig;
use crate::domain::{
    Address, BlockHash, BlockNumber, CallHash, Chain, ChainId, EngineError, RawMultisigRecord,
    RawProxyDefinition,
};
use crate::ports::{ChainConnector, ChainStorageReader};

/// Reconnect schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Delay after the first failed round.
    pub initial: Duration,
    /// Delay ceiling.
    pub max: Duration,
    /// Rounds over the endpoint list before giving up.
    pub attempts: u32,
}

impl BackoffPolicy {
    /// Policy from engine configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            initial: Duration::from_millis(config.reconnect_initial_ms),
            max: Duration::from_millis(config.reconnect_max_ms),
            attempts: config.reconnect_attempts.max(1),
        }
    }

    /// Delay before round `round + 1` (0-based).
    pub fn delay(&self, round: u32) -> Duration {
        let factor = 1u32.checked_shl(round).unwrap_or(u32::MAX);
        self.initial.saturating_mul(factor).min(self.max)
    }
}

/// Chain reader owning a reconnecting connection.
pub struct ManagedChainReader<K: ChainConnector> {
    connector: K,
    chain_id: ChainId,
    endpoints: Vec<String>,
    policy: BackoffPolicy,
    connection: Mutex<Option<Arc<K::Connection>>>,
    reconnects: AtomicU64,
}

impl<K: ChainConnector> ManagedChainReader<K> {
    /// Create a reader for `chain`. No connection is opened until the first read.
    pub fn new(connector: K, chain: &Chain, policy: BackoffPolicy) -> Self {
        Self {
            connector,
            chain_id: chain.id.clone(),
            endpoints: chain.rpcs.clone(),
            policy,
            connection: Mutex::new(None),
            reconnects: AtomicU64::new(0),
        }
    }

    /// Times the connection was dropped after a failed read.
    pub fn reconnect_count(&self) -> u64 {
        self.reconnects.load(Ordering::SeqCst)
    }

    /// Whether a live connection is held.
    pub async fn is_connected(&self) -> bool {
        self.connection.lock().await.is_some()
    }

    fn check_chain(&self, chain: &ChainId) -> Result<(), EngineError> {
        if *chain != self.chain_id {
            return Err(EngineError::ChainUnavailable(format!(
                "reader for {} asked about {}",
                self.chain_id, chain
            )));
        }
        Ok(())
    }

    async fn connection(&self) -> Result<Arc<K::Connection>, EngineError> {
        let mut slot = self.connection.lock().await;
        if let Some(connection) = slot.as_ref() {
            return Ok(connection.clone());
        }

        let mut last_error = None;
        for round in 0..self.policy.attempts {
            for endpoint in &self.endpoints {
                match self.connector.connect(endpoint).await {
                    Ok(connection) => {
                        log_event!(
                            info,
                            "chain-connection",
                            "chain connected",
                            chain = %self.chain_id,
                            endpoint = %endpoint
                        );
                        let connection = Arc::new(connection);
                        *slot = Some(connection.clone());
                        return Ok(connection);
                    }
                    Err(e) => {
                        log_event!(
                            warn,
                            "chain-connection",
                            "connect failed",
                            chain = %self.chain_id,
                            endpoint = %endpoint,
                            round = round,
                            error = %e
                        );
                        last_error = Some(e);
                    }
                }
            }
            if round + 1 < self.policy.attempts {
                tokio::time::sleep(self.policy.delay(round)).await;
            }
        }

        Err(EngineError::ChainUnavailable(format!(
            "{}: no endpoint reachable ({})",
            self.chain_id,
            last_error.map_or_else(|| "no endpoints configured".to_string(), |e| e.to_string())
        )))
    }

    async fn drop_connection(&self, failed: &Arc<K::Connection>) {
        let mut slot = self.connection.lock().await;
        if slot.as_ref().is_some_and(|current| Arc::ptr_eq(current, failed)) {
            *slot = None;
            self.reconnects.fetch_add(1, Ordering::SeqCst);
        }
    }

    async fn with_connection<T, F, Fut>(&self, chain: &ChainId, read: F) -> Result<T, EngineError>
    where
        F: Fn(Arc<K::Connection>) -> Fut + Send + Sync,
        Fut: Future<Output = Result<T, EngineError>> + Send,
        T: Send,
    {
        self.check_chain(chain)?;
        let connection = self.connection().await?;
        match read(connection.clone()).await {
            Err(EngineError::ChainUnavailable(reason)) => {
                log_event!(
                    warn,
                    "chain-connection",
                    "read failed, reconnecting",
                    chain = %self.chain_id,
                    reason = %reason
                );
                self.drop_connection(&connection).await;
                let connection = self.connection().await?;
                read(connection).await
            }
            other => other,
        }
    }
}

#[async_trait]
impl<K: ChainConnector> ChainStorageReader for ManagedChainReader<K> {
    async fn list_multisig_call_hashes(
        &self,
        chain: &ChainId,
        multisig: &Address,
    ) -> Result<Vec<CallHash>, EngineError> {
        self.with_connection(chain, move |c| async move {
            c.list_multisig_call_hashes(chain, multisig).await
        })
        .await
    }

    async fn get_multisig_record(
        &self,
        chain: &ChainId,
        multisig: &Address,
        call_hash: &CallHash,
    ) -> Result<Option<RawMultisigRecord>, EngineError> {
        self.with_connection(chain, move |c| async move {
            c.get_multisig_record(chain, multisig, call_hash).await
        })
        .await
    }

    async fn get_block_hash(
        &self,
        chain: &ChainId,
        height: BlockNumber,
    ) -> Result<BlockHash, EngineError> {
        self.with_connection(chain, move |c| async move { c.get_block_hash(chain, height).await })
            .await
    }

    async fn get_block_timestamp(
        &self,
        chain: &ChainId,
        block_hash: &BlockHash,
    ) -> Result<u64, EngineError> {
        self.with_connection(chain, move |c| async move {
            c.get_block_timestamp(chain, block_hash).await
        })
        .await
    }

    async fn get_proxy_definitions(
        &self,
        chain: &ChainId,
        proxy: &Address,
    ) -> Result<Vec<RawProxyDefinition>, EngineError> {
        self.with_connection(chain, move |c| async move {
            c.get_proxy_definitions(chain, proxy).await
        })
        .await
    }
}

//! # Connection Flows
//!
//! `VaultService` over a `ManagedChainReader`: endpoint fallback, reconnect
//! after a dropped connection, and refusal of reads for another chain.

#[cfg(test)]
mod tests {
    use crate::support::*;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use vault_engine::{
        BackoffPolicy, Chain, EngineConfig, EngineError, ManagedChainReader, MockCallDataBackend,
        MockChainConnector, MockChainStorage, Multisig, VaultApi, VaultService,
    };

    const PRIMARY: &str = "wss://primary.example";
    const FALLBACK: &str = "wss://fallback.example";

    fn chain() -> Chain {
        Chain {
            rpcs: vec![PRIMARY.to_string(), FALLBACK.to_string()],
            ..Chain::polkadot()
        }
    }

    fn vault() -> Multisig {
        Multisig::new("ops", chain(), vec![account(1), account(2)], 1, None).unwrap()
    }

    struct Wired {
        storage: Arc<MockChainStorage>,
        reader: Arc<ManagedChainReader<MockChainConnector>>,
        service: VaultService<ManagedChainReader<MockChainConnector>, MockCallDataBackend>,
    }

    fn wired(down: &[&str]) -> Wired {
        let config = EngineConfig::for_testing();
        let storage = Arc::new(MockChainStorage::new());
        let connector = MockChainConnector {
            storage: storage.clone(),
            ..Default::default()
        };
        connector
            .down
            .lock()
            .extend(down.iter().map(|e| e.to_string()));
        let reader = Arc::new(ManagedChainReader::new(
            connector,
            &chain(),
            BackoffPolicy::from_config(&config),
        ));
        let service = VaultService::new(config, reader.clone(), Arc::new(MockCallDataBackend::new()));
        Wired {
            storage,
            reader,
            service,
        }
    }

    #[tokio::test]
    async fn test_refresh_through_fallback_endpoint() {
        let w = wired(&[PRIMARY]);
        let m = vault();
        let hash = call_hash_of(&remark_call(b"hi"));
        w.storage
            .insert_record(m.multisig_address(), hash, record(3, &[account(2)]));

        let snapshot = w.service.refresh(&m).await.unwrap();
        assert_eq!(snapshot.transactions.len(), 1);
        assert!(w.reader.is_connected().await);
    }

    #[tokio::test]
    async fn test_refresh_recovers_after_connection_loss() {
        let w = wired(&[]);
        let m = vault();
        w.storage.insert_record(
            m.multisig_address(),
            call_hash_of(&remark_call(b"hi")),
            record(3, &[]),
        );
        w.service.refresh(&m).await.unwrap();

        w.storage.should_fail.store(true, Ordering::SeqCst);
        assert!(matches!(
            w.service.refresh(&m).await,
            Err(EngineError::ChainUnavailable(_))
        ));
        assert!(w.reader.reconnect_count() >= 1);

        w.storage.should_fail.store(false, Ordering::SeqCst);
        let snapshot = w.service.refresh(&m).await.unwrap();
        assert_eq!(snapshot.transactions.len(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_chain_fails_refresh() {
        let w = wired(&[PRIMARY, FALLBACK]);
        let result = w.service.refresh(&vault()).await;
        assert!(matches!(result, Err(EngineError::ChainUnavailable(_))));
        assert!(w.service.latest_snapshot().is_none());
    }

    #[tokio::test]
    async fn test_reader_refuses_other_chain() {
        let w = wired(&[]);
        let kusama = Multisig::new("k", Chain::kusama(), vec![account(1), account(2)], 1, None).unwrap();
        assert!(matches!(
            w.service.refresh(&kusama).await,
            Err(EngineError::ChainUnavailable(_))
        ));
    }
}

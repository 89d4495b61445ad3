//! # Call Data Flows
//!
//! Off-chain call data through the resolver: caching across refreshes,
//! single-flight fetches, degraded metadata service, and the cache file.

#[cfg(test)]
mod tests {
    use crate::support::*;
    use futures::future::join_all;
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use tempfile::TempDir;
    use vault_engine::{
        CallDataKey, EngineConfig, NotFoundReason, Resolution, Timepoint, VaultApi,
        DETAILS_UNAVAILABLE,
    };

    #[tokio::test]
    async fn test_found_call_data_cached_across_refreshes() {
        let h = Harness::new();
        let m = two_of_three();
        h.propose(&m, &remark_call(b"a"), 10, &[]);

        h.service.refresh(&m).await.unwrap();
        h.service.refresh(&m).await.unwrap();
        h.service.refresh(&m).await.unwrap();
        assert_eq!(h.backend.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_unindexed_call_data_is_retried() {
        let h = Harness::new();
        let m = two_of_three();
        let call = remark_call(b"late");
        let hash = h.open_on_chain(&m, &call, 10, &[]);

        let first = h.service.refresh(&m).await.unwrap();
        assert_eq!(first.get(&hash).unwrap().description(), DETAILS_UNAVAILABLE);

        h.publish(&m, &call, 10, "indexed later", None);
        let second = h.service.refresh(&m).await.unwrap();
        assert_eq!(second.get(&hash).unwrap().description(), "indexed later");
        assert_eq!(h.backend.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_resolves_share_one_fetch() {
        let h = Harness::new();
        let m = two_of_three();
        let call = remark_call(b"popular");
        let hash = h.propose(&m, &call, 12, &[]);
        h.backend.set_delay(Some(Duration::from_millis(50)));

        let resolver = h.service.resolver().clone();
        let resolutions = join_all(
            (0..8).map(|_| resolver.resolve(&m, hash, Timepoint::new(12, 0))),
        )
        .await;

        assert_eq!(h.backend.fetch_count(), 1);
        assert!(resolutions
            .iter()
            .all(|r| r.record().is_some_and(|rec| rec.call_hash == hash)));
        assert!(resolver.cached(&CallDataKey::new(&m, hash)).is_some());
    }

    #[tokio::test]
    async fn test_slow_metadata_service_does_not_block_refresh() {
        let h = Harness::new();
        let m = two_of_three();
        let hash = h.propose(&m, &remark_call(b"slow"), 10, &[account(1)]);
        h.backend.set_delay(Some(Duration::from_secs(5)));

        let snapshot = tokio::time::timeout(Duration::from_secs(2), h.service.refresh(&m))
            .await
            .expect("refresh bounded by call-data timeout")
            .unwrap();
        let tx = snapshot.get(&hash).unwrap();
        assert_eq!(tx.description(), DETAILS_UNAVAILABLE);
        assert_eq!(tx.approvals().get(&account(1)), Some(true));
    }

    #[tokio::test]
    async fn test_metadata_service_down_keeps_transactions() {
        let h = Harness::new();
        let m = two_of_three();
        h.propose(&m, &remark_call(b"a"), 10, &[]);
        h.propose(&m, &remark_call(b"b"), 11, &[]);
        h.backend.should_fail.store(true, Ordering::SeqCst);

        let snapshot = h.service.refresh(&m).await.unwrap();
        assert_eq!(snapshot.transactions.len(), 2);
        assert!(snapshot
            .transactions
            .iter()
            .all(|t| t.call_data().is_none()));
        assert!(snapshot.failures.is_empty());
    }

    #[tokio::test]
    async fn test_call_data_not_matching_hash_is_rejected() {
        let h = Harness::new();
        let m = two_of_three();
        let hash = h.open_on_chain(&m, &remark_call(b"real"), 10, &[]);
        h.publish(&m, &remark_call(b"forged"), 10, "forged", None);

        let resolution = h
            .service
            .resolver()
            .resolve(&m, hash, Timepoint::new(10, 0))
            .await;
        assert!(matches!(
            resolution,
            Resolution::NotFound(NotFoundReason::HashMismatch)
        ));

        let snapshot = h.service.refresh(&m).await.unwrap();
        assert_eq!(snapshot.get(&hash).unwrap().description(), DETAILS_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_cache_survives_restart() {
        let dir = TempDir::new().unwrap();
        let config = EngineConfig {
            cache_path: Some(dir.path().join("call-data.json")),
            ..EngineConfig::for_testing()
        };
        let m = two_of_three();
        let call = remark_call(b"persisted");

        let first = Harness::with_config(config.clone());
        let hash = first.propose(&m, &call, 10, &[]);
        first.service.refresh(&m).await.unwrap();
        first.service.persist_cache().unwrap();

        // Same chain state, metadata service now unreachable.
        let second = Harness::with_config(config);
        second.open_on_chain(&m, &call, 10, &[]);
        second.backend.should_fail.store(true, Ordering::SeqCst);
        assert_eq!(second.service.restore_cache().unwrap(), 1);

        let snapshot = second.service.refresh(&m).await.unwrap();
        assert_eq!(snapshot.get(&hash).unwrap().description(), "proposal");
        assert_eq!(second.backend.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_no_cache_path_is_a_noop() {
        let h = Harness::new();
        assert_eq!(h.service.restore_cache().unwrap(), 0);
        h.service.persist_cache().unwrap();
    }
}

//! # Supersession Flows
//!
//! Overlapping refreshes: only the newest completed refresh is published, and a
//! slower, older refresh is reported as superseded instead of overwriting it.

#[cfg(test)]
mod tests {
    use crate::support::*;
    use std::time::Duration;
    use vault_engine::{EngineError, VaultApi};

    #[tokio::test]
    async fn test_older_refresh_discarded() {
        let h = Harness::new();
        let m = two_of_three();
        h.propose(&m, &remark_call(b"a"), 10, &[]);
        let mut rx = h.service.subscribe();

        h.storage.set_list_delay(Some(Duration::from_millis(150)));
        let (slow, fast) = tokio::join!(h.service.refresh(&m), async {
            tokio::time::sleep(Duration::from_millis(30)).await;
            h.storage.set_list_delay(None);
            h.service.refresh(&m).await
        });

        let fast = fast.unwrap();
        assert!(matches!(
            slow,
            Err(EngineError::Superseded { generation: 1, latest: 2 })
        ));
        assert_eq!(fast.generation, 2);

        // Exactly one publication, and it is the newer one.
        assert!(rx.has_changed().unwrap());
        let published = rx.borrow_and_update().clone().unwrap();
        assert_eq!(published.id, fast.id);
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_sequential_refreshes_each_publish() {
        let h = Harness::new();
        let m = two_of_three();
        let mut rx = h.service.subscribe();
        assert!(rx.borrow().is_none());

        let first = h.service.refresh(&m).await.unwrap();
        assert!(first.transactions.is_empty());
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().as_ref().unwrap().generation, 1);

        h.propose(&m, &remark_call(b"new"), 10, &[account(1)]);
        let second = h.service.refresh(&m).await.unwrap();
        rx.changed().await.unwrap();
        let latest = rx.borrow_and_update().clone().unwrap();
        assert_eq!(latest.id, second.id);
        assert_eq!(latest.transactions.len(), 1);
        assert_eq!(h.service.latest_snapshot().unwrap().generation, 2);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_snapshot() {
        let h = Harness::new();
        let m = two_of_three();
        h.propose(&m, &remark_call(b"a"), 10, &[]);
        let good = h.service.refresh(&m).await.unwrap();

        h.storage
            .should_fail
            .store(true, std::sync::atomic::Ordering::SeqCst);
        assert!(h.service.refresh(&m).await.is_err());
        assert_eq!(h.service.latest_snapshot().unwrap().id, good.id);
    }
}

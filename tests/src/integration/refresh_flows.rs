//! # Refresh Flows
//!
//! Pending transactions as seen by signers: approvals merged across address
//! encodings, readiness verdicts, and tolerance of garbled or racing chain data.

#[cfg(test)]
mod tests {
    use crate::support::*;
    use primitive_types::U256;
    use vault_engine::address_codec::encode;
    use vault_engine::ports::{MOCK_BLOCK_MILLIS, MOCK_GENESIS_MILLIS};
    use vault_engine::{
        calc_sum_outgoing, BlockedReason, DataQualityWarning, DecodedCall, Readiness, Ss58Prefix,
        TransactionType, VaultApi, DETAILS_UNAVAILABLE,
    };

    /// Flip the last character of an SS58 string so only the checksum breaks.
    fn garble(text: &str) -> String {
        let mut garbled = text.to_string();
        let last = garbled.pop().unwrap_or('1');
        garbled.push(if last == '2' { '3' } else { '2' });
        garbled
    }

    #[tokio::test]
    async fn test_single_approval_needs_one_more() {
        let h = Harness::new();
        let m = two_of_three();
        let call = transfer_call(&m.chain.calls, &account(9), 5_000_000_000);
        let hash = h.propose(&m, &call, 100, &[account(1)]);

        let snapshot = h.service.refresh(&m).await.unwrap();
        let tx = snapshot.get(&hash).unwrap();

        assert_eq!(tx.approvals().len(), 3);
        assert_eq!(tx.approvals().get(&account(1)), Some(true));
        assert_eq!(tx.approvals().get(&account(2)), Some(false));
        assert_eq!(tx.approvals().get(&account(3)), Some(false));
        assert!(snapshot.warnings.is_empty());

        let reviews = h.service.review(&m, &snapshot).await;
        assert_eq!(reviews[0].readiness, Readiness::NeedsMoreApprovals(1));
        assert_eq!(reviews[0].estimated_fee, None);
    }

    #[tokio::test]
    async fn test_fully_approved_transfer_is_ready() {
        let h = Harness::new();
        let m = two_of_three();
        let call = transfer_call(&m.chain.calls, &account(9), 12_500_000_000);
        let hash = h.propose(&m, &call, 100, &[account(1), account(3)]);

        let snapshot = h.service.refresh(&m).await.unwrap();
        let tx = snapshot.get(&hash).unwrap();
        assert_eq!(tx.description(), "proposal");
        assert_eq!(tx.decoded().map(DecodedCall::kind), Some(TransactionType::Transfer));
        assert_eq!(tx.depositor(), Some(account(1)));
        assert!(tx.can_cancel(&account(1)));
        assert!(!tx.can_cancel(&account(3)));
        assert_eq!(
            tx.created_at().unwrap().timestamp_millis() as u64,
            MOCK_GENESIS_MILLIS + 100 * MOCK_BLOCK_MILLIS
        );

        let outgoing = calc_sum_outgoing(tx).unwrap();
        assert_eq!(outgoing.len(), 1);
        assert_eq!(outgoing[0].amount, U256::from(12_500_000_000u64));

        let reviews = h.service.review(&m, &snapshot).await;
        assert!(reviews[0].readiness.is_ready());
    }

    #[tokio::test]
    async fn test_multisend_sums_per_token() {
        let h = Harness::new();
        let m = two_of_three();
        let t = &m.chain.calls;
        let call = batch_all_call(
            t,
            &[
                transfer_call(t, &account(7), 1_000),
                transfer_call(t, &account(8), 2_500),
            ],
        );
        let hash = h.propose(&m, &call, 40, &[account(2)]);

        let snapshot = h.service.refresh(&m).await.unwrap();
        let tx = snapshot.get(&hash).unwrap();
        let decoded = tx.decoded().unwrap();
        assert_eq!(decoded.kind(), TransactionType::MultiSend);
        assert_eq!(decoded.recipients().len(), 2);
        let outgoing = calc_sum_outgoing(tx).unwrap();
        assert_eq!(outgoing, vec![vault_engine::Balance::new(m.chain.native_token.clone(), 3_500u64)]);
    }

    #[tokio::test]
    async fn test_garbled_approver_is_tolerated() {
        let h = Harness::new();
        let m = two_of_three();
        let call = remark_call(b"rotate keys");
        let hash = call_hash_of(&call);
        let mut record = record(50, &[account(2)]);
        let bad = garble(&encode(&account(1), Ss58Prefix::POLKADOT));
        record.approvals.push(bad.clone());
        h.storage.insert_record(m.multisig_address(), hash, record);
        h.publish(&m, &call, 50, "remark", None);

        let snapshot = h.service.refresh(&m).await.unwrap();
        let tx = snapshot.get(&hash).unwrap();
        assert_eq!(tx.approvals().get(&account(1)), Some(false));
        assert_eq!(tx.approvals().get(&account(2)), Some(true));
        assert!(snapshot.failures.is_empty());
        assert!(matches!(
            &snapshot.warnings[..],
            [DataQualityWarning::UndecodableApprover { raw, .. }] if *raw == bad
        ));
    }

    #[tokio::test]
    async fn test_foreign_approver_not_counted() {
        let h = Harness::new();
        let m = two_of_three();
        let call = remark_call(b"x");
        let hash = h.propose(&m, &call, 60, &[account(1), account(77)]);

        let snapshot = h.service.refresh(&m).await.unwrap();
        let tx = snapshot.get(&hash).unwrap();
        assert_eq!(tx.approvals().approved_count(), 1);
        assert_eq!(
            snapshot.warnings,
            vec![DataQualityWarning::ForeignApprover {
                call_hash: hash,
                address: account(77),
            }]
        );
    }

    #[tokio::test]
    async fn test_vanished_record_is_omitted() {
        let h = Harness::new();
        let m = two_of_three();
        let kept = h.propose(&m, &remark_call(b"kept"), 10, &[account(1)]);
        let gone = h.propose(&m, &remark_call(b"gone"), 11, &[account(1)]);
        h.storage.vanish_after_listing(gone);

        let snapshot = h.service.refresh(&m).await.unwrap();
        assert_eq!(snapshot.transactions.len(), 1);
        assert!(snapshot.get(&kept).is_some());
        assert!(snapshot.get(&gone).is_none());
        assert!(snapshot.failures.is_empty());
    }

    #[tokio::test]
    async fn test_executed_proposal_drops_out() {
        let h = Harness::new();
        let m = two_of_three();
        let hash = h.propose(&m, &remark_call(b"done"), 10, &[account(1), account(2)]);
        assert_eq!(h.service.refresh(&m).await.unwrap().transactions.len(), 1);

        h.storage.remove_record(&m.multisig_address(), &hash);
        assert!(h.service.refresh(&m).await.unwrap().transactions.is_empty());
    }

    #[tokio::test]
    async fn test_missing_call_data_blocks_execution() {
        let h = Harness::new();
        let m = two_of_three();
        let hash = h.open_on_chain(&m, &remark_call(b"unindexed"), 30, &[account(1), account(2)]);

        let snapshot = h.service.refresh(&m).await.unwrap();
        let tx = snapshot.get(&hash).unwrap();
        assert_eq!(tx.description(), DETAILS_UNAVAILABLE);
        assert!(tx.call_data().is_none());
        assert!(tx.decoded().is_none());

        let reviews = h.service.review(&m, &snapshot).await;
        assert_eq!(
            reviews[0].readiness,
            Readiness::Blocked(BlockedReason::MissingCallData)
        );
    }

    #[tokio::test]
    async fn test_newest_first_and_undated_last() {
        let h = Harness::new();
        let m = two_of_three();
        let old = h.propose(&m, &remark_call(b"old"), 10, &[]);
        let new = h.propose(&m, &remark_call(b"new"), 20, &[]);
        let undated = h.propose(&m, &remark_call(b"undated"), 30, &[]);
        h.storage.fail_block(30);

        let snapshot = h.service.refresh(&m).await.unwrap();
        let order: Vec<_> = snapshot.transactions.iter().map(|t| t.call_hash()).collect();
        assert_eq!(order, vec![new, old, undated]);
        assert!(matches!(
            &snapshot.warnings[..],
            [DataQualityWarning::BlockMetadataUnavailable { call_hash, .. }] if *call_hash == undated
        ));
    }

    #[tokio::test]
    async fn test_proxied_transfer_decodes_inner_call() {
        let h = Harness::new();
        let proxy = account(50);
        let m = proxied_two_of_three(proxy);
        let t = &m.chain.calls;
        let call = proxy_call(t, &proxy, &transfer_call(t, &account(9), 42));
        let hash = h.propose(&m, &call, 5, &[account(3)]);

        let snapshot = h.service.refresh(&m).await.unwrap();
        let decoded = snapshot.get(&hash).unwrap().decoded().unwrap();
        assert_eq!(decoded.recipients()[0].address, account(9));
    }
}

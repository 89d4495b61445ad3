//! # Transaction Assembler
//!
//! Builds [`Transaction`] entities from raw proposals: approvals are
//! aggregated, call data resolved and decoded, timestamps attached.
//! One proposal's failure never aborts the others.

use super::call_data_resolver::{CallDataResolver, Resolution};
use crate::algorithms::{address_codec, aggregate, interpret_call, CallInterpretation};
use crate::domain::{
    DataQualityWarning, Multisig, RawPendingTransaction, Transaction,
    TransactionFailure, DETAILS_UNAVAILABLE,
};
use crate::ports::CallDataBackend;
use futures::future::join_all;
use std::cmp::Ordering;
use std::sync::Arc;
use vault_telemetry::log_tx_event;

/// Output of one assembly pass.
#[derive(Clone, Debug, Default)]
pub struct AssembledTransactions {
    /// Transactions, newest first.
    pub transactions: Vec<Transaction>,
    /// Tolerated data problems.
    pub warnings: Vec<DataQualityWarning>,
    /// Proposals dropped because of hard errors.
    pub failures: Vec<TransactionFailure>,
}

/// Assembles transactions. The only constructor of [`Transaction`].
pub struct TransactionAssembler<B: CallDataBackend> {
    resolver: Arc<CallDataResolver<B>>,
}

impl<B: CallDataBackend> TransactionAssembler<B> {
    /// Create an assembler resolving through `resolver`.
    pub fn new(resolver: Arc<CallDataResolver<B>>) -> Self {
        Self { resolver }
    }

    /// Assemble every proposal in `raws`, resolving call data concurrently.
    pub async fn assemble(
        &self,
        multisig: &Multisig,
        raws: Vec<RawPendingTransaction>,
    ) -> AssembledTransactions {
        let results = join_all(raws.into_iter().map(|raw| self.assemble_one(multisig, raw))).await;

        let mut out = AssembledTransactions::default();
        for (result, mut warnings) in results {
            out.warnings.append(&mut warnings);
            match result {
                Ok(transaction) => out.transactions.push(transaction),
                Err(failure) => out.failures.push(failure),
            }
        }
        out.transactions.sort_by(newest_first);
        out
    }

    async fn assemble_one(
        &self,
        multisig: &Multisig,
        raw: RawPendingTransaction,
    ) -> (Result<Transaction, TransactionFailure>, Vec<DataQualityWarning>) {
        let call_hash = raw.call_hash;
        let aggregation = aggregate(multisig, call_hash, &raw.record.approvals);
        let mut warnings = aggregation.warnings;

        let depositor = match address_codec::decode(&raw.record.depositor) {
            Ok(address) => Some(address),
            Err(e) => {
                log_tx_event!(warn, "assembler", "depositor is not a valid address", call_hash, error = %e);
                None
            }
        };

        let resolution = self
            .resolver
            .resolve(multisig, call_hash, raw.record.when)
            .await;

        let (description, decoded, call_data) = match resolution {
            Resolution::Found(record) => {
                match interpret_call(&record.call_data, multisig, record.change_config.as_ref()) {
                    Ok(CallInterpretation::Decoded(decoded)) => (
                        record.description.clone(),
                        Some(decoded),
                        Some(record.call_data.clone()),
                    ),
                    Ok(CallInterpretation::Malformed(reason)) => {
                        log_tx_event!(warn, "assembler", "call data does not decode", call_hash, reason = %reason);
                        warnings.push(DataQualityWarning::MalformedCallData { call_hash, reason });
                        (
                            DETAILS_UNAVAILABLE.to_string(),
                            None,
                            Some(record.call_data.clone()),
                        )
                    }
                    Err(error) => {
                        log_tx_event!(error, "assembler", "transaction excluded", call_hash, error = %error);
                        return (Err(TransactionFailure { call_hash, error }), warnings);
                    }
                }
            }
            Resolution::NotFound(reason) => {
                log_tx_event!(debug, "assembler", "call data unavailable", call_hash, reason = ?reason);
                (DETAILS_UNAVAILABLE.to_string(), None, None)
            }
        };

        let transaction = Transaction::new(
            call_hash,
            multisig.chain_id().clone(),
            raw.record.when,
            raw.created_at,
            description,
            decoded,
            aggregation.approvals,
            call_data,
            depositor,
        );
        (Ok(transaction), warnings)
    }
}

/// Newest first; undated transactions last; ties by call hash.
fn newest_first(a: &Transaction, b: &Transaction) -> Ordering {
    match (a.created_at(), b.created_at()) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.call_hash().cmp(&b.call_hash()))
}

//! # Vault Engine
//!
//! Transaction reconstruction and approval engine for threshold multisig vaults
//! on Substrate chains.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Turn partial, eventually-consistent chain storage plus independently fetched
//! off-chain call data into one consistent view: which transactions are pending,
//! who approved them, and whether each one can execute now.
//!
//! ## Guarantees
//!
//! | Concern | Behaviour |
//! |---------|-----------|
//! | Address equality | Raw public keys, never SS58 text |
//! | Approvals | Exactly one flag per current signer |
//! | Garbled chain data | Logged and excluded, refresh continues |
//! | Vanished records | Dropped as no longer pending |
//! | Call data | Cached, coalesced, hash-verified, timeout-bounded |
//! | Overlapping refreshes | Older results discarded, never merged |
//!
//! ## Module Structure
//!
//! ```text
//! vault-engine/
//! ├── domain/          # Address, Multisig, Transaction, errors, chains
//! ├── algorithms/      # SS58 codec, aggregation, call decoding, readiness
//! ├── ports/           # VaultApi (inbound) + chain/metadata/fee traits (outbound)
//! ├── application/     # CallDataResolver, TransactionAssembler, VaultService
//! ├── adapters/        # GraphQL client, managed chain connection, cache file
//! └── config.rs        # EngineConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::{BackoffPolicy, GraphqlMetadataClient, JsonCacheStore, ManagedChainReader};
pub use algorithms::{
    active_multisigs, address_codec, aggregate, any_delegatees, calc_sum_outgoing, decode_call,
    derive_multisig_address, evaluate_readiness, interpret_call, next_transaction_signer,
    Aggregation, BlockedReason, CallInterpretation, Delegatees, Readiness,
};
pub use application::{
    AssembledTransactions, CachedCallData, CallDataKey, CallDataResolver, NotFoundReason,
    Resolution, TransactionAssembler, VaultService,
};
pub use config::EngineConfig;
pub use domain::{
    chain_by_id, supported_chains, Address, Balance, BlockHash, CallData, CallHash, CallRecord,
    Chain, ChainId, ChangeConfigDetails, DataQualityWarning, DecodedCall, EngineError, Multisig,
    RawMultisigRecord, RawPendingTransaction, RawProxyDefinition, Ss58Prefix, Timepoint, Token,
    Transaction, TransactionApprovals, TransactionFailure, TransactionRecipient, TransactionType,
    DETAILS_UNAVAILABLE,
};
pub use ports::{
    CallDataBackend, CallDataQuery, ChainConnector, ChainStorageReader, FeeEstimator,
    MockCallDataBackend, MockChainConnector, MockChainStorage, MockFeeEstimator, PendingSnapshot,
    RawCallMetadata, RawChangeConfig, TransactionReview, VaultApi,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

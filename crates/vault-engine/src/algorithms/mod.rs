//! # Algorithms
//!
//! Pure functions over domain types. No I/O happens here.

pub mod address_codec;
pub mod approval_aggregator;
pub mod call_decoder;
pub mod delegation;
pub mod hashing;
pub mod multisig_account;
pub mod outgoing;
pub mod readiness;

pub use approval_aggregator::{aggregate, next_transaction_signer, Aggregation};
pub use call_decoder::{decode_call, interpret_call, CallInterpretation, RawCall, RawCallKind};
pub use delegation::{any_delegatees, Delegatees, PROXY_TYPE_ANY};
pub use hashing::{blake2_256, blake2_512};
pub use multisig_account::{active_multisigs, derive_multisig_address};
pub use outgoing::calc_sum_outgoing;
pub use readiness::{evaluate_readiness, BlockedReason, Readiness};

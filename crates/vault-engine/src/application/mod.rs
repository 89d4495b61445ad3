//! # Application Module
//!
//! Application services orchestrating the domain and outbound ports.

pub mod assembler;
pub mod call_data_resolver;
pub mod service;

pub use assembler::{AssembledTransactions, TransactionAssembler};
pub use call_data_resolver::{
    CachedCallData, CallDataKey, CallDataResolver, NotFoundReason, Resolution,
};
pub use service::VaultService;

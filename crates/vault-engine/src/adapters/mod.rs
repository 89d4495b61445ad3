//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements outbound port traits against real infrastructure: the
//! GraphQL metadata service, live chain connections, and the cache file.

mod cache_store;
mod chain_connection;
mod metadata_service;

pub use cache_store::JsonCacheStore;
pub use chain_connection::{BackoffPolicy, ManagedChainReader};
pub use metadata_service::GraphqlMetadataClient;

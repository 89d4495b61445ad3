//! # Integration Flows
//!
//! Each module drives `VaultService` end to end through the `VaultApi` port:
//!
//! - `refresh_flows`: listing, approvals, data-quality tolerance, ordering
//! - `config_change`: config-change exclusivity and decoding
//! - `call_data_flows`: resolver caching, coalescing, persistence
//! - `connection_flows`: managed chain connection under the service
//! - `supersession`: overlapping refreshes and snapshot publication

pub mod call_data_flows;
pub mod connection_flows;
pub mod refresh_flows;
pub mod supersession;

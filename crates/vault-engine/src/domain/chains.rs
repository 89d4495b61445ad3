//! # Supported Chains
//!
//! Chain descriptors and the call indices the decoder recognises on each.

use super::value_objects::{ChainId, Ss58Prefix, Token};
use serde::{Deserialize, Serialize};

/// `(pallet index, call index)` pair.
pub type CallIndex = (u8, u8);

/// Call indices of the extrinsics the decoder understands.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallIndexTable {
    /// balances.transfer_allow_death
    pub transfer_allow_death: CallIndex,
    /// balances.transfer_keep_alive
    pub transfer_keep_alive: CallIndex,
    /// utility.batch
    pub batch: CallIndex,
    /// utility.batch_all
    pub batch_all: CallIndex,
    /// utility.force_batch
    pub force_batch: CallIndex,
    /// proxy.proxy
    pub proxy: CallIndex,
    /// proxy.add_proxy
    pub add_proxy: CallIndex,
    /// proxy.remove_proxy
    pub remove_proxy: CallIndex,
    /// Encoded value of `ProxyType::Any`.
    pub proxy_type_any: u8,
}

impl CallIndexTable {
    fn with_pallets(balances: u8, utility: u8, proxy: u8) -> Self {
        Self {
            transfer_allow_death: (balances, 0),
            transfer_keep_alive: (balances, 3),
            batch: (utility, 0),
            batch_all: (utility, 2),
            force_batch: (utility, 4),
            proxy: (proxy, 0),
            add_proxy: (proxy, 1),
            remove_proxy: (proxy, 2),
            proxy_type_any: 0,
        }
    }
}

/// A chain a vault can live on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chain {
    /// Stable identifier, also sent to the metadata service.
    pub id: ChainId,
    /// Display name.
    pub name: String,
    /// Address encoding used by this chain.
    pub ss58_prefix: Ss58Prefix,
    /// Native token (transfer amounts are denominated in it).
    pub native_token: Token,
    /// Decoder call indices.
    pub calls: CallIndexTable,
    /// RPC endpoints, in preference order.
    pub rpcs: Vec<String>,
}

impl Chain {
    fn build(
        id: &str,
        name: &str,
        prefix: Ss58Prefix,
        symbol: &str,
        decimals: u8,
        calls: CallIndexTable,
        rpc: &str,
    ) -> Self {
        let chain_id = ChainId::new(id);
        Self {
            id: chain_id.clone(),
            name: name.to_string(),
            ss58_prefix: prefix,
            native_token: Token {
                id: id.to_string(),
                symbol: symbol.to_string(),
                decimals,
                chain_id,
            },
            calls,
            rpcs: vec![rpc.to_string()],
        }
    }

    /// Polkadot relay chain.
    pub fn polkadot() -> Self {
        Self::build(
            "polkadot",
            "Polkadot",
            Ss58Prefix::POLKADOT,
            "DOT",
            10,
            CallIndexTable::with_pallets(5, 26, 29),
            "wss://rpc.polkadot.io",
        )
    }

    /// Kusama relay chain.
    pub fn kusama() -> Self {
        Self::build(
            "kusama",
            "Kusama",
            Ss58Prefix::KUSAMA,
            "KSM",
            12,
            CallIndexTable::with_pallets(4, 24, 30),
            "wss://kusama-rpc.polkadot.io",
        )
    }

    /// Westend test network.
    pub fn westend() -> Self {
        Self::build(
            "westend",
            "Westend",
            Ss58Prefix::SUBSTRATE,
            "WND",
            12,
            CallIndexTable::with_pallets(4, 16, 22),
            "wss://westend-rpc.polkadot.io",
        )
    }
}

/// All built-in chains.
pub fn supported_chains() -> Vec<Chain> {
    vec![Chain::polkadot(), Chain::kusama(), Chain::westend()]
}

/// Look up a built-in chain by id.
pub fn chain_by_id(id: &str) -> Option<Chain> {
    supported_chains().into_iter().find(|c| c.id.as_str() == id)
}

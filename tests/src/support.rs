//! Shared fixtures: SCALE call encoders, chain records and a wired service.

use std::sync::Arc;

use parity_scale_codec::{Compact, Encode};
use vault_engine::address_codec::encode;
use vault_engine::algorithms::blake2_256;
use vault_engine::domain::{BlockNumber, CallIndex, CallIndexTable};
use vault_engine::{
    Address, CallDataQuery, CallHash, Chain, EngineConfig, MockCallDataBackend,
    MockChainStorage, Multisig, RawCallMetadata, RawChangeConfig, RawMultisigRecord, Ss58Prefix,
    Timepoint, VaultService,
};

// =============================================================================
// ACCOUNTS
// =============================================================================

/// Deterministic test account.
pub fn account(seed: u8) -> Address {
    Address::from_public_key([seed; 32])
}

/// 2-of-3 vault on Polkadot with signers 1, 2, 3.
pub fn two_of_three() -> Multisig {
    Multisig::new(
        "treasury",
        Chain::polkadot(),
        vec![account(1), account(2), account(3)],
        2,
        None,
    )
    .expect("valid multisig")
}

/// Same signers, fronted by the pure proxy `proxy`.
pub fn proxied_two_of_three(proxy: Address) -> Multisig {
    Multisig::new(
        "treasury",
        Chain::polkadot(),
        vec![account(1), account(2), account(3)],
        2,
        Some(proxy),
    )
    .expect("valid multisig")
}

// =============================================================================
// CALL ENCODERS
// =============================================================================

fn head(index: CallIndex) -> Vec<u8> {
    vec![index.0, index.1]
}

fn multi_address(out: &mut Vec<u8>, address: &Address) {
    out.push(0);
    out.extend_from_slice(address.as_bytes());
}

/// `balances.transfer_keep_alive(dest, value)`.
pub fn transfer_call(table: &CallIndexTable, dest: &Address, value: u128) -> Vec<u8> {
    let mut out = head(table.transfer_keep_alive);
    multi_address(&mut out, dest);
    Compact(value).encode_to(&mut out);
    out
}

/// `utility.batch_all(calls)`.
pub fn batch_all_call(table: &CallIndexTable, calls: &[Vec<u8>]) -> Vec<u8> {
    let mut out = head(table.batch_all);
    Compact(calls.len() as u32).encode_to(&mut out);
    for call in calls {
        out.extend_from_slice(call);
    }
    out
}

/// `proxy.proxy(real, None, call)`.
pub fn proxy_call(table: &CallIndexTable, real: &Address, call: &[u8]) -> Vec<u8> {
    let mut out = head(table.proxy);
    multi_address(&mut out, real);
    None::<u8>.encode_to(&mut out);
    out.extend_from_slice(call);
    out
}

fn proxy_admin(index: CallIndex, table: &CallIndexTable, delegate: &Address) -> Vec<u8> {
    let mut out = head(index);
    multi_address(&mut out, delegate);
    out.push(table.proxy_type_any);
    0u32.encode_to(&mut out);
    out
}

/// `proxy.add_proxy(delegate, Any, 0)`.
pub fn add_proxy_call(table: &CallIndexTable, delegate: &Address) -> Vec<u8> {
    proxy_admin(table.add_proxy, table, delegate)
}

/// `proxy.remove_proxy(delegate, Any, 0)`.
pub fn remove_proxy_call(table: &CallIndexTable, delegate: &Address) -> Vec<u8> {
    proxy_admin(table.remove_proxy, table, delegate)
}

/// `system.remark(payload)`.
pub fn remark_call(payload: &[u8]) -> Vec<u8> {
    let mut out = vec![0, 7];
    payload.to_vec().encode_to(&mut out);
    out
}

/// Proxied call swapping the proxy's controller from `current` to a new
/// `signers`/`threshold` multisig.
pub fn change_config_call(
    current: &Multisig,
    proxy: &Address,
    signers: &[Address],
    threshold: u16,
) -> Vec<u8> {
    let table = &current.chain.calls;
    let next = vault_engine::derive_multisig_address(signers, threshold);
    proxy_call(
        table,
        proxy,
        &batch_all_call(
            table,
            &[
                add_proxy_call(table, &next),
                remove_proxy_call(table, &current.multisig_address()),
            ],
        ),
    )
}

/// Hash a call the way the chain keys proposals.
pub fn call_hash_of(bytes: &[u8]) -> CallHash {
    CallHash::new(blake2_256(bytes))
}

// =============================================================================
// CHAIN RECORDS
// =============================================================================

/// Proposal opened by signer 1 at `height`, approved by `approvers`.
///
/// Approvers are rendered with the generic Substrate prefix, as some nodes do.
pub fn record(height: BlockNumber, approvers: &[Address]) -> RawMultisigRecord {
    RawMultisigRecord {
        when: Timepoint::new(height, 0),
        deposit: 20_088_000_000,
        depositor: encode(&account(1), Ss58Prefix::POLKADOT),
        approvals: approvers
            .iter()
            .map(|a| encode(a, Ss58Prefix::SUBSTRATE))
            .collect(),
    }
}

// =============================================================================
// HARNESS
// =============================================================================

/// A `VaultService` over in-memory chain storage and metadata service.
pub struct Harness {
    /// Chain side.
    pub storage: Arc<MockChainStorage>,
    /// Metadata service side.
    pub backend: Arc<MockCallDataBackend>,
    /// Engine under test.
    pub service: VaultService<MockChainStorage, MockCallDataBackend>,
}

impl Harness {
    /// Harness with test configuration.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::for_testing())
    }

    /// Harness with `config`.
    pub fn with_config(config: EngineConfig) -> Self {
        let storage = Arc::new(MockChainStorage::new());
        let backend = Arc::new(MockCallDataBackend::new());
        let service = VaultService::new(config, storage.clone(), backend.clone());
        Self {
            storage,
            backend,
            service,
        }
    }

    /// Open a proposal on chain and publish its call data off chain.
    pub fn propose(
        &self,
        multisig: &Multisig,
        call: &[u8],
        height: BlockNumber,
        approvers: &[Address],
    ) -> CallHash {
        let hash = self.open_on_chain(multisig, call, height, approvers);
        self.publish(multisig, call, height, "proposal", None);
        hash
    }

    /// Open a proposal on chain only.
    pub fn open_on_chain(
        &self,
        multisig: &Multisig,
        call: &[u8],
        height: BlockNumber,
        approvers: &[Address],
    ) -> CallHash {
        let hash = call_hash_of(call);
        self.storage
            .insert_record(multisig.multisig_address(), hash, record(height, approvers));
        hash
    }

    /// Publish call data for the proposal created at `height`.
    pub fn publish(
        &self,
        multisig: &Multisig,
        call: &[u8],
        height: BlockNumber,
        description: &str,
        change_config: Option<(&[Address], u16)>,
    ) {
        self.backend.insert(
            query(multisig, height),
            RawCallMetadata {
                call_data: format!("0x{}", hex::encode(call)),
                description: description.to_string(),
                change_config_details: change_config.map(|(signers, threshold)| RawChangeConfig {
                    new_threshold: threshold,
                    new_members: signers
                        .iter()
                        .map(|s| encode(s, multisig.chain.ss58_prefix))
                        .collect(),
                }),
            },
        );
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

/// Metadata service key for the proposal created at `height`.
pub fn query(multisig: &Multisig, height: BlockNumber) -> CallDataQuery {
    CallDataQuery {
        chain_id: multisig.chain_id().clone(),
        multisig: encode(&multisig.multisig_address(), multisig.chain.ss58_prefix),
        timepoint: Timepoint::new(height, 0),
    }
}

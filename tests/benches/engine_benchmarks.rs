//! # Vault Engine Benchmarks
//!
//! Hot paths of a refresh, run once per proposal:
//!
//! | Path | Work |
//! |------|------|
//! | SS58 decode | base58 + blake2b-512 checksum |
//! | Aggregation | decode every approver, match against signers |
//! | Call interpretation | SCALE walk of proxy/batch call trees |
//! | Account derivation | SCALE + blake2b-256 |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use vault_engine::address_codec::{decode, encode};
use vault_engine::{
    aggregate, derive_multisig_address, interpret_call, Address, CallData, CallHash, Chain,
    Multisig, Ss58Prefix,
};
use vault_tests::support::{account, batch_all_call, proxy_call, transfer_call};

fn signers(n: u8) -> Vec<Address> {
    (1..=n).map(account).collect()
}

fn bench_address_decode(c: &mut Criterion) {
    let text = encode(&account(7), Ss58Prefix::POLKADOT);
    c.bench_function("ss58-decode", |b| b.iter(|| decode(black_box(&text))));
}

fn bench_aggregation(c: &mut Criterion) {
    let mut group = c.benchmark_group("approval-aggregation");
    for n in [3u8, 10, 50] {
        let multisig = Multisig::new("bench", Chain::polkadot(), signers(n), n as u16, None)
            .expect("valid multisig");
        let approvers: Vec<String> = signers(n)
            .iter()
            .map(|a| encode(a, Ss58Prefix::SUBSTRATE))
            .collect();
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &approvers, |b, approvers| {
            b.iter(|| aggregate(&multisig, CallHash::new([0; 32]), black_box(approvers)))
        });
    }
    group.finish();
}

fn bench_call_interpretation(c: &mut Criterion) {
    let proxy = account(200);
    let multisig = Multisig::new("bench", Chain::polkadot(), signers(3), 2, Some(proxy))
        .expect("valid multisig");
    let t = &multisig.chain.calls;

    let mut group = c.benchmark_group("call-interpretation");
    for n in [1usize, 16, 128] {
        let transfers: Vec<Vec<u8>> = (0..n)
            .map(|i| transfer_call(t, &account(i as u8), 1_000 + i as u128))
            .collect();
        let call = CallData::new(proxy_call(t, &proxy, &batch_all_call(t, &transfers)));
        group.throughput(Throughput::Bytes(call.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &call, |b, call| {
            b.iter(|| interpret_call(black_box(call), &multisig, None))
        });
    }
    group.finish();
}

fn bench_account_derivation(c: &mut Criterion) {
    let keys = signers(10);
    c.bench_function("multisig-account", |b| {
        b.iter(|| derive_multisig_address(black_box(&keys), 6))
    });
}

criterion_group!(
    benches,
    bench_address_decode,
    bench_aggregation,
    bench_call_interpretation,
    bench_account_derivation
);
criterion_main!(benches);

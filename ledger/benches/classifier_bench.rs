use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use tint_ledger::{build_working_outputs, classify, Block, BlockApplier, BlockTx, Payload, TxContext};
use tint_store_memory::MemoryOutputStore;
use tint_types::{ChainParams, NetworkId, RawOutput, RuleSet, TxId};

const HEIGHT: u32 = 10_000;

fn raw_outputs(tx_id: TxId, count: usize, height: u32) -> Vec<RawOutput> {
    let lock = Payload::BondLock {
        version: 1,
        duration: 144,
    }
    .encode();
    (0..count)
        .map(|i| RawOutput {
            index: i as u32,
            value: 1_000,
            tx_id,
            locking_script: None,
            address: None,
            metadata: (i % 4 == 0).then(|| lock.clone()),
            block_height: height,
        })
        .collect()
}

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");
    let rules = RuleSet::genesis_rules();
    let tx_id = TxId::new([1; 32]);

    for count in [1, 10, 100, 1000] {
        let raws = raw_outputs(tx_id, count, HEIGHT);
        let context = TxContext {
            tx_id,
            height: HEIGHT,
            input_conserved_value: 1_000 * count as u64,
            is_genesis: false,
        };
        group.bench_with_input(BenchmarkId::new("outputs", count), &count, |b, _| {
            b.iter(|| {
                let working = build_working_outputs(raws.iter().cloned());
                black_box(classify(context.clone(), working, black_box(&rules)))
            });
        });
    }

    group.finish();
}

fn bench_apply_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_block");
    let params = ChainParams::for_network(NetworkId::Regtest);
    let height = params.genesis_height + 1;

    for tx_count in [10, 100, 500] {
        let block = Block {
            height,
            txs: (0..tx_count)
                .map(|i| {
                    let mut id = [0u8; 32];
                    id[..4].copy_from_slice(&(i as u32 + 1).to_be_bytes());
                    let tx_id = TxId::new(id);
                    BlockTx {
                        tx_id,
                        outputs: raw_outputs(tx_id, 4, height),
                        spends: Vec::new(),
                        script_valid: true,
                    }
                })
                .collect(),
        };
        let applier = BlockApplier::new(params.clone());
        group.bench_with_input(BenchmarkId::new("txs", tx_count), &tx_count, |b, _| {
            b.iter(|| {
                let store = MemoryOutputStore::new();
                black_box(applier.apply(&store, black_box(&block)).ok())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_classify, bench_apply_block);
criterion_main!(benches);

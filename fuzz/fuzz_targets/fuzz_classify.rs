#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use tint_ledger::{build_working_outputs, classify, CommitOutcome, Finalizer, TxContext};
use tint_store_memory::MemoryOutputStore;
use tint_types::{OutputType, RawOutput, RuleSet, TxId};

#[derive(Debug, Arbitrary)]
struct FuzzOutput {
    value: u64,
    metadata: Option<Vec<u8>>,
}

#[derive(Debug, Arbitrary)]
struct FuzzTx {
    inputs: u64,
    is_genesis: bool,
    script_valid: bool,
    outputs: Vec<FuzzOutput>,
}

// Classification never panics, never leaves an output undefined, and the
// finalizer either commits every output or none.
fuzz_target!(|input: FuzzTx| {
    let tx_id = TxId::new([0x5a; 32]);
    let height = 1_000;
    let raws = input.outputs.into_iter().enumerate().map(|(i, o)| RawOutput {
        index: i as u32,
        value: o.value,
        tx_id,
        locking_script: None,
        address: None,
        metadata: o.metadata,
        block_height: height,
    });
    let working = build_working_outputs(raws);
    let count = working.len();
    let classified = classify(
        TxContext {
            tx_id,
            height,
            input_conserved_value: input.inputs,
            is_genesis: input.is_genesis,
        },
        working,
        &RuleSet::genesis_rules(),
    );
    assert!(classified.outputs.iter().all(|o| o.output_type() != OutputType::Undefined));

    let store = MemoryOutputStore::new();
    let outcome = Finalizer::new(&store)
        .commit(classified, input.script_valid)
        .expect("in-memory commit never fails fatally");
    let committed = tint_store::OutputStore::output_count(&store).unwrap_or(0) as usize;
    match outcome {
        CommitOutcome::Accepted(_) => assert_eq!(committed, count),
        _ => assert_eq!(committed, 0),
    }
});

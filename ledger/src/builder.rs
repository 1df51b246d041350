//! Working output construction.

use tint_types::{RawOutput, WorkingOutput};

/// Turn a transaction's raw outputs into fresh working outputs, preserving
/// order. Every result starts `Undefined` with no lock.
pub fn build_working_outputs<I>(raw: I) -> Vec<WorkingOutput>
where
    I: IntoIterator<Item = RawOutput>,
{
    raw.into_iter().map(WorkingOutput::from_raw).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tint_types::{OutputType, TxId};

    #[test]
    fn preserves_length_and_order() {
        let raws: Vec<RawOutput> = (0..4)
            .map(|i| RawOutput {
                index: i,
                value: 10 * u64::from(i),
                tx_id: TxId::new([1; 32]),
                locking_script: None,
                address: None,
                metadata: None,
                block_height: 9,
            })
            .collect();

        let working = build_working_outputs(raws.clone());
        assert_eq!(working.len(), raws.len());
        for (w, r) in working.iter().zip(&raws) {
            assert_eq!(w.raw(), r);
            assert_eq!(w.output_type(), OutputType::Undefined);
            assert_eq!(w.lock_threshold(), 0);
        }
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(build_working_outputs(Vec::new()).is_empty());
    }
}

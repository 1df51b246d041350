//! In-memory arena backend for [`OutputStore`].
//!
//! Finalized outputs live in ordered maps behind a single `RwLock`, so
//! readers run concurrently and each commit or rollback is applied as one
//! critical section. Ordered maps keep iteration identical on every node.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tint_store::{CommitRecord, OutputStore, StoreError, TxCommit};
use tint_types::{BlockHeight, FinalizedOutput, OutputKey, OutputType, TxId};

#[derive(Default)]
struct Arena {
    outputs: BTreeMap<OutputKey, FinalizedOutput>,
    by_type: BTreeMap<OutputType, BTreeSet<OutputKey>>,
    /// bond key -> unlock key
    unlocks: BTreeMap<OutputKey, OutputKey>,
    commits: BTreeMap<BlockHeight, Vec<CommitRecord>>,
}

impl Arena {
    fn insert(&mut self, output: &FinalizedOutput) {
        let key = output.key();
        self.by_type
            .entry(output.output_type())
            .or_default()
            .insert(key);
        if let (OutputType::BondUnlock, Some(bond)) = (output.output_type(), output.bond_target()) {
            self.unlocks.insert(bond, key);
        }
        self.outputs.insert(key, output.clone());
    }

    fn remove(&mut self, key: &OutputKey) -> Result<(), StoreError> {
        let output = self
            .outputs
            .remove(key)
            .ok_or_else(|| StoreError::Corruption(format!("commit record names missing output {key}")))?;
        if let Some(keys) = self.by_type.get_mut(&output.output_type()) {
            keys.remove(key);
        }
        if let Some(bond) = output.bond_target() {
            if self.unlocks.get(&bond) == Some(key) {
                self.unlocks.remove(&bond);
            }
        }
        Ok(())
    }
}

/// Thread-safe in-memory ledger store.
#[derive(Default)]
pub struct MemoryOutputStore {
    arena: RwLock<Arena>,
}

impl MemoryOutputStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Arena>, StoreError> {
        self.arena
            .read()
            .map_err(|_| StoreError::Backend("store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Arena>, StoreError> {
        self.arena
            .write()
            .map_err(|_| StoreError::Backend("store lock poisoned".into()))
    }
}

impl OutputStore for MemoryOutputStore {
    fn get_output(&self, key: &OutputKey) -> Result<Option<FinalizedOutput>, StoreError> {
        Ok(self.read()?.outputs.get(key).cloned())
    }

    fn exists(&self, key: &OutputKey) -> Result<bool, StoreError> {
        Ok(self.read()?.outputs.contains_key(key))
    }

    fn outputs_by_type(&self, output_type: OutputType) -> Result<Vec<FinalizedOutput>, StoreError> {
        let arena = self.read()?;
        let Some(keys) = arena.by_type.get(&output_type) else {
            return Ok(Vec::new());
        };
        keys.iter()
            .map(|k| {
                arena
                    .outputs
                    .get(k)
                    .cloned()
                    .ok_or_else(|| StoreError::Corruption(format!("type index names missing output {k}")))
            })
            .collect()
    }

    fn outputs_of_tx(&self, tx_id: &TxId) -> Result<Vec<FinalizedOutput>, StoreError> {
        let arena = self.read()?;
        let start = OutputKey::new(*tx_id, 0);
        let end = OutputKey::new(*tx_id, u32::MAX);
        Ok(arena.outputs.range(start..=end).map(|(_, o)| o.clone()).collect())
    }

    fn unlock_for(&self, bond: &OutputKey) -> Result<Option<OutputKey>, StoreError> {
        Ok(self.read()?.unlocks.get(bond).copied())
    }

    fn commit_tx(&self, commit: &TxCommit) -> Result<(), StoreError> {
        let mut arena = self.write()?;

        // Validate the whole batch before touching anything.
        let mut seen = BTreeSet::new();
        for output in &commit.outputs {
            let key = output.key();
            if !seen.insert(key) || arena.outputs.contains_key(&key) {
                return Err(StoreError::Duplicate(key.to_string()));
            }
        }

        for output in &commit.outputs {
            arena.insert(output);
        }
        arena
            .commits
            .entry(commit.height)
            .or_default()
            .push(commit.record());

        tracing::trace!(
            tx_id = %commit.tx_id,
            height = commit.height,
            outputs = commit.outputs.len(),
            "stored commit"
        );
        Ok(())
    }

    fn commits_at(&self, height: BlockHeight) -> Result<Vec<CommitRecord>, StoreError> {
        Ok(self.read()?.commits.get(&height).cloned().unwrap_or_default())
    }

    fn remove_height(&self, height: BlockHeight) -> Result<Vec<CommitRecord>, StoreError> {
        let mut arena = self.write()?;
        let Some(records) = arena.commits.remove(&height) else {
            return Ok(Vec::new());
        };
        // Undo in reverse commit order so a later unlock never outlives its
        // removal bookkeeping.
        for record in records.iter().rev() {
            for key in &record.output_keys {
                arena.remove(key)?;
            }
        }
        Ok(records)
    }

    fn iter_outputs(&self) -> Result<Vec<FinalizedOutput>, StoreError> {
        Ok(self.read()?.outputs.values().cloned().collect())
    }

    fn output_count(&self) -> Result<u64, StoreError> {
        Ok(self.read()?.outputs.len() as u64)
    }

    fn tip_height(&self) -> Result<Option<BlockHeight>, StoreError> {
        Ok(self.read()?.commits.keys().next_back().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tint_types::{RawOutput, WorkingOutput};

    fn finalized(tx: u8, index: u32, output_type: OutputType, height: BlockHeight) -> FinalizedOutput {
        let mut w = WorkingOutput::from_raw(RawOutput {
            index,
            value: 100,
            tx_id: TxId::new([tx; 32]),
            locking_script: None,
            address: None,
            metadata: None,
            block_height: height,
        });
        w.set_output_type(output_type);
        if output_type == OutputType::BondLock {
            w.set_lock_threshold(height + 10);
        }
        w.freeze().unwrap()
    }

    fn commit(tx: u8, height: BlockHeight, outputs: Vec<FinalizedOutput>) -> TxCommit {
        TxCommit {
            tx_id: TxId::new([tx; 32]),
            height,
            outputs,
            forfeited: 0,
            burnt: 0,
        }
    }

    #[test]
    fn commit_and_read_back() {
        let store = MemoryOutputStore::new();
        let out = finalized(1, 0, OutputType::ValueTransfer, 10);
        store.commit_tx(&commit(1, 10, vec![out.clone()])).unwrap();

        assert_eq!(store.get_output(&out.key()).unwrap(), Some(out.clone()));
        assert!(store.exists(&out.key()).unwrap());
        assert_eq!(store.output_count().unwrap(), 1);
        assert_eq!(store.outputs_by_type(OutputType::ValueTransfer).unwrap(), vec![out]);
        assert_eq!(store.tip_height().unwrap(), Some(10));
    }

    #[test]
    fn duplicate_key_writes_nothing() {
        let store = MemoryOutputStore::new();
        store
            .commit_tx(&commit(1, 10, vec![finalized(1, 0, OutputType::ValueTransfer, 10)]))
            .unwrap();

        let replay = commit(
            1,
            10,
            vec![
                finalized(1, 1, OutputType::ValueTransfer, 10),
                finalized(1, 0, OutputType::ValueTransfer, 10),
            ],
        );
        assert!(matches!(store.commit_tx(&replay), Err(StoreError::Duplicate(_))));
        assert_eq!(store.output_count().unwrap(), 1);
        assert_eq!(store.commits_at(10).unwrap().len(), 1);
    }

    #[test]
    fn duplicate_inside_one_commit_is_refused() {
        let store = MemoryOutputStore::new();
        let out = finalized(2, 0, OutputType::BaseCurrencyChange, 5);
        let result = store.commit_tx(&commit(2, 5, vec![out.clone(), out]));
        assert!(matches!(result, Err(StoreError::Duplicate(_))));
        assert_eq!(store.output_count().unwrap(), 0);
    }

    #[test]
    fn remove_height_clears_outputs_and_indexes() {
        let store = MemoryOutputStore::new();
        store
            .commit_tx(&commit(1, 10, vec![finalized(1, 0, OutputType::BondLock, 10)]))
            .unwrap();
        store
            .commit_tx(&commit(2, 11, vec![finalized(2, 0, OutputType::ValueTransfer, 11)]))
            .unwrap();

        let removed = store.remove_height(11).unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(store.output_count().unwrap(), 1);
        assert!(store.outputs_by_type(OutputType::ValueTransfer).unwrap().is_empty());
        assert_eq!(store.tip_height().unwrap(), Some(10));
        assert!(store.remove_height(11).unwrap().is_empty());
    }

    #[test]
    fn outputs_of_tx_are_index_ordered() {
        let store = MemoryOutputStore::new();
        store
            .commit_tx(&commit(
                4,
                3,
                vec![
                    finalized(4, 2, OutputType::BaseCurrencyChange, 3),
                    finalized(4, 0, OutputType::ValueTransfer, 3),
                ],
            ))
            .unwrap();
        store
            .commit_tx(&commit(5, 3, vec![finalized(5, 0, OutputType::ValueTransfer, 3)]))
            .unwrap();

        let indexes: Vec<u32> = store
            .outputs_of_tx(&TxId::new([4; 32]))
            .unwrap()
            .iter()
            .map(FinalizedOutput::index)
            .collect();
        assert_eq!(indexes, vec![0, 2]);
    }
}

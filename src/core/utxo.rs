use crate::core::transaction::OutPoint;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A spendable output as recorded in a branch's UTXO set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtxoEntry {
    pub value: u64,
    pub recipient_pubkey: Vec<u8>,
}

/// The unspent outputs of one branch of the tree.
///
/// Every chain node owns an independent set: `clone()` is the deep-copy
/// operation that lets sibling branches spend the same outputs in
/// mutually exclusive ways. None of the operations can fail; absence is
/// an `Option`/`bool`, never an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UtxoSet {
    entries: HashMap<OutPoint, UtxoEntry>,
}

impl UtxoSet {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Inserts or overwrites.
    pub fn insert(&mut self, outpoint: OutPoint, entry: UtxoEntry) {
        self.entries.insert(outpoint, entry);
    }

    /// Benign if the outpoint is absent.
    pub fn remove(&mut self, outpoint: &OutPoint) {
        self.entries.remove(outpoint);
    }

    pub fn contains(&self, outpoint: &OutPoint) -> bool {
        self.entries.contains_key(outpoint)
    }

    pub fn get(&self, outpoint: &OutPoint) -> Option<&UtxoEntry> {
        self.entries.get(outpoint)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OutPoint, &UtxoEntry)> {
        self.entries.iter()
    }

    pub fn total_value(&self) -> u64 {
        self.entries
            .values()
            .fold(0u64, |acc, entry| acc.saturating_add(entry.value))
    }
}

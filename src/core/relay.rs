use crate::core::Transaction;
use crate::crypto::hash::{Hash256, Hashable};
use std::collections::{HashMap, VecDeque};

/// Staging area for transactions that have not yet been confirmed in an
/// accepted block.
///
/// The pool is global: it is shared by every branch of the tree, because it
/// only tracks unconfirmed transactions, not branch-specific state. Entries
/// leave the pool when any accepted block on any branch confirms them.
/// Iteration is FIFO by submission time so the mining view is deterministic.
#[derive(Debug, Clone, Default)]
pub struct RelayPool {
    by_id: HashMap<Hash256, Transaction>,
    order: VecDeque<Hash256>,
}

impl RelayPool {
    pub fn new() -> Self {
        Self {
            by_id: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Inserts unconditionally; validity is only checked at block-acceptance
    /// time against the branch the transaction lands in. Re-submitting a
    /// known id keeps the original queue position.
    pub fn insert(&mut self, tx: Transaction) {
        let id = tx.hash();
        if self.by_id.insert(id, tx).is_none() {
            self.order.push_back(id);
        }
    }

    pub fn remove(&mut self, id: &Hash256) -> Option<Transaction> {
        self.by_id.remove(id)
    }

    pub fn contains(&self, id: &Hash256) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn get(&self, id: &Hash256) -> Option<&Transaction> {
        self.by_id.get(id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Pending transactions in submission order. Ids whose entries were
    /// removed on confirmation are skipped.
    pub fn iter(&self) -> impl Iterator<Item = (&Hash256, &Transaction)> {
        self.order
            .iter()
            .filter_map(|id| self.by_id.get_key_value(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::KeyPair;
    use crate::Result;

    #[test]
    fn test_insert_and_remove() -> Result<()> {
        let keypair = KeyPair::new()?;
        let tx = Transaction::new_coinbase(&keypair.public_key, 100);
        let id = tx.hash();

        let mut pool = RelayPool::new();
        pool.insert(tx);

        assert!(pool.contains(&id));
        assert_eq!(pool.len(), 1);

        let removed = pool.remove(&id).unwrap();
        assert_eq!(removed.hash(), id);
        assert!(pool.is_empty());

        Ok(())
    }

    #[test]
    fn test_resubmission_is_idempotent() -> Result<()> {
        let keypair = KeyPair::new()?;
        let tx = Transaction::new_coinbase(&keypair.public_key, 100);

        let mut pool = RelayPool::new();
        pool.insert(tx.clone());
        pool.insert(tx);

        assert_eq!(pool.len(), 1);
        assert_eq!(pool.iter().count(), 1);

        Ok(())
    }

    #[test]
    fn test_iteration_is_fifo_and_skips_removed() -> Result<()> {
        let keypair = KeyPair::new()?;
        let tx1 = Transaction::new_coinbase(&keypair.public_key, 1);
        let tx2 = Transaction::new_coinbase(&keypair.public_key, 2);
        let tx3 = Transaction::new_coinbase(&keypair.public_key, 3);
        let id2 = tx2.hash();

        let mut pool = RelayPool::new();
        pool.insert(tx1.clone());
        pool.insert(tx2);
        pool.insert(tx3.clone());

        pool.remove(&id2);

        let ids: Vec<Hash256> = pool.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![tx1.hash(), tx3.hash()]);

        Ok(())
    }
}

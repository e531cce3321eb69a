use crate::core::Transaction;
use crate::crypto::hash::{Hash256, Hashable};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// An accepted-candidate block. The first transaction is always the
/// coinbase; the remainder are the ordinary transactions in the order the
/// block producer chose them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockHeader {
    /// `Hash256::zero()` means no parent reference; only the genesis block
    /// may carry it.
    pub previous_hash: Hash256,
    pub merkle_root: Hash256,
    pub timestamp: u64,
    pub nonce: u64,
}

impl Block {
    pub fn new(previous_hash: Hash256, coinbase: Transaction, transactions: Vec<Transaction>) -> Self {
        let mut all = Vec::with_capacity(transactions.len() + 1);
        all.push(coinbase);
        all.extend(transactions);

        let merkle_root = Self::calculate_merkle_root(&all);
        let timestamp = Utc::now().timestamp() as u64;

        Self {
            header: BlockHeader {
                previous_hash,
                merkle_root,
                timestamp,
                nonce: 0,
            },
            transactions: all,
        }
    }

    /// A genesis block has no parent reference and carries only its coinbase.
    pub fn genesis(coinbase: Transaction) -> Self {
        Self::new(Hash256::zero(), coinbase, Vec::new())
    }

    pub fn has_parent(&self) -> bool {
        self.header.previous_hash != Hash256::zero()
    }

    pub fn coinbase(&self) -> &Transaction {
        // Constructors guarantee at least the coinbase slot.
        &self.transactions[0]
    }

    /// The ordinary transactions, coinbase excluded.
    pub fn ordinary(&self) -> &[Transaction] {
        &self.transactions[1..]
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    pub fn size(&self) -> usize {
        bincode::serialize(self).map(|data| data.len()).unwrap_or(0)
    }

    pub fn calculate_merkle_root(transactions: &[Transaction]) -> Hash256 {
        if transactions.is_empty() {
            return Hash256::zero();
        }

        let mut hashes: Vec<Hash256> = transactions.iter().map(|tx| tx.hash()).collect();

        while hashes.len() > 1 {
            let mut next_level = Vec::new();

            for chunk in hashes.chunks(2) {
                let mut bytes = Vec::new();
                bytes.extend_from_slice(chunk[0].as_bytes());
                // Duplicate the last hash if odd number
                bytes.extend_from_slice(chunk.get(1).unwrap_or(&chunk[0]).as_bytes());

                next_level.push(Hash256::hash(&bytes));
            }

            hashes = next_level;
        }

        hashes[0]
    }
}

impl Hashable for Block {
    fn hash(&self) -> Hash256 {
        self.header.hash()
    }
}

impl Hashable for BlockHeader {
    fn hash(&self) -> Hash256 {
        let mut data = Vec::new();
        data.extend_from_slice(self.previous_hash.as_bytes());
        data.extend_from_slice(self.merkle_root.as_bytes());
        data.extend_from_slice(&self.timestamp.to_le_bytes());
        data.extend_from_slice(&self.nonce.to_le_bytes());

        Hash256::hash(&data)
    }
}

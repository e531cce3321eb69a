use crate::config::ChainConfig;
use crate::consensus::TxValidator;
use crate::core::relay::RelayPool;
use crate::core::transaction::{OutPoint, Transaction};
use crate::core::utxo::{UtxoEntry, UtxoSet};
use crate::core::Block;
use crate::crypto::hash::{Hash256, Hashable};
use crate::RejectReason;
use slab::Slab;
use std::collections::HashMap;

/// Default retention horizon: a block may only attach at a height strictly
/// above `canonical height - CUT_OFF_AGE`.
pub const CUT_OFF_AGE: u64 = 10;

/// One accepted block plus the state needed to build on top of it.
#[derive(Debug)]
struct ChainNode {
    block: Block,
    /// UTXO set as of this block; an independent snapshot, never shared
    /// with the parent or siblings.
    utxo: UtxoSet,
    parent: Option<usize>,
    children: Vec<usize>,
    height: u64,
}

/// The tree of accepted blocks.
///
/// Nodes live in a slab arena and reference each other by index, so pruning
/// a subtree is a flat removal of entries rather than a graph traversal over
/// owning pointers. The canonical head is the deepest node; ties are broken
/// by first arrival. A single relay pool of unconfirmed transactions is
/// shared across all branches.
///
/// All mutations are synchronous and atomic: a rejected block leaves the
/// tree, the UTXO snapshots and the relay pool exactly as they were. The
/// tree does no internal locking; callers that share it across threads wrap
/// it in an `RwLock`.
pub struct BlockTree {
    nodes: Slab<ChainNode>,
    by_hash: HashMap<Hash256, usize>,
    root: usize,
    head: usize,
    relay_pool: RelayPool,
    validator: TxValidator,
    cut_off_age: u64,
}

impl BlockTree {
    /// Creates a tree containing just the genesis block. The genesis block
    /// is trusted: its coinbase outputs seed the UTXO set and nothing is
    /// re-validated.
    pub fn new(genesis: Block) -> Self {
        Self::with_config(genesis, ChainConfig::default(), TxValidator::new())
    }

    pub fn with_config(genesis: Block, config: ChainConfig, validator: TxValidator) -> Self {
        let mut utxo = UtxoSet::new();
        Self::credit_coinbase(&genesis, &mut utxo);

        let genesis_hash = genesis.hash();
        let mut nodes = Slab::new();
        let root = nodes.insert(ChainNode {
            block: genesis,
            utxo,
            parent: None,
            children: Vec::new(),
            height: 1,
        });

        let mut by_hash = HashMap::new();
        by_hash.insert(genesis_hash, root);

        log::info!("initialized block tree at genesis {}", genesis_hash);

        Self {
            nodes,
            by_hash,
            root,
            head: root,
            relay_pool: RelayPool::new(),
            validator,
            cut_off_age: config.cut_off_age,
        }
    }

    /// Validates `block` against its parent branch and attaches it.
    ///
    /// `Ok(())` means the node is fully inserted, confirmed transactions are
    /// dropped from the relay pool, the canonical head is updated if the new
    /// node is strictly deeper, and out-of-horizon branches are pruned. Any
    /// `Err` leaves the tree untouched.
    pub fn add_block(&mut self, block: Block) -> Result<(), RejectReason> {
        let hash = block.hash();
        if self.by_hash.contains_key(&hash) {
            return Err(RejectReason::DuplicateBlock);
        }

        if !block.has_parent() {
            return Err(RejectReason::UnknownParent);
        }

        let parent_idx = *self
            .by_hash
            .get(&block.header.previous_hash)
            .ok_or(RejectReason::UnknownParent)?;

        let height = self.nodes[parent_idx].height + 1;
        let head_height = self.nodes[self.head].height;
        if height + self.cut_off_age <= head_height {
            log::debug!(
                "rejecting block {} at height {} below horizon (head {})",
                hash,
                height,
                head_height
            );
            return Err(RejectReason::BelowRetentionHorizon);
        }

        // The first transaction must be the block's only coinbase.
        if block.transactions().is_empty()
            || !block.coinbase().is_coinbase()
            || block.ordinary().iter().any(|tx| tx.is_coinbase())
        {
            return Err(RejectReason::TransactionSetInvalid);
        }

        // All-or-nothing: a single invalid transaction rejects the block.
        let mut utxo = self.nodes[parent_idx].utxo.clone();
        let accepted = self.validator.apply_batch(block.ordinary(), &mut utxo);
        if accepted.len() != block.ordinary().len() {
            return Err(RejectReason::TransactionSetInvalid);
        }

        // The coinbase is applied unconditionally; producing a structurally
        // sound one is the block producer's duty.
        Self::credit_coinbase(&block, &mut utxo);

        let confirmed: Vec<Hash256> = block.transactions().iter().map(|tx| tx.hash()).collect();

        let node_idx = self.nodes.insert(ChainNode {
            block,
            utxo,
            parent: Some(parent_idx),
            children: Vec::new(),
            height,
        });
        self.nodes[parent_idx].children.push(node_idx);
        self.by_hash.insert(hash, node_idx);

        for txid in &confirmed {
            self.relay_pool.remove(txid);
        }

        // Strict comparison: an equal-height arrival never displaces the head.
        if height > head_height {
            self.head = node_idx;
            log::info!("canonical head moved to {} at height {}", hash, height);
        } else {
            log::debug!("accepted side block {} at height {}", hash, height);
        }

        self.prune();

        Ok(())
    }

    /// The block to mine on top of.
    pub fn canonical_block(&self) -> &Block {
        &self.nodes[self.head].block
    }

    pub fn canonical_height(&self) -> u64 {
        self.nodes[self.head].height
    }

    /// Independent copy of the canonical head's UTXO set, so the caller
    /// cannot corrupt retained state.
    pub fn canonical_utxo_set(&self) -> UtxoSet {
        self.nodes[self.head].utxo.clone()
    }

    /// Stages a transaction for future mining. No validation happens here;
    /// validity is re-checked at block-acceptance time against whichever
    /// branch the transaction lands in.
    pub fn submit_transaction(&mut self, tx: Transaction) {
        self.relay_pool.insert(tx);
    }

    /// Read-only view of the unconfirmed transactions.
    pub fn relay_pool(&self) -> &RelayPool {
        &self.relay_pool
    }

    pub fn contains_block(&self, hash: &Hash256) -> bool {
        self.by_hash.contains_key(hash)
    }

    /// Number of retained blocks.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn credit_coinbase(block: &Block, utxo: &mut UtxoSet) {
        let coinbase = block.coinbase();
        let txid = coinbase.hash();
        for (vout, output) in coinbase.outputs.iter().enumerate() {
            utxo.insert(
                OutPoint::new(txid, vout as u32),
                UtxoEntry {
                    value: output.value,
                    recipient_pubkey: output.recipient_pubkey.clone(),
                },
            );
        }
    }

    /// Discards every subtree that can no longer influence the canonical
    /// choice: a node goes once its height is below `head - cut_off_age` and
    /// nothing in its subtree reaches that boundary. Nodes at exactly the
    /// boundary stay, since a future block may still attach to them, and
    /// ancestors of the head always have a retained descendant.
    fn prune(&mut self) {
        let head_height = self.nodes[self.head].height;
        let boundary = match head_height.checked_sub(self.cut_off_age) {
            Some(boundary) if boundary >= 2 => boundary,
            _ => return,
        };

        // Only nodes below the boundary can lose children; every retained
        // one of them lies on a path toward the boundary.
        let mut stack = vec![self.root];
        let mut doomed = Vec::new();
        while let Some(idx) = stack.pop() {
            if self.nodes[idx].height >= boundary {
                continue;
            }
            for child in self.nodes[idx].children.clone() {
                if self.subtree_reaches(child, boundary) {
                    stack.push(child);
                } else {
                    doomed.push(child);
                }
            }
        }

        for idx in doomed {
            self.remove_subtree(idx);
        }
    }

    fn subtree_reaches(&self, idx: usize, boundary: u64) -> bool {
        if self.nodes[idx].height >= boundary {
            return true;
        }
        self.nodes[idx]
            .children
            .iter()
            .any(|&child| self.subtree_reaches(child, boundary))
    }

    fn remove_subtree(&mut self, subtree_root: usize) {
        if let Some(parent) = self.nodes[subtree_root].parent {
            self.nodes[parent].children.retain(|&c| c != subtree_root);
        }

        let mut stack = vec![subtree_root];
        while let Some(idx) = stack.pop() {
            let node = self.nodes.remove(idx);
            self.by_hash.remove(&node.block.hash());
            log::trace!(
                "pruned block {} at height {}",
                node.block.hash(),
                node.height
            );
            stack.extend(node.children);
        }
    }
}

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChainError>;

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why [`BlockTree::add_block`](crate::core::BlockTree::add_block) refused a
/// block. These are policy outcomes, not faults: the tree is left untouched
/// and the caller may keep going.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The block carries no parent reference, or its parent is not in the
    /// retained tree (also covers parents that have been pruned away).
    #[error("unknown or missing parent block")]
    UnknownParent,

    /// The block would attach below the retention horizon.
    #[error("block attaches below the retention horizon")]
    BelowRetentionHorizon,

    /// The block is structurally malformed or at least one of its ordinary
    /// transactions failed validation against the parent branch.
    #[error("block transaction set is invalid")]
    TransactionSetInvalid,

    /// A block with the same hash is already in the tree.
    #[error("block is already in the tree")]
    DuplicateBlock,
}

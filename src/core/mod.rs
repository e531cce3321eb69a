//! Core ledger components

pub mod block;
pub mod chain;
pub mod relay;
pub mod transaction;
pub mod utxo;

pub use block::{Block, BlockHeader};
pub use chain::{BlockTree, CUT_OFF_AGE};
pub use relay::RelayPool;
pub use transaction::{OutPoint, Transaction, TxInput, TxOutput};
pub use utxo::{UtxoEntry, UtxoSet};

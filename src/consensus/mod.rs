//! Transaction validation against a branch's UTXO set

pub mod validation;

pub use validation::{ClaimVerifier, SignatureVerifier, TxValidator};

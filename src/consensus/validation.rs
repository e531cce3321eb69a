use crate::core::transaction::{OutPoint, Transaction};
use crate::core::utxo::{UtxoEntry, UtxoSet};
use crate::crypto::hash::Hashable;
use crate::crypto::keys::PublicKey;
use crate::{ChainError, Result};
use std::collections::HashSet;

/// Decides whether an input's proof satisfies the claim predicate of the
/// output it spends. The default is ECDSA verification, but the capability
/// is an external collaborator and may be swapped out.
pub trait ClaimVerifier: Send + Sync {
    fn authorized(&self, tx: &Transaction, input_index: usize, claim: &[u8]) -> bool;
}

/// secp256k1 ECDSA over the transaction's signature hash; the claim is the
/// recipient's serialized public key.
#[derive(Debug, Clone, Default)]
pub struct SignatureVerifier;

impl ClaimVerifier for SignatureVerifier {
    fn authorized(&self, tx: &Transaction, input_index: usize, claim: &[u8]) -> bool {
        let public_key = match PublicKey::from_bytes(claim) {
            Ok(public_key) => public_key,
            Err(_) => return false,
        };

        tx.verify_signature(input_index, &public_key).unwrap_or(false)
    }
}

/// Validates transactions against a branch's UTXO set and applies the
/// accepted ones.
pub struct TxValidator {
    verifier: Box<dyn ClaimVerifier>,
}

impl TxValidator {
    pub fn new() -> Self {
        Self::with_verifier(Box::new(SignatureVerifier))
    }

    pub fn with_verifier(verifier: Box<dyn ClaimVerifier>) -> Self {
        Self { verifier }
    }

    /// A transaction is valid against `pool` iff every input spends an
    /// existing UTXO, every input's proof is authorized, no UTXO is spent
    /// twice within the transaction, and no value is created. Coinbase
    /// transactions are exempt from all four rules.
    pub fn check(&self, tx: &Transaction, pool: &UtxoSet) -> Result<()> {
        if tx.is_coinbase() {
            return Ok(());
        }

        let mut seen_outpoints = HashSet::new();
        let mut total_input_value = 0u64;

        for (input_index, input) in tx.inputs.iter().enumerate() {
            let outpoint = &input.previous_output;

            if !seen_outpoints.insert(outpoint.clone()) {
                return Err(ChainError::Transaction(
                    "Duplicate inputs in transaction".to_string(),
                ));
            }

            let entry = pool.get(outpoint).ok_or_else(|| {
                ChainError::Transaction(format!(
                    "Referenced UTXO not found: {}:{}",
                    outpoint.txid, outpoint.vout
                ))
            })?;

            if !self.verifier.authorized(tx, input_index, &entry.recipient_pubkey) {
                return Err(ChainError::Transaction(format!(
                    "Input {} is not authorized to spend its UTXO",
                    input_index
                )));
            }

            total_input_value = total_input_value.saturating_add(entry.value);
        }

        if total_input_value < tx.total_output_value() {
            return Err(ChainError::Transaction(
                "Total input value less than total output value".to_string(),
            ));
        }

        Ok(())
    }

    pub fn is_valid(&self, tx: &Transaction, pool: &UtxoSet) -> bool {
        self.check(tx, pool).is_ok()
    }

    /// Processes `txs` in order, each validated against the pool as mutated
    /// by the previously accepted transactions of the same batch. A
    /// transaction may therefore spend an output created earlier in the
    /// batch, and a later double spend of a consumed input is rejected.
    /// Returns the accepted subset in input order; `pool` ends up with the
    /// accepted transactions applied.
    pub fn apply_batch<'a>(
        &self,
        txs: &'a [Transaction],
        pool: &mut UtxoSet,
    ) -> Vec<&'a Transaction> {
        let mut accepted = Vec::new();

        for tx in txs {
            match self.check(tx, pool) {
                Ok(()) => {
                    Self::apply(tx, pool);
                    accepted.push(tx);
                }
                Err(e) => {
                    log::debug!("rejected tx {}: {}", tx.hash(), e);
                }
            }
        }

        accepted
    }

    /// Consumes the transaction's inputs and records its outputs. Callers
    /// must have validated `tx` against `pool` first.
    pub fn apply(tx: &Transaction, pool: &mut UtxoSet) {
        for input in &tx.inputs {
            pool.remove(&input.previous_output);
        }

        let txid = tx.hash();
        for (vout, output) in tx.outputs.iter().enumerate() {
            let outpoint = OutPoint::new(txid, vout as u32);
            let entry = UtxoEntry {
                value: output.value,
                recipient_pubkey: output.recipient_pubkey.clone(),
            };
            pool.insert(outpoint, entry);
        }
    }
}

impl Default for TxValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::KeyPair;

    fn funded_pool(owner: &KeyPair, value: u64) -> (UtxoSet, Transaction) {
        let coinbase = Transaction::new_coinbase(&owner.public_key, value);
        let mut pool = UtxoSet::new();
        TxValidator::apply(&coinbase, &mut pool);
        (pool, coinbase)
    }

    fn spend(
        source: &Transaction,
        vout: u32,
        owner: &KeyPair,
        recipient: &KeyPair,
        value: u64,
    ) -> Transaction {
        let mut tx = Transaction::new();
        tx.add_input(OutPoint::new(source.hash(), vout));
        tx.add_output(value, &recipient.public_key);
        tx.sign_input(0, &owner.private_key).unwrap();
        tx
    }

    #[test]
    fn test_valid_spend_accepted() -> Result<()> {
        let owner = KeyPair::new()?;
        let recipient = KeyPair::new()?;
        let (pool, coinbase) = funded_pool(&owner, 1000);

        let tx = spend(&coinbase, 0, &owner, &recipient, 1000);

        let validator = TxValidator::new();
        assert!(validator.is_valid(&tx, &pool));

        Ok(())
    }

    #[test]
    fn test_missing_utxo_rejected() -> Result<()> {
        let owner = KeyPair::new()?;
        let recipient = KeyPair::new()?;
        let (pool, coinbase) = funded_pool(&owner, 1000);

        // references an output index that does not exist
        let mut tx = Transaction::new();
        tx.add_input(OutPoint::new(coinbase.hash(), 5));
        tx.add_output(1000, &recipient.public_key);
        tx.sign_input(0, &owner.private_key)?;

        let validator = TxValidator::new();
        assert!(!validator.is_valid(&tx, &pool));

        Ok(())
    }

    #[test]
    fn test_unauthorized_spend_rejected() -> Result<()> {
        let owner = KeyPair::new()?;
        let thief = KeyPair::new()?;
        let (pool, coinbase) = funded_pool(&owner, 1000);

        // signed by the wrong key
        let tx = spend(&coinbase, 0, &thief, &thief, 1000);

        let validator = TxValidator::new();
        assert!(!validator.is_valid(&tx, &pool));

        Ok(())
    }

    #[test]
    fn test_duplicate_inputs_rejected() -> Result<()> {
        let owner = KeyPair::new()?;
        let recipient = KeyPair::new()?;
        let (pool, coinbase) = funded_pool(&owner, 1000);

        let mut tx = Transaction::new();
        tx.add_input(OutPoint::new(coinbase.hash(), 0));
        tx.add_input(OutPoint::new(coinbase.hash(), 0));
        tx.add_output(2000, &recipient.public_key);
        tx.sign_input(0, &owner.private_key)?;
        tx.sign_input(1, &owner.private_key)?;

        let validator = TxValidator::new();
        assert!(!validator.is_valid(&tx, &pool));

        Ok(())
    }

    #[test]
    fn test_value_creation_rejected() -> Result<()> {
        let owner = KeyPair::new()?;
        let recipient = KeyPair::new()?;
        let (pool, coinbase) = funded_pool(&owner, 1000);

        let tx = spend(&coinbase, 0, &owner, &recipient, 1001);

        let validator = TxValidator::new();
        assert!(!validator.is_valid(&tx, &pool));

        Ok(())
    }

    #[test]
    fn test_overflowing_outputs_rejected() -> Result<()> {
        let owner = KeyPair::new()?;
        let recipient = KeyPair::new()?;
        let (pool, coinbase) = funded_pool(&owner, 1000);

        // the wrapped sum of these outputs would slip under the input value
        let mut tx = Transaction::new();
        tx.add_input(OutPoint::new(coinbase.hash(), 0));
        tx.add_output(u64::MAX, &recipient.public_key);
        tx.add_output(2, &recipient.public_key);
        tx.sign_input(0, &owner.private_key)?;

        let validator = TxValidator::new();
        assert!(!validator.is_valid(&tx, &pool));

        Ok(())
    }

    #[test]
    fn test_batch_chains_within_itself() -> Result<()> {
        let owner = KeyPair::new()?;
        let middle = KeyPair::new()?;
        let recipient = KeyPair::new()?;
        let (mut pool, coinbase) = funded_pool(&owner, 1000);

        let tx1 = spend(&coinbase, 0, &owner, &middle, 1000);
        // spends the output tx1 creates in the same batch
        let tx2 = spend(&tx1, 0, &middle, &recipient, 1000);

        let validator = TxValidator::new();
        let batch = [tx1.clone(), tx2.clone()];
        let accepted = validator.apply_batch(&batch, &mut pool);

        assert_eq!(accepted.len(), 2);
        assert!(pool.contains(&OutPoint::new(tx2.hash(), 0)));
        assert!(!pool.contains(&OutPoint::new(tx1.hash(), 0)));

        Ok(())
    }

    #[test]
    fn test_batch_rejects_double_spend() -> Result<()> {
        let owner = KeyPair::new()?;
        let first = KeyPair::new()?;
        let second = KeyPair::new()?;
        let (mut pool, coinbase) = funded_pool(&owner, 1000);

        let tx1 = spend(&coinbase, 0, &owner, &first, 1000);
        // same input again, consumed by tx1 earlier in the batch
        let tx2 = spend(&coinbase, 0, &owner, &second, 1000);

        let validator = TxValidator::new();
        let batch = [tx1.clone(), tx2];
        let accepted = validator.apply_batch(&batch, &mut pool);

        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].hash(), tx1.hash());

        Ok(())
    }

    #[test]
    fn test_coinbase_exempt() {
        let validator = TxValidator::new();
        let keypair = KeyPair::new().unwrap();
        let coinbase = Transaction::new_coinbase(&keypair.public_key, 5000);

        // coinbase validates against an empty pool
        assert!(validator.is_valid(&coinbase, &UtxoSet::new()));
    }
}

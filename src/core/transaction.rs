use crate::crypto::hash::{Hash256, Hashable};
use crate::crypto::keys::{PrivateKey, PublicKey};
use crate::crypto::signatures::Signature;
use crate::{ChainError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub version: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxInput {
    pub previous_output: OutPoint,
    /// Compact ECDSA signature over the transaction's signature hash,
    /// proving the right to spend `previous_output`.
    pub signature_script: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxOutput {
    pub value: u64,
    /// Serialized public key of the recipient; the claim predicate an input
    /// spending this output must satisfy.
    pub recipient_pubkey: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct OutPoint {
    pub txid: Hash256,
    pub vout: u32,
}

impl Transaction {
    pub fn new() -> Self {
        Self {
            inputs: Vec::new(),
            outputs: Vec::new(),
            version: 1,
        }
    }

    /// A coinbase transaction mints its outputs out of nothing: it has no
    /// inputs and is exempt from validation.
    pub fn new_coinbase(recipient: &PublicKey, value: u64) -> Self {
        let output = TxOutput {
            value,
            recipient_pubkey: recipient.to_bytes().to_vec(),
        };

        Self {
            inputs: Vec::new(),
            outputs: vec![output],
            version: 1,
        }
    }

    pub fn add_input(&mut self, outpoint: OutPoint) {
        let input = TxInput {
            previous_output: outpoint,
            signature_script: Vec::new(),
        };
        self.inputs.push(input);
    }

    pub fn add_output(&mut self, value: u64, recipient: &PublicKey) {
        let output = TxOutput {
            value,
            recipient_pubkey: recipient.to_bytes().to_vec(),
        };
        self.outputs.push(output);
    }

    pub fn is_coinbase(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Saturating sum, so oversized outputs can never wrap back under the
    /// input total.
    pub fn total_output_value(&self) -> u64 {
        self.outputs
            .iter()
            .fold(0u64, |acc, output| acc.saturating_add(output.value))
    }

    pub fn size(&self) -> usize {
        bincode::serialize(self).map(|data| data.len()).unwrap_or(0)
    }

    /// Hash committed to by the signature of input `input_index`. Covers
    /// everything except the signature scripts themselves.
    pub fn signature_hash(&self, input_index: usize) -> Hash256 {
        let mut data = Vec::new();

        data.extend_from_slice(&self.version.to_le_bytes());
        data.extend_from_slice(&(input_index as u32).to_le_bytes());

        data.extend_from_slice(&(self.inputs.len() as u32).to_le_bytes());
        for input in &self.inputs {
            data.extend_from_slice(input.previous_output.txid.as_bytes());
            data.extend_from_slice(&input.previous_output.vout.to_le_bytes());
        }

        data.extend_from_slice(&(self.outputs.len() as u32).to_le_bytes());
        for output in &self.outputs {
            data.extend_from_slice(&output.value.to_le_bytes());
            data.extend_from_slice(&(output.recipient_pubkey.len() as u32).to_le_bytes());
            data.extend_from_slice(&output.recipient_pubkey);
        }

        Hash256::hash(&data)
    }

    pub fn sign_input(&mut self, input_index: usize, private_key: &PrivateKey) -> Result<()> {
        if input_index >= self.inputs.len() {
            return Err(ChainError::Transaction("Invalid input index".to_string()));
        }

        let signature_hash = self.signature_hash(input_index);
        let signature = private_key.sign(&signature_hash)?;
        self.inputs[input_index].signature_script = signature.to_bytes();

        Ok(())
    }

    pub fn verify_signature(&self, input_index: usize, public_key: &PublicKey) -> Result<bool> {
        if input_index >= self.inputs.len() {
            return Err(ChainError::Transaction("Invalid input index".to_string()));
        }

        let input = &self.inputs[input_index];
        if input.signature_script.is_empty() {
            return Ok(false);
        }

        let signature = match Signature::from_bytes(&input.signature_script) {
            Ok(signature) => signature,
            Err(_) => return Ok(false),
        };

        let message_hash = self.signature_hash(input_index);

        public_key.verify(&message_hash, &signature)
    }
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

impl Hashable for Transaction {
    fn hash(&self) -> Hash256 {
        let mut data = Vec::new();

        data.extend_from_slice(&self.version.to_le_bytes());

        data.extend_from_slice(&(self.inputs.len() as u32).to_le_bytes());
        for input in &self.inputs {
            data.extend_from_slice(input.previous_output.txid.as_bytes());
            data.extend_from_slice(&input.previous_output.vout.to_le_bytes());
            data.extend_from_slice(&(input.signature_script.len() as u32).to_le_bytes());
            data.extend_from_slice(&input.signature_script);
        }

        data.extend_from_slice(&(self.outputs.len() as u32).to_le_bytes());
        for output in &self.outputs {
            data.extend_from_slice(&output.value.to_le_bytes());
            data.extend_from_slice(&(output.recipient_pubkey.len() as u32).to_le_bytes());
            data.extend_from_slice(&output.recipient_pubkey);
        }

        Hash256::hash(&data)
    }
}

impl OutPoint {
    pub fn new(txid: Hash256, vout: u32) -> Self {
        Self { txid, vout }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::KeyPair;

    #[test]
    fn test_coinbase_transaction() -> Result<()> {
        let keypair = KeyPair::new()?;
        let tx = Transaction::new_coinbase(&keypair.public_key, 2500);

        assert!(tx.is_coinbase());
        assert!(tx.inputs.is_empty());
        assert_eq!(tx.outputs.len(), 1);
        assert_eq!(tx.outputs[0].value, 2500);
        assert!(tx.size() > 0);

        Ok(())
    }

    #[test]
    fn test_transaction_hash_stable() -> Result<()> {
        let keypair = KeyPair::new()?;
        let tx = Transaction::new_coinbase(&keypair.public_key, 1000);

        let hash1 = tx.hash();
        let hash2 = tx.hash();

        assert_eq!(hash1, hash2);
        assert_ne!(hash1, Hash256::zero());

        Ok(())
    }

    #[test]
    fn test_sign_and_verify_input() -> Result<()> {
        let owner = KeyPair::new()?;
        let recipient = KeyPair::new()?;
        let coinbase = Transaction::new_coinbase(&owner.public_key, 1000);

        let mut tx = Transaction::new();
        tx.add_input(OutPoint::new(coinbase.hash(), 0));
        tx.add_output(1000, &recipient.public_key);
        tx.sign_input(0, &owner.private_key)?;

        assert!(tx.verify_signature(0, &owner.public_key)?);
        assert!(!tx.verify_signature(0, &recipient.public_key)?);

        Ok(())
    }

    #[test]
    fn test_unsigned_input_does_not_verify() -> Result<()> {
        let owner = KeyPair::new()?;
        let mut tx = Transaction::new();
        tx.add_input(OutPoint::new(Hash256::zero(), 0));
        tx.add_output(10, &owner.public_key);

        assert!(!tx.verify_signature(0, &owner.public_key)?);

        Ok(())
    }
}

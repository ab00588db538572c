//! Transfer records exchanged between accounts

use crate::crypto::{Address, Sha256Hash};
use fixed::types::I32F32;
use sha2::{Digest, Sha256};

/// Amount type for balances and transfers.
///
/// Fixed-point so fractional values behave deterministically; there is no
/// float drift to disturb the conservation of total supply.
pub type Amount = I32F32;

/// A single committed (or about to be committed) transfer between two
/// accounts.
///
/// The canonical copy lives in the block named by `block_hash`; each
/// participant account keeps its own independent replica in its history.
/// An `Exchange` is immutable once constructed — a replica that disagrees
/// with the canonical copy is a tamper signal, not a normal state.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Exchange {
    pub sender: Address,
    pub receiver: Address,
    pub amount: Amount,
    /// Creation time in milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// Content hash of the block this exchange was appended to.
    pub block_hash: Sha256Hash,
    /// Market-assigned sequence number; folds into the id so two identical
    /// transfers in the same millisecond still get distinct ids.
    pub nonce: u64,
    /// Derived identifier, unique across the system.
    pub id: Sha256Hash,
}

impl Exchange {
    pub fn new(
        sender: Address,
        receiver: Address,
        amount: Amount,
        block_hash: Sha256Hash,
        nonce: u64,
    ) -> Self {
        let timestamp = chrono::Utc::now().timestamp_millis() as u64;
        let id = Self::derive_id(&sender, &receiver, amount, timestamp, nonce);
        Exchange {
            sender,
            receiver,
            amount,
            timestamp,
            block_hash,
            nonce,
            id,
        }
    }

    /// Calculate the identifier of an exchange from its logical fields.
    fn derive_id(
        sender: &Address,
        receiver: &Address,
        amount: Amount,
        timestamp: u64,
        nonce: u64,
    ) -> Sha256Hash {
        let mut hasher = Sha256::new();
        hasher.update("exchange".as_bytes());
        hasher.update(sender);
        hasher.update(receiver);
        hasher.update(amount.to_le_bytes());
        hasher.update(timestamp.to_le_bytes());
        hasher.update(nonce.to_le_bytes());
        hasher.finalize().into()
    }

    pub fn id_hex(&self) -> String {
        hex::encode(self.id)
    }
}

//! Block structure: a capacity-bounded batch of exchanges
//!
//! A block's content hash is computed once, at creation, from its creation
//! time and the hash of its parent block. Exchanges appended afterwards do
//! not move the hash — that is what lets an [`Exchange`] carry the hash of
//! the block it lives in while that block is still filling. The parent
//! linkage keeps hashes unique even when two blocks are created within the
//! same millisecond.

use crate::crypto::Sha256Hash;
use crate::error::ChainError;
use crate::exchange::Exchange;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Block {
    /// Creation time in milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// Maximum number of exchanges this block may hold.
    pub capacity: usize,
    /// Content hash of the preceding block; zero for the origin block.
    pub parent_hash: Sha256Hash,
    /// Content hash, fixed at creation.
    pub hash: Sha256Hash,
    exchanges: HashMap<Sha256Hash, Exchange>,
    /// Exchange ids in arrival order.
    order: Vec<Sha256Hash>,
    sealed: bool,
}

impl Block {
    pub fn new(capacity: usize, parent_hash: Sha256Hash) -> Self {
        let timestamp = chrono::Utc::now().timestamp_millis() as u64;
        let hash = Self::derive_hash(timestamp, &parent_hash);
        Block {
            timestamp,
            capacity,
            parent_hash,
            hash,
            exchanges: HashMap::new(),
            order: Vec::new(),
            sealed: false,
        }
    }

    /// Create the first block of a ledger, parented on the zero hash.
    pub fn origin(capacity: usize) -> Self {
        Self::new(capacity, [0u8; 32])
    }

    fn derive_hash(timestamp: u64, parent_hash: &Sha256Hash) -> Sha256Hash {
        let mut hasher = Sha256::new();
        hasher.update("block".as_bytes());
        hasher.update(timestamp.to_le_bytes());
        hasher.update(parent_hash);
        hasher.finalize().into()
    }

    /// Append an exchange. Refused once the block is sealed or full, and
    /// for an exchange id the block already holds.
    pub fn insert(&mut self, exchange: Exchange) -> Result<(), ChainError> {
        if self.sealed {
            return Err(ChainError::BlockSealed(format!(
                "Cannot append to sealed block {}",
                hex::encode(self.hash)
            )));
        }
        if self.order.len() >= self.capacity {
            return Err(ChainError::BlockSealed(format!(
                "Block {} is at capacity {}",
                hex::encode(self.hash),
                self.capacity
            )));
        }
        if self.exchanges.contains_key(&exchange.id) {
            return Err(ChainError::DuplicateExchange(exchange.id_hex()));
        }
        self.order.push(exchange.id);
        self.exchanges.insert(exchange.id, exchange);
        Ok(())
    }

    pub fn get(&self, exchange_id: &Sha256Hash) -> Option<&Exchange> {
        self.exchanges.get(exchange_id)
    }

    /// Exchanges in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = &Exchange> + '_ {
        self.order.iter().filter_map(move |id| self.exchanges.get(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.order.len() >= self.capacity
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Freeze the block. Sealed blocks accept no further exchanges.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }
}

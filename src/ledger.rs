//! Append-only block registry
//!
//! The ledger keys every block by its content hash and tracks the head: the
//! in-progress open block that new exchanges are appended into. Blocks are
//! never removed, and a duplicate hash carrying different contents is
//! treated as a corruption fault rather than overwritten.

use crate::block::Block;
use crate::crypto::Sha256Hash;
use crate::error::ChainError;
use crate::exchange::Exchange;
use std::collections::HashMap;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Ledger {
    blocks: HashMap<Sha256Hash, Block>,
    head: Sha256Hash,
}

impl Ledger {
    /// Create a ledger whose first entry and head is `origin_block`.
    pub fn new(origin_block: Block) -> Self {
        let head = origin_block.hash;
        let mut blocks = HashMap::new();
        blocks.insert(head, origin_block);
        Ledger { blocks, head }
    }

    /// Insert a block keyed by its content hash and advance the head to it.
    ///
    /// A hash already present with identical contents is a recoverable
    /// `DuplicateBlock`; the same hash with different contents means the
    /// content-addressing broke down and is reported as `CorruptLedger`.
    /// Neither case overwrites the stored block.
    pub fn add_block(&mut self, block: Block) -> Result<(), ChainError> {
        if let Some(existing) = self.blocks.get(&block.hash) {
            if *existing == block {
                return Err(ChainError::DuplicateBlock(block.hash_hex()));
            }
            return Err(ChainError::CorruptLedger(format!(
                "Block hash {} already present with different contents",
                block.hash_hex()
            )));
        }
        self.head = block.hash;
        self.blocks.insert(block.hash, block);
        Ok(())
    }

    /// Look up the canonical copy of an exchange. This is the query
    /// validators run once per claimed history entry, so both lookups are
    /// direct map hits.
    pub fn lookup_exchange(
        &self,
        block_hash: &Sha256Hash,
        exchange_id: &Sha256Hash,
    ) -> Result<&Exchange, ChainError> {
        let block = self
            .blocks
            .get(block_hash)
            .ok_or_else(|| ChainError::UnknownBlock(hex::encode(block_hash)))?;
        block
            .get(exchange_id)
            .ok_or_else(|| ChainError::UnknownExchange(hex::encode(exchange_id)))
    }

    pub fn block(&self, block_hash: &Sha256Hash) -> Option<&Block> {
        self.blocks.get(block_hash)
    }

    pub fn contains_block(&self, block_hash: &Sha256Hash) -> bool {
        self.blocks.contains_key(block_hash)
    }

    pub fn head_hash(&self) -> Sha256Hash {
        self.head
    }

    /// The open block new exchanges are appended into.
    ///
    /// The head entry always exists: the constructor installs the origin
    /// block and `add_block` only advances the head on insert.
    pub fn head_block(&self) -> &Block {
        &self.blocks[&self.head]
    }

    /// Append an exchange to the open head block.
    pub fn append_to_head(&mut self, exchange: Exchange) -> Result<(), ChainError> {
        let head = self.head;
        match self.blocks.get_mut(&head) {
            Some(block) => block.insert(exchange),
            None => Err(ChainError::UnknownBlock(hex::encode(head))),
        }
    }

    /// Freeze the head block; it accepts no further exchanges.
    pub fn seal_head(&mut self) {
        if let Some(block) = self.blocks.get_mut(&self.head) {
            block.seal();
        }
    }

    /// Number of blocks, the open head included. At least one: the origin
    /// block is installed at construction and blocks are never removed.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }
}

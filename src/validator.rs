//! Validators: independent snapshots that cross-check claimed histories
//!
//! A validator never touches balances. It holds its own copy of the ledger
//! and answers one question: does a party's self-reported history slice
//! match what my snapshot says actually happened? Catching a party that
//! locally edited its own history is exactly this comparison.

use crate::block::Block;
use crate::crypto::Sha256Hash;
use crate::error::ChainError;
use crate::exchange::Exchange;
use crate::ledger::Ledger;
use std::collections::HashMap;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Validator {
    pub id: u64,
    snapshot: Ledger,
}

impl Validator {
    /// Create a validator around an independent ledger snapshot, typically
    /// a clone of the market's ledger taken at registration time.
    pub fn new(id: u64, snapshot: Ledger) -> Self {
        Validator { id, snapshot }
    }

    /// Check a claimed history against this validator's snapshot.
    ///
    /// Fail-fast: a missing block, a missing entry or a mismatched amount
    /// returns `false` immediately. Only the amount is compared — a
    /// tampered sender, receiver or timestamp with an unchanged amount
    /// passes. That narrow check is a known limitation of the protocol,
    /// kept as-is rather than silently strengthened.
    pub fn verify(&self, claimed_history: &HashMap<Sha256Hash, Exchange>) -> bool {
        for (exchange_id, claimed) in claimed_history {
            match self.snapshot.lookup_exchange(&claimed.block_hash, exchange_id) {
                Ok(canonical) => {
                    if canonical.amount != claimed.amount {
                        return false;
                    }
                }
                Err(_) => return false,
            }
        }
        true
    }

    /// Post-commit propagation: append a copy of a committed exchange to
    /// the snapshot's open head block.
    pub fn observe_exchange(&mut self, exchange: Exchange) -> Result<(), ChainError> {
        self.snapshot.append_to_head(exchange)
    }

    /// Post-rotation propagation: seal the snapshot's head and adopt a copy
    /// of the freshly opened block.
    pub fn observe_block(&mut self, block: Block) -> Result<(), ChainError> {
        self.snapshot.seal_head();
        self.snapshot.add_block(block)
    }

    pub fn snapshot(&self) -> &Ledger {
        &self.snapshot
    }
}

//! Account state: a balance plus a private history replica
//!
//! Each account keeps its own copy of every exchange it took part in. The
//! copies are what validators cross-check against the shared ledger, so
//! they are independent replicas, never references into a block. The
//! market is the only component that mutates balances or histories; the
//! account itself just stores them.

use crate::crypto::{derive_address, Address, Sha256Hash};
use crate::error::ChainError;
use crate::exchange::{Amount, Exchange};
use std::collections::HashMap;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Account {
    pub address: Address,
    pub name: String,
    /// Creation time in milliseconds since the Unix epoch; folded into the
    /// derived address.
    pub created: u64,
    pub balance: Amount,
    /// Replica of every exchange this account sent or received.
    pub history: HashMap<Sha256Hash, Exchange>,
}

impl Account {
    pub fn new(name: &str, balance: Amount) -> Self {
        let created = chrono::Utc::now().timestamp_millis() as u64;
        Account {
            address: derive_address(name, created),
            name: name.to_string(),
            created,
            balance,
            history: HashMap::new(),
        }
    }

    /// Store a replica of a committed exchange. A legitimate propagation
    /// never presents the same exchange twice, so an existing key is an
    /// error and the stored copy is left untouched.
    pub fn record(&mut self, exchange: Exchange) -> Result<(), ChainError> {
        if self.history.contains_key(&exchange.id) {
            return Err(ChainError::DuplicateHistoryEntry(exchange.id_hex()));
        }
        self.history.insert(exchange.id, exchange);
        Ok(())
    }

    /// Apply a signed balance change. Funds checks happen in the market
    /// before any mutation, not here.
    pub fn apply_delta(&mut self, delta: Amount) {
        self.balance += delta;
    }

    pub fn address_hex(&self) -> String {
        hex::encode(self.address)
    }
}

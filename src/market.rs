//! The market: coordinator for accounts, validators and the ledger
//!
//! All mutable state flows through here. A transfer runs as one
//! uninterrupted sequence: address and funds checks, a uniform random
//! sample of `quorum_size` distinct validators that must unanimously
//! approve the sender's claimed history, then the commit — debit/credit,
//! append to the open block, replicas into both histories and every
//! validator snapshot. Any rejection happens before the first mutation, so
//! a denied transfer leaves balances, histories and blocks untouched.
//! Post-commit propagation is best-effort: a snapshot that refuses the
//! replica is logged, not unwound — that validator simply falls behind and
//! denies later transfers it is sampled for.
//!
//! Rotation policy: the exchange is appended first; if that append fills
//! the open block, the block is sealed in the same call and a fresh block,
//! parented on the sealed one, becomes the new head. No exchange is ever
//! dropped on rotation.

use crate::account::Account;
use crate::block::Block;
use crate::config::MarketConfig;
use crate::crypto::{Address, Sha256Hash};
use crate::error::ChainError;
use crate::exchange::{Amount, Exchange};
use crate::ledger::Ledger;
use crate::validator::Validator;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// What a caller gets back from a committed transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    pub exchange_id: Sha256Hash,
    /// Content hash of the block the exchange was appended to.
    pub block_hash: Sha256Hash,
    /// Ids of the validators that approved, in sampling order.
    pub validators: Vec<u64>,
}

pub struct Market {
    pub config: MarketConfig,
    ledger: Ledger,
    accounts: HashMap<Address, Account>,
    validators: HashMap<u64, Validator>,
    exchange_seq: u64,
    rng: StdRng,
}

impl Market {
    /// Create a market around a ledger whose head is the open block.
    pub fn new(ledger: Ledger, config: MarketConfig) -> Result<Self, ChainError> {
        Self::with_rng(ledger, config, StdRng::from_entropy())
    }

    /// Like [`Market::new`] but with a seeded random source, so validator
    /// sampling is reproducible.
    pub fn with_rng_seed(
        ledger: Ledger,
        config: MarketConfig,
        seed: u64,
    ) -> Result<Self, ChainError> {
        Self::with_rng(ledger, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(ledger: Ledger, config: MarketConfig, rng: StdRng) -> Result<Self, ChainError> {
        config.validate()?;
        Ok(Market {
            config,
            ledger,
            accounts: HashMap::new(),
            validators: HashMap::new(),
            exchange_seq: 0,
            rng,
        })
    }

    /// Register an account under its derived address.
    pub fn add_account(&mut self, account: Account) -> Result<Address, ChainError> {
        let address = account.address;
        if self.accounts.contains_key(&address) {
            return Err(ChainError::DuplicateAccount(hex::encode(address)));
        }
        self.accounts.insert(address, account);
        Ok(address)
    }

    /// Register a validator carrying its own ledger snapshot.
    pub fn add_validator(&mut self, validator: Validator) -> Result<(), ChainError> {
        if self.validators.contains_key(&validator.id) {
            return Err(ChainError::DuplicateValidator(validator.id));
        }
        self.validators.insert(validator.id, validator);
        Ok(())
    }

    /// Register a validator whose snapshot is taken from the current
    /// ledger, which is the common case.
    pub fn register_validator(&mut self, id: u64) -> Result<(), ChainError> {
        let snapshot = self.ledger.clone();
        self.add_validator(Validator::new(id, snapshot))
    }

    /// Transfer `amount` from `sender` to `receiver`, gated by a unanimous
    /// validator quorum.
    pub fn transfer(
        &mut self,
        sender: Address,
        receiver: Address,
        amount: Amount,
    ) -> Result<TransferReceipt, ChainError> {
        if sender == receiver {
            return Err(ChainError::InvalidAddress(
                "sender and receiver are the same account".to_string(),
            ));
        }
        if !self.accounts.contains_key(&sender) {
            return Err(ChainError::UnknownAccount(hex::encode(sender)));
        }
        if !self.accounts.contains_key(&receiver) {
            return Err(ChainError::UnknownAccount(hex::encode(receiver)));
        }
        if amount < Amount::from_num(0) {
            return Err(ChainError::InsufficientFunds(
                "amount must be non-negative".to_string(),
            ));
        }
        let sender_balance = self.accounts[&sender].balance;
        if sender_balance < amount {
            return Err(ChainError::InsufficientFunds(format!(
                "balance {} is less than requested {}",
                sender_balance, amount
            )));
        }

        let required = self.config.quorum_size;
        if self.validators.len() < required {
            return Err(ChainError::InsufficientValidators {
                available: self.validators.len(),
                required,
            });
        }
        let sampled = self.sample_validator_ids(required);
        debug!("Sampled validators {:?} for quorum", sampled);

        let history = &self.accounts[&sender].history;
        for &validator_id in &sampled {
            if !self.validators[&validator_id].verify(history) {
                warn!(
                    "Validator {} rejected the claimed history of {}",
                    validator_id,
                    hex::encode(sender)
                );
                return Err(ChainError::QuorumDenied(format!(
                    "validator {} found a mismatch in the sender's history",
                    validator_id
                )));
            }
        }

        // Unanimous approval; commit. Nothing before this point has mutated
        // any state.
        let nonce = self.exchange_seq;
        let exchange = Exchange::new(sender, receiver, amount, self.ledger.head_hash(), nonce);
        self.ledger.append_to_head(exchange.clone())?;
        self.exchange_seq += 1;

        if let Some(account) = self.accounts.get_mut(&sender) {
            account.record(exchange.clone())?;
            account.apply_delta(-amount);
        }
        if let Some(account) = self.accounts.get_mut(&receiver) {
            account.record(exchange.clone())?;
            account.apply_delta(amount);
        }
        // The commit already happened; a snapshot that cannot take the
        // propagation is that validator's problem and shows up later as a
        // denial when it is sampled. Never unwind a commit over it.
        for validator in self.validators.values_mut() {
            if let Err(e) = validator.observe_exchange(exchange.clone()) {
                warn!(
                    "Validator {} could not record exchange {}: {}",
                    validator.id,
                    exchange.id_hex(),
                    e
                );
            }
        }

        info!(
            "Committed {} from {} to {} (exchange {})",
            amount,
            hex::encode(sender),
            hex::encode(receiver),
            exchange.id_hex()
        );

        if self.ledger.head_block().is_full() {
            self.rotate_block()?;
        }

        Ok(TransferReceipt {
            exchange_id: exchange.id,
            block_hash: exchange.block_hash,
            validators: sampled,
        })
    }

    /// Seal the full head block, open a fresh one parented on it and hand a
    /// replica to every validator snapshot.
    fn rotate_block(&mut self) -> Result<(), ChainError> {
        let sealed_hash = self.ledger.head_hash();
        self.ledger.seal_head();
        let next = Block::new(self.config.block_capacity, sealed_hash);
        let replica = next.clone();
        self.ledger.add_block(next)?;
        for validator in self.validators.values_mut() {
            if let Err(e) = validator.observe_block(replica.clone()) {
                warn!(
                    "Validator {} could not adopt block {}: {}",
                    validator.id,
                    replica.hash_hex(),
                    e
                );
            }
        }
        info!(
            "Sealed full block {}; ledger now holds {} blocks",
            hex::encode(sealed_hash),
            self.ledger.len()
        );
        Ok(())
    }

    /// Uniform sample of `k` distinct validator ids, without replacement.
    /// Keys are sorted first so a seeded run is deterministic.
    fn sample_validator_ids(&mut self, k: usize) -> Vec<u64> {
        let mut ids: Vec<u64> = self.validators.keys().copied().collect();
        ids.sort_unstable();
        rand::seq::index::sample(&mut self.rng, ids.len(), k)
            .iter()
            .map(|i| ids[i])
            .collect()
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn account(&self, address: &Address) -> Option<&Account> {
        self.accounts.get(address)
    }

    pub fn account_mut(&mut self, address: &Address) -> Option<&mut Account> {
        self.accounts.get_mut(address)
    }

    pub fn balance_of(&self, address: &Address) -> Option<Amount> {
        self.accounts.get(address).map(|a| a.balance)
    }

    /// Sum of every registered balance. Conserved across commits: each
    /// transfer debits exactly what it credits.
    pub fn total_supply(&self) -> Amount {
        self.accounts
            .values()
            .fold(Amount::from_num(0), |acc, a| acc + a.balance)
    }

    pub fn validator(&self, id: u64) -> Option<&Validator> {
        self.validators.get(&id)
    }

    pub fn validator_count(&self) -> usize {
        self.validators.len()
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }
}

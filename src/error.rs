//! Error types for MarketChain

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    InvalidAddress(String),
    UnknownAccount(String),
    DuplicateAccount(String),
    InsufficientFunds(String),
    InsufficientValidators { available: usize, required: usize },
    DuplicateValidator(u64),
    QuorumDenied(String),
    DuplicateBlock(String),
    BlockSealed(String),
    DuplicateExchange(String),
    DuplicateHistoryEntry(String),
    UnknownBlock(String),
    UnknownExchange(String),
    CorruptLedger(String),
    ConfigError(String),
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChainError::InvalidAddress(msg) => write!(f, "Invalid address: {}", msg),
            ChainError::UnknownAccount(msg) => write!(f, "Unknown account: {}", msg),
            ChainError::DuplicateAccount(msg) => write!(f, "Duplicate account: {}", msg),
            ChainError::InsufficientFunds(msg) => write!(f, "Insufficient funds: {}", msg),
            ChainError::InsufficientValidators {
                available,
                required,
            } => write!(
                f,
                "Insufficient validators: {} available, quorum requires {}",
                available, required
            ),
            ChainError::DuplicateValidator(id) => {
                write!(f, "Validator {} is already registered", id)
            }
            ChainError::QuorumDenied(msg) => write!(f, "Quorum denied: {}", msg),
            ChainError::DuplicateBlock(msg) => write!(f, "Duplicate block: {}", msg),
            ChainError::BlockSealed(msg) => write!(f, "Block is sealed: {}", msg),
            ChainError::DuplicateExchange(msg) => write!(f, "Duplicate exchange: {}", msg),
            ChainError::DuplicateHistoryEntry(msg) => {
                write!(f, "Duplicate history entry: {}", msg)
            }
            ChainError::UnknownBlock(msg) => write!(f, "Unknown block: {}", msg),
            ChainError::UnknownExchange(msg) => write!(f, "Unknown exchange: {}", msg),
            ChainError::CorruptLedger(msg) => write!(f, "Corrupt ledger: {}", msg),
            ChainError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for ChainError {}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;

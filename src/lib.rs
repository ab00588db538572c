//! MarketChain - A permissioned in-memory ledger with quorum-verified transfers
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Core Ledger
//! - [`block`] - Capacity-bounded, hash-addressed batches of exchanges
//! - [`exchange`] - Transfer records and the fixed-point amount type
//! - [`ledger`] - Append-only block registry and head tracking
//!
//! ## Accounts & Verification
//! - [`account`] - Balance holders with private history replicas
//! - [`validator`] - Independent ledger snapshots that cross-check claimed histories
//!
//! ## Coordination
//! - [`market`] - The coordinator running the transfer protocol
//!
//! ## Cryptography
//! - [`crypto`] - Content hashing and address derivation (SHA-256)
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Core Ledger
// ============================================================================
pub mod block;
pub mod exchange;
pub mod ledger;

// ============================================================================
// Accounts & Verification
// ============================================================================
pub mod account;
pub mod validator;

// ============================================================================
// Coordination
// ============================================================================
pub mod market;

// ============================================================================
// Cryptography
// ============================================================================
pub mod crypto;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;

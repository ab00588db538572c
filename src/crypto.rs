//! Hashing primitives for MarketChain
//!
//! Every identifier in the system is a SHA-256 digest of the logical fields
//! of the thing it names: block content hashes, exchange ids and account
//! addresses all come from here.

use crate::error::ChainError;
use sha2::{Digest, Sha256};

/// Type alias for a SHA-256 content hash.
/// We use a fixed-size array for internal type safety and performance.
pub type Sha256Hash = [u8; 32];

/// Type alias for the derived account address, which is a 32-byte hash.
pub type Address = [u8; 32];

/// Hash an arbitrary byte slice into a 32-byte digest. Deterministic, pure.
pub fn hash_bytes(data: &[u8]) -> Sha256Hash {
    Sha256::digest(data).into()
}

/// Convenience function to create an address from a string (hashes the string).
/// Useful for testing and debugging.
pub fn address_from_string(s: &str) -> Address {
    hash_bytes(s.as_bytes())
}

/// Derive an account address from a display name and its creation time.
pub fn derive_address(name: &str, created_millis: u64) -> Address {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update(created_millis.to_le_bytes());
    hasher.finalize().into()
}

/// Convert a hash or address to a hex string for display.
pub fn hash_to_hex(hash: &Sha256Hash) -> String {
    hex::encode(hash)
}

/// Convert a hex string back into a 32-byte hash or address.
pub fn hash_from_hex(hex_str: &str) -> Result<Sha256Hash, ChainError> {
    let bytes = hex::decode(hex_str)
        .map_err(|e| ChainError::InvalidAddress(format!("Invalid hex: {}", e)))?;
    if bytes.len() != 32 {
        return Err(ChainError::InvalidAddress(format!(
            "Hash must be 32 bytes, got {}",
            bytes.len()
        )));
    }
    bytes
        .try_into()
        .map_err(|_| ChainError::InvalidAddress("Failed to convert bytes into hash".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic() {
        let a = hash_bytes(b"marketchain");
        let b = hash_bytes(b"marketchain");
        assert_eq!(a, b);
        assert_ne!(a, hash_bytes(b"marketchain!"));
    }

    #[test]
    fn test_derive_address_uses_both_inputs() {
        let a = derive_address("Marcy", 1000);
        assert_ne!(a, derive_address("Marcy", 1001));
        assert_ne!(a, derive_address("David", 1000));
        assert_eq!(a, derive_address("Marcy", 1000));
    }

    #[test]
    fn test_hex_round_trip() {
        let h = address_from_string("some account");
        let encoded = hash_to_hex(&h);
        assert_eq!(encoded.len(), 64);
        assert_eq!(hash_from_hex(&encoded).unwrap(), h);
    }

    #[test]
    fn test_hex_rejects_bad_input() {
        assert!(hash_from_hex("zz").is_err());
        assert!(hash_from_hex("abcd").is_err());
    }
}

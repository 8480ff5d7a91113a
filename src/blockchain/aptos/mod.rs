//! Primary chain (Aptos) integration.

pub mod backend;
pub mod client;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use backend::AptosBackend;
pub use client::AptosClient;
pub use wallet::{derive_address, AptosKeyWallet};

/// `0x` followed by 64 hex digits.
pub fn is_transaction_hash(s: &str) -> bool {
    s.strip_prefix("0x")
        .map(|h| h.len() == 64 && h.bytes().all(|b| b.is_ascii_hexdigit()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_shape() {
        assert!(is_transaction_hash(&format!("0x{}", "a".repeat(64))));
        assert!(is_transaction_hash(&format!("0x{}", "F".repeat(64))));
        assert!(!is_transaction_hash(&format!("0x{}", "a".repeat(63))));
        assert!(!is_transaction_hash(&format!("0x{}", "g".repeat(64))));
        assert!(!is_transaction_hash(&"a".repeat(66)));
        assert!(!is_transaction_hash(""));
    }
}

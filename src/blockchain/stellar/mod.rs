//! Secondary chain (Stellar) integration.

pub mod backend;
pub mod client;
pub mod strkey;
pub mod wallet;
pub mod xdr;

pub use backend::StellarBackend;
pub use client::HorizonClient;
pub use wallet::StellarKeyWallet;

/// 64 hex digits, no prefix.
pub fn is_transaction_hash(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

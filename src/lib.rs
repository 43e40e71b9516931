//! Local Ethereum wallet
//!
//! Keeps a single password-protected key on disk and sends native ETH:
//! - Encrypts the private key with a scrypt-derived AES-256-CTR key
//! - Resolves recipients through a local alias book (`myself` is the wallet)
//! - Signs EIP-1559 transfers locally and broadcasts them over JSON-RPC
//!
//! # Security Model
//!
//! - The decrypted key exists only for the unlock-and-sign step
//! - Passwords come from an injected [`secret::SecretProvider`]
//! - Every file write is atomic; the key file is owner-readable only

pub mod address_book;
pub mod chain;
pub mod commands;
pub mod config;
pub mod interrupt;
pub mod keystore;
pub mod secret;
pub mod storage;
pub mod transfer;
pub mod units;
pub mod wallet;

mod error;

// Re-export commonly used types
pub use address_book::{AddressBook, SELF_ALIAS};
pub use config::{Config, RpcConfig};
pub use error::{Error, Result};
pub use interrupt::Interrupt;
pub use transfer::{TransferFlow, TransferReceipt, TransferRequest};
pub use wallet::WalletIdentity;

//! Error types for the wallet

use alloy::primitives::{Address, TxHash};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Wrong password, or an envelope that fails its integrity check.
    #[error("Authentication failed: wrong password or corrupted key file")]
    Authentication,

    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("Invalid amount '{input}': {reason}")]
    InvalidAmount { input: String, reason: String },

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid alias: {0}")]
    InvalidAlias(String),

    #[error("Alias not found: {0}")]
    AliasNotFound(String),

    #[error("Failed to broadcast transaction: {0}")]
    Broadcast(String),

    #[error("Transaction {tx_hash} was not confirmed within {timeout_secs}s; it may still be mined")]
    ConfirmationTimeout { tx_hash: TxHash, timeout_secs: u64 },

    #[error("Transaction {0} was mined but reverted")]
    Reverted(TxHash),

    #[error("Corrupted file {}: {reason}", .path.display())]
    FileCorruption { path: PathBuf, reason: String },

    #[error("No wallet found in {}; run `create` first", .0.display())]
    WalletNotFound(PathBuf),

    #[error("A wallet already exists at {}; pass --force to overwrite it", .0.display())]
    WalletExists(PathBuf),

    #[error("Key file belongs to {key}, but the wallet address is recorded as {stored}")]
    AddressMismatch { stored: Address, key: Address },

    #[error("Interrupted")]
    Interrupted,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid_amount(input: &str, reason: impl Into<String>) -> Self {
        Error::InvalidAmount {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn corrupted(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::FileCorruption {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

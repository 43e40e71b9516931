//! Wallet identity
//!
//! This module handles the keypair and transaction signing.
//! The private key is only exposed through [`WalletIdentity::to_hex_secret`],
//! which hands it back in a zeroizing buffer for re-encryption or display.

mod signer;

pub use signer::{SignedTransfer, TransferParams, WalletIdentity, TRANSFER_GAS_LIMIT};

//! Value transfer flow
//!
//! Takes a validated [`TransferRequest`] from an encrypted key to a confirmed
//! transaction:
//!
//! ```text
//! Locked -> Unlocked -> Signed -> Pending -> Confirmed
//!    \__________\__________\________\______> Failed
//! ```
//!
//! SECURITY NOTE:
//! - The recipient and amount are validated before the password is used
//! - Chain parameters are fetched before the key is decrypted; the key lives
//!   only inside the synchronous unlock-and-sign step
//! - An interrupt aborts the flow before the broadcast
//! - A broadcast is attempted exactly once; re-sending is a user decision

use crate::address_book::{parse_address, AddressBook};
use crate::chain::{ChainClient, Confirmation};
use crate::interrupt::Interrupt;
use crate::keystore::{self, EncryptedSecret};
use crate::units::{format_ether, parse_ether};
use crate::wallet::{SignedTransfer, TransferParams};
use crate::{Error, Result};
use alloy::primitives::{Address, TxHash, U256};
use secrecy::SecretString;
use std::fmt;
use std::time::Duration;
use tracing::{info, warn};

/// States of a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    Locked,
    Unlocked,
    Signed,
    Pending,
    Confirmed,
    Failed,
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransferState::Locked => "locked",
            TransferState::Unlocked => "unlocked",
            TransferState::Signed => "signed",
            TransferState::Pending => "pending",
            TransferState::Confirmed => "confirmed",
            TransferState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A recipient and amount that have already been resolved and parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub to: Address,
    /// Amount in wei
    pub value: U256,
}

impl TransferRequest {
    /// Build a request from an address and a decimal ETH amount
    pub fn new(to: Address, amount: &str) -> Result<Self> {
        let value = parse_ether(amount)?;
        if value.is_zero() {
            return Err(Error::invalid_amount(amount, "amount must be greater than zero"));
        }
        Ok(Self { to, value })
    }

    /// Recipient given as an alias that must exist in `book`
    pub fn to_alias(book: &AddressBook, alias: &str, amount: &str) -> Result<Self> {
        let address = book.lookup(alias)?;
        Self::new(parse_address(address)?, amount)
    }

    /// Recipient given as an alias or a raw address
    pub fn to_recipient(book: &AddressBook, name_or_address: &str, amount: &str) -> Result<Self> {
        Self::new(parse_address(book.resolve(name_or_address))?, amount)
    }
}

/// A confirmed transfer
#[derive(Debug, Clone)]
pub struct TransferReceipt {
    pub tx_hash: TxHash,
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub confirmation: Confirmation,
}

/// Drives one transfer through its states against a [`ChainClient`]
pub struct TransferFlow<'a> {
    chain: &'a dyn ChainClient,
    confirmation_timeout: Option<Duration>,
    interrupt: Interrupt,
}

impl<'a> TransferFlow<'a> {
    /// `confirmation_timeout` of `None` waits for the receipt indefinitely
    pub fn new(chain: &'a dyn ChainClient, confirmation_timeout: Option<Duration>) -> Self {
        Self {
            chain,
            confirmation_timeout,
            interrupt: Interrupt::new(),
        }
    }

    /// Abort before broadcasting once `interrupt` is triggered
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Sign, broadcast and confirm `request` from the wallet at `from`
    ///
    /// `from` is the recorded wallet address; the key decrypted from `secret`
    /// must belong to it.
    pub async fn execute(
        &self,
        from: Address,
        secret: &EncryptedSecret,
        password: SecretString,
        request: &TransferRequest,
    ) -> Result<TransferReceipt> {
        let result = self.run(from, secret, password, request).await;
        if let Err(e) = &result {
            warn!(state = %TransferState::Failed, error = %e, "Transfer failed");
        }
        result
    }

    async fn run(
        &self,
        from: Address,
        secret: &EncryptedSecret,
        password: SecretString,
        request: &TransferRequest,
    ) -> Result<TransferReceipt> {
        info!(
            state = %TransferState::Locked,
            from = %from,
            to = %request.to,
            amount_eth = %format_ether(request.value),
            "Starting transfer"
        );

        // Fetched while still locked so no network wait happens with the key in memory
        let params = self.chain.transfer_params(from).await?;

        let signed = unlock_and_sign(from, secret, password, &params, request)?;
        info!(
            state = %TransferState::Signed,
            tx_hash = %signed.tx_hash,
            nonce = signed.nonce,
            "Transaction signed"
        );

        self.interrupt.check()?;
        let tx_hash = self.chain.broadcast(&signed.raw).await?;
        if tx_hash != signed.tx_hash {
            warn!(
                local = %signed.tx_hash,
                node = %tx_hash,
                "Node reported a different transaction hash"
            );
        }
        info!(state = %TransferState::Pending, tx_hash = %tx_hash, "Transaction broadcast");

        let confirmation = self.await_confirmation(tx_hash).await?;
        if !confirmation.success {
            return Err(Error::Reverted(tx_hash));
        }
        info!(
            state = %TransferState::Confirmed,
            tx_hash = %tx_hash,
            block = ?confirmation.block_number,
            gas_used = confirmation.gas_used,
            "Transaction confirmed"
        );

        Ok(TransferReceipt {
            tx_hash,
            from: signed.from,
            to: signed.to,
            value: signed.value,
            confirmation,
        })
    }

    async fn await_confirmation(&self, tx_hash: TxHash) -> Result<Confirmation> {
        match self.confirmation_timeout {
            Some(timeout) => {
                tokio::time::timeout(timeout, self.chain.wait_for_confirmation(tx_hash))
                    .await
                    .map_err(|_| Error::ConfirmationTimeout {
                        tx_hash,
                        timeout_secs: timeout.as_secs(),
                    })?
            }
            None => self.chain.wait_for_confirmation(tx_hash).await,
        }
    }
}

/// Locked -> Unlocked -> Signed with no await in between; the wallet is
/// dropped on return
fn unlock_and_sign(
    from: Address,
    secret: &EncryptedSecret,
    password: SecretString,
    params: &TransferParams,
    request: &TransferRequest,
) -> Result<SignedTransfer> {
    let wallet = keystore::unlock_wallet(secret, &password)?;
    drop(password);
    if wallet.address() != from {
        return Err(Error::AddressMismatch {
            stored: from,
            key: wallet.address(),
        });
    }
    info!(state = %TransferState::Unlocked, from = %from, "Wallet unlocked");

    wallet.sign_transfer(params, request.to, request.value)
}

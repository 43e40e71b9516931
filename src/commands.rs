//! Wallet commands
//!
//! One function per CLI command. Each takes its collaborators explicitly
//! (wallet files, secret provider, chain client) and returns data for the
//! binary to print. Files are written only on the success path of `create`
//! and `save_alias`.
//!
//! Commands that prompt take an [`Interrupt`] and check it before any file
//! write, secret output or broadcast, so Ctrl-C during a prompt aborts them.

use crate::address_book::{parse_address, AddressBook, SELF_ALIAS};
use crate::chain::ChainClient;
use crate::interrupt::Interrupt;
use crate::keystore;
use crate::secret::{read_new_password, SecretProvider};
use crate::storage::WalletFiles;
use crate::transfer::{TransferFlow, TransferReceipt, TransferRequest};
use crate::wallet::WalletIdentity;
use crate::{Error, Result};
use alloy::primitives::{Address, U256};
use secrecy::zeroize::Zeroizing;

const UNLOCK_PROMPT: &str = "Enter your password to decrypt your private key: ";

/// Result of a balance query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Balance {
    /// What the user asked for (alias or address)
    pub query: String,
    pub address: Address,
    /// Balance in wei
    pub wei: U256,
}

/// Generate a wallet, encrypt its key and bind the `myself` alias
///
/// Refuses to replace an existing key unless `force` is set.
pub fn create(
    files: &WalletFiles,
    secrets: &dyn SecretProvider,
    force: bool,
    interrupt: &Interrupt,
) -> Result<WalletIdentity> {
    if files.has_wallet()? {
        if !force {
            return Err(Error::WalletExists(files.key_path()));
        }
        tracing::warn!(path = %files.key_path().display(), "Overwriting existing wallet key");
    }

    // Read the book before writing anything so a corrupt file aborts cleanly
    let book_path = files.address_book_path();
    let mut book = AddressBook::load(&book_path)?;

    let password = read_new_password(secrets)?;
    let wallet = WalletIdentity::generate();
    let sealed = keystore::seal_wallet(&wallet, &password)?;

    interrupt.check()?;
    files.save_secret(&sealed)?;
    files.save_address(&wallet.address_string())?;
    book.set_alias(SELF_ALIAS, wallet.address_string());
    book.save(&book_path)?;

    tracing::info!(address = %wallet.address(), "Wallet created");
    Ok(wallet)
}

/// The wallet's address from `walletAddress.txt`, falling back to `myself`
pub fn get_address(files: &WalletFiles) -> Result<String> {
    if let Some(address) = files.load_address()? {
        return Ok(address);
    }
    AddressBook::load(&files.address_book_path())?
        .get(SELF_ALIAS)
        .map(str::to_string)
        .ok_or_else(|| Error::WalletNotFound(files.dir().to_path_buf()))
}

/// Decrypt and return the private key as hex
pub fn get_private_key(
    files: &WalletFiles,
    secrets: &dyn SecretProvider,
    interrupt: &Interrupt,
) -> Result<Zeroizing<String>> {
    let sealed = files.load_secret()?;
    let password = secrets.read_secret("Enter your password to decrypt the private key: ")?;
    let wallet = keystore::unlock_wallet(&sealed, &password)?;
    interrupt.check()?;
    Ok(wallet.to_hex_secret())
}

/// Bind `alias` to `address`, replacing any previous binding
pub fn save_alias(files: &WalletFiles, alias: &str, address: &str) -> Result<()> {
    let alias = alias.trim();
    if alias.is_empty() {
        return Err(Error::InvalidAlias("alias must not be empty".to_string()));
    }
    let address = address.trim();
    parse_address(address)?;

    let path = files.address_book_path();
    let mut book = AddressBook::load(&path)?;
    book.set_alias(alias, address);
    book.save(&path)?;

    tracing::info!(alias, address, "Alias saved");
    Ok(())
}

/// Balance of an alias or raw address
pub async fn balance(
    files: &WalletFiles,
    chain: &dyn ChainClient,
    name_or_address: &str,
) -> Result<Balance> {
    let book = AddressBook::load(&files.address_book_path())?;
    let address = parse_address(book.resolve(name_or_address))?;
    let wei = chain.get_balance(address).await?;

    Ok(Balance {
        query: name_or_address.to_string(),
        address,
        wei,
    })
}

/// Send `amount` ETH to an alias or raw address
pub async fn send(
    files: &WalletFiles,
    secrets: &dyn SecretProvider,
    flow: &TransferFlow<'_>,
    to: &str,
    amount: &str,
) -> Result<TransferReceipt> {
    let book = AddressBook::load(&files.address_book_path())?;
    let request = TransferRequest::to_recipient(&book, to, amount)?;
    transfer(files, secrets, flow, &request).await
}

/// Send `amount` ETH to a saved alias; unknown aliases fail before anything
/// else happens
pub async fn send_to_alias(
    files: &WalletFiles,
    secrets: &dyn SecretProvider,
    flow: &TransferFlow<'_>,
    alias: &str,
    amount: &str,
) -> Result<TransferReceipt> {
    let book = AddressBook::load(&files.address_book_path())?;
    let request = TransferRequest::to_alias(&book, alias, amount)?;
    transfer(files, secrets, flow, &request).await
}

/// Shared tail of `send` and `send_to_alias`: load the key, prompt, run the flow
async fn transfer(
    files: &WalletFiles,
    secrets: &dyn SecretProvider,
    flow: &TransferFlow<'_>,
    request: &TransferRequest,
) -> Result<TransferReceipt> {
    let sealed = files.load_secret()?;
    let from = parse_address(&get_address(files)?)?;
    let password = secrets.read_secret(UNLOCK_PROMPT)?;
    flow.execute(from, &sealed, password, request).await
}

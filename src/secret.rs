//! Password input
//!
//! Commands never read the terminal directly; they ask a [`SecretProvider`].
//! The binary uses [`TerminalPrompt`], tests and scripts use [`StaticSecret`].

use crate::{Error, Result};
use secrecy::zeroize::Zeroizing;
use secrecy::{ExposeSecret, SecretString};

pub trait SecretProvider: Send + Sync {
    /// Ask for a secret, showing `prompt` to the user
    fn read_secret(&self, prompt: &str) -> Result<SecretString>;
}

/// Reads from the controlling terminal without echo
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl SecretProvider for TerminalPrompt {
    fn read_secret(&self, prompt: &str) -> Result<SecretString> {
        let password = rpassword::prompt_password(prompt)?;
        Ok(SecretString::from(password))
    }
}

/// Answers every prompt with the same secret
pub struct StaticSecret(Zeroizing<String>);

impl StaticSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Zeroizing::new(secret.into()))
    }
}

impl SecretProvider for StaticSecret {
    fn read_secret(&self, _prompt: &str) -> Result<SecretString> {
        Ok(SecretString::from(self.0.as_str().to_owned()))
    }
}

impl std::fmt::Debug for StaticSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticSecret([REDACTED])")
    }
}

/// Ask for a new password twice and require both entries to match
///
/// Empty passwords are accepted but logged as a warning.
pub fn read_new_password(provider: &dyn SecretProvider) -> Result<SecretString> {
    let first = provider.read_secret("Enter a password to encrypt your private key: ")?;
    let second = provider.read_secret("Confirm password: ")?;

    if first.expose_secret() != second.expose_secret() {
        return Err(Error::PasswordMismatch);
    }
    if first.expose_secret().is_empty() {
        tracing::warn!("Empty password: the key file is only protected by the scrypt work factor");
    }
    Ok(first)
}

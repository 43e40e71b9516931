//! Persisted wallet files
//!
//! One wallet per data directory:
//! - `walletKey.json` - the encrypted private key envelope
//! - `walletAddress.txt` - the wallet's public address
//! - `addressBook.json` - alias to address mapping
//!
//! Every write goes to a temporary file in the same directory which is then
//! renamed over the target, so an interrupted write never leaves a truncated
//! file behind.

use crate::keystore::EncryptedSecret;
use crate::{Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const KEY_FILE: &str = "walletKey.json";
pub const ADDRESS_FILE: &str = "walletAddress.txt";
pub const ADDRESS_BOOK_FILE: &str = "addressBook.json";

/// Locations of the wallet files inside a data directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletFiles {
    dir: PathBuf,
}

impl WalletFiles {
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn key_path(&self) -> PathBuf {
        self.dir.join(KEY_FILE)
    }

    pub fn address_path(&self) -> PathBuf {
        self.dir.join(ADDRESS_FILE)
    }

    pub fn address_book_path(&self) -> PathBuf {
        self.dir.join(ADDRESS_BOOK_FILE)
    }

    /// Whether an encrypted key is stored
    ///
    /// An empty JSON object counts as no wallet; older installs bootstrapped
    /// the key file with `{}`.
    pub fn has_wallet(&self) -> Result<bool> {
        Ok(self.read_secret()?.is_some())
    }

    /// Load the encrypted key, failing with [`Error::WalletNotFound`] if absent
    pub fn load_secret(&self) -> Result<EncryptedSecret> {
        self.read_secret()?
            .ok_or_else(|| Error::WalletNotFound(self.dir.clone()))
    }

    fn read_secret(&self) -> Result<Option<EncryptedSecret>> {
        let path = self.key_path();
        let Some(content) = read_optional(&path)? else {
            return Ok(None);
        };

        let value: serde_json::Value =
            serde_json::from_str(&content).map_err(|e| Error::corrupted(&path, e))?;
        if value.as_object().is_some_and(|o| o.is_empty()) {
            return Ok(None);
        }

        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| Error::corrupted(&path, e))
    }

    /// Replace the stored encrypted key
    pub fn save_secret(&self, secret: &EncryptedSecret) -> Result<()> {
        let json = serde_json::to_string_pretty(secret)?;
        write_atomic(&self.key_path(), json.as_bytes())
    }

    /// The stored wallet address, if the address file exists and is non-empty
    pub fn load_address(&self) -> Result<Option<String>> {
        Ok(read_optional(&self.address_path())?
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()))
    }

    pub fn save_address(&self, address: &str) -> Result<()> {
        write_atomic(&self.address_path(), address.as_bytes())
    }
}

/// Read a file, treating "not found" as `None`
pub(crate) fn read_optional(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Write `bytes` to `path` via a temporary file and rename
///
/// The temporary file is created user-readable only (0600 on unix) and
/// keeps those permissions after the rename.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::debug!(path = %path.display(), "Wrote file");
    Ok(())
}

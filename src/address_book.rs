//! Alias to address mapping
//!
//! Persisted as a flat JSON object in `addressBook.json`. Every mutation is a
//! whole-file read followed by a whole-file replace; there is no locking, so
//! two concurrent writers can lose an update.

use crate::storage::{read_optional, write_atomic};
use crate::{Error, Result};
use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Alias bound to the wallet's own address when it is created
pub const SELF_ALIAS: &str = "myself";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressBook {
    entries: BTreeMap<String, String>,
}

impl AddressBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the book from `path`; a missing file is an empty book
    pub fn load(path: &Path) -> Result<Self> {
        match read_optional(path)? {
            Some(content) => {
                serde_json::from_str(&content).map_err(|e| Error::corrupted(path, e))
            }
            None => Ok(Self::new()),
        }
    }

    /// Replace the file at `path` with this book
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        write_atomic(path, json.as_bytes())
    }

    /// The address behind `name_or_address`, or the input itself when it is
    /// not a known alias
    ///
    /// No address validation happens here.
    pub fn resolve<'a>(&'a self, name_or_address: &'a str) -> &'a str {
        self.get(name_or_address).unwrap_or(name_or_address)
    }

    /// The address behind `alias`, failing with [`Error::AliasNotFound`]
    pub fn lookup(&self, alias: &str) -> Result<&str> {
        self.get(alias)
            .ok_or_else(|| Error::AliasNotFound(alias.to_string()))
    }

    pub fn get(&self, alias: &str) -> Option<&str> {
        self.entries.get(alias).map(String::as_str)
    }

    /// Insert or silently overwrite `alias`
    pub fn set_alias(&mut self, alias: impl Into<String>, address: impl Into<String>) {
        self.entries.insert(alias.into(), address.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parse a `0x` address
///
/// Mixed-case input must carry a valid EIP-55 checksum; all-lowercase or
/// all-uppercase input is taken as is.
pub fn parse_address(input: &str) -> Result<Address> {
    let trimmed = input.trim();
    let hex_part = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let invalid = |reason: &str| Error::InvalidAddress(format!("'{}': {}", input, reason));

    if hex_part.len() != 40 || !hex_part.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid("expected 20 bytes of hex"));
    }

    let mixed_case = hex_part.bytes().any(|b| b.is_ascii_lowercase())
        && hex_part.bytes().any(|b| b.is_ascii_uppercase());
    if mixed_case {
        Address::parse_checksummed(format!("0x{}", hex_part), None)
            .map_err(|_| invalid("bad checksum"))
    } else {
        hex_part.parse().map_err(|_| invalid("expected 20 bytes of hex"))
    }
}

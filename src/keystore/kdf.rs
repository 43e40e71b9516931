//! Password-based key derivation (scrypt)

use crate::{Error, Result};
use secrecy::zeroize::Zeroizing;
use secrecy::{ExposeSecret, SecretString};

/// Length of the random salt stored next to every envelope
pub const SALT_LEN: usize = 16;
/// Length of the derived symmetric key
pub const KEY_LEN: usize = 32;

// N = 2^14, r = 8, p = 1, matching Node's `crypto.scryptSync` defaults so
// legacy key files still open.
const SCRYPT_LOG_N: u8 = 14;
const SCRYPT_R: u32 = 8;
const SCRYPT_P: u32 = 1;

/// A symmetric key derived from a password; wiped from memory on drop
pub struct DerivedKey(Zeroizing<[u8; KEY_LEN]>);

impl DerivedKey {
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey([REDACTED])")
    }
}

/// Derive a 32-byte key from `password` and a 16-byte `salt`
///
/// Deterministic for identical inputs. The only failure is a salt of the
/// wrong length.
pub fn derive_key(password: &SecretString, salt: &[u8]) -> Result<DerivedKey> {
    if salt.len() != SALT_LEN {
        return Err(Error::KeyDerivation(format!(
            "salt must be {} bytes, got {}",
            SALT_LEN,
            salt.len()
        )));
    }

    let params = scrypt::Params::new(SCRYPT_LOG_N, SCRYPT_R, SCRYPT_P, KEY_LEN)
        .map_err(|e| Error::KeyDerivation(e.to_string()))?;

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    scrypt::scrypt(
        password.expose_secret().as_bytes(),
        salt,
        &params,
        key.as_mut_slice(),
    )
    .map_err(|e| Error::KeyDerivation(e.to_string()))?;

    Ok(DerivedKey(key))
}

//! Encrypted key store
//!
//! The private key is kept at rest as an envelope of `{salt, iv, ciphertext,
//! mac}`:
//! - the key is derived from the password with scrypt (see [`kdf`])
//! - the plaintext is encrypted with AES-256-CTR under that key
//! - an HMAC-SHA256 tag over `iv || ciphertext` detects a wrong password or a
//!   tampered file before anything is decrypted
//!
//! Legacy envelopes (`{iv, salt, encryptedData}`) carry no `mac`. They
//! still decrypt; a wrong password then yields garbage, which the caller
//! catches when the plaintext fails to parse as a private key.

mod kdf;

pub use kdf::{derive_key, DerivedKey, KEY_LEN, SALT_LEN};

use crate::wallet::WalletIdentity;
use crate::{Error, Result};
use aes::cipher::{KeyIvInit, StreamCipher};
use alloy::hex;
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use secrecy::zeroize::Zeroizing;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type Aes256Ctr = ctr::Ctr128BE<aes::Aes256>;
type HmacSha256 = Hmac<Sha256>;

/// Length of the AES-CTR initial counter block
pub const IV_LEN: usize = 16;
/// Length of the authentication tag
pub const MAC_LEN: usize = 32;

const MAC_KEY_CONTEXT: &[u8] = b"eth-wallet/mac";

/// A password-encrypted secret
///
/// Serializes to `{"iv", "salt", "encryptedData", "mac"}` with hex strings,
/// the layout of `walletKey.json`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EnvelopeJson", into = "EnvelopeJson")]
pub struct EncryptedSecret {
    salt: [u8; SALT_LEN],
    iv: [u8; IV_LEN],
    ciphertext: Vec<u8>,
    mac: Option<[u8; MAC_LEN]>,
}

impl EncryptedSecret {
    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    pub fn iv(&self) -> &[u8; IV_LEN] {
        &self.iv
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Whether the envelope carries an authentication tag
    pub fn is_authenticated(&self) -> bool {
        self.mac.is_some()
    }

    /// Drop the authentication tag, producing the legacy envelope layout
    pub fn without_mac(mut self) -> Self {
        self.mac = None;
        self
    }
}

impl std::fmt::Debug for EncryptedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedSecret")
            .field("salt", &hex::encode(self.salt))
            .field("iv", &hex::encode(self.iv))
            .field("ciphertext_len", &self.ciphertext.len())
            .field("authenticated", &self.mac.is_some())
            .finish()
    }
}

/// Encrypt `plaintext` under `password`
///
/// A fresh random salt and IV are drawn for every call.
pub fn encrypt(plaintext: &[u8], password: &SecretString) -> Result<EncryptedSecret> {
    let mut salt = [0u8; SALT_LEN];
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut salt);
    OsRng.fill_bytes(&mut iv);

    let key = derive_key(password, &salt)?;

    let mut ciphertext = plaintext.to_vec();
    apply_keystream(&key, &iv, &mut ciphertext)?;

    let tag = mac_for(&key, &iv, &ciphertext)?.finalize().into_bytes();
    let mut mac = [0u8; MAC_LEN];
    mac.copy_from_slice(&tag);

    Ok(EncryptedSecret {
        salt,
        iv,
        ciphertext,
        mac: Some(mac),
    })
}

/// Decrypt an envelope with `password`
///
/// Fails with [`Error::Authentication`] when the tag does not match.
pub fn decrypt(secret: &EncryptedSecret, password: &SecretString) -> Result<Zeroizing<Vec<u8>>> {
    let key = derive_key(password, &secret.salt)?;

    if let Some(expected) = &secret.mac {
        mac_for(&key, &secret.iv, &secret.ciphertext)?
            .verify_slice(expected)
            .map_err(|_| Error::Authentication)?;
    } else {
        tracing::debug!("Key envelope has no authentication tag; skipping integrity check");
    }

    let mut plaintext = Zeroizing::new(secret.ciphertext.clone());
    apply_keystream(&key, &secret.iv, &mut plaintext)?;
    Ok(plaintext)
}

/// Encrypt a wallet's private key for storage
pub fn seal_wallet(wallet: &WalletIdentity, password: &SecretString) -> Result<EncryptedSecret> {
    encrypt(wallet.to_hex_secret().as_bytes(), password)
}

/// Decrypt a stored key and rebuild the wallet
///
/// Any failure, including a legacy envelope decrypting to something that is
/// not a private key, is reported as [`Error::Authentication`] so the
/// plaintext never reaches an error message.
pub fn unlock_wallet(secret: &EncryptedSecret, password: &SecretString) -> Result<WalletIdentity> {
    let plaintext = decrypt(secret, password)?;
    let key_hex = std::str::from_utf8(&plaintext).map_err(|_| Error::Authentication)?;
    WalletIdentity::from_hex(key_hex).map_err(|_| Error::Authentication)
}

fn apply_keystream(key: &DerivedKey, iv: &[u8; IV_LEN], buf: &mut [u8]) -> Result<()> {
    let mut cipher = Aes256Ctr::new_from_slices(key.as_bytes(), iv)
        .map_err(|e| Error::KeyDerivation(format!("cipher init: {}", e)))?;
    cipher.apply_keystream(buf);
    Ok(())
}

/// HMAC over `iv || ciphertext`, keyed by a subkey so the cipher key is never
/// reused as a MAC key
fn mac_for(key: &DerivedKey, iv: &[u8], ciphertext: &[u8]) -> Result<HmacSha256> {
    let mut subkey = HmacSha256::new_from_slice(key.as_bytes())
        .map_err(|e| Error::KeyDerivation(e.to_string()))?;
    subkey.update(MAC_KEY_CONTEXT);
    let mac_key = Zeroizing::new(subkey.finalize().into_bytes().to_vec());

    let mut mac =
        HmacSha256::new_from_slice(&mac_key).map_err(|e| Error::KeyDerivation(e.to_string()))?;
    mac.update(iv);
    mac.update(ciphertext);
    Ok(mac)
}

/// On-disk representation of [`EncryptedSecret`]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnvelopeJson {
    iv: String,
    salt: String,
    encrypted_data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mac: Option<String>,
}

impl From<EncryptedSecret> for EnvelopeJson {
    fn from(secret: EncryptedSecret) -> Self {
        Self {
            iv: hex::encode(secret.iv),
            salt: hex::encode(secret.salt),
            encrypted_data: hex::encode(&secret.ciphertext),
            mac: secret.mac.map(hex::encode),
        }
    }
}

impl TryFrom<EnvelopeJson> for EncryptedSecret {
    type Error = String;

    fn try_from(json: EnvelopeJson) -> std::result::Result<Self, Self::Error> {
        let mac = match json.mac {
            Some(mac) => Some(decode_fixed::<MAC_LEN>("mac", &mac)?),
            None => None,
        };
        let ciphertext = hex::decode(&json.encrypted_data)
            .map_err(|e| format!("encryptedData is not valid hex: {}", e))?;
        if ciphertext.is_empty() {
            return Err("encryptedData is empty".to_string());
        }

        Ok(Self {
            salt: decode_fixed::<SALT_LEN>("salt", &json.salt)?,
            iv: decode_fixed::<IV_LEN>("iv", &json.iv)?,
            ciphertext,
            mac,
        })
    }
}

fn decode_fixed<const N: usize>(field: &str, value: &str) -> std::result::Result<[u8; N], String> {
    let bytes = hex::decode(value).map_err(|e| format!("{} is not valid hex: {}", field, e))?;
    <[u8; N]>::try_from(bytes.as_slice())
        .map_err(|_| format!("{} must be {} bytes, got {}", field, N, bytes.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_HEX: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn password(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    #[test]
    fn test_encrypt_decrypt() {
        let encrypted = encrypt(KEY_HEX.as_bytes(), &password("correct horse")).unwrap();
        let decrypted = decrypt(&encrypted, &password("correct horse")).unwrap();
        assert_eq!(decrypted.as_slice(), KEY_HEX.as_bytes());
        assert!(encrypted.is_authenticated());
    }

    #[test]
    fn test_round_trip_arbitrary_plaintexts() {
        for (plaintext, pw) in [
            (&b"x"[..], ""),
            (&[0u8; 100][..], "pässwörd"),
            (&[0xffu8; 33][..], "a much longer password with spaces"),
        ] {
            let encrypted = encrypt(plaintext, &password(pw)).unwrap();
            assert_eq!(encrypted.ciphertext().len(), plaintext.len());
            assert_eq!(decrypt(&encrypted, &password(pw)).unwrap().as_slice(), plaintext);
        }
    }

    #[test]
    fn test_wrong_password() {
        let encrypted = encrypt(KEY_HEX.as_bytes(), &password("right")).unwrap();
        let err = decrypt(&encrypted, &password("wrong")).unwrap_err();
        assert!(matches!(err, Error::Authentication));
    }

    #[test]
    fn test_salt_and_iv_are_fresh() {
        let a = encrypt(KEY_HEX.as_bytes(), &password("pw")).unwrap();
        let b = encrypt(KEY_HEX.as_bytes(), &password("pw")).unwrap();
        assert_ne!(a.salt(), b.salt());
        assert_ne!(a.iv(), b.iv());
        assert_ne!(a.ciphertext(), b.ciphertext());
    }

    #[test]
    fn test_tampered_ciphertext_is_rejected() {
        let encrypted = encrypt(KEY_HEX.as_bytes(), &password("pw")).unwrap();
        let mut json = serde_json::to_value(&encrypted).unwrap();
        let data = json["encryptedData"].as_str().unwrap().to_string();
        let flipped = if data.starts_with('0') { "1" } else { "0" };
        json["encryptedData"] = format!("{}{}", flipped, &data[1..]).into();

        let tampered: EncryptedSecret = serde_json::from_value(json).unwrap();
        assert!(matches!(
            decrypt(&tampered, &password("pw")),
            Err(Error::Authentication)
        ));
    }

    #[test]
    fn test_legacy_envelope_without_mac() {
        let legacy = encrypt(KEY_HEX.as_bytes(), &password("pw"))
            .unwrap()
            .without_mac();
        assert!(!legacy.is_authenticated());
        assert_eq!(
            decrypt(&legacy, &password("pw")).unwrap().as_slice(),
            KEY_HEX.as_bytes()
        );

        // Without a tag a wrong password is not detected here, but never matches
        let garbage = decrypt(&legacy, &password("nope")).unwrap();
        assert_ne!(garbage.as_slice(), KEY_HEX.as_bytes());
    }

    #[test]
    fn test_envelope_json_layout() {
        let encrypted = encrypt(KEY_HEX.as_bytes(), &password("pw")).unwrap();
        let json = serde_json::to_value(&encrypted).unwrap();
        assert_eq!(json["iv"].as_str().unwrap().len(), IV_LEN * 2);
        assert_eq!(json["salt"].as_str().unwrap().len(), SALT_LEN * 2);
        assert_eq!(json["mac"].as_str().unwrap().len(), MAC_LEN * 2);
        assert!(json["encryptedData"].is_string());

        let parsed: EncryptedSecret = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, encrypted);

        let legacy = serde_json::to_value(encrypted.without_mac()).unwrap();
        assert!(legacy.get("mac").is_none());
    }

    #[test]
    fn test_envelope_rejects_malformed_fields() {
        let bad_salt = serde_json::json!({
            "iv": "00".repeat(IV_LEN),
            "salt": "abcd",
            "encryptedData": "00ff",
        });
        let err = serde_json::from_value::<EncryptedSecret>(bad_salt).unwrap_err();
        assert!(err.to_string().contains("salt must be 16 bytes"));

        let bad_hex = serde_json::json!({
            "iv": "zz".repeat(IV_LEN),
            "salt": "00".repeat(SALT_LEN),
            "encryptedData": "00ff",
        });
        assert!(serde_json::from_value::<EncryptedSecret>(bad_hex).is_err());

        let missing = serde_json::json!({ "iv": "00".repeat(IV_LEN) });
        assert!(serde_json::from_value::<EncryptedSecret>(missing).is_err());
    }

    #[test]
    fn test_seal_and_unlock_wallet() {
        let wallet = WalletIdentity::generate();
        let sealed = seal_wallet(&wallet, &password("pw")).unwrap();

        let unlocked = unlock_wallet(&sealed, &password("pw")).unwrap();
        assert_eq!(unlocked.address(), wallet.address());

        assert!(matches!(
            unlock_wallet(&sealed, &password("wrong")),
            Err(Error::Authentication)
        ));
    }

    #[test]
    fn test_unlock_legacy_envelope_with_wrong_password() {
        let wallet = WalletIdentity::generate();
        let legacy = seal_wallet(&wallet, &password("pw")).unwrap().without_mac();

        assert_eq!(
            unlock_wallet(&legacy, &password("pw")).unwrap().address(),
            wallet.address()
        );
        assert!(matches!(
            unlock_wallet(&legacy, &password("wrong")),
            Err(Error::Authentication)
        ));
    }

    #[test]
    fn test_debug_does_not_print_ciphertext() {
        let encrypted = encrypt(KEY_HEX.as_bytes(), &password("pw")).unwrap();
        let debug = format!("{:?}", encrypted);
        assert!(debug.contains("ciphertext_len"));
        assert!(!debug.contains(&hex::encode(encrypted.ciphertext())));
    }
}

//! Wallet identity and transaction signing
//!
//! SECURITY: this is the only place a decrypted private key lives.
//! - Keys are held in alloy's PrivateKeySigner, which zeroizes on drop
//! - Keys are never serialized and never logged
//! - `Debug` output redacts the signer

use crate::{Error, Result};
use alloy::consensus::{SignableTransaction, TxEip1559, TxEnvelope};
use alloy::eips::eip2718::Encodable2718;
use alloy::hex;
use alloy::network::TxSignerSync;
use alloy::primitives::{Address, Bytes, TxHash, TxKind, U256};
use alloy::signers::local::PrivateKeySigner;
use secrecy::zeroize::Zeroizing;

/// Gas used by a plain value transfer to an externally owned account
pub const TRANSFER_GAS_LIMIT: u64 = 21_000;

/// Chain parameters needed to sign a transfer, as reported by the node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferParams {
    pub chain_id: u64,
    pub nonce: u64,
    pub gas_limit: u64,
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
}

/// A signed EIP-1559 transfer ready for broadcast
#[derive(Debug, Clone)]
pub struct SignedTransfer {
    pub tx_hash: TxHash,
    /// EIP-2718 encoded transaction
    pub raw: Bytes,
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub nonce: u64,
}

/// An Ethereum keypair and its address
pub struct WalletIdentity {
    signer: PrivateKeySigner,
    /// Public address (safe to expose)
    address: Address,
}

impl WalletIdentity {
    /// Generate a new keypair from the operating system's secure RNG
    pub fn generate() -> Self {
        Self::from_signer(PrivateKeySigner::random())
    }

    /// Rebuild a wallet from raw private key bytes
    ///
    /// Fails with [`Error::InvalidKey`] unless `key` is 32 bytes encoding a
    /// valid secp256k1 scalar.
    pub fn from_private_key(key: &[u8]) -> Result<Self> {
        if key.len() != 32 {
            return Err(Error::InvalidKey(format!(
                "expected 32 bytes, got {}",
                key.len()
            )));
        }
        let signer = PrivateKeySigner::from_slice(key)
            .map_err(|_| Error::InvalidKey("not a valid secp256k1 scalar".to_string()))?;
        Ok(Self::from_signer(signer))
    }

    /// Rebuild a wallet from a hex-encoded private key, with or without `0x`
    pub fn from_hex(key_hex: &str) -> Result<Self> {
        let key_hex = key_hex.trim();
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);
        let bytes = Zeroizing::new(
            hex::decode(key_hex).map_err(|_| Error::InvalidKey("not valid hex".to_string()))?,
        );
        Self::from_private_key(&bytes)
    }

    fn from_signer(signer: PrivateKeySigner) -> Self {
        let address = signer.address();
        Self { signer, address }
    }

    /// Get the public address (safe to share)
    pub fn address(&self) -> Address {
        self.address
    }

    /// Get the address as an EIP-55 checksummed string
    pub fn address_string(&self) -> String {
        self.address.to_checksum(None)
    }

    /// The private key as `0x`-prefixed hex, wiped when dropped
    pub fn to_hex_secret(&self) -> Zeroizing<String> {
        let bytes = Zeroizing::new(self.signer.to_bytes().0);
        Zeroizing::new(format!("0x{}", hex::encode(bytes.as_slice())))
    }

    /// Sign a plain value transfer of `value` wei to `to`
    pub fn sign_transfer(
        &self,
        params: &TransferParams,
        to: Address,
        value: U256,
    ) -> Result<SignedTransfer> {
        let mut tx = TxEip1559 {
            chain_id: params.chain_id,
            nonce: params.nonce,
            gas_limit: params.gas_limit,
            max_fee_per_gas: params.max_fee_per_gas,
            max_priority_fee_per_gas: params.max_priority_fee_per_gas,
            to: TxKind::Call(to),
            value,
            access_list: Default::default(),
            input: Bytes::new(),
        };

        let signature = self
            .signer
            .sign_transaction_sync(&mut tx)
            .map_err(|e| Error::InvalidKey(format!("signing failed: {}", e)))?;

        let signed = tx.into_signed(signature);
        let tx_hash = *signed.hash();
        let raw = Bytes::from(TxEnvelope::from(signed).encoded_2718());

        Ok(SignedTransfer {
            tx_hash,
            raw,
            from: self.address,
            to,
            value,
            nonce: params.nonce,
        })
    }
}

// Implement Debug manually to avoid exposing the signer
impl std::fmt::Debug for WalletIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletIdentity")
            .field("address", &self.address)
            .field("signer", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::eips::eip2718::Decodable2718;

    // Well-known development key (DO NOT use in production!)
    const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn params() -> TransferParams {
        TransferParams {
            chain_id: 31337,
            nonce: 7,
            gas_limit: TRANSFER_GAS_LIMIT,
            max_fee_per_gas: 30_000_000_000,
            max_priority_fee_per_gas: 1_000_000_000,
        }
    }

    #[test]
    fn test_wallet_from_hex() {
        let wallet = WalletIdentity::from_hex(TEST_KEY).unwrap();
        assert_eq!(
            wallet.address_string().to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
        assert_eq!(
            wallet.address_string(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );
    }

    #[test]
    fn test_hex_round_trip() {
        let wallet = WalletIdentity::from_hex(TEST_KEY).unwrap();
        assert_eq!(wallet.to_hex_secret().as_str(), TEST_KEY);

        let without_prefix = WalletIdentity::from_hex(&TEST_KEY[2..]).unwrap();
        assert_eq!(without_prefix.address(), wallet.address());
    }

    #[test]
    fn test_generate_is_random() {
        let a = WalletIdentity::generate();
        let b = WalletIdentity::generate();
        assert_ne!(a.address(), b.address());

        let restored = WalletIdentity::from_hex(&a.to_hex_secret()).unwrap();
        assert_eq!(restored.address(), a.address());
    }

    #[test]
    fn test_rejects_invalid_keys() {
        // Zero is not a valid scalar
        let err = WalletIdentity::from_private_key(&[0u8; 32]).unwrap_err();
        assert!(matches!(err, Error::InvalidKey(_)));

        // Above the curve order
        let err = WalletIdentity::from_private_key(&[0xffu8; 32]).unwrap_err();
        assert!(matches!(err, Error::InvalidKey(_)));

        let err = WalletIdentity::from_private_key(&[1u8; 31]).unwrap_err();
        assert!(matches!(err, Error::InvalidKey(_)));

        let err = WalletIdentity::from_hex("0xnot-hex").unwrap_err();
        assert!(matches!(err, Error::InvalidKey(_)));
    }

    #[test]
    fn test_debug_redacts_key() {
        let wallet = WalletIdentity::from_hex(TEST_KEY).unwrap();
        let debug_str = format!("{:?}", wallet);

        assert!(!debug_str.contains("ac0974bec"));
        assert!(debug_str.contains("[REDACTED]"));
    }

    #[test]
    fn test_sign_transfer_encodes_recipient_and_value() {
        let wallet = WalletIdentity::from_hex(TEST_KEY).unwrap();
        let to: Address = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8".parse().unwrap();
        let value = U256::from(1_500_000_000_000_000_000u128);

        let signed = wallet.sign_transfer(&params(), to, value).unwrap();
        assert_eq!(signed.from, wallet.address());
        assert_eq!(signed.nonce, 7);

        let decoded = TxEnvelope::decode_2718(&mut signed.raw.as_ref()).unwrap();
        assert_eq!(*decoded.tx_hash(), signed.tx_hash);

        let TxEnvelope::Eip1559(inner) = decoded else {
            panic!("expected an EIP-1559 transaction");
        };
        assert_eq!(inner.tx().to, TxKind::Call(to));
        assert_eq!(inner.tx().value, value);
        assert_eq!(inner.tx().chain_id, 31337);
        assert_eq!(inner.tx().gas_limit, TRANSFER_GAS_LIMIT);

        let sender = inner
            .signature()
            .recover_address_from_prehash(&inner.tx().signature_hash())
            .unwrap();
        assert_eq!(sender, wallet.address());
    }

    #[test]
    fn test_signing_is_deterministic() {
        let wallet = WalletIdentity::from_hex(TEST_KEY).unwrap();
        let to = Address::repeat_byte(0x11);
        let a = wallet.sign_transfer(&params(), to, U256::from(1)).unwrap();
        let b = wallet.sign_transfer(&params(), to, U256::from(1)).unwrap();
        assert_eq!(a.tx_hash, b.tx_hash);
        assert_eq!(a.raw, b.raw);
    }
}

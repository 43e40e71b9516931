//! JSON-RPC chain client backed by an alloy HTTP provider

use super::{ChainClient, Confirmation};
use crate::config::Config;
use crate::wallet::{TransferParams, TRANSFER_GAS_LIMIT};
use crate::{Error, Result};
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use async_trait::async_trait;
use std::time::Duration;

/// Chain client talking to a single node over HTTP
pub struct RpcChainClient {
    provider: DynProvider,
    poll_interval: Duration,
}

impl RpcChainClient {
    /// Connect to `rpc_url`; receipts are polled every `poll_interval`
    pub fn new(rpc_url: &str, poll_interval: Duration) -> Result<Self> {
        let url: url::Url = rpc_url
            .parse()
            .map_err(|e| Error::Config(format!("Invalid RPC URL: {}", e)))?;

        let provider = ProviderBuilder::new().connect_http(url).erased();
        Ok(Self::from_provider(provider, poll_interval))
    }

    /// Wrap an already connected provider
    pub fn from_provider(provider: DynProvider, poll_interval: Duration) -> Self {
        Self {
            provider,
            poll_interval,
        }
    }

    /// Create a client from the resolved configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.require_rpc_url()?, config.poll_interval())
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn get_balance(&self, address: Address) -> Result<U256> {
        self.provider
            .get_balance(address)
            .await
            .map_err(|e| Error::Rpc(format!("Failed to get balance: {}", e)))
    }

    async fn transfer_params(&self, from: Address) -> Result<TransferParams> {
        let chain_id = self
            .provider
            .get_chain_id()
            .await
            .map_err(|e| Error::Rpc(format!("Failed to get chain id: {}", e)))?;

        let nonce = self
            .provider
            .get_transaction_count(from)
            .pending()
            .await
            .map_err(|e| Error::Rpc(format!("Failed to get nonce: {}", e)))?;

        let fees = self
            .provider
            .estimate_eip1559_fees()
            .await
            .map_err(|e| Error::Rpc(format!("Failed to estimate fees: {}", e)))?;

        tracing::debug!(
            chain_id,
            nonce,
            max_fee_per_gas = fees.max_fee_per_gas,
            max_priority_fee_per_gas = fees.max_priority_fee_per_gas,
            "Fetched transfer parameters"
        );

        Ok(TransferParams {
            chain_id,
            nonce,
            gas_limit: TRANSFER_GAS_LIMIT,
            max_fee_per_gas: fees.max_fee_per_gas,
            max_priority_fee_per_gas: fees.max_priority_fee_per_gas,
        })
    }

    async fn broadcast(&self, raw_tx: &Bytes) -> Result<TxHash> {
        let pending = self
            .provider
            .send_raw_transaction(raw_tx)
            .await
            .map_err(|e| Error::Broadcast(e.to_string()))?;

        Ok(*pending.tx_hash())
    }

    /// Poll errors are logged and retried: the transaction is already out, so
    /// failing here would hide its hash. The caller's timeout bounds the wait.
    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<Confirmation> {
        loop {
            match self.provider.get_transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) => {
                    return Ok(Confirmation {
                        tx_hash,
                        block_number: receipt.block_number,
                        gas_used: receipt.gas_used,
                        success: receipt.status(),
                    });
                }
                Ok(None) => {
                    tracing::debug!(tx_hash = %tx_hash, "Transaction not mined yet");
                }
                Err(e) => {
                    tracing::warn!(tx_hash = %tx_hash, error = %e, "Receipt poll failed; retrying");
                }
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

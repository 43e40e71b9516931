//! Remote node access
//!
//! [`ChainClient`] is the seam between the wallet and the network: balance
//! queries, the chain parameters needed for signing, broadcast and receipt
//! polling. [`RpcChainClient`] implements it over JSON-RPC; tests substitute
//! an in-memory double.

mod rpc;

pub use rpc::RpcChainClient;

use crate::wallet::TransferParams;
use crate::Result;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use async_trait::async_trait;
use serde::Serialize;

/// Outcome of a mined transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Confirmation {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    /// `false` when the transaction was mined but reverted
    pub success: bool,
}

#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Native balance of `address` in wei
    async fn get_balance(&self, address: Address) -> Result<U256>;

    /// Chain id, pending nonce and provider-default fees for a transfer from `from`
    async fn transfer_params(&self, from: Address) -> Result<TransferParams>;

    /// Submit an EIP-2718 encoded signed transaction
    async fn broadcast(&self, raw_tx: &Bytes) -> Result<TxHash>;

    /// Block until the node reports `tx_hash` mined
    ///
    /// No deadline is applied here; callers bound the wait.
    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<Confirmation>;
}

#[cfg(test)]
pub(crate) mod mock;

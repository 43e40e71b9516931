//! In-memory chain client for tests

use super::{ChainClient, Confirmation};
use crate::wallet::{TransferParams, TRANSFER_GAS_LIMIT};
use crate::{Error, Result};
use alloy::primitives::{keccak256, Address, Bytes, TxHash, U256};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// How the mock answers `wait_for_confirmation`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mining {
    Succeeds,
    Reverts,
    Never,
}

pub(crate) struct MockChain {
    pub balances: HashMap<Address, U256>,
    pub reject_broadcast: Option<String>,
    pub mining: Mining,
    pub broadcasts: Mutex<Vec<Bytes>>,
    pub param_requests: Mutex<Vec<Address>>,
}

impl MockChain {
    pub(crate) fn new() -> Self {
        Self {
            balances: HashMap::new(),
            reject_broadcast: None,
            mining: Mining::Succeeds,
            broadcasts: Mutex::new(Vec::new()),
            param_requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_balance(mut self, address: Address, wei: U256) -> Self {
        self.balances.insert(address, wei);
        self
    }

    pub(crate) fn rejecting(mut self, reason: &str) -> Self {
        self.reject_broadcast = Some(reason.to_string());
        self
    }

    pub(crate) fn mining(mut self, mining: Mining) -> Self {
        self.mining = mining;
        self
    }

    pub(crate) fn broadcasts(&self) -> Vec<Bytes> {
        self.broadcasts.lock().unwrap().clone()
    }

    pub(crate) fn param_requests(&self) -> usize {
        self.param_requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn get_balance(&self, address: Address) -> Result<U256> {
        Ok(self.balances.get(&address).copied().unwrap_or(U256::ZERO))
    }

    async fn transfer_params(&self, from: Address) -> Result<TransferParams> {
        self.param_requests.lock().unwrap().push(from);
        Ok(TransferParams {
            chain_id: 31337,
            nonce: 0,
            gas_limit: TRANSFER_GAS_LIMIT,
            max_fee_per_gas: 2_000_000_000,
            max_priority_fee_per_gas: 1_000_000_000,
        })
    }

    async fn broadcast(&self, raw_tx: &Bytes) -> Result<TxHash> {
        self.broadcasts.lock().unwrap().push(raw_tx.clone());
        match &self.reject_broadcast {
            Some(reason) => Err(Error::Broadcast(reason.clone())),
            // The hash of a typed transaction is keccak256 of its 2718 encoding
            None => Ok(keccak256(raw_tx)),
        }
    }

    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<Confirmation> {
        match self.mining {
            Mining::Never => std::future::pending().await,
            mining => Ok(Confirmation {
                tx_hash,
                block_number: Some(1),
                gas_used: TRANSFER_GAS_LIMIT,
                success: mining == Mining::Succeeds,
            }),
        }
    }
}

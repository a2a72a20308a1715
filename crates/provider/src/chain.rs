//! Read-only access to the chain (account code, entry point nonce, factory queries, fees)

use crate::error::ProviderError;
use alloy_chains::Chain;
use async_trait::async_trait;
use ethers::{
    providers::Middleware,
    types::{Address, Bytes, U256},
};
use kernel_contracts::{EntryPoint, KernelFactory};
use kernel_primitives::chain::ChainExt;
use std::{fmt::Debug, sync::Arc};
use tracing::trace;

/// EIP-1559 fees of a user operation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Fees {
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
}

impl Fees {
    /// Raises the priority fee to the minimum bundlers accept on the chain
    pub fn with_floor(self, chain: Chain) -> Self {
        let min_priority_fee = chain.min_priority_fee_per_bid();
        let max_priority_fee_per_gas = self.max_priority_fee_per_gas.max(min_priority_fee);
        Self {
            max_fee_per_gas: self.max_fee_per_gas.max(max_priority_fee_per_gas),
            max_priority_fee_per_gas,
        }
    }
}

/// Chain state the provider needs
#[async_trait]
pub trait ChainReader: Debug + Send + Sync {
    async fn chain_id(&self) -> Result<u64, ProviderError>;

    /// Code deployed at the address (empty for undeployed accounts)
    async fn get_code(&self, address: Address) -> Result<Bytes, ProviderError>;

    /// Entry point nonce of the sender in the key space
    async fn get_nonce(
        &self,
        entry_point: Address,
        sender: Address,
        key: U256,
    ) -> Result<U256, ProviderError>;

    /// Counterfactual account address computed by the factory
    async fn get_account_address(
        &self,
        factory: Address,
        validator: Address,
        enable_data: Bytes,
        index: U256,
    ) -> Result<Address, ProviderError>;

    /// Counterfactual account address computed by the entry point from the init code
    async fn get_sender_address(
        &self,
        entry_point: Address,
        init_code: Bytes,
    ) -> Result<Address, ProviderError>;

    async fn estimate_fees(&self) -> Result<Fees, ProviderError>;
}

/// [ChainReader] over an ethers middleware
#[derive(Debug)]
pub struct EthersChainReader<M: Middleware + 'static> {
    eth_client: Arc<M>,
    chain: Chain,
}

impl<M: Middleware + 'static> EthersChainReader<M> {
    pub fn new(eth_client: Arc<M>, chain: Chain) -> Self {
        Self { eth_client, chain }
    }
}

fn transport<E: ToString>(err: E) -> ProviderError {
    ProviderError::Transport { inner: err.to_string() }
}

#[async_trait]
impl<M: Middleware + 'static> ChainReader for EthersChainReader<M> {
    async fn chain_id(&self) -> Result<u64, ProviderError> {
        self.eth_client.get_chainid().await.map(|id| id.as_u64()).map_err(transport)
    }

    async fn get_code(&self, address: Address) -> Result<Bytes, ProviderError> {
        self.eth_client.get_code(address, None).await.map_err(transport)
    }

    async fn get_nonce(
        &self,
        entry_point: Address,
        sender: Address,
        key: U256,
    ) -> Result<U256, ProviderError> {
        let entry_point = EntryPoint::new(self.eth_client.clone(), entry_point);
        Ok(entry_point.get_nonce(&sender, key).await?)
    }

    async fn get_account_address(
        &self,
        factory: Address,
        validator: Address,
        enable_data: Bytes,
        index: U256,
    ) -> Result<Address, ProviderError> {
        let factory = KernelFactory::new(self.eth_client.clone(), factory);
        Ok(factory.get_account_address(validator, enable_data, index).await?)
    }

    async fn get_sender_address(
        &self,
        entry_point: Address,
        init_code: Bytes,
    ) -> Result<Address, ProviderError> {
        let entry_point = EntryPoint::new(self.eth_client.clone(), entry_point);
        Ok(entry_point.get_sender_address(init_code).await?)
    }

    async fn estimate_fees(&self) -> Result<Fees, ProviderError> {
        let (max_fee_per_gas, max_priority_fee_per_gas) =
            self.eth_client.estimate_eip1559_fees(None).await.map_err(transport)?;
        trace!("Estimated fees: max fee {max_fee_per_gas}, max priority fee {max_priority_fee_per_gas}");
        Ok(Fees { max_fee_per_gas, max_priority_fee_per_gas }.with_floor(self.chain))
    }
}

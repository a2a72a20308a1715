//! Bundler JSON-RPC (`eth` namespace of ERC-4337)

use crate::error::ProviderError;
use async_trait::async_trait;
use ethers::types::{Address, U64};
use jsonrpsee::{
    core::RpcResult,
    http_client::{HttpClient, HttpClientBuilder},
    proc_macros::rpc,
};
use kernel_primitives::{
    UserOperation, UserOperationGasEstimation, UserOperationHash, UserOperationReceipt,
    UserOperationRequest,
};
use std::{fmt::Debug, time::Duration};
use tracing::trace;

/// The ERC-4337 `eth` namespace RPC methods trait (the subset a wallet uses)
#[rpc(client, server, namespace = "eth")]
pub trait BundlerApi {
    #[method(name = "chainId")]
    async fn chain_id(&self) -> RpcResult<U64>;

    #[method(name = "supportedEntryPoints")]
    async fn supported_entry_points(&self) -> RpcResult<Vec<Address>>;

    /// Estimates the gas of a user operation carrying a dummy signature
    #[method(name = "estimateUserOperationGas")]
    async fn estimate_user_operation_gas(
        &self,
        user_operation: UserOperationRequest,
        entry_point: Address,
    ) -> RpcResult<UserOperationGasEstimation>;

    #[method(name = "sendUserOperation")]
    async fn send_user_operation(
        &self,
        user_operation: UserOperation,
        entry_point: Address,
    ) -> RpcResult<UserOperationHash>;

    /// `None` until the user operation is included
    #[method(name = "getUserOperationReceipt")]
    async fn get_user_operation_receipt(
        &self,
        user_operation_hash: UserOperationHash,
    ) -> RpcResult<Option<UserOperationReceipt>>;
}

/// Bundler as seen by the provider
///
/// JSON-RPC error objects become [ProviderError::ValidationRejection], every other failure
/// [ProviderError::Transport].
#[async_trait]
pub trait BundlerClient: Debug + Send + Sync {
    async fn supported_entry_points(&self) -> Result<Vec<Address>, ProviderError>;

    async fn estimate_user_operation_gas(
        &self,
        uo: &UserOperationRequest,
        entry_point: Address,
    ) -> Result<UserOperationGasEstimation, ProviderError>;

    async fn send_user_operation(
        &self,
        uo: &UserOperation,
        entry_point: Address,
    ) -> Result<UserOperationHash, ProviderError>;

    async fn get_user_operation_receipt(
        &self,
        hash: &UserOperationHash,
    ) -> Result<Option<UserOperationReceipt>, ProviderError>;
}

/// [BundlerClient] over HTTP JSON-RPC
#[derive(Debug, Clone)]
pub struct RpcBundlerClient {
    client: HttpClient,
}

impl RpcBundlerClient {
    pub fn new(url: &str) -> Result<Self, ProviderError> {
        Self::with_timeout(url, Duration::from_secs(60))
    }

    pub fn with_timeout(url: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let client = HttpClientBuilder::default()
            .request_timeout(timeout)
            .build(url)
            .map_err(|err| ProviderError::configuration(format!("bundler url {url}: {err}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl BundlerClient for RpcBundlerClient {
    async fn supported_entry_points(&self) -> Result<Vec<Address>, ProviderError> {
        Ok(BundlerApiClient::supported_entry_points(&self.client).await?)
    }

    async fn estimate_user_operation_gas(
        &self,
        uo: &UserOperationRequest,
        entry_point: Address,
    ) -> Result<UserOperationGasEstimation, ProviderError> {
        trace!("Estimating gas of {uo:?}");
        Ok(BundlerApiClient::estimate_user_operation_gas(&self.client, uo.clone(), entry_point)
            .await?)
    }

    async fn send_user_operation(
        &self,
        uo: &UserOperation,
        entry_point: Address,
    ) -> Result<UserOperationHash, ProviderError> {
        trace!("Sending {uo:?} to {entry_point:?}");
        Ok(BundlerApiClient::send_user_operation(&self.client, uo.clone(), entry_point).await?)
    }

    async fn get_user_operation_receipt(
        &self,
        hash: &UserOperationHash,
    ) -> Result<Option<UserOperationReceipt>, ProviderError> {
        Ok(BundlerApiClient::get_user_operation_receipt(&self.client, *hash).await?)
    }
}

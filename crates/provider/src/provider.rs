//! Kernel provider: builds, estimates, sponsors, signs and submits user operations of a
//! Kernel account

use crate::{
    account::KernelAccount,
    bundler::BundlerClient,
    chain::ChainReader,
    config::{ProviderConfig, ValidatorConfig},
    error::ProviderError,
    paymaster::{PaymasterClient, PaymasterMiddleware, PaymasterPolicy},
};
use alloy_chains::Chain;
use ethers::types::{Address, Bytes, H256, U256, U64};
use kernel_primitives::{
    chain::{resolve_chain, ChainExt},
    parse_message, Call, GasTokenRegistry, UserOperation, UserOperationCalls, UserOperationHash,
    UserOperationReceipt, UserOperationRequest,
};
use metrics::counter;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fmt, sync::Arc};
use tracing::{debug, info, trace, warn};

/// Services the provider talks to
#[derive(Clone)]
pub struct Collaborators {
    pub chain: Arc<dyn ChainReader>,
    pub bundler: Arc<dyn BundlerClient>,
    /// Required when the paymaster is enabled
    pub paymaster: Option<Arc<dyn PaymasterClient>>,
    pub gas_tokens: GasTokenRegistry,
}

/// EIP-1193 style request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl RpcRequest {
    pub fn new<S: Into<String>>(method: S, params: Value) -> Self {
        Self { method: method.into(), params }
    }
}

/// `eth_sendTransaction` parameters
#[derive(Clone, Debug, Deserialize)]
struct TransactionParams {
    to: Address,
    #[serde(default)]
    value: U256,
    #[serde(default, alias = "input")]
    data: Bytes,
}

/// Submitted user operation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SendUserOperationResult {
    pub hash: UserOperationHash,
    /// The user operation as accepted by the bundler
    pub request: UserOperation,
}

pub struct KernelProvider {
    config: ProviderConfig,
    chain: Chain,
    account: KernelAccount,
    chain_reader: Arc<dyn ChainReader>,
    bundler: Arc<dyn BundlerClient>,
    paymaster: Option<PaymasterMiddleware>,
}

impl fmt::Debug for KernelProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelProvider")
            .field("chain", &self.chain)
            .field("account", &self.account)
            .field("paymaster", &self.paymaster.as_ref().map(|p| p.policy()))
            .finish()
    }
}

impl KernelProvider {
    /// Checks the configuration (without any network call) and sets up the account
    pub fn init(
        config: ProviderConfig,
        validator: ValidatorConfig,
        collaborators: Collaborators,
    ) -> Result<Self, ProviderError> {
        let named = resolve_chain(config.chain_id).ok_or_else(|| {
            ProviderError::configuration(format!("unknown chain id {}", config.chain_id))
        })?;
        if !Chain::from_named(named).is_supported() {
            return Err(ProviderError::configuration(format!(
                "Kernel contracts are not deployed on {named}"
            )));
        }
        if config.entry_point.is_zero() {
            return Err(ProviderError::configuration("entry point address is zero"));
        }
        if config.factory.is_zero() {
            return Err(ProviderError::configuration("factory address is zero"));
        }
        if config.wait.poll_interval.is_zero() || config.wait.timeout.is_zero() {
            return Err(ProviderError::configuration("wait interval and timeout must be positive"));
        }

        let Collaborators { chain: chain_reader, bundler, paymaster, gas_tokens } = collaborators;

        let paymaster = if config.use_paymaster {
            let client = paymaster.ok_or_else(|| {
                ProviderError::configuration("paymaster enabled but no paymaster client")
            })?;
            let gas_token = match config.paymaster.policy {
                PaymasterPolicy::TokenPaymaster => {
                    let symbol = config.paymaster.gas_token.as_deref().ok_or_else(|| {
                        ProviderError::configuration("token paymaster requires a gas token")
                    })?;
                    let token = gas_tokens.get(symbol, config.chain_id).ok_or_else(|| {
                        ProviderError::configuration(format!(
                            "gas token {symbol} not supported on chain {named} (supported: {:?})",
                            gas_tokens.symbols(config.chain_id)
                        ))
                    })?;
                    Some(token.clone())
                }
                PaymasterPolicy::VerifyingPaymaster => None,
            };
            Some(
                PaymasterMiddleware::new(
                    client,
                    config.paymaster.policy,
                    gas_token,
                    config.chain_id,
                    config.entry_point,
                )?
                .with_project_id(config.paymaster.project_id.clone()),
            )
        } else {
            None
        };

        let (sudo, active) = validator.into_validators();
        debug!(
            "Kernel provider on {named} with {} validator (sudo {}), index {}",
            active.kind(),
            sudo.kind(),
            config.index
        );
        let account = KernelAccount::new(
            chain_reader.clone(),
            config.entry_point,
            config.factory,
            config.index,
            config.address_derivation.clone(),
            sudo,
            active,
        );

        Ok(Self {
            chain: Chain::from_named(named),
            config,
            account,
            chain_reader,
            bundler,
            paymaster,
        })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn chain(&self) -> Chain {
        self.chain
    }

    pub fn get_account(&self) -> &KernelAccount {
        &self.account
    }

    pub async fn get_address(&self) -> Result<Address, ProviderError> {
        self.account.get_address().await
    }

    pub async fn get_nonce(&self) -> Result<U256, ProviderError> {
        self.account.get_nonce().await
    }

    pub async fn is_account_deployed(&self) -> Result<bool, ProviderError> {
        self.account.is_account_deployed().await
    }

    pub fn encode_execute(&self, target: Address, value: U256, data: Bytes) -> Bytes {
        self.account.encode_execute(target, value, data)
    }

    pub fn encode_execute_delegate(&self, target: Address, value: U256, data: Bytes) -> Bytes {
        self.account.encode_execute_delegate(target, value, data)
    }

    /// Message signature of the account (EIP-6492 wrapped while not deployed)
    pub async fn sign_message(&self, message: &[u8]) -> Result<Bytes, ProviderError> {
        self.account.sign_with_eip6492(message).await
    }

    /// ERC-20 approval the account needs before paying gas with the configured token
    pub fn gas_token_approve_call(&self, paymaster: Address) -> Result<Call, ProviderError> {
        self.paymaster
            .as_ref()
            .ok_or_else(|| ProviderError::configuration("paymaster not enabled"))?
            .gas_token_approve_call(paymaster)
    }

    /// Unsigned user operation executing the calls (estimated and, if enabled, sponsored)
    pub async fn build_user_operation(
        &self,
        calls: &UserOperationCalls,
    ) -> Result<UserOperation, ProviderError> {
        let call_data = self.account.encode_calls(calls)?;
        self.build_with_call_data(call_data).await
    }

    async fn build_with_call_data(&self, call_data: Bytes) -> Result<UserOperation, ProviderError> {
        let sender = self.account.get_address().await?;
        let deployed = self.account.is_account_deployed().await?;
        let nonce = self.account.nonce(deployed).await?;
        let fees = self.chain_reader.estimate_fees().await?;

        let uo = UserOperation::default()
            .sender(sender)
            .nonce(nonce)
            .init_code(self.account.init_code(deployed))
            .call_data(call_data)
            .max_fee_per_gas(fees.max_fee_per_gas)
            .max_priority_fee_per_gas(fees.max_priority_fee_per_gas);
        let uo = uo.clone().signature(self.account.dummy_signature(&uo).await?);
        trace!("Built user operation {uo:?}");

        let request = UserOperationRequest {
            call_gas_limit: None,
            verification_gas_limit: None,
            pre_verification_gas: None,
            ..uo.clone().into()
        };
        let estimation =
            self.bundler.estimate_user_operation_gas(&request, self.config.entry_point).await?;
        debug!("Gas estimation of user operation of {sender:?}: {estimation:?}");
        let uo = uo.with_gas_estimation(&estimation);

        let uo = match &self.paymaster {
            Some(paymaster) => paymaster.annotate(uo).await?,
            None => uo,
        };

        Ok(uo.signature(Bytes::default()))
    }

    /// Signs the user operation with the active validator
    pub async fn sign_user_operation(
        &self,
        uo: UserOperation,
    ) -> Result<UserOperation, ProviderError> {
        let hash = uo.hash(&self.config.entry_point, self.config.chain_id);
        let signature = self.account.sign_user_operation_hash(&hash, &uo).await?;
        trace!("Signed user operation {hash}");
        Ok(uo.signature(signature))
    }

    /// Sends the calls as one user operation
    pub async fn send_user_operation(
        &self,
        calls: UserOperationCalls,
    ) -> Result<SendUserOperationResult, ProviderError> {
        let call_data = self.account.encode_calls(&calls)?;
        self.send_call_data(call_data).await
    }

    /// Sends a user operation with the given (already encoded) account call data
    ///
    /// Transport failures are retried `max_retries` times with a fixed delay; bundler
    /// rejections are returned at once. Every attempt is one `eth_sendUserOperation`.
    pub async fn send_call_data(
        &self,
        call_data: Bytes,
    ) -> Result<SendUserOperationResult, ProviderError> {
        let uo = self.build_with_call_data(call_data.clone()).await?;
        let mut uo = self.sign_user_operation(uo).await?;

        let attempts = self.config.retry.max_retries.saturating_add(1);
        let mut attempt = 1;
        loop {
            let sent = self.bundler.send_user_operation(&uo, self.config.entry_point).await;
            match sent {
                Ok(hash) => {
                    counter!("kernel_provider_user_operations_submitted").increment(1);
                    info!("User operation {hash} of {:?} submitted (attempt {attempt})", uo.sender);
                    return Ok(SendUserOperationResult { hash, request: uo });
                }
                Err(err) if err.is_retryable() && attempt < attempts => {
                    counter!("kernel_provider_send_retries").increment(1);
                    warn!(
                        "Attempt {attempt}/{attempts} to send user operation failed: {err}, retrying in {:?}",
                        self.config.retry.interval
                    );
                    tokio::time::sleep(self.config.retry.interval).await;
                    attempt += 1;
                    if let Err(err) = self.refresh(&mut uo, &call_data).await {
                        counter!("kernel_provider_send_failures").increment(1);
                        warn!("User operation could not be rebuilt: {err}");
                        return Err(err);
                    }
                }
                Err(err) if err.is_retryable() => {
                    counter!("kernel_provider_send_failures").increment(1);
                    warn!("User operation not submitted after {attempts} attempts: {err}");
                    return Err(ProviderError::RetriesExhausted {
                        attempts,
                        inner: err.to_string(),
                    });
                }
                Err(err) => {
                    counter!("kernel_provider_send_failures").increment(1);
                    warn!("User operation rejected: {err}");
                    return Err(err);
                }
            }
        }
    }

    /// Rebuilds and re-signs the user operation if it went stale since the last attempt.
    /// Transport failures while checking or rebuilding keep the current user operation.
    async fn refresh(
        &self,
        uo: &mut UserOperation,
        call_data: &Bytes,
    ) -> Result<(), ProviderError> {
        let reason = match self.staleness(uo).await {
            Ok(Some(reason)) => reason,
            Ok(None) => return Ok(()),
            Err(err) if err.is_retryable() => {
                debug!("Freshness of user operation of {:?} unknown: {err}", uo.sender);
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        info!("User operation of {:?} is stale ({reason}), rebuilding", uo.sender);
        match self.build_with_call_data(call_data.clone()).await {
            Ok(rebuilt) => {
                *uo = self.sign_user_operation(rebuilt).await?;
                Ok(())
            }
            Err(err) if err.is_retryable() => {
                warn!("Rebuilding user operation of {:?} failed: {err}", uo.sender);
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Why the user operation can no longer be resubmitted as is, if at all
    async fn staleness(&self, uo: &UserOperation) -> Result<Option<&'static str>, ProviderError> {
        let deployed = self.account.is_account_deployed().await?;
        if deployed != uo.init_code.is_empty() {
            return Ok(Some("account deployed"));
        }
        if self.account.nonce(deployed).await? != uo.nonce {
            return Ok(Some("nonce changed"));
        }
        let fees = self.chain_reader.estimate_fees().await?;
        if fees.max_fee_per_gas > uo.max_fee_per_gas
            || fees.max_priority_fee_per_gas > uo.max_priority_fee_per_gas
        {
            return Ok(Some("gas fees rose"));
        }
        // sponsorship is signed over the previous gas values and validity window
        if !uo.paymaster_and_data.is_empty() {
            return Ok(Some("paymaster data outdated"));
        }
        Ok(None)
    }

    pub async fn get_user_operation_receipt(
        &self,
        hash: &UserOperationHash,
    ) -> Result<Option<UserOperationReceipt>, ProviderError> {
        self.bundler.get_user_operation_receipt(hash).await
    }

    /// Polls the bundler until the user operation is included and returns the hash of the
    /// bundle transaction
    pub async fn wait_for_user_operation_transaction(
        &self,
        hash: UserOperationHash,
    ) -> Result<H256, ProviderError> {
        let timeout = self.config.wait.timeout;
        let receipt = tokio::time::timeout(timeout, self.poll_receipt(&hash))
            .await
            .map_err(|_| ProviderError::InclusionTimeout { hash, timeout })??;

        if !receipt.success {
            warn!("User operation {hash} included but reverted: {}", receipt.reason);
        }
        Ok(receipt.tx_receipt.transaction_hash)
    }

    async fn poll_receipt(
        &self,
        hash: &UserOperationHash,
    ) -> Result<UserOperationReceipt, ProviderError> {
        loop {
            match self.bundler.get_user_operation_receipt(hash).await {
                Ok(Some(receipt)) => return Ok(receipt),
                Ok(None) => trace!("User operation {hash} not included yet"),
                Err(err) if err.is_retryable() => debug!("Polling receipt of {hash} failed: {err}"),
                Err(err) => return Err(err),
            }
            tokio::time::sleep(self.config.wait.poll_interval).await;
        }
    }

    /// Wallet requests answered by the account
    pub async fn request(&self, request: RpcRequest) -> Result<Value, ProviderError> {
        trace!("Request {} with {}", request.method, request.params);
        match request.method.as_str() {
            "personal_sign" => {
                let (message, address): (String, Address) = params(request.params)?;
                self.sign_for(address, &message).await
            }
            "eth_sign" => {
                let (address, message): (Address, String) = params(request.params)?;
                self.sign_for(address, &message).await
            }
            "eth_accounts" => Ok(serde_json::json!([self.get_address().await?])),
            "eth_chainId" => Ok(serde_json::json!(U64::from(self.config.chain_id))),
            "eth_sendTransaction" => {
                let (tx,): (TransactionParams,) = params(request.params)?;
                let result = self
                    .send_user_operation(Call::new(tx.to, tx.value, tx.data).into())
                    .await?;
                Ok(serde_json::json!(result.hash))
            }
            _ => Err(ProviderError::UnsupportedMethod { method: request.method }),
        }
    }

    async fn sign_for(&self, address: Address, message: &str) -> Result<Value, ProviderError> {
        let account = self.get_address().await?;
        if address != account {
            return Err(ProviderError::invalid_request(format!(
                "cannot sign for {address:?}, account is {account:?}"
            )));
        }
        let signature = self.sign_message(&parse_message(message)).await?;
        Ok(serde_json::json!(signature))
    }
}

fn params<T: serde::de::DeserializeOwned>(params: Value) -> Result<T, ProviderError> {
    serde_json::from_value(params).map_err(ProviderError::invalid_request)
}

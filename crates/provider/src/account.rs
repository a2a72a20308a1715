//! Kernel v2 smart account: counterfactual address, init code, call data and signatures

use crate::{
    chain::ChainReader, config::AddressDerivation, eip6492, error::ProviderError,
    validator::KernelValidator,
};
use ethers::types::{Address, Bytes, U256};
use kernel_contracts::{
    compute_account_address, encode_create_account, encode_execute, encode_execute_batch,
    encode_execute_delegate,
};
use kernel_primitives::{Call, UserOperation, UserOperationCalls, UserOperationHash};
use std::{fmt, sync::Arc};
use tokio::sync::OnceCell;
use tracing::debug;

/// Kernel account of the sudo validator's owner at the index
///
/// The sudo (default) validator determines the address and the init code; the active
/// validator signs. Both are the same unless a plugin validator is in use.
pub struct KernelAccount {
    chain: Arc<dyn ChainReader>,
    entry_point: Address,
    factory: Address,
    index: U256,
    derivation: AddressDerivation,
    sudo: Arc<dyn KernelValidator>,
    validator: Arc<dyn KernelValidator>,
    address: OnceCell<Address>,
}

impl fmt::Debug for KernelAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelAccount")
            .field("factory", &self.factory)
            .field("index", &self.index)
            .field("sudo", &self.sudo.kind())
            .field("validator", &self.validator.kind())
            .field("address", &self.address.get())
            .finish()
    }
}

impl KernelAccount {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        chain: Arc<dyn ChainReader>,
        entry_point: Address,
        factory: Address,
        index: U256,
        derivation: AddressDerivation,
        sudo: Arc<dyn KernelValidator>,
        validator: Arc<dyn KernelValidator>,
    ) -> Self {
        Self {
            chain,
            entry_point,
            factory,
            index,
            derivation,
            sudo,
            validator,
            address: OnceCell::new(),
        }
    }

    pub fn entry_point(&self) -> Address {
        self.entry_point
    }

    pub fn factory(&self) -> Address {
        self.factory
    }

    pub fn index(&self) -> U256 {
        self.index
    }

    pub fn validator(&self) -> Arc<dyn KernelValidator> {
        self.validator.clone()
    }

    pub fn sudo_validator(&self) -> Arc<dyn KernelValidator> {
        self.sudo.clone()
    }

    /// Counterfactual address (computed once)
    pub async fn get_address(&self) -> Result<Address, ProviderError> {
        self.address.get_or_try_init(|| self.derive_address()).await.copied()
    }

    async fn derive_address(&self) -> Result<Address, ProviderError> {
        let address = match &self.derivation {
            AddressDerivation::Create2 { kernel_template, proxy_creation_code } => {
                compute_account_address(
                    self.factory,
                    *kernel_template,
                    proxy_creation_code,
                    self.sudo.address(),
                    &self.sudo.enable_data(),
                    self.index,
                )
            }
            AddressDerivation::FactoryQuery => {
                self.chain
                    .get_account_address(
                        self.factory,
                        self.sudo.address(),
                        self.sudo.enable_data(),
                        self.index,
                    )
                    .await?
            }
            AddressDerivation::EntryPointQuery => {
                self.chain.get_sender_address(self.entry_point, self.factory_init_code()).await?
            }
        };
        debug!("Kernel account at index {} is {address:?}", self.index);
        Ok(address)
    }

    /// `createAccount(validator, enableData, index)` of the factory
    pub fn get_factory_call_data(&self) -> Bytes {
        encode_create_account(self.sudo.address(), self.sudo.enable_data(), self.index)
    }

    fn factory_init_code(&self) -> Bytes {
        [self.factory.as_bytes(), &self.get_factory_call_data()].concat().into()
    }

    /// `factory ‖ factoryCallData`, empty once the account is deployed
    pub async fn get_init_code(&self) -> Result<Bytes, ProviderError> {
        Ok(self.init_code(self.is_account_deployed().await?))
    }

    pub(crate) fn init_code(&self, deployed: bool) -> Bytes {
        if deployed {
            Bytes::default()
        } else {
            self.factory_init_code()
        }
    }

    /// Entry point nonce in the active validator's key space (`key << 64` before deployment)
    pub async fn get_nonce(&self) -> Result<U256, ProviderError> {
        let deployed = self.is_account_deployed().await?;
        self.nonce(deployed).await
    }

    pub(crate) async fn nonce(&self, deployed: bool) -> Result<U256, ProviderError> {
        let key = self.validator.nonce_key();
        if !deployed {
            return Ok(key << 64);
        }
        let sender = self.get_address().await?;
        self.chain.get_nonce(self.entry_point, sender, key).await
    }

    /// Code at the account address is not empty (never cached)
    pub async fn is_account_deployed(&self) -> Result<bool, ProviderError> {
        let address = self.get_address().await?;
        Ok(!self.chain.get_code(address).await?.is_empty())
    }

    pub fn encode_execute(&self, target: Address, value: U256, data: Bytes) -> Bytes {
        encode_execute(target, value, data)
    }

    pub fn encode_execute_delegate(&self, target: Address, value: U256, data: Bytes) -> Bytes {
        encode_execute_delegate(target, value, data)
    }

    pub fn encode_execute_batch(&self, calls: &[Call]) -> Bytes {
        encode_execute_batch(calls)
    }

    /// `execute` for a single call, `executeBatch` for a batch
    pub fn encode_calls(&self, calls: &UserOperationCalls) -> Result<Bytes, ProviderError> {
        match calls {
            UserOperationCalls::Single(call) => {
                Ok(self.encode_execute(call.target, call.value, call.data.clone()))
            }
            UserOperationCalls::Batch(calls) if calls.is_empty() => {
                Err(ProviderError::invalid_request("empty batch of calls"))
            }
            UserOperationCalls::Batch(calls) => Ok(self.encode_execute_batch(calls)),
        }
    }

    /// Raw signature of the active validator (ERC-1271)
    pub async fn sign_message(&self, message: &[u8]) -> Result<Bytes, ProviderError> {
        Ok(self.validator.sign_message(message).await?)
    }

    /// Message signature, EIP-6492 wrapped while the account is not deployed
    pub async fn sign_with_eip6492(&self, message: &[u8]) -> Result<Bytes, ProviderError> {
        let signature = self.sign_message(message).await?;
        if self.is_account_deployed().await? {
            Ok(signature)
        } else {
            Ok(eip6492::wrap(self.factory, &self.get_factory_call_data(), &signature))
        }
    }

    /// Mode prefix followed by the active validator's signature of the hash
    pub async fn sign_user_operation_hash(
        &self,
        hash: &UserOperationHash,
        uo: &UserOperation,
    ) -> Result<Bytes, ProviderError> {
        let signature = self.validator.sign_user_op_hash(hash, uo).await?;
        Ok(self.validator.mode().encode_signature(self.validator.as_ref(), &signature))
    }

    /// Signature placeholder of the final length (for gas estimation)
    pub async fn dummy_signature(&self, uo: &UserOperation) -> Result<Bytes, ProviderError> {
        let signature = self.validator.dummy_signature(uo).await?;
        Ok(self.validator.mode().encode_signature(self.validator.as_ref(), &signature))
    }
}

use super::{sign_with, KernelValidator, ValidatorError, ValidatorKind};
use async_trait::async_trait;
use ethers::types::{Address, Bytes};
use kernel_primitives::{
    constants::validators::{DUMMY_ECDSA_SIGNATURE, ECDSA_VALIDATOR_ADDRESS},
    AccountSigner, UserOperation, UserOperationHash,
};
use std::{str::FromStr, sync::Arc};

/// Owner of the account signs with an ECDSA key (Kernel's default validator)
#[derive(Clone, Debug)]
pub struct EcdsaValidator {
    address: Address,
    owner: Arc<dyn AccountSigner>,
}

impl EcdsaValidator {
    /// ECDSA validator deployed at the canonical address
    pub fn new(owner: Arc<dyn AccountSigner>) -> Self {
        Self { address: default_address(), owner }
    }

    pub fn with_address(mut self, address: Address) -> Self {
        self.address = address;
        self
    }

    pub fn owner(&self) -> Address {
        self.owner.address()
    }
}

pub(crate) fn default_address() -> Address {
    Address::from_str(ECDSA_VALIDATOR_ADDRESS).unwrap_or_default()
}

pub(crate) fn dummy_ecdsa_signature() -> Bytes {
    Bytes::from_str(DUMMY_ECDSA_SIGNATURE).unwrap_or_default()
}

#[async_trait]
impl KernelValidator for EcdsaValidator {
    fn kind(&self) -> ValidatorKind {
        ValidatorKind::Ecdsa
    }

    fn address(&self) -> Address {
        self.address
    }

    fn enable_data(&self) -> Bytes {
        self.owner.address().as_bytes().to_vec().into()
    }

    async fn sign_user_op_hash(
        &self,
        hash: &UserOperationHash,
        _uo: &UserOperation,
    ) -> Result<Bytes, ValidatorError> {
        sign_with(&self.owner, hash.as_bytes()).await
    }

    async fn sign_message(&self, message: &[u8]) -> Result<Bytes, ValidatorError> {
        sign_with(&self.owner, message).await
    }

    async fn dummy_signature(&self, _uo: &UserOperation) -> Result<Bytes, ValidatorError> {
        Ok(dummy_ecdsa_signature())
    }
}

use super::{ecdsa, KernelValidator, ValidatorError, ValidatorKind};
use async_trait::async_trait;
use ethers::types::{Address, Bytes};
use kernel_primitives::{UserOperation, UserOperationHash};

/// Validator known only by its address and enable data
///
/// Derives the account address and init code (e.g. the ECDSA owner of an account whose user
/// operations are signed by a plugin); every signing capability fails.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmptyValidator {
    address: Address,
    enable_data: Bytes,
}

impl EmptyValidator {
    pub fn new(address: Address, enable_data: Bytes) -> Self {
        Self { address, enable_data }
    }

    /// Default ECDSA validator of the owner
    pub fn ecdsa(owner: Address) -> Self {
        Self::new(ecdsa::default_address(), owner.as_bytes().to_vec().into())
    }
}

#[async_trait]
impl KernelValidator for EmptyValidator {
    fn kind(&self) -> ValidatorKind {
        ValidatorKind::Empty
    }

    fn address(&self) -> Address {
        self.address
    }

    fn enable_data(&self) -> Bytes {
        self.enable_data.clone()
    }

    async fn sign_user_op_hash(
        &self,
        _hash: &UserOperationHash,
        _uo: &UserOperation,
    ) -> Result<Bytes, ValidatorError> {
        Err(ValidatorError::SigningUnsupported { kind: self.kind() })
    }

    async fn sign_message(&self, _message: &[u8]) -> Result<Bytes, ValidatorError> {
        Err(ValidatorError::SigningUnsupported { kind: self.kind() })
    }

    async fn dummy_signature(&self, _uo: &UserOperation) -> Result<Bytes, ValidatorError> {
        Err(ValidatorError::SigningUnsupported { kind: self.kind() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_validator_does_not_sign() {
        let owner: Address = "0x48D4d3536cDe7A257087206870c6B6E76e3D4ff4".parse().unwrap();
        let validator = EmptyValidator::ecdsa(owner);
        assert_eq!(
            validator.address(),
            "0x180D6465F921C7E0DEA0040107D342c87455fFF5".parse::<Address>().unwrap()
        );
        assert_eq!(validator.enable_data().as_ref(), owner.as_bytes());

        let err = validator.sign_message(b"hello").await.unwrap_err();
        assert_eq!(err, ValidatorError::SigningUnsupported { kind: ValidatorKind::Empty });
        assert!(validator.dummy_signature(&UserOperation::default()).await.is_err());
    }
}

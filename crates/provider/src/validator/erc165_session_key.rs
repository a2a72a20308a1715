use super::{
    ecdsa::dummy_ecdsa_signature, now, sign_with, KernelValidator, ValidatorError, ValidatorKind,
    ValidatorMode,
};
use async_trait::async_trait;
use ethers::types::{Address, Bytes};
use kernel_contracts::{decode_call_data, KernelCall};
use kernel_primitives::{
    constants::validators::ERC165_SESSION_KEY_VALIDATOR_ADDRESS, pack_uint48, AccountSigner,
    UserOperation, UserOperationHash,
};
use std::{str::FromStr, sync::Arc};

/// Session key allowed to call one function on contracts supporting an ERC-165 interface
///
/// The interface check of the target (found at `address_offset` in the call data) happens
/// on-chain.
#[derive(Clone, Debug)]
pub struct Erc165SessionKeyValidator {
    address: Address,
    session_key: Arc<dyn AccountSigner>,
    interface_id: [u8; 4],
    selector: [u8; 4],
    valid_after: u64,
    valid_until: u64,
    address_offset: u32,
    mode: ValidatorMode,
}

impl Erc165SessionKeyValidator {
    pub fn new(
        session_key: Arc<dyn AccountSigner>,
        interface_id: [u8; 4],
        selector: [u8; 4],
        address_offset: u32,
    ) -> Self {
        Self {
            address: Address::from_str(ERC165_SESSION_KEY_VALIDATOR_ADDRESS).unwrap_or_default(),
            session_key,
            interface_id,
            selector,
            valid_after: 0,
            valid_until: 0,
            address_offset,
            mode: ValidatorMode::Plugin,
        }
    }

    pub fn with_address(mut self, address: Address) -> Self {
        self.address = address;
        self
    }

    /// Session is valid in `[valid_after, valid_until]` (`valid_until = 0` never expires)
    pub fn with_validity(mut self, valid_after: u64, valid_until: u64) -> Self {
        self.valid_after = valid_after;
        self.valid_until = valid_until;
        self
    }

    pub fn with_mode(mut self, mode: ValidatorMode) -> Self {
        self.mode = mode;
        self
    }

    fn check(&self, uo: &UserOperation) -> Result<(), ValidatorError> {
        let now = now();
        if now < self.valid_after || (self.valid_until != 0 && now > self.valid_until) {
            return Err(ValidatorError::SessionNotActive {
                now,
                valid_after: self.valid_after,
                valid_until: self.valid_until,
            });
        }

        // the selector is either the account call itself (executor) or the one of the single
        // call made through `execute`
        let selector = match decode_call_data(&uo.call_data) {
            Ok(KernelCall::Execute { call, .. }) => call.selector(),
            _ => uo.call_data.get(0..4).and_then(|s| s.try_into().ok()),
        };
        if selector != Some(self.selector) {
            return Err(ValidatorError::UnsupportedCall {
                inner: format!(
                    "selector {:?} is not the session selector 0x{}",
                    selector.map(ethers::utils::hex::encode),
                    ethers::utils::hex::encode(self.selector)
                ),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl KernelValidator for Erc165SessionKeyValidator {
    fn kind(&self) -> ValidatorKind {
        ValidatorKind::Erc165SessionKey
    }

    fn address(&self) -> Address {
        self.address
    }

    fn enable_data(&self) -> Bytes {
        [
            self.session_key.address().as_bytes(),
            &self.interface_id,
            &self.selector,
            &pack_uint48(self.valid_until),
            &pack_uint48(self.valid_after),
            &self.address_offset.to_be_bytes(),
        ]
        .concat()
        .into()
    }

    fn mode(&self) -> ValidatorMode {
        self.mode.clone()
    }

    async fn sign_user_op_hash(
        &self,
        hash: &UserOperationHash,
        uo: &UserOperation,
    ) -> Result<Bytes, ValidatorError> {
        self.check(uo)?;
        sign_with(&self.session_key, hash.as_bytes()).await
    }

    async fn sign_message(&self, message: &[u8]) -> Result<Bytes, ValidatorError> {
        sign_with(&self.session_key, message).await
    }

    async fn dummy_signature(&self, _uo: &UserOperation) -> Result<Bytes, ValidatorError> {
        Ok(dummy_ecdsa_signature())
    }
}

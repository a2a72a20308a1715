use super::{
    ecdsa::dummy_ecdsa_signature, sign_with, KernelValidator, ValidatorError, ValidatorKind,
    ValidatorMode,
};
use async_trait::async_trait;
use ethers::{
    types::{Address, Bytes},
    utils::keccak256,
};
use kernel_contracts::encode_toggle_kill_switch;
use kernel_primitives::{
    constants::validators::{KILL_SWITCH_ACTION, KILL_SWITCH_VALIDATOR_ADDRESS},
    pack_uint48, AccountSigner, UserOperation, UserOperationHash,
};
use std::{str::FromStr, sync::Arc};

/// What the guardian approves
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KillSwitchAction {
    /// Pause the account until the timestamp
    Pause { until: u64 },
    /// Resume the account
    Resume,
}

impl KillSwitchAction {
    pub fn paused_until(&self) -> u64 {
        match self {
            Self::Pause { until } => *until,
            Self::Resume => 0,
        }
    }
}

/// Guardian that can pause (and resume) the account
#[derive(Clone, Debug)]
pub struct KillSwitchValidator {
    address: Address,
    action_address: Address,
    guardian: Arc<dyn AccountSigner>,
    action: KillSwitchAction,
    mode: ValidatorMode,
}

impl KillSwitchValidator {
    pub fn new(guardian: Arc<dyn AccountSigner>, action: KillSwitchAction) -> Self {
        Self {
            address: Address::from_str(KILL_SWITCH_VALIDATOR_ADDRESS).unwrap_or_default(),
            action_address: Address::from_str(KILL_SWITCH_ACTION).unwrap_or_default(),
            guardian,
            action,
            mode: ValidatorMode::Plugin,
        }
    }

    pub fn with_address(mut self, address: Address) -> Self {
        self.address = address;
        self
    }

    pub fn with_mode(mut self, mode: ValidatorMode) -> Self {
        self.mode = mode;
        self
    }

    /// Executor of `toggleKillSwitch()` (registered for the selector in enable mode)
    pub fn action_address(&self) -> Address {
        self.action_address
    }

    /// Call data of the user operation toggling the kill switch
    pub fn toggle_call_data(&self) -> Bytes {
        encode_toggle_kill_switch()
    }
}

#[async_trait]
impl KernelValidator for KillSwitchValidator {
    fn kind(&self) -> ValidatorKind {
        ValidatorKind::KillSwitch
    }

    fn address(&self) -> Address {
        self.address
    }

    fn enable_data(&self) -> Bytes {
        self.guardian.address().as_bytes().to_vec().into()
    }

    fn mode(&self) -> ValidatorMode {
        self.mode.clone()
    }

    /// `pausedUntil ‖ guardianSig` where the guardian signs `keccak256(pausedUntil ‖ hash)`
    async fn sign_user_op_hash(
        &self,
        hash: &UserOperationHash,
        _uo: &UserOperation,
    ) -> Result<Bytes, ValidatorError> {
        let paused_until = pack_uint48(self.action.paused_until());
        let digest = keccak256([&paused_until[..], hash.as_bytes()].concat());
        let signature = sign_with(&self.guardian, &digest).await?;
        Ok([&paused_until[..], &signature].concat().into())
    }

    async fn sign_message(&self, message: &[u8]) -> Result<Bytes, ValidatorError> {
        sign_with(&self.guardian, message).await
    }

    async fn dummy_signature(&self, _uo: &UserOperation) -> Result<Bytes, ValidatorError> {
        let paused_until = pack_uint48(self.action.paused_until());
        Ok([&paused_until[..], &dummy_ecdsa_signature()].concat().into())
    }
}

//! Kernel validator plugins: how the account checks the signature of a user operation

mod ecdsa;
mod empty;
mod erc165_session_key;
mod kill_switch;
mod session_key;

pub use ecdsa::EcdsaValidator;
pub use empty::EmptyValidator;
pub use erc165_session_key::Erc165SessionKeyValidator;
pub use kill_switch::{KillSwitchAction, KillSwitchValidator};
pub use session_key::{MerkleTree, Permission, SessionKeyValidator};

use async_trait::async_trait;
use ethers::types::{Address, Bytes, U256};
use kernel_contracts::CallDataError;
use kernel_primitives::{
    constants::validators::mode, pack_len, pack_uint48, AccountSigner, UserOperation,
    UserOperationHash,
};
use serde::{Deserialize, Serialize};
use std::{
    fmt::Debug,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use strum_macros::{Display, EnumString};
use thiserror::Error;

/// Validator plugins known to the provider
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumString, Display, Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidatorKind {
    Ecdsa,
    SessionKey,
    KillSwitch,
    #[strum(serialize = "ERC165_SESSION_KEY")]
    #[serde(rename = "ERC165_SESSION_KEY")]
    Erc165SessionKey,
    Empty,
}

/// Owner approval needed to register a plugin validator on its first use
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PluginEnable {
    pub valid_until: u64,
    pub valid_after: u64,
    /// Executor registered for the selector (zero address for the account itself)
    pub executor: Address,
    /// Owner signature over the enable data
    pub enable_signature: Bytes,
}

/// How Kernel routes the signature to a validator (first 4 bytes of the signature)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ValidatorMode {
    /// Default validator of the account
    #[default]
    Sudo,
    /// Plugin validator already enabled for the selector
    Plugin,
    /// Plugin validator enabled by this user operation
    Enable(PluginEnable),
}

impl ValidatorMode {
    pub fn prefix(&self) -> [u8; 4] {
        match self {
            Self::Sudo => mode::SUDO,
            Self::Plugin => mode::PLUGIN,
            Self::Enable(_) => mode::ENABLE,
        }
    }

    /// Prepends the mode to the validator signature
    ///
    /// Enable mode layout: `mode ‖ validUntil ‖ validAfter ‖ validator ‖ executor ‖
    /// len(enableData) ‖ enableData ‖ len(enableSig) ‖ enableSig ‖ signature`.
    pub fn encode_signature(&self, validator: &dyn KernelValidator, signature: &[u8]) -> Bytes {
        match self {
            Self::Sudo | Self::Plugin => [&self.prefix()[..], signature].concat().into(),
            Self::Enable(enable) => {
                let enable_data = validator.enable_data();
                [
                    &self.prefix()[..],
                    &pack_uint48(enable.valid_until),
                    &pack_uint48(enable.valid_after),
                    validator.address().as_bytes(),
                    enable.executor.as_bytes(),
                    &pack_len(enable_data.len()),
                    &enable_data,
                    &pack_len(enable.enable_signature.len()),
                    &enable.enable_signature,
                    signature,
                ]
                .concat()
                .into()
            }
        }
    }
}

/// Signing policy failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidatorError {
    /// Validator that only describes the account (address and init code)
    #[error("{kind} validator cannot sign")]
    SigningUnsupported { kind: ValidatorKind },

    /// No session permission covers the call
    #[error("no session permission for call to {target:?} with selector 0x{selector}")]
    NoMatchingPermission { target: Address, selector: String },

    /// Session key used outside of its validity window
    #[error("session key not valid at {now} (valid after {valid_after}, valid until {valid_until})")]
    SessionNotActive { now: u64, valid_after: u64, valid_until: u64 },

    /// Paymaster not allowed by the session
    #[error("paymaster {paymaster:?} not allowed by the session key (allowed: {allowed:?})")]
    PaymasterNotAllowed { paymaster: Option<Address>, allowed: Address },

    /// Call data the validator cannot sign for
    #[error("unsupported call: {inner}")]
    UnsupportedCall { inner: String },

    /// Call data could not be decoded
    #[error(transparent)]
    CallData(#[from] CallDataError),

    /// Key failed to sign
    #[error("signer error: {inner}")]
    Signer { inner: String },
}

impl ValidatorError {
    pub(crate) fn signer(err: eyre::Report) -> Self {
        Self::Signer { inner: err.to_string() }
    }
}

/// Validator plugin of a Kernel account
#[async_trait]
pub trait KernelValidator: Debug + Send + Sync {
    /// Kind of the validator
    fn kind(&self) -> ValidatorKind;

    /// Address of the validator contract
    fn address(&self) -> Address;

    /// Data passed to the validator when it is enabled (or when the account is created)
    fn enable_data(&self) -> Bytes;

    /// Mode used to route signatures to the validator
    fn mode(&self) -> ValidatorMode {
        ValidatorMode::Sudo
    }

    /// Key space of the entry point nonce
    fn nonce_key(&self) -> U256 {
        U256::zero()
    }

    /// Signs the user operation hash (without the mode prefix)
    async fn sign_user_op_hash(
        &self,
        hash: &UserOperationHash,
        uo: &UserOperation,
    ) -> Result<Bytes, ValidatorError>;

    /// Signs an arbitrary message (ERC-1271)
    async fn sign_message(&self, message: &[u8]) -> Result<Bytes, ValidatorError>;

    /// Signature with the final length used while estimating gas (without the mode prefix)
    async fn dummy_signature(&self, uo: &UserOperation) -> Result<Bytes, ValidatorError>;
}

/// Personal-sign of the message with the key
pub(crate) async fn sign_with(
    signer: &Arc<dyn AccountSigner>,
    message: &[u8],
) -> Result<Bytes, ValidatorError> {
    signer
        .sign_message(message)
        .await
        .map(|sig| sig.to_vec().into())
        .map_err(ValidatorError::signer)
}

/// Current unix timestamp
pub(crate) fn now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or_default()
}

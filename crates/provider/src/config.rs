//! Provider configuration

use crate::{
    paymaster::PaymasterPolicy,
    validator::{
        EcdsaValidator, EmptyValidator, Erc165SessionKeyValidator, KernelValidator,
        KillSwitchValidator, SessionKeyValidator,
    },
};
use ethers::types::{Address, Bytes, U256};
use kernel_primitives::constants::{
    endpoints, entry_point, kernel,
    provider::{
        DEFAULT_RECEIPT_POLL_INTERVAL_MS, DEFAULT_RECEIPT_TIMEOUT_MS,
        DEFAULT_SEND_TX_MAX_RETRIES, DEFAULT_SEND_TX_RETRY_INTERVAL_MS,
    },
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{str::FromStr, sync::Arc, time::Duration};

/// Durations are configured in milliseconds
mod duration_ms {
    use super::*;

    pub fn serialize<S: Serializer>(val: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(val.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

/// How the counterfactual address of the account is computed
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "strategy")]
pub enum AddressDerivation {
    /// Locally, like the factory does with CREATE2
    Create2 { kernel_template: Address, proxy_creation_code: Bytes },
    /// Ask the factory (`getAccountAddress`)
    #[default]
    FactoryQuery,
    /// Ask the entry point (`getSenderAddress` with the init code)
    EntryPointQuery,
}

/// Submission retries (transport failures only)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Fixed delay between attempts
    #[serde(with = "duration_ms")]
    pub interval: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_SEND_TX_MAX_RETRIES,
            interval: Duration::from_millis(DEFAULT_SEND_TX_RETRY_INTERVAL_MS),
        }
    }
}

/// Polling for the receipt of a submitted user operation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    #[serde(with = "duration_ms")]
    pub poll_interval: Duration,
    #[serde(with = "duration_ms")]
    pub timeout: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_RECEIPT_POLL_INTERVAL_MS),
            timeout: Duration::from_millis(DEFAULT_RECEIPT_TIMEOUT_MS),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymasterConfig {
    pub policy: PaymasterPolicy,
    /// Gas token symbol (token paymaster only)
    pub gas_token: Option<String>,
    /// Project the hosted paymaster bills
    pub project_id: Option<String>,
    pub url: String,
}

impl Default for PaymasterConfig {
    fn default() -> Self {
        Self {
            policy: PaymasterPolicy::VerifyingPaymaster,
            gas_token: None,
            project_id: None,
            url: endpoints::PAYMASTER_URL.into(),
        }
    }
}

/// Kernel provider configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub chain_id: u64,
    pub entry_point: Address,
    pub factory: Address,
    /// Salt of the account (several accounts per owner)
    pub index: U256,
    pub address_derivation: AddressDerivation,
    /// Sponsor gas through the paymaster (on unless turned off)
    pub use_paymaster: bool,
    pub paymaster: PaymasterConfig,
    pub retry: RetryConfig,
    pub wait: WaitConfig,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            chain_id: 80001,
            entry_point: Address::from_str(entry_point::ADDRESS).unwrap_or_default(),
            factory: Address::from_str(kernel::FACTORY_ADDRESS).unwrap_or_default(),
            index: U256::zero(),
            address_derivation: AddressDerivation::default(),
            use_paymaster: true,
            paymaster: PaymasterConfig::default(),
            retry: RetryConfig::default(),
            wait: WaitConfig::default(),
        }
    }
}

/// Validator of the account
///
/// Plugins sign user operations while the owner's ECDSA validator stays the default (sudo)
/// validator that determines the account address.
#[derive(Clone, Debug)]
pub enum ValidatorConfig {
    Ecdsa(EcdsaValidator),
    SessionKey { owner: Address, validator: SessionKeyValidator },
    KillSwitch { owner: Address, validator: KillSwitchValidator },
    Erc165SessionKey { owner: Address, validator: Erc165SessionKeyValidator },
    Empty(EmptyValidator),
}

impl ValidatorConfig {
    /// Splits into (sudo validator, validator signing user operations)
    pub fn into_validators(self) -> (Arc<dyn KernelValidator>, Arc<dyn KernelValidator>) {
        match self {
            Self::Ecdsa(validator) => {
                let validator: Arc<dyn KernelValidator> = Arc::new(validator);
                (validator.clone(), validator)
            }
            Self::Empty(validator) => {
                let validator: Arc<dyn KernelValidator> = Arc::new(validator);
                (validator.clone(), validator)
            }
            Self::SessionKey { owner, validator } => {
                (Arc::new(EmptyValidator::ecdsa(owner)), Arc::new(validator))
            }
            Self::KillSwitch { owner, validator } => {
                (Arc::new(EmptyValidator::ecdsa(owner)), Arc::new(validator))
            }
            Self::Erc165SessionKey { owner, validator } => {
                (Arc::new(EmptyValidator::ecdsa(owner)), Arc::new(validator))
            }
        }
    }
}

//! Kernel smart account (ERC-4337) provider
//!
//! Derives the counterfactual address of a Kernel v2 account, turns calls into user operations,
//! gets them estimated by the bundler and sponsored by the paymaster, signs them with the
//! configured validator plugin and submits them.

pub mod account;
pub mod bundler;
pub mod chain;
pub mod config;
pub mod eip6492;
mod error;
pub mod paymaster;
mod provider;
pub mod validator;

pub use account::KernelAccount;
pub use bundler::{BundlerApiClient, BundlerApiServer, BundlerClient, RpcBundlerClient};
pub use chain::{ChainReader, EthersChainReader, Fees};
pub use config::{
    AddressDerivation, PaymasterConfig, ProviderConfig, RetryConfig, ValidatorConfig, WaitConfig,
};
pub use error::ProviderError;
pub use paymaster::{
    PaymasterApiClient, PaymasterApiServer, PaymasterClient, PaymasterMiddleware,
    PaymasterPolicy, RpcPaymasterClient, SponsorUserOperationRequest,
    SponsorUserOperationResponse,
};
pub use provider::{Collaborators, KernelProvider, RpcRequest, SendUserOperationResult};
pub use validator::{
    EcdsaValidator, EmptyValidator, Erc165SessionKeyValidator, KernelValidator, KillSwitchAction,
    KillSwitchValidator, Permission, PluginEnable, SessionKeyValidator, ValidatorError, ValidatorKind,
    ValidatorMode,
};

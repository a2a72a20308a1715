use crate::utils::{
    parse_address, parse_duration, parse_paymaster_policy, parse_u256, validate_private_key,
};
use clap::Parser;
use ethers::types::{Address, U256};
use expanded_pathbuf::ExpandedPathBuf;
use kernel_primitives::constants::{
    endpoints::{BUNDLER_URL, PAYMASTER_URL},
    entry_point, kernel,
    provider::DEFAULT_SEND_TX_MAX_RETRIES,
};
use kernel_provider::PaymasterPolicy;
use std::time::Duration;

/// Owner key of the account
#[derive(Debug, Clone, Parser)]
pub struct OwnerArgs {
    /// Path to the mnemonic file of the owner.
    #[clap(long)]
    pub mnemonic_file: Option<ExpandedPathBuf>,

    /// Hex-encoded private key of the owner (takes precedence over the mnemonic file).
    #[clap(long, env = "KERNEL_PRIVATE_KEY", value_parser=validate_private_key)]
    pub private_key: Option<String>,
}

/// Kernel account and services
#[derive(Debug, Clone, Parser)]
pub struct AccountArgs {
    #[clap(flatten)]
    pub owner: OwnerArgs,

    /// Ethereum execution client RPC endpoint.
    #[clap(long, default_value = "http://127.0.0.1:8545")]
    pub eth_client_address: String,

    /// Bundler RPC endpoint.
    #[clap(long, default_value = BUNDLER_URL)]
    pub bundler_url: String,

    /// Entry point address.
    #[clap(long, default_value = entry_point::ADDRESS, value_parser=parse_address)]
    pub entry_point: Address,

    /// Kernel factory address.
    #[clap(long, default_value = kernel::FACTORY_ADDRESS, value_parser=parse_address)]
    pub factory: Address,

    /// Index of the account (several accounts per owner).
    #[clap(long, default_value = "0", value_parser=parse_u256)]
    pub index: U256,
}

/// Paymaster and submission settings
#[derive(Debug, Clone, Parser, PartialEq)]
pub struct SendArgs {
    /// Pay for the gas from the account instead of through the paymaster.
    #[clap(long)]
    pub no_paymaster: bool,

    /// Paymaster RPC endpoint.
    #[clap(long, default_value = PAYMASTER_URL)]
    pub paymaster_url: String,

    /// Paymaster policy (`VERIFYING_PAYMASTER` or `TOKEN_PAYMASTER`).
    #[clap(long, default_value = "VERIFYING_PAYMASTER", value_parser=parse_paymaster_policy)]
    pub paymaster_policy: PaymasterPolicy,

    /// Symbol of the ERC-20 token paying for gas (token paymaster).
    #[clap(long)]
    pub gas_token: Option<String>,

    /// Project billed by the paymaster.
    #[clap(long)]
    pub project_id: Option<String>,

    /// Retries of the submission after a transport failure.
    #[clap(long, default_value_t = DEFAULT_SEND_TX_MAX_RETRIES)]
    pub max_retries: u32,

    /// Delay between two submissions (in milliseconds).
    #[clap(long, default_value = "180000", value_parser=parse_duration)]
    pub retry_interval: Duration,
}

/// Receipt polling
#[derive(Debug, Clone, Parser, PartialEq)]
pub struct WaitArgs {
    /// Interval between two receipt polls (in milliseconds).
    #[clap(long, default_value = "2000", value_parser=parse_duration)]
    pub poll_interval: Duration,

    /// How long to wait for the user operation to be included (in milliseconds).
    #[clap(long, default_value = "120000", value_parser=parse_duration)]
    pub receipt_timeout: Duration,
}

/// Create wallet CLI args
#[derive(Debug, Clone, Parser)]
pub struct CreateWalletArgs {
    /// Directory the mnemonic file is written to (defaults to `~/.kernel`).
    #[clap(long)]
    pub output_path: Option<ExpandedPathBuf>,

    /// Chain the wallet signs for.
    #[clap(long, default_value_t = 80001)]
    pub chain_id: u64,
}

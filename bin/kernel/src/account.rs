use crate::{
    cli::args::{AccountArgs, CreateWalletArgs, OwnerArgs, SendArgs, WaitArgs},
    utils::unwrap_path_or_home,
};
use alloy_chains::Chain;
use ethers::providers::Middleware;
use kernel_primitives::{provider::create_http_provider, GasTokenRegistry, Wallet};
use kernel_provider::{
    Collaborators, EcdsaValidator, EthersChainReader, KernelProvider, PaymasterClient,
    PaymasterConfig, ProviderConfig, RetryConfig, RpcBundlerClient, RpcPaymasterClient,
    ValidatorConfig, WaitConfig,
};
use std::sync::Arc;
use tracing::info;

pub fn create_wallet(args: CreateWalletArgs) -> eyre::Result<()> {
    let path = unwrap_path_or_home(args.output_path)?;
    let wallet = Wallet::build_random(path.clone(), args.chain_id)?;
    info!("Wallet {:?} created in {:?}", wallet.address(), path);
    Ok(())
}

fn load_owner(args: OwnerArgs, chain_id: u64) -> eyre::Result<Wallet> {
    match (args.private_key, args.mnemonic_file) {
        (Some(key), _) => Wallet::from_private_key(&key, chain_id),
        (None, Some(path)) => Wallet::from_file(path, chain_id),
        (None, None) => Err(eyre::eyre!("Either --private-key or --mnemonic-file is required")),
    }
}

/// Connects to the chain, the bundler and (optionally) the paymaster and sets up the provider
/// of the owner's account
pub async fn build_provider(
    account: AccountArgs,
    send: Option<SendArgs>,
    wait: Option<WaitArgs>,
) -> eyre::Result<KernelProvider> {
    let eth_client = Arc::new(create_http_provider(&account.eth_client_address).await?);
    let chain_id = eth_client.get_chainid().await?.as_u64();
    let owner = load_owner(account.owner, chain_id)?;
    info!("Owner {:?} on chain {chain_id}", owner.address());

    let mut config = ProviderConfig {
        chain_id,
        entry_point: account.entry_point,
        factory: account.factory,
        index: account.index,
        // the paymaster only takes part in submissions
        use_paymaster: false,
        ..Default::default()
    };

    let mut paymaster: Option<Arc<dyn PaymasterClient>> = None;
    if let Some(send) = send {
        config.use_paymaster = !send.no_paymaster;
        config.paymaster = PaymasterConfig {
            policy: send.paymaster_policy,
            gas_token: send.gas_token,
            project_id: send.project_id,
            url: send.paymaster_url,
        };
        config.retry = RetryConfig { max_retries: send.max_retries, interval: send.retry_interval };
        if config.use_paymaster {
            paymaster = Some(Arc::new(RpcPaymasterClient::new(&config.paymaster.url)?));
        }
    }
    if let Some(wait) = wait {
        config.wait = WaitConfig { poll_interval: wait.poll_interval, timeout: wait.receipt_timeout };
    }

    let collaborators = Collaborators {
        chain: Arc::new(EthersChainReader::new(eth_client, Chain::from_id(chain_id))),
        bundler: Arc::new(RpcBundlerClient::new(&account.bundler_url)?),
        paymaster,
        gas_tokens: GasTokenRegistry::with_defaults()?,
    };
    let validator = ValidatorConfig::Ecdsa(EcdsaValidator::new(Arc::new(owner.signer)));

    Ok(KernelProvider::init(config, validator, collaborators)?)
}

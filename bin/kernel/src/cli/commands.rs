use super::args::{AccountArgs, CreateWalletArgs, SendArgs, WaitArgs};
use crate::{
    account::{build_provider, create_wallet},
    utils::{parse_address, parse_bytes, parse_u256, parse_user_operation_hash},
};
use clap::Parser;
use ethers::types::{Address, Bytes, U256};
use kernel_primitives::{parse_message, Call, UserOperationHash};
use tracing::info;

/// Print the counterfactual address of the account
#[derive(Debug, Parser)]
pub struct AddressCommand {
    #[clap(flatten)]
    account: AccountArgs,
}

impl AddressCommand {
    /// Execute the command
    pub async fn execute(self) -> eyre::Result<()> {
        let provider = build_provider(self.account, None, None).await?;
        println!("{:?}", provider.get_address().await?);
        Ok(())
    }
}

/// Print the entry point nonce of the account
#[derive(Debug, Parser)]
pub struct NonceCommand {
    #[clap(flatten)]
    account: AccountArgs,
}

impl NonceCommand {
    /// Execute the command
    pub async fn execute(self) -> eyre::Result<()> {
        let provider = build_provider(self.account, None, None).await?;
        println!("{}", provider.get_nonce().await?);
        Ok(())
    }
}

/// Print whether the account is deployed
#[derive(Debug, Parser)]
pub struct DeployedCommand {
    #[clap(flatten)]
    account: AccountArgs,
}

impl DeployedCommand {
    /// Execute the command
    pub async fn execute(self) -> eyre::Result<()> {
        let provider = build_provider(self.account, None, None).await?;
        println!("{}", provider.is_account_deployed().await?);
        Ok(())
    }
}

/// Sign a message with the account (EIP-6492 wrapped while the account is not deployed)
#[derive(Debug, Parser)]
pub struct SignMessageCommand {
    #[clap(flatten)]
    account: AccountArgs,

    /// Message (`0x` prefixed hex is signed as bytes, anything else as UTF-8 text).
    #[clap(long)]
    message: String,
}

impl SignMessageCommand {
    /// Execute the command
    pub async fn execute(self) -> eyre::Result<()> {
        let provider = build_provider(self.account, None, None).await?;
        let signature = provider.sign_message(&parse_message(&self.message)).await?;
        println!("{signature}");
        Ok(())
    }
}

/// Send a call from the account as a user operation
#[derive(Debug, Parser)]
pub struct SendCommand {
    #[clap(flatten)]
    account: AccountArgs,

    #[clap(flatten)]
    send: SendArgs,

    #[clap(flatten)]
    wait: WaitArgs,

    /// Target of the call.
    #[clap(long, value_parser=parse_address)]
    target: Address,

    /// Value (in wei) sent with the call.
    #[clap(long, default_value = "0", value_parser=parse_u256)]
    value: U256,

    /// Call data.
    #[clap(long, default_value = "0x", value_parser=parse_bytes)]
    data: Bytes,

    /// Execute the call as a delegate call.
    #[clap(long)]
    delegate: bool,

    /// Wait for the user operation to be included.
    #[clap(long)]
    wait_for_inclusion: bool,
}

impl SendCommand {
    /// Execute the command
    pub async fn execute(self) -> eyre::Result<()> {
        let provider = build_provider(self.account, Some(self.send), Some(self.wait)).await?;

        let result = if self.delegate {
            let call_data = provider.encode_execute_delegate(self.target, self.value, self.data);
            provider.send_call_data(call_data).await?
        } else {
            let call = Call::new(self.target, self.value, self.data);
            provider.send_user_operation(call.into()).await?
        };
        info!("User operation {} sent", result.hash);
        println!("{}", result.hash);

        if self.wait_for_inclusion {
            let tx = provider.wait_for_user_operation_transaction(result.hash).await?;
            println!("{tx:?}");
        }
        Ok(())
    }
}

/// Wait for a user operation to be included and print the bundle transaction hash
#[derive(Debug, Parser)]
pub struct WaitCommand {
    #[clap(flatten)]
    account: AccountArgs,

    #[clap(flatten)]
    wait: WaitArgs,

    /// Hash of the user operation.
    #[clap(long, value_parser=parse_user_operation_hash)]
    hash: UserOperationHash,
}

impl WaitCommand {
    /// Execute the command
    pub async fn execute(self) -> eyre::Result<()> {
        let provider = build_provider(self.account, None, Some(self.wait)).await?;
        let tx = provider.wait_for_user_operation_transaction(self.hash).await?;
        println!("{tx:?}");
        Ok(())
    }
}

/// Create a wallet (mnemonic file) for the account owner
#[derive(Debug, Parser)]
pub struct CreateWalletCommand {
    #[clap(flatten)]
    create_wallet: CreateWalletArgs,
}

impl CreateWalletCommand {
    /// Execute the command
    pub fn execute(self) -> eyre::Result<()> {
        create_wallet(self.create_wallet)
    }
}

use clap::{value_parser, Parser, Subcommand};

pub mod args;
pub mod commands;

/// The main Kernel CLI interface
#[derive(Debug, Parser)]
#[command(author, version, about = "Kernel", long_about = None)]
pub struct Cli {
    /// The command to execute
    #[clap(subcommand)]
    command: Commands,

    /// The verbosity level
    #[clap(long, short, global = true, default_value_t = 2, value_parser = value_parser!(u8).range(..=4))]
    verbosity: u8,
}

impl Cli {
    /// Get the log level based on the verbosity level
    pub fn get_log_level(&self) -> String {
        match self.verbosity {
            0 => "error",
            1 => "warn",
            2 => "info",
            3 => "debug",
            _ => "trace",
        }
        .into()
    }
}

/// Commands to be executed
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the counterfactual address of the account
    #[command(name = "address")]
    Address(commands::AddressCommand),

    /// Print the nonce of the account
    #[command(name = "nonce")]
    Nonce(commands::NonceCommand),

    /// Print whether the account is deployed
    #[command(name = "deployed")]
    Deployed(commands::DeployedCommand),

    /// Sign a message with the account
    #[command(name = "sign-message")]
    SignMessage(commands::SignMessageCommand),

    /// Send a call as a user operation
    #[command(name = "send")]
    Send(Box<commands::SendCommand>),

    /// Wait for a user operation to be included
    #[command(name = "wait")]
    Wait(commands::WaitCommand),

    /// Create wallet for the account owner
    #[command(name = "create-wallet")]
    CreateWallet(commands::CreateWalletCommand),
}

pub fn run() -> eyre::Result<()> {
    let cli = Cli::parse();

    let filter = match std::env::var("RUST_LOG") {
        Ok(val) => {
            format!("{val},kernel={level},kernel_provider={level}", level = cli.get_log_level())
        }
        Err(_) => format!("kernel={level},kernel_provider={level}", level = cli.get_log_level()),
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let rt = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    rt.block_on(async move {
        match cli.command {
            Commands::Address(command) => command.execute().await,
            Commands::Nonce(command) => command.execute().await,
            Commands::Deployed(command) => command.execute().await,
            Commands::SignMessage(command) => command.execute().await,
            Commands::Send(command) => command.execute().await,
            Commands::Wait(command) => command.execute().await,
            Commands::CreateWallet(command) => command.execute(),
        }
    })
}

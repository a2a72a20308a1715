//! Kernel account abstraction (ERC-4337)-related constants

/// Entry point smart contract
pub mod entry_point {
    /// Address of the entry point smart contract
    pub const ADDRESS: &str = "0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789";
    /// Version of the entry point smart contract
    pub const VERSION: &str = "0.6.0";
}

/// Kernel smart account contracts
pub mod kernel {
    /// Kernel v2 account factory
    pub const FACTORY_ADDRESS: &str = "0x5D006d3880645ec6e254E18C1F879DAC9Dd71A39";
}

/// Validator plugins deployed for Kernel v2
pub mod validators {
    pub const ECDSA_VALIDATOR_ADDRESS: &str = "0x180D6465F921C7E0DEA0040107D342c87455fFF5";
    pub const KILL_SWITCH_VALIDATOR_ADDRESS: &str = "0xe88F96e72fB5e0Ebb5E03B13AF47De1510E10C1a";
    pub const KILL_SWITCH_ACTION: &str = "0x6A3D43E0DBaFD83973333f7ab2588cdbE26273E0";
    pub const ERC165_SESSION_KEY_VALIDATOR_ADDRESS: &str =
        "0xAe4b50D43491Db39cE4f352D7D8d0aF1a3820AE1";
    pub const SESSION_KEY_VALIDATOR_ADDRESS: &str = "0x8e632447954036ee940eB0a6bC5a20A18543C4Fd";

    /// Signature with a valid shape used while estimating gas (recovers to some address but
    /// never to the owner)
    pub const DUMMY_ECDSA_SIGNATURE: &str = "0xfffffffffffffffffffffffffffffff0000000000000000000000000000000007aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa1c";

    /// Kernel v2 signature modes (first 4 bytes of the user operation signature)
    pub mod mode {
        pub const SUDO: [u8; 4] = [0x00, 0x00, 0x00, 0x00];
        pub const PLUGIN: [u8; 4] = [0x00, 0x00, 0x00, 0x01];
        pub const ENABLE: [u8; 4] = [0x00, 0x00, 0x00, 0x02];
    }
}

/// EIP-6492 (signature validation for predeploy contracts)
pub mod eip6492 {
    /// Suffix appended to wrapped signatures
    pub const MAGIC_BYTES: [u8; 32] = [
        0x64, 0x92, 0x64, 0x92, 0x64, 0x92, 0x64, 0x92, 0x64, 0x92, 0x64, 0x92, 0x64, 0x92, 0x64,
        0x92, 0x64, 0x92, 0x64, 0x92, 0x64, 0x92, 0x64, 0x92, 0x64, 0x92, 0x64, 0x92, 0x64, 0x92,
        0x64, 0x92,
    ];
}

/// Submission and inclusion defaults
pub mod provider {
    /// Retries of `eth_sendUserOperation` after a transport failure
    pub const DEFAULT_SEND_TX_MAX_RETRIES: u32 = 3;
    /// Delay between two submission attempts (in milliseconds)
    pub const DEFAULT_SEND_TX_RETRY_INTERVAL_MS: u64 = 180_000;
    /// Interval between two receipt polls (in milliseconds)
    pub const DEFAULT_RECEIPT_POLL_INTERVAL_MS: u64 = 2_000;
    /// Deadline for a user operation to be included (in milliseconds)
    pub const DEFAULT_RECEIPT_TIMEOUT_MS: u64 = 120_000;
}

/// Hosted services
pub mod endpoints {
    pub const BUNDLER_URL: &str = "https://v0-6-meta-bundler.onrender.com";
    pub const PAYMASTER_URL: &str = "https://v0-6-paymaster.onrender.com";
}

/// Paymaster token policy
pub mod gas_tokens {
    /// Stackup test token on Polygon Mumbai
    pub const TEST_ERC20: &str = "0x3870419Ba2BBf0127060bCB37f69A1b1C090992B";
}

/// Supported chains
pub mod supported_chains {
    use alloy_chains::NamedChain;

    pub const CHAINS: [NamedChain; 12] = [
        NamedChain::Dev,
        NamedChain::Mainnet,
        NamedChain::Goerli,
        NamedChain::Sepolia,
        NamedChain::Polygon,
        NamedChain::PolygonMumbai,
        NamedChain::Arbitrum,
        NamedChain::ArbitrumGoerli,
        NamedChain::Optimism,
        NamedChain::OptimismGoerli,
        NamedChain::Avalanche,
        NamedChain::AvalancheFuji,
    ];
}

/// JSON-RPC error codes returned by bundlers
pub mod rpc_error_codes {
    pub const VALIDATION: i32 = -32500;
    pub const PAYMASTER: i32 = -32501;
    pub const OPCODE: i32 = -32502;
    pub const EXPIRATION: i32 = -32503;
    pub const ENTITY_BANNED_OR_THROTTLED: i32 = -32504;
    pub const STAKE_TOO_LOW: i32 = -32505;
    pub const SIGNATURE_AGGREGATOR: i32 = -32506;
    pub const SIGNATURE: i32 = -32507;
    pub const EXECUTION: i32 = -32521;
}

/// Fee estimation
pub mod fees {
    use alloy_chains::NamedChain;

    /// Chains on which bundlers reject priority fees below a floor (chain, wei)
    pub const MIN_PRIORITY_FEE_PER_BID: [(NamedChain, u64); 1] =
        [(NamedChain::Polygon, 30_000_000_000)];
}

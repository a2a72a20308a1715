//! ERC-20 tokens accepted by the token paymaster

use ethers::{
    types::{Address, U256},
    utils::parse_units,
};
use std::{collections::HashMap, str::FromStr};

/// Token the paymaster accepts as gas payment on one chain
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GasToken {
    pub symbol: String,
    pub chain_id: u64,
    pub address: Address,
    /// Allowance granted to the paymaster before paying gas with the token
    pub approval_amount: U256,
}

/// Registry of gas tokens keyed by (symbol, chain id)
#[derive(Clone, Debug, Default)]
pub struct GasTokenRegistry {
    tokens: HashMap<(String, u64), GasToken>,
}

impl GasTokenRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the tokens supported by the hosted paymaster
    pub fn with_defaults() -> eyre::Result<Self> {
        let mut registry = Self::new();
        for (symbol, chain_id, address, amount, decimals) in [
            ("USDC", 1, "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48", "100", 6),
            ("USDC", 137, "0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174", "10", 6),
            ("USDC", 42161, "0xFF970A61A04b1cA14834A43f5dE4533eBDDB5CC8", "10", 6),
            ("USDC", 43114, "0xB97EF9Ef8734C71904D8002F8b6Bc66Dd9c48a6E", "10", 6),
            ("PEPE", 1, "0x6982508145454Ce325dDbE47a25d4ec3d2311933", "50000000", 18),
            ("TEST_ERC20", 80001, crate::constants::gas_tokens::TEST_ERC20, "100", 18),
        ] {
            registry.insert(GasToken {
                symbol: symbol.into(),
                chain_id,
                address: Address::from_str(address)?,
                approval_amount: parse_units(amount, decimals)?.into(),
            });
        }
        Ok(registry)
    }

    /// Adds (or replaces) a token
    pub fn insert(&mut self, token: GasToken) {
        self.tokens.insert((token.symbol.clone(), token.chain_id), token);
    }

    /// Token with the symbol on the chain
    pub fn get(&self, symbol: &str, chain_id: u64) -> Option<&GasToken> {
        self.tokens.get(&(symbol.to_string(), chain_id))
    }

    pub fn is_supported(&self, symbol: &str, chain_id: u64) -> bool {
        self.get(symbol, chain_id).is_some()
    }

    /// Symbols supported on the chain (sorted)
    pub fn symbols(&self, chain_id: u64) -> Vec<&str> {
        let mut symbols: Vec<&str> = self
            .tokens
            .values()
            .filter(|token| token.chain_id == chain_id)
            .map(|token| token.symbol.as_str())
            .collect();
        symbols.sort_unstable();
        symbols
    }
}

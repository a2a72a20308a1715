//! Chain extensions
use crate::constants::{fees::MIN_PRIORITY_FEE_PER_BID, supported_chains::CHAINS};
use alloy_chains::{Chain, NamedChain};
use ethers::types::U256;

/// Resolves a chain id to a known (named) chain
pub fn resolve_chain(chain_id: u64) -> Option<NamedChain> {
    Chain::from_id(chain_id).named()
}

pub trait ChainExt {
    /// Whether the Kernel contracts are deployed on the chain
    fn is_supported(&self) -> bool;

    /// Minimum priority fee accepted by bundlers on the chain
    fn min_priority_fee_per_bid(&self) -> U256;
}

impl ChainExt for Chain {
    fn is_supported(&self) -> bool {
        self.named().map(|chain| CHAINS.contains(&chain)).unwrap_or(false)
    }

    fn min_priority_fee_per_bid(&self) -> U256 {
        self.named()
            .and_then(|chain| {
                MIN_PRIORITY_FEE_PER_BID.iter().find(|(c, _)| *c == chain).map(|(_, fee)| *fee)
            })
            .unwrap_or_default()
            .into()
    }
}

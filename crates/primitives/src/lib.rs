//! Kernel account abstraction (ERC-4337) primitive types
//!
//! This crate contains the user operation type, the signer abstraction and the constants shared
//! by the Kernel contracts bindings and the Kernel provider.

pub mod call;
pub mod chain;
pub mod constants;
pub mod gas_token;
pub mod provider;
pub mod signer;
mod user_operation;
mod utils;
mod wallet;

pub use call::{Call, UserOperationCalls};
pub use gas_token::{GasToken, GasTokenRegistry};
pub use signer::AccountSigner;
pub use user_operation::{
    UserOperation, UserOperationGasEstimation, UserOperationHash, UserOperationReceipt,
    UserOperationRequest,
};
pub use utils::{
    as_checksum_addr, as_checksum_addr_opt, get_address, pack_len, pack_uint48, parse_message,
    unpack_uint48,
};
pub use wallet::Wallet;

//! Kernel smart account (ERC-4337) smart contract interfaces

pub mod entry_point;
mod error;
mod gen;
pub mod kernel;

pub use entry_point::EntryPoint;
pub use error::{decode_revert_string, CallDataError, EntryPointError};
pub use gen::{EntryPointAPIErrors, FailedOp, SELECTORS_NAMES};
pub use kernel::{
    compute_account_address, decode_call_data, encode_approve, encode_create_account,
    encode_execute, encode_execute_batch, encode_execute_delegate, encode_initialize,
    encode_toggle_kill_switch, KernelCall, KernelFactory, Operation,
};

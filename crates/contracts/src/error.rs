use crate::gen::{EntryPointAPIErrors, FailedOp};
use ethers::{
    abi::AbiDecode,
    prelude::ContractError,
    providers::{JsonRpcError, Middleware, MiddlewareError, ProviderError},
    types::Bytes,
};
use regex::Regex;
use std::str::FromStr;
use thiserror::Error;

/// Errors returned by calls to the entry point and the Kernel contracts
#[derive(Debug, Error, Clone)]
pub enum EntryPointError {
    /// Failed user operation error
    #[error("{0}")]
    FailedOp(FailedOp),

    /// execution reverted
    #[error("execution reverted: {0}")]
    ExecutionReverted(String),

    /// There is no revert when there should be
    #[error("{function} should revert")]
    NoRevert {
        /// function
        function: String,
    },

    /// Provider error
    #[error("provider error: {inner}")]
    Provider {
        /// The inner error message
        inner: String,
    },

    /// ABI error
    #[error("abi error: {inner}")]
    ABI {
        /// The inner error message
        inner: String,
    },

    /// Data decoding error
    #[error("decode error: {inner}")]
    Decode {
        /// The inner error message
        inner: String,
    },

    /// Any other error
    #[error("other error: {inner}")]
    Other {
        /// The inner error message
        inner: String,
    },
}

impl EntryPointError {
    pub fn from_provider_error(err: &ProviderError) -> Result<EntryPointAPIErrors, Self> {
        match err {
            ProviderError::JsonRpcClientError(err) => err
                .as_error_response()
                .map(Self::from_json_rpc_error)
                .unwrap_or(Err(EntryPointError::Provider {
                    inner: format!("unknown json-rpc client error: {err:?}"),
                })),
            ProviderError::HTTPError(err) => {
                Err(EntryPointError::Provider { inner: format!("HTTP error: {err:?}") })
            }
            _ => {
                Err(EntryPointError::Provider { inner: format!("unknown provider error: {err:?}") })
            }
        }
    }

    pub fn from_json_rpc_error(err: &JsonRpcError) -> Result<EntryPointAPIErrors, Self> {
        match err.data {
            Some(serde_json::Value::String(ref data)) => {
                let re = Regex::new(r"0x[0-9a-fA-F]+").map_err(|err| Self::Other {
                    inner: format!("invalid revert data pattern: {err:?}"),
                })?;

                let hex = re.find(data).ok_or_else(|| Self::Decode {
                    inner: format!("hex string not found in {data:?}"),
                })?;

                let bytes = Bytes::from_str(hex.as_str()).map_err(|err| Self::Decode {
                    inner: format!("string {data:?} could not be converted to bytes: {err:?}"),
                })?;

                decode_revert_error(bytes).map_err(|err| Self::Provider {
                    inner: format!("failed to decode revert error: {err:?}"),
                })
            }
            Some(ref other) => Err(Self::Decode {
                inner: format!("json-rpc return data is not a string: {other:?}"),
            }),
            None if err.message.starts_with("execution reverted") => {
                Err(Self::ExecutionReverted(err.message.clone()))
            }
            None => Err(Self::Provider {
                inner: format!("json-rpc error doesn't contain data field: {err:?}"),
            }),
        }
    }

    pub fn from_middleware_error<M: Middleware>(
        err: M::Error,
    ) -> Result<EntryPointAPIErrors, Self> {
        if let Some(err) = err.as_error_response() {
            return Self::from_json_rpc_error(err);
        }

        if let Some(err) = err.as_provider_error() {
            return Self::from_provider_error(err);
        }

        Err(Self::Provider { inner: format!("middleware error: {err:?}") })
    }
}

/// Errors when decoding the call data of a Kernel account
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CallDataError {
    /// Call data is not a known Kernel function
    #[error("decode error: {inner}")]
    Decode { inner: String },

    /// Kernel function other than `execute`/`executeBatch`
    #[error("unsupported kernel function: {function}")]
    Unsupported { function: String },

    /// `execute` with an operation other than call or delegate call
    #[error("unknown operation: {0}")]
    UnknownOperation(u8),
}

/// Decodes the error of a contract call into entry point errors (a revert is the expected
/// outcome of some calls, e.g. `getSenderAddress`)
pub fn deserialize_error_msg<M: Middleware>(
    err: ContractError<M>,
) -> Result<EntryPointAPIErrors, EntryPointError> {
    match err {
        ContractError::DecodingError(e) => Err(EntryPointError::Decode { inner: e.to_string() }),
        ContractError::AbiError(e) => Err(EntryPointError::ABI { inner: e.to_string() }),
        ContractError::MiddlewareError { e } => EntryPointError::from_middleware_error::<M>(e),
        ContractError::ProviderError { e } => EntryPointError::from_provider_error(&e),
        ContractError::Revert(data) => decode_revert_error(data),
        _ => Err(EntryPointError::Other { inner: err.to_string() }),
    }
}

// ethers-rs could not handle `require (true, "reason")` or `revert("test failed")` well in this
// case revert with `require` error would ends up with error event signature `0x08c379a0`
// we need to handle it manually
pub fn decode_revert_string(data: Bytes) -> Option<String> {
    if data.len() < 4 {
        return None;
    }
    let (error_sig, reason) = data.split_at(4);
    if error_sig == [0x08, 0xc3, 0x79, 0xa0] {
        <String as AbiDecode>::decode(reason).ok()
    } else {
        None
    }
}

pub fn decode_revert_error(data: Bytes) -> Result<EntryPointAPIErrors, EntryPointError> {
    let decoded = EntryPointAPIErrors::decode(data.as_ref());
    match decoded {
        Ok(res) => Ok(res),
        Err(e) => {
            if let Some(error_str) = decode_revert_string(data) {
                return Ok(EntryPointAPIErrors::RevertString(error_str));
            };

            Err(EntryPointError::Decode {
                inner: format!(
                    "data field can't be deserialized to EntryPointAPIErrors error: {e:?}",
                ),
            })
        }
    }
}

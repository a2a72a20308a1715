use crate::validator::ValidatorError;
use jsonrpsee::core::ClientError;
use kernel_contracts::EntryPointError;
use kernel_primitives::{constants::rpc_error_codes::VALIDATION, UserOperationHash};
use std::time::Duration;
use thiserror::Error;

/// Errors of the Kernel provider
#[derive(Debug, Error, Clone)]
pub enum ProviderError {
    /// Invalid configuration (detected before any network call)
    #[error("configuration error: {inner}")]
    Configuration {
        /// The inner error message
        inner: String,
    },

    /// The bundler (or paymaster) rejected the user operation, the message is kept verbatim
    #[error("{message}")]
    ValidationRejection {
        /// JSON-RPC error code
        code: i32,
        /// Rejection reason (e.g. `AA23 reverted (or OOG)`)
        message: String,
    },

    /// Network or JSON-RPC transport failure
    #[error("transport error: {inner}")]
    Transport {
        /// The inner error message
        inner: String,
    },

    /// Transport failures persisted through every submission attempt
    #[error("user operation not submitted after {attempts} attempts: {inner}")]
    RetriesExhausted {
        /// Number of attempts made
        attempts: u32,
        /// Last transport error
        inner: String,
    },

    /// The user operation was not included before the deadline (it may still be included later)
    #[error("user operation {hash} not included within {timeout:?}")]
    InclusionTimeout {
        /// Hash of the user operation
        hash: UserOperationHash,
        /// How long the provider waited
        timeout: Duration,
    },

    /// Signer failure
    #[error("signer error: {inner}")]
    Signer {
        /// The inner error message
        inner: String,
    },

    /// Validator refused to sign
    #[error(transparent)]
    Validator(ValidatorError),

    /// Method not supported by `request`
    #[error("unsupported method: {method}")]
    UnsupportedMethod {
        /// Requested method
        method: String,
    },

    /// Malformed request parameters
    #[error("invalid request: {inner}")]
    InvalidRequest {
        /// The inner error message
        inner: String,
    },
}

impl ProviderError {
    /// Only transport failures are worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    pub fn configuration<S: ToString>(inner: S) -> Self {
        Self::Configuration { inner: inner.to_string() }
    }

    pub fn invalid_request<S: ToString>(inner: S) -> Self {
        Self::InvalidRequest { inner: inner.to_string() }
    }
}

impl From<ClientError> for ProviderError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Call(err) => {
                Self::ValidationRejection { code: err.code(), message: err.message().to_string() }
            }
            other => Self::Transport { inner: other.to_string() },
        }
    }
}

impl From<ValidatorError> for ProviderError {
    fn from(err: ValidatorError) -> Self {
        match err {
            ValidatorError::Signer { inner } => Self::Signer { inner },
            other => Self::Validator(other),
        }
    }
}

impl From<EntryPointError> for ProviderError {
    fn from(err: EntryPointError) -> Self {
        match err {
            EntryPointError::FailedOp(op) => {
                Self::ValidationRejection { code: VALIDATION, message: op.reason }
            }
            EntryPointError::ExecutionReverted(reason) => {
                Self::ValidationRejection { code: VALIDATION, message: reason }
            }
            other => Self::Transport { inner: other.to_string() },
        }
    }
}

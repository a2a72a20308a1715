//! Calls executed by the Kernel account

use crate::utils::as_checksum_addr;
use ethers::types::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

/// A single call (target, value, data) executed by the account
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    #[serde(serialize_with = "as_checksum_addr")]
    pub target: Address,
    #[serde(default)]
    pub value: U256,
    #[serde(default)]
    pub data: Bytes,
}

impl Call {
    pub fn new(target: Address, value: U256, data: Bytes) -> Self {
        Self { target, value, data }
    }

    /// The 4-byte function selector of the call data (if present)
    pub fn selector(&self) -> Option<[u8; 4]> {
        if self.data.len() >= 4 {
            let mut selector = [0u8; 4];
            selector.copy_from_slice(&self.data[0..4]);
            Some(selector)
        } else {
            None
        }
    }
}

/// Calls of one user operation: a single call or an ordered batch
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserOperationCalls {
    Single(Call),
    Batch(Vec<Call>),
}

impl UserOperationCalls {
    /// Calls in execution order
    pub fn calls(&self) -> Vec<&Call> {
        match self {
            Self::Single(call) => vec![call],
            Self::Batch(calls) => calls.iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Batch(calls) if calls.is_empty())
    }
}

impl From<Call> for UserOperationCalls {
    fn from(call: Call) -> Self {
        Self::Single(call)
    }
}

impl From<Vec<Call>> for UserOperationCalls {
    fn from(calls: Vec<Call>) -> Self {
        Self::Batch(calls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calls_deserialize_single_or_batch() {
        let single: UserOperationCalls = serde_json::from_str(
            r#"{"target":"0xA7b2c01A5AfBCf1FAB17aCf95D8367eCcFeEb845","value":"0x1","data":"0x0234"}"#,
        )
        .unwrap();
        assert!(matches!(single, UserOperationCalls::Single(ref c) if c.value == 1.into()));

        let batch: UserOperationCalls = serde_json::from_str(
            r#"[{"target":"0xA7b2c01A5AfBCf1FAB17aCf95D8367eCcFeEb845"},{"target":"0x5D006d3880645ec6e254E18C1F879DAC9Dd71A39","data":"0x12345678"}]"#,
        )
        .unwrap();
        let calls = batch.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].selector(), Some([0x12, 0x34, 0x56, 0x78]));
        assert_eq!(calls[0].selector(), None);
    }
}

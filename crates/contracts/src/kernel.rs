//! Kernel v2 account and factory: call data encoding and address derivation

use crate::{
    error::{deserialize_error_msg, CallDataError, EntryPointError},
    gen::{
        kernel_api::{self, ExecuteBatchCall, ExecuteCall, InitializeCall, KernelAPICalls},
        kernel_factory_api::CreateAccountCall,
        kill_switch_action_api::ToggleKillSwitchCall,
        token_api::ApproveCall,
        KernelFactoryAPI, SELECTORS_NAMES,
    },
};
use ethers::{
    abi::{self, AbiDecode, AbiEncode, Token},
    providers::Middleware,
    types::{Address, Bytes, U256},
    utils::{get_create2_address_from_hash, keccak256},
};
use kernel_primitives::Call;
use std::sync::Arc;

/// Kind of call made by `execute`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Operation {
    Call = 0,
    DelegateCall = 1,
}

impl TryFrom<u8> for Operation {
    type Error = CallDataError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Call),
            1 => Ok(Self::DelegateCall),
            other => Err(CallDataError::UnknownOperation(other)),
        }
    }
}

/// Decoded call data of a Kernel account
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KernelCall {
    Execute { call: Call, operation: Operation },
    ExecuteBatch(Vec<Call>),
}

impl KernelCall {
    /// Calls made by the account, in execution order
    pub fn calls(&self) -> Vec<&Call> {
        match self {
            Self::Execute { call, .. } => vec![call],
            Self::ExecuteBatch(calls) => calls.iter().collect(),
        }
    }
}

/// `execute(address,uint256,bytes,uint8)` with a regular call
pub fn encode_execute(target: Address, value: U256, data: Bytes) -> Bytes {
    encode_execute_operation(target, value, data, Operation::Call)
}

/// `execute(address,uint256,bytes,uint8)` with a delegate call
pub fn encode_execute_delegate(target: Address, value: U256, data: Bytes) -> Bytes {
    encode_execute_operation(target, value, data, Operation::DelegateCall)
}

fn encode_execute_operation(
    target: Address,
    value: U256,
    data: Bytes,
    operation: Operation,
) -> Bytes {
    ExecuteCall { to: target, value, data, operation: operation as u8 }.encode().into()
}

/// `executeBatch((address,uint256,bytes)[])`, calls are executed in the given order
pub fn encode_execute_batch(calls: &[Call]) -> Bytes {
    ExecuteBatchCall {
        calls: calls
            .iter()
            .map(|call| kernel_api::Call {
                to: call.target,
                value: call.value,
                data: call.data.clone(),
            })
            .collect(),
    }
    .encode()
    .into()
}

/// Decodes the call data produced by [encode_execute], [encode_execute_delegate] and
/// [encode_execute_batch]
pub fn decode_call_data(data: &[u8]) -> Result<KernelCall, CallDataError> {
    match KernelAPICalls::decode(data) {
        Ok(KernelAPICalls::Execute(ExecuteCall { to, value, data, operation })) => {
            Ok(KernelCall::Execute {
                call: Call::new(to, value, data),
                operation: Operation::try_from(operation)?,
            })
        }
        Ok(KernelAPICalls::ExecuteBatch(ExecuteBatchCall { calls })) => Ok(
            KernelCall::ExecuteBatch(
                calls.into_iter().map(|call| Call::new(call.to, call.value, call.data)).collect(),
            ),
        ),
        Ok(_) => Err(CallDataError::Unsupported { function: function_name(data) }),
        Err(err) => match data.get(..4).and_then(|selector| SELECTORS_NAMES.get(selector)) {
            Some(name) => Err(CallDataError::Unsupported { function: name.clone() }),
            None => Err(CallDataError::Decode { inner: err.to_string() }),
        },
    }
}

fn function_name(data: &[u8]) -> String {
    data.get(..4)
        .and_then(|selector| SELECTORS_NAMES.get(selector))
        .cloned()
        .unwrap_or_else(|| Bytes::from(data.iter().take(4).copied().collect::<Vec<u8>>()).to_string())
}

/// `createAccount(address,bytes,uint256)` of the Kernel factory
pub fn encode_create_account(validator: Address, enable_data: Bytes, index: U256) -> Bytes {
    CreateAccountCall { validator, data: enable_data, index }.encode().into()
}

/// `initialize(address,bytes)` the proxy runs when it is deployed
pub fn encode_initialize(validator: Address, enable_data: Bytes) -> Bytes {
    InitializeCall { default_validator: validator, data: enable_data }.encode().into()
}

/// `toggleKillSwitch()` of the kill switch action
pub fn encode_toggle_kill_switch() -> Bytes {
    ToggleKillSwitchCall.encode().into()
}

/// ERC-20 `approve(address,uint256)`
pub fn encode_approve(spender: Address, amount: U256) -> Bytes {
    ApproveCall { spender, amount }.encode().into()
}

/// Computes the address the Kernel factory deploys the account to
///
/// `salt = keccak256(validator ‖ enableData ‖ index)` and the proxy is created from
/// `proxyCreationCode ‖ abi.encode(kernelTemplate, initialize(validator, enableData))`.
pub fn compute_account_address(
    factory: Address,
    kernel_template: Address,
    proxy_creation_code: &[u8],
    validator: Address,
    enable_data: &[u8],
    index: U256,
) -> Address {
    let salt = keccak256([validator.as_bytes(), enable_data, &index.encode()].concat());
    let constructor_args = abi::encode(&[
        Token::Address(kernel_template),
        Token::Bytes(encode_initialize(validator, enable_data.to_vec().into()).to_vec()),
    ]);
    let init_code_hash = keccak256([proxy_creation_code, &constructor_args].concat());
    get_create2_address_from_hash(factory, salt, init_code_hash)
}

/// Kernel factory deployed on chain
#[derive(Clone)]
pub struct KernelFactory<M: Middleware + 'static> {
    address: Address,
    factory_api: KernelFactoryAPI<M>,
}

impl<M: Middleware + 'static> KernelFactory<M> {
    pub fn new(eth_client: Arc<M>, address: Address) -> Self {
        let factory_api = KernelFactoryAPI::new(address, eth_client);
        Self { address, factory_api }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Asks the factory for the counterfactual address of the account
    pub async fn get_account_address(
        &self,
        validator: Address,
        enable_data: Bytes,
        index: U256,
    ) -> Result<Address, EntryPointError> {
        self.factory_api
            .get_account_address(validator, enable_data, index)
            .call()
            .await
            .map_err(|err| match deserialize_error_msg(err) {
                Ok(op) => EntryPointError::Other {
                    inner: format!("get account address error: {op:?}"),
                },
                Err(err) => err,
            })
    }
}

use ethers::{
    contract::{abigen, EthCall},
    types::Selector,
};
use lazy_static::lazy_static;
use std::collections::HashMap;

abigen!(
    EntryPointAPI,
    r#"[
        function getNonce(address sender, uint192 key) public view returns (uint256 nonce)
        function getSenderAddress(bytes memory initCode) external
        error FailedOp(uint256 opIndex, string reason)
        error SenderAddressResult(address sender)
    ]"#
);

abigen!(
    KernelAPI,
    r#"[
        struct Call {address to;uint256 value;bytes data;}
        function execute(address to, uint256 value, bytes calldata data, uint8 operation) external payable
        function executeBatch(Call[] calldata calls) external payable
        function initialize(address defaultValidator, bytes calldata data) external payable
    ]"#
);

abigen!(
    KernelFactoryAPI,
    r#"[
        function createAccount(address validator, bytes calldata data, uint256 index) external payable returns (address proxy)
        function getAccountAddress(address validator, bytes calldata data, uint256 index) public view returns (address)
    ]"#
);

abigen!(
    KillSwitchActionAPI,
    r#"[
        function toggleKillSwitch() external
    ]"#
);

abigen!(
    TokenAPI,
    r#"[
        function approve(address spender, uint256 amount) external returns (bool)
    ]"#
);

lazy_static! {
    /// Names of the functions a Kernel account can be asked to call (used when decoding call data)
    pub static ref SELECTORS_NAMES: HashMap<Selector, String> = {
        let mut map = HashMap::new();
        // account
        map.insert(kernel_api::ExecuteCall::selector(), kernel_api::ExecuteCall::function_name().into());
        map.insert(kernel_api::ExecuteBatchCall::selector(), kernel_api::ExecuteBatchCall::function_name().into());
        map.insert(kernel_api::InitializeCall::selector(), kernel_api::InitializeCall::function_name().into());
        // factory
        map.insert(kernel_factory_api::CreateAccountCall::selector(), kernel_factory_api::CreateAccountCall::function_name().into());
        // kill switch
        map.insert(kill_switch_action_api::ToggleKillSwitchCall::selector(), kill_switch_action_api::ToggleKillSwitchCall::function_name().into());
        // erc-20
        map.insert(token_api::ApproveCall::selector(), token_api::ApproveCall::function_name().into());
        map
    };
}

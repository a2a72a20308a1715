mod common;

use async_trait::async_trait;
use common::{owner, MockBundler, MockChain, MockSigner, ACCOUNT_0, ACCOUNT_3, OWNER_SIGNATURE};
use ethers::types::{Address, Bytes, U256};
use kernel_contracts::{decode_call_data, KernelCall, Operation};
use kernel_primitives::{Call, UserOperation, UserOperationCalls, UserOperationHash};
use kernel_provider::{
    eip6492, AddressDerivation, EcdsaValidator, KernelAccount, KernelValidator, ProviderConfig,
    ProviderError, RpcRequest, ValidatorError, ValidatorKind,
};
use serde_json::json;
use std::{str::FromStr, sync::Arc};

const MESSAGE: &str = "0xa70d0af2ebb03a44dcd0714a8724f622e3ab876d0aa312f0ee04823285d6fb1b";

fn target() -> Address {
    ACCOUNT_3.parse().unwrap()
}

#[tokio::test]
async fn counterfactual_addresses() {
    let chain = Arc::new(MockChain::default());
    let bundler = Arc::new(MockBundler::default());

    let provider = common::provider(0, chain.clone(), bundler.clone());
    assert_eq!(provider.get_address().await.unwrap(), ACCOUNT_0.parse::<Address>().unwrap());

    let provider = common::provider(3, chain.clone(), bundler.clone());
    assert_eq!(provider.get_address().await.unwrap(), ACCOUNT_3.parse::<Address>().unwrap());

    // computed once per account
    let calls = chain.count("get_account_address");
    provider.get_address().await.unwrap();
    provider.get_account().get_address().await.unwrap();
    assert_eq!(chain.count("get_account_address"), calls);

    // same inputs, same address
    let a = common::provider(7, chain.clone(), bundler.clone()).get_address().await.unwrap();
    let b = common::provider(7, chain.clone(), bundler.clone()).get_address().await.unwrap();
    let c = common::provider(8, chain, bundler).get_address().await.unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[tokio::test]
async fn nonces() {
    let chain = Arc::new(MockChain::default());
    let bundler = Arc::new(MockBundler::default());

    let provider = common::provider(0, chain.clone(), bundler.clone());
    assert_eq!(provider.get_nonce().await.unwrap(), U256::zero());
    let provider = common::provider(3, chain.clone(), bundler.clone());
    assert_eq!(provider.get_nonce().await.unwrap(), U256::from(2));

    let undeployed = common::provider(4, chain, bundler);
    assert!(!undeployed.is_account_deployed().await.unwrap());
    assert_eq!(undeployed.get_nonce().await.unwrap(), U256::zero());
}

/// ECDSA validator using its own nonce key space
#[derive(Debug)]
struct KeyedValidator {
    inner: EcdsaValidator,
    key: U256,
}

#[async_trait]
impl KernelValidator for KeyedValidator {
    fn kind(&self) -> ValidatorKind {
        self.inner.kind()
    }

    fn address(&self) -> Address {
        self.inner.address()
    }

    fn enable_data(&self) -> Bytes {
        self.inner.enable_data()
    }

    fn nonce_key(&self) -> U256 {
        self.key
    }

    async fn sign_user_op_hash(
        &self,
        hash: &UserOperationHash,
        uo: &UserOperation,
    ) -> Result<Bytes, ValidatorError> {
        self.inner.sign_user_op_hash(hash, uo).await
    }

    async fn sign_message(&self, message: &[u8]) -> Result<Bytes, ValidatorError> {
        self.inner.sign_message(message).await
    }

    async fn dummy_signature(&self, uo: &UserOperation) -> Result<Bytes, ValidatorError> {
        self.inner.dummy_signature(uo).await
    }
}

#[tokio::test]
async fn undeployed_nonce_is_in_validator_key_space() {
    let config = ProviderConfig::default();
    let ecdsa = EcdsaValidator::new(Arc::new(MockSigner));
    let validator = Arc::new(KeyedValidator { inner: ecdsa.clone(), key: U256::from(7) });
    let account = KernelAccount::new(
        Arc::new(MockChain::default()),
        config.entry_point,
        config.factory,
        U256::from(4),
        AddressDerivation::FactoryQuery,
        Arc::new(ecdsa),
        validator,
    );

    assert!(!account.is_account_deployed().await.unwrap());
    assert_eq!(account.get_nonce().await.unwrap(), U256::from(7) << 64);
}

#[tokio::test]
async fn init_code_only_before_deployment() {
    let chain = Arc::new(MockChain::default());
    let provider = common::provider(5, chain.clone(), Arc::new(MockBundler::default()));
    let account = provider.get_account();

    let init_code = account.get_init_code().await.unwrap();
    assert_eq!(&init_code[..20], account.factory().as_bytes());
    assert_eq!(&init_code[20..], account.get_factory_call_data().as_ref());

    chain.deploy(account.get_address().await.unwrap());
    assert!(provider.is_account_deployed().await.unwrap());
    assert!(account.get_init_code().await.unwrap().is_empty());
}

#[tokio::test]
async fn execute_encoding() {
    let provider =
        common::provider(0, Arc::new(MockChain::default()), Arc::new(MockBundler::default()));
    let data = Bytes::from_str("0x0234").unwrap();

    let execute = provider.encode_execute(target(), 1.into(), data.clone());
    assert_eq!(
        execute,
        Bytes::from_str("0x51945447000000000000000000000000a7b2c01a5afbcf1fab17acf95d8367eccfeeb84500000000000000000000000000000000000000000000000000000000000000010000000000000000000000000000000000000000000000000000000000000080000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000020234000000000000000000000000000000000000000000000000000000000000").unwrap()
    );

    let delegate = provider.encode_execute_delegate(target(), 1.into(), data.clone());
    assert_eq!(execute.len(), delegate.len());
    let differing: Vec<usize> =
        (0..execute.len()).filter(|i| execute[*i] != delegate[*i]).collect();
    assert_eq!(differing, vec![4 + 3 * 32 + 31]);

    match decode_call_data(&delegate).unwrap() {
        KernelCall::Execute { call, operation } => {
            assert_eq!(call, Call::new(target(), 1.into(), data));
            assert_eq!(operation, Operation::DelegateCall);
        }
        other => panic!("unexpected call {other:?}"),
    }
}

#[tokio::test]
async fn batch_keeps_call_order() {
    let provider =
        common::provider(0, Arc::new(MockChain::default()), Arc::new(MockBundler::default()));
    let calls = vec![
        Call::new(Address::repeat_byte(1), 0.into(), Bytes::from(vec![1])),
        Call::new(Address::repeat_byte(2), 5.into(), Bytes::default()),
        Call::new(Address::repeat_byte(3), 0.into(), Bytes::from(vec![3, 3])),
    ];

    let account = provider.get_account();

    let data = account.encode_calls(&UserOperationCalls::Batch(calls.clone())).unwrap();
    match decode_call_data(&data).unwrap() {
        KernelCall::ExecuteBatch(decoded) => assert_eq!(decoded, calls),
        other => panic!("unexpected call {other:?}"),
    }

    let err = account.encode_calls(&UserOperationCalls::Batch(vec![])).unwrap_err();
    assert!(matches!(err, ProviderError::InvalidRequest { .. }));
}

#[tokio::test]
async fn message_signatures() {
    let chain = Arc::new(MockChain::default());
    let bundler = Arc::new(MockBundler::default());
    let owner_signature = Bytes::from_str(OWNER_SIGNATURE).unwrap();

    // deployed: raw owner signature
    let deployed = common::provider(0, chain.clone(), bundler.clone());
    let address = deployed.get_address().await.unwrap();
    let signature = deployed
        .request(RpcRequest::new("personal_sign", json!([MESSAGE, address])))
        .await
        .unwrap();
    assert_eq!(signature, json!(owner_signature));

    // undeployed: EIP-6492 wrapper around the owner signature
    let undeployed = common::provider(10, chain.clone(), bundler.clone());
    let account = undeployed.get_account();
    let factory_call_data = Bytes::from_str("0x296601cd000000000000000000000000180d6465f921c7e0dea0040107d342c87455fff50000000000000000000000000000000000000000000000000000000000000060000000000000000000000000000000000000000000000000000000000000000a000000000000000000000000000000000000000000000000000000000000001448D4d3536cDe7A257087206870c6B6E76e3D4ff4000000000000000000000000").unwrap();
    assert_eq!(account.get_factory_call_data(), factory_call_data);

    let address = undeployed.get_address().await.unwrap();
    let signature: Bytes = serde_json::from_value(
        undeployed
            .request(RpcRequest::new("personal_sign", json!([MESSAGE, address])))
            .await
            .unwrap(),
    )
    .unwrap();
    assert_eq!(signature, eip6492::wrap(account.factory(), &factory_call_data, &owner_signature));
    assert!(eip6492::is_wrapped(&signature));

    // raw account signature, deployed or not
    assert_eq!(account.sign_message(b"hello").await.unwrap(), owner_signature);

    // eth_sign takes the address first
    let signature: Bytes = serde_json::from_value(
        undeployed
            .request(RpcRequest::new("eth_sign", json!([address, MESSAGE])))
            .await
            .unwrap(),
    )
    .unwrap();
    assert!(eip6492::is_wrapped(&signature));

    // someone else's address
    let err = undeployed
        .request(RpcRequest::new("personal_sign", json!([MESSAGE, owner()])))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::InvalidRequest { .. }));
}

#[tokio::test]
async fn message_signature_unwrapped_once_deployed() {
    let chain = Arc::new(MockChain::default());
    let provider = common::provider(10, chain.clone(), Arc::new(MockBundler::default()));
    let address = provider.get_address().await.unwrap();
    let request = || RpcRequest::new("personal_sign", json!([MESSAGE, address]));

    let before: Bytes = serde_json::from_value(provider.request(request()).await.unwrap()).unwrap();
    assert!(eip6492::is_wrapped(&before));

    chain.deploy(address);

    let after: Bytes = serde_json::from_value(provider.request(request()).await.unwrap()).unwrap();
    assert!(!eip6492::is_wrapped(&after));
    assert_eq!(after, Bytes::from_str(OWNER_SIGNATURE).unwrap());
    assert_eq!(provider.sign_message(b"hello").await.unwrap(), after);
}

#[tokio::test]
async fn user_operation_signature_has_mode_prefix() {
    let provider =
        common::provider(3, Arc::new(MockChain::default()), Arc::new(MockBundler::default()));
    let account = provider.get_account();

    let signature = account
        .sign_user_operation_hash(&UserOperationHash::repeat_byte(1), &UserOperation::default())
        .await
        .unwrap();
    assert_eq!(&signature[..4], &[0, 0, 0, 0]);
    assert_eq!(&signature[4..], Bytes::from_str(OWNER_SIGNATURE).unwrap().as_ref());

    let dummy = account.dummy_signature(&UserOperation::default()).await.unwrap();
    assert_eq!(dummy.len(), 4 + 65);
}

#[tokio::test]
async fn other_requests() {
    let provider =
        common::provider(3, Arc::new(MockChain::default()), Arc::new(MockBundler::default()));

    assert_eq!(
        provider.request(RpcRequest::new("eth_accounts", json!([]))).await.unwrap(),
        json!([ACCOUNT_3.parse::<Address>().unwrap()])
    );
    assert_eq!(
        provider.request(RpcRequest::new("eth_chainId", json!([]))).await.unwrap(),
        json!("0x13881")
    );

    let err = provider
        .request(RpcRequest::new("eth_signTypedData_v4", json!([])))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ProviderError::UnsupportedMethod { method } if method == "eth_signTypedData_v4"
    ));
}

#![allow(dead_code)]

use async_trait::async_trait;
use ethers::types::{Address, Bytes, Signature, TransactionReceipt, H256, U256};
use kernel_contracts::compute_account_address;
use kernel_primitives::{
    AccountSigner, GasTokenRegistry, UserOperation, UserOperationGasEstimation,
    UserOperationHash, UserOperationReceipt, UserOperationRequest,
};
use kernel_provider::{
    BundlerClient, ChainReader, Collaborators, EcdsaValidator, Fees, KernelProvider,
    PaymasterClient, ProviderConfig, ProviderError, RetryConfig, SponsorUserOperationRequest,
    SponsorUserOperationResponse, ValidatorConfig, WaitConfig,
};
use std::{
    collections::{HashMap, VecDeque},
    str::FromStr,
    sync::{Arc, Mutex},
    time::Duration,
};

/// Owner of the fixture accounts
pub const OWNER: &str = "0x48D4d3536cDe7A257087206870c6B6E76e3D4ff4";
/// Signature the mock owner returns for every message
pub const OWNER_SIGNATURE: &str = "0x4d61c5c27fb64b207cbf3bcf60d78e725659cff5f93db9a1316162117dff72aa631761619d93d4d97dfb761ba00b61f9274c6a4a76e494df644d968dd84ddcdb1c";
/// Account of the owner at index 0 (deployed, nonce 0)
pub const ACCOUNT_0: &str = "0x97925A25C6B8E8902D2c68A4fcd90421a701d2E8";
/// Account of the owner at index 3 (deployed, nonce 2)
pub const ACCOUNT_3: &str = "0xA7b2c01A5AfBCf1FAB17aCf95D8367eCcFeEb845";

pub fn owner() -> Address {
    OWNER.parse().unwrap()
}

/// Signer returning a fixed signature
#[derive(Debug, Clone)]
pub struct MockSigner;

#[async_trait]
impl AccountSigner for MockSigner {
    fn address(&self) -> Address {
        owner()
    }

    async fn sign_message(&self, _message: &[u8]) -> eyre::Result<Signature> {
        let bytes = Bytes::from_str(OWNER_SIGNATURE)?;
        Ok(Signature::try_from(bytes.as_ref())?)
    }
}

/// Chain where the fixture accounts of the owner live
#[derive(Debug)]
pub struct MockChain {
    addresses: HashMap<U256, Address>,
    code: Mutex<HashMap<Address, Bytes>>,
    nonces: Mutex<HashMap<Address, U256>>,
    /// Fee estimates, the last one repeats
    fees: Mutex<VecDeque<Fees>>,
    /// Code reads succeeding before the node goes away
    code_reads: Mutex<Option<usize>>,
    pub calls: Mutex<Vec<&'static str>>,
}

pub fn fees(max_fee_gwei: u64, max_priority_fee_gwei: u64) -> Fees {
    Fees {
        max_fee_per_gas: U256::from(max_fee_gwei) * U256::exp10(9),
        max_priority_fee_per_gas: U256::from(max_priority_fee_gwei) * U256::exp10(9),
    }
}

impl Default for MockChain {
    fn default() -> Self {
        let account_0: Address = ACCOUNT_0.parse().unwrap();
        let account_3: Address = ACCOUNT_3.parse().unwrap();
        let code = Bytes::from(vec![0x60, 0x80, 0x60, 0x40]);
        Self {
            addresses: HashMap::from([(0.into(), account_0), (3.into(), account_3)]),
            code: Mutex::new(HashMap::from([(account_0, code.clone()), (account_3, code)])),
            nonces: Mutex::new(HashMap::from([(account_0, 0.into()), (account_3, 2.into())])),
            fees: Mutex::new(VecDeque::from([fees(2, 1)])),
            code_reads: Mutex::new(None),
            calls: Mutex::new(vec![]),
        }
    }
}

impl MockChain {
    pub fn deploy(&self, address: Address) {
        self.code.lock().unwrap().insert(address, Bytes::from(vec![0x60, 0x80]));
    }

    pub fn bump_nonce(&self, address: Address) {
        let mut nonces = self.nonces.lock().unwrap();
        let nonce = nonces.entry(address).or_default();
        *nonce += U256::one();
    }

    pub fn with_fees(fees: impl IntoIterator<Item = Fees>) -> Self {
        Self { fees: Mutex::new(fees.into_iter().collect()), ..Default::default() }
    }

    /// `eth_getCode` fails after `reads` successful calls
    pub fn fail_code_reads_after(&self, reads: usize) {
        *self.code_reads.lock().unwrap() = Some(reads);
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == call).count()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ChainReader for MockChain {
    async fn chain_id(&self) -> Result<u64, ProviderError> {
        Ok(80001)
    }

    async fn get_code(&self, address: Address) -> Result<Bytes, ProviderError> {
        self.record("get_code");
        if let Some(reads) = *self.code_reads.lock().unwrap() {
            if self.count("get_code") > reads {
                return Err(transport_error());
            }
        }
        Ok(self.code.lock().unwrap().get(&address).cloned().unwrap_or_default())
    }

    async fn get_nonce(
        &self,
        _entry_point: Address,
        sender: Address,
        _key: U256,
    ) -> Result<U256, ProviderError> {
        self.record("get_nonce");
        Ok(self.nonces.lock().unwrap().get(&sender).copied().unwrap_or_default())
    }

    async fn get_account_address(
        &self,
        factory: Address,
        validator: Address,
        enable_data: Bytes,
        index: U256,
    ) -> Result<Address, ProviderError> {
        self.record("get_account_address");
        Ok(self.addresses.get(&index).copied().unwrap_or_else(|| {
            compute_account_address(
                factory,
                Address::repeat_byte(0x42),
                &[0x60, 0x80],
                validator,
                &enable_data,
                index,
            )
        }))
    }

    async fn get_sender_address(
        &self,
        _entry_point: Address,
        _init_code: Bytes,
    ) -> Result<Address, ProviderError> {
        Err(ProviderError::Transport { inner: "not available".into() })
    }

    async fn estimate_fees(&self) -> Result<Fees, ProviderError> {
        self.record("estimate_fees");
        let mut fees = self.fees.lock().unwrap();
        let next = if fees.len() > 1 { fees.pop_front() } else { fees.front().copied() };
        Ok(next.unwrap_or_default())
    }
}

pub fn transport_error() -> ProviderError {
    ProviderError::Transport { inner: "connection reset by peer".into() }
}

pub fn aa23() -> ProviderError {
    ProviderError::ValidationRejection { code: -32500, message: "AA23 reverted (or OOG)".into() }
}

pub fn receipt(hash: UserOperationHash, tx: H256) -> UserOperationReceipt {
    UserOperationReceipt {
        user_operation_hash: hash,
        sender: ACCOUNT_3.parse().unwrap(),
        nonce: 2.into(),
        paymaster: None,
        actual_gas_cost: 1.into(),
        actual_gas_used: 1.into(),
        success: true,
        reason: String::new(),
        logs: vec![],
        tx_receipt: TransactionReceipt { transaction_hash: tx, ..Default::default() },
    }
}

/// Bundler answering from scripts (accepts everything once the scripts run out)
#[derive(Debug, Default)]
pub struct MockBundler {
    pub send_results: Mutex<VecDeque<Result<UserOperationHash, ProviderError>>>,
    pub receipts: Mutex<VecDeque<Result<Option<UserOperationReceipt>, ProviderError>>>,
    pub sent: Mutex<Vec<UserOperation>>,
    pub estimated: Mutex<Vec<UserOperationRequest>>,
    /// Another user operation of the sender lands whenever a submission fails
    pub chain: Option<Arc<MockChain>>,
}

impl MockBundler {
    pub fn with_send_results(
        results: impl IntoIterator<Item = Result<UserOperationHash, ProviderError>>,
    ) -> Self {
        Self { send_results: Mutex::new(results.into_iter().collect()), ..Default::default() }
    }

    pub fn attempts(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl BundlerClient for MockBundler {
    async fn supported_entry_points(&self) -> Result<Vec<Address>, ProviderError> {
        Ok(vec![kernel_primitives::constants::entry_point::ADDRESS.parse().unwrap()])
    }

    async fn estimate_user_operation_gas(
        &self,
        uo: &UserOperationRequest,
        _entry_point: Address,
    ) -> Result<UserOperationGasEstimation, ProviderError> {
        self.estimated.lock().unwrap().push(uo.clone());
        Ok(UserOperationGasEstimation {
            pre_verification_gas: 50_000.into(),
            verification_gas_limit: 150_000.into(),
            call_gas_limit: 80_000.into(),
        })
    }

    async fn send_user_operation(
        &self,
        uo: &UserOperation,
        _entry_point: Address,
    ) -> Result<UserOperationHash, ProviderError> {
        self.sent.lock().unwrap().push(uo.clone());
        let result = self
            .send_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(UserOperationHash::repeat_byte(0xab)));
        if let (Err(_), Some(chain)) = (&result, &self.chain) {
            chain.bump_nonce(uo.sender);
        }
        result
    }

    async fn get_user_operation_receipt(
        &self,
        _hash: &UserOperationHash,
    ) -> Result<Option<UserOperationReceipt>, ProviderError> {
        self.receipts.lock().unwrap().pop_front().unwrap_or(Ok(None))
    }
}

/// Paymaster sponsoring everything
#[derive(Debug, Default)]
pub struct MockPaymaster {
    pub requests: Mutex<Vec<SponsorUserOperationRequest>>,
}

#[async_trait]
impl PaymasterClient for MockPaymaster {
    async fn sponsor_user_operation(
        &self,
        request: SponsorUserOperationRequest,
    ) -> Result<SponsorUserOperationResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        Ok(SponsorUserOperationResponse {
            paymaster_and_data: Bytes::from(vec![0xcc; 20]),
            ..Default::default()
        })
    }
}

pub fn config(index: u64) -> ProviderConfig {
    ProviderConfig {
        index: index.into(),
        use_paymaster: false,
        retry: RetryConfig { max_retries: 3, interval: Duration::from_millis(5) },
        wait: WaitConfig {
            poll_interval: Duration::from_millis(5),
            timeout: Duration::from_millis(100),
        },
        ..Default::default()
    }
}

pub fn ecdsa() -> ValidatorConfig {
    ValidatorConfig::Ecdsa(EcdsaValidator::new(Arc::new(MockSigner)))
}

pub fn collaborators(chain: Arc<MockChain>, bundler: Arc<MockBundler>) -> Collaborators {
    Collaborators { chain, bundler, paymaster: None, gas_tokens: GasTokenRegistry::new() }
}

/// ECDSA provider of the fixture owner at the index
pub fn provider(
    index: u64,
    chain: Arc<MockChain>,
    bundler: Arc<MockBundler>,
) -> KernelProvider {
    KernelProvider::init(config(index), ecdsa(), collaborators(chain, bundler)).unwrap()
}

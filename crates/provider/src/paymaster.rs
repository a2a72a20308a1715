//! Paymaster middleware: asks the paymaster to sponsor (or take ERC-20 payment for) the gas of
//! a user operation before it is signed

use crate::error::ProviderError;
use async_trait::async_trait;
use ethers::types::{Address, Bytes, U256, U64};
use jsonrpsee::{
    core::RpcResult,
    http_client::{HttpClient, HttpClientBuilder},
    proc_macros::rpc,
};
use kernel_contracts::encode_approve;
use kernel_primitives::{
    as_checksum_addr, as_checksum_addr_opt, Call, GasToken, UserOperation, UserOperationRequest,
};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, sync::Arc};
use strum_macros::{Display, EnumString};
use tracing::{debug, warn};

/// Who pays for the gas
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, EnumString, Display, Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymasterPolicy {
    /// The paymaster sponsors the gas
    #[default]
    VerifyingPaymaster,
    /// The account pays the paymaster with an ERC-20 token
    TokenPaymaster,
}

/// Parameters of `zd_sponsorUserOperation`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SponsorUserOperationRequest {
    pub chain_id: U64,
    pub user_op: UserOperationRequest,
    #[serde(serialize_with = "as_checksum_addr")]
    pub entry_point_address: Address,
    pub paymaster_policy: PaymasterPolicy,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "as_checksum_addr_opt"
    )]
    pub token_address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

/// Result of `zd_sponsorUserOperation` (gas limits replace the bundler's estimates)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SponsorUserOperationResponse {
    #[serde(default)]
    pub paymaster_and_data: Bytes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_gas_limit: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_gas_limit: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_verification_gas: Option<U256>,
}

/// Paymaster `zd` namespace RPC methods trait
#[rpc(client, server, namespace = "zd")]
pub trait PaymasterApi {
    #[method(name = "sponsorUserOperation")]
    async fn sponsor_user_operation(
        &self,
        request: SponsorUserOperationRequest,
    ) -> RpcResult<SponsorUserOperationResponse>;
}

#[async_trait]
pub trait PaymasterClient: Debug + Send + Sync {
    async fn sponsor_user_operation(
        &self,
        request: SponsorUserOperationRequest,
    ) -> Result<SponsorUserOperationResponse, ProviderError>;
}

/// [PaymasterClient] over HTTP JSON-RPC
#[derive(Debug, Clone)]
pub struct RpcPaymasterClient {
    client: HttpClient,
}

impl RpcPaymasterClient {
    pub fn new(url: &str) -> Result<Self, ProviderError> {
        let client = HttpClientBuilder::default()
            .build(url)
            .map_err(|err| ProviderError::configuration(format!("paymaster url {url}: {err}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PaymasterClient for RpcPaymasterClient {
    async fn sponsor_user_operation(
        &self,
        request: SponsorUserOperationRequest,
    ) -> Result<SponsorUserOperationResponse, ProviderError> {
        Ok(PaymasterApiClient::sponsor_user_operation(&self.client, request).await?)
    }
}

/// Fills `paymasterAndData` of unsigned user operations
#[derive(Debug, Clone)]
pub struct PaymasterMiddleware {
    client: Arc<dyn PaymasterClient>,
    policy: PaymasterPolicy,
    gas_token: Option<GasToken>,
    project_id: Option<String>,
    chain_id: u64,
    entry_point: Address,
}

impl PaymasterMiddleware {
    /// The gas token is required by (and only used with) the token paymaster policy
    pub fn new(
        client: Arc<dyn PaymasterClient>,
        policy: PaymasterPolicy,
        gas_token: Option<GasToken>,
        chain_id: u64,
        entry_point: Address,
    ) -> Result<Self, ProviderError> {
        if policy == PaymasterPolicy::TokenPaymaster && gas_token.is_none() {
            return Err(ProviderError::configuration("token paymaster requires a gas token"));
        }
        Ok(Self { client, policy, gas_token, project_id: None, chain_id, entry_point })
    }

    pub fn with_project_id(mut self, project_id: Option<String>) -> Self {
        self.project_id = project_id;
        self
    }

    pub fn policy(&self) -> PaymasterPolicy {
        self.policy
    }

    pub fn gas_token(&self) -> Option<&GasToken> {
        self.gas_token.as_ref()
    }

    /// Asks the paymaster for `paymasterAndData` (and its gas limits)
    ///
    /// An empty answer leaves the user operation unsponsored.
    pub async fn annotate(&self, uo: UserOperation) -> Result<UserOperation, ProviderError> {
        let token_address = match self.policy {
            PaymasterPolicy::TokenPaymaster => self.gas_token.as_ref().map(|token| token.address),
            PaymasterPolicy::VerifyingPaymaster => None,
        };
        let request = SponsorUserOperationRequest {
            chain_id: self.chain_id.into(),
            user_op: uo.clone().into(),
            entry_point_address: self.entry_point,
            paymaster_policy: self.policy,
            token_address,
            project_id: self.project_id.clone(),
        };

        let response = self.client.sponsor_user_operation(request).await?;
        if response.paymaster_and_data.is_empty() {
            warn!("Paymaster did not sponsor user operation of {:?} ({})", uo.sender, self.policy);
            return Ok(uo);
        }
        debug!("Paymaster {} sponsored user operation of {:?}", self.policy, uo.sender);

        let SponsorUserOperationResponse {
            paymaster_and_data,
            call_gas_limit,
            verification_gas_limit,
            pre_verification_gas,
        } = response;
        Ok(UserOperation {
            call_gas_limit: call_gas_limit.unwrap_or(uo.call_gas_limit),
            verification_gas_limit: verification_gas_limit.unwrap_or(uo.verification_gas_limit),
            pre_verification_gas: pre_verification_gas.unwrap_or(uo.pre_verification_gas),
            ..uo
        }
        .paymaster_and_data(paymaster_and_data))
    }

    /// ERC-20 `approve(paymaster, amount)` call the account must execute before paying gas
    /// with the token
    pub fn gas_token_approve_call(&self, paymaster: Address) -> Result<Call, ProviderError> {
        let token = self
            .gas_token
            .as_ref()
            .ok_or_else(|| ProviderError::configuration("no gas token configured"))?;
        Ok(Call::new(token.address, U256::zero(), encode_approve(paymaster, token.approval_amount)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{str::FromStr, sync::Mutex};

    #[derive(Debug, Default)]
    struct MockPaymaster {
        response: SponsorUserOperationResponse,
        requests: Mutex<Vec<SponsorUserOperationRequest>>,
    }

    #[async_trait]
    impl PaymasterClient for MockPaymaster {
        async fn sponsor_user_operation(
            &self,
            request: SponsorUserOperationRequest,
        ) -> Result<SponsorUserOperationResponse, ProviderError> {
            self.requests.lock().unwrap().push(request);
            Ok(self.response.clone())
        }
    }

    fn test_token() -> GasToken {
        GasToken {
            symbol: "TEST_ERC20".into(),
            chain_id: 80001,
            address: "0x3870419Ba2BBf0127060bCB37f69A1b1C090992B".parse().unwrap(),
            approval_amount: U256::exp10(20),
        }
    }

    #[test]
    fn policy_names() {
        assert_eq!(PaymasterPolicy::TokenPaymaster.to_string(), "TOKEN_PAYMASTER");
        assert_eq!(
            PaymasterPolicy::from_str("VERIFYING_PAYMASTER").unwrap(),
            PaymasterPolicy::VerifyingPaymaster
        );
    }

    #[tokio::test]
    async fn sponsored_gas_limits_replace_estimates() {
        let paymaster = Arc::new(MockPaymaster {
            response: SponsorUserOperationResponse {
                paymaster_and_data: Bytes::from(vec![0xaa; 20]),
                call_gas_limit: Some(50_000.into()),
                verification_gas_limit: None,
                pre_verification_gas: Some(60_000.into()),
            },
            ..Default::default()
        });
        let middleware = PaymasterMiddleware::new(
            paymaster.clone(),
            PaymasterPolicy::TokenPaymaster,
            Some(test_token()),
            80001,
            Address::repeat_byte(0xee),
        )
        .unwrap();

        let uo = UserOperation::default()
            .call_gas_limit(1.into())
            .verification_gas_limit(2.into())
            .pre_verification_gas(3.into());
        let uo = middleware.annotate(uo).await.unwrap();

        assert_eq!(uo.paymaster_and_data, Bytes::from(vec![0xaa; 20]));
        assert_eq!(uo.call_gas_limit, U256::from(50_000));
        assert_eq!(uo.verification_gas_limit, U256::from(2));
        assert_eq!(uo.pre_verification_gas, U256::from(60_000));

        let requests = paymaster.requests.lock().unwrap();
        assert_eq!(requests[0].token_address, Some(test_token().address));
        let value = serde_json::to_value(&requests[0]).unwrap();
        assert_eq!(value["paymasterPolicy"], "TOKEN_PAYMASTER");
        assert_eq!(value["chainId"], "0x13881");
    }

    #[tokio::test]
    async fn empty_response_leaves_operation_unsponsored() {
        let middleware = PaymasterMiddleware::new(
            Arc::new(MockPaymaster::default()),
            PaymasterPolicy::VerifyingPaymaster,
            None,
            80001,
            Address::repeat_byte(0xee),
        )
        .unwrap();

        let uo = UserOperation::default().call_gas_limit(7.into());
        assert_eq!(middleware.annotate(uo.clone()).await.unwrap(), uo);
    }

    #[test]
    fn token_policy_requires_gas_token() {
        let err = PaymasterMiddleware::new(
            Arc::new(MockPaymaster::default()),
            PaymasterPolicy::TokenPaymaster,
            None,
            80001,
            Address::zero(),
        )
        .unwrap_err();
        assert!(matches!(err, ProviderError::Configuration { .. }));
    }

    #[test]
    fn approve_call() {
        let middleware = PaymasterMiddleware::new(
            Arc::new(MockPaymaster::default()),
            PaymasterPolicy::TokenPaymaster,
            Some(test_token()),
            80001,
            Address::zero(),
        )
        .unwrap();

        let call = middleware.gas_token_approve_call(Address::repeat_byte(0x11)).unwrap();
        assert_eq!(call.target, test_token().address);
        assert_eq!(call.selector(), Some([0x09, 0x5e, 0xa7, 0xb3]));
        assert_eq!(call.data.len(), 4 + 32 + 32);
    }
}

use super::{
    ecdsa::dummy_ecdsa_signature, now, sign_with, KernelValidator, ValidatorError, ValidatorKind,
    ValidatorMode,
};
use async_trait::async_trait;
use ethers::{
    abi::{self, Token},
    types::{Address, Bytes, U256},
    utils::keccak256,
};
use kernel_contracts::{decode_call_data, KernelCall, Operation};
use kernel_primitives::{
    constants::validators::SESSION_KEY_VALIDATOR_ADDRESS, pack_uint48, AccountSigner, Call,
    UserOperation, UserOperationHash,
};
use serde::{Deserialize, Serialize};
use std::{str::FromStr, sync::Arc};

/// Call the session key may make: target contract, function selector and maximum value
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub target: Address,
    pub selector: [u8; 4],
    pub value_limit: U256,
}

impl Permission {
    pub fn new(target: Address, selector: [u8; 4], value_limit: U256) -> Self {
        Self { target, selector, value_limit }
    }

    fn token(&self) -> Token {
        Token::Tuple(vec![
            Token::Address(self.target),
            Token::FixedBytes(self.selector.to_vec()),
            Token::Uint(self.value_limit),
        ])
    }

    /// Merkle leaf: `keccak256(abi.encode(permission))`
    pub fn leaf(&self) -> [u8; 32] {
        keccak256(abi::encode(&[self.token()]))
    }

    pub fn allows(&self, call: &Call) -> bool {
        call.target == self.target &&
            call.selector().unwrap_or_default() == self.selector &&
            call.value <= self.value_limit
    }
}

/// Merkle tree with sorted pairs (`keccak256(min(a, b) ‖ max(a, b))`)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MerkleTree {
    layers: Vec<Vec<[u8; 32]>>,
}

fn hash_pair(a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
    if a <= b {
        keccak256([&a[..], &b[..]].concat())
    } else {
        keccak256([&b[..], &a[..]].concat())
    }
}

impl MerkleTree {
    pub fn new(mut leaves: Vec<[u8; 32]>) -> Self {
        leaves.sort_unstable();
        leaves.dedup();

        let mut layers = vec![leaves];
        while layers.last().map(|layer| layer.len() > 1).unwrap_or(false) {
            let next = layers
                .last()
                .map(|layer| {
                    layer
                        .chunks(2)
                        .map(|pair| match pair.get(1) {
                            Some(b) => hash_pair(&pair[0], b),
                            None => pair[0],
                        })
                        .collect()
                })
                .unwrap_or_default();
            layers.push(next);
        }
        Self { layers }
    }

    /// Root of the tree (zero for an empty tree)
    pub fn root(&self) -> [u8; 32] {
        self.layers.last().and_then(|layer| layer.first().copied()).unwrap_or_default()
    }

    /// Sibling hashes from the leaf up to the root
    pub fn proof(&self, leaf: &[u8; 32]) -> Option<Vec<[u8; 32]>> {
        let mut index = self.layers.first()?.iter().position(|l| l == leaf)?;
        let mut proof = vec![];
        for layer in &self.layers[..self.layers.len() - 1] {
            let sibling = index ^ 1;
            if let Some(hash) = layer.get(sibling) {
                proof.push(*hash);
            }
            index /= 2;
        }
        Some(proof)
    }

    pub fn verify(root: &[u8; 32], leaf: &[u8; 32], proof: &[[u8; 32]]) -> bool {
        proof.iter().fold(*leaf, |acc, sibling| hash_pair(&acc, sibling)) == *root
    }
}

/// Session key limited to a set of permissions, a validity window and optionally one paymaster
#[derive(Clone, Debug)]
pub struct SessionKeyValidator {
    address: Address,
    session_key: Arc<dyn AccountSigner>,
    permissions: Vec<Permission>,
    tree: MerkleTree,
    valid_after: u64,
    valid_until: u64,
    paymaster: Address,
    mode: ValidatorMode,
}

impl SessionKeyValidator {
    pub fn new(session_key: Arc<dyn AccountSigner>, permissions: Vec<Permission>) -> Self {
        let tree = MerkleTree::new(permissions.iter().map(Permission::leaf).collect());
        Self {
            address: Address::from_str(SESSION_KEY_VALIDATOR_ADDRESS).unwrap_or_default(),
            session_key,
            permissions,
            tree,
            valid_after: 0,
            valid_until: 0,
            paymaster: Address::zero(),
            mode: ValidatorMode::Plugin,
        }
    }

    pub fn with_address(mut self, address: Address) -> Self {
        self.address = address;
        self
    }

    /// Session is valid in `[valid_after, valid_until]` (`valid_until = 0` never expires)
    pub fn with_validity(mut self, valid_after: u64, valid_until: u64) -> Self {
        self.valid_after = valid_after;
        self.valid_until = valid_until;
        self
    }

    /// Only user operations sponsored by the paymaster can be signed
    pub fn with_paymaster(mut self, paymaster: Address) -> Self {
        self.paymaster = paymaster;
        self
    }

    pub fn with_mode(mut self, mode: ValidatorMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn merkle_root(&self) -> [u8; 32] {
        self.tree.root()
    }

    fn check_validity(&self) -> Result<(), ValidatorError> {
        let now = now();
        if now < self.valid_after || (self.valid_until != 0 && now > self.valid_until) {
            return Err(ValidatorError::SessionNotActive {
                now,
                valid_after: self.valid_after,
                valid_until: self.valid_until,
            });
        }
        Ok(())
    }

    fn check_paymaster(&self, uo: &UserOperation) -> Result<(), ValidatorError> {
        if !self.paymaster.is_zero() && uo.paymaster() != Some(self.paymaster) {
            return Err(ValidatorError::PaymasterNotAllowed {
                paymaster: uo.paymaster(),
                allowed: self.paymaster,
            });
        }
        Ok(())
    }

    fn find_permission(&self, uo: &UserOperation) -> Result<&Permission, ValidatorError> {
        match decode_call_data(&uo.call_data)? {
            KernelCall::Execute { call, operation: Operation::Call } => self
                .permissions
                .iter()
                .find(|permission| permission.allows(&call))
                .ok_or_else(|| ValidatorError::NoMatchingPermission {
                    target: call.target,
                    selector: ethers::utils::hex::encode(call.selector().unwrap_or_default()),
                }),
            other => Err(ValidatorError::UnsupportedCall {
                inner: format!("session keys only sign single calls, got {other:?}"),
            }),
        }
    }

    fn encode_signature(&self, signature: &[u8], permission: &Permission) -> Bytes {
        let proof = self.tree.proof(&permission.leaf()).unwrap_or_default();
        let proof_data = abi::encode(&[
            permission.token(),
            Token::Array(proof.into_iter().map(|hash| Token::FixedBytes(hash.to_vec())).collect()),
        ]);
        [self.session_key.address().as_bytes(), signature, &proof_data].concat().into()
    }
}

#[async_trait]
impl KernelValidator for SessionKeyValidator {
    fn kind(&self) -> ValidatorKind {
        ValidatorKind::SessionKey
    }

    fn address(&self) -> Address {
        self.address
    }

    fn enable_data(&self) -> Bytes {
        [
            self.session_key.address().as_bytes(),
            &self.merkle_root(),
            &pack_uint48(self.valid_after),
            &pack_uint48(self.valid_until),
            self.paymaster.as_bytes(),
        ]
        .concat()
        .into()
    }

    fn mode(&self) -> ValidatorMode {
        self.mode.clone()
    }

    async fn sign_user_op_hash(
        &self,
        hash: &UserOperationHash,
        uo: &UserOperation,
    ) -> Result<Bytes, ValidatorError> {
        self.check_validity()?;
        self.check_paymaster(uo)?;
        let permission = self.find_permission(uo)?;
        let signature = sign_with(&self.session_key, hash.as_bytes()).await?;
        Ok(self.encode_signature(&signature, permission))
    }

    async fn sign_message(&self, message: &[u8]) -> Result<Bytes, ValidatorError> {
        self.check_validity()?;
        sign_with(&self.session_key, message).await
    }

    async fn dummy_signature(&self, uo: &UserOperation) -> Result<Bytes, ValidatorError> {
        let permission = self.find_permission(uo)?;
        Ok(self.encode_signature(&dummy_ecdsa_signature(), permission))
    }
}

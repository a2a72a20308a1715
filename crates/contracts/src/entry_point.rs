pub use super::{error::EntryPointError, gen::EntryPointAPI};
use super::{error::deserialize_error_msg, gen::EntryPointAPIErrors};
use ethers::{
    providers::Middleware,
    types::{Address, Bytes, U256},
};
use std::sync::Arc;

#[derive(Clone)]
pub struct EntryPoint<M: Middleware + 'static> {
    address: Address,
    entry_point_api: EntryPointAPI<M>,
}

impl<M: Middleware + 'static> EntryPoint<M> {
    pub fn new(eth_client: Arc<M>, address: Address) -> Self {
        let entry_point_api = EntryPointAPI::new(address, eth_client);
        Self { address, entry_point_api }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Nonce of the sender in the given key space (`nonce = key << 64 | sequence`)
    pub async fn get_nonce(&self, sender: &Address, key: U256) -> Result<U256, EntryPointError> {
        self.entry_point_api.get_nonce(*sender, key).call().await.map_err(|err| {
            match deserialize_error_msg(err) {
                Ok(op) => EntryPointError::Other { inner: format!("get nonce error: {op:?}") },
                Err(err) => err,
            }
        })
    }

    /// Address the init code deploys the sender to (the entry point always reverts with
    /// `SenderAddressResult`)
    pub async fn get_sender_address(&self, init_code: Bytes) -> Result<Address, EntryPointError> {
        let res = self.entry_point_api.get_sender_address(init_code).call().await;

        match res {
            Ok(_) => Err(EntryPointError::NoRevert { function: "get_sender_address".into() }),
            Err(e) => deserialize_error_msg(e).and_then(|op| match op {
                EntryPointAPIErrors::SenderAddressResult(res) => Ok(res.sender),
                EntryPointAPIErrors::FailedOp(err) => Err(EntryPointError::FailedOp(err)),
                _ => Err(EntryPointError::Other {
                    inner: format!("get sender address error: {op:?}"),
                }),
            }),
        }
    }
}

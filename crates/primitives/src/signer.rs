//! Signing abstraction used by validators

use async_trait::async_trait;
use ethers::types::{Address, Signature};
use std::fmt::Debug;

/// Key that signs on behalf of a validator (owner, session key, guardian)
///
/// `sign_message` follows EIP-191 personal-sign semantics: the message is prefixed with
/// `"\x19Ethereum Signed Message:\n" ‖ len` before hashing.
#[async_trait]
pub trait AccountSigner: Debug + Send + Sync {
    /// Address of the key
    fn address(&self) -> Address;

    /// Signs the message (65-byte signature)
    async fn sign_message(&self, message: &[u8]) -> eyre::Result<Signature>;
}

#[async_trait]
impl<S> AccountSigner for S
where
    S: ethers::signers::Signer + 'static,
{
    fn address(&self) -> Address {
        ethers::signers::Signer::address(self)
    }

    async fn sign_message(&self, message: &[u8]) -> eyre::Result<Signature> {
        ethers::signers::Signer::sign_message(self, message)
            .await
            .map_err(|err| eyre::eyre!("Signer failed to sign message: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::{signers::LocalWallet, utils::hash_message};

    #[tokio::test]
    async fn local_wallet_personal_sign() {
        let wallet: LocalWallet =
            "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318".parse().unwrap();
        let signer: Box<dyn AccountSigner> = Box::new(wallet.clone());
        assert_eq!(signer.address(), ethers::signers::Signer::address(&wallet));

        let sig = signer.sign_message(b"kernel").await.unwrap();
        assert_eq!(sig.recover(hash_message(b"kernel")).unwrap(), signer.address());
        assert_eq!(sig.to_vec().len(), 65);
    }
}

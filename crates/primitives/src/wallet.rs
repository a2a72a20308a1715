//! A `Wallet` is a wrapper around an ethers local wallet used as the Kernel account owner
use ethers::{
    prelude::{k256::ecdsa::SigningKey, rand},
    signers::{coins_bip39::English, LocalWallet, MnemonicBuilder, Signer},
    types::Address,
};
use expanded_pathbuf::ExpandedPathBuf;
use std::fs;

const DERIVATION_PATH: &str = "m/44'/60'/0'/0/0";

/// Wrapper around ethers wallet
#[derive(Clone, Debug)]
pub struct Wallet {
    /// Signing key of the wallet
    pub signer: ethers::signers::Wallet<SigningKey>,
}

impl Wallet {
    /// Builds a `Wallet` from a randomly generated mnemonic phrase
    ///
    /// # Arguments
    /// * `path` - The directory the mnemonic phrase will be written to
    /// * `chain_id` - The chain id of the blockchain network to be used
    pub fn build_random(path: ExpandedPathBuf, chain_id: u64) -> eyre::Result<Self> {
        let mut rng = rand::thread_rng();

        fs::create_dir_all(&path)?;

        let wallet = MnemonicBuilder::<English>::default()
            .write_to(path.to_path_buf())
            .derivation_path(DERIVATION_PATH)?
            .build_random(&mut rng)?;

        Ok(Self { signer: wallet.with_chain_id(chain_id) })
    }

    /// Create a new wallet from the given file containing the mnemonic phrase
    pub fn from_file(path: ExpandedPathBuf, chain_id: u64) -> eyre::Result<Self> {
        let wallet = MnemonicBuilder::<English>::default()
            .phrase(path.to_path_buf())
            .derivation_path(DERIVATION_PATH)?
            .build()?;

        Ok(Self { signer: wallet.with_chain_id(chain_id) })
    }

    /// Create a new wallet from the given mnemonic phrase
    pub fn from_phrase(phrase: &str, chain_id: u64) -> eyre::Result<Self> {
        let wallet = MnemonicBuilder::<English>::default()
            .phrase(phrase)
            .derivation_path(DERIVATION_PATH)?
            .build()?;

        Ok(Self { signer: wallet.with_chain_id(chain_id) })
    }

    /// Create a new wallet from a hex-encoded private key (with or without `0x` prefix)
    pub fn from_private_key(key: &str, chain_id: u64) -> eyre::Result<Self> {
        let wallet: LocalWallet = key.trim_start_matches("0x").parse()?;
        Ok(Self { signer: wallet.with_chain_id(chain_id) })
    }

    /// Address of the wallet
    pub fn address(&self) -> Address {
        self.signer.address()
    }
}

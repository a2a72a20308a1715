//! EIP-6492: signatures of contract accounts that are not deployed yet

use ethers::{
    abi::{self, ParamType, Token},
    types::{Address, Bytes},
};
use kernel_primitives::constants::eip6492::MAGIC_BYTES;

/// `abi.encode(factory, factoryCallData, signature) ‖ magic`
pub fn wrap(factory: Address, factory_call_data: &[u8], signature: &[u8]) -> Bytes {
    let encoded = abi::encode(&[
        Token::Address(factory),
        Token::Bytes(factory_call_data.to_vec()),
        Token::Bytes(signature.to_vec()),
    ]);
    [encoded.as_slice(), &MAGIC_BYTES].concat().into()
}

/// Whether the signature ends with the magic suffix
pub fn is_wrapped(signature: &[u8]) -> bool {
    signature.len() > MAGIC_BYTES.len() && signature.ends_with(&MAGIC_BYTES)
}

/// Splits a wrapped signature into (factory, factory call data, inner signature)
pub fn unwrap(signature: &[u8]) -> Option<(Address, Bytes, Bytes)> {
    if !is_wrapped(signature) {
        return None;
    }
    let encoded = &signature[..signature.len() - MAGIC_BYTES.len()];
    let mut tokens = abi::decode(&[ParamType::Address, ParamType::Bytes, ParamType::Bytes], encoded)
        .ok()?
        .into_iter();
    let factory = tokens.next()?.into_address()?;
    let call_data = tokens.next()?.into_bytes()?;
    let inner = tokens.next()?.into_bytes()?;
    Some((factory, call_data.into(), inner.into()))
}

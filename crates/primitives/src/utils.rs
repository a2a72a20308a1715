//! Misc utils

use ethers::{
    types::{Address, Bytes, U256},
    utils::to_checksum,
};

/// Converts address to checksum address
pub fn as_checksum_addr<S>(val: &Address, s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    s.serialize_str(&to_checksum(val, None))
}

/// Converts Option address to checksum
pub fn as_checksum_addr_opt<S>(val: &Option<Address>, s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    if let Some(addr) = val {
        s.serialize_str(&to_checksum(addr, None))
    } else {
        s.serialize_none()
    }
}

/// If possible, parses address from the first 20 bytes
pub fn get_address(buf: &[u8]) -> Option<Address> {
    if buf.len() >= 20 {
        Some(Address::from_slice(&buf[0..20]))
    } else {
        None
    }
}

/// Packs a timestamp into 6 big-endian bytes (solidity `uint48`), higher bytes are dropped
pub fn pack_uint48(val: u64) -> [u8; 6] {
    let mut res = [0u8; 6];
    res.copy_from_slice(&val.to_be_bytes()[2..8]);
    res
}

/// Unpacks a `uint48` from the first 6 bytes
pub fn unpack_uint48(buf: &[u8]) -> Option<u64> {
    if buf.len() < 6 {
        return None;
    }
    let mut tem = [0u8; 8];
    tem[2..8].copy_from_slice(&buf[0..6]);
    Some(u64::from_be_bytes(tem))
}

/// Packs a length prefix the way `abi.encodePacked(uint256(len))` does
pub fn pack_len(len: usize) -> [u8; 32] {
    let mut res = [0u8; 32];
    U256::from(len).to_big_endian(&mut res);
    res
}

/// Parses a message to be signed: `0x`-prefixed hex is taken as raw bytes, anything else as
/// UTF-8 text
pub fn parse_message(message: &str) -> Bytes {
    match message.parse::<Bytes>() {
        Ok(bytes) if message.starts_with("0x") => bytes,
        _ => Bytes::from(message.as_bytes().to_vec()),
    }
}

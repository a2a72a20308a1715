use dirs::home_dir;
use ethers::types::{Address, Bytes, U256};
use expanded_pathbuf::ExpandedPathBuf;
use kernel_primitives::UserOperationHash;
use kernel_provider::PaymasterPolicy;
use std::{str::FromStr, time::Duration};

/// Unwrap path or returns home directory
pub fn unwrap_path_or_home(path: Option<ExpandedPathBuf>) -> eyre::Result<ExpandedPathBuf> {
    if let Some(path) = path {
        Ok(path)
    } else {
        home_dir()
            .map(|h| h.join(".kernel"))
            .ok_or_else(|| eyre::eyre!("Get Home directory error"))
            .map(ExpandedPathBuf)
    }
}

/// Parses address from string
pub fn parse_address(s: &str) -> Result<Address, String> {
    Address::from_str(s).map_err(|_| format!("String {s} is not a valid address"))
}

/// Parses U256 from string (decimal or `0x` prefixed hex)
pub fn parse_u256(s: &str) -> Result<U256, String> {
    let res = match s.strip_prefix("0x") {
        Some(hex) => U256::from_str_radix(hex, 16).map_err(|_| ()),
        None => U256::from_dec_str(s).map_err(|_| ()),
    };
    res.map_err(|_| format!("String {s} is not a valid U256"))
}

/// Parses hex encoded bytes from string
pub fn parse_bytes(s: &str) -> Result<Bytes, String> {
    Bytes::from_str(s).map_err(|_| format!("String {s} is not valid hex data"))
}

/// Parses user operation hash from string
pub fn parse_user_operation_hash(s: &str) -> Result<UserOperationHash, String> {
    UserOperationHash::from_str(s).map_err(|_| format!("String {s} is not a valid hash"))
}

/// Parses PaymasterPolicy from string
pub fn parse_paymaster_policy(s: &str) -> Result<PaymasterPolicy, String> {
    PaymasterPolicy::from_str(s).map_err(|_| format!("String {s} is not a valid PaymasterPolicy"))
}

/// Parses duration in milliseconds
pub fn parse_duration(duration: &str) -> Result<Duration, String> {
    let millis: u64 = duration.parse().map_err(|_| format!("{duration} must be unsigned int"))?;
    Ok(Duration::from_millis(millis))
}

pub fn validate_private_key(hex_string: &str) -> Result<String, String> {
    let hex_string = hex_string.trim_start_matches("0x");

    if hex_string.len() != 64 || !hex_string.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("{hex_string} is not a valid private key"));
    }

    Ok(String::from(hex_string))
}

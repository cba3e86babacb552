//! Wallet address syntax. Addresses compare case-insensitively everywhere, so the
//! normalized form is trimmed lowercase.

use tiny_keccak::{Hasher, Keccak};

pub fn normalize_wallet_address(address: &str) -> String {
    address.trim().to_lowercase()
}

pub(crate) fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut output);
    output
}

/// `0x` + 40 hex digits. Mixed-case input must carry a valid EIP-55 checksum.
pub fn is_address(address: &str) -> bool {
    let Some(hex_part) = address.strip_prefix("0x") else {
        return false;
    };
    if hex_part.len() != 40 || !hex_part.bytes().all(|b| b.is_ascii_hexdigit()) {
        return false;
    }
    let has_lower = hex_part.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = hex_part.bytes().any(|b| b.is_ascii_uppercase());
    if !(has_lower && has_upper) {
        return true;
    }
    to_checksum_address(hex_part) == hex_part
}

fn to_checksum_address(hex_part: &str) -> String {
    let lower = hex_part.to_ascii_lowercase();
    let hash = keccak256(lower.as_bytes());
    lower
        .chars()
        .enumerate()
        .map(|(i, c)| {
            let shift = if i % 2 == 0 { 4 } else { 0 };
            let nibble = (hash[i / 2] >> shift) & 0x0f;
            if c.is_ascii_alphabetic() && nibble >= 8 {
                c.to_ascii_uppercase()
            } else {
                c
            }
        })
        .collect()
}

//! personal_sign (EIP-191) signature checks.

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};

use crate::address::keccak256;

/// The one cryptographic primitive the login flow leans on.
pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, address: &str, message: &str, signature: &str) -> bool;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Eip191Verifier;

impl SignatureVerifier for Eip191Verifier {
    fn verify(&self, address: &str, message: &str, signature: &str) -> bool {
        match recover_address(message, signature) {
            Some(recovered) => recovered.eq_ignore_ascii_case(address.trim()),
            None => false,
        }
    }
}

pub fn personal_message_hash(message: &str) -> [u8; 32] {
    let prefixed = format!("\x19Ethereum Signed Message:\n{}{}", message.len(), message);
    keccak256(prefixed.as_bytes())
}

pub fn address_of(key: &VerifyingKey) -> String {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    format!("0x{}", hex::encode(&hash[12..]))
}

/// Recovers the signer of `message`. `None` for anything that is not a well-formed
/// 65-byte `r || s || v` signature.
///
/// High-S signatures are accepted: `s` is folded into the lower half of the curve
/// order and the recovery parity flipped to match.
pub fn recover_address(message: &str, signature_hex: &str) -> Option<String> {
    let raw = signature_hex.trim();
    let bytes = hex::decode(raw.strip_prefix("0x").unwrap_or(raw)).ok()?;
    if bytes.len() != 65 {
        return None;
    }
    let (rs, v) = bytes.split_at(64);
    let mut odd = match v[0] {
        0 | 27 => false,
        1 | 28 => true,
        _ => return None,
    };
    let mut signature = Signature::from_slice(rs).ok()?;
    if let Some(low) = signature.normalize_s() {
        signature = low;
        odd = !odd;
    }
    let digest = personal_message_hash(message);
    let key =
        VerifyingKey::recover_from_prehash(&digest, &signature, RecoveryId::new(odd, false)).ok()?;
    Some(address_of(&key))
}

#[cfg(test)]
pub(crate) mod testing {
    use k256::ecdsa::SigningKey;
    use rand::rngs::OsRng;

    use super::*;

    pub struct TestWallet {
        key: SigningKey,
        pub address: String,
    }

    impl TestWallet {
        pub fn random() -> Self {
            let key = SigningKey::random(&mut OsRng);
            let address = address_of(key.verifying_key());
            Self { key, address }
        }

        pub fn sign(&self, message: &str) -> String {
            let digest = personal_message_hash(message);
            let (sig, recid) = self.key.sign_prehash_recoverable(&digest).unwrap();
            let mut bytes = sig.to_bytes().to_vec();
            bytes.push(recid.to_byte() + 27);
            format!("0x{}", hex::encode(bytes))
        }

        /// Same signature with `s` replaced by `n - s`.
        pub fn sign_high_s(&self, message: &str) -> String {
            let digest = personal_message_hash(message);
            let (sig, recid) = self.key.sign_prehash_recoverable(&digest).unwrap();
            let (r, s) = sig.split_scalars();
            let high = Signature::from_scalars(r.to_bytes(), (-*s).to_bytes()).unwrap();
            assert!(high.normalize_s().is_some());
            let mut bytes = high.to_bytes().to_vec();
            bytes.push((recid.to_byte() ^ 1) + 27);
            format!("0x{}", hex::encode(bytes))
        }
    }
}

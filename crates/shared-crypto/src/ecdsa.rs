//! # ECDSA Signatures (secp256k1)
//!
//! Recoverable ECDSA over secp256k1, the way Ethereum-compatible chains
//! use it.
//!
//! ## Security Properties
//!
//! - RFC 6979 deterministic nonces (no RNG dependency for signing)
//! - Low-S normalization on sign, low-S rejection on recover (EIP-2)
//! - Sender addresses are derived, never trusted from the wire
//!
//! ## Use Cases
//!
//! - Transaction signing and sender recovery (EIP-155)
//! - Attestation signing by committee members

use crate::errors::CryptoError;
use crate::hashing::keccak256;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use primitive_types::{H160, H256, U256};

/// Upper bound for the low-S half of the curve order (secp256k1 n / 2).
const SECP256K1_HALF_N: [u8; 32] = [
    0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xff, 0x5d, 0x57, 0x6e, 0x73, 0x57, 0xa4, 0x50, 0x1d, 0xdf, 0xe9, 0x2f, 0x46, 0x68, 0x1b,
    0x20, 0xa0,
];

/// A recoverable signature split into its wire components.
///
/// `recovery_id` is the raw y-parity (0 or 1); EIP-155 `v` encoding is the
/// caller's concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoverableSignature {
    pub r: U256,
    pub s: U256,
    pub recovery_id: u8,
}

impl RecoverableSignature {
    /// Pack into the 65-byte `r || s || recovery_id` form used by
    /// attestations.
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        self.r.to_big_endian(&mut out[0..32]);
        self.s.to_big_endian(&mut out[32..64]);
        out[64] = self.recovery_id;
        out
    }

    /// Parse the 65-byte `r || s || recovery_id` form.
    pub fn from_bytes(bytes: &[u8; 65]) -> Self {
        Self {
            r: U256::from_big_endian(&bytes[0..32]),
            s: U256::from_big_endian(&bytes[32..64]),
            recovery_id: bytes[64],
        }
    }
}

/// secp256k1 keypair for transaction and attestation signing.
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Create from secret key bytes (32 bytes).
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        let signing_key =
            SigningKey::from_bytes(bytes.into()).map_err(|_| CryptoError::InvalidPrivateKey)?;
        Ok(Self { signing_key })
    }

    /// The 20-byte address derived from the public key:
    /// last 20 bytes of Keccak-256 of the uncompressed point (without the
    /// 0x04 tag byte).
    pub fn address(&self) -> H160 {
        address_of(self.signing_key.verifying_key())
    }

    /// Sign a 32-byte prehash, returning a low-S recoverable signature.
    pub fn sign_hash(&self, prehash: &H256) -> Result<RecoverableSignature, CryptoError> {
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(prehash.as_bytes())
            .map_err(|_| CryptoError::InvalidSignature)?;

        // k256 already produces low-S signatures; normalize defensively in
        // case the backend changes.
        let (signature, recovery_id) = match signature.normalize_s() {
            Some(normalized) => {
                let flipped = RecoveryId::from_byte(recovery_id.to_byte() ^ 1)
                    .ok_or(CryptoError::RecoveryFailed)?;
                (normalized, flipped)
            }
            None => (signature, recovery_id),
        };

        let r = U256::from_big_endian(&signature.r().to_bytes());
        let s = U256::from_big_endian(&signature.s().to_bytes());
        Ok(RecoverableSignature {
            r,
            s,
            recovery_id: recovery_id.to_byte(),
        })
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        f.debug_struct("Keypair")
            .field("address", &self.address())
            .finish()
    }
}

/// Recover the signer address of a 32-byte prehash.
///
/// Rejects high-S signatures and recovery ids other than 0/1.
pub fn recover_address(
    prehash: &H256,
    r: &U256,
    s: &U256,
    recovery_id: u8,
) -> Result<H160, CryptoError> {
    if !is_low_s(s) {
        return Err(CryptoError::HighS);
    }
    if recovery_id > 1 {
        return Err(CryptoError::InvalidRecoveryId(recovery_id));
    }

    let mut r_bytes = [0u8; 32];
    let mut s_bytes = [0u8; 32];
    r.to_big_endian(&mut r_bytes);
    s.to_big_endian(&mut s_bytes);

    let signature = Signature::from_scalars(r_bytes, s_bytes)
        .map_err(|_| CryptoError::InvalidSignature)?;
    let recovery_id =
        RecoveryId::from_byte(recovery_id).ok_or(CryptoError::InvalidRecoveryId(recovery_id))?;

    let verifying_key = VerifyingKey::recover_from_prehash(prehash.as_bytes(), &signature, recovery_id)
        .map_err(|_| CryptoError::RecoveryFailed)?;

    Ok(address_of(&verifying_key))
}

/// Recover the signer of a 65-byte `r || s || recovery_id` signature.
pub fn recover_address_from_bytes(
    prehash: &H256,
    signature: &[u8; 65],
) -> Result<H160, CryptoError> {
    let sig = RecoverableSignature::from_bytes(signature);
    recover_address(prehash, &sig.r, &sig.s, sig.recovery_id)
}

/// True if `s` is in the lower half of the curve order (EIP-2).
pub fn is_low_s(s: &U256) -> bool {
    !s.is_zero() && *s <= U256::from_big_endian(&SECP256K1_HALF_N)
}

fn address_of(key: &VerifyingKey) -> H160 {
    let point = key.to_encoded_point(false);
    let digest = keccak256(&point.as_bytes()[1..]);
    H160::from_slice(&digest.as_bytes()[12..])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_keypair() -> Keypair {
        let mut secret = [0u8; 32];
        secret[31] = 7;
        Keypair::from_bytes(&secret).unwrap()
    }

    #[test]
    fn test_sign_recover_roundtrip() {
        let keypair = test_keypair();
        let message = keccak256(b"attest this");

        let sig = keypair.sign_hash(&message).unwrap();
        let recovered = recover_address(&message, &sig.r, &sig.s, sig.recovery_id).unwrap();

        assert_eq!(recovered, keypair.address());
    }

    #[test]
    fn test_recover_rejects_high_s() {
        let keypair = test_keypair();
        let message = keccak256(b"payload");
        let sig = keypair.sign_hash(&message).unwrap();

        // n - s is the malleable twin and must be rejected.
        let n = U256::from_big_endian(&SECP256K1_HALF_N) * 2u64 + 1u64;
        let high_s = n - sig.s;
        let result = recover_address(&message, &sig.r, &high_s, sig.recovery_id);
        assert_eq!(result, Err(CryptoError::HighS));
    }

    #[test]
    fn test_recover_rejects_bad_recovery_id() {
        let keypair = test_keypair();
        let message = keccak256(b"payload");
        let sig = keypair.sign_hash(&message).unwrap();

        let result = recover_address(&message, &sig.r, &sig.s, 4);
        assert_eq!(result, Err(CryptoError::InvalidRecoveryId(4)));
    }

    #[test]
    fn test_signature_bytes_roundtrip() {
        let keypair = test_keypair();
        let message = keccak256(b"bytes");
        let sig = keypair.sign_hash(&message).unwrap();

        let packed = sig.to_bytes();
        assert_eq!(RecoverableSignature::from_bytes(&packed), sig);

        let recovered = recover_address_from_bytes(&message, &packed).unwrap();
        assert_eq!(recovered, keypair.address());
    }

    #[test]
    fn test_wrong_message_recovers_different_address() {
        let keypair = test_keypair();
        let sig = keypair.sign_hash(&keccak256(b"one")).unwrap();

        let other = keccak256(b"two");
        let recovered = recover_address(&other, &sig.r, &sig.s, sig.recovery_id);
        // Recovery either fails or yields some other address; it must never
        // attribute the signature to the real signer.
        if let Ok(addr) = recovered {
            assert_ne!(addr, keypair.address());
        }
    }
}

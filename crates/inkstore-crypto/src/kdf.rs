//! Password-based key derivation.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

use crate::error::CryptoError;

/// Default PBKDF2 iteration count.
pub const DEFAULT_KDF_ITERATIONS: u32 = 100_000;

/// Cipher key length. Both sizes occur in deployed stores, so the length is
/// configuration, not a constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyLength {
    Bits128,
    Bits256,
}

impl KeyLength {
    pub fn from_bits(bits: u32) -> Result<Self, CryptoError> {
        match bits {
            128 => Ok(Self::Bits128),
            256 => Ok(Self::Bits256),
            other => Err(CryptoError::UnsupportedKeyLength(other)),
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            Self::Bits128 => 128,
            Self::Bits256 => 256,
        }
    }

    pub fn byte_len(self) -> usize {
        (self.bits() / 8) as usize
    }
}

/// Derive a symmetric key from a password and salt.
///
/// PBKDF2-HMAC-SHA256, output sized to the cipher key length. Deterministic:
/// the same `(password, salt, iterations)` always yields the same key.
pub fn derive_key(
    password: &str,
    salt: &[u8],
    iterations: u32,
    key_length: KeyLength,
) -> Vec<u8> {
    let mut key = vec![0u8; key_length.byte_len()];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut key);
    key
}

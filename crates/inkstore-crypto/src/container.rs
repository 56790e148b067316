//! On-disk container layout and offset arithmetic.
//!
//! `salt(16) ‖ iv(16) ‖ ciphertext`. One container per logical page; the
//! arithmetic here translates plaintext byte offsets into ciphertext offsets
//! and counter values.

use std::io;

use rand::rngs::OsRng;
use rand::RngCore;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::CryptoError;

pub const SALT_LEN: usize = 16;
pub const IV_LEN: usize = 16;
/// Header length in bytes: salt followed by iv.
pub const HEADER_LEN: u64 = (SALT_LEN + IV_LEN) as u64;
/// Cipher block length in bytes (128-bit blocks).
pub const BLOCK_LEN: u64 = 16;

/// The `salt ‖ iv` prefix of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    pub salt: [u8; SALT_LEN],
    pub iv: [u8; IV_LEN],
}

impl ContainerHeader {
    /// Fresh random header from the OS entropy source.
    pub fn generate() -> Self {
        let mut salt = [0u8; SALT_LEN];
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut salt);
        OsRng.fill_bytes(&mut iv);
        Self { salt, iv }
    }

    pub fn to_bytes(&self) -> [u8; HEADER_LEN as usize] {
        let mut out = [0u8; HEADER_LEN as usize];
        out[..SALT_LEN].copy_from_slice(&self.salt);
        out[SALT_LEN..].copy_from_slice(&self.iv);
        out
    }

    pub fn from_bytes(bytes: &[u8; HEADER_LEN as usize]) -> Self {
        let mut salt = [0u8; SALT_LEN];
        let mut iv = [0u8; IV_LEN];
        salt.copy_from_slice(&bytes[..SALT_LEN]);
        iv.copy_from_slice(&bytes[SALT_LEN..]);
        Self { salt, iv }
    }
}

/// Read the 32-byte header from the start of a container stream.
///
/// A short read is a `CorruptHeader`, not a generic I/O error.
pub async fn read_header<R>(reader: &mut R) -> Result<ContainerHeader, CryptoError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut buf = [0u8; HEADER_LEN as usize];
    reader.read_exact(&mut buf).await.map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            CryptoError::CorruptHeader
        } else {
            CryptoError::Io(e)
        }
    })?;
    Ok(ContainerHeader::from_bytes(&buf))
}

/// Plaintext length of a container given its total on-disk length.
pub fn plaintext_len(container_len: u64) -> u64 {
    container_len.saturating_sub(HEADER_LEN)
}

/// Counter block for plaintext block `index`.
///
/// The iv is interpreted as a 128-bit big-endian integer and incremented by
/// the block index; the result is re-encoded as exactly 16 bytes, wrapping
/// modulo 2^128 (a sum that would need more than 16 bytes keeps only the low
/// 16, and smaller values are left-padded with zero).
pub fn counter_block(iv: &[u8; IV_LEN], index: u64) -> [u8; IV_LEN] {
    u128::from_be_bytes(*iv)
        .wrapping_add(index as u128)
        .to_be_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_byte_roundtrip() {
        let header = ContainerHeader::generate();
        let parsed = ContainerHeader::from_bytes(&header.to_bytes());
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_generate_uses_fresh_material() {
        let a = ContainerHeader::generate();
        let b = ContainerHeader::generate();
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.iv, b.iv);
    }

    #[tokio::test]
    async fn test_read_header_short_input_is_corrupt() {
        let short = [0u8; 10];
        let err = read_header(&mut &short[..]).await.unwrap_err();
        assert!(matches!(err, CryptoError::CorruptHeader));
    }

    #[test]
    fn test_plaintext_len_never_underflows() {
        assert_eq!(plaintext_len(0), 0);
        assert_eq!(plaintext_len(10), 0);
        assert_eq!(plaintext_len(32), 0);
        assert_eq!(plaintext_len(33), 1);
        assert_eq!(plaintext_len(1056), 1024);
    }

    #[test]
    fn test_counter_block_simple_increment() {
        let mut iv = [0u8; IV_LEN];
        iv[15] = 1;
        let counter = counter_block(&iv, 2);
        let mut expected = [0u8; IV_LEN];
        expected[15] = 3;
        assert_eq!(counter, expected);
    }

    #[test]
    fn test_counter_block_carries_across_bytes() {
        let mut iv = [0u8; IV_LEN];
        iv[15] = 0xff;
        let counter = counter_block(&iv, 1);
        let mut expected = [0u8; IV_LEN];
        expected[14] = 1;
        assert_eq!(counter, expected);
    }

    #[test]
    fn test_counter_block_wraps_at_128_bits() {
        // A naive big-integer encoding of ff..ff + 1 needs 17 bytes; the
        // counter keeps only the low 16.
        let iv = [0xffu8; IV_LEN];
        assert_eq!(counter_block(&iv, 1), [0u8; IV_LEN]);

        let counter = counter_block(&iv, 5);
        let mut expected = [0u8; IV_LEN];
        expected[15] = 4;
        assert_eq!(counter, expected);
    }
}

//! Crypto operation errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    /// Container shorter than the 32-byte `salt ‖ iv` header. Distinct from
    /// `Io` so callers can tell truncation from transient read failures.
    #[error("container is shorter than the 32-byte header")]
    CorruptHeader,

    #[error("invalid plaintext range {start}..={end}")]
    InvalidRange { start: u64, end: u64 },

    #[error("unsupported key length: {0} bits")]
    UnsupportedKeyLength(u32),

    #[error("invalid key or iv length")]
    InvalidKey,

    #[error("keystream seek failed: {0}")]
    Seek(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

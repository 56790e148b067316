//! Inkstore Crypto Library
//!
//! Stream-cipher engine and on-disk container format for encrypted blobs.
//!
//! # Container format
//!
//! Every container is laid out as `salt(16) ‖ iv(16) ‖ ciphertext`. The key
//! is derived from a password and the salt with PBKDF2-HMAC-SHA256; the
//! ciphertext is AES in counter mode with the iv as the initial counter
//! block. Counter mode makes arbitrary-offset decryption possible without
//! processing preceding blocks: the keystream position for plaintext byte
//! `n` is the iv (as a 128-bit big-endian integer) plus `n / 16`, wrapping
//! modulo 2^128.
//!
//! No integrity tag is appended; tampering with ciphertext is not detected.

mod cipher;
pub mod container;
pub mod error;
pub mod kdf;
pub mod stream;

pub use container::{
    counter_block, plaintext_len, read_header, ContainerHeader, BLOCK_LEN, HEADER_LEN, IV_LEN,
    SALT_LEN,
};
pub use error::CryptoError;
pub use kdf::{derive_key, KeyLength, DEFAULT_KDF_ITERATIONS};
pub use stream::{decrypt_stream, encrypt_stream, open_range, DecryptReader, EncryptOptions};

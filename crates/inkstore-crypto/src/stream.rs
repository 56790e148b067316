//! Streaming encryption and decryption over the container format.
//!
//! Encryption and full decryption work on any async byte stream in fixed
//! 8 KiB chunks; nothing buffers the whole payload. Random access
//! (`open_range`) additionally needs a seekable source so the ciphertext can
//! be skipped forward without reading it.

use std::io::{self, SeekFrom};
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use tokio::io::{
    AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt, AsyncWrite, AsyncWriteExt, ReadBuf, Take,
};

use crate::cipher::CtrCipher;
use crate::container::{plaintext_len, read_header, ContainerHeader, HEADER_LEN};
use crate::error::CryptoError;
use crate::kdf::{derive_key, KeyLength, DEFAULT_KDF_ITERATIONS};

/// Chunk size for streaming encryption and decryption.
const CHUNK_LEN: usize = 8 * 1024;

/// Key-derivation parameters for one container operation.
#[derive(Debug, Clone, Copy)]
pub struct EncryptOptions {
    pub key_length: KeyLength,
    pub iterations: u32,
}

impl Default for EncryptOptions {
    fn default() -> Self {
        Self {
            key_length: KeyLength::Bits256,
            iterations: DEFAULT_KDF_ITERATIONS,
        }
    }
}

/// Lazy plaintext stream over a container's ciphertext.
///
/// Finite and not restartable: once consumed, re-decryption requires
/// reopening the container. The underlying source is released when the
/// reader is dropped, whether the stream completed, failed, or was
/// cancelled early.
pub struct DecryptReader<R> {
    inner: R,
    cipher: CtrCipher,
}

impl<R> std::fmt::Debug for DecryptReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecryptReader").finish_non_exhaustive()
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for DecryptReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let pre = buf.filled().len();
        ready!(Pin::new(&mut this.inner).poll_read(cx, buf))?;
        this.cipher.apply_keystream(&mut buf.filled_mut()[pre..]);
        Poll::Ready(Ok(()))
    }
}

/// Encrypt a plaintext stream into a container.
///
/// Generates a fresh random `salt ‖ iv` header, writes it, then streams the
/// ciphertext. Returns the plaintext byte count. The writer is flushed but
/// not closed.
pub async fn encrypt_stream<R, W>(
    reader: &mut R,
    writer: &mut W,
    password: &str,
    opts: &EncryptOptions,
) -> Result<u64, CryptoError>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    encrypt_stream_with_header(reader, writer, password, opts, ContainerHeader::generate()).await
}

/// Deterministic variant taking explicit header material.
pub(crate) async fn encrypt_stream_with_header<R, W>(
    reader: &mut R,
    writer: &mut W,
    password: &str,
    opts: &EncryptOptions,
    header: ContainerHeader,
) -> Result<u64, CryptoError>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let key = derive_key(password, &header.salt, opts.iterations, opts.key_length);
    let mut cipher = CtrCipher::new(&key, &header.iv)?;

    writer.write_all(&header.to_bytes()).await?;

    let mut buf = vec![0u8; CHUNK_LEN];
    let mut total = 0u64;
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        cipher.apply_keystream(&mut buf[..n]);
        writer.write_all(&buf[..n]).await?;
        total += n as u64;
    }
    writer.flush().await?;

    Ok(total)
}

/// Open a container for full sequential decryption.
///
/// Reads the 32-byte header (truncated containers fail with
/// `CorruptHeader`), derives the key, and returns a lazy plaintext reader
/// over the remainder of the stream.
pub async fn decrypt_stream<R>(
    mut reader: R,
    password: &str,
    opts: &EncryptOptions,
) -> Result<DecryptReader<R>, CryptoError>
where
    R: AsyncRead + Unpin,
{
    let header = read_header(&mut reader).await?;
    let key = derive_key(password, &header.salt, opts.iterations, opts.key_length);
    let cipher = CtrCipher::new(&key, &header.iv)?;
    Ok(DecryptReader {
        inner: reader,
        cipher,
    })
}

/// Open a container for random-access decryption of `start..=end`.
///
/// The inverted-range case fails before any I/O. `end` is clamped to the
/// last plaintext byte; `start` at or past the plaintext length is an
/// `InvalidRange`. The ciphertext source is repositioned with a seek (no
/// read-and-discard) and the keystream is repositioned to the matching
/// block; the returned reader yields exactly `end - start + 1` bytes.
pub async fn open_range<R>(
    mut reader: R,
    password: &str,
    opts: &EncryptOptions,
    start: u64,
    end: u64,
) -> Result<DecryptReader<Take<R>>, CryptoError>
where
    R: AsyncRead + AsyncSeek + Unpin,
{
    if end < start {
        return Err(CryptoError::InvalidRange { start, end });
    }

    let container_len = reader.seek(SeekFrom::End(0)).await?;
    let plain_len = plaintext_len(container_len);
    if start >= plain_len {
        return Err(CryptoError::InvalidRange { start, end });
    }
    let end = end.min(plain_len - 1);

    reader.seek(SeekFrom::Start(0)).await?;
    let header = read_header(&mut reader).await?;
    let key = derive_key(password, &header.salt, opts.iterations, opts.key_length);
    let mut cipher = CtrCipher::new(&key, &header.iv)?;

    reader.seek(SeekFrom::Start(HEADER_LEN + start)).await?;
    cipher.seek(start)?;

    Ok(DecryptReader {
        inner: reader.take(end - start + 1),
        cipher,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::IV_LEN;
    use std::io::Cursor;

    fn test_opts() -> EncryptOptions {
        EncryptOptions {
            key_length: KeyLength::Bits256,
            iterations: 2048,
        }
    }

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 31 + 7) as u8).collect()
    }

    async fn encrypt(plaintext: &[u8], password: &str, opts: &EncryptOptions) -> Vec<u8> {
        let mut container = Cursor::new(Vec::new());
        let written = encrypt_stream(&mut &plaintext[..], &mut container, password, opts)
            .await
            .unwrap();
        assert_eq!(written, plaintext.len() as u64);
        container.into_inner()
    }

    async fn decrypt_all(container: &[u8], password: &str, opts: &EncryptOptions) -> Vec<u8> {
        let mut reader = decrypt_stream(Cursor::new(container.to_vec()), password, opts)
            .await
            .unwrap();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        out
    }

    #[tokio::test]
    async fn test_roundtrip_across_sizes() {
        let opts = test_opts();
        for len in [0usize, 1, 15, 16, 17, 100, 8192, 20_000] {
            let plaintext = pattern(len);
            let container = encrypt(&plaintext, "pw", &opts).await;
            assert_eq!(container.len() as u64, HEADER_LEN + len as u64);
            assert_eq!(decrypt_all(&container, "pw", &opts).await, plaintext);
        }
    }

    #[tokio::test]
    async fn test_roundtrip_128_bit_key() {
        let opts = EncryptOptions {
            key_length: KeyLength::Bits128,
            iterations: 2048,
        };
        let plaintext = pattern(1000);
        let container = encrypt(&plaintext, "pw", &opts).await;
        assert_eq!(decrypt_all(&container, "pw", &opts).await, plaintext);
    }

    #[tokio::test]
    async fn test_ciphertext_differs_from_plaintext() {
        let opts = test_opts();
        let plaintext = pattern(256);
        let container = encrypt(&plaintext, "pw", &opts).await;
        assert_ne!(&container[HEADER_LEN as usize..], &plaintext[..]);
    }

    #[tokio::test]
    async fn test_wrong_password_does_not_reproduce_plaintext() {
        let opts = test_opts();
        let plaintext = pattern(512);
        let container = encrypt(&plaintext, "correct", &opts).await;
        assert_ne!(decrypt_all(&container, "wrong", &opts).await, plaintext);
    }

    #[tokio::test]
    async fn test_fresh_headers_give_distinct_ciphertext() {
        let opts = test_opts();
        let plaintext = pattern(64);
        let a = encrypt(&plaintext, "pw", &opts).await;
        let b = encrypt(&plaintext, "pw", &opts).await;
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_truncated_container_is_corrupt_not_io() {
        let opts = test_opts();
        let err = decrypt_stream(Cursor::new(vec![0u8; 10]), "pw", &opts)
            .await
            .unwrap_err();
        assert!(matches!(err, CryptoError::CorruptHeader));
    }

    #[tokio::test]
    async fn test_open_range_exact_window() {
        let opts = test_opts();
        let plaintext = pattern(100);
        let container = encrypt(&plaintext, "pw", &opts).await;

        let mut reader = open_range(Cursor::new(container), "pw", &opts, 40, 59)
            .await
            .unwrap();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        assert_eq!(out.len(), 20);
        assert_eq!(out, &plaintext[40..60]);
    }

    #[tokio::test]
    async fn test_open_range_windows_across_block_boundaries() {
        let opts = test_opts();
        let plaintext = pattern(200);
        let container = encrypt(&plaintext, "pw", &opts).await;

        for (start, end) in [(0u64, 0u64), (0, 199), (15, 16), (16, 31), (17, 170)] {
            let mut reader = open_range(Cursor::new(container.clone()), "pw", &opts, start, end)
                .await
                .unwrap();
            let mut out = Vec::new();
            reader.read_to_end(&mut out).await.unwrap();
            assert_eq!(out, &plaintext[start as usize..=end as usize]);
        }
    }

    #[tokio::test]
    async fn test_open_range_clamps_end_to_plaintext_length() {
        let opts = test_opts();
        let plaintext = pattern(100);
        let container = encrypt(&plaintext, "pw", &opts).await;

        let mut reader = open_range(Cursor::new(container), "pw", &opts, 90, 5000)
            .await
            .unwrap();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, &plaintext[90..]);
    }

    #[tokio::test]
    async fn test_open_range_rejects_invalid_ranges() {
        let opts = test_opts();
        let plaintext = pattern(100);
        let container = encrypt(&plaintext, "pw", &opts).await;

        let err = open_range(Cursor::new(container.clone()), "pw", &opts, 100, 120)
            .await
            .unwrap_err();
        assert!(matches!(err, CryptoError::InvalidRange { .. }));

        let err = open_range(Cursor::new(container), "pw", &opts, 10, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, CryptoError::InvalidRange { start: 10, end: 5 }));
    }

    #[tokio::test]
    async fn test_decryption_across_counter_wrap() {
        // iv = ff..ff: block 0 uses the all-ones counter, block 1 wraps to
        // zero. Both full and range decryption must cross the wrap cleanly.
        let opts = test_opts();
        let header = ContainerHeader {
            salt: [0x42; crate::container::SALT_LEN],
            iv: [0xff; IV_LEN],
        };
        let plaintext = pattern(64);
        let mut container = Cursor::new(Vec::new());
        encrypt_stream_with_header(&mut &plaintext[..], &mut container, "pw", &opts, header)
            .await
            .unwrap();
        let container = container.into_inner();

        assert_eq!(decrypt_all(&container, "pw", &opts).await, plaintext);

        let mut reader = open_range(Cursor::new(container), "pw", &opts, 10, 40)
            .await
            .unwrap();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, &plaintext[10..=40]);
    }

    #[tokio::test]
    async fn test_early_abort_releases_source() {
        let opts = test_opts();
        let plaintext = pattern(20_000);
        let container = encrypt(&plaintext, "pw", &opts).await;

        let mut reader = decrypt_stream(Cursor::new(container), "pw", &opts)
            .await
            .unwrap();
        let mut first = [0u8; 100];
        reader.read_exact(&mut first).await.unwrap();
        assert_eq!(&first[..], &plaintext[..100]);
        drop(reader); // source dropped with it; nothing left open
    }
}

//! Whole-container encryption and decryption
//!
//! Encrypt: fresh salt → derive key → header → per-chunk fresh nonce + seal → frames.
//! Decrypt: header → re-derive key → walk frames → open each → truncate to `fileSize`.

use std::io::{Read, Write};

use secrecy::SecretString;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::chunk::{decrypt_chunk, encrypt_chunk, generate_nonce};
use crate::error::{ContainerError, ContainerResult};
use crate::frame::{decode_chunk_frame, encode_chunk_frame, ChunkFrame, FRAME_HEADER_SIZE};
use crate::header::{decode_header, encode_header, Header};
use crate::kdf::{derive_key, generate_salt};
use crate::{LEN_PREFIX_SIZE, MAX_ITERATIONS, TAG_SIZE};

/// Fractional progress callback, invoked synchronously after each chunk.
pub type ProgressFn = Box<dyn Fn(f64) + Send + Sync>;

pub const DEFAULT_ITERATIONS: u32 = 200_000;
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;
pub const DEFAULT_SALT_LEN: usize = 16;
pub const MIN_SALT_LEN: usize = 8;
pub const MAX_SALT_LEN: usize = 64;

/// Encryption parameters recorded in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncryptOptions {
    /// PBKDF2 iteration count
    pub iterations: u32,
    /// Plaintext bytes per chunk
    pub chunk_size: usize,
    /// Random salt length in bytes
    pub salt_len: usize,
}

impl Default for EncryptOptions {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            chunk_size: DEFAULT_CHUNK_SIZE,
            salt_len: DEFAULT_SALT_LEN,
        }
    }
}

impl EncryptOptions {
    pub fn validate(&self) -> ContainerResult<()> {
        if self.iterations == 0 || self.iterations > MAX_ITERATIONS {
            return Err(ContainerError::InvalidOptions(format!(
                "iterations {} outside 1..={MAX_ITERATIONS}",
                self.iterations
            )));
        }
        // Sealed chunk length must fit the 32-bit frame length field.
        let max_chunk = u32::MAX as u64 - TAG_SIZE as u64;
        if self.chunk_size == 0 || self.chunk_size as u64 > max_chunk {
            return Err(ContainerError::InvalidOptions(format!(
                "chunk size {} outside 1..={max_chunk}",
                self.chunk_size
            )));
        }
        if !(MIN_SALT_LEN..=MAX_SALT_LEN).contains(&self.salt_len) {
            return Err(ContainerError::InvalidOptions(format!(
                "salt length {} outside {MIN_SALT_LEN}..={MAX_SALT_LEN}",
                self.salt_len
            )));
        }
        Ok(())
    }
}

/// Result of a successful decryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedFile {
    pub file_name: String,
    pub data: Vec<u8>,
}

/// Header and framing summary, obtained without the password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInfo {
    pub header: Header,
    /// Length of the header record, excluding the 4-byte prefix
    pub header_len: usize,
    /// Number of chunk frames present
    pub frames: usize,
    /// Total sealed bytes (ciphertext + tags) across all frames
    pub ciphertext_bytes: u64,
}

/// Per-chunk associated data: the exact header bytes (prefix included)
/// followed by the chunk index, 8 bytes LE.
struct ChunkAad {
    buf: Vec<u8>,
    base_len: usize,
}

impl ChunkAad {
    fn new(header_with_prefix: &[u8]) -> Self {
        let mut buf = Vec::with_capacity(header_with_prefix.len() + 8);
        buf.extend_from_slice(header_with_prefix);
        Self {
            base_len: buf.len(),
            buf,
        }
    }

    fn for_chunk(&mut self, index: u64) -> &[u8] {
        self.buf.truncate(self.base_len);
        self.buf.extend_from_slice(&index.to_le_bytes());
        &self.buf
    }
}

/// Encrypt an in-memory file into a complete container.
pub fn encrypt(
    data: &[u8],
    file_name: &str,
    password: &SecretString,
    progress: Option<&ProgressFn>,
    options: &EncryptOptions,
) -> ContainerResult<Vec<u8>> {
    options.validate()?;
    let chunks = (data.len() as u64).div_ceil(options.chunk_size as u64) as usize;
    let mut out = Vec::with_capacity(256 + data.len() + chunks * (FRAME_HEADER_SIZE + TAG_SIZE));
    let mut reader = data;
    encrypt_to_writer(
        &mut reader,
        data.len() as u64,
        file_name,
        password,
        progress,
        options,
        &mut out,
    )?;
    Ok(out)
}

/// Encrypt `file_size` bytes from `reader` into `writer`, one chunk at a time.
///
/// Only one chunk of plaintext is held in memory. The reader must yield at
/// least `file_size` bytes. On error the writer may hold a partial
/// container; callers writing to disk should stage into a temporary file.
/// Returns the number of container bytes written.
pub fn encrypt_to_writer<R: Read, W: Write>(
    reader: &mut R,
    file_size: u64,
    file_name: &str,
    password: &SecretString,
    progress: Option<&ProgressFn>,
    options: &EncryptOptions,
    writer: &mut W,
) -> ContainerResult<u64> {
    options.validate()?;

    let salt = generate_salt(options.salt_len);
    let key = derive_key(password, &salt, options.iterations);

    let header = Header::new(
        &salt,
        options.iterations,
        options.chunk_size as u64,
        file_name,
        file_size,
    );
    let (prefix, header_bytes) = encode_header(&header)?;
    writer.write_all(&prefix)?;
    writer.write_all(&header_bytes)?;
    let mut written = (LEN_PREFIX_SIZE + header_bytes.len()) as u64;

    debug!(
        file_size,
        chunk_size = options.chunk_size,
        iterations = options.iterations,
        chunks = header.expected_chunks(),
        "encrypting container"
    );

    let mut aad = ChunkAad::new(&[prefix.as_slice(), header_bytes.as_slice()].concat());
    let buf_len = (options.chunk_size as u64).min(file_size) as usize;
    let mut plaintext = Zeroizing::new(vec![0u8; buf_len]);
    let mut frame = Vec::with_capacity(FRAME_HEADER_SIZE + buf_len + TAG_SIZE);

    let mut processed = 0u64;
    let mut index = 0u64;
    while processed < file_size {
        let len = (options.chunk_size as u64).min(file_size - processed) as usize;
        let chunk = &mut plaintext[..len];
        reader.read_exact(chunk)?;

        let nonce = generate_nonce();
        let sealed = encrypt_chunk(&key, &nonce, aad.for_chunk(index), chunk)?;

        frame.clear();
        encode_chunk_frame(&nonce, &sealed, &mut frame)?;
        writer.write_all(&frame)?;
        written += frame.len() as u64;

        processed += len as u64;
        index += 1;
        if let Some(cb) = progress {
            cb(processed as f64 / file_size as f64);
        }
    }
    writer.flush()?;

    info!(file_size, chunks = index, bytes = written, "container encrypted");
    Ok(written)
}

/// Decrypt a complete container, returning the stored file name and data.
///
/// All-or-nothing: any framing, header, or authentication failure aborts
/// and no plaintext is returned.
pub fn decrypt(
    container: &[u8],
    password: &SecretString,
    progress: Option<&ProgressFn>,
) -> ContainerResult<DecryptedFile> {
    let (header, header_len) = decode_header(container)?;
    let body_start = LEN_PREFIX_SIZE + header_len;

    // Framing is checked for the whole buffer before the (slow) key derivation.
    let frames = read_frames(container, body_start)?;
    let expected = header.expected_chunks();
    if (frames.len() as u64) < expected {
        return Err(ContainerError::MalformedHeader(format!(
            "header declares {} bytes in {expected} chunks but only {} frames are present",
            header.file_size,
            frames.len()
        )));
    }

    debug!(
        file_size = header.file_size,
        chunk_size = header.chunk_size,
        iterations = header.iterations,
        frames = frames.len(),
        "decrypting container"
    );

    let salt = header.salt()?;
    let key = derive_key(password, &salt, header.iterations);
    let mut aad = ChunkAad::new(&container[..body_start]);

    let capacity = header.file_size.min(container.len() as u64) as usize;
    let mut plaintext = Zeroizing::new(Vec::with_capacity(capacity));

    for (index, frame) in frames.iter().enumerate() {
        let chunk = decrypt_chunk(
            &key,
            &frame.nonce,
            aad.for_chunk(index as u64),
            frame.ciphertext,
        )
        .map_err(|e| {
            warn!(chunk = index, "chunk authentication failed");
            e
        })?;
        let chunk = Zeroizing::new(chunk);
        plaintext.extend_from_slice(&chunk);

        if let Some(cb) = progress {
            cb(fraction(plaintext.len() as u64, header.file_size));
        }
    }

    if (plaintext.len() as u64) < header.file_size {
        return Err(ContainerError::MalformedHeader(format!(
            "header declares {} bytes but only {} were decrypted",
            header.file_size,
            plaintext.len()
        )));
    }
    plaintext.truncate(header.file_size as usize);

    info!(
        file_size = header.file_size,
        chunks = frames.len(),
        "container decrypted"
    );
    Ok(DecryptedFile {
        file_name: header.file_name,
        data: std::mem::take(&mut *plaintext),
    })
}

/// Decode the header and frame boundaries without deriving a key.
pub fn inspect(container: &[u8]) -> ContainerResult<ContainerInfo> {
    let (header, header_len) = decode_header(container)?;
    let frames = read_frames(container, LEN_PREFIX_SIZE + header_len)?;
    let ciphertext_bytes = frames.iter().map(|f| f.ciphertext.len() as u64).sum();

    Ok(ContainerInfo {
        header,
        header_len,
        frames: frames.len(),
        ciphertext_bytes,
    })
}

fn read_frames(container: &[u8], mut offset: usize) -> ContainerResult<Vec<ChunkFrame<'_>>> {
    let mut frames = Vec::new();
    while offset < container.len() {
        let (frame, next) = decode_chunk_frame(container, offset)?;
        frames.push(frame);
        offset = next;
    }
    Ok(frames)
}

fn fraction(done: u64, total: u64) -> f64 {
    if total == 0 {
        1.0
    } else {
        (done as f64 / total as f64).min(1.0)
    }
}

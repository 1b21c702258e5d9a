//! pwseal-crypto: password-based, chunked, authenticated file containers
//!
//! Pipeline: password + random salt → PBKDF2-HMAC-SHA256 → AES-256-GCM per chunk
//!
//! Container layout (all integers little-endian):
//! ```text
//! [4 bytes: header length]
//! [header length bytes: JSON header record]
//! repeat until end of buffer:
//!   [12 bytes: random nonce]
//!   [4 bytes: ciphertext length]
//!   [ciphertext length bytes: ciphertext || 16-byte GCM tag]
//! ```
//!
//! Each chunk is sealed with AAD = header length prefix || header bytes ||
//! chunk index (8 bytes LE), so header tampering and chunk reordering fail
//! authentication.

pub mod chunk;
pub mod error;
pub mod frame;
pub mod header;
pub mod kdf;
pub mod stream;

pub use chunk::{decrypt_chunk, encrypt_chunk, generate_nonce};
pub use error::{ContainerError, ContainerResult};
pub use frame::{decode_chunk_frame, encode_chunk_frame, ChunkFrame};
pub use header::{decode_header, encode_header, Header};
pub use kdf::{derive_key, generate_salt, DerivedKey};
pub use stream::{
    decrypt, encrypt, encrypt_to_writer, inspect, ContainerInfo, DecryptedFile, EncryptOptions,
    ProgressFn,
};

/// Size of a derived AES-256 key in bytes
pub const KEY_SIZE: usize = 32;

/// Size of an AES-GCM nonce (96-bit)
pub const NONCE_SIZE: usize = 12;

/// Size of a GCM authentication tag
pub const TAG_SIZE: usize = 16;

/// Size of the little-endian length prefixes (header and ciphertext)
pub const LEN_PREFIX_SIZE: usize = 4;

/// Container format version written into every header
pub const FORMAT_VERSION: u32 = 1;

/// Algorithm tag written into every header
pub const ALGORITHM: &str = "AES-GCM";

/// Upper bound on PBKDF2 iterations accepted from options or headers
pub const MAX_ITERATIONS: u32 = 10_000_000;

//! Per-chunk AES-256-GCM encryption/decryption
//!
//! Sealed chunk layout (before framing):
//! ```text
//! [N bytes: ciphertext][16 bytes: GCM tag]
//! ```
//!
//! The nonce travels in the frame, not in the sealed bytes. The caller
//! supplies the AAD (see `stream::chunk_aad`).

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use rand::RngCore;

use crate::error::{ContainerError, ContainerResult};
use crate::kdf::DerivedKey;
use crate::NONCE_SIZE;

/// Generate a fresh random 96-bit nonce.
pub fn generate_nonce() -> [u8; NONCE_SIZE] {
    let mut nonce = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce);
    nonce
}

/// Encrypt a single chunk with AES-256-GCM.
///
/// Returns: `[ciphertext][16-byte tag]`
pub fn encrypt_chunk(
    key: &DerivedKey,
    nonce: &[u8; NONCE_SIZE],
    aad: &[u8],
    plaintext: &[u8],
) -> ContainerResult<Vec<u8>> {
    let cipher = Aes256Gcm::new(key.as_bytes().into());

    cipher
        .encrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|e| ContainerError::Encryption(format!("chunk encryption failed: {e}")))
}

/// Authenticate and decrypt a single chunk.
///
/// Any tag mismatch (wrong key, altered ciphertext, altered AAD) is reported
/// as `WrongPasswordOrCorruptData`.
pub fn decrypt_chunk(
    key: &DerivedKey,
    nonce: &[u8; NONCE_SIZE],
    aad: &[u8],
    ciphertext: &[u8],
) -> ContainerResult<Vec<u8>> {
    let cipher = Aes256Gcm::new(key.as_bytes().into());

    cipher
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|_| ContainerError::WrongPasswordOrCorruptData)
}

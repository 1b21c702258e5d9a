use thiserror::Error;

pub type ContainerResult<T> = Result<T, ContainerError>;

/// Failures raised while building or opening a container.
///
/// Every variant aborts the whole operation; no partial output is returned.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// Header missing fields, wrong types, inconsistent length prefix,
    /// unsupported version/algorithm, or a declared size that disagrees
    /// with the decrypted data.
    #[error("malformed header: {0}")]
    MalformedHeader(String),

    /// Fewer than nonce + length-field bytes remain for the next frame.
    #[error("corrupt or incomplete container: chunk header truncated at offset {offset}")]
    TruncatedChunkHeader { offset: usize },

    /// The declared ciphertext length runs past the end of the buffer.
    #[error(
        "corrupt or incomplete container: chunk payload truncated at offset {offset} \
         (declared {declared} bytes, {available} available)"
    )]
    TruncatedChunkPayload {
        offset: usize,
        declared: usize,
        available: usize,
    },

    /// AEAD tag verification failed. Wrong password and corrupted ciphertext
    /// are cryptographically indistinguishable and share this variant.
    #[error("wrong password or corrupt data")]
    WrongPasswordOrCorruptData,

    #[error("invalid options: {0}")]
    InvalidOptions(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

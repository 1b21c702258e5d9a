//! Chunk frame encoding
//!
//! ```text
//! [12 bytes: nonce][4 bytes: ciphertext length, LE][ciphertext || tag]
//! ```

use crate::error::{ContainerError, ContainerResult};
use crate::{LEN_PREFIX_SIZE, NONCE_SIZE};

/// Bytes preceding the ciphertext in every frame.
pub const FRAME_HEADER_SIZE: usize = NONCE_SIZE + LEN_PREFIX_SIZE;

/// A decoded frame borrowing its ciphertext from the container buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkFrame<'a> {
    pub nonce: [u8; NONCE_SIZE],
    pub ciphertext: &'a [u8],
}

/// Frame a sealed chunk, appending to `out`.
pub fn encode_chunk_frame(
    nonce: &[u8; NONCE_SIZE],
    ciphertext: &[u8],
    out: &mut Vec<u8>,
) -> ContainerResult<()> {
    let len = u32::try_from(ciphertext.len()).map_err(|_| {
        ContainerError::InvalidOptions(format!(
            "ciphertext of {} bytes does not fit a 32-bit length field",
            ciphertext.len()
        ))
    })?;
    out.reserve(FRAME_HEADER_SIZE + ciphertext.len());
    out.extend_from_slice(nonce);
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(ciphertext);
    Ok(())
}

/// Decode the frame starting at `offset`.
///
/// Both truncation checks run before the ciphertext is touched, so a short
/// buffer is always reported as a framing error rather than a decrypt
/// failure. Returns the frame and the offset of the next one.
pub fn decode_chunk_frame(buf: &[u8], offset: usize) -> ContainerResult<(ChunkFrame<'_>, usize)> {
    let available = buf.len().saturating_sub(offset);
    if available < FRAME_HEADER_SIZE {
        return Err(ContainerError::TruncatedChunkHeader { offset });
    }

    let mut nonce = [0u8; NONCE_SIZE];
    nonce.copy_from_slice(&buf[offset..offset + NONCE_SIZE]);

    let mut len_bytes = [0u8; LEN_PREFIX_SIZE];
    len_bytes.copy_from_slice(&buf[offset + NONCE_SIZE..offset + FRAME_HEADER_SIZE]);
    let declared = u32::from_le_bytes(len_bytes) as usize;

    let start = offset + FRAME_HEADER_SIZE;
    let remaining = buf.len() - start;
    if declared > remaining {
        return Err(ContainerError::TruncatedChunkPayload {
            offset,
            declared,
            available: remaining,
        });
    }

    let end = start + declared;
    Ok((
        ChunkFrame {
            nonce,
            ciphertext: &buf[start..end],
        },
        end,
    ))
}

//! Container header record
//!
//! Wire layout:
//! ```text
//! [4 bytes: header length, LE][header length bytes: UTF-8 JSON]
//! ```
//!
//! JSON keys: `v`, `algo`, `saltB64`, `iterations`, `chunkSize`,
//! `fileName`, `fileSize`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{ContainerError, ContainerResult};
use crate::{ALGORITHM, FORMAT_VERSION, LEN_PREFIX_SIZE, MAX_ITERATIONS};

/// Header fields, immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    /// Format version (always 1)
    pub v: u32,
    /// AEAD algorithm tag (always "AES-GCM")
    pub algo: String,
    /// KDF salt, standard base64
    pub salt_b64: String,
    /// PBKDF2 iteration count
    pub iterations: u32,
    /// Plaintext bytes per chunk
    pub chunk_size: u64,
    /// Original file name
    pub file_name: String,
    /// Original file size in bytes
    pub file_size: u64,
}

impl Header {
    pub fn new(
        salt: &[u8],
        iterations: u32,
        chunk_size: u64,
        file_name: &str,
        file_size: u64,
    ) -> Self {
        Self {
            v: FORMAT_VERSION,
            algo: ALGORITHM.to_string(),
            salt_b64: STANDARD.encode(salt),
            iterations,
            chunk_size,
            file_name: file_name.to_string(),
            file_size,
        }
    }

    /// Decode the stored salt.
    pub fn salt(&self) -> ContainerResult<Vec<u8>> {
        STANDARD
            .decode(&self.salt_b64)
            .map_err(|e| ContainerError::MalformedHeader(format!("salt is not valid base64: {e}")))
    }

    /// Number of chunk frames a container with this header must carry.
    pub fn expected_chunks(&self) -> u64 {
        if self.chunk_size == 0 {
            return 0;
        }
        self.file_size.div_ceil(self.chunk_size)
    }

    fn validate(&self) -> ContainerResult<()> {
        if self.v != FORMAT_VERSION {
            return Err(ContainerError::MalformedHeader(format!(
                "unsupported version {} (expected {FORMAT_VERSION})",
                self.v
            )));
        }
        if self.algo != ALGORITHM {
            return Err(ContainerError::MalformedHeader(format!(
                "unsupported algorithm '{}' (expected {ALGORITHM})",
                self.algo
            )));
        }
        if self.iterations == 0 || self.iterations > MAX_ITERATIONS {
            return Err(ContainerError::MalformedHeader(format!(
                "iterations {} outside 1..={MAX_ITERATIONS}",
                self.iterations
            )));
        }
        if self.chunk_size == 0 {
            return Err(ContainerError::MalformedHeader(
                "chunkSize must be positive".into(),
            ));
        }
        if self.salt()?.is_empty() {
            return Err(ContainerError::MalformedHeader("salt is empty".into()));
        }
        Ok(())
    }
}

/// Serialize a header to `(length prefix, header bytes)`.
pub fn encode_header(header: &Header) -> ContainerResult<([u8; LEN_PREFIX_SIZE], Vec<u8>)> {
    let bytes = serde_json::to_vec(header)
        .map_err(|e| ContainerError::Encryption(format!("header serialization: {e}")))?;
    let len = u32::try_from(bytes.len()).map_err(|_| {
        ContainerError::InvalidOptions(format!("header too large: {} bytes", bytes.len()))
    })?;
    Ok((len.to_le_bytes(), bytes))
}

/// Parse the header at the start of `buf`.
///
/// Returns the header and the length of the header record (excluding the
/// 4-byte prefix); chunk frames begin at `LEN_PREFIX_SIZE + header_len`.
pub fn decode_header(buf: &[u8]) -> ContainerResult<(Header, usize)> {
    let prefix: [u8; LEN_PREFIX_SIZE] = buf
        .get(..LEN_PREFIX_SIZE)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| {
            ContainerError::MalformedHeader(format!(
                "container is {} bytes, shorter than the {LEN_PREFIX_SIZE}-byte length prefix",
                buf.len()
            ))
        })?;
    let header_len = u32::from_le_bytes(prefix) as usize;

    let remaining = buf.len() - LEN_PREFIX_SIZE;
    if header_len > remaining {
        return Err(ContainerError::MalformedHeader(format!(
            "declared header length {header_len} exceeds remaining {remaining} bytes"
        )));
    }

    let record = &buf[LEN_PREFIX_SIZE..LEN_PREFIX_SIZE + header_len];
    let header: Header = serde_json::from_slice(record)
        .map_err(|e| ContainerError::MalformedHeader(format!("invalid header record: {e}")))?;
    header.validate()?;

    Ok((header, header_len))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Header {
        Header::new(&[9u8; 16], 200_000, 1024 * 1024, "report.pdf", 2 * 1024 * 1024)
    }

    fn framed(header: &Header) -> Vec<u8> {
        let (prefix, bytes) = encode_header(header).unwrap();
        let mut buf = prefix.to_vec();
        buf.extend_from_slice(&bytes);
        buf
    }

    fn framed_json(json: &str) -> Vec<u8> {
        let mut buf = (json.len() as u32).to_le_bytes().to_vec();
        buf.extend_from_slice(json.as_bytes());
        buf
    }

    #[test]
    fn test_header_roundtrip() {
        let header = sample();
        let buf = framed(&header);

        let (decoded, len) = decode_header(&buf).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(len, buf.len() - LEN_PREFIX_SIZE);
        assert_eq!(decoded.salt().unwrap(), vec![9u8; 16]);
    }

    #[test]
    fn test_header_json_keys() {
        let (_, bytes) = encode_header(&sample()).unwrap();
        let json = String::from_utf8(bytes).unwrap();

        for key in ["\"v\":1", "\"algo\":\"AES-GCM\"", "\"saltB64\"", "\"chunkSize\"", "\"fileName\"", "\"fileSize\""] {
            assert!(json.contains(key), "missing {key} in {json}");
        }
    }

    #[test]
    fn test_prefix_is_little_endian() {
        let (prefix, bytes) = encode_header(&sample()).unwrap();
        assert_eq!(u32::from_le_bytes(prefix) as usize, bytes.len());
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let mut buf = framed(&sample());
        let header_end = buf.len();
        buf.extend_from_slice(&[0xEE; 40]);

        let (_, len) = decode_header(&buf).unwrap();
        assert_eq!(LEN_PREFIX_SIZE + len, header_end);
    }

    #[test]
    fn test_short_prefix() {
        let err = decode_header(&[1, 0]).unwrap_err();
        assert!(matches!(err, ContainerError::MalformedHeader(_)));
    }

    #[test]
    fn test_declared_length_exceeds_buffer() {
        let mut buf = framed(&sample());
        buf.truncate(buf.len() - 1);

        let err = decode_header(&buf).unwrap_err();
        assert!(matches!(err, ContainerError::MalformedHeader(_)));
    }

    #[test]
    fn test_missing_field() {
        let buf = framed_json(
            r#"{"v":1,"algo":"AES-GCM","saltB64":"AAAA","iterations":1000,"chunkSize":16,"fileName":"a"}"#,
        );
        let err = decode_header(&buf).unwrap_err();
        assert!(matches!(err, ContainerError::MalformedHeader(_)));
    }

    #[test]
    fn test_negative_file_size() {
        let buf = framed_json(
            r#"{"v":1,"algo":"AES-GCM","saltB64":"AAAA","iterations":1000,"chunkSize":16,"fileName":"a","fileSize":-5}"#,
        );
        let err = decode_header(&buf).unwrap_err();
        assert!(matches!(err, ContainerError::MalformedHeader(_)));
    }

    #[test]
    fn test_wrong_field_type() {
        let buf = framed_json(
            r#"{"v":1,"algo":"AES-GCM","saltB64":"AAAA","iterations":"many","chunkSize":16,"fileName":"a","fileSize":5}"#,
        );
        let err = decode_header(&buf).unwrap_err();
        assert!(matches!(err, ContainerError::MalformedHeader(_)));
    }

    #[test]
    fn test_zero_chunk_size() {
        let mut header = sample();
        header.chunk_size = 0;
        let err = decode_header(&framed(&header)).unwrap_err();
        assert!(matches!(err, ContainerError::MalformedHeader(_)));
    }

    #[test]
    fn test_unbounded_iterations() {
        let mut header = sample();
        header.iterations = MAX_ITERATIONS + 1;
        let err = decode_header(&framed(&header)).unwrap_err();
        assert!(matches!(err, ContainerError::MalformedHeader(_)));
    }

    #[test]
    fn test_unsupported_version_and_algorithm() {
        let mut header = sample();
        header.v = 2;
        assert!(decode_header(&framed(&header)).is_err());

        let mut header = sample();
        header.algo = "ChaCha20-Poly1305".into();
        assert!(decode_header(&framed(&header)).is_err());
    }

    #[test]
    fn test_invalid_salt() {
        let mut header = sample();
        header.salt_b64 = "not base64!".into();
        assert!(decode_header(&framed(&header)).is_err());

        let mut header = sample();
        header.salt_b64 = String::new();
        assert!(decode_header(&framed(&header)).is_err());
    }

    #[test]
    fn test_non_utf8_record() {
        let mut buf = 3u32.to_le_bytes().to_vec();
        buf.extend_from_slice(&[0xFF, 0xFE, 0xFD]);
        let err = decode_header(&buf).unwrap_err();
        assert!(matches!(err, ContainerError::MalformedHeader(_)));
    }

    #[test]
    fn test_expected_chunks() {
        let mut header = sample();
        assert_eq!(header.expected_chunks(), 2);
        header.file_size = 2 * 1024 * 1024 + 1;
        assert_eq!(header.expected_chunks(), 3);
        header.file_size = 0;
        assert_eq!(header.expected_chunks(), 0);
    }
}

//! Archive decoding - gzip to text
//!
//! Objects are single-member gzip streams holding log text. Decoding is
//! lossy on the text side only: invalid UTF-8 becomes U+FFFD, while broken
//! gzip framing is an error.

use std::io::Read;

use flate2::read::GzDecoder;

use crate::error::{BrowseError, Result};

/// File extension recognized as a decodable archive
pub const ARCHIVE_EXTENSION: &str = ".gz";

/// Whether `key` names a gzip archive
pub fn is_archive(key: &str) -> bool {
    key.ends_with(ARCHIVE_EXTENSION)
}

/// Decompress a single gzip member and decode it as UTF-8
///
/// An empty body decodes to an empty string.
pub fn decode(bytes: &[u8]) -> Result<String> {
    if bytes.is_empty() {
        return Ok(String::new());
    }

    let mut decoder = GzDecoder::new(bytes);
    let mut raw = Vec::new();
    decoder
        .read_to_end(&mut raw)
        .map_err(|e| BrowseError::Decode(e.to_string()))?;

    Ok(match String::from_utf8(raw) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::{write::GzEncoder, Compression};
    use std::io::Write;

    fn gzip(bytes: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(bytes).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_round_trip_utf8() {
        let text = "2024-01-01 10:00:00 INFO start\n2024-01-01 10:00:01 警告: disk\n";
        assert_eq!(decode(&gzip(text.as_bytes())).unwrap(), text);
    }

    #[test]
    fn test_invalid_utf8_is_substituted() {
        let bytes = [b'o', b'k', 0xFF, b' ', 0xC3, b'x'];
        let decoded = decode(&gzip(&bytes)).unwrap();
        assert_eq!(decoded, "ok\u{FFFD} \u{FFFD}x");
    }

    #[test]
    fn test_bad_magic_is_decode_error() {
        let err = decode(b"plain text, not gzip").unwrap_err();
        assert!(matches!(err, BrowseError::Decode(_)));
    }

    #[test]
    fn test_checksum_mismatch_is_decode_error() {
        let mut bytes = gzip(b"some log line\n");
        // Trailer is CRC32 followed by ISIZE
        let crc_pos = bytes.len() - 8;
        bytes[crc_pos] ^= 0xFF;
        assert!(matches!(decode(&bytes), Err(BrowseError::Decode(_))));
    }

    #[test]
    fn test_empty_body() {
        assert_eq!(decode(&[]).unwrap(), "");
    }

    #[test]
    fn test_is_archive() {
        assert!(is_archive("logs/app/2024-01-01.log.gz"));
        assert!(!is_archive("logs/app/2024-01-01.log"));
        assert!(!is_archive("logs/app.gz/"));
    }
}

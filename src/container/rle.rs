//! Line-oriented container for run-length encoded text.
//!
//! The first line is a single-line JSON record; everything after the first
//! line break is the run text, in which line breaks are ordinary symbols.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Metadata line of an RLE container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RleMetadata {
    pub algorithm: String,
    /// UTF-8 byte length of the original text.
    pub original_size: u64,
    pub symbol_count: u64,
    pub run_count: u64,
    /// XOR fold of the run text bytes.
    pub checksum: u8,
    pub fingerprint: String,
}

/// A parsed (or to-be-written) RLE container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RleContainer {
    pub metadata: RleMetadata,
    pub body: String,
}

impl RleContainer {
    /// Byte offset of the run text inside a serialized container.
    pub fn body_offset(&self) -> Result<usize> {
        Ok(serde_json::to_string(&self.metadata)?.len() + 1)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = serde_json::to_string(&self.metadata)?;
        out.push('\n');
        out.push_str(&self.body);
        Ok(out.into_bytes())
    }

    /// Parses a container, returning it with the byte offset of its body.
    ///
    /// # Errors
    /// - `MalformedMetadata` if there is no first line or it is not the expected record
    /// - `InvalidFormat` if the body is not UTF-8
    pub fn parse(bytes: &[u8]) -> Result<ParsedRle> {
        let newline = bytes
            .iter()
            .position(|&b| b == b'\n')
            .ok_or_else(|| Error::malformed("missing metadata line", Some(0)))?;

        let metadata: RleMetadata = serde_json::from_slice(&bytes[..newline])
            .map_err(|err| Error::malformed(format!("metadata line: {}", err), Some(0)))?;
        if metadata.algorithm != crate::compression::rle::RLE {
            return Err(Error::malformed(
                format!("unexpected algorithm tag '{}'", metadata.algorithm),
                Some(0),
            ));
        }

        let body_offset = newline + 1;
        let body = std::str::from_utf8(&bytes[body_offset..]).map_err(|err| Error::InvalidFormat {
            message: format!("run text is not UTF-8: {}", err),
            offset: Some(body_offset + err.valid_up_to()),
        })?;

        Ok(ParsedRle {
            metadata,
            body: body.to_string(),
            body_offset,
        })
    }
}

/// A container read from bytes, with the position of its run text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRle {
    pub metadata: RleMetadata,
    pub body: String,
    pub body_offset: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn sample() -> RleContainer {
        RleContainer {
            metadata: RleMetadata {
                algorithm: "rle".to_string(),
                original_size: 11,
                symbol_count: 11,
                run_count: 2,
                checksum: 0,
                fingerprint: "00000000".to_string(),
            },
            body: "010a001\n".to_string(),
        }
    }

    #[test]
    fn test_layout() {
        let bytes = sample().to_bytes().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let (first, rest) = text.split_once('\n').unwrap();
        assert!(first.starts_with('{'));
        assert!(first.contains(r#""algorithm":"rle""#));
        assert_eq!(rest, "010a001\n");
    }

    #[test]
    fn test_parse_keeps_newlines_in_body() {
        let container = sample();
        let bytes = container.to_bytes().unwrap();
        let parsed = RleContainer::parse(&bytes).unwrap();
        assert_eq!(parsed.metadata, container.metadata);
        assert_eq!(parsed.body, container.body);
        assert_eq!(parsed.body_offset, container.body_offset().unwrap());
    }

    #[test]
    fn test_rejects_bad_first_line() {
        let err = RleContainer::parse(b"not json\n003a").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedMetadata);

        let err = RleContainer::parse(br#"{"original_size": 3}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedMetadata);

        let err = RleContainer::parse(b"{\"original_size\": 3}\n003a").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedMetadata);
    }

    #[test]
    fn test_rejects_foreign_algorithm_tag() {
        let mut container = sample();
        container.metadata.algorithm = "lzw".to_string();
        let err = RleContainer::parse(&container.to_bytes().unwrap()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedMetadata);
    }

    #[test]
    fn test_rejects_non_utf8_body() {
        let mut bytes = sample().to_bytes().unwrap();
        let body_offset = sample().body_offset().unwrap();
        bytes.push(0xFF);
        let err = RleContainer::parse(&bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);
        assert_eq!(err.offset(), Some(body_offset + 8));
    }
}

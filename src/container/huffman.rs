//! Binary container for Huffman-coded text.
//!
//! # Format
//!
//! ```text
//! +--------------------+
//! | Magic (4 bytes)    |  "HUFF"
//! +--------------------+
//! | meta_len (4)       |  u32 big-endian
//! +--------------------+
//! | metadata           |  JSON object, meta_len bytes
//! +--------------------+
//! | freq_len (4)       |  u32 big-endian
//! +--------------------+
//! | frequency table    |  JSON object symbol -> count, freq_len bytes
//! +--------------------+
//! | payload            |  packed code bits, to end of file
//! +--------------------+
//! ```

use serde::{Deserialize, Serialize};

use crate::compression::frequency::FrequencyTable;
use crate::error::{Error, Result};

/// Magic tag opening every Huffman container.
pub const MAGIC: [u8; 4] = *b"HUFF";

/// Metadata block of a Huffman container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HuffmanMetadata {
    pub algorithm: String,
    /// UTF-8 byte length of the original text.
    pub original_size: u64,
    /// Meaningful bits in the payload; the rest of the last byte is padding.
    pub bit_length: u64,
    pub symbol_count: u64,
    /// XOR fold of the payload bytes.
    pub checksum: u8,
    pub fingerprint: String,
}

/// A parsed (or to-be-written) Huffman container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanContainer {
    pub metadata: HuffmanMetadata,
    pub frequencies: FrequencyTable,
    pub payload: Vec<u8>,
}

impl HuffmanContainer {
    /// Serializes the container.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let meta = serde_json::to_vec(&self.metadata)?;
        let freq = serde_json::to_vec(&self.frequencies)?;

        let mut out = Vec::with_capacity(12 + meta.len() + freq.len() + self.payload.len());
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&block_len(&meta)?.to_be_bytes());
        out.extend_from_slice(&meta);
        out.extend_from_slice(&block_len(&freq)?.to_be_bytes());
        out.extend_from_slice(&freq);
        out.extend_from_slice(&self.payload);
        Ok(out)
    }

    /// Parses a container.
    ///
    /// # Errors
    /// - `InvalidFormat` if the magic tag is missing or wrong
    /// - `TruncatedFile` if a length field or block runs past the end
    /// - `MalformedMetadata` if a JSON block does not parse or has the wrong shape
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if !bytes.starts_with(&MAGIC) {
            return Err(Error::InvalidFormat {
                message: "missing HUFF magic tag".to_string(),
                offset: Some(0),
            });
        }
        let mut reader = Reader::new(bytes, MAGIC.len());

        let meta_len = reader.read_u32_be()? as usize;
        let meta_offset = reader.pos;
        let meta_bytes = reader.take(meta_len)?;
        let metadata: HuffmanMetadata = serde_json::from_slice(meta_bytes)
            .map_err(|err| Error::malformed(format!("metadata block: {}", err), Some(meta_offset)))?;

        let freq_len = reader.read_u32_be()? as usize;
        let freq_offset = reader.pos;
        let freq_bytes = reader.take(freq_len)?;
        let frequencies: FrequencyTable = serde_json::from_slice(freq_bytes).map_err(|err| {
            Error::malformed(format!("frequency block: {}", err), Some(freq_offset))
        })?;
        frequencies.validate().map_err(|err| match err {
            Error::MalformedMetadata { message, .. } => Error::malformed(message, Some(freq_offset)),
            other => other,
        })?;

        if metadata.algorithm != crate::compression::huffman::HUFFMAN {
            return Err(Error::malformed(
                format!("unexpected algorithm tag '{}'", metadata.algorithm),
                Some(meta_offset),
            ));
        }
        let total = frequencies
            .total()
            .ok_or_else(|| Error::malformed("frequency counts overflow", Some(freq_offset)))?;
        if total != metadata.symbol_count {
            return Err(Error::malformed(
                format!(
                    "frequency table sums to {} but metadata declares {} symbols",
                    total, metadata.symbol_count
                ),
                Some(freq_offset),
            ));
        }

        Ok(Self {
            metadata,
            frequencies,
            payload: reader.rest().to_vec(),
        })
    }
}

fn block_len(block: &[u8]) -> Result<u32> {
    u32::try_from(block.len())
        .map_err(|_| Error::invalid_format("block does not fit a 32-bit length field"))
}

/// Bounds-checked cursor over the container bytes.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(Error::TruncatedFile {
                offset: self.pos,
                needed: len,
                available: self.remaining(),
            });
        }
        let block = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(block)
    }

    fn read_u32_be(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }
}

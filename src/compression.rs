//! Text compression codecs.
//!
//! This module provides the two codecs of the engine:
//! - Huffman prefix coding with a packed bitstream ([`huffman`])
//! - Run-length encoding with fixed-width counts ([`rle`])
//!
//! Both operate on UTF-8 text, treating every Unicode scalar value as one
//! symbol, and both produce a self-describing container carrying the
//! integrity fields needed to verify the decoded output.
//!
//! # Examples
//!
//! ```rust
//! use textpack::compression::{Compression, HuffmanCoding};
//!
//! let codec = HuffmanCoding::new();
//! let packed = codec.compress("abracadabra").unwrap();
//! let unpacked = codec.decompress(&packed.bytes).unwrap();
//! assert_eq!(unpacked.text, "abracadabra");
//! assert!(unpacked.verification.verified());
//! ```

use crate::error::Result;
use crate::integrity::Verification;

/// Trait for compression algorithms
///
/// Implementations must be stateless between calls: the same codec value is
/// shared by every operation of a manager, possibly across threads.
pub trait Compression: Send + Sync {
    /// Name the codec is registered under.
    fn name(&self) -> &str;

    /// Suffix of files written by this codec, including the dot.
    fn extension(&self) -> &str;

    /// Whether `data` looks like a container written by this codec.
    fn detect(&self, data: &[u8]) -> bool;

    /// Compress the input text into a complete container
    fn compress(&self, text: &str) -> Result<Compressed>;

    /// Decompress a container, reporting but not enforcing integrity checks
    fn decompress(&self, data: &[u8]) -> Result<Decompressed>;
}

/// A finished container and the integrity values written into it.
#[derive(Debug, Clone)]
pub struct Compressed {
    pub bytes: Vec<u8>,
    pub checksum: u8,
    pub fingerprint: String,
    /// Input length in symbols.
    pub symbol_count: u64,
    /// Present for codecs that derive a prefix code.
    pub code_table: Option<CodeTable>,
    pub frequencies: Option<FrequencyTable>,
}

/// Decoded text plus the outcome of both integrity checks.
#[derive(Debug, Clone)]
pub struct Decompressed {
    pub text: String,
    pub verification: Verification,
}

pub mod frequency;
pub mod huffman;
pub mod rle;

pub use frequency::FrequencyTable;
pub use huffman::{CodeTable, CodeTableRow, HuffmanCoding, HuffmanNode, HuffmanTree, NodeId};
pub use rle::{Run, RunLengthEncoding};

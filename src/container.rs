//! On-disk container formats.
//!
//! - [`huffman`]: binary framing with a magic tag and length-prefixed JSON blocks.
//! - [`rle`]: one JSON metadata line followed by the run text.
//!
//! Readers never guess: a bad tag, a short block or a metadata record of the
//! wrong shape is an error carrying the byte offset where parsing stopped.

pub mod huffman;
pub mod rle;

pub use huffman::{HuffmanContainer, HuffmanMetadata};
pub use rle::{ParsedRle, RleContainer, RleMetadata};

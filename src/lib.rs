//! Text compression engine with Huffman and run-length codecs.
//!
//! Input is UTF-8 text; every Unicode scalar value is one symbol. Each codec
//! writes a self-describing container that records an XOR checksum of its
//! payload and an MD5-prefix fingerprint of the original text, both checked
//! again on decompression.
//!
//! ```rust,no_run
//! use textpack::{CompressionManager, EngineConfig, Registry, VerificationMode};
//!
//! let manager = CompressionManager::new(
//!     Registry::with_defaults(),
//!     EngineConfig::new().with_verification(VerificationMode::Strict),
//! );
//! let packed = manager.compress("notes.txt", "huffman")?;
//! println!("{:.1}% saved", packed.stats().ratio);
//! let unpacked = manager.decompress(&packed.output_path)?;
//! assert!(unpacked.verified());
//! # Ok::<(), textpack::Error>(())
//! ```

pub mod compression;
pub mod config;
pub mod container;
pub mod error;
pub mod integrity;
pub mod manager;
pub mod stats;

pub use compression::{CodeTable, Compression, FrequencyTable, HuffmanCoding, RunLengthEncoding};
pub use config::{EngineConfig, VerificationMode};
pub use error::{Error, ErrorKind, Result, Stage};
pub use integrity::Verification;
pub use manager::{
    Comparison, ComparisonSummary, CompressOutcome, CompressReport, CompressionManager,
    DecompressOutcome, DecompressReport, Registry,
};
pub use stats::{compression_ratio, CompressionStats, FileInfo};

//! Statistics reported by engine operations.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use crate::error::{Error, Result, Stage};

/// Space saved as a percentage of the original size.
///
/// Negative when the output is larger than the input. Defined as 0 for an
/// empty original.
pub fn compression_ratio(original: u64, compressed: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    (1.0 - compressed as f64 / original as f64) * 100.0
}

/// Figures for one compress or decompress operation.
///
/// Sizes are in bytes: `original_size` is the UTF-8 text, `compressed_size`
/// the whole container including metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompressionStats {
    pub algorithm: String,
    pub original_size: u64,
    pub compressed_size: u64,
    pub ratio: f64,
    pub elapsed: Duration,
    pub checksum: u8,
    pub fingerprint: String,
    pub symbol_count: u64,
}

impl CompressionStats {
    pub fn new(
        algorithm: impl Into<String>,
        original_size: u64,
        compressed_size: u64,
        elapsed: Duration,
    ) -> Self {
        Self {
            algorithm: algorithm.into(),
            original_size,
            compressed_size,
            ratio: compression_ratio(original_size, compressed_size),
            elapsed,
            checksum: 0,
            fingerprint: String::new(),
            symbol_count: 0,
        }
    }

    pub fn with_integrity(mut self, checksum: u8, fingerprint: impl Into<String>) -> Self {
        self.checksum = checksum;
        self.fingerprint = fingerprint.into();
        self
    }

    pub fn with_symbol_count(mut self, symbol_count: u64) -> Self {
        self.symbol_count = symbol_count;
        self
    }

    /// Bytes saved by compression, zero if the output grew.
    pub fn space_saved(&self) -> u64 {
        self.original_size.saturating_sub(self.compressed_size)
    }
}

/// Basic facts about an input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    pub path: PathBuf,
    pub size: u64,
    /// Unicode scalar values, `None` if the file is not UTF-8.
    pub characters: Option<u64>,
    /// Line breaks plus one, `None` if the file is not UTF-8.
    pub lines: Option<u64>,
}

impl FileInfo {
    pub fn inspect(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|err| Error::from_io(err, path).in_file(path, Stage::Read))?;
        let (characters, lines) = match std::str::from_utf8(&bytes) {
            Ok(text) => (
                Some(text.chars().count() as u64),
                Some(text.matches('\n').count() as u64 + 1),
            ),
            Err(_) => (None, None),
        };
        Ok(Self {
            path: path.to_path_buf(),
            size: bytes.len() as u64,
            characters,
            lines,
        })
    }
}

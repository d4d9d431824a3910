//! Codec registry and the file-level operations built on it.
//!
//! A [`CompressionManager`] owns a [`Registry`] and an [`EngineConfig`] and
//! nothing else. Every operation reads its input, runs to completion on the
//! calling thread and writes its output, so one manager can serve concurrent
//! callers working on different files.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use serde::Serialize;

use crate::compression::{
    CodeTable, CodeTableRow, Compression, FrequencyTable, HuffmanCoding, RunLengthEncoding,
};
use crate::config::EngineConfig;
use crate::error::{Error, Result, Stage};
use crate::integrity::Verification;
use crate::stats::CompressionStats;

/// Suffix of decompressed output files.
pub const DECOMPRESSED_SUFFIX: &str = "_decompressed.txt";

/// Name-keyed set of codecs, in registration order.
#[derive(Default)]
pub struct Registry {
    codecs: Vec<Box<dyn Compression>>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the `huffman` and `rle` codecs.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(HuffmanCoding::new());
        registry.register(RunLengthEncoding::new());
        registry
    }

    /// Adds a codec, replacing any codec already registered under its name.
    pub fn register<C: Compression + 'static>(&mut self, codec: C) -> &mut Self {
        let codec: Box<dyn Compression> = Box::new(codec);
        match self.codecs.iter().position(|c| c.name() == codec.name()) {
            Some(index) => self.codecs[index] = codec,
            None => self.codecs.push(codec),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn Compression> {
        self.codecs
            .iter()
            .find(|c| c.name() == name)
            .map(|c| c.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.codecs.iter().map(|c| c.name()).collect()
    }

    /// The first codec that recognizes `data` as its container.
    pub fn detect(&self, data: &[u8]) -> Option<&dyn Compression> {
        self.codecs
            .iter()
            .find(|c| c.detect(data))
            .map(|c| c.as_ref())
    }
}

/// Result of compressing text in memory.
#[derive(Debug, Clone)]
pub struct CompressReport {
    pub stats: CompressionStats,
    code_table: Option<CodeTable>,
    frequencies: Option<FrequencyTable>,
}

impl CompressReport {
    /// Snapshot of the prefix code, for codecs that build one.
    pub fn code_table(&self) -> Option<&CodeTable> {
        self.code_table.as_ref()
    }

    pub fn frequencies(&self) -> Option<&FrequencyTable> {
        self.frequencies.as_ref()
    }

    /// Code table rows, most frequent symbol first. Empty for codecs without codes.
    pub fn code_rows(&self) -> Vec<CodeTableRow> {
        match (&self.code_table, &self.frequencies) {
            (Some(codes), Some(freq)) => codes.rows(freq),
            _ => Vec::new(),
        }
    }
}

/// Result of [`CompressionManager::compress`].
#[derive(Debug, Clone)]
pub struct CompressOutcome {
    pub output_path: PathBuf,
    pub report: CompressReport,
}

impl CompressOutcome {
    pub fn stats(&self) -> &CompressionStats {
        &self.report.stats
    }

    pub fn code_table(&self) -> Option<&CodeTable> {
        self.report.code_table()
    }
}

/// Result of decompressing a container in memory.
#[derive(Debug, Clone)]
pub struct DecompressReport {
    pub text: String,
    pub stats: CompressionStats,
    pub verification: Verification,
}

/// Result of [`CompressionManager::decompress`].
#[derive(Debug, Clone)]
pub struct DecompressOutcome {
    pub output_path: PathBuf,
    pub stats: CompressionStats,
    pub verification: Verification,
}

impl DecompressOutcome {
    /// True when both integrity checks passed.
    pub fn verified(&self) -> bool {
        self.verification.verified()
    }
}

/// One algorithm's entry in a comparison.
#[derive(Debug)]
pub struct Comparison {
    pub algorithm: String,
    pub result: Result<CompressionStats>,
}

/// Winners of a comparison among the algorithms that succeeded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonSummary {
    pub best_ratio: Option<(String, f64)>,
    pub fastest: Option<(String, Duration)>,
}

impl ComparisonSummary {
    pub fn from_results(results: &[Comparison]) -> Self {
        let succeeded: Vec<&CompressionStats> =
            results.iter().filter_map(|c| c.result.as_ref().ok()).collect();
        let best_ratio = succeeded
            .iter()
            .max_by(|a, b| a.ratio.total_cmp(&b.ratio))
            .map(|s| (s.algorithm.clone(), s.ratio));
        let fastest = succeeded
            .iter()
            .min_by_key(|s| s.elapsed)
            .map(|s| (s.algorithm.clone(), s.elapsed));
        Self {
            best_ratio,
            fastest,
        }
    }
}

/// Runs compress, decompress and compare operations against a registry.
#[derive(Debug)]
pub struct CompressionManager {
    registry: Registry,
    config: EngineConfig,
}

impl Default for CompressionManager {
    fn default() -> Self {
        Self::new(Registry::with_defaults(), EngineConfig::default())
    }
}

impl CompressionManager {
    pub fn new(registry: Registry, config: EngineConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn codec(&self, name: &str) -> Result<&dyn Compression> {
        self.registry
            .get(name)
            .ok_or_else(|| Error::UnknownAlgorithm(name.to_string()))
    }

    /// Compresses `text` with the named codec, returning the container bytes.
    pub fn compress_buffer(&self, text: &str, algorithm: &str) -> Result<(Vec<u8>, CompressReport)> {
        let start = Instant::now();
        let codec = self.codec(algorithm)?;
        let compressed = codec.compress(text)?;
        let stats = CompressionStats::new(
            codec.name(),
            text.len() as u64,
            compressed.bytes.len() as u64,
            start.elapsed(),
        )
        .with_integrity(compressed.checksum, compressed.fingerprint)
        .with_symbol_count(compressed.symbol_count);

        let report = CompressReport {
            stats,
            code_table: compressed.code_table,
            frequencies: compressed.frequencies,
        };
        Ok((compressed.bytes, report))
    }

    /// Decodes a container, detecting its codec, and applies the verification mode.
    pub fn decompress_buffer(&self, data: &[u8]) -> Result<DecompressReport> {
        let start = Instant::now();
        let codec = self
            .registry
            .detect(data)
            .ok_or_else(unrecognized_container)?;
        debug!("detected {} container", codec.name());

        let decompressed = codec.decompress(data)?;
        decompressed
            .verification
            .enforce(self.config.verification)?;

        let verification = decompressed.verification;
        let text = decompressed.text;
        let stats = CompressionStats::new(
            codec.name(),
            text.len() as u64,
            data.len() as u64,
            start.elapsed(),
        )
        .with_integrity(
            verification.checksum.actual,
            verification.fingerprint.actual.clone(),
        )
        .with_symbol_count(text.chars().count() as u64);

        Ok(DecompressReport {
            text,
            stats,
            verification,
        })
    }

    /// Compresses a file next to itself (or into the configured output directory).
    pub fn compress(&self, input: impl AsRef<Path>, algorithm: &str) -> Result<CompressOutcome> {
        let input = input.as_ref();
        let codec = self
            .codec(algorithm)
            .map_err(|err| err.in_file(input, Stage::Encode))?;
        let output = self.config.derived_path(input, codec.extension());
        self.compress_to(input, algorithm, output)
    }

    /// Compresses a file to an explicit output path.
    pub fn compress_to(
        &self,
        input: impl AsRef<Path>,
        algorithm: &str,
        output: impl AsRef<Path>,
    ) -> Result<CompressOutcome> {
        let start = Instant::now();
        let (input, output) = (input.as_ref(), output.as_ref());

        let text = read_text(input)?;
        let (bytes, mut report) = self
            .compress_buffer(&text, algorithm)
            .map_err(|err| err.in_file(input, Stage::Encode))?;
        write_file(output, &bytes)?;
        report.stats.elapsed = start.elapsed();

        info!(
            "compressed {} with {}: {} -> {} bytes ({:.2}%)",
            input.display(),
            report.stats.algorithm,
            report.stats.original_size,
            report.stats.compressed_size,
            report.stats.ratio
        );
        Ok(CompressOutcome {
            output_path: output.to_path_buf(),
            report,
        })
    }

    /// Decompresses a container file to `<stem>_decompressed.txt`.
    pub fn decompress(&self, input: impl AsRef<Path>) -> Result<DecompressOutcome> {
        let input = input.as_ref();
        let output = self.config.derived_path(input, DECOMPRESSED_SUFFIX);
        self.decompress_to(input, output)
    }

    /// Decompresses a container file to an explicit output path.
    ///
    /// In strict mode an integrity failure aborts before anything is written.
    pub fn decompress_to(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<DecompressOutcome> {
        let start = Instant::now();
        let (input, output) = (input.as_ref(), output.as_ref());

        let data = fs::read(input)
            .map_err(|err| Error::from_io(err, input).in_file(input, Stage::Read))?;
        if self.registry.detect(&data).is_none() {
            return Err(unrecognized_container().in_file(input, Stage::Detect));
        }
        let report = self.decompress_buffer(&data).map_err(|err| {
            let stage = if err.is_verification_failure() {
                Stage::Verify
            } else {
                Stage::Decode
            };
            err.in_file(input, stage)
        })?;
        write_file(output, report.text.as_bytes())?;

        let mut stats = report.stats;
        stats.elapsed = start.elapsed();
        info!(
            "decompressed {} ({}): {} bytes, verified: {}",
            input.display(),
            stats.algorithm,
            stats.original_size,
            report.verification.verified()
        );
        Ok(DecompressOutcome {
            output_path: output.to_path_buf(),
            stats,
            verification: report.verification,
        })
    }

    /// Huffman code table rows for a file's text, most frequent symbol first.
    pub fn code_rows(&self, input: impl AsRef<Path>) -> Result<Vec<CodeTableRow>> {
        let input = input.as_ref();
        let text = read_text(input)?;
        let (_, report) = self
            .compress_buffer(&text, crate::compression::huffman::HUFFMAN)
            .map_err(|err| err.in_file(input, Stage::Encode))?;
        Ok(report.code_rows())
    }

    /// Compresses one file with every requested algorithm, in memory.
    ///
    /// Failures are collected per algorithm; only an unreadable input fails
    /// the whole comparison.
    pub fn compare<S>(&self, input: impl AsRef<Path>, algorithms: &[S]) -> Result<Vec<Comparison>>
    where
        S: AsRef<str> + Sync,
    {
        let input = input.as_ref();
        let text = read_text(input)?;

        let run = |name: &S| {
            let name = name.as_ref();
            let result = self
                .compress_buffer(&text, name)
                .map(|(_, report)| report.stats)
                .map_err(|err| err.in_file(input, Stage::Encode));
            if let Err(err) = &result {
                warn!("{} failed during comparison: {}", name, err);
            }
            Comparison {
                algorithm: name.to_string(),
                result,
            }
        };

        #[cfg(feature = "parallel")]
        let results: Vec<Comparison> = {
            use rayon::prelude::*;
            algorithms.par_iter().map(run).collect()
        };
        #[cfg(not(feature = "parallel"))]
        let results: Vec<Comparison> = algorithms.iter().map(run).collect();

        info!(
            "compared {} algorithms on {}",
            results.len(),
            input.display()
        );
        Ok(results)
    }
}

fn unrecognized_container() -> Error {
    Error::InvalidFormat {
        message: "unrecognized container".to_string(),
        offset: Some(0),
    }
}

fn read_text(path: &Path) -> Result<String> {
    let bytes =
        fs::read(path).map_err(|err| Error::from_io(err, path).in_file(path, Stage::Read))?;
    String::from_utf8(bytes).map_err(|err| {
        let valid_up_to = err.utf8_error().valid_up_to();
        Error::InvalidFormat {
            message: "input is not valid UTF-8 text".to_string(),
            offset: Some(valid_up_to),
        }
        .in_file(path, Stage::Read)
    })
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).map_err(|err| Error::Io(err).in_file(path, Stage::Write))
}

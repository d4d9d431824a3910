//! Run-length encoding with fixed-width decimal counts.
//!
//! Each run is written as its count, zero padded to [`COUNT_WIDTH`] digits,
//! followed by exactly one symbol. The fixed width keeps the text form
//! unambiguous even when the symbol is itself a digit or a line break.

use log::debug;

use crate::compression::{Compressed, Compression, Decompressed};
use crate::container::rle::{RleContainer, RleMetadata};
use crate::error::{Error, Result};
use crate::integrity::{self, Verification};

/// Registry name of the RLE codec.
pub const RLE: &str = "rle";

/// Digits in the count field.
pub const COUNT_WIDTH: usize = 3;

/// Largest count representable in [`COUNT_WIDTH`] digits.
pub const MAX_RUN_LENGTH: u16 = 999;

/// A symbol repeated `count` times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub count: u16,
    pub symbol: char,
}

impl Run {
    pub fn new(count: u16, symbol: char) -> Self {
        Self { count, symbol }
    }
}

/// Splits `text` into runs of at most [`MAX_RUN_LENGTH`] identical symbols.
///
/// # Example
///
/// ```
/// use textpack::compression::rle::{encode, Run};
///
/// let runs = encode("aaab");
/// assert_eq!(runs, vec![Run::new(3, 'a'), Run::new(1, 'b')]);
/// ```
pub fn encode(text: &str) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    for ch in text.chars() {
        match runs.last_mut() {
            Some(run) if run.symbol == ch && run.count < MAX_RUN_LENGTH => run.count += 1,
            _ => runs.push(Run::new(1, ch)),
        }
    }
    runs
}

/// Expands runs back into text.
pub fn decode(runs: &[Run]) -> String {
    let mut result = String::with_capacity(runs.iter().map(|r| r.count as usize).sum());
    for run in runs {
        result.extend(std::iter::repeat(run.symbol).take(run.count as usize));
    }
    result
}

/// Renders runs in their textual form, e.g. `010a003b`.
pub fn format_runs(runs: &[Run]) -> String {
    let mut out = String::with_capacity(runs.len() * (COUNT_WIDTH + 1));
    for run in runs {
        out.push_str(&format!("{:0width$}", run.count, width = COUNT_WIDTH));
        out.push(run.symbol);
    }
    out
}

/// Parses the textual form produced by [`format_runs`].
///
/// Errors carry the byte offset of the offending token.
pub fn parse_runs(text: &str) -> Result<Vec<Run>> {
    let bytes = text.as_bytes();
    let mut runs = Vec::with_capacity(text.len() / (COUNT_WIDTH + 1));
    let mut pos = 0;
    while pos < bytes.len() {
        let digits = bytes
            .get(pos..pos + COUNT_WIDTH)
            .ok_or_else(|| Error::corrupt("truncated run count", pos))?;
        if !digits.iter().all(u8::is_ascii_digit) {
            return Err(Error::corrupt(
                format!("run count is not {} decimal digits", COUNT_WIDTH),
                pos,
            ));
        }
        let count = digits
            .iter()
            .fold(0u16, |acc, d| acc * 10 + u16::from(d - b'0'));
        if count == 0 {
            return Err(Error::corrupt("zero-length run", pos));
        }

        // The count is ASCII, so the symbol starts on a char boundary.
        let symbol = text[pos + COUNT_WIDTH..]
            .chars()
            .next()
            .ok_or_else(|| Error::corrupt("run is missing its symbol", pos + COUNT_WIDTH))?;
        runs.push(Run::new(count, symbol));
        pos += COUNT_WIDTH + symbol.len_utf8();
    }
    Ok(runs)
}

/// Run-length codec writing the line-oriented RLE container.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunLengthEncoding;

impl RunLengthEncoding {
    pub fn new() -> Self {
        Self
    }
}

impl Compression for RunLengthEncoding {
    fn name(&self) -> &str {
        RLE
    }

    fn extension(&self) -> &str {
        ".rle"
    }

    fn detect(&self, data: &[u8]) -> bool {
        data.first() == Some(&b'{')
    }

    fn compress(&self, text: &str) -> Result<Compressed> {
        if text.is_empty() {
            return Err(Error::EmptyInput);
        }
        let runs = encode(text);
        let body = format_runs(&runs);
        let checksum = integrity::checksum(body.as_bytes());
        let fingerprint = integrity::fingerprint(text);
        let symbol_count = text.chars().count() as u64;
        debug!(
            "rle encoded {} symbols into {} runs",
            symbol_count,
            runs.len()
        );

        let container = RleContainer {
            metadata: RleMetadata {
                algorithm: RLE.to_string(),
                original_size: text.len() as u64,
                symbol_count,
                run_count: runs.len() as u64,
                checksum,
                fingerprint: fingerprint.clone(),
            },
            body,
        };

        Ok(Compressed {
            bytes: container.to_bytes()?,
            checksum,
            fingerprint,
            symbol_count,
            code_table: None,
            frequencies: None,
        })
    }

    fn decompress(&self, data: &[u8]) -> Result<Decompressed> {
        let container = RleContainer::parse(data)?;
        let runs = parse_runs(&container.body).map_err(|err| match err {
            // Report positions relative to the whole file.
            Error::CorruptStream { message, offset } => {
                Error::corrupt(message, offset + container.body_offset)
            }
            other => other,
        })?;
        let text = decode(&runs);
        let meta = &container.metadata;
        let verification = Verification::run(
            meta.checksum,
            container.body.as_bytes(),
            &meta.fingerprint,
            &text,
        );
        Ok(Decompressed { text, verification })
    }
}

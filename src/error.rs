//! Error types for the compression engine.
//!
//! Every failure is a structured value: a [`ErrorKind`] for matching, a
//! human readable message via `Display`, and an optional byte (or bit)
//! position via [`Error::offset`]. File-level operations wrap the underlying
//! error in [`Error::File`] so callers can report the path and the stage that
//! failed.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Discriminant of an [`Error`], stable across the `File` wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    EmptyInput,
    InvalidFormat,
    TruncatedFile,
    MalformedMetadata,
    ChecksumMismatch,
    FingerprintMismatch,
    CorruptStream,
    Encoding,
    UnknownAlgorithm,
    FileNotFound,
    Io,
}

/// The step of a file operation that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Read,
    Detect,
    Encode,
    Decode,
    Verify,
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Read => "read",
            Stage::Detect => "detect",
            Stage::Encode => "encode",
            Stage::Decode => "decode",
            Stage::Verify => "verify",
            Stage::Write => "write",
        };
        f.write_str(name)
    }
}

/// Top-level error type for all engine operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Zero-length input was handed to a codec.
    #[error("input is empty")]
    EmptyInput,

    /// Unrecognized container, bad magic tag or undecodable text.
    #[error("invalid format: {message}")]
    InvalidFormat {
        message: String,
        offset: Option<usize>,
    },

    /// A declared block length runs past the end of the data.
    #[error("truncated file at byte {offset}: needed {needed} bytes, {available} available")]
    TruncatedFile {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A structured metadata block failed to parse or has the wrong shape.
    #[error("malformed metadata: {message}")]
    MalformedMetadata {
        message: String,
        offset: Option<usize>,
    },

    /// The XOR checksum recomputed over the payload differs from the stored one.
    #[error("checksum mismatch: expected {expected:#04x}, got {actual:#04x}")]
    ChecksumMismatch { expected: u8, actual: u8 },

    /// The fingerprint of the decoded text differs from the stored one.
    #[error("fingerprint mismatch: expected {expected}, got {actual}")]
    FingerprintMismatch { expected: String, actual: String },

    /// The encoded stream could not be decoded cleanly.
    #[error("corrupt stream at position {offset}: {message}")]
    CorruptStream { message: String, offset: usize },

    /// A symbol could not be assigned a code.
    #[error("no code for symbol {symbol:?}")]
    Encoding { symbol: char },

    /// No codec is registered under the requested name.
    #[error("unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    /// The input file does not exist.
    #[error("file not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    /// Any other filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An error annotated with the file and stage it came from.
    #[error("{stage} failed for {}: {source}", .path.display())]
    File {
        path: PathBuf,
        stage: Stage,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub(crate) fn invalid_format(message: impl Into<String>) -> Self {
        Error::InvalidFormat {
            message: message.into(),
            offset: None,
        }
    }

    pub(crate) fn malformed(message: impl Into<String>, offset: Option<usize>) -> Self {
        Error::MalformedMetadata {
            message: message.into(),
            offset,
        }
    }

    pub(crate) fn corrupt(message: impl Into<String>, offset: usize) -> Self {
        Error::CorruptStream {
            message: message.into(),
            offset,
        }
    }

    /// Attaches a path and stage, unless the error already carries one.
    pub(crate) fn in_file(self, path: impl Into<PathBuf>, stage: Stage) -> Self {
        match self {
            Error::File { .. } | Error::FileNotFound { .. } => self,
            other => Error::File {
                path: path.into(),
                stage,
                source: Box::new(other),
            },
        }
    }

    /// Maps an I/O error on `path`, turning `NotFound` into [`Error::FileNotFound`].
    pub(crate) fn from_io(err: io::Error, path: impl Into<PathBuf>) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            Error::FileNotFound { path: path.into() }
        } else {
            Error::Io(err)
        }
    }

    /// Returns the kind of the innermost error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::EmptyInput => ErrorKind::EmptyInput,
            Error::InvalidFormat { .. } => ErrorKind::InvalidFormat,
            Error::TruncatedFile { .. } => ErrorKind::TruncatedFile,
            Error::MalformedMetadata { .. } => ErrorKind::MalformedMetadata,
            Error::ChecksumMismatch { .. } => ErrorKind::ChecksumMismatch,
            Error::FingerprintMismatch { .. } => ErrorKind::FingerprintMismatch,
            Error::CorruptStream { .. } => ErrorKind::CorruptStream,
            Error::Encoding { .. } => ErrorKind::Encoding,
            Error::UnknownAlgorithm(_) => ErrorKind::UnknownAlgorithm,
            Error::FileNotFound { .. } => ErrorKind::FileNotFound,
            Error::Io(_) => ErrorKind::Io,
            Error::File { source, .. } => source.kind(),
        }
    }

    /// Position of the failure inside the data, when one is known.
    ///
    /// Byte offset for container errors, bit offset for Huffman stream errors
    /// and byte offset into the run text for RLE stream errors.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Error::InvalidFormat { offset, .. } | Error::MalformedMetadata { offset, .. } => {
                *offset
            }
            Error::TruncatedFile { offset, .. } | Error::CorruptStream { offset, .. } => {
                Some(*offset)
            }
            Error::File { source, .. } => source.offset(),
            _ => None,
        }
    }

    /// True for integrity failures that lenient mode reports instead of raising.
    pub fn is_verification_failure(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::ChecksumMismatch | ErrorKind::FingerprintMismatch
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::malformed(err.to_string(), None)
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_sees_through_file_wrapper() {
        let err = Error::corrupt("walk ended mid-code", 17).in_file("a.huff", Stage::Decode);
        assert_eq!(err.kind(), ErrorKind::CorruptStream);
        assert_eq!(err.offset(), Some(17));
        let msg = err.to_string();
        assert!(msg.contains("a.huff"));
        assert!(msg.contains("decode"));
    }

    #[test]
    fn test_not_found_maps_to_file_not_found() {
        let io = io::Error::new(io::ErrorKind::NotFound, "gone");
        let err = Error::from_io(io, "missing.txt");
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
        // Already carries the path, so it is not wrapped again.
        let err = err.in_file("missing.txt", Stage::Read);
        assert!(matches!(err, Error::FileNotFound { .. }));
    }

    #[test]
    fn test_verification_failure_classification() {
        let err = Error::ChecksumMismatch {
            expected: 1,
            actual: 2,
        };
        assert!(err.is_verification_failure());
        assert!(!Error::EmptyInput.is_verification_failure());
    }
}

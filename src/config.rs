//! Engine configuration.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What to do when a checksum or fingerprint does not match on decompression.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationMode {
    /// Fail the operation on the first mismatch.
    Strict,
    /// Return the decoded text with the failed checks flagged.
    #[default]
    Lenient,
}

impl fmt::Display for VerificationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationMode::Strict => f.write_str("strict"),
            VerificationMode::Lenient => f.write_str("lenient"),
        }
    }
}

impl FromStr for VerificationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(VerificationMode::Strict),
            "lenient" => Ok(VerificationMode::Lenient),
            other => Err(format!(
                "unknown verification mode '{}' (expected strict or lenient)",
                other
            )),
        }
    }
}

/// Settings shared by every operation of a [`crate::CompressionManager`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub verification: VerificationMode,
    /// Directory for generated files. `None` writes next to the input.
    pub output_dir: Option<PathBuf>,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_verification(mut self, mode: VerificationMode) -> Self {
        self.verification = mode;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Path for a file derived from `input`: same stem plus `suffix`.
    ///
    /// `suffix` includes any extension, e.g. `".huff"` or `"_decompressed.txt"`.
    pub fn derived_path(&self, input: &Path, suffix: &str) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = format!("{}{}", stem, suffix);
        match &self.output_dir {
            Some(dir) => dir.join(name),
            None => input.with_file_name(name),
        }
    }
}

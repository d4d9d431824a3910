//! Integrity checks carried by every container.
//!
//! Two independent checks protect a compressed file:
//!
//! - a one-byte XOR [`checksum`] over the stored payload, and
//! - a [`fingerprint`]: the first eight hex digits of the MD5 digest of the
//!   original text, recomputed over the decoded output.
//!
//! The checksum is blind to any corruption that cancels under XOR: the same
//! bit flipped in an even number of bytes, or bytes swapped with each other.
//! The fingerprint catches those.

use serde::Serialize;

use crate::config::VerificationMode;
use crate::error::{Error, Result};

/// Number of hex digits kept from the digest.
pub const FINGERPRINT_LEN: usize = 8;

/// XOR fold of every byte.
pub fn checksum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |acc, &byte| acc ^ byte)
}

/// Short hex fingerprint of `text`.
pub fn fingerprint(text: &str) -> String {
    let digest = md5::compute(text.as_bytes());
    let mut hex = hex::encode(digest.0);
    hex.truncate(FINGERPRINT_LEN);
    hex
}

/// Result of comparing a stored integrity value with a recomputed one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Check<T> {
    pub expected: T,
    pub actual: T,
}

impl<T: PartialEq> Check<T> {
    pub fn new(expected: T, actual: T) -> Self {
        Self { expected, actual }
    }

    pub fn passed(&self) -> bool {
        self.expected == self.actual
    }
}

/// Outcome of both integrity checks for one decompression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verification {
    pub checksum: Check<u8>,
    pub fingerprint: Check<String>,
}

impl Verification {
    /// Runs both checks against the stored values.
    pub fn run(
        stored_checksum: u8,
        payload: &[u8],
        stored_fingerprint: &str,
        decoded: &str,
    ) -> Self {
        Self {
            checksum: Check::new(stored_checksum, checksum(payload)),
            fingerprint: Check::new(stored_fingerprint.to_string(), fingerprint(decoded)),
        }
    }

    pub fn checksum_ok(&self) -> bool {
        self.checksum.passed()
    }

    pub fn fingerprint_ok(&self) -> bool {
        self.fingerprint.passed()
    }

    /// True when both checks passed.
    pub fn verified(&self) -> bool {
        self.checksum_ok() && self.fingerprint_ok()
    }

    /// The failed checks as errors, checksum first.
    pub fn failures(&self) -> Vec<Error> {
        let mut failures = Vec::new();
        if !self.checksum_ok() {
            failures.push(Error::ChecksumMismatch {
                expected: self.checksum.expected,
                actual: self.checksum.actual,
            });
        }
        if !self.fingerprint_ok() {
            failures.push(Error::FingerprintMismatch {
                expected: self.fingerprint.expected.clone(),
                actual: self.fingerprint.actual.clone(),
            });
        }
        failures
    }

    /// Applies the verification policy.
    ///
    /// Strict mode turns the first failure into an error. Lenient mode logs
    /// every failure and lets the caller inspect the flags.
    pub fn enforce(&self, mode: VerificationMode) -> Result<()> {
        let mut failures = self.failures().into_iter();
        match mode {
            VerificationMode::Strict => match failures.next() {
                Some(err) => Err(err),
                None => Ok(()),
            },
            VerificationMode::Lenient => {
                for err in failures {
                    log::warn!("decompressed but unverified: {}", err);
                }
                Ok(())
            }
        }
    }
}

//! Integrity findings and the strict/lenient policy switch.

use std::fmt;

use oa_types::BlockStatus;

/// How serious a finding is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Which integrity check produced a finding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FindingCode {
    /// Text is longer than the character limit.
    TextTooLong,
    /// Encoded text or reported size exceeds the absolute byte limit.
    SizeLimitExceeded,
    /// Reported `size_bytes` deviates from the encoded length by more than 8%.
    SizeMismatch,
    /// `hash_sha256` does not match the encoded text.
    HashMismatch,
    /// `seq` is outside `1..=total_seqs`.
    SequenceOutOfRange,
    /// The declared encoding was unusable; UTF-8 was used instead.
    EncodingFallback,
}

impl FindingCode {
    /// Codes that a damaged or binary block may carry without failing.
    pub fn is_demotable(&self) -> bool {
        matches!(
            self,
            Self::TextTooLong | Self::SizeLimitExceeded | Self::SizeMismatch | Self::HashMismatch
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TextTooLong => "text_too_long",
            Self::SizeLimitExceeded => "size_limit_exceeded",
            Self::SizeMismatch => "size_mismatch",
            Self::HashMismatch => "hash_mismatch",
            Self::SequenceOutOfRange => "sequence_out_of_range",
            Self::EncodingFallback => "encoding_fallback",
        }
    }
}

impl fmt::Display for FindingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single integrity observation about a block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Finding {
    pub severity: Severity,
    pub code: FindingCode,
    pub detail: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.code, self.detail)
    }
}

/// Whether hard findings fail the read or are recorded and returned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Policy {
    /// Any error-severity finding raises.
    #[default]
    Strict,
    /// Everything is recorded as a warning and the block is returned.
    Lenient,
}

impl Policy {
    /// Healthy blocks are checked strictly, degraded ones leniently.
    pub fn for_status(status: BlockStatus) -> Self {
        if status.is_degraded() {
            Self::Lenient
        } else {
            Self::Strict
        }
    }

    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Strict)
    }
}

/// Everything the integrity checker found about one block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntegrityReport {
    pub block_id: String,
    pub policy: Policy,
    /// Encoding the size and hash checks actually used.
    pub effective_encoding: String,
    /// Length of the text in the effective encoding.
    pub encoded_len: u64,
    pub findings: Vec<Finding>,
}

impl IntegrityReport {
    /// Returns `true` if no check produced a finding.
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    /// Returns `true` if any finding has error severity.
    pub fn has_errors(&self) -> bool {
        self.findings.iter().any(|f| f.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.severity == Severity::Warning)
    }
}

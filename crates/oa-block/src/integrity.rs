//! Semantic and integrity checks on a structurally valid block.
//!
//! Checks run in a fixed order and never short-circuit each other, so a
//! lenient caller sees every problem and a strict failure lists every hard
//! violation at once:
//!
//! 1. text length (at most 20 000 characters)
//! 2. encoding with the declared encoding (UTF-8 fallback when lenient)
//! 3. absolute size limit and size tolerance against `size_bytes`
//! 4. SHA-256 of the encoded text against `hash_sha256`
//! 5. sequence bounds `1 <= seq <= total_seqs`
//!
//! Damaged and binary blocks have length, size and hash findings capped at
//! warning severity. The only early exit is a strict-mode encoding failure,
//! since the size and hash checks need the encoded bytes.

use std::borrow::Cow;

use oa_types::{Block, MAX_BLOCK_BYTES, MAX_TEXT_CHARS};
use tracing::{debug, error, warn};

use crate::digest::{sha256_hex, verify_sha256};
use crate::encoding::encode;
use crate::error::{BlockError, Result};
use crate::finding::{Finding, FindingCode, IntegrityReport, Policy, Severity};

/// Allowed relative deviation of `size_bytes` from the encoded length, in
/// percent.
pub const SIZE_TOLERANCE_PERCENT: u64 = 8;

const FALLBACK_ENCODING: &str = "utf-8";

/// Run every integrity check on `block` under `policy`.
///
/// In strict mode any error-severity finding (after status demotion) fails
/// with [`BlockError::Validation`] listing all of them, and an unusable
/// encoding fails with [`BlockError::Encoding`]. In lenient mode every
/// finding is downgraded to a warning and the report is returned.
pub fn check_integrity(block: &Block, policy: Policy) -> Result<IntegrityReport> {
    let mut findings = Findings::new(block, policy);

    let chars = block.text_chars();
    if chars > MAX_TEXT_CHARS {
        findings.push(
            FindingCode::TextTooLong,
            format!("text length {chars} > {MAX_TEXT_CHARS}"),
        );
    }

    let (effective_encoding, encoded): (&str, Cow<'_, [u8]>) = match encode(&block.text, &block.encoding) {
        Ok(bytes) => (block.encoding.as_str(), bytes),
        Err(failure) if policy.is_strict() => {
            error!(block_id = %block.block_id, encoding = %block.encoding, "{failure}");
            return Err(BlockError::Encoding {
                block_id: block.block_id.clone(),
                encoding: block.encoding.clone(),
                reason: failure.to_string(),
            });
        }
        Err(failure) => {
            findings.push(
                FindingCode::EncodingFallback,
                format!("{failure}; using {FALLBACK_ENCODING} as fallback"),
            );
            (FALLBACK_ENCODING, Cow::Borrowed(block.text.as_bytes()))
        }
    };

    let actual = encoded.len() as u64;
    if actual > MAX_BLOCK_BYTES || block.size_bytes > MAX_BLOCK_BYTES {
        findings.push(
            FindingCode::SizeLimitExceeded,
            format!(
                "encoded size {actual} bytes, recorded {} bytes, limit {MAX_BLOCK_BYTES}",
                block.size_bytes
            ),
        );
    }
    if size_out_of_tolerance(block.size_bytes, actual) {
        findings.push(
            FindingCode::SizeMismatch,
            format!(
                "size_bytes mismatch: recorded {}, computed {actual} (diff {} bytes)",
                block.size_bytes,
                block.size_bytes.abs_diff(actual)
            ),
        );
    }

    if !verify_sha256(&encoded, &block.hash_sha256) {
        findings.push(
            FindingCode::HashMismatch,
            format!(
                "hash mismatch: recorded {}, computed {}",
                block.hash_sha256,
                sha256_hex(&encoded)
            ),
        );
    }

    if !block.seq_in_range() {
        findings.push(
            FindingCode::SequenceOutOfRange,
            format!(
                "sequence number {} outside of range 1..{}",
                block.seq, block.total_seqs
            ),
        );
    }

    if block.status.is_degraded() {
        warn!(block_id = %block.block_id, status = %block.status, "block status is degraded");
    }

    let findings = findings.finish();
    if policy.is_strict() {
        let hard: Vec<Finding> = findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
            .cloned()
            .collect();
        if !hard.is_empty() {
            return Err(BlockError::Validation {
                block_id: block.block_id.clone(),
                findings: hard,
            });
        }
    }

    debug!(
        block_id = %block.block_id,
        findings = findings.len(),
        encoding = effective_encoding,
        "integrity checks complete"
    );
    Ok(IntegrityReport {
        block_id: block.block_id.clone(),
        policy,
        effective_encoding: effective_encoding.to_string(),
        encoded_len: actual,
        findings,
    })
}

/// Returns `true` when `|recorded - actual| / actual` exceeds the tolerance.
///
/// Computed in integers so the boundary is exact: 8.00% passes, anything
/// above fails. An empty encoding tolerates only a recorded size of zero.
pub fn size_out_of_tolerance(recorded: u64, actual: u64) -> bool {
    if actual == 0 {
        return recorded != 0;
    }
    let diff = u128::from(recorded.abs_diff(actual));
    diff * 100 > u128::from(actual) * u128::from(SIZE_TOLERANCE_PERCENT)
}

/// Collects findings, applying status demotion and lenient downgrading, and
/// logs each one at its final severity.
struct Findings<'a> {
    block: &'a Block,
    policy: Policy,
    items: Vec<Finding>,
}

impl<'a> Findings<'a> {
    fn new(block: &'a Block, policy: Policy) -> Self {
        Self {
            block,
            policy,
            items: Vec::new(),
        }
    }

    fn push(&mut self, code: FindingCode, detail: String) {
        let natural = match code {
            FindingCode::EncodingFallback => Severity::Warning,
            _ => Severity::Error,
        };
        let severity = if !self.policy.is_strict() || (self.block.status.is_degraded() && code.is_demotable()) {
            Severity::Warning
        } else {
            natural
        };

        match severity {
            Severity::Warning => warn!(block_id = %self.block.block_id, code = %code, "{detail}"),
            Severity::Error => error!(block_id = %self.block.block_id, code = %code, "{detail}"),
        }
        self.items.push(Finding {
            severity,
            code,
            detail,
        });
    }

    fn finish(self) -> Vec<Finding> {
        self.items
    }
}

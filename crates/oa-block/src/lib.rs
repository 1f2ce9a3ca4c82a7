//! Block validation for the operator archive.
//!
//! A block file goes through three layers before anyone may use it:
//!
//! 1. JSON parsing ([`BlockError::MalformedJson`] on failure)
//! 2. the closed-field contract in [`oa_types::BLOCK_SHAPE`]
//!    ([`BlockError::Schema`])
//! 3. the integrity checks in [`integrity`]: length, byte size, hash,
//!    sequence bounds, and encoding
//!
//! The third layer is governed by a [`Policy`]. Strict mode turns hard
//! findings into [`BlockError::Validation`]; lenient mode records them as
//! warnings and still returns the block.
//!
//! # Modules
//!
//! - [`reader`]: [`BlockReader`] and [`read_block`]
//! - [`integrity`]: [`check_integrity`]
//! - [`finding`]: [`Finding`], [`Severity`], [`Policy`], [`IntegrityReport`]
//! - [`encoding`]: named character encodings
//! - [`digest`]: SHA-256 helpers

pub mod digest;
pub mod encoding;
pub mod error;
pub mod finding;
pub mod integrity;
pub mod reader;

pub use digest::{sha256_hex, verify_sha256};
pub use encoding::EncodeFailure;
pub use error::{BlockError, Result};
pub use finding::{Finding, FindingCode, IntegrityReport, Policy, Severity};
pub use integrity::{check_integrity, size_out_of_tolerance};
pub use reader::{read_block, BlockReader, ValidatedBlock};

//! Record types for the operator archive.
//!
//! Every record here is a closed contract: its Rust type derives
//! `deny_unknown_fields`, and a matching static [`oa_schema::Shape`] is
//! declared beside it so raw JSON can be checked field by field before
//! conversion.
//!
//! # Key Types
//!
//! - [`Block`]: a validated slice of archived text with integrity metadata
//! - [`QueueEntry`] / [`TaskStatus`]: one analysis task and its lifecycle
//! - [`AnalysisResult`] / [`AnalysisPayload`]: the write-once result record
//! - [`AnalysisErrorRecord`] / [`ErrorType`]: a failed analysis attempt
//! - [`Timestamp`]: UTC instant used for all time fields

pub mod analysis;
pub mod block;
pub mod error;
pub mod task;
pub mod temporal;

pub use analysis::{
    AnalysisClass, AnalysisErrorRecord, AnalysisPayload, AnalysisResult, ErrorType, Signals,
    ANALYSIS_ERROR_SHAPE, ANALYSIS_PAYLOAD_SHAPE, ANALYSIS_RESULT_SHAPE, MAX_KEYWORDS,
};
pub use block::{Block, BlockStatus, BLOCK_SHAPE, MAX_BLOCK_BYTES, MAX_TEXT_CHARS};
pub use error::TypeError;
pub use task::{QueueEntry, TaskStatus, QUEUE_ENTRY_SHAPE};
pub use temporal::{format_timestamp, now, parse_timestamp, Timestamp};

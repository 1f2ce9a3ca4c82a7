//! Result and error files produced by the analysis step.
//!
//! - [`ResultWriter`] stores one write-once result per block in
//!   `Archive/AnalysisResults/`.
//! - [`ErrorWriter`] stores every failed attempt in `Archive/AnalysisErrors/`
//!   without overwriting earlier ones.
//!
//! Both validate the record against its contract from [`oa_types`] before
//! anything is written.

pub mod error;
pub mod failure;
mod files;
pub mod result;

pub use error::{ArchiveError, Result};
pub use failure::ErrorWriter;
pub use result::ResultWriter;

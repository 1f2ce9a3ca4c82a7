//! Closed-field record validation for the operator archive.
//!
//! Every record the system reads or writes (blocks, queue log lines,
//! analysis results, analysis errors) has a fixed set of required fields and
//! forbids anything else. Those contracts are declared as data, a static
//! [`Shape`] per record, and enforced by the one [`validate`] function.
//!
//! # Modules
//!
//! - [`shape`]: [`Shape`], [`FieldSpec`], [`FieldKind`] field tables
//! - [`validate`](mod@validate): the validator and [`parse`] helper
//! - [`error`]: [`SchemaViolation`] and [`SchemaError`]

pub mod error;
pub mod shape;
pub mod validate;

pub use error::{Result, SchemaError, SchemaViolation, ViolationReason};
pub use shape::{FieldKind, FieldSpec, Shape};
pub use validate::{parse, validate};

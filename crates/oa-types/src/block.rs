//! Archive blocks: fixed-contract slices of a larger source text.

use std::fmt;
use std::str::FromStr;

use oa_schema::{FieldKind, FieldSpec, SchemaError, Shape};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TypeError;

/// Maximum number of characters allowed in [`Block::text`].
pub const MAX_TEXT_CHARS: usize = 20_000;

/// Maximum encoded size of a block, in bytes (1 MiB).
pub const MAX_BLOCK_BYTES: u64 = 1_048_576;

/// Field table for block files.
pub static BLOCK_SHAPE: Shape = Shape {
    name: "block",
    fields: &[
        FieldSpec::new("block_id", FieldKind::String),
        FieldSpec::new("parent_sha256", FieldKind::HexDigest),
        FieldSpec::new("src_file", FieldKind::String),
        FieldSpec::new("seq", FieldKind::Integer),
        FieldSpec::new("total_seqs", FieldKind::Integer),
        FieldSpec::new("encoding", FieldKind::String),
        FieldSpec::new("lng", FieldKind::String),
        FieldSpec::new("status", FieldKind::OneOf(&["ok", "damaged", "binary"])),
        FieldSpec::new("size_bytes", FieldKind::NonNegativeInteger),
        FieldSpec::new("hash_sha256", FieldKind::HexDigest),
        FieldSpec::new("tags", FieldKind::StringList { max_items: None }),
        FieldSpec::new("text", FieldKind::String),
    ],
};

/// Health of a block as reported by the producer that cut it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockStatus {
    Ok,
    Damaged,
    Binary,
}

impl BlockStatus {
    /// Damaged and binary blocks are expected to be imperfect.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Damaged | Self::Binary)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Damaged => "damaged",
            Self::Binary => "binary",
        }
    }
}

impl fmt::Display for BlockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockStatus {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ok" => Ok(Self::Ok),
            "damaged" => Ok(Self::Damaged),
            "binary" => Ok(Self::Binary),
            other => Err(TypeError::UnknownBlockStatus(other.to_string())),
        }
    }
}

/// A slice of archived text with its integrity metadata.
///
/// Blocks are read-only once parsed. `seq` and `total_seqs` are kept signed
/// so out-of-range values survive parsing and can be reported by the
/// integrity checks instead of failing deserialization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Block {
    pub block_id: String,
    /// SHA-256 of the original full text this block was cut from.
    pub parent_sha256: String,
    pub src_file: String,
    pub seq: i64,
    pub total_seqs: i64,
    /// Name of the character encoding `size_bytes` and `hash_sha256` refer to.
    pub encoding: String,
    pub lng: String,
    pub status: BlockStatus,
    pub size_bytes: u64,
    pub hash_sha256: String,
    pub tags: Vec<String>,
    pub text: String,
}

impl Block {
    /// Validate a raw record against [`BLOCK_SHAPE`] and convert it.
    pub fn from_value(value: Value) -> Result<Self, SchemaError> {
        oa_schema::parse(value, &BLOCK_SHAPE)
    }

    /// Number of characters (Unicode scalar values) in the text.
    pub fn text_chars(&self) -> usize {
        self.text.chars().count()
    }

    /// Returns `true` if `seq` lies within `1..=total_seqs`.
    pub fn seq_in_range(&self) -> bool {
        1 <= self.seq && self.seq <= self.total_seqs
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn raw() -> Value {
        json!({
            "block_id": "doc-0001",
            "parent_sha256": "0".repeat(64),
            "src_file": "letters/1998.txt",
            "seq": 1,
            "total_seqs": 3,
            "encoding": "utf-8",
            "lng": "en",
            "status": "ok",
            "size_bytes": 2,
            "hash_sha256": "f".repeat(64),
            "tags": ["letters"],
            "text": "hi"
        })
    }

    #[test]
    fn parses_valid_block() {
        let block = Block::from_value(raw()).unwrap();
        assert_eq!(block.block_id, "doc-0001");
        assert_eq!(block.status, BlockStatus::Ok);
        assert!(block.seq_in_range());
        assert_eq!(block.text_chars(), 2);
    }

    #[test]
    fn rejects_unknown_status() {
        let mut v = raw();
        v["status"] = json!("corrupt");
        assert!(Block::from_value(v).is_err());
    }

    #[test]
    fn rejects_extra_field() {
        let mut v = raw();
        v["comment"] = json!("x");
        let err = Block::from_value(v).unwrap_err();
        assert!(err.to_string().contains("comment"));
    }

    #[test]
    fn out_of_range_seq_still_parses() {
        let mut v = raw();
        v["seq"] = json!(0);
        let block = Block::from_value(v).unwrap();
        assert!(!block.seq_in_range());
    }

    #[test]
    fn char_count_is_not_byte_count() {
        let mut v = raw();
        v["text"] = json!("привет");
        let block = Block::from_value(v).unwrap();
        assert_eq!(block.text_chars(), 6);
        assert_eq!(block.text.len(), 12);
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [BlockStatus::Ok, BlockStatus::Damaged, BlockStatus::Binary] {
            assert_eq!(status.as_str().parse::<BlockStatus>().unwrap(), status);
        }
        assert!(BlockStatus::Binary.is_degraded());
        assert!(!BlockStatus::Ok.is_degraded());
    }
}

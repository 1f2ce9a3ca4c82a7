//! Field tables describing closed record shapes.
//!
//! A [`Shape`] is plain static data: a name and an ordered list of
//! [`FieldSpec`]s. Every contract in the system (block, queue entry,
//! analysis result, analysis error) is declared as a `static Shape` next to
//! its Rust type and checked by the single validator in [`crate::validate`].

/// Semantic type of a field.
#[derive(Debug)]
pub enum FieldKind {
    /// Any JSON string.
    String,
    /// A 64-character hexadecimal SHA-256 digest.
    HexDigest,
    /// A JSON integer that fits in an `i64`.
    Integer,
    /// A JSON integer `>= 0`.
    NonNegativeInteger,
    /// A string drawn from a fixed set of values.
    OneOf(&'static [&'static str]),
    /// An array of strings, optionally bounded in length.
    StringList { max_items: Option<usize> },
    /// An ISO 8601 date-time string; a value without a zone is read as UTC.
    Timestamp,
    /// A nested closed record.
    Object(&'static Shape),
    /// `null` or a value of the inner kind.
    Nullable(&'static FieldKind),
}

impl FieldKind {
    /// Human-readable description used in violation messages.
    pub fn describe(&self) -> String {
        match self {
            Self::String => "string".into(),
            Self::HexDigest => "64-character hex digest".into(),
            Self::Integer => "integer".into(),
            Self::NonNegativeInteger => "non-negative integer".into(),
            Self::OneOf(values) => format!("one of [{}]", values.join(", ")),
            Self::StringList { .. } => "array of strings".into(),
            Self::Timestamp => "ISO 8601 timestamp".into(),
            Self::Object(shape) => format!("{} object", shape.name),
            Self::Nullable(inner) => format!("{} or null", inner.describe()),
        }
    }
}

/// One declared field of a shape.
#[derive(Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

/// A closed record contract: every field is required and no other key is
/// allowed.
#[derive(Debug)]
pub struct Shape {
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
}

impl Shape {
    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static INNER: Shape = Shape {
        name: "inner",
        fields: &[FieldSpec::new("x", FieldKind::Integer)],
    };

    static OUTER: Shape = Shape {
        name: "outer",
        fields: &[
            FieldSpec::new("id", FieldKind::String),
            FieldSpec::new("inner", FieldKind::Object(&INNER)),
            FieldSpec::new("note", FieldKind::Nullable(&FieldKind::String)),
        ],
    };

    #[test]
    fn field_lookup() {
        assert!(OUTER.field("inner").is_some());
        assert!(OUTER.field("missing").is_none());
    }

    #[test]
    fn describe_kinds() {
        assert_eq!(FieldKind::Nullable(&FieldKind::Timestamp).describe(), "ISO 8601 timestamp or null");
        assert_eq!(FieldKind::OneOf(&["a", "b"]).describe(), "one of [a, b]");
        assert_eq!(FieldKind::Object(&INNER).describe(), "inner object");
    }
}

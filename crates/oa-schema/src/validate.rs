//! The generic closed-field validator.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{Result, SchemaError, SchemaViolation, ViolationReason};
use crate::shape::{FieldKind, Shape};

/// Validate a raw JSON value against a shape.
///
/// Declared fields are checked in table order, then any key outside the
/// declared set is reported. The first violation found is returned.
pub fn validate(value: &Value, shape: &'static Shape) -> Result<()> {
    validate_at(value, shape, "")
}

/// Validate a raw JSON value against a shape, then deserialize it.
pub fn parse<T: DeserializeOwned>(value: Value, shape: &'static Shape) -> std::result::Result<T, SchemaError> {
    validate(&value, shape)?;
    Ok(serde_json::from_value(value)?)
}

fn validate_at(value: &Value, shape: &'static Shape, prefix: &str) -> Result<()> {
    let Some(map) = value.as_object() else {
        return Err(SchemaViolation::new(shape.name, prefix, ViolationReason::NotAnObject));
    };

    for spec in shape.fields {
        let path = join(prefix, spec.name);
        let Some(field) = map.get(spec.name) else {
            return Err(SchemaViolation::new(shape.name, path, ViolationReason::Missing));
        };
        check_kind(field, &spec.kind, shape, &path)?;
    }

    check_closed(map, shape, prefix)
}

fn check_closed(map: &Map<String, Value>, shape: &'static Shape, prefix: &str) -> Result<()> {
    // serde_json's default map is sorted, so the reported key is stable.
    match map.keys().find(|key| shape.field(key).is_none()) {
        Some(key) => Err(SchemaViolation::new(
            shape.name,
            join(prefix, key),
            ViolationReason::Unexpected,
        )),
        None => Ok(()),
    }
}

fn check_kind(value: &Value, kind: &FieldKind, shape: &'static Shape, path: &str) -> Result<()> {
    let wrong_type = || {
        SchemaViolation::new(
            shape.name,
            path,
            ViolationReason::WrongType {
                expected: kind.describe(),
            },
        )
    };

    match kind {
        FieldKind::String => value.as_str().map(|_| ()).ok_or_else(wrong_type),
        FieldKind::HexDigest => match value.as_str() {
            Some(s) if is_hex_digest(s) => Ok(()),
            _ => Err(wrong_type()),
        },
        FieldKind::Integer => value.as_i64().map(|_| ()).ok_or_else(wrong_type),
        FieldKind::NonNegativeInteger => value.as_u64().map(|_| ()).ok_or_else(wrong_type),
        FieldKind::OneOf(allowed) => match value.as_str() {
            Some(s) if allowed.contains(&s) => Ok(()),
            _ => Err(wrong_type()),
        },
        FieldKind::StringList { max_items } => {
            let items = value.as_array().ok_or_else(wrong_type)?;
            if !items.iter().all(Value::is_string) {
                return Err(wrong_type());
            }
            match max_items {
                Some(max) if items.len() > *max => Err(SchemaViolation::new(
                    shape.name,
                    path,
                    ViolationReason::TooManyItems {
                        max: *max,
                        actual: items.len(),
                    },
                )),
                _ => Ok(()),
            }
        }
        FieldKind::Timestamp => match value.as_str() {
            Some(s) if is_timestamp(s) => Ok(()),
            _ => Err(wrong_type()),
        },
        FieldKind::Object(inner) => {
            if !value.is_object() {
                return Err(wrong_type());
            }
            validate_at(value, *inner, path).map_err(|mut v| {
                // Report against the outermost shape so callers see one name.
                v.shape = shape.name;
                v
            })
        }
        FieldKind::Nullable(inner) => {
            if value.is_null() {
                Ok(())
            } else {
                check_kind(value, *inner, shape, path).map_err(|_| wrong_type())
            }
        }
    }
}

/// RFC 3339, or an ISO 8601 date-time without a zone.
fn is_timestamp(s: &str) -> bool {
    let s = s.trim();
    chrono::DateTime::parse_from_rfc3339(s).is_ok() || s.parse::<chrono::NaiveDateTime>().is_ok()
}

fn is_hex_digest(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::shape::FieldSpec;

    static COORDS: Shape = Shape {
        name: "coords",
        fields: &[
            FieldSpec::new("lat", FieldKind::Integer),
            FieldSpec::new("tags", FieldKind::StringList { max_items: Some(2) }),
        ],
    };

    static RECORD: Shape = Shape {
        name: "record",
        fields: &[
            FieldSpec::new("id", FieldKind::String),
            FieldSpec::new("digest", FieldKind::HexDigest),
            FieldSpec::new("count", FieldKind::NonNegativeInteger),
            FieldSpec::new("state", FieldKind::OneOf(&["on", "off"])),
            FieldSpec::new("at", FieldKind::Timestamp),
            FieldSpec::new("ended", FieldKind::Nullable(&FieldKind::Timestamp)),
            FieldSpec::new("coords", FieldKind::Object(&COORDS)),
        ],
    };

    fn valid() -> Value {
        json!({
            "id": "r-1",
            "digest": "a".repeat(64),
            "count": 3,
            "state": "on",
            "at": "2024-05-01T10:00:00Z",
            "ended": null,
            "coords": { "lat": -4, "tags": ["x"] }
        })
    }

    fn violation(value: Value) -> SchemaViolation {
        validate(&value, &RECORD).unwrap_err()
    }

    #[test]
    fn valid_record_passes() {
        validate(&valid(), &RECORD).unwrap();
    }

    #[test]
    fn missing_field_is_named() {
        let mut v = valid();
        v.as_object_mut().unwrap().remove("count");
        let err = violation(v);
        assert_eq!(err.field, "count");
        assert_eq!(err.reason, ViolationReason::Missing);
    }

    #[test]
    fn extra_field_is_rejected() {
        let mut v = valid();
        v["surprise"] = json!(1);
        let err = violation(v);
        assert_eq!(err.field, "surprise");
        assert_eq!(err.reason, ViolationReason::Unexpected);
    }

    #[test]
    fn wrong_types_are_rejected() {
        let cases = [
            ("id", json!(7)),
            ("digest", json!("abc")),
            ("count", json!(-1)),
            ("count", json!(1.5)),
            ("state", json!("dim")),
            ("at", json!("yesterday")),
            ("ended", json!(12)),
        ];
        for (field, bad) in cases {
            let mut v = valid();
            v[field] = bad;
            let err = violation(v);
            assert_eq!(err.field, field);
            assert!(matches!(err.reason, ViolationReason::WrongType { .. }), "{field}");
        }
    }

    #[test]
    fn nullable_accepts_inner_kind() {
        let mut v = valid();
        v["ended"] = json!("2024-05-01T11:00:00+02:00");
        validate(&v, &RECORD).unwrap();
    }

    #[test]
    fn nested_violation_has_dotted_path() {
        let mut v = valid();
        v["coords"]["tags"] = json!(["a", "b", "c"]);
        let err = violation(v);
        assert_eq!(err.shape, "record");
        assert_eq!(err.field, "coords.tags");
        assert_eq!(err.reason, ViolationReason::TooManyItems { max: 2, actual: 3 });

        let mut v = valid();
        v["coords"]["extra"] = json!(true);
        assert_eq!(violation(v).field, "coords.extra");
    }

    #[test]
    fn non_object_root() {
        let err = validate(&json!([1, 2]), &RECORD).unwrap_err();
        assert_eq!(err.reason, ViolationReason::NotAnObject);
        assert!(err.field.is_empty());
    }

    #[test]
    fn parse_into_struct() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Coords {
            lat: i64,
            tags: Vec<String>,
        }
        let coords: Coords = parse(json!({"lat": 1, "tags": []}), &COORDS).unwrap();
        assert_eq!(coords.lat, 1);

        let err = parse::<Coords>(json!({"lat": "1", "tags": []}), &COORDS).unwrap_err();
        assert!(matches!(err, SchemaError::Violation(_)));
    }

    #[test]
    fn display_names_shape_and_field() {
        let mut v = valid();
        v.as_object_mut().unwrap().remove("id");
        assert_eq!(
            violation(v).to_string(),
            "schema violation in record: id: required field is missing"
        );
    }

    #[test]
    fn zoneless_timestamps_pass() {
        let mut v = valid();
        v["at"] = json!("2024-05-01T10:00:00");
        v["ended"] = json!("2024-05-01T10:00:00.123456");
        validate(&v, &RECORD).unwrap();
    }

    #[test]
    fn integer_must_fit_i64() {
        let mut v = valid();
        v["coords"]["lat"] = json!(u64::MAX);
        let err = violation(v);
        assert_eq!(err.field, "coords.lat");
        assert!(matches!(err.reason, ViolationReason::WrongType { .. }));
    }
}

//! Declarative validation of wire payloads.
//!
//! Every message shape implements [`Schema`]. Validation reads a raw
//! `serde_json::Value`, checks the discriminant of tagged unions before
//! anything else, then checks only the fields of the matching variant.
//! It never panics and keeps no state between calls.

use serde_json::{Map, Value};
use std::fmt;
use url::Url;

/// Path of the document root in error messages.
pub const ROOT: &str = "$";

/// A payload failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{path}: {kind}")]
pub struct ValidationError {
    /// Location of the offending value, e.g. `$.notificationDetails.url`.
    pub path: String,
    pub kind: ErrorKind,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Shorthand for an [`ErrorKind::InvalidFormat`] error.
    pub fn format(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(path, ErrorKind::InvalidFormat(reason.into()))
    }
}

/// What went wrong at [`ValidationError::path`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    /// The discriminant is absent or not one of the declared literals.
    #[error("unknown variant for `{field}`: {}", .found.as_deref().unwrap_or("<missing>"))]
    UnknownVariant {
        field: String,
        found: Option<String>,
    },
    #[error("missing required field")]
    MissingField,
    #[error("expected {expected}, got {found}")]
    InvalidType {
        expected: &'static str,
        found: JsonType,
    },
    #[error("{0}")]
    InvalidFormat(String),
    #[error("unexpected field `{0}`")]
    UnexpectedField(String),
    /// Exactly one of the listed keys must be present.
    #[error("expected exactly one of {}", .0.join(", "))]
    ExclusiveKeys(Vec<&'static str>),
}

/// JSON type names used in [`ErrorKind::InvalidType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonType {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl JsonType {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Bool,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Null => "null",
            Self::Bool => "boolean",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
        };
        f.write_str(name)
    }
}

/// A wire shape that can be validated from raw JSON.
pub trait Schema: Sized {
    /// Validate `raw`, reporting errors relative to `path`.
    fn validate_at(raw: &Value, path: &str) -> Result<Self, ValidationError>;

    fn validate(raw: &Value) -> Result<Self, ValidationError> {
        Self::validate_at(raw, ROOT)
    }
}

/// Parameters of actions that take none; whatever was sent is ignored.
impl Schema for () {
    fn validate_at(_raw: &Value, _path: &str) -> Result<Self, ValidationError> {
        Ok(())
    }
}

/// Validate `raw` as `T`.
pub fn validate<T: Schema>(raw: &Value) -> Result<T, ValidationError> {
    T::validate(raw)
}

/// Read-only view of a JSON object with path-aware field accessors.
///
/// An explicit `null` is a present value, not an absent field. Optional
/// accessors reject it as a type error.
#[derive(Debug, Clone, Copy)]
pub struct Object<'a> {
    map: &'a Map<String, Value>,
    path: &'a str,
}

impl<'a> Object<'a> {
    /// View `raw` as an object, failing with `InvalidType` at `path` otherwise.
    pub fn new(raw: &'a Value, path: &'a str) -> Result<Self, ValidationError> {
        match raw {
            Value::Object(map) => Ok(Self { map, path }),
            other => Err(ValidationError::new(
                path,
                ErrorKind::InvalidType {
                    expected: "object",
                    found: JsonType::of(other),
                },
            )),
        }
    }

    pub fn path(&self) -> &'a str {
        self.path
    }

    /// Path of a child field.
    pub fn child(&self, key: &str) -> String {
        format!("{}.{}", self.path, key)
    }

    /// An error located at the child field `key`.
    pub fn error(&self, key: &str, kind: ErrorKind) -> ValidationError {
        ValidationError::new(self.child(key), kind)
    }

    /// The raw value under `key`, `null` included.
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &'a str> + 'a {
        self.map.keys().map(String::as_str)
    }

    /// Fail on any key not listed in `allowed`.
    pub fn deny_unknown(&self, allowed: &[&str]) -> Result<(), ValidationError> {
        match self.keys().find(|k| !allowed.contains(k)) {
            Some(key) => Err(self.error(key, ErrorKind::UnexpectedField(key.to_string()))),
            None => Ok(()),
        }
    }

    /// The value under `key`, or `MissingField` when the key is absent.
    pub fn required(&self, key: &str) -> Result<&'a Value, ValidationError> {
        self.get(key)
            .ok_or_else(|| self.error(key, ErrorKind::MissingField))
    }

    /// Read a tagged-union discriminant, accepting only `allowed` literals.
    pub fn discriminant(&self, key: &str, allowed: &[&str]) -> Result<&'a str, ValidationError> {
        match self.get(key) {
            Some(Value::String(tag)) if allowed.contains(&tag.as_str()) => Ok(tag.as_str()),
            other => Err(self.unknown_variant(key, other)),
        }
    }

    /// Read a discriminant and map it to the variant whose `tag_of` matches.
    pub fn variant<K: Copy>(
        &self,
        key: &str,
        variants: &[K],
        tag_of: impl Fn(K) -> &'static str,
    ) -> Result<K, ValidationError> {
        let found = self.get(key);
        found
            .and_then(Value::as_str)
            .and_then(|tag| variants.iter().copied().find(|&k| tag_of(k) == tag))
            .ok_or_else(|| self.unknown_variant(key, found))
    }

    fn unknown_variant(&self, key: &str, found: Option<&Value>) -> ValidationError {
        let found = found.map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });
        self.error(
            key,
            ErrorKind::UnknownVariant {
                field: key.to_string(),
                found,
            },
        )
    }

    pub fn required_str(&self, key: &str) -> Result<&'a str, ValidationError> {
        let value = self.required(key)?;
        value
            .as_str()
            .ok_or_else(|| self.type_error(key, "string", value))
    }

    /// `None` only when the key is absent; `null` is a type error.
    pub fn optional_str(&self, key: &str) -> Result<Option<&'a str>, ValidationError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(self.type_error(key, "string", other)),
        }
    }

    /// A required string of at least one and at most `max` characters.
    pub fn bounded_str(&self, key: &str, max: usize) -> Result<&'a str, ValidationError> {
        let s = self.required_str(key)?;
        check_len(self, key, s, max)?;
        Ok(s)
    }

    pub fn optional_bounded_str(
        &self,
        key: &str,
        max: usize,
    ) -> Result<Option<&'a str>, ValidationError> {
        match self.optional_str(key)? {
            Some(s) => check_len(self, key, s, max).map(|()| Some(s)),
            None => Ok(None),
        }
    }

    pub fn required_u64(&self, key: &str) -> Result<u64, ValidationError> {
        let value = self.required(key)?;
        value
            .as_u64()
            .ok_or_else(|| self.type_error(key, "non-negative integer", value))
    }

    pub fn required_object(&self, key: &str) -> Result<&'a Value, ValidationError> {
        let value = self.required(key)?;
        if value.is_object() {
            Ok(value)
        } else {
            Err(self.type_error(key, "object", value))
        }
    }

    pub fn string_array(&self, key: &str) -> Result<Vec<String>, ValidationError> {
        let value = self.required(key)?;
        let items = value
            .as_array()
            .ok_or_else(|| self.type_error(key, "array", value))?;
        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    ValidationError::new(
                        format!("{}[{}]", self.child(key), i),
                        ErrorKind::InvalidType {
                            expected: "string",
                            found: JsonType::of(item),
                        },
                    )
                })
            })
            .collect()
    }

    /// A required `https://` URL, at most `max` characters.
    pub fn secure_url(&self, key: &str, max: usize) -> Result<&'a str, ValidationError> {
        let s = self.bounded_str(key, max)?;
        check_url(self, key, s, &["https"])?;
        Ok(s)
    }

    pub fn optional_secure_url(
        &self,
        key: &str,
        max: usize,
    ) -> Result<Option<&'a str>, ValidationError> {
        match self.optional_bounded_str(key, max)? {
            Some(s) => check_url(self, key, s, &["https"]).map(|()| Some(s)),
            None => Ok(None),
        }
    }

    /// A required absolute `http://` or `https://` URL.
    pub fn web_url(&self, key: &str) -> Result<&'a str, ValidationError> {
        let s = self.required_str(key)?;
        check_url(self, key, s, &["http", "https"])?;
        Ok(s)
    }

    /// An optional `#rgb` or `#rrggbb` colour.
    pub fn optional_hex_color(&self, key: &str) -> Result<Option<&'a str>, ValidationError> {
        let Some(s) = self.optional_str(key)? else {
            return Ok(None);
        };
        let digits = s.strip_prefix('#').unwrap_or("");
        let valid = matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit());
        if valid {
            Ok(Some(s))
        } else {
            Err(self.error(
                key,
                ErrorKind::InvalidFormat(format!("invalid hex color: {s}")),
            ))
        }
    }

    fn type_error(&self, key: &str, expected: &'static str, found: &Value) -> ValidationError {
        self.error(
            key,
            ErrorKind::InvalidType {
                expected,
                found: JsonType::of(found),
            },
        )
    }
}

fn check_len(obj: &Object<'_>, key: &str, s: &str, max: usize) -> Result<(), ValidationError> {
    let len = s.chars().count();
    if len == 0 {
        return Err(obj.error(key, ErrorKind::InvalidFormat("must not be empty".into())));
    }
    if len > max {
        return Err(obj.error(
            key,
            ErrorKind::InvalidFormat(format!("must be at most {max} characters, got {len}")),
        ));
    }
    Ok(())
}

fn check_url(
    obj: &Object<'_>,
    key: &str,
    s: &str,
    schemes: &[&str],
) -> Result<(), ValidationError> {
    let url = Url::parse(s)
        .map_err(|e| obj.error(key, ErrorKind::InvalidFormat(format!("invalid url: {e}"))))?;
    if !schemes.contains(&url.scheme()) {
        let reason = if schemes == ["https"] {
            "must be a secure (https) url".to_string()
        } else {
            format!("unsupported url scheme: {}", url.scheme())
        };
        return Err(obj.error(key, ErrorKind::InvalidFormat(reason)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn non_object_is_type_error() {
        let err = Object::new(&json!([1, 2]), ROOT).unwrap_err();
        assert_eq!(err.path, "$");
        assert_eq!(
            err.kind,
            ErrorKind::InvalidType {
                expected: "object",
                found: JsonType::Array
            }
        );
    }

    #[test]
    fn discriminant_reports_offending_value() {
        let raw = json!({"event": "frame_exploded"});
        let obj = Object::new(&raw, ROOT).unwrap();
        let err = obj.discriminant("event", &["frame_added"]).unwrap_err();
        assert_eq!(err.path, "$.event");
        assert_eq!(
            err.kind,
            ErrorKind::UnknownVariant {
                field: "event".into(),
                found: Some("frame_exploded".into())
            }
        );
    }

    #[test]
    fn missing_discriminant_is_unknown_variant() {
        let raw = json!({});
        let obj = Object::new(&raw, ROOT).unwrap();
        let err = obj.discriminant("event", &["frame_added"]).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnknownVariant { found: None, .. }));
    }

    #[test]
    fn null_is_present_but_mistyped() {
        let raw = json!({"name": null});
        let obj = Object::new(&raw, ROOT).unwrap();
        let null_type = ErrorKind::InvalidType {
            expected: "string",
            found: JsonType::Null,
        };
        assert!(obj.contains("name"));
        assert_eq!(obj.optional_str("name").unwrap_err().kind, null_type);
        let err = obj.required_str("name").unwrap_err();
        assert_eq!(err.path, "$.name");
        assert_eq!(err.kind, null_type);
        assert_eq!(obj.optional_str("other").unwrap(), None);
    }

    #[test]
    fn secure_url_rejects_http() {
        let raw = json!({"imageUrl": "http://example.com/a.png"});
        let obj = Object::new(&raw, ROOT).unwrap();
        let err = obj.secure_url("imageUrl", 512).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::InvalidFormat("must be a secure (https) url".into())
        );
    }

    #[test]
    fn bounded_str_counts_chars() {
        let raw = json!({"title": "é".repeat(32)});
        let obj = Object::new(&raw, ROOT).unwrap();
        assert!(obj.bounded_str("title", 32).is_ok());
        assert!(obj.bounded_str("title", 31).is_err());
    }

    #[test]
    fn hex_color_forms() {
        for (color, ok) in [("#fff", true), ("#a1B2c3", true), ("fff", false), ("#ffff", false)] {
            let raw = json!({ "c": color });
            let obj = Object::new(&raw, ROOT).unwrap();
            assert_eq!(obj.optional_hex_color("c").is_ok(), ok, "{color}");
        }
    }

    #[test]
    fn string_array_reports_index() {
        let raw = json!({"tokens": ["a", 3]});
        let obj = Object::new(&raw, ROOT).unwrap();
        let err = obj.string_array("tokens").unwrap_err();
        assert_eq!(err.path, "$.tokens[1]");
    }
}

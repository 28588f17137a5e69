//! Structural issues reported by the constraint interpreter.
//!
//! An [`Issue`] is the raw, unlocalized description of one violated
//! constraint. It carries the [`FieldPath`] of the offending value, a typed
//! [`IssueKind`] the localizer can switch on, and a default English message
//! that is used verbatim whenever no localized template exists.

use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// One step of a [`FieldPath`]: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// Ordered sequence of keys and indices locating a value inside a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn key(&self, key: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(key.to_string()));
        Self(segments)
    }

    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    pub fn join(&self, tail: &FieldPath) -> Self {
        let mut segments = self.0.clone();
        segments.extend(tail.0.iter().cloned());
        Self(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Walk `document` along this path.
    ///
    /// Returns `None` as soon as a segment is missing or the walk reaches a
    /// value that is neither an object nor an array. Numeric segments address
    /// object keys by their decimal form and string segments address array
    /// slots when they parse as an index, mirroring loose property access on
    /// JSON documents.
    pub fn resolve<'a>(&self, document: &'a Value) -> Option<&'a Value> {
        let mut current = document;
        for segment in &self.0 {
            current = match (current, segment) {
                (Value::Object(map), PathSegment::Key(key)) => map.get(key)?,
                (Value::Object(map), PathSegment::Index(index)) => map.get(&index.to_string())?,
                (Value::Array(items), PathSegment::Index(index)) => items.get(*index)?,
                (Value::Array(items), PathSegment::Key(key)) => {
                    items.get(key.parse::<usize>().ok()?)?
                }
                _ => return None,
            };
        }
        Some(current)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

/// String format checks a schema can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StringFormat {
    Email,
    Url,
    Datetime,
    Regex,
}

impl StringFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            StringFormat::Email => "email",
            StringFormat::Url => "url",
            StringFormat::Datetime => "datetime",
            StringFormat::Regex => "regex",
        }
    }
}

impl fmt::Display for StringFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a size bound was measured on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundTarget {
    /// Character count of a string.
    String,
    /// Numeric value.
    Number,
    /// Element count of an array.
    Array,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum IssueKind {
    InvalidType {
        expected: String,
        received: String,
    },
    InvalidString {
        validation: StringFormat,
    },
    TooSmall {
        target: BoundTarget,
        minimum: f64,
        inclusive: bool,
    },
    TooBig {
        target: BoundTarget,
        maximum: f64,
        inclusive: bool,
    },
    InvalidEnumValue {
        options: Vec<String>,
        received: String,
    },
    UnrecognizedKeys {
        keys: Vec<String>,
    },
    InvalidDate,
    Custom,
}

impl IssueKind {
    /// Stable snake_case code, used for metrics and logs.
    pub fn code(&self) -> &'static str {
        match self {
            IssueKind::InvalidType { .. } => "invalid_type",
            IssueKind::InvalidString { .. } => "invalid_string",
            IssueKind::TooSmall { .. } => "too_small",
            IssueKind::TooBig { .. } => "too_big",
            IssueKind::InvalidEnumValue { .. } => "invalid_enum_value",
            IssueKind::UnrecognizedKeys { .. } => "unrecognized_keys",
            IssueKind::InvalidDate => "invalid_date",
            IssueKind::Custom => "custom",
        }
    }

    /// Default English wording, used when the schema gives no override.
    pub fn default_message(&self) -> String {
        match self {
            IssueKind::InvalidType { received, .. } if received == "undefined" => {
                "Required".to_string()
            }
            IssueKind::InvalidType { expected, received } => {
                format!("Expected {expected}, received {received}")
            }
            IssueKind::InvalidString { validation } => match validation {
                StringFormat::Regex => "Invalid".to_string(),
                other => format!("Invalid {other}"),
            },
            IssueKind::TooSmall {
                target,
                minimum,
                inclusive,
            } => match target {
                BoundTarget::String => {
                    format!("String must contain at least {minimum} character(s)")
                }
                BoundTarget::Array => {
                    format!("Array must contain at least {minimum} element(s)")
                }
                BoundTarget::Number if *inclusive => {
                    format!("Number must be greater than or equal to {minimum}")
                }
                BoundTarget::Number => format!("Number must be greater than {minimum}"),
            },
            IssueKind::TooBig {
                target,
                maximum,
                inclusive,
            } => match target {
                BoundTarget::String => {
                    format!("String must contain at most {maximum} character(s)")
                }
                BoundTarget::Array => format!("Array must contain at most {maximum} element(s)"),
                BoundTarget::Number if *inclusive => {
                    format!("Number must be less than or equal to {maximum}")
                }
                BoundTarget::Number => format!("Number must be less than {maximum}"),
            },
            IssueKind::InvalidEnumValue { options, received } => format!(
                "Invalid enum value. Expected {}, received '{received}'",
                quoted_union(options)
            ),
            IssueKind::UnrecognizedKeys { keys } => {
                let quoted: Vec<String> = keys.iter().map(|k| format!("'{k}'")).collect();
                format!("Unrecognized key(s) in object: {}", quoted.join(", "))
            }
            IssueKind::InvalidDate => "Invalid date".to_string(),
            IssueKind::Custom => "Invalid input".to_string(),
        }
    }
}

/// One violated constraint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub path: FieldPath,
    #[serde(flatten)]
    pub kind: IssueKind,
    pub message: String,
}

impl Issue {
    pub fn new(path: FieldPath, kind: IssueKind) -> Self {
        let message = kind.default_message();
        Self {
            path,
            kind,
            message,
        }
    }

    /// Replace the default wording with a schema-supplied message.
    pub fn with_message(mut self, message: Option<&str>) -> Self {
        if let Some(message) = message {
            self.message = message.to_string();
        }
        self
    }
}

/// JSON type name as reported in `invalid_type` issues.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub(crate) fn quoted_union(options: &[String]) -> String {
    options
        .iter()
        .map(|option| format!("'{option}'"))
        .collect::<Vec<_>>()
        .join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn path_display_joins_with_dots() {
        let path = FieldPath::root().key("data").index(2).key("email");
        assert_eq!(path.to_string(), "data.2.email");
        assert_eq!(FieldPath::root().to_string(), "");
    }

    #[test]
    fn resolve_walks_objects_and_arrays() {
        let doc = json!({"data": [{"email": "a@b.com"}, {"email": 7}]});
        let path = FieldPath::root().key("data").index(1).key("email");
        assert_eq!(path.resolve(&doc), Some(&json!(7)));
    }

    #[test]
    fn resolve_stops_at_missing_or_scalar() {
        let doc = json!({"name": "x"});
        assert_eq!(FieldPath::root().key("age").resolve(&doc), None);
        assert_eq!(FieldPath::root().key("name").key("len").resolve(&doc), None);
        assert_eq!(FieldPath::from_segments(["a", "b"]).resolve(&json!(null)), None);
    }

    #[test]
    fn resolve_accepts_loose_segments() {
        let doc = json!({"0": "zero", "list": ["first"]});
        assert_eq!(FieldPath::root().index(0).resolve(&doc), Some(&json!("zero")));
        assert_eq!(
            FieldPath::from_segments(["list", "0"]).resolve(&doc),
            Some(&json!("first"))
        );
    }

    #[test]
    fn missing_value_reads_as_required() {
        let kind = IssueKind::InvalidType {
            expected: "boolean".into(),
            received: "undefined".into(),
        };
        assert_eq!(kind.default_message(), "Required");
        assert_eq!(kind.code(), "invalid_type");
    }
}

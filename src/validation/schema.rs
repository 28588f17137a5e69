//! Declarative constraint trees.
//!
//! A [`Schema`] is an immutable description of an expected JSON shape. Leaf
//! builders ([`StringSchema`], [`NumberSchema`], ...) convert into `Schema`,
//! and the [`SchemaExt`] modifiers (`optional`, `nullable`, `default_value`,
//! `named`) are available on every builder.
//!
//! ```rust
//! use userflow::validation::{Schema, SchemaExt};
//!
//! let user = Schema::object()
//!     .field("id", Schema::number())
//!     .field("name", Schema::string().min_length(1))
//!     .field("email", Schema::string().email())
//!     .field("age", Schema::number().min(1.0).optional())
//!     .named("user");
//! assert_eq!(user.name(), Some("user"));
//! ```

use crate::validation::issue::{FieldPath, PathSegment, quoted_union};
use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

// ============================================================================
// SCHEMA NODE
// ============================================================================

#[derive(Debug, Clone)]
pub struct Schema {
    pub(crate) kind: SchemaKind,
    pub(crate) optional: bool,
    pub(crate) nullable: bool,
    pub(crate) default: Option<Value>,
    pub(crate) name: Option<String>,
}

#[derive(Debug, Clone)]
pub enum SchemaKind {
    String(StringSchema),
    Number(NumberSchema),
    Boolean,
    Enum(EnumSchema),
    /// Calendar date carried as a string (`YYYY-MM-DD` or RFC 3339).
    Date,
    Array(ArraySchema),
    Object(ObjectSchema),
    Any,
}

impl Schema {
    fn from_kind(kind: SchemaKind) -> Self {
        Self {
            kind,
            optional: false,
            nullable: false,
            default: None,
            name: None,
        }
    }

    pub fn string() -> StringSchema {
        StringSchema::default()
    }

    pub fn number() -> NumberSchema {
        NumberSchema::default()
    }

    pub fn boolean() -> Schema {
        Self::from_kind(SchemaKind::Boolean)
    }

    pub fn enumeration<I, S>(options: I) -> EnumSchema
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        EnumSchema {
            options: options.into_iter().map(Into::into).collect(),
        }
    }

    pub fn date() -> Schema {
        Self::from_kind(SchemaKind::Date)
    }

    pub fn array(element: impl Into<Schema>) -> ArraySchema {
        ArraySchema {
            element: Box::new(element.into()),
            min_items: None,
            max_items: None,
        }
    }

    pub fn object() -> ObjectSchema {
        ObjectSchema::default()
    }

    pub fn any() -> Schema {
        Self::from_kind(SchemaKind::Any)
    }

    pub fn kind(&self) -> &SchemaKind {
        &self.kind
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Object view of this schema, if it is one.
    pub fn as_object(&self) -> Option<&ObjectSchema> {
        match &self.kind {
            SchemaKind::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Type label used as `expected` in `invalid_type` issues.
    pub fn expected_label(&self) -> String {
        match &self.kind {
            SchemaKind::String(_) => "string".to_string(),
            SchemaKind::Number(_) => "number".to_string(),
            SchemaKind::Boolean => "boolean".to_string(),
            SchemaKind::Enum(e) => quoted_union(&e.options),
            SchemaKind::Date => "date".to_string(),
            SchemaKind::Array(_) => "array".to_string(),
            SchemaKind::Object(_) => "object".to_string(),
            SchemaKind::Any => "any".to_string(),
        }
    }
}

/// Modifiers shared by every schema builder.
pub trait SchemaExt: Into<Schema> + Sized {
    /// Allow the key to be absent. `null` is still rejected.
    fn optional(self) -> Schema {
        let mut schema = self.into();
        schema.optional = true;
        schema
    }

    /// Accept `null` in addition to the wrapped shape.
    fn nullable(self) -> Schema {
        let mut schema = self.into();
        schema.nullable = true;
        schema
    }

    /// Substitute `value` when the key is absent.
    fn default_value(self, value: Value) -> Schema {
        let mut schema = self.into();
        schema.default = Some(value);
        schema
    }

    fn named(self, name: impl Into<String>) -> Schema {
        let mut schema = self.into();
        schema.name = Some(name.into());
        schema
    }
}

impl<T: Into<Schema>> SchemaExt for T {}

// ============================================================================
// STRING
// ============================================================================

#[derive(Debug, Clone)]
pub enum StringRule {
    MinLength(usize),
    MaxLength(usize),
    Email,
    Url,
    /// ISO 8601 timestamp in UTC with a `Z` suffix.
    Datetime,
    Pattern(Regex),
}

#[derive(Debug, Clone)]
pub struct StringCheck {
    pub rule: StringRule,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct StringSchema {
    pub(crate) checks: Vec<StringCheck>,
}

impl StringSchema {
    fn check(mut self, rule: StringRule) -> Self {
        self.checks.push(StringCheck {
            rule,
            message: None,
        });
        self
    }

    pub fn min_length(self, min: usize) -> Self {
        self.check(StringRule::MinLength(min))
    }

    pub fn max_length(self, max: usize) -> Self {
        self.check(StringRule::MaxLength(max))
    }

    pub fn non_empty(self) -> Self {
        self.min_length(1)
    }

    pub fn email(self) -> Self {
        self.check(StringRule::Email)
    }

    pub fn url(self) -> Self {
        self.check(StringRule::Url)
    }

    pub fn datetime(self) -> Self {
        self.check(StringRule::Datetime)
    }

    pub fn pattern(self, regex: Regex) -> Self {
        self.check(StringRule::Pattern(regex))
    }

    /// Override the raw message of the most recently added check.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        if let Some(last) = self.checks.last_mut() {
            last.message = Some(message.into());
        }
        self
    }

    pub fn checks(&self) -> &[StringCheck] {
        &self.checks
    }
}

impl From<StringSchema> for Schema {
    fn from(value: StringSchema) -> Self {
        Schema::from_kind(SchemaKind::String(value))
    }
}

// ============================================================================
// NUMBER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberRule {
    Min { value: f64, inclusive: bool },
    Max { value: f64, inclusive: bool },
}

#[derive(Debug, Clone)]
pub struct NumberCheck {
    pub rule: NumberRule,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NumberSchema {
    pub(crate) integer: bool,
    pub(crate) checks: Vec<NumberCheck>,
}

impl NumberSchema {
    fn check(mut self, rule: NumberRule) -> Self {
        self.checks.push(NumberCheck {
            rule,
            message: None,
        });
        self
    }

    pub fn integer(mut self) -> Self {
        self.integer = true;
        self
    }

    pub fn min(self, value: f64) -> Self {
        self.check(NumberRule::Min {
            value,
            inclusive: true,
        })
    }

    pub fn max(self, value: f64) -> Self {
        self.check(NumberRule::Max {
            value,
            inclusive: true,
        })
    }

    /// Strictly greater than zero.
    pub fn positive(self) -> Self {
        self.check(NumberRule::Min {
            value: 0.0,
            inclusive: false,
        })
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        if let Some(last) = self.checks.last_mut() {
            last.message = Some(message.into());
        }
        self
    }

    pub fn is_integer(&self) -> bool {
        self.integer
    }

    pub fn checks(&self) -> &[NumberCheck] {
        &self.checks
    }
}

impl From<NumberSchema> for Schema {
    fn from(value: NumberSchema) -> Self {
        Schema::from_kind(SchemaKind::Number(value))
    }
}

// ============================================================================
// ENUM
// ============================================================================

#[derive(Debug, Clone)]
pub struct EnumSchema {
    pub(crate) options: Vec<String>,
}

impl EnumSchema {
    pub fn options(&self) -> &[String] {
        &self.options
    }
}

impl From<EnumSchema> for Schema {
    fn from(value: EnumSchema) -> Self {
        Schema::from_kind(SchemaKind::Enum(value))
    }
}

// ============================================================================
// ARRAY
// ============================================================================

#[derive(Debug, Clone)]
pub struct ArraySchema {
    pub(crate) element: Box<Schema>,
    pub(crate) min_items: Option<usize>,
    pub(crate) max_items: Option<usize>,
}

impl ArraySchema {
    pub fn min_items(mut self, min: usize) -> Self {
        self.min_items = Some(min);
        self
    }

    pub fn max_items(mut self, max: usize) -> Self {
        self.max_items = Some(max);
        self
    }

    pub fn element(&self) -> &Schema {
        &self.element
    }
}

impl From<ArraySchema> for Schema {
    fn from(value: ArraySchema) -> Self {
        Schema::from_kind(SchemaKind::Array(value))
    }
}

// ============================================================================
// OBJECT
// ============================================================================

/// How an object treats keys its schema does not declare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownKeys {
    /// Drop them from the validated output.
    #[default]
    Strip,
    /// Report them as a single `unrecognized_keys` issue.
    Strict,
    /// Copy them to the output untouched.
    Passthrough,
}

pub type RefinementFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Whole-object predicate evaluated after every field validated cleanly.
#[derive(Clone)]
pub struct Refinement {
    pub path: FieldPath,
    pub message: String,
    pub predicate: RefinementFn,
}

impl fmt::Debug for Refinement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Refinement")
            .field("path", &self.path)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    pub(crate) fields: IndexMap<String, Schema>,
    pub(crate) unknown_keys: UnknownKeys,
    pub(crate) refinements: Vec<Refinement>,
}

impl ObjectSchema {
    /// Add a field, replacing any existing one with the same name in place.
    pub fn field(mut self, name: impl Into<String>, schema: impl Into<Schema>) -> Self {
        self.fields.insert(name.into(), schema.into());
        self
    }

    /// Add or replace every field of `other`.
    pub fn extend(mut self, other: ObjectSchema) -> Self {
        for (name, schema) in other.fields {
            self.fields.insert(name, schema);
        }
        self
    }

    pub fn omit(mut self, names: &[&str]) -> Self {
        for name in names {
            self.fields.shift_remove(*name);
        }
        self
    }

    pub fn strict(mut self) -> Self {
        self.unknown_keys = UnknownKeys::Strict;
        self
    }

    pub fn passthrough(mut self) -> Self {
        self.unknown_keys = UnknownKeys::Passthrough;
        self
    }

    pub fn refine<I, S, F>(mut self, path: I, message: impl Into<String>, predicate: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PathSegment>,
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.refinements.push(Refinement {
            path: FieldPath::from_segments(path),
            message: message.into(),
            predicate: Arc::new(predicate),
        });
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Schema)> {
        self.fields.iter().map(|(name, schema)| (name.as_str(), schema))
    }

    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.fields.get(name)
    }

    pub fn unknown_keys(&self) -> UnknownKeys {
        self.unknown_keys
    }

    pub fn required_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(_, schema)| !schema.optional && schema.default.is_none())
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

impl From<ObjectSchema> for Schema {
    fn from(value: ObjectSchema) -> Self {
        Schema::from_kind(SchemaKind::Object(value))
    }
}

// ============================================================================
// ENVELOPES
// ============================================================================

/// `{ success: boolean, message?: string }`
pub fn base_response_schema() -> ObjectSchema {
    Schema::object()
        .field("success", Schema::boolean())
        .field("message", Schema::string().optional())
}

/// Wrap `data` in the API response envelope.
pub fn envelope(data: impl Into<Schema>) -> ObjectSchema {
    base_response_schema().extend(Schema::object().field("data", data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extend_replaces_in_place_and_appends() {
        let base = Schema::object()
            .field("a", Schema::string())
            .field("b", Schema::boolean());
        let merged = base.extend(
            Schema::object()
                .field("b", Schema::boolean().default_value(Value::Bool(true)))
                .field("c", Schema::number()),
        );
        let names: Vec<&str> = merged.fields().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!(merged.get("b").and_then(Schema::default).is_some());
    }

    #[test]
    fn omit_removes_fields() {
        let object = Schema::object()
            .field("id", Schema::number())
            .field("name", Schema::string())
            .omit(&["id"]);
        assert!(object.get("id").is_none());
        assert_eq!(object.required_fields(), vec!["name"]);
    }

    #[test]
    fn envelope_wraps_data() {
        let schema = envelope(Schema::array(Schema::any()));
        let names: Vec<&str> = schema.fields().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["success", "message", "data"]);
        assert!(schema.get("message").is_some_and(Schema::is_optional));
    }

    #[test]
    fn expected_label_for_enum_is_a_quoted_union() {
        let schema: Schema = Schema::enumeration(["development", "production"]).into();
        assert_eq!(schema.expected_label(), "'development' | 'production'");
    }
}

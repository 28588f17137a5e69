//! Constraint interpreter: walks a [`Schema`] alongside an untyped value.
//!
//! The interpreter never fails in the Rust sense. It returns either the
//! coerced value (defaults applied, undeclared keys handled per the object
//! policy) or every issue it found, in the order the schema declares its
//! constraints.

use crate::validation::issue::{
    BoundTarget, FieldPath, Issue, IssueKind, StringFormat, json_type_name,
};
use crate::validation::schema::{
    ArraySchema, EnumSchema, NumberRule, NumberSchema, ObjectSchema, Schema, SchemaKind,
    StringRule, StringSchema, UnknownKeys,
};
use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[A-Z0-9_'+\-.]*[A-Z0-9_+\-]@([A-Z0-9][A-Z0-9\-]*\.)+[A-Z]{2,}$")
        .expect("email pattern is valid")
});

static DATETIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?Z$")
        .expect("datetime pattern is valid")
});

/// Check `value` against `schema`.
pub fn parse(schema: &Schema, value: &Value) -> Result<Value, Vec<Issue>> {
    let mut issues = Vec::new();
    let output = visit(schema, Some(value), &FieldPath::root(), &mut issues);
    if issues.is_empty() {
        Ok(output.unwrap_or(Value::Null))
    } else {
        Err(issues)
    }
}

fn visit(
    schema: &Schema,
    value: Option<&Value>,
    path: &FieldPath,
    issues: &mut Vec<Issue>,
) -> Option<Value> {
    let Some(value) = value else {
        if let Some(default) = schema.default.as_ref() {
            return visit_kind(schema, default, path, issues);
        }
        if !schema.optional {
            issues.push(Issue::new(
                path.clone(),
                IssueKind::InvalidType {
                    expected: schema.expected_label(),
                    received: "undefined".to_string(),
                },
            ));
        }
        return None;
    };

    if value.is_null() && schema.nullable {
        return Some(Value::Null);
    }

    visit_kind(schema, value, path, issues)
}

fn visit_kind(
    schema: &Schema,
    value: &Value,
    path: &FieldPath,
    issues: &mut Vec<Issue>,
) -> Option<Value> {
    match &schema.kind {
        SchemaKind::String(string) => visit_string(schema, string, value, path, issues),
        SchemaKind::Number(number) => visit_number(schema, number, value, path, issues),
        SchemaKind::Boolean => match value {
            Value::Bool(_) => Some(value.clone()),
            other => type_mismatch(schema, other, path, issues),
        },
        SchemaKind::Enum(options) => visit_enum(schema, options, value, path, issues),
        SchemaKind::Date => visit_date(schema, value, path, issues),
        SchemaKind::Array(array) => visit_array(schema, array, value, path, issues),
        SchemaKind::Object(object) => visit_object(schema, object, value, path, issues),
        SchemaKind::Any => Some(value.clone()),
    }
}

fn type_mismatch(
    schema: &Schema,
    value: &Value,
    path: &FieldPath,
    issues: &mut Vec<Issue>,
) -> Option<Value> {
    issues.push(Issue::new(
        path.clone(),
        IssueKind::InvalidType {
            expected: schema.expected_label(),
            received: json_type_name(value).to_string(),
        },
    ));
    None
}

fn visit_string(
    schema: &Schema,
    string: &StringSchema,
    value: &Value,
    path: &FieldPath,
    issues: &mut Vec<Issue>,
) -> Option<Value> {
    let Value::String(text) = value else {
        return type_mismatch(schema, value, path, issues);
    };

    let length = text.chars().count();
    for check in &string.checks {
        let kind = match &check.rule {
            StringRule::MinLength(min) if length < *min => Some(IssueKind::TooSmall {
                target: BoundTarget::String,
                minimum: *min as f64,
                inclusive: true,
            }),
            StringRule::MaxLength(max) if length > *max => Some(IssueKind::TooBig {
                target: BoundTarget::String,
                maximum: *max as f64,
                inclusive: true,
            }),
            StringRule::Email if !is_email(text) => Some(IssueKind::InvalidString {
                validation: StringFormat::Email,
            }),
            StringRule::Url if url::Url::parse(text).is_err() => Some(IssueKind::InvalidString {
                validation: StringFormat::Url,
            }),
            StringRule::Datetime if !is_utc_datetime(text) => Some(IssueKind::InvalidString {
                validation: StringFormat::Datetime,
            }),
            StringRule::Pattern(regex) if !regex.is_match(text) => {
                Some(IssueKind::InvalidString {
                    validation: StringFormat::Regex,
                })
            }
            _ => None,
        };
        if let Some(kind) = kind {
            issues.push(Issue::new(path.clone(), kind).with_message(check.message.as_deref()));
        }
    }

    Some(value.clone())
}

fn visit_number(
    schema: &Schema,
    number: &NumberSchema,
    value: &Value,
    path: &FieldPath,
    issues: &mut Vec<Issue>,
) -> Option<Value> {
    let Some(n) = value.as_f64() else {
        return type_mismatch(schema, value, path, issues);
    };

    if number.integer && !(value.is_i64() || value.is_u64() || n.fract() == 0.0) {
        issues.push(Issue::new(
            path.clone(),
            IssueKind::InvalidType {
                expected: "integer".to_string(),
                received: "float".to_string(),
            },
        ));
    }

    for check in &number.checks {
        let kind = match check.rule {
            NumberRule::Min { value, inclusive } if below(n, value, inclusive) => {
                Some(IssueKind::TooSmall {
                    target: BoundTarget::Number,
                    minimum: value,
                    inclusive,
                })
            }
            NumberRule::Max { value, inclusive } if above(n, value, inclusive) => {
                Some(IssueKind::TooBig {
                    target: BoundTarget::Number,
                    maximum: value,
                    inclusive,
                })
            }
            _ => None,
        };
        if let Some(kind) = kind {
            issues.push(Issue::new(path.clone(), kind).with_message(check.message.as_deref()));
        }
    }

    // Whole floats such as `3.0` leave an integer schema as integers.
    if number.integer && value.is_f64() && n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        return Some(Value::from(n as i64));
    }
    Some(value.clone())
}

fn below(n: f64, bound: f64, inclusive: bool) -> bool {
    if inclusive { n < bound } else { n <= bound }
}

fn above(n: f64, bound: f64, inclusive: bool) -> bool {
    if inclusive { n > bound } else { n >= bound }
}

fn visit_enum(
    schema: &Schema,
    options: &EnumSchema,
    value: &Value,
    path: &FieldPath,
    issues: &mut Vec<Issue>,
) -> Option<Value> {
    let Value::String(text) = value else {
        return type_mismatch(schema, value, path, issues);
    };
    if options.options.iter().any(|option| option == text) {
        return Some(value.clone());
    }
    issues.push(Issue::new(
        path.clone(),
        IssueKind::InvalidEnumValue {
            options: options.options.clone(),
            received: text.clone(),
        },
    ));
    None
}

fn visit_date(
    schema: &Schema,
    value: &Value,
    path: &FieldPath,
    issues: &mut Vec<Issue>,
) -> Option<Value> {
    let Value::String(text) = value else {
        return type_mismatch(schema, value, path, issues);
    };
    let parsed = NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok()
        || DateTime::parse_from_rfc3339(text).is_ok();
    if parsed {
        Some(value.clone())
    } else {
        issues.push(Issue::new(path.clone(), IssueKind::InvalidDate));
        None
    }
}

fn visit_array(
    schema: &Schema,
    array: &ArraySchema,
    value: &Value,
    path: &FieldPath,
    issues: &mut Vec<Issue>,
) -> Option<Value> {
    let Value::Array(items) = value else {
        return type_mismatch(schema, value, path, issues);
    };

    if let Some(min) = array.min_items.filter(|min| items.len() < *min) {
        issues.push(Issue::new(
            path.clone(),
            IssueKind::TooSmall {
                target: BoundTarget::Array,
                minimum: min as f64,
                inclusive: true,
            },
        ));
    }
    if let Some(max) = array.max_items.filter(|max| items.len() > *max) {
        issues.push(Issue::new(
            path.clone(),
            IssueKind::TooBig {
                target: BoundTarget::Array,
                maximum: max as f64,
                inclusive: true,
            },
        ));
    }

    let output = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            visit(&array.element, Some(item), &path.index(index), issues).unwrap_or(Value::Null)
        })
        .collect();
    Some(Value::Array(output))
}

fn visit_object(
    schema: &Schema,
    object: &ObjectSchema,
    value: &Value,
    path: &FieldPath,
    issues: &mut Vec<Issue>,
) -> Option<Value> {
    let Value::Object(input) = value else {
        return type_mismatch(schema, value, path, issues);
    };

    let issues_before = issues.len();
    let mut output = Map::new();

    for (name, field) in &object.fields {
        if let Some(coerced) = visit(field, input.get(name), &path.key(name), issues) {
            output.insert(name.clone(), coerced);
        }
    }

    let undeclared: Vec<&String> = input
        .keys()
        .filter(|key| !object.fields.contains_key(key.as_str()))
        .collect();
    match object.unknown_keys {
        UnknownKeys::Strip => {}
        UnknownKeys::Passthrough => {
            for key in undeclared {
                if let Some(raw) = input.get(key) {
                    output.insert(key.clone(), raw.clone());
                }
            }
        }
        UnknownKeys::Strict if !undeclared.is_empty() => {
            issues.push(Issue::new(
                path.clone(),
                IssueKind::UnrecognizedKeys {
                    keys: undeclared.into_iter().cloned().collect(),
                },
            ));
        }
        UnknownKeys::Strict => {}
    }

    let output = Value::Object(output);
    if issues.len() == issues_before {
        for refinement in &object.refinements {
            if !(refinement.predicate)(&output) {
                let mut issue = Issue::new(path.join(&refinement.path), IssueKind::Custom);
                issue.message = refinement.message.clone();
                issues.push(issue);
            }
        }
    }

    Some(output)
}

fn is_email(text: &str) -> bool {
    !text.starts_with('.') && !text.contains("..") && EMAIL_RE.is_match(text)
}

fn is_utc_datetime(text: &str) -> bool {
    DATETIME_RE.is_match(text) && DateTime::parse_from_rfc3339(text).is_ok()
}

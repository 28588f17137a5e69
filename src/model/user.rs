//! User records, API envelopes and their schemas.

use crate::validation::registry::names;
use crate::validation::schema::{ObjectSchema, Schema, SchemaExt, envelope};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Any JSON number; the API does not promise integral ids.
    pub id: f64,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<f64>,
    pub is_active: bool,
    /// ISO-8601 UTC timestamp, e.g. `2024-01-15T10:30:00Z`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Payload accepted by the create endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserInput {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<f64>,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
}

fn active_by_default() -> bool {
    true
}

impl CreateUserInput {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            age: None,
            is_active: true,
        }
    }

    pub fn with_age(mut self, age: f64) -> Self {
        self.age = Some(age);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

/// Partial update; only present fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// `{ success, message?, data }` as returned by the user API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
}

/// Result of a delete call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOutcome {
    pub success: bool,
    pub message: String,
}

impl DeleteOutcome {
    /// Fill the fields a remote may leave out.
    pub fn from_response(response: &Value) -> Self {
        Self {
            success: response
                .get("success")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            message: response
                .get("message")
                .and_then(Value::as_str)
                .filter(|message| !message.is_empty())
                .unwrap_or("deleted")
                .to_string(),
        }
    }
}

// ============================================================================
// SCHEMAS
// ============================================================================

fn user_fields() -> ObjectSchema {
    Schema::object()
        .field("id", Schema::number())
        .field("name", Schema::string().min_length(1))
        .field("email", Schema::string().email())
        .field("age", Schema::number().min(1.0).optional())
        .field("isActive", Schema::boolean())
        .field("createdAt", Schema::string().datetime().optional())
}

pub fn user_schema() -> Schema {
    user_fields().named(names::USER)
}

pub fn user_list_schema() -> Schema {
    Schema::array(user_fields()).named(names::USER_LIST)
}

pub fn user_response_schema() -> Schema {
    envelope(user_fields()).named(names::USER_RESPONSE)
}

pub fn user_list_response_schema() -> Schema {
    envelope(Schema::array(user_fields())).named(names::USER_LIST_RESPONSE)
}

/// User without `id` and `createdAt`; `isActive` defaults to `true`.
pub fn create_user_schema() -> Schema {
    user_fields()
        .omit(&["id", "createdAt"])
        .extend(
            Schema::object().field("isActive", Schema::boolean().default_value(Value::Bool(true))),
        )
        .named(names::CREATE_USER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::parse::parse;
    use serde_json::json;

    #[test]
    fn user_round_trips_through_camel_case() {
        let user: User = serde_json::from_value(json!({
            "id": 1,
            "name": "Ann",
            "email": "ann@example.com",
            "isActive": true,
            "createdAt": "2024-01-15T10:30:00Z"
        }))
        .unwrap();
        assert_eq!(user.created_at.as_deref(), Some("2024-01-15T10:30:00Z"));
        let back = serde_json::to_value(&user).unwrap();
        assert!(back.get("age").is_none());
        assert_eq!(back["isActive"], json!(true));
    }

    #[test]
    fn fractional_id_and_age_are_accepted() {
        let input = json!({
            "id": 1.5,
            "name": "Ann",
            "email": "ann@example.com",
            "age": 25.5,
            "isActive": false
        });
        let coerced = parse(&user_schema(), &input).unwrap();
        let user: User = serde_json::from_value(coerced).unwrap();
        assert_eq!(user.id, 1.5);
        assert_eq!(user.age, Some(25.5));
    }

    #[test]
    fn age_below_one_is_rejected() {
        let input = json!({"id": 1, "name": "A", "email": "a@b.com", "age": 0.5, "isActive": true});
        let issues = parse(&user_schema(), &input).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path.to_string(), "age");
    }

    #[test]
    fn create_schema_applies_active_default() {
        let coerced = parse(
            &create_user_schema(),
            &json!({"name": "Ann", "email": "ann@example.com"}),
        )
        .unwrap();
        assert_eq!(coerced["isActive"], json!(true));
        let input: CreateUserInput = serde_json::from_value(coerced).unwrap();
        assert_eq!(input, CreateUserInput::new("Ann", "ann@example.com"));
    }

    #[test]
    fn create_schema_rejects_id_only_input() {
        let issues = parse(&create_user_schema(), &json!({"id": 5})).unwrap_err();
        let fields: Vec<String> = issues.iter().map(|i| i.path.to_string()).collect();
        assert_eq!(fields, vec!["name", "email"]);
    }

    #[test]
    fn envelopes_require_success_but_not_message() {
        let ok = json!({"success": true, "data": []});
        assert!(parse(&user_list_response_schema(), &ok).is_ok());

        let issues = parse(&user_list_response_schema(), &json!({"data": []})).unwrap_err();
        assert_eq!(issues[0].path.to_string(), "success");
    }

    #[test]
    fn delete_outcome_fills_defaults() {
        assert_eq!(
            DeleteOutcome::from_response(&json!({})),
            DeleteOutcome {
                success: false,
                message: "deleted".into()
            }
        );
        let outcome = DeleteOutcome::from_response(&json!({"success": true, "message": "gone"}));
        assert!(outcome.success);
        assert_eq!(outcome.message, "gone");
    }
}

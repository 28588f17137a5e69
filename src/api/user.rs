//! Typed client for the user API.
//!
//! Every response envelope goes through the validator before it is decoded;
//! a response that fails validation is treated like a failed request.

use crate::api::transport::{ApiRequest, HttpTransport, Transport};
use crate::error::{ApiError, ApiFailure, TransportError};
use crate::metrics::ApiCallMetrics;
use crate::model::user::{
    ApiEnvelope, CreateUserInput, DeleteOutcome, User, UserPatch, create_user_schema, user_schema,
};
use crate::validation::registry::names;
use crate::validation::{Schema, ValidationOptions, ValidationResult, Validator};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{Instrument, error, info, warn};

const RESPONSE_INVALID: &str = "API response validation failed";
const CREATE_INPUT_INVALID: &str = "create user input validation failed";

const USERS_PATH: &str = "/api/users";

fn user_path(id: i64) -> String {
    format!("{USERS_PATH}/{id}")
}

pub struct UserApi<T = HttpTransport> {
    transport: T,
    validator: Validator,
}

impl<T: Transport> UserApi<T> {
    pub fn new(transport: T, validator: Validator) -> Self {
        Self {
            transport,
            validator,
        }
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn get_users(&self) -> Result<Vec<User>, ApiError> {
        let metrics = ApiCallMetrics::new("get_users");
        let outcome = self
            .fetch::<Vec<User>>(ApiRequest::get(USERS_PATH), names::USER_LIST_RESPONSE)
            .instrument(metrics.span())
            .await;
        let users = self.settle(metrics, "failed to load user list", outcome)?;

        if self.validator.console_enabled() {
            info!(count = users.len(), "loaded user list");
        }
        Ok(users)
    }

    /// `None` when the request or its validation fails.
    pub async fn get_user_by_id(&self, id: i64) -> Option<User> {
        let metrics = ApiCallMetrics::new("get_user_by_id");
        let outcome = self
            .fetch::<User>(ApiRequest::get(user_path(id)), names::USER_RESPONSE)
            .instrument(metrics.span())
            .await;

        match outcome {
            Ok(user) => {
                metrics.success();
                if self.validator.console_enabled() {
                    info!(user_id = id, "loaded user");
                }
                Some(user)
            }
            Err(source) => {
                let err = ApiError::new(format!("failed to load user {id}"), source);
                metrics.error(err.code().category());
                if self.validator.console_enabled() {
                    warn!(user_id = id, error = %err.source, "{err}");
                }
                None
            }
        }
    }

    /// Validate `input` (defaults applied), then create the user.
    pub async fn create_user(&self, input: &CreateUserInput) -> Result<User, ApiError> {
        let metrics = ApiCallMetrics::new("create_user");
        let outcome: Result<User, ApiFailure> = async {
            let raw = serde_json::to_value(input).map_err(TransportError::from)?;
            let validated = self
                .validator
                .validate_named::<CreateUserInput>(names::CREATE_USER, &raw, CREATE_INPUT_INVALID)
                .and_then(|result| result.into_result())
                .map_err(ApiFailure::InvalidInput)?;
            let body = serde_json::to_value(&validated).map_err(TransportError::from)?;
            self.fetch::<User>(ApiRequest::post(USERS_PATH, body), names::USER_RESPONSE)
                .await
        }
        .instrument(metrics.span())
        .await;
        let user = self.settle(metrics, "failed to create user", outcome)?;

        if self.validator.console_enabled() {
            info!(user_id = user.id, "created user");
        }
        Ok(user)
    }

    pub async fn update_user(&self, id: i64, patch: &UserPatch) -> Result<User, ApiError> {
        let metrics = ApiCallMetrics::new("update_user");
        let outcome: Result<User, ApiFailure> = async {
            let body = serde_json::to_value(patch).map_err(TransportError::from)?;
            self.fetch::<User>(ApiRequest::put(user_path(id), body), names::USER_RESPONSE)
                .await
        }
        .instrument(metrics.span())
        .await;
        let user = self.settle(metrics, "failed to update user", outcome)?;

        if self.validator.console_enabled() {
            info!(user_id = id, "updated user");
        }
        Ok(user)
    }

    pub async fn delete_user(&self, id: i64) -> Result<DeleteOutcome, ApiError> {
        let metrics = ApiCallMetrics::new("delete_user");
        let outcome = self
            .transport
            .send(ApiRequest::delete(user_path(id)))
            .instrument(metrics.span())
            .await
            .map(|response| DeleteOutcome::from_response(&response))
            .map_err(ApiFailure::from);
        let deleted = self.settle(metrics, "failed to delete user", outcome)?;

        if self.validator.console_enabled() {
            info!(user_id = id, success = deleted.success, "deleted user");
        }
        Ok(deleted)
    }

    pub fn validate_user(&self, input: &Value) -> ValidationResult<User> {
        validate_user(&self.validator, input)
    }

    pub fn validate_users(&self, inputs: &[Value]) -> ValidationResult<Vec<User>> {
        validate_users(&self.validator, inputs)
    }

    pub fn validate_create_user_input(&self, input: &Value) -> ValidationResult<CreateUserInput> {
        validate_create_user_input(&self.validator, input)
    }

    async fn fetch<D: DeserializeOwned>(
        &self,
        request: ApiRequest,
        schema: &str,
    ) -> Result<D, ApiFailure> {
        let response = self.transport.send(request).await?;
        let envelope = self
            .validator
            .validate_named::<ApiEnvelope<D>>(schema, &response, RESPONSE_INVALID)?
            .into_result()?;
        Ok(envelope.data)
    }

    fn settle<R>(
        &self,
        metrics: ApiCallMetrics,
        operation: &str,
        outcome: Result<R, ApiFailure>,
    ) -> Result<R, ApiError> {
        match outcome {
            Ok(value) => {
                metrics.success();
                Ok(value)
            }
            Err(source) => {
                let err = ApiError::new(operation, source);
                metrics.error(err.code().category());
                if self.validator.console_enabled() {
                    error!(error = %err.source, "{operation}");
                }
                Err(err)
            }
        }
    }
}

impl<T: Transport> UserApi<Arc<T>> {
    /// Share one transport between several clients.
    pub fn shared(transport: Arc<T>, validator: Validator) -> Self {
        Self::new(transport, validator)
    }
}

fn builtin(validator: &Validator, name: &str, fallback: fn() -> Schema) -> Arc<Schema> {
    validator
        .registry()
        .get(name)
        .unwrap_or_else(|| Arc::new(fallback()))
}

/// Non-throwing user validation with user-specific messages.
pub fn validate_user(validator: &Validator, input: &Value) -> ValidationResult<User> {
    let schema = builtin(validator, names::USER, user_schema);
    validator.evaluate(
        &schema,
        input,
        ValidationOptions::non_throwing()
            .error_message("user data validation failed")
            .success_message("user data validation succeeded"),
    )
}

pub fn validate_users(validator: &Validator, inputs: &[Value]) -> ValidationResult<Vec<User>> {
    let schema = builtin(validator, names::USER, user_schema);
    validator.evaluate_multiple(
        &schema,
        inputs,
        ValidationOptions::non_throwing()
            .error_message("user batch validation failed")
            .success_message("user batch validation succeeded"),
    )
}

pub fn validate_create_user_input(
    validator: &Validator,
    input: &Value,
) -> ValidationResult<CreateUserInput> {
    let schema = builtin(validator, names::CREATE_USER, create_user_schema);
    validator.evaluate(
        &schema,
        input,
        ValidationOptions::non_throwing()
            .error_message(CREATE_INPUT_INVALID)
            .success_message("create user input validation succeeded"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorCode, ValidationError};
    use crate::validation::StaticGate;
    use assert_matches::assert_matches;
    use parking_lot::Mutex;
    use serde_json::json;

    /// Answers every request with the same body and records what it saw.
    struct Canned {
        response: Result<Value, u16>,
        seen: Mutex<Vec<ApiRequest>>,
    }

    impl Canned {
        fn ok(response: Value) -> Self {
            Self {
                response: Ok(response),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn status(status: u16) -> Self {
            Self {
                response: Err(status),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl Transport for Canned {
        async fn send(&self, request: ApiRequest) -> Result<Value, TransportError> {
            self.seen.lock().push(request);
            match &self.response {
                Ok(body) => Ok(body.clone()),
                Err(status) => Err(TransportError::Status {
                    status: *status,
                    body: String::new(),
                }),
            }
        }
    }

    fn api(transport: Canned) -> UserApi<Canned> {
        UserApi::new(transport, Validator::new(StaticGate::closed()))
    }

    fn ann() -> Value {
        json!({"id": 1, "name": "Ann", "email": "ann@example.com", "isActive": true})
    }

    #[tokio::test]
    async fn get_users_returns_validated_list() {
        let api = api(Canned::ok(json!({"success": true, "data": [ann()]})));
        let users = api.get_users().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].email, "ann@example.com");
        assert_eq!(api.transport().seen.lock()[0].path, "/api/users");
    }

    #[tokio::test]
    async fn invalid_list_response_is_an_operation_error() {
        let api = api(Canned::ok(json!({"success": true, "data": [{"id": 1}]})));
        let err = api.get_users().await.unwrap_err();
        assert_eq!(err.to_string(), "failed to load user list");
        assert_eq!(err.code(), ErrorCode::InvalidResponse);
        assert_matches!(
            err.source,
            ApiFailure::Validation(ValidationError::StructuralMismatch { .. })
        );
    }

    #[tokio::test]
    async fn missing_user_reads_as_none() {
        let api = api(Canned::status(404));
        assert_eq!(api.get_user_by_id(42).await, None);
        assert_eq!(api.transport().seen.lock()[0].path, "/api/users/42");
    }

    #[tokio::test]
    async fn create_user_sends_defaulted_input() {
        let api = api(Canned::ok(json!({"success": true, "data": ann()})));
        let created = api
            .create_user(&CreateUserInput::new("Ann", "ann@example.com"))
            .await
            .unwrap();
        assert_eq!(created.id, 1.0);

        let seen = api.transport().seen.lock();
        assert_eq!(seen[0].method, reqwest::Method::POST);
        assert_eq!(
            seen[0].body,
            Some(json!({"name": "Ann", "email": "ann@example.com", "isActive": true}))
        );
    }

    #[tokio::test]
    async fn create_user_rejects_bad_input_before_sending() {
        let api = api(Canned::ok(json!({"success": true, "data": ann()})));
        let err = api
            .create_user(&CreateUserInput::new("", "nope"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "failed to create user");
        assert_eq!(err.code(), ErrorCode::StructuralMismatch);
        assert!(api.transport().seen.lock().is_empty());
    }

    #[tokio::test]
    async fn delete_fills_missing_fields() {
        let api = api(Canned::ok(json!({})));
        let outcome = api.delete_user(7).await.unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.message, "deleted");
    }

    #[test]
    fn entity_validations_never_raise() {
        let api = api(Canned::ok(json!(null)));
        let result = api.validate_user(&json!({"id": 1}));
        assert!(!result.is_success());
        assert_eq!(result.error(), Some("user data validation failed"));

        let batch = api.validate_users(&[ann(), json!({})]);
        assert_eq!(batch.summary(), Some("1/2 items failed validation"));

        let input = api.validate_create_user_input(&json!({"name": "A", "email": "a@b.com"}));
        assert!(input.data().is_some_and(|input| input.is_active));
    }
}

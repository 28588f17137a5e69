//! The validation boundary.
//!
//! [`Validator::validate`] runs the constraint interpreter, converts issues
//! into localized [`FieldError`]s, emits gated diagnostics and finally decides
//! between returning a [`ValidationResult`] and raising a [`ValidationError`].

use crate::error::ValidationError;
use crate::logging::{record_validation_outcome, validation_span};
use crate::metrics::{METRICS, Outcome};
use crate::validation::batch::ItemFailure;
use crate::validation::gate::ConsoleGate;
use crate::validation::issue::Issue;
use crate::validation::localize::{Locale, localize};
use crate::validation::parse::parse;
use crate::validation::registry::SchemaRegistry;
use crate::validation::schema::Schema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error};

pub(crate) const ANONYMOUS_SCHEMA: &str = "anonymous";

// ============================================================================
// OPTIONS
// ============================================================================

/// Per-call validation options.
///
/// Messages left unset resolve against the validator's [`Locale`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidationOptions {
    pub error_message: Option<String>,
    pub success_message: Option<String>,
    pub throw_on_error: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            error_message: None,
            success_message: None,
            throw_on_error: true,
        }
    }
}

impl ValidationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options that never raise.
    pub fn non_throwing() -> Self {
        Self::default().throw_on_error(false)
    }

    pub fn error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn success_message(mut self, message: impl Into<String>) -> Self {
        self.success_message = Some(message.into());
        self
    }

    pub fn throw_on_error(mut self, throw: bool) -> Self {
        self.throw_on_error = throw;
        self
    }
}

impl From<&str> for ValidationOptions {
    fn from(error_message: &str) -> Self {
        Self::default().error_message(error_message)
    }
}

impl From<String> for ValidationOptions {
    fn from(error_message: String) -> Self {
        Self::default().error_message(error_message)
    }
}

impl From<&ValidationOptions> for ValidationOptions {
    fn from(options: &ValidationOptions) -> Self {
        options.clone()
    }
}

// ============================================================================
// RESULTS
// ============================================================================

/// One field-level violation as reported to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    /// Dot-joined path of the offending value; empty for the root.
    pub field: String,
    pub message: String,
    /// The offending raw value, absent when the path does not resolve.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// Outcome of one validation call.
///
/// `success` holds exactly when `data` is present and `errors` is absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<FieldError>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failures: Option<Vec<ItemFailure>>,
    /// Items of a failed batch that did validate.
    #[serde(skip_serializing_if = "Option::is_none")]
    passed: Option<T>,
}

impl<T> ValidationResult<T> {
    pub(crate) fn valid(data: T, summary: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            errors: None,
            summary: Some(summary.into()),
            failures: None,
            passed: None,
        }
    }

    pub(crate) fn mismatch(error: String, errors: Vec<FieldError>, summary: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            errors: Some(errors),
            summary: Some(summary),
            failures: None,
            passed: None,
        }
    }

    pub(crate) fn fault(message: String, summary: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            errors: None,
            summary: Some(summary),
            failures: None,
            passed: None,
        }
    }

    pub(crate) fn batch_failure(
        error: String,
        summary: String,
        failures: Vec<ItemFailure>,
        passed: T,
    ) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            errors: None,
            summary: Some(summary),
            failures: Some(failures),
            passed: Some(passed),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Field errors of a structural failure; empty otherwise.
    pub fn errors(&self) -> &[FieldError] {
        self.errors.as_deref().unwrap_or_default()
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// Per-item failures of a batch; empty otherwise.
    pub fn failures(&self) -> &[ItemFailure] {
        self.failures.as_deref().unwrap_or_default()
    }

    /// Successful items of a failed batch, in input order.
    pub fn passed(&self) -> Option<&T> {
        self.passed.as_ref()
    }

    /// Collapse into the validated data or the error a throwing call raises.
    pub fn into_result(mut self) -> Result<T, ValidationError> {
        match self.data.take() {
            Some(data) if self.success => Ok(data),
            _ => Err(self.into_error()),
        }
    }

    fn into_error(self) -> ValidationError {
        let summary = self.summary.unwrap_or_default();
        if let Some(failures) = self.failures {
            ValidationError::BatchFailed { summary, failures }
        } else if let Some(errors) = self.errors {
            ValidationError::StructuralMismatch { summary, errors }
        } else {
            ValidationError::UnexpectedFault {
                message: self.error.unwrap_or_default(),
                summary,
            }
        }
    }
}

/// Apply the throw decision to a finished result.
pub(crate) fn finish<T>(
    result: ValidationResult<T>,
    options: &ValidationOptions,
) -> Result<ValidationResult<T>, ValidationError> {
    if !result.is_success() && options.throw_on_error {
        Err(result.into_error())
    } else {
        Ok(result)
    }
}

// ============================================================================
// VALIDATOR
// ============================================================================

/// Schema validator with an injected console gate.
///
/// Cheap to clone and safe to share between threads.
#[derive(Clone)]
pub struct Validator {
    gate: Arc<dyn ConsoleGate>,
    locale: Locale,
    registry: Arc<SchemaRegistry>,
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("locale", &self.locale)
            .field("schemas", &self.registry.len())
            .finish_non_exhaustive()
    }
}

impl Validator {
    pub fn new(gate: impl ConsoleGate + 'static) -> Self {
        Self::with_gate(Arc::new(gate))
    }

    pub fn with_gate(gate: Arc<dyn ConsoleGate>) -> Self {
        Self {
            gate,
            locale: Locale::default(),
            registry: SchemaRegistry::builtin(),
        }
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn with_registry(mut self, registry: Arc<SchemaRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Whether failure diagnostics would be emitted right now.
    pub fn console_enabled(&self) -> bool {
        self.gate.should_show_console()
    }

    /// Validate `input` against `schema` and decode the result into `T`.
    ///
    /// Returns `Err` only when the options ask for throwing and validation
    /// failed; otherwise the failure is described by the returned result.
    pub fn validate<T: DeserializeOwned>(
        &self,
        schema: &Schema,
        input: &Value,
        options: impl Into<ValidationOptions>,
    ) -> Result<ValidationResult<T>, ValidationError> {
        let options = options.into();
        finish(self.run(schema, input, &options), &options)
    }

    /// [`Validator::validate`] keeping the coerced JSON value.
    pub fn validate_value(
        &self,
        schema: &Schema,
        input: &Value,
        options: impl Into<ValidationOptions>,
    ) -> Result<ValidationResult<Value>, ValidationError> {
        self.validate(schema, input, options)
    }

    /// Validate against a schema from the registry.
    ///
    /// An unknown name is reported as an unexpected fault.
    pub fn validate_named<T: DeserializeOwned>(
        &self,
        name: &str,
        input: &Value,
        options: impl Into<ValidationOptions>,
    ) -> Result<ValidationResult<T>, ValidationError> {
        let options = options.into();
        finish(self.run_named(name, input, &options), &options)
    }

    /// Like [`Validator::validate`] but never raises: `throw_on_error` is
    /// ignored and every failure is described by the returned result.
    pub fn evaluate<T: DeserializeOwned>(
        &self,
        schema: &Schema,
        input: &Value,
        options: impl Into<ValidationOptions>,
    ) -> ValidationResult<T> {
        self.run(schema, input, &options.into())
    }

    /// Never-raising counterpart of [`Validator::validate_named`].
    pub fn evaluate_named<T: DeserializeOwned>(
        &self,
        name: &str,
        input: &Value,
        options: impl Into<ValidationOptions>,
    ) -> ValidationResult<T> {
        self.run_named(name, input, &options.into())
    }

    fn run_named<T: DeserializeOwned>(
        &self,
        name: &str,
        input: &Value,
        options: &ValidationOptions,
    ) -> ValidationResult<T> {
        match self.registry.get(name) {
            Some(schema) => self.run(&schema, input, options),
            None => self.fault(name, format!("schema '{name}' is not registered"), options),
        }
    }

    /// Run one validation without applying the throw decision.
    pub(crate) fn run<T: DeserializeOwned>(
        &self,
        schema: &Schema,
        input: &Value,
        options: &ValidationOptions,
    ) -> ValidationResult<T> {
        let label = schema.name().unwrap_or(ANONYMOUS_SCHEMA);
        let _span = validation_span(label).entered();

        match parse(schema, input) {
            Ok(coerced) => match serde_json::from_value::<T>(coerced) {
                Ok(data) => {
                    METRICS.record_validation(label, Outcome::Valid);
                    record_validation_outcome(Outcome::Valid, 0);
                    debug!("validation passed");
                    let summary = options
                        .success_message
                        .clone()
                        .unwrap_or_else(|| self.locale.default_success_message().to_string());
                    ValidationResult::valid(data, summary)
                }
                Err(err) => self.fault(label, err.to_string(), options),
            },
            Err(issues) => self.mismatch(label, input, &issues, options),
        }
    }

    fn error_message(&self, options: &ValidationOptions) -> String {
        options
            .error_message
            .clone()
            .unwrap_or_else(|| self.locale.default_error_message().to_string())
    }

    fn mismatch<T>(
        &self,
        label: &str,
        input: &Value,
        issues: &[Issue],
        options: &ValidationOptions,
    ) -> ValidationResult<T> {
        let error_message = self.error_message(options);
        let errors: Vec<FieldError> = issues
            .iter()
            .map(|issue| FieldError {
                field: issue.path.to_string(),
                message: localize(issue, self.locale),
                value: issue.path.resolve(input).cloned(),
            })
            .collect();
        let summary = self.locale.mismatch_summary(&error_message, errors.len());

        METRICS.record_validation(label, Outcome::Mismatch);
        record_validation_outcome(Outcome::Mismatch, errors.len());
        for issue in issues {
            METRICS.record_issue(label, issue.kind.code());
        }
        debug!(error_count = errors.len(), "validation failed");

        if self.gate.should_show_console() {
            let _span = tracing::error_span!(
                "schema_validation_failed",
                schema = label,
                error_count = errors.len()
            )
            .entered();
            error!(
                error_message = %error_message,
                summary = %summary,
                "{}",
                self.locale.diagnostics_heading(errors.len())
            );
            error!("\n{}", format_violation_table(&errors));
        }

        ValidationResult::mismatch(error_message, errors, summary)
    }

    fn fault<T>(
        &self,
        label: &str,
        message: String,
        options: &ValidationOptions,
    ) -> ValidationResult<T> {
        let error_message = self.error_message(options);
        let message = if message.is_empty() {
            self.locale.unknown_fault().to_string()
        } else {
            message
        };
        let summary = self.locale.fault_summary(&error_message, &message);

        METRICS.record_validation(label, Outcome::Fault);
        record_validation_outcome(Outcome::Fault, 0);

        if self.gate.should_show_console() {
            error!(
                schema = label,
                error_message = %error_message,
                fault = %message,
                "unexpected fault during validation"
            );
        }

        ValidationResult::fault(message, summary)
    }
}

/// Render field errors as a fixed-width table for diagnostics.
pub fn format_violation_table(errors: &[FieldError]) -> String {
    let rows: Vec<[String; 4]> = errors
        .iter()
        .enumerate()
        .map(|(i, e)| {
            [
                i.to_string(),
                e.field.clone(),
                e.message.clone(),
                e.value
                    .as_ref()
                    .map(Value::to_string)
                    .unwrap_or_else(|| "undefined".to_string()),
            ]
        })
        .collect();

    let header = ["#", "field", "message", "value"].map(str::to_string);
    let mut widths = header.clone().map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let render = |cells: &[String; 4]| {
        cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!(" {cell:<width$} "))
            .collect::<Vec<_>>()
            .join("|")
    };
    let rule = widths
        .iter()
        .map(|width| "-".repeat(width + 2))
        .collect::<Vec<_>>()
        .join("+");

    let mut lines = vec![render(&header), rule];
    lines.extend(rows.iter().map(render));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::gate::StaticGate;
    use crate::validation::schema::SchemaExt;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn profile() -> Schema {
        Schema::object()
            .field("name", Schema::string().min_length(1))
            .field("age", Schema::number().min(1.0).optional())
            .named("profile")
    }

    #[test]
    fn success_carries_data_and_default_summary() {
        let validator = Validator::new(StaticGate::closed());
        let result = validator
            .validate_value(
                &profile(),
                &json!({"name": "Ann", "extra": 1}),
                ValidationOptions::new(),
            )
            .unwrap();
        assert!(result.is_success());
        assert_eq!(result.data(), Some(&json!({"name": "Ann"})));
        assert_eq!(result.summary(), Some("data validation succeeded"));
        assert!(result.errors().is_empty());
    }

    #[test]
    fn non_throwing_failure_lists_field_errors() {
        let validator = Validator::new(StaticGate::open());
        let result = validator
            .validate_value(
                &profile(),
                &json!({"name": "", "age": 0}),
                ValidationOptions::non_throwing().error_message("profile invalid"),
            )
            .unwrap();

        assert!(!result.is_success());
        assert_eq!(result.error(), Some("profile invalid"));
        assert_eq!(
            result.summary(),
            Some("profile invalid: found 2 validation errors")
        );
        assert_eq!(
            result.errors()[0],
            FieldError {
                field: "name".into(),
                message: "string length must be ≥ 1".into(),
                value: Some(json!("")),
            }
        );
        assert_eq!(result.errors()[1].field, "age");
        assert_eq!(result.errors()[1].value, Some(json!(0)));
    }

    #[test]
    fn string_options_throw() {
        let validator = Validator::new(StaticGate::closed());
        let err = validator
            .validate_value(&profile(), &json!({}), "custom")
            .unwrap_err();
        assert_matches!(
            &err,
            ValidationError::StructuralMismatch { errors, .. } if errors.len() == 1
        );
        assert_eq!(err.to_string(), "custom: found 1 validation errors");
        assert_eq!(err.field_errors()[0].message, "expected string, got undefined");
        assert_eq!(err.field_errors()[0].value, None);
    }

    #[test]
    fn unknown_schema_name_is_a_fault() {
        let validator = Validator::new(StaticGate::closed());
        let result = validator
            .validate_named::<Value>("nope", &json!({}), ValidationOptions::non_throwing())
            .unwrap();
        assert_eq!(result.error(), Some("schema 'nope' is not registered"));
        assert_eq!(
            result.summary(),
            Some("data validation failed: schema 'nope' is not registered")
        );
        assert!(result.errors().is_empty());
    }

    #[test]
    fn decode_failure_is_a_fault() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Strict {
            count: u8,
        }

        let validator = Validator::new(StaticGate::closed());
        let schema: Schema = Schema::object().field("count", Schema::number()).into();
        let err = validator
            .validate::<Strict>(&schema, &json!({"count": 1000}), ValidationOptions::new())
            .unwrap_err();
        assert_matches!(err, ValidationError::UnexpectedFault { .. });
    }

    #[test]
    fn localized_validator_speaks_its_catalog() {
        let validator = Validator::new(StaticGate::closed()).with_locale(Locale::ZhTw);
        let result = validator
            .validate_value(&profile(), &json!({"name": ""}), ValidationOptions::non_throwing())
            .unwrap();
        assert_eq!(result.error(), Some("資料驗證失敗"));
        assert_eq!(result.errors()[0].message, "字串長度必須大於等於 1");
    }

    #[test]
    fn serialized_result_omits_absent_fields() {
        let validator = Validator::new(StaticGate::closed());
        let result = validator
            .validate_value(&profile(), &json!({"name": "A"}), ValidationOptions::new())
            .unwrap();
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"success": true, "data": {"name": "A"}, "summary": "data validation succeeded"})
        );
    }

    #[test]
    fn violation_table_aligns_columns() {
        let table = format_violation_table(&[
            FieldError {
                field: "name".into(),
                message: "string length must be ≥ 1".into(),
                value: Some(json!("")),
            },
            FieldError {
                field: "isActive".into(),
                message: "expected boolean, got undefined".into(),
                value: None,
            },
        ]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("field"));
        assert!(lines[1].starts_with("---"));
        assert!(lines[3].contains("undefined"));
        assert_eq!(lines[2].chars().count(), lines[3].chars().count());
    }

    #[test]
    fn options_deserialize_with_throw_default() {
        let options: ValidationOptions =
            serde_json::from_value(json!({"errorMessage": "x"})).unwrap();
        assert!(options.throw_on_error);
        assert_eq!(options.error_message.as_deref(), Some("x"));
    }
}

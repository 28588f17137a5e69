//! Batch validation.

use crate::error::ValidationError;
use crate::metrics::METRICS;
use crate::validation::engine::{
    ANONYMOUS_SCHEMA, FieldError, ValidationOptions, ValidationResult, Validator, finish,
};
use crate::validation::schema::Schema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, warn};

/// Batches slower than this are logged at warn level.
const SLOW_BATCH_MS: u64 = 250;

/// One failed item of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemFailure {
    /// Position of the item in the input.
    pub index: usize,
    pub error: String,
    /// Field errors of a structural failure; empty for faults.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl Validator {
    /// Validate every element of `inputs` against `schema`.
    ///
    /// Items are validated independently and never raise on their own. When
    /// any item fails, the aggregate fails and is raised if `options` asks
    /// for throwing; successful items keep their input order, in `data` or,
    /// for a failed batch, in `passed`.
    pub fn validate_multiple<T: DeserializeOwned>(
        &self,
        schema: &Schema,
        inputs: &[Value],
        options: impl Into<ValidationOptions>,
    ) -> Result<ValidationResult<Vec<T>>, ValidationError> {
        let options = options.into();
        finish(self.batch(schema, inputs, &options), &options)
    }

    /// Never-raising counterpart of [`Validator::validate_multiple`].
    pub fn evaluate_multiple<T: DeserializeOwned>(
        &self,
        schema: &Schema,
        inputs: &[Value],
        options: impl Into<ValidationOptions>,
    ) -> ValidationResult<Vec<T>> {
        self.batch(schema, inputs, &options.into())
    }

    fn batch<T: DeserializeOwned>(
        &self,
        schema: &Schema,
        inputs: &[Value],
        options: &ValidationOptions,
    ) -> ValidationResult<Vec<T>> {
        let item_options = options.clone().throw_on_error(false);
        let label = schema.name().unwrap_or(ANONYMOUS_SCHEMA);
        let locale = self.locale();
        let started = Instant::now();

        let mut data = Vec::with_capacity(inputs.len());
        let mut failures = Vec::new();

        for (index, input) in inputs.iter().enumerate() {
            let result: ValidationResult<T> = self.run(schema, input, &item_options);
            let succeeded = result.is_success();
            METRICS.record_batch_item(label, succeeded);

            if succeeded {
                if let Some(item) = result.into_data() {
                    data.push(item);
                }
                continue;
            }

            failures.push(ItemFailure {
                index,
                error: result
                    .error()
                    .map(str::to_string)
                    .unwrap_or_else(|| locale.item_failed().to_string()),
                errors: result.errors().to_vec(),
            });
        }

        crate::log_slow_operation!(
            started.elapsed(),
            SLOW_BATCH_MS,
            schema = label,
            items = inputs.len(),
            "batch validation finished"
        );

        if failures.is_empty() {
            debug!(schema = label, items = inputs.len(), "batch validation passed");
            return ValidationResult::valid(data, locale.batch_success_summary(inputs.len()));
        }

        let summary = locale.batch_failure_summary(failures.len(), inputs.len());
        if self.console_enabled() {
            let indices: Vec<usize> = failures.iter().map(|f| f.index).collect();
            warn!(schema = label, failed = ?indices, "{summary}");
        }

        ValidationResult::batch_failure(locale.batch_failed().to_string(), summary, failures, data)
    }
}

//! Prometheus metrics for validation and API traffic
//!
//! Counters are process-global and text-encodable; the CLI can dump them
//! after a command with `--print-metrics`.
use crate::logging::api_span;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use prometheus_client::encoding::{EncodeLabelSet, text::encode};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::histogram::{Histogram, exponential_buckets};
use prometheus_client::registry::Registry;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Span;

/// Global metrics registry instance
pub static METRICS: Lazy<Arc<MetricsCollector>> = Lazy::new(|| Arc::new(MetricsCollector::new()));

/// Outcome of one validation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Valid,
    Mismatch,
    Fault,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Valid => "valid",
            Outcome::Mismatch => "mismatch",
            Outcome::Fault => "fault",
        }
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ValidationLabels {
    /// Schema name ("anonymous" when unnamed)
    pub schema: String,
    /// "valid", "mismatch" or "fault"
    pub outcome: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct IssueLabels {
    pub schema: String,
    /// Issue code, e.g. "invalid_type"
    pub code: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct BatchItemLabels {
    pub schema: String,
    /// "ok" or "failed"
    pub status: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ApiLabels {
    pub operation: String,
    /// "success" or an error category
    pub status: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct OperationLabels {
    pub operation: String,
}

pub struct MetricsCollector {
    registry: RwLock<Registry>,

    /// Validation calls by schema and outcome
    pub validations_total: Family<ValidationLabels, Counter>,

    /// Structural issues by schema and issue code
    pub validation_issues_total: Family<IssueLabels, Counter>,

    /// Batch items by schema and status
    pub batch_items_total: Family<BatchItemLabels, Counter>,

    /// API operations by operation and status
    pub api_requests_total: Family<ApiLabels, Counter>,

    /// API operation latency in seconds
    pub api_request_duration_seconds: Family<OperationLabels, Histogram>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let validations_total = Family::<ValidationLabels, Counter>::default();
        registry.register(
            "userflow_validations_total",
            "Total number of schema validations",
            validations_total.clone(),
        );

        let validation_issues_total = Family::<IssueLabels, Counter>::default();
        registry.register(
            "userflow_validation_issues_total",
            "Total number of structural issues reported",
            validation_issues_total.clone(),
        );

        let batch_items_total = Family::<BatchItemLabels, Counter>::default();
        registry.register(
            "userflow_batch_items_total",
            "Total number of batch items validated",
            batch_items_total.clone(),
        );

        let api_requests_total = Family::<ApiLabels, Counter>::default();
        registry.register(
            "userflow_api_requests_total",
            "Total number of user API operations",
            api_requests_total.clone(),
        );

        let api_request_duration_seconds =
            Family::<OperationLabels, Histogram>::new_with_constructor(|| {
                // 10ms .. ~38s
                Histogram::new(exponential_buckets(0.01, 2.5, 10))
            });
        registry.register(
            "userflow_api_request_duration_seconds",
            "User API latency histogram in seconds",
            api_request_duration_seconds.clone(),
        );

        Self {
            registry: RwLock::new(registry),
            validations_total,
            validation_issues_total,
            batch_items_total,
            api_requests_total,
            api_request_duration_seconds,
        }
    }

    /// Encode metrics in Prometheus text format
    pub fn encode(&self) -> Result<String, std::fmt::Error> {
        let mut buffer = String::new();
        let registry = self.registry.read();
        encode(&mut buffer, &registry)?;
        Ok(buffer)
    }

    pub fn record_validation(&self, schema: &str, outcome: Outcome) {
        self.validations_total
            .get_or_create(&ValidationLabels {
                schema: schema.to_string(),
                outcome: outcome.as_str().to_string(),
            })
            .inc();
    }

    pub fn record_issue(&self, schema: &str, code: &str) {
        self.validation_issues_total
            .get_or_create(&IssueLabels {
                schema: schema.to_string(),
                code: code.to_string(),
            })
            .inc();
    }

    pub fn record_batch_item(&self, schema: &str, ok: bool) {
        self.batch_items_total
            .get_or_create(&BatchItemLabels {
                schema: schema.to_string(),
                status: if ok { "ok" } else { "failed" }.to_string(),
            })
            .inc();
    }

    pub fn record_api_call(&self, operation: &str, status: &str, duration: Duration) {
        self.api_requests_total
            .get_or_create(&ApiLabels {
                operation: operation.to_string(),
                status: status.to_string(),
            })
            .inc();

        self.api_request_duration_seconds
            .get_or_create(&OperationLabels {
                operation: operation.to_string(),
            })
            .observe(duration.as_secs_f64());
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII timer for one API operation.
///
/// Records on [`ApiCallMetrics::success`] / [`ApiCallMetrics::error`]; a guard
/// dropped without either counts as an "unknown" failure. The same status and
/// duration land on the operation's `api_call` span.
pub struct ApiCallMetrics {
    operation: &'static str,
    start: Instant,
    span: Span,
    completed: bool,
}

impl ApiCallMetrics {
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
            span: api_span(operation),
            completed: false,
        }
    }

    /// Span to instrument the operation's future with.
    pub fn span(&self) -> Span {
        self.span.clone()
    }

    pub fn success(mut self) {
        self.finish("success");
    }

    pub fn error(mut self, category: &str) {
        self.finish(category);
    }

    fn finish(&mut self, status: &str) {
        let elapsed = self.start.elapsed();
        METRICS.record_api_call(self.operation, status, elapsed);
        self.span.record("status", status);
        self.span.record("duration_ms", elapsed.as_millis() as u64);
        self.completed = true;
    }
}

impl Drop for ApiCallMetrics {
    fn drop(&mut self) {
        if !self.completed {
            self.finish("unknown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collector_creation() {
        let collector = MetricsCollector::new();
        collector.record_validation("user", Outcome::Valid);
        let output = collector.encode().unwrap();

        assert!(output.contains("userflow_validations_total"));
        assert!(output.contains("userflow_validation_issues_total"));
        assert!(output.contains("userflow_batch_items_total"));
        assert!(output.contains("userflow_api_requests_total"));
    }

    #[test]
    fn test_record_validation_outcomes() {
        let collector = MetricsCollector::new();
        collector.record_validation("user", Outcome::Mismatch);
        collector.record_issue("user", "too_small");
        collector.record_batch_item("user", false);

        let output = collector.encode().unwrap();
        assert!(output.contains("mismatch"));
        assert!(output.contains("too_small"));
        assert!(output.contains("failed"));
    }

    #[test]
    fn test_api_metrics_guard() {
        {
            let metrics = ApiCallMetrics::new("metrics_guard_test");
            metrics.error("io_error");
        }
        {
            let _dropped = ApiCallMetrics::new("metrics_guard_dropped");
        }

        let output = METRICS.encode().unwrap();
        assert!(output.contains("metrics_guard_test"));
        assert!(output.contains("io_error"));
        assert!(output.contains("metrics_guard_dropped"));
        assert!(output.contains("unknown"));
    }

    #[test]
    fn test_concurrent_metrics() {
        use std::thread;

        let collector = Arc::new(MetricsCollector::new());
        let handles: Vec<_> = (0..10)
            .map(|i| {
                let collector = collector.clone();
                thread::spawn(move || {
                    collector.record_validation(&format!("schema_{}", i % 3), Outcome::Valid);
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let output = collector.encode().unwrap();
        assert!(output.contains("schema_0"));
        assert!(output.contains("schema_2"));
    }
}

//! Canned user payloads and the human-readable validation report.

use crate::api::user::validate_user;
use crate::validation::Validator;
use chrono::{SecondsFormat, Utc};
use clap::ValueEnum;
use serde_json::{Value, json};
use std::fmt::Write as _;
use strum::{Display, EnumIter, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum DemoCase {
    /// Every field present and valid.
    Valid,
    /// Only the required fields.
    Minimal,
    /// One violation per field.
    Invalid,
    /// `isActive` missing.
    Partial,
}

impl DemoCase {
    pub fn payload(self) -> Value {
        match self {
            DemoCase::Valid => json!({
                "id": 1,
                "name": "Valid User",
                "email": "valid@example.com",
                "age": 30,
                "isActive": true,
                "createdAt": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            }),
            DemoCase::Minimal => json!({
                "id": 2,
                "name": "Minimal User",
                "email": "minimal@example.com",
                "isActive": false,
            }),
            DemoCase::Invalid => json!({
                "id": "not a number",
                "name": "",
                "email": "not an email",
                "age": -5,
                "isActive": "not a boolean",
                "createdAt": "not a date",
            }),
            DemoCase::Partial => json!({
                "id": 3,
                "name": "Partial User",
                "email": "partial@example.com",
            }),
        }
    }

    /// Payload as pretty-printed JSON text.
    pub fn text(self) -> String {
        serde_json::to_string_pretty(&self.payload()).unwrap_or_default()
    }
}

/// Parse `text`, validate it as a user and render the outcome.
pub fn test_user_validation(validator: &Validator, text: &str) -> String {
    let input: Value = match serde_json::from_str(text) {
        Ok(input) => input,
        Err(err) => {
            if validator.console_enabled() {
                tracing::error!(error = %err, "failed to parse demo input");
            }
            return format!("❌ JSON parse failed:\n{err}");
        }
    };

    let result = validate_user(validator, &input);
    let mut report = String::new();

    if let Some(user) = result.data() {
        let _ = write!(
            report,
            "✅ {}\n\nValidated data:\n{}",
            result.summary().unwrap_or("validation succeeded"),
            serde_json::to_string_pretty(user).unwrap_or_default()
        );
        return report;
    }

    let _ = write!(report, "❌ {}", result.summary().unwrap_or("validation failed"));
    if !result.errors().is_empty() {
        report.push_str("\n\nErrors:");
        for (index, error) in result.errors().iter().enumerate() {
            let _ = write!(report, "\n{}. {}: {}", index + 1, error.field, error.message);
        }
    } else if let Some(error) = result.error() {
        let _ = write!(report, "\n\nError: {error}");
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::StaticGate;
    use strum::IntoEnumIterator;

    fn validator() -> Validator {
        Validator::new(StaticGate::closed())
    }

    #[test]
    fn valid_and_minimal_pass() {
        for case in [DemoCase::Valid, DemoCase::Minimal] {
            let report = test_user_validation(&validator(), &case.text());
            assert!(
                report.starts_with("✅ user data validation succeeded"),
                "{case}: {report}"
            );
        }
    }

    #[test]
    fn invalid_reports_one_line_per_field() {
        let report = test_user_validation(&validator(), &DemoCase::Invalid.text());
        assert!(report.starts_with("❌ user data validation failed: found 6 validation errors"));
        assert!(report.contains("\n1. id: expected number, got string"));
        assert!(report.contains("\n2. name: string length must be ≥ 1"));
        assert!(report.contains("\n6. createdAt: invalid string format"));
    }

    #[test]
    fn partial_misses_is_active() {
        let report = test_user_validation(&validator(), &DemoCase::Partial.text());
        assert!(report.contains("1. isActive: expected boolean, got undefined"));
    }

    #[test]
    fn unparsable_text_reports_parse_failure() {
        let report = test_user_validation(&validator(), "{ not json");
        assert!(report.starts_with("❌ JSON parse failed:\n"));
    }

    #[test]
    fn cases_parse_from_their_names() {
        let names: Vec<String> = DemoCase::iter().map(|case| case.to_string()).collect();
        assert_eq!(names, ["valid", "minimal", "invalid", "partial"]);
        assert_eq!("partial".parse::<DemoCase>().unwrap(), DemoCase::Partial);
    }
}

//! Error localizer and message catalog.
//!
//! [`localize`] turns one structural [`Issue`] into the message users see.
//! The same [`Locale`] also owns every summary template the engine and batch
//! validation emit, so a validator speaks a single language end to end.

use crate::validation::issue::{BoundTarget, Issue, IssueKind, StringFormat};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Supported message catalogs.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum Locale {
    #[default]
    #[strum(to_string = "en", ascii_case_insensitive)]
    #[serde(rename = "en")]
    En,
    #[strum(to_string = "zh-TW", serialize = "zh_tw", ascii_case_insensitive)]
    #[serde(rename = "zh-TW")]
    ZhTw,
}

/// Map a structural issue to a localized, human-readable message.
///
/// Issue kinds without a template fall back to the issue's raw message.
pub fn localize(issue: &Issue, locale: Locale) -> String {
    match (&issue.kind, locale) {
        (IssueKind::InvalidType { expected, received }, Locale::En) => {
            format!("expected {expected}, got {received}")
        }
        (IssueKind::InvalidType { expected, received }, Locale::ZhTw) => {
            format!("期望 {expected}，但收到 {received}")
        }
        (IssueKind::InvalidString { validation }, _) => string_format(*validation, locale),
        (
            IssueKind::TooSmall {
                target, minimum, ..
            },
            _,
        ) => match (target, locale) {
            (BoundTarget::String, Locale::En) => format!("string length must be ≥ {minimum}"),
            (BoundTarget::String, Locale::ZhTw) => format!("字串長度必須大於等於 {minimum}"),
            (_, Locale::En) => format!("value must be ≥ {minimum}"),
            (_, Locale::ZhTw) => format!("值必須大於等於 {minimum}"),
        },
        (
            IssueKind::TooBig {
                target, maximum, ..
            },
            _,
        ) => match (target, locale) {
            (BoundTarget::String, Locale::En) => format!("string length must be ≤ {maximum}"),
            (BoundTarget::String, Locale::ZhTw) => format!("字串長度必須小於等於 {maximum}"),
            (_, Locale::En) => format!("value must be ≤ {maximum}"),
            (_, Locale::ZhTw) => format!("值必須小於等於 {maximum}"),
        },
        (IssueKind::InvalidEnumValue { options, .. }, Locale::En) => {
            format!("must be one of: {}", options.join(", "))
        }
        (IssueKind::InvalidEnumValue { options, .. }, Locale::ZhTw) => {
            format!("必須是以下值之一: {}", options.join(", "))
        }
        (IssueKind::UnrecognizedKeys { keys }, Locale::En) => {
            format!("disallowed field(s): {}", keys.join(", "))
        }
        (IssueKind::UnrecognizedKeys { keys }, Locale::ZhTw) => {
            format!("不允許的欄位: {}", keys.join(", "))
        }
        (IssueKind::InvalidDate, Locale::En) => "invalid date format".to_string(),
        (IssueKind::InvalidDate, Locale::ZhTw) => "無效的日期格式".to_string(),
        (IssueKind::Custom, _) => issue.message.clone(),
    }
}

fn string_format(format: StringFormat, locale: Locale) -> String {
    let text = match (format, locale) {
        (StringFormat::Email, Locale::En) => "invalid email format",
        (StringFormat::Email, Locale::ZhTw) => "無效的電子郵件格式",
        (StringFormat::Url, Locale::En) => "invalid URL format",
        (StringFormat::Url, Locale::ZhTw) => "無效的網址格式",
        (_, Locale::En) => "invalid string format",
        (_, Locale::ZhTw) => "字串格式無效",
    };
    text.to_string()
}

impl Locale {
    pub fn default_error_message(&self) -> &'static str {
        match self {
            Locale::En => "data validation failed",
            Locale::ZhTw => "資料驗證失敗",
        }
    }

    pub fn default_success_message(&self) -> &'static str {
        match self {
            Locale::En => "data validation succeeded",
            Locale::ZhTw => "資料驗證成功",
        }
    }

    /// `<errorMessage>: found <N> validation errors`
    pub fn mismatch_summary(&self, error_message: &str, count: usize) -> String {
        match self {
            Locale::En => format!("{error_message}: found {count} validation errors"),
            Locale::ZhTw => format!("{error_message}: 發現 {count} 個驗證錯誤"),
        }
    }

    /// `<errorMessage>: <fault>`
    pub fn fault_summary(&self, error_message: &str, fault: &str) -> String {
        format!("{error_message}: {fault}")
    }

    pub fn unknown_fault(&self) -> &'static str {
        match self {
            Locale::En => "unknown error",
            Locale::ZhTw => "未知錯誤",
        }
    }

    pub fn item_failed(&self) -> &'static str {
        match self {
            Locale::En => "validation failed",
            Locale::ZhTw => "驗證失敗",
        }
    }

    pub fn batch_failed(&self) -> &'static str {
        match self {
            Locale::En => "batch validation failed",
            Locale::ZhTw => "批量驗證失敗",
        }
    }

    /// `<failed>/<total> items failed validation`
    pub fn batch_failure_summary(&self, failed: usize, total: usize) -> String {
        match self {
            Locale::En => format!("{failed}/{total} items failed validation"),
            Locale::ZhTw => format!("{failed}/{total} 項目驗證失敗"),
        }
    }

    /// `batch validation succeeded: <N> items`
    pub fn batch_success_summary(&self, count: usize) -> String {
        match self {
            Locale::En => format!("batch validation succeeded: {count} items"),
            Locale::ZhTw => format!("批量驗證成功: {count} 項目"),
        }
    }

    /// Heading printed in diagnostics above the violation table.
    pub fn diagnostics_heading(&self, count: usize) -> String {
        match self {
            Locale::En => format!("schema validation failed - {count} field errors"),
            Locale::ZhTw => format!("Schema 驗證失敗 - 發現 {count} 個欄位錯誤"),
        }
    }
}

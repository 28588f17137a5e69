//! Localized messages as they surface through the validator.

use serde_json::json;
use userflow::validation::{
    Locale, Schema, SchemaExt, StaticGate, ValidationOptions, Validator,
};

fn schema() -> Schema {
    Schema::object()
        .field("email", Schema::string().email())
        .field("site", Schema::string().url().optional())
        .field("code", Schema::string().max_length(3).optional())
        .field("score", Schema::number().max(10.0).optional())
        .field("role", Schema::enumeration(["admin", "user"]).optional())
        .field("born", Schema::date().optional())
        .strict()
        .into()
}

fn messages(locale: Locale) -> Vec<(String, String)> {
    let input = json!({
        "email": "nope",
        "site": "not a url",
        "code": "toolong",
        "score": 11,
        "role": "root",
        "born": "yesterday",
        "extra": 1
    });
    Validator::new(StaticGate::closed())
        .with_locale(locale)
        .validate_value(&schema(), &input, ValidationOptions::non_throwing())
        .unwrap()
        .errors()
        .iter()
        .map(|e| (e.field.clone(), e.message.clone()))
        .collect()
}

#[test]
fn english_catalog() {
    let expected = [
        ("email", "invalid email format"),
        ("site", "invalid URL format"),
        ("code", "string length must be ≤ 3"),
        ("score", "value must be ≤ 10"),
        ("role", "must be one of: admin, user"),
        ("born", "invalid date format"),
        ("", "disallowed field(s): extra"),
    ];
    let actual = messages(Locale::En);
    let actual: Vec<(&str, &str)> = actual.iter().map(|(f, m)| (f.as_str(), m.as_str())).collect();
    assert_eq!(actual, expected);
}

#[test]
fn traditional_chinese_catalog() {
    let actual = messages(Locale::ZhTw);
    assert_eq!(actual[0].1, "無效的電子郵件格式");
    assert_eq!(actual[1].1, "無效的網址格式");
    assert_eq!(actual[2].1, "字串長度必須小於等於 3");
    assert_eq!(actual[3].1, "值必須小於等於 10");
    assert_eq!(actual[4].1, "必須是以下值之一: admin, user");
    assert_eq!(actual[5].1, "無效的日期格式");
    assert_eq!(actual[6].1, "不允許的欄位: extra");
}

#[test]
fn custom_messages_pass_through() {
    let schema: Schema = Schema::object()
        .field("password", Schema::string())
        .field("confirm", Schema::string())
        .refine(["confirm"], "passwords must match", |value| {
            value.get("password") == value.get("confirm")
        })
        .into();
    let result = Validator::new(StaticGate::closed())
        .with_locale(Locale::ZhTw)
        .validate_value(
            &schema,
            &json!({"password": "a", "confirm": "b"}),
            ValidationOptions::non_throwing(),
        )
        .unwrap();

    assert_eq!(result.errors()[0].field, "confirm");
    assert_eq!(result.errors()[0].message, "passwords must match");
    assert_eq!(result.summary(), Some("資料驗證失敗: 發現 1 個驗證錯誤"));
}

#[test]
fn enum_type_mismatch_lists_literals() {
    let schema: Schema = Schema::object()
        .field("role", Schema::enumeration(["admin", "user"]))
        .into();
    let result = Validator::new(StaticGate::closed())
        .validate_value(&schema, &json!({"role": 1}), ValidationOptions::non_throwing())
        .unwrap();
    assert_eq!(
        result.errors()[0].message,
        "expected 'admin' | 'user', got number"
    );
}

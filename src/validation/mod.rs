//! Schema validation pipeline.
//!
//! - [`schema`]: declarative constraint trees and envelope composition
//! - [`parse`]: the interpreter that turns a tree and a JSON value into either
//!   the coerced value or an ordered list of [`Issue`]s
//! - [`engine`]: [`Validator`], options, results and the throw decision
//! - [`batch`]: per-item validation of a JSON array
//! - [`localize`]: issue messages and summary templates per [`Locale`]
//! - [`gate`]: whether failure diagnostics may be emitted
//! - [`registry`]: built-in schemas by name
//!
//! # Usage
//!
//! ```rust
//! use serde_json::json;
//! use userflow::validation::{StaticGate, ValidationOptions, Validator};
//! use userflow::model::user::{User, user_schema};
//!
//! let validator = Validator::new(StaticGate::closed());
//! let result = validator
//!     .validate::<User>(
//!         &user_schema(),
//!         &json!({"id": 1, "name": "Ann", "email": "ann@example.com", "isActive": true}),
//!         ValidationOptions::new(),
//!     )
//!     .unwrap();
//! assert_eq!(result.data().map(|u| u.name.as_str()), Some("Ann"));
//! ```

pub mod batch;
pub mod engine;
pub mod gate;
pub mod issue;
pub mod localize;
pub mod parse;
pub mod registry;
pub mod schema;

pub use batch::ItemFailure;
pub use engine::{
    FieldError, ValidationOptions, ValidationResult, Validator, format_violation_table,
};
pub use gate::{ConfigGate, ConsoleGate, EnvironmentGate, StaticGate};
pub use issue::{FieldPath, Issue, IssueKind, PathSegment};
pub use localize::{Locale, localize};
pub use parse::parse;
pub use registry::{SchemaRegistry, SchemaRegistryBuilder, names};
pub use schema::{Schema, SchemaExt, UnknownKeys, base_response_schema, envelope};

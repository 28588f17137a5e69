//! Typed domain records and the schemas that guard them.

pub mod user;

pub use user::{ApiEnvelope, CreateUserInput, DeleteOutcome, User, UserPatch};

//! User API client and its transport seam.

pub mod transport;
pub mod user;

pub use transport::{ApiRequest, HttpTransport, Transport};
pub use user::{UserApi, validate_create_user_input, validate_user, validate_users};

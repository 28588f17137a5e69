pub mod api;
pub mod cli;
pub mod config;
pub mod demo;
pub mod error;
pub mod flow;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod validation;

pub use api::{HttpTransport, Transport, UserApi};
pub use config::{ConfigArgs, Environment, ProjectConfig, RuntimeConfig};
pub use error::{ApiError, ConfigError, ErrorCode, TransportError, ValidationError};
pub use flow::{UserFlow, UserState};
pub use logging::{LoggingConfig, init_logging};
pub use metrics::METRICS;
pub use validation::{ValidationOptions, ValidationResult, Validator};

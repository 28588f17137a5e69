use crate::error::ConfigError;
use crate::validation::registry::names;
use crate::validation::schema::{Schema, SchemaExt};
use crate::validation::{EnvironmentGate, Validator};
use anyhow::{Context, Result};
use clap::builder::BoolishValueParser;
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use strum::{Display, EnumString};

const DEFAULT_API_BASE_URL: &str = "https://api.example.com";
const DEFAULT_API_TIMEOUT_MS: u64 = 5000;
const DEFAULT_LOCAL_ORIGIN: &str = "http://127.0.0.1:3000";

/// Variables consulted, in order, when no environment is configured.
const ENVIRONMENT_VARS: &[&str] = &["USERFLOW_ENV", "ENVIRONMENT", "ENV"];

pub const BASE_URL_REQUIRED: &str = "baseURL must not be empty when using a remote API";

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    ValueEnum,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum Environment {
    #[default]
    #[strum(to_string = "development", serialize = "dev")]
    #[value(alias = "dev")]
    #[serde(alias = "dev")]
    Development,
    #[strum(to_string = "production", serialize = "prod")]
    #[value(alias = "prod")]
    #[serde(alias = "prod")]
    Production,
}

impl Environment {
    /// Read the environment from `USERFLOW_ENV`, `ENVIRONMENT` or `ENV`.
    ///
    /// Unset or unrecognized values mean development.
    pub fn from_process_env() -> Self {
        ENVIRONMENT_VARS
            .iter()
            .find_map(|key| env::var(key).ok())
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or_default()
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

// ============================================================================
// SOURCES
// ============================================================================

#[derive(Args, Debug, Default, Clone)]
pub struct ConfigArgs {
    #[arg(
        long,
        value_name = "FILE",
        help = "Path to a configuration file (YAML or JSON)",
        global = true
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        env = "USERFLOW_ENV",
        value_enum,
        value_name = "ENV",
        help = "Runtime environment",
        global = true
    )]
    pub environment: Option<Environment>,

    #[arg(
        long,
        env = "USERFLOW_API_BASE_URL",
        value_name = "URL",
        help = "Base URL of the remote user API",
        global = true
    )]
    pub api_base_url: Option<String>,

    #[arg(
        long,
        env = "USERFLOW_API_TIMEOUT_MS",
        value_name = "MS",
        help = "API request timeout in milliseconds",
        value_parser = clap::value_parser!(u64),
        global = true
    )]
    pub api_timeout_ms: Option<u64>,

    #[arg(
        long,
        env = "USERFLOW_USE_LOCAL_API",
        value_name = "BOOL",
        help = "Use the local API origin instead of the remote base URL (development only)",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub use_local_api: Option<bool>,

    #[arg(
        long,
        env = "USERFLOW_SHOW_CONSOLE",
        value_name = "BOOL",
        help = "Emit validation diagnostics",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub show_console: Option<bool>,

    #[arg(
        long,
        env = "USERFLOW_LOCAL_ORIGIN",
        value_name = "URL",
        help = "Origin serving the local API",
        global = true
    )]
    pub local_origin: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    environment: Option<Environment>,
    api_base_url: Option<String>,
    api_timeout_ms: Option<u64>,
    use_local_api: Option<bool>,
    show_console: Option<bool>,
    local_origin: Option<String>,
}

fn load_config_file(path: &Path) -> Result<PartialConfig> {
    if !path.exists() {
        anyhow::bail!("config file {:?} does not exist", path);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {:?}", path))?;
    let ext = path
        .extension()
        .and_then(|os| os.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse YAML config {:?}", path))?,
        "json" => serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse JSON config {:?}", path))?,
        other => anyhow::bail!("unsupported config extension: {other}"),
    };
    Ok(parsed)
}

// ============================================================================
// RUNTIME CONFIG
// ============================================================================

/// Merged runtime inputs: flags, then `USERFLOW_*` variables, then the config
/// file, then defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub environment: Environment,
    pub api_base_url: String,
    pub api_timeout_ms: u64,
    pub use_local_api: bool,
    pub show_console: bool,
    pub local_origin: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            environment: Environment::from_process_env(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_timeout_ms: DEFAULT_API_TIMEOUT_MS,
            use_local_api: false,
            show_console: false,
            local_origin: DEFAULT_LOCAL_ORIGIN.to_string(),
        }
    }
}

impl RuntimeConfig {
    pub fn from_args(args: ConfigArgs) -> Result<Self> {
        let ConfigArgs {
            config,
            environment: cli_environment,
            api_base_url: cli_api_base_url,
            api_timeout_ms: cli_api_timeout_ms,
            use_local_api: cli_use_local_api,
            show_console: cli_show_console,
            local_origin: cli_local_origin,
        } = args;

        let file_config = if let Some(path) = config.as_ref() {
            load_config_file(path)?
        } else {
            PartialConfig::default()
        };

        let PartialConfig {
            environment: file_environment,
            api_base_url: file_api_base_url,
            api_timeout_ms: file_api_timeout_ms,
            use_local_api: file_use_local_api,
            show_console: file_show_console,
            local_origin: file_local_origin,
        } = file_config;

        let defaults = Self::default();

        let api_base_url = cli_api_base_url
            .or(file_api_base_url)
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_base_url);

        let local_origin = cli_local_origin
            .or(file_local_origin)
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .unwrap_or(defaults.local_origin);

        anyhow::ensure!(
            !local_origin.is_empty(),
            "local origin must not be empty"
        );

        Ok(Self {
            environment: cli_environment
                .or(file_environment)
                .unwrap_or(defaults.environment),
            api_base_url,
            api_timeout_ms: cli_api_timeout_ms
                .or(file_api_timeout_ms)
                .unwrap_or(defaults.api_timeout_ms),
            use_local_api: cli_use_local_api
                .or(file_use_local_api)
                .unwrap_or(defaults.use_local_api),
            show_console: cli_show_console
                .or(file_show_console)
                .unwrap_or(defaults.show_console),
            local_origin,
        })
    }

    /// Assemble the unvalidated project configuration record.
    ///
    /// Production always talks to `api_base_url`; development uses the local
    /// origin (empty `baseURL`) when `use_local_api` is set.
    pub fn raw_project_config(&self) -> Value {
        let production = self.environment.is_production();
        let use_local_api = !production && self.use_local_api;
        let base_url = if use_local_api {
            String::new()
        } else {
            self.api_base_url.clone()
        };

        json!({
            "environment": self.environment,
            "baseURL": base_url,
            "timeout": self.api_timeout_ms,
            "isUseLocalApi": use_local_api,
            "showConsole": self.show_console,
        })
    }

    /// Validate the assembled record against the project config schema.
    pub fn resolve(&self) -> Result<ProjectConfig, ConfigError> {
        // Diagnostics here follow the process environment only; consulting
        // this config for `showConsole` would recurse.
        let validator = Validator::new(EnvironmentGate);
        let result = validator.validate::<ProjectConfig>(
            &project_config_schema(),
            &self.raw_project_config(),
            "config validation failed",
        )?;
        Ok(result.into_result()?)
    }

    /// Origin requests are sent to: `baseURL`, or the local origin when empty.
    pub fn request_origin(&self, project: &ProjectConfig) -> String {
        if project.base_url.is_empty() {
            self.local_origin.clone()
        } else {
            project.base_url.clone()
        }
    }
}

/// Validated project configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub environment: Environment,
    #[serde(rename = "baseURL")]
    pub base_url: String,
    /// Request timeout in milliseconds.
    pub timeout: u64,
    #[serde(rename = "isUseLocalApi")]
    pub is_use_local_api: bool,
    #[serde(rename = "showConsole")]
    pub show_console: bool,
}

pub fn project_config_schema() -> Schema {
    Schema::object()
        .field(
            "environment",
            Schema::enumeration(["development", "production"]),
        )
        .field("baseURL", Schema::string())
        .field(
            "timeout",
            Schema::number()
                .positive()
                .message("API timeout must be greater than 0"),
        )
        .field("isUseLocalApi", Schema::boolean())
        .field("showConsole", Schema::boolean())
        .refine(["baseURL"], BASE_URL_REQUIRED, base_url_present)
        .named(names::PROJECT_CONFIG)
}

fn base_url_present(config: &Value) -> bool {
    let base_url_empty = config
        .get("baseURL")
        .and_then(Value::as_str)
        .is_none_or(str::is_empty);
    let use_local_api = config
        .get("isUseLocalApi")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    match config.get("environment").and_then(Value::as_str) {
        Some("production") => !base_url_empty,
        Some("development") if !use_local_api => !base_url_empty,
        _ => true,
    }
}

// ============================================================================
// CONFIG SOURCES
// ============================================================================

/// Anything that can answer `showConsole` at call time.
pub trait ConfigSource: Send + Sync {
    fn show_console(&self) -> Result<bool, ConfigError>;
}

impl ConfigSource for ProjectConfig {
    fn show_console(&self) -> Result<bool, ConfigError> {
        Ok(self.show_console)
    }
}

impl ConfigSource for RuntimeConfig {
    fn show_console(&self) -> Result<bool, ConfigError> {
        self.resolve().map(|project| project.show_console)
    }
}

impl<S: ConfigSource + ?Sized> ConfigSource for Arc<S> {
    fn show_console(&self) -> Result<bool, ConfigError> {
        (**self).show_console()
    }
}

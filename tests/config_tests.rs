//! Runtime configuration sources and the config-backed console gate.

use assert_matches::assert_matches;
use serial_test::serial;
use std::env;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;
use userflow::config::{BASE_URL_REQUIRED, ConfigArgs, Environment, RuntimeConfig};
use userflow::error::{ConfigError, ValidationError};
use userflow::validation::{ConfigGate, ConsoleGate, EnvironmentGate};

const ENV_KEYS: &[&str] = &["USERFLOW_ENV", "ENVIRONMENT", "ENV"];

fn clear_env() {
    for key in ENV_KEYS {
        unsafe { env::remove_var(key) };
    }
}

fn config_file(suffix: &str, contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn args_for(file: &NamedTempFile) -> ConfigArgs {
    ConfigArgs {
        config: Some(file.path().to_path_buf()),
        ..ConfigArgs::default()
    }
}

#[test]
#[serial]
fn yaml_file_fills_unset_values() {
    clear_env();
    let file = config_file(
        ".yaml",
        "environment: production\napi_base_url: https://users.example.org/\napi_timeout_ms: 1500\nshow_console: true\n",
    );
    let config = RuntimeConfig::from_args(args_for(&file)).unwrap();

    assert_eq!(config.environment, Environment::Production);
    assert_eq!(config.api_base_url, "https://users.example.org");
    assert_eq!(config.api_timeout_ms, 1500);
    assert!(config.show_console);
    assert!(!config.use_local_api);

    let project = config.resolve().unwrap();
    assert_eq!(project.base_url, "https://users.example.org");
    assert_eq!(project.timeout, 1500);
}

#[test]
#[serial]
fn flags_override_json_file() {
    clear_env();
    let file = config_file(
        ".json",
        r#"{"environment": "development", "use_local_api": true, "local_origin": "http://localhost:4000/"}"#,
    );
    let args = ConfigArgs {
        api_timeout_ms: Some(900),
        use_local_api: Some(false),
        ..args_for(&file)
    };
    let config = RuntimeConfig::from_args(args).unwrap();

    assert_eq!(config.api_timeout_ms, 900);
    assert!(!config.use_local_api);
    assert_eq!(config.local_origin, "http://localhost:4000");
    assert_eq!(config.api_base_url, "https://api.example.com");
}

#[test]
fn rejects_unknown_extension_and_missing_file() {
    let file = config_file(".toml", "environment = 'production'");
    let err = RuntimeConfig::from_args(args_for(&file)).unwrap_err();
    assert!(err.to_string().contains("unsupported config extension"));

    let missing = ConfigArgs {
        config: Some("/definitely/not/here.yaml".into()),
        ..ConfigArgs::default()
    };
    assert!(RuntimeConfig::from_args(missing).unwrap_err().to_string().contains("does not exist"));
}

#[test]
#[serial]
fn empty_remote_base_url_is_rejected_in_development() {
    clear_env();
    let config = RuntimeConfig {
        environment: Environment::Development,
        api_base_url: String::new(),
        ..RuntimeConfig::default()
    };
    let err = config.resolve().unwrap_err();
    assert_matches!(
        err,
        ConfigError::Invalid(ValidationError::StructuralMismatch { ref errors, .. })
            if errors[0].field == "baseURL" && errors[0].message == BASE_URL_REQUIRED
    );
}

#[test]
#[serial]
fn environment_gate_follows_process_environment() {
    clear_env();
    assert!(EnvironmentGate.should_show_console());

    unsafe { env::set_var("ENVIRONMENT", "production") };
    assert!(!EnvironmentGate.should_show_console());

    unsafe { env::set_var("USERFLOW_ENV", "development") };
    assert!(EnvironmentGate.should_show_console(), "USERFLOW_ENV wins");
    clear_env();
}

#[test]
#[serial]
fn config_gate_reads_show_console_and_falls_back() {
    clear_env();
    let quiet = Arc::new(RuntimeConfig {
        environment: Environment::Development,
        show_console: false,
        ..RuntimeConfig::default()
    });
    assert!(!ConfigGate::new(Arc::clone(&quiet)).should_show_console());

    let broken = RuntimeConfig {
        environment: Environment::Production,
        api_base_url: String::new(),
        show_console: true,
        ..RuntimeConfig::default()
    };
    // unresolvable config: development process environment opens the gate
    assert!(ConfigGate::new(broken.clone()).should_show_console());

    unsafe { env::set_var("ENV", "prod") };
    assert!(!ConfigGate::new(broken).should_show_console());
    clear_env();
}

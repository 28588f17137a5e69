//! Command-line surface.

use crate::api::{HttpTransport, UserApi};
use crate::config::{ConfigArgs, RuntimeConfig};
use crate::demo::{DemoCase, test_user_validation};
use crate::metrics::METRICS;
use crate::validation::{ConfigGate, Locale, ValidationOptions, ValidationResult, Validator};
use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "userflow", version, about = "Validate user payloads and talk to the user API")]
pub struct Cli {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[arg(
        long,
        env = "USERFLOW_LOCALE",
        default_value = "en",
        help = "Message catalog (en, zh-TW)",
        global = true
    )]
    pub locale: Locale,

    #[arg(long, help = "Print collected metrics before exiting", global = true)]
    pub print_metrics: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate one JSON document against a named schema.
    Validate {
        #[arg(long, default_value = "user")]
        schema: String,
        #[arg(long)]
        error_message: Option<String>,
        /// JSON file, or `-` for stdin.
        #[arg(default_value = "-")]
        input: PathBuf,
    },
    /// Validate every element of a JSON array.
    ValidateBatch {
        #[arg(long, default_value = "user")]
        schema: String,
        input: PathBuf,
    },
    /// Run a canned user payload through the validation report.
    Demo {
        #[arg(value_enum)]
        case: DemoCase,
        /// Print the payload before the report.
        #[arg(long)]
        show_payload: bool,
    },
    /// Call the user API.
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
    /// List registered schemas.
    Schemas,
}

#[derive(Subcommand, Debug)]
pub enum UsersAction {
    List,
    Get { id: i64 },
    Delete { id: i64 },
}

pub async fn run(cli: Cli) -> Result<ExitCode> {
    let config = Arc::new(RuntimeConfig::from_args(cli.config)?);
    let validator =
        Validator::new(ConfigGate::new(Arc::clone(&config))).with_locale(cli.locale);

    let code = match cli.command {
        Command::Validate {
            schema,
            error_message,
            input,
        } => {
            let input = read_input(&input)?;
            let mut options = ValidationOptions::non_throwing();
            if let Some(message) = error_message {
                options = options.error_message(message);
            }
            let result: ValidationResult<Value> =
                validator.evaluate_named(&schema, &input, options);
            print_result(&result)?
        }
        Command::ValidateBatch { schema, input } => {
            let input = read_input(&input)?;
            let items = input
                .as_array()
                .ok_or_else(|| anyhow!("batch input must be a JSON array"))?;
            let schema = validator
                .registry()
                .get(&schema)
                .ok_or_else(|| anyhow!("schema '{schema}' is not registered"))?;
            let result: ValidationResult<Vec<Value>> =
                validator.evaluate_multiple(&schema, items, ValidationOptions::non_throwing());
            print_result(&result)?
        }
        Command::Demo { case, show_payload } => {
            let text = case.text();
            if show_payload {
                println!("{text}\n");
            }
            let report = test_user_validation(&validator, &text);
            println!("{report}");
            if report.starts_with('✅') {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Command::Users { action } => {
            let transport = HttpTransport::from_config(&config)
                .context("failed to configure the API transport")?;
            let api = UserApi::new(transport, validator);
            run_users(&api, action).await?
        }
        Command::Schemas => {
            for name in validator.registry().names() {
                println!("{name}");
            }
            ExitCode::SUCCESS
        }
    };

    if cli.print_metrics {
        let encoded = METRICS.encode().context("failed to encode metrics")?;
        eprintln!("{encoded}");
    }
    Ok(code)
}

async fn run_users(api: &UserApi<HttpTransport>, action: UsersAction) -> Result<ExitCode> {
    match action {
        UsersAction::List => {
            let users = api.get_users().await?;
            print_json(&users)?;
        }
        UsersAction::Get { id } => match api.get_user_by_id(id).await {
            Some(user) => print_json(&user)?,
            None => {
                eprintln!("user {id} not found");
                return Ok(ExitCode::FAILURE);
            }
        },
        UsersAction::Delete { id } => {
            let outcome = api.delete_user(id).await?;
            print_json(&outcome)?;
            if !outcome.success {
                return Ok(ExitCode::FAILURE);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn read_input(path: &Path) -> Result<Value> {
    let text = if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read stdin")?;
        buffer
    } else {
        std::fs::read_to_string(path).with_context(|| format!("failed to read {:?}", path))?
    };
    serde_json::from_str(&text).context("input is not valid JSON")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_result<T: Serialize>(result: &ValidationResult<T>) -> Result<ExitCode> {
    print_json(result)?;
    Ok(if result.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

use clap::Parser;
use std::process::ExitCode;
use userflow::cli::{Cli, run};
use userflow::{LoggingConfig, init_logging};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let _guard = init_logging(LoggingConfig::from_env())?;

    let cli = Cli::parse();
    run(cli).await
}

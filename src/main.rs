use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};
use std::io;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use airbrake_tools::commands::{dispatch, Session};
use airbrake_tools::config::print_default_config;
use airbrake_tools::output::format_error;
use airbrake_tools::projects::ProjectCache;
use airbrake_tools::source::airbrake::AirbrakeSource;
use airbrake_tools::{Cli, Command, Config};

fn init_logging(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn print_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "airbrake-tools", &mut io::stdout());
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);

    // Handle completions
    if let Some(shell) = cli.completions {
        print_completions(shell);
        return ExitCode::SUCCESS;
    }

    if cli.print_config {
        print_default_config();
        return ExitCode::SUCCESS;
    }

    let Some(command) = cli.command.clone() else {
        let _ = Cli::command().write_help(&mut io::stderr());
        eprintln!();
        return ExitCode::FAILURE;
    };

    let mut config = Config::load();
    config.apply_env_overrides();
    cli.apply_to(&mut config);

    let Some(token) = config.token.clone() else {
        let path = Config::config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "the config file".to_string());
        eprintln!(
            "{}",
            format_error(
                "No Airbrake API token configured",
                Some(&format!(
                    "Pass --token, set AIRBRAKE_TOKEN, or add `token` to {path}"
                )),
            )
        );
        return ExitCode::FAILURE;
    };

    match run(config, token, &command, cli.json).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", format_error(&format!("{err:#}"), None));
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config, token: String, command: &Command, json: bool) -> Result<()> {
    let source = AirbrakeSource::new(
        &config.api_url,
        token,
        Duration::from_secs(config.timeout_secs),
    )?;
    let mut projects = ProjectCache::new();
    let session = Session::connect(Arc::new(source), config, &mut projects, json).await?;
    dispatch(&session, command).await
}

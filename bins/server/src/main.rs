//! `hybrid-rag` binary entrypoint.

mod commands;
mod error;
mod telemetry;

use clap::{Parser, Subcommand, ValueEnum};
use commands::{
    SearchCommandInput, ServeCommandInput, run_config_check, run_config_show, run_search,
    run_serve,
};
use error::{CliError, ExitCode};
use hybrid_rag_config::{RUNTIME_ENV_VARS, TransportKind};
use hybrid_rag_infra::ConfigOutputFormat;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

/// Grace period for blocked stdin readers when the runtime stops.
const RUNTIME_SHUTDOWN_GRACE: Duration = Duration::from_millis(250);

#[derive(Debug, Parser)]
#[command(
    name = "hybrid-rag",
    version,
    about = "Hybrid dense + lexical search over a JSON-RPC boundary",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Serve JSON-RPC on stdio or HTTP.
    Serve {
        /// Optional config file path (JSON/TOML).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Transport override (`stdio` or `http`).
        #[arg(long, value_parser = parse_transport)]
        transport: Option<TransportKind>,
        /// HTTP bind host override.
        #[arg(long)]
        host: Option<String>,
        /// HTTP bind port override.
        #[arg(long)]
        port: Option<u16>,
    },
    /// Run one query and print the result JSON.
    Search {
        /// Search query text.
        #[arg(long)]
        query: String,
        /// Restrict to a source type; repeatable.
        #[arg(long = "source-type")]
        source_types: Vec<String>,
        /// Maximum number of results.
        #[arg(long)]
        limit: Option<u32>,
        /// Optional config file path (JSON/TOML).
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Config-related commands.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCommands {
    /// Print the effective config (secrets redacted).
    Show {
        /// Optional config file path (JSON/TOML).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Output format.
        #[arg(long, value_enum, default_value_t = ConfigFormatArg::Json)]
        format: ConfigFormatArg,
    },
    /// Validate the effective config.
    Check {
        /// Optional config file path (JSON/TOML).
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ConfigFormatArg {
    Json,
    Toml,
}

impl From<ConfigFormatArg> for ConfigOutputFormat {
    fn from(value: ConfigFormatArg) -> Self {
        match value {
            ConfigFormatArg::Json => Self::Json,
            ConfigFormatArg::Toml => Self::Toml,
        }
    }
}

/// Buffered command output.
#[derive(Debug, Default)]
pub(crate) struct CliOutput {
    stdout: String,
    exit_code: ExitCode,
}

impl CliOutput {
    fn stdout(stdout: String) -> Self {
        Self {
            stdout,
            ..Self::default()
        }
    }
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(error) => return exit_with_error(&CliError::Io(error)),
    };

    let env = collect_env();
    let outcome = runtime.block_on(run(&cli.command, &env));
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_GRACE);

    match outcome {
        Ok(output) => match write_output(&output) {
            Ok(()) => std::process::ExitCode::from(output.exit_code.as_u8()),
            Err(error) => exit_with_error(&error),
        },
        Err(error) => exit_with_error(&error),
    }
}

fn exit_with_error(error: &CliError) -> std::process::ExitCode {
    let _ = writeln!(io::stderr(), "error: {error}");
    std::process::ExitCode::from(error.exit_code().as_u8())
}

async fn run(command: &Commands, env: &BTreeMap<String, String>) -> Result<CliOutput, CliError> {
    match command {
        Commands::Serve {
            config,
            transport,
            host,
            port,
        } => {
            run_serve(
                env,
                &ServeCommandInput {
                    config_path: config.as_deref(),
                    transport: *transport,
                    host: host.as_deref(),
                    port: *port,
                },
            )
            .await
        },
        Commands::Search {
            query,
            source_types,
            limit,
            config,
        } => {
            run_search(
                env,
                &SearchCommandInput {
                    config_path: config.as_deref(),
                    query,
                    source_types,
                    limit: *limit,
                },
            )
            .await
        },
        Commands::Config { command } => match command {
            ConfigCommands::Show { config, format } => {
                run_config_show(env, config.as_deref(), (*format).into())
            },
            ConfigCommands::Check { config } => run_config_check(env, config.as_deref()),
        },
    }
}

fn write_output(output: &CliOutput) -> Result<(), CliError> {
    if !output.stdout.is_empty() {
        let mut stdout = io::stdout().lock();
        stdout.write_all(output.stdout.as_bytes())?;
        stdout.flush()?;
    }
    Ok(())
}

/// Snapshot of the config-relevant environment; non-UTF-8 values are skipped.
fn collect_env() -> BTreeMap<String, String> {
    RUNTIME_ENV_VARS
        .iter()
        .filter_map(|name| Some(((*name).to_owned(), std::env::var(name).ok()?)))
        .collect()
}

fn parse_transport(value: &str) -> Result<TransportKind, String> {
    TransportKind::parse(value).ok_or_else(|| {
        format!(
            "unknown transport `{value}` (expected one of: {})",
            TransportKind::LABELS.join(", ")
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn search_accepts_repeated_source_types() -> Result<(), clap::Error> {
        let cli = Cli::try_parse_from([
            "hybrid-rag",
            "search",
            "--query",
            "token refresh",
            "--source-type",
            "git",
            "--source-type",
            "jira",
            "--limit",
            "3",
        ])?;
        assert!(matches!(
            cli.command,
            Commands::Search { ref source_types, limit: Some(3), .. } if source_types.len() == 2
        ));
        Ok(())
    }

    #[test]
    fn transport_flag_uses_config_labels() {
        assert_eq!(parse_transport("HTTP"), Ok(TransportKind::Http));
        assert!(parse_transport("grpc").is_err());
    }
}

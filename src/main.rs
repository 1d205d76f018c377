mod cli;
mod commands;
mod error;
mod mcp;
mod page_range;
mod stream;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
use error::SelpgError;
use std::process::ExitCode;
use tracing::debug;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("selpg: {:#}", err);
            let (code, show_usage) = failure_status(&err);
            if show_usage {
                eprintln!("{}", Cli::command().render_help());
            }
            ExitCode::from(code)
        }
    }
}

/// Exit code for `err`, and whether the usage text should follow it.
fn failure_status(err: &anyhow::Error) -> (u8, bool) {
    match err.downcast_ref::<SelpgError>() {
        Some(e) => (e.exit_code(), e.shows_usage()),
        None => (2, false),
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Mcp) => {
            mcp::run_server().await?;
        }
        None => {
            let (input, selection, destination) = cli.select.into_parts()?;
            let report = commands::select::run(input, selection, destination).await?;
            debug!(
                bytes = report.bytes_written,
                last_page = report.last_page,
                "pages selected"
            );
        }
    }

    Ok(())
}

/// Logs go to stderr; stdout carries page data (or the MCP transport).
/// `RUST_LOG` controls the level, e.g. `RUST_LOG=selpg=debug`.
fn init_tracing() {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;
    use std::process::ExitStatus;

    #[test]
    fn test_range_error_shows_usage() {
        let err = anyhow::Error::new(SelpgError::Range).context("selecting pages");
        assert_eq!(failure_status(&err), (2, true));
    }

    #[test]
    fn test_usage_error_shows_usage() {
        let err = anyhow::Error::new(SelpgError::Usage("end before start".into()));
        assert_eq!(failure_status(&err), (2, true));
    }

    #[test]
    fn test_print_failure_hides_usage() {
        let err = anyhow::Error::new(SelpgError::Exit {
            program: "lp".into(),
            status: ExitStatus::from_raw(1 << 8),
        });
        assert_eq!(failure_status(&err), (2, false));
    }

    #[test]
    fn test_other_errors_exit_with_two() {
        let err = anyhow::anyhow!("transport closed");
        assert_eq!(failure_status(&err), (2, false));
    }

    #[test]
    fn test_help_lists_flags() {
        let help = Cli::command().render_help().to_string();
        for flag in ["--start", "--end", "--limit", "--pbflag", "--destination"] {
            assert!(help.contains(flag), "{} missing from help", flag);
        }
        assert!(help.contains("default: lp"), "{}", help);
    }
}

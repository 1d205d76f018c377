//! Error types shared by the scanner, the router and the print bridge.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Everything that can end a page selection run.
///
/// Messages do not repeat their source error; print with `{:#}` (or through
/// `anyhow`) to get the full chain.
#[derive(Debug, Error)]
pub enum SelpgError {
    /// Bad or conflicting options, detected before any input is read
    #[error("usage: {0}")]
    Usage(String),

    /// Standard input is an interactive terminal
    #[error("usage: invalid standard input, refusing to read pages from a terminal")]
    TerminalInput,

    #[error("failed to open {}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Read failure in the middle of a scan
    #[error("failed to read input")]
    Input(#[source] io::Error),

    #[error("failed to write selected pages")]
    Output(#[source] io::Error),

    /// Nothing was emitted: the input is empty or ends before the first
    /// requested page
    #[error("page number out of file range or input stream is empty")]
    Range,

    #[error("failed to create pipe to print command")]
    Pipe(#[source] io::Error),

    #[error("failed to start print command `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to relay output of print command `{program}`")]
    Relay {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("print command `{program}` failed ({status})")]
    Exit { program: String, status: ExitStatus },

    /// A background task panicked or was cancelled
    #[error("{0}")]
    Task(String),
}

impl SelpgError {
    /// Whether the help text should follow the error message.
    pub fn shows_usage(&self) -> bool {
        matches!(
            self,
            SelpgError::Usage(_)
                | SelpgError::TerminalInput
                | SelpgError::Open { .. }
                | SelpgError::Input(_)
                | SelpgError::Range
        )
    }

    /// Process exit code for this error. Every failure exits with 2.
    pub fn exit_code(&self) -> u8 {
        2
    }

    /// True for errors raised by the print command rather than by the scan.
    pub fn is_print_failure(&self) -> bool {
        matches!(
            self,
            SelpgError::Pipe(_)
                | SelpgError::Spawn { .. }
                | SelpgError::Relay { .. }
                | SelpgError::Exit { .. }
        )
    }
}

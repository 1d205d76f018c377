//! Streams selected pages into an external print command.
//!
//! The command reads from the pipe the router created; its own stdout and
//! stderr are copied back to ours while it runs. The result arrives once,
//! through [`PrintJob::wait`], after the process has exited and both relays
//! have reached end of stream.
//!
//! The write end of the pipe must be dropped before waiting. Until then the
//! command never sees end of input and the job never finishes.

use crate::error::SelpgError;
use std::io::PipeReader;
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::debug;

/// Spooler used when none is configured
pub const DEFAULT_PRINT_PROGRAM: &str = "lp";

/// An external command that consumes the selected pages on stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintCommand {
    program: String,
    args: Vec<String>,
}

impl PrintCommand {
    pub fn new(program: impl Into<String>) -> Self {
        PrintCommand {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// `<program> -d <destination>`, the calling convention of `lp`.
    pub fn spooler(program: impl Into<String>, destination: &str) -> Self {
        PrintCommand::new(program).arg("-d").arg(destination)
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

/// Handle to a running print command.
#[derive(Debug)]
pub struct PrintJob {
    program: String,
    handle: JoinHandle<Result<(), SelpgError>>,
}

impl PrintJob {
    /// Wait for the command to exit and its output to be relayed.
    pub async fn wait(self) -> Result<(), SelpgError> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(SelpgError::Task(format!(
                "print job for `{}` did not complete: {}",
                self.program, e
            ))),
        }
    }
}

/// Start `command` reading from `input`, relaying its output to our own
/// stdout and stderr.
///
/// Must be called from within a tokio runtime.
pub fn launch(command: PrintCommand, input: PipeReader) -> PrintJob {
    launch_with(command, input, tokio::io::stdout(), tokio::io::stderr())
}

/// Like [`launch`], with explicit targets for the command's stdout and stderr.
pub fn launch_with<O, E>(
    command: PrintCommand,
    input: PipeReader,
    stdout: O,
    stderr: E,
) -> PrintJob
where
    O: AsyncWrite + Unpin + Send + 'static,
    E: AsyncWrite + Unpin + Send + 'static,
{
    let program = command.program.clone();
    let handle = tokio::spawn(run_command(command, input, stdout, stderr));
    PrintJob { program, handle }
}

async fn run_command<O, E>(
    command: PrintCommand,
    input: PipeReader,
    stdout: O,
    stderr: E,
) -> Result<(), SelpgError>
where
    O: AsyncWrite + Unpin + Send + 'static,
    E: AsyncWrite + Unpin + Send + 'static,
{
    let PrintCommand { program, args } = command;

    let mut child = {
        let mut cmd = Command::new(&program);
        cmd.args(&args)
            .stdin(Stdio::from(input))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd.spawn().map_err(|source| SelpgError::Spawn {
            program: program.clone(),
            source,
        })?
    };
    debug!(%program, ?args, pid = ?child.id(), "print command started");

    let child_stdout = child.stdout.take();
    let child_stderr = child.stderr.take();

    let (out, err, status) = tokio::join!(
        relay(child_stdout, stdout),
        relay(child_stderr, stderr),
        child.wait()
    );

    let relay_error = |source| SelpgError::Relay {
        program: program.clone(),
        source,
    };
    out.map_err(relay_error)?;
    err.map_err(relay_error)?;

    let status = status.map_err(relay_error)?;
    debug!(%program, %status, "print command exited");
    if !status.success() {
        return Err(SelpgError::Exit { program, status });
    }

    Ok(())
}

/// Copy `from` into `to` until end of stream. Both ends are dropped when the
/// copy finishes, so a failed relay closes the command's side of the pipe
/// instead of leaving it blocked on a full buffer.
async fn relay<R, W>(from: Option<R>, mut to: W) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let Some(mut from) = from else {
        return Ok(());
    };
    tokio::io::copy(&mut from, &mut to).await?;
    to.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Write};
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::{duplex, AsyncReadExt, DuplexStream};

    /// Stand-in for a closed stdout: every write fails.
    struct ClosedOutput;

    impl AsyncWrite for ClosedOutput {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::ErrorKind::BrokenPipe.into()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    fn sh(script: &str) -> PrintCommand {
        PrintCommand::new("sh").arg("-c").arg(script)
    }

    async fn read_all(mut stream: DuplexStream) -> String {
        let mut buf = String::new();
        stream.read_to_string(&mut buf).await.unwrap();
        buf
    }

    /// Run `command` with `input` on its stdin; returns the job result and what
    /// it wrote to stdout and stderr.
    async fn run(
        command: PrintCommand,
        input: &[u8],
    ) -> (Result<(), SelpgError>, String, String) {
        let (reader, mut writer) = std::io::pipe().unwrap();
        let (out_tx, out_rx) = duplex(64 * 1024);
        let (err_tx, err_rx) = duplex(64 * 1024);

        let job = launch_with(command, reader, out_tx, err_tx);
        writer.write_all(input).unwrap();
        drop(writer);

        let result = job.wait().await;
        (result, read_all(out_rx).await, read_all(err_rx).await)
    }

    #[test]
    fn test_spooler_arguments() {
        let command = PrintCommand::spooler("lp", "office");
        assert_eq!(command.program(), "lp");
        assert_eq!(command.args(), ["-d", "office"]);
    }

    #[tokio::test]
    async fn test_relays_stdout_in_order() {
        let (result, out, err) = run(PrintCommand::new("cat"), b"page one\npage two\n").await;
        result.unwrap();
        assert_eq!(out, "page one\npage two\n");
        assert_eq!(err, "");
    }

    #[tokio::test]
    async fn test_relays_stderr() {
        let (result, out, err) = run(sh("cat 1>&2"), b"to stderr").await;
        result.unwrap();
        assert_eq!(out, "");
        assert_eq!(err, "to stderr");
    }

    #[tokio::test]
    async fn test_resolves_without_output() {
        let (result, out, err) = run(sh("cat > /dev/null"), b"").await;
        result.unwrap();
        assert!(out.is_empty());
        assert!(err.is_empty());
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_error() {
        let (result, _, err) = run(sh("cat > /dev/null; echo jammed >&2; exit 3"), b"x").await;
        match result.unwrap_err() {
            SelpgError::Exit { program, status } => {
                assert_eq!(program, "sh");
                assert_eq!(status.code(), Some(3));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        // Output produced before the failure is still relayed
        assert_eq!(err, "jammed\n");
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let (reader, writer) = std::io::pipe().unwrap();
        let job = launch_with(
            PrintCommand::new("selpg-no-such-spooler"),
            reader,
            tokio::io::sink(),
            tokio::io::sink(),
        );
        drop(writer);

        match job.wait().await.unwrap_err() {
            SelpgError::Spawn { program, .. } => assert_eq!(program, "selpg-no-such-spooler"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failed_relay_is_relay_error() {
        let (reader, mut writer) = std::io::pipe().unwrap();
        let job = launch_with(
            PrintCommand::new("cat"),
            reader,
            ClosedOutput,
            tokio::io::sink(),
        );
        writer.write_all(b"page one\n").unwrap();
        drop(writer);

        match job.wait().await.unwrap_err() {
            SelpgError::Relay { program, source } => {
                assert_eq!(program, "cat");
                assert_eq!(source.kind(), io::ErrorKind::BrokenPipe);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}

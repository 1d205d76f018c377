use crate::error::SelpgError;
use crate::stream::bridge::{self, PrintCommand, PrintJob};
use std::io::{self, PipeWriter, Stdout, Write};
use tracing::debug;

/// Where selected pages go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Stdout,
    Printer(PrintCommand),
}

/// The writer the scanner fills. Bytes pass through untouched.
#[derive(Debug)]
pub enum OutputSink {
    Direct(Stdout),
    /// Write end of the pipe feeding a [`PrintJob`]; dropping it signals end
    /// of input to the print command
    Pipe(PipeWriter),
}

impl Write for OutputSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputSink::Direct(out) => out.write(buf),
            OutputSink::Pipe(pipe) => pipe.write(buf),
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match self {
            OutputSink::Direct(out) => out.write_all(buf),
            OutputSink::Pipe(pipe) => pipe.write_all(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputSink::Direct(out) => out.flush(),
            OutputSink::Pipe(pipe) => pipe.flush(),
        }
    }
}

/// A sink plus the print job reading from it, if any.
#[derive(Debug)]
pub struct Route {
    pub sink: OutputSink,
    pub job: Option<PrintJob>,
}

/// Wire up `destination`. For a printer the command is started here, before
/// any page is scanned, so it can consume output as it is produced.
pub fn route(destination: Destination) -> Result<Route, SelpgError> {
    match destination {
        Destination::Stdout => Ok(Route {
            sink: OutputSink::Direct(io::stdout()),
            job: None,
        }),
        Destination::Printer(command) => {
            let (reader, writer) = io::pipe().map_err(SelpgError::Pipe)?;
            debug!(
                program = command.program(),
                args = ?command.args(),
                "routing pages to print command"
            );
            let job = bridge::launch(command, reader);
            Ok(Route {
                sink: OutputSink::Pipe(writer),
                job: Some(job),
            })
        }
    }
}

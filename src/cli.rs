use crate::error::SelpgError;
use crate::page_range::PageSelection;
use crate::stream::{Destination, InputSource, PrintCommand, DEFAULT_PRINT_PROGRAM};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "selpg")]
#[command(about = "Print a range of pages from a text file or standard input")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub select: SelectArgs,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as MCP server
    Mcp,
}

#[derive(Args)]
pub struct SelectArgs {
    /// First page to print (required, 1-based)
    #[arg(short, long, value_name = "PAGE")]
    pub start: Option<u32>,

    /// Last page to print (required, at least the start page)
    #[arg(short, long, value_name = "PAGE")]
    pub end: Option<u32>,

    /// Lines per page [default: 72]
    #[arg(short, long, value_name = "LINES")]
    pub limit: Option<u32>,

    /// Pages end at form feeds instead of after a fixed number of lines
    #[arg(short = 'f', long)]
    pub pbflag: bool,

    /// Send the pages to this printer instead of standard output
    #[arg(short, long)]
    pub destination: Option<String>,

    /// Spooler to run for --destination, invoked as `<program> -d <destination>`
    #[arg(long, value_name = "PROGRAM", default_value = DEFAULT_PRINT_PROGRAM)]
    pub print_command: String,

    /// Input file (standard input when omitted)
    pub path: Option<PathBuf>,
}

impl SelectArgs {
    /// Validate the flags into what the select command needs. Nothing is
    /// opened here.
    pub fn into_parts(self) -> Result<(InputSource, PageSelection, Destination), SelpgError> {
        let selection =
            PageSelection::from_options(self.start, self.end, self.limit, self.pbflag)?;

        let destination = match self.destination {
            Some(destination) => {
                Destination::Printer(PrintCommand::spooler(self.print_command, &destination))
            }
            None => Destination::Stdout,
        };

        Ok((InputSource::from_path(self.path), selection, destination))
    }
}

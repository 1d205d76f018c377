use crate::error::SelpgError;
use std::fmt;
use std::fs::File;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

/// Where pages are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Stdin,
    File(PathBuf),
}

impl InputSource {
    pub fn from_path(path: Option<PathBuf>) -> Self {
        match path {
            Some(path) => InputSource::File(path),
            None => InputSource::Stdin,
        }
    }

    /// Open the input for reading. Standard input is refused when it is a
    /// terminal, since pages are never typed interactively.
    pub fn open(&self) -> Result<Box<dyn Read + Send>, SelpgError> {
        match self {
            InputSource::Stdin => {
                let stdin = io::stdin();
                if stdin.is_terminal() {
                    return Err(SelpgError::TerminalInput);
                }
                Ok(Box::new(stdin))
            }
            InputSource::File(path) => {
                let open_error = |source| SelpgError::Open {
                    path: path.clone(),
                    source,
                };
                let file = File::open(path).map_err(open_error)?;
                let metadata = file.metadata().map_err(open_error)?;
                if metadata.is_dir() {
                    return Err(open_error(io::Error::other("is a directory")));
                }
                Ok(Box::new(file))
            }
        }
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputSource::Stdin => write!(f, "<stdin>"),
            InputSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

use std::fmt;

use crate::exit;

/// A CLI-level failure, each variant carrying the exit code it should
/// terminate the process with.
#[derive(Debug)]
pub enum CliError {
    Io {
        source: std::io::Error,
        path: String,
        exit_code: exit::Code,
    },
    /// Compilation produced one or more error diagnostics; they have
    /// already been printed via `DiagnosticEngine::report_all`.
    Diagnostics {
        exit_code: exit::Code,
    },
    Generic {
        message: String,
        exit_code: exit::Code,
    },
}

impl CliError {
    pub fn exit_code(&self) -> exit::Code {
        match self {
            CliError::Io { exit_code, .. } => *exit_code,
            CliError::Diagnostics { exit_code } => *exit_code,
            CliError::Generic { exit_code, .. } => *exit_code,
        }
    }

    pub fn from_io_error(source: std::io::Error, path: &str) -> Self {
        CliError::Io {
            source,
            path: path.to_string(),
            exit_code: exit::Code::Usage,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Io { source, path, .. } => write!(f, "I/O error on '{path}': {source}"),
            CliError::Diagnostics { .. } => write!(f, "compilation failed"),
            CliError::Generic { message, .. } => write!(f, "{message}"),
        }
    }
}

pub type CliResult<T> = Result<T, CliError>;

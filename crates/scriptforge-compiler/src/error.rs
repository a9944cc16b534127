/// Error types for the scriptforge compile driver

use std::path::PathBuf;
use thiserror::Error;

use crate::diagnostic::CompilationFailure;

pub type Result<T> = std::result::Result<T, CompileError>;

/// Errors returned by [`crate::Compiler::compile`].
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("No source files were given")]
    NoSources,

    #[error("Cannot read source file {path}: {source}")]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backend ran and reported errors, or produced nothing
    #[error("{0}")]
    Compilation(CompilationFailure),

    /// The backend itself failed
    #[error(transparent)]
    Backend(#[from] BackendFault),
}

impl CompileError {
    pub fn source_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CompileError::SourceRead {
            path: path.into(),
            source,
        }
    }

    pub fn output_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CompileError::OutputDir {
            path: path.into(),
            source,
        }
    }

    /// The structured failure, if this error carries compiler diagnostics
    pub fn as_compilation_failure(&self) -> Option<&CompilationFailure> {
        match self {
            CompileError::Compilation(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Infrastructure failures raised by a compiler backend.
///
/// These are never folded into a diagnostic report.
#[derive(Error, Debug)]
pub enum BackendFault {
    #[error("Failed to launch compiler '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Compiler exited with {status} without reporting diagnostics: {stderr}")]
    ProcessFailed { status: String, stderr: String },

    #[error("Invalid backend configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Backend I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that abort construction of a [`crate::ModuleIndex`].
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Module index root {0} does not exist or is not a directory")]
    RootNotFound(PathBuf),

    #[error("Cannot read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Why a single library file could not be loaded into the index.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid module metadata: {0}")]
    Metadata(#[from] serde_json::Error),
}

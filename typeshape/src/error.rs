//! Error types for the compiler and the registries.
//!
//! Only conditions that must stop a consuming server from starting are
//! errors here. Data-shape problems never surface as errors; they are
//! reported through [`ValidationResult`](crate::ValidationResult).

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for compiler operations.
pub type CompileResult<T> = Result<T, CompileError>;

/// Fatal compilation failure.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The declaration source could not be read.
    #[error("Declaration source {path} is missing or unreadable: {source}")]
    SourceMissing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A full scan found no exported declaration.
    #[error("No exported types found in {origin}; export at least one type declaration")]
    NoExportedTypes { origin: String },

    /// A recognized declaration has a malformed body.
    #[error("Syntax error in {origin}:{line}:{column}: {message}")]
    Syntax {
        origin: String,
        line: usize,
        column: usize,
        message: String,
    },
}

impl CompileError {
    /// Create a source missing error.
    pub fn source_missing(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::SourceMissing {
            path: path.into(),
            source,
        }
    }

    /// Create a no exported types error.
    pub fn no_exported_types(origin: impl Into<String>) -> Self {
        Self::NoExportedTypes {
            origin: origin.into(),
        }
    }

    /// Create a syntax error with location information.
    pub fn syntax(
        origin: impl Into<String>,
        line: usize,
        column: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::Syntax {
            origin: origin.into(),
            line,
            column,
            message: message.into(),
        }
    }
}

/// Misuse of the compiled registries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// No exported type is registered under this name.
    #[error("No validator registered for type '{name}'")]
    UnknownType { name: String },
}

//! Error types for the CLI.
//!
//! Compiler errors are wrapped as they are; everything the CLI does on its
//! own (configuration, output, watching, data files) has its own enum.

use std::path::PathBuf;
use thiserror::Error;
use typeshape::{CompileError, RegistryError};

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// Main error type for CLI operations.
#[derive(Debug, Error)]
pub enum CliError {
    /// The declarations could not be compiled.
    #[error("Failed to compile declarations: {0}")]
    Compile(#[from] CompileError),

    /// A type name was not found in the compiled registry.
    #[error("{0}")]
    Registry(#[from] RegistryError),

    /// Error loading or writing configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error writing output files.
    #[error("Failed to write output: {0}")]
    Write(#[from] WriteError),

    /// Error during file watching.
    #[error("Watch error: {0}")]
    Watch(#[from] WatchError),

    /// Error reading a JSON document.
    #[error("Failed to read data: {0}")]
    Data(#[from] DataError),

    /// A check failed (module out of date, invalid data or payload).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Generic IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Validation(_) => 2,
            _ => 1,
        }
    }
}

/// Error loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid TOML syntax or schema.
    #[error("Invalid TOML in {path}: {message}")]
    InvalidToml { path: PathBuf, message: String },

    /// Refused to overwrite an existing config file.
    #[error("{path} already exists (use --force to overwrite)")]
    AlreadyExists { path: PathBuf },

    /// IO error reading or writing config.
    #[error("Failed to access config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Error writing output files.
#[derive(Debug, Error)]
pub enum WriteError {
    /// Failed to create directory.
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write file.
    #[error("Failed to write file {path}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Error during file watching.
#[derive(Debug, Error)]
pub enum WatchError {
    /// Failed to initialize watcher.
    #[error("Failed to initialize file watcher: {0}")]
    Init(String),
}

/// Error reading a JSON document from disk.
#[derive(Debug, Error)]
pub enum DataError {
    /// The file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON.
    #[error("Invalid JSON in {path}: {message}")]
    InvalidJson { path: PathBuf, message: String },
}

impl ConfigError {
    /// Create an invalid TOML error.
    pub fn invalid_toml(path: PathBuf, message: impl Into<String>) -> Self {
        Self::InvalidToml {
            path,
            message: message.into(),
        }
    }
}

impl DataError {
    /// Create an invalid JSON error.
    pub fn invalid_json(path: PathBuf, message: impl Into<String>) -> Self {
        Self::InvalidJson {
            path,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::Validation("out of date".into()).exit_code(), 2);
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        assert_eq!(CliError::Io(io).exit_code(), 1);
        let compile = CompileError::no_exported_types("types.ts");
        assert_eq!(CliError::from(compile).exit_code(), 1);
        let exists = ConfigError::AlreadyExists {
            path: PathBuf::from("typeshape.toml"),
        };
        assert_eq!(CliError::from(exists).exit_code(), 1);
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::invalid_toml(PathBuf::from("typeshape.toml"), "expected `=`");
        assert_eq!(
            err.to_string(),
            "Invalid TOML in typeshape.toml: expected `=`"
        );
    }

    #[test]
    fn test_already_exists_display() {
        let err = CliError::from(ConfigError::AlreadyExists {
            path: PathBuf::from("typeshape.toml"),
        });
        assert_eq!(
            err.to_string(),
            "Configuration error: typeshape.toml already exists (use --force to overwrite)"
        );
    }
}

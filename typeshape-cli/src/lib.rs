//! # typeshape-cli
//!
//! CLI library for compiling TypeScript type declarations into Zod modules
//! and checking JSON data against them.
//!
//! This crate provides the core functionality for the `typeshape` CLI tool,
//! including configuration, module generation, file output and data checks.
//!
//! ## Architecture
//!
//! - [`config`] - Configuration management and TOML parsing
//! - [`generator`] - Zod module generation
//! - [`writer`] - File output and dry-run support
//! - [`watcher`] - File system watching for development mode
//! - [`checker`] - Validation of `<type>.json` data files
//! - [`error`] - Error types and handling

pub mod checker;
pub mod config;
pub mod error;
pub mod generator;
pub mod watcher;
pub mod writer;

pub use checker::{DataChecker, FileOutcome, FileReport};
pub use config::{Config, ConfigManager};
pub use error::{CliError, CliResult};
pub use generator::ModuleGenerator;
pub use watcher::FileWatcher;
pub use writer::FileWriter;

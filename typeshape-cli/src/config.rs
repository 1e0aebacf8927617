//! Configuration management for the CLI.
//!
//! Configuration is read from `typeshape.toml`. Every section is optional;
//! command-line flags override file values.

use crate::error::{CliResult, ConfigError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use typeshape::CompilerOptions;

/// Default configuration filename.
pub const CONFIG_FILENAME: &str = "typeshape.toml";

/// Main configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Declaration source.
    pub source: SourceConfig,

    /// Generated module location.
    pub output: OutputConfig,

    /// Business rules applied by the compiler.
    pub compiler: CompilerOptions,

    /// JSON data files checked by `check`.
    pub data: DataConfig,
}

/// Declaration source configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// File holding the type declarations.
    pub file: PathBuf,
}

/// Output configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output directory for the generated module.
    pub dir: PathBuf,

    /// Output filename.
    pub file: String,
}

/// Data directory configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Directory holding one `<type>.json` array per exported type.
    pub dir: PathBuf,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("types.ts"),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            file: "schema.js".to_string(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("database"),
        }
    }
}

impl Config {
    /// Full path of the generated module.
    pub fn output_path(&self) -> PathBuf {
        self.output.dir.join(&self.output.file)
    }
}

/// Configuration manager for loading and merging configs.
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration from a file path.
    ///
    /// If the path is None, attempts to load from the default location.
    /// If no config file exists, returns default configuration.
    pub fn load(path: Option<&Path>) -> CliResult<Config> {
        let config_path = path
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILENAME));

        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "No configuration file; using defaults");
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&config_path).map_err(|e| ConfigError::Io {
            path: config_path.clone(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::invalid_toml(config_path, e.to_string()))?;

        Ok(config)
    }

    /// Merge CLI arguments into configuration.
    ///
    /// CLI arguments take precedence over config file values.
    pub fn merge_cli_args(mut config: Config, args: &CliArgs) -> Config {
        if let Some(ref input) = args.input {
            config.source.file = input.clone();
        }

        if let Some(ref output) = args.output {
            config.output.dir = output.clone();
        }

        if let Some(ref file) = args.output_file {
            config.output.file = file.clone();
        }

        if let Some(ref data_dir) = args.data_dir {
            config.data.dir = data_dir.clone();
        }

        config
    }

    /// Write the commented default configuration to `path`.
    ///
    /// An existing file is only replaced when `force` is set.
    pub fn write_default(path: &Path, force: bool) -> CliResult<()> {
        if path.exists() && !force {
            return Err(ConfigError::AlreadyExists {
                path: path.to_path_buf(),
            }
            .into());
        }
        std::fs::write(path, Self::default_config_content()).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        tracing::debug!(path = %path.display(), force, "Wrote default configuration");
        Ok(())
    }

    /// Generate default configuration file content with comments.
    pub fn default_config_content() -> &'static str {
        r#"# typeshape configuration file

[source]
# File containing the `type` / `export type` declarations
file = "types.ts"

[output]
# Directory for the generated Zod module
dir = "."

# Generated module file name
file = "schema.js"

[data]
# Directory with one <type>.json array per exported type (used by `typeshape check`)
dir = "database"

[compiler.server_fields]
# Fields set by the server; never validated as caller input
id = "id"
created_at = "createdAt"
updated_at = "updatedAt"

# Fields every exported type must carry as a non-empty string
[[compiler.mandatory_fields]]
name = "title"
message = "Title is required"

[[compiler.mandatory_fields]]
name = "category"
message = "Category is required"
"#
    }
}

/// CLI arguments that can override configuration.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// Declaration file override.
    pub input: Option<PathBuf>,

    /// Output directory override.
    pub output: Option<PathBuf>,

    /// Output filename override.
    pub output_file: Option<String>,

    /// Data directory override.
    pub data_dir: Option<PathBuf>,
}

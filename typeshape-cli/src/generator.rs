//! Module generator.
//!
//! Compiles the configured declaration file and renders it as a Zod module.

use crate::config::Config;
use crate::error::CliResult;
use std::path::Path;
use typeshape::{compile_file_with, CompiledArtifacts, ZodEmitter};

/// Generated output.
#[derive(Debug, Clone)]
pub struct GeneratedOutput {
    /// Complete module content.
    pub content: String,

    /// The compiled artifacts the module was rendered from.
    pub artifacts: CompiledArtifacts,
}

impl GeneratedOutput {
    /// Number of exported types in the module.
    pub fn exported_count(&self) -> usize {
        self.artifacts.validators.len()
    }

    /// Number of declarations, exported or not.
    pub fn declaration_count(&self) -> usize {
        self.artifacts.schemas.len()
    }
}

/// Zod module generator.
pub struct ModuleGenerator {
    config: Config,
}

impl ModuleGenerator {
    /// Create a new generator with the given configuration.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Compile the configured source file.
    pub fn compile(&self) -> CliResult<CompiledArtifacts> {
        Ok(compile_file_with(
            &self.config.source.file,
            &self.config.compiler,
        )?)
    }

    /// Compile the configured source file and render the module.
    pub fn generate(&self) -> CliResult<GeneratedOutput> {
        let artifacts = self.compile()?;
        let emitter = ZodEmitter::new(source_label(&self.config.source.file));
        let content = emitter.emit_module(&artifacts);
        Ok(GeneratedOutput { content, artifacts })
    }
}

/// File name used in the module header, so the output does not depend on
/// where the command was run from.
fn source_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

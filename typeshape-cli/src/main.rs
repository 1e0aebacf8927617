//! # typeshape
//!
//! CLI tool for compiling TypeScript type declarations into Zod validators.
//!
//! ## Usage
//!
//! ```bash
//! # Generate schema.js from types.ts
//! typeshape generate
//!
//! # Generate into a specific output directory
//! typeshape generate --input model/types.ts --output ./generated
//!
//! # Watch mode for development
//! typeshape generate --watch
//!
//! # Initialize configuration
//! typeshape init
//!
//! # Fail when the generated module is out of date
//! typeshape validate --path ./schema.js
//!
//! # Check every database/<type>.json file
//! typeshape check --data-dir ./database
//!
//! # Validate one payload, or an update against an existing document
//! typeshape payload --type product --file new.json
//! typeshape payload --type product --file patch.json --update current.json
//! ```

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use typeshape::{RegistryError, UpdateGuard, UpdateRejection, ValidationResult};
use typeshape_cli::{
    checker::{group_by_field, read_json, DataChecker, FileOutcome},
    config::{CliArgs, Config, ConfigManager},
    error::CliError,
    generator::ModuleGenerator,
    watcher::FileWatcher,
    writer::{FileWriter, WriteResult},
};

#[derive(Parser)]
#[command(name = "typeshape")]
#[command(author, version, about = "Compile TypeScript type declarations into Zod validators", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile the declaration file and write the Zod module
    Generate {
        /// Declaration file
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output directory for the generated module
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Watch the declaration file and regenerate on change
        #[arg(short, long)]
        watch: bool,

        /// Preview changes without writing files
        #[arg(long)]
        dry_run: bool,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Initialize a new typeshape configuration file
    Init {
        /// Output path for configuration file
        #[arg(short, long, default_value = "typeshape.toml")]
        output: PathBuf,

        /// Overwrite existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Validate that the generated module is up-to-date
    Validate {
        /// Path to the generated module
        #[arg(short, long)]
        path: PathBuf,

        /// Declaration file
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Check every <type>.json data file against its validator
    Check {
        /// Declaration file
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Directory holding the data files
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Validate a single JSON payload
    Payload {
        /// Exported type name (case-insensitive)
        #[arg(short = 't', long = "type")]
        type_name: String,

        /// JSON payload, or the patch when --update is given
        #[arg(short, long)]
        file: PathBuf,

        /// Existing document to apply the patch to
        #[arg(short, long)]
        update: Option<PathBuf>,

        /// Declaration file
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            print_error(&e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Generate {
            input,
            output,
            watch,
            dry_run,
            config,
        } => cmd_generate(input, output, watch, dry_run, config),

        Commands::Init { output, force } => cmd_init(output, force),

        Commands::Validate {
            path,
            input,
            config,
        } => cmd_validate(path, input, config),

        Commands::Check {
            input,
            data_dir,
            config,
        } => cmd_check(input, data_dir, config),

        Commands::Payload {
            type_name,
            file,
            update,
            input,
            config,
        } => cmd_payload(&type_name, &file, update.as_deref(), input, config),
    }
}

/// Load the configuration file and apply flag overrides.
fn load_config(config_path: Option<PathBuf>, args: CliArgs) -> Result<Config, CliError> {
    let config = ConfigManager::load(config_path.as_deref())?;
    Ok(ConfigManager::merge_cli_args(config, &args))
}

/// Generate command implementation.
fn cmd_generate(
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    watch: bool,
    dry_run: bool,
    config_path: Option<PathBuf>,
) -> Result<(), CliError> {
    let config = load_config(
        config_path,
        CliArgs {
            input,
            output,
            ..Default::default()
        },
    )?;

    if watch {
        run_watch_mode(&config, dry_run)
    } else {
        run_generate(&config, dry_run)
    }
}

/// Run module generation once.
fn run_generate(config: &Config, dry_run: bool) -> Result<(), CliError> {
    println!(
        "{} {}",
        "Compiling".cyan(),
        config.source.file.display()
    );

    let output = ModuleGenerator::new(config.clone()).generate()?;

    println!(
        "  Found {} declaration(s), {} exported",
        output.declaration_count().to_string().green(),
        output.exported_count().to_string().green()
    );

    let writer = FileWriter::new(dry_run);
    match writer.write(&config.output_path(), &output.content)? {
        WriteResult::Written { path, bytes } => {
            println!(
                "{} Written {} bytes to {}",
                "✓".green(),
                bytes,
                path.display()
            );
        }
        WriteResult::Unchanged { path } => {
            println!("{} {} is up-to-date", "✓".green(), path.display());
        }
        WriteResult::DryRun { content, path } => {
            println!(
                "{} Would write to {}:",
                "[dry-run]".yellow(),
                path.display()
            );
            println!("{}", "─".repeat(60).dimmed());
            println!("{}", content);
            println!("{}", "─".repeat(60).dimmed());
        }
    }

    Ok(())
}

/// Run in watch mode.
fn run_watch_mode(config: &Config, dry_run: bool) -> Result<(), CliError> {
    println!("{}", "Starting watch mode...".cyan());
    println!("  Watching: {}", config.source.file.display());
    println!("  Press Ctrl+C to stop\n");

    if let Err(e) = run_generate(config, dry_run) {
        println!("{} {}", "Generation error:".red(), e);
    }

    let watcher = FileWatcher::new(&config.source.file);
    let (_debouncer, rx) = watcher.watch()?;

    println!("\n{}", "Watching for changes...".cyan());

    while let Ok(event) = rx.recv() {
        if event.is_error() {
            println!(
                "{} {}",
                "Watch error:".red(),
                event.error_message().unwrap_or("Unknown error")
            );
            continue;
        }

        if let Some(path) = event.path() {
            println!("\n{} {}", "File changed:".cyan(), path.display());
        }

        if let Err(e) = run_generate(config, dry_run) {
            println!("{} {}", "Generation error:".red(), e);
        }

        println!("\n{}", "Watching for changes...".cyan());
    }

    Ok(())
}

/// Init command implementation.
fn cmd_init(output: PathBuf, force: bool) -> Result<(), CliError> {
    ConfigManager::write_default(&output, force)?;

    println!(
        "{} Created configuration file: {}",
        "✓".green(),
        output.display()
    );

    Ok(())
}

/// Validate command implementation.
fn cmd_validate(
    module_path: PathBuf,
    input: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<(), CliError> {
    println!("{}", "Validating generated module...".cyan());

    if !module_path.exists() {
        return Err(CliError::Validation(format!(
            "Module file not found: {}",
            module_path.display()
        )));
    }

    let existing_content = std::fs::read_to_string(&module_path)?;
    let config = load_config(
        config_path,
        CliArgs {
            input,
            ..Default::default()
        },
    )?;
    let output = ModuleGenerator::new(config).generate()?;

    if existing_content.trim() == output.content.trim() {
        println!("{} Module is up-to-date", "✓".green());
        Ok(())
    } else {
        println!("{} Module is out of date", "✗".red());
        println!("  Run 'typeshape generate' to update");
        Err(CliError::Validation("Module is out of date".to_string()))
    }
}

/// Check command implementation.
fn cmd_check(
    input: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<(), CliError> {
    let config = load_config(
        config_path,
        CliArgs {
            input,
            data_dir,
            ..Default::default()
        },
    )?;

    println!(
        "{} {}",
        "Checking data in".cyan(),
        config.data.dir.display()
    );

    let artifacts = ModuleGenerator::new(config.clone()).compile()?;
    let reports = DataChecker::new(&artifacts, &config.data.dir).check_all()?;

    let mut failed = 0;
    for report in &reports {
        let file = report.path.display();
        match &report.outcome {
            FileOutcome::Missing => {
                println!("  {} {} (no data file)", "-".dimmed(), file);
            }
            FileOutcome::Valid { count } => {
                println!("  {} {}: {} item(s)", "✓".green(), file, count);
            }
            FileOutcome::NotAnArray => {
                failed += 1;
                println!(
                    "  {} {}: the data file must contain an array",
                    "✗".red(),
                    file
                );
            }
            FileOutcome::Invalid { count, items } => {
                failed += 1;
                println!(
                    "  {} {}: {} of {} item(s) invalid",
                    "✗".red(),
                    file,
                    items.len(),
                    count
                );
                for item in items {
                    println!("    {}", item.label());
                    for (field, messages) in group_by_field(&item.errors) {
                        println!("      {}: {}", field.yellow(), messages.join(", "));
                    }
                }
            }
        }
    }

    if failed == 0 {
        println!("{} All data files are valid", "✓".green());
        Ok(())
    } else {
        Err(CliError::Validation(format!(
            "{} data file(s) failed validation",
            failed
        )))
    }
}

/// Payload command implementation.
fn cmd_payload(
    type_name: &str,
    file: &Path,
    update: Option<&Path>,
    input: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<(), CliError> {
    let config = load_config(
        config_path,
        CliArgs {
            input,
            ..Default::default()
        },
    )?;
    let artifacts = ModuleGenerator::new(config.clone()).compile()?;
    let key = type_name.to_lowercase();
    let payload = read_json(file)?;

    let result = match update {
        None => artifacts.validate(&key, &payload)?,
        Some(existing_path) => {
            let existing = read_json(existing_path)?;
            let guard =
                UpdateGuard::with_server_fields(&artifacts, config.compiler.server_fields.clone());
            match guard.check(&key, &existing, &payload) {
                Ok(merged) => ValidationResult::Valid { data: merged },
                Err(UpdateRejection::UnknownType { name }) => {
                    return Err(RegistryError::UnknownType { name }.into());
                }
                Err(rejection @ UpdateRejection::ReadonlyViolation { .. }) => {
                    return Err(CliError::Validation(rejection.to_string()));
                }
                Err(UpdateRejection::Invalid { errors }) => ValidationResult::Invalid { errors },
            }
        }
    };

    let rendered = serde_json::to_string_pretty(&result)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    println!("{}", rendered);

    if result.is_valid() {
        Ok(())
    } else {
        Err(CliError::Validation(format!(
            "{} error(s) in {}",
            result.errors().len(),
            file.display()
        )))
    }
}

/// Print an error with formatting.
fn print_error(error: &CliError) {
    eprintln!("{} {}", "Error:".red().bold(), error);
}

// sortkeep CLI - validate, deduplicate and archive flat record exports

mod commands;
mod exit_codes;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::LevelFilter;
use sortkeep_organize::{OrganizeError, OrganizerConfig};

use exit_codes::{EXIT_ARCHIVE_WRITE, EXIT_CONFIG_INVALID, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "sortkeep")]
#[command(about = "Validate, deduplicate and archive flat record exports")]
#[command(version)]
struct Cli {
    /// Organizer config (TOML). Defaults to the per-user config, then built-in defaults
    #[arg(long, global = true, env = "SORTKEEP_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory holding the dataset files (overrides the config)
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Directory archive files are written to (overrides the config)
    #[arg(long, global = true, value_name = "DIR")]
    archive_dir: Option<PathBuf>,

    /// More log output (-v info, -vv debug). RUST_LOG takes precedence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check every dataset against its schema
    #[command(after_help = "\
Examples:
  sortkeep validate
  sortkeep validate --json
  sortkeep --data-dir ./exports validate")]
    Validate {
        /// Output JSON to stdout instead of a human summary
        #[arg(long)]
        json: bool,
    },

    /// Count records and duplicates per dataset
    #[command(after_help = "\
Examples:
  sortkeep analyze
  sortkeep analyze --json")]
    Analyze {
        /// Output JSON to stdout instead of a human summary
        #[arg(long)]
        json: bool,
    },

    /// Plan archival of duplicate records (dry run unless --live)
    #[command(after_help = "\
Examples:
  sortkeep archive
  sortkeep archive --live
  sortkeep archive --live --archive-dir ./archives --json")]
    Archive {
        /// Write archive files. Source files are never modified
        #[arg(long)]
        live: bool,

        /// Output JSON to stdout instead of a human summary
        #[arg(long)]
        json: bool,
    },

    /// Show the category and hub/spoke grouping of the configured datasets
    Structure {
        /// Output JSON to stdout instead of a human summary
        #[arg(long)]
        json: bool,
    },

    /// Build the full reorganization report (JSON)
    #[command(after_help = "\
Examples:
  sortkeep report > report.json
  sortkeep report --output report.json
  sortkeep report --live --output report.json")]
    Report {
        /// Archive duplicates while building the report
        #[arg(long)]
        live: bool,

        /// Write the report to a file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// List archive files already written
    Archives {
        /// Output JSON to stdout instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Inspect or check configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,

    /// Validate a config file (or the effective configuration) without running
    #[command(after_help = "\
Examples:
  sortkeep config check
  sortkeep config check organizer.toml")]
    Check {
        /// Config file to check
        file: Option<PathBuf>,
    },
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<OrganizeError> for CliError {
    fn from(err: OrganizeError) -> Self {
        match &err {
            OrganizeError::ConfigParse(_)
            | OrganizeError::ConfigValidation(_)
            | OrganizeError::ConfigRead { .. } => CliError::new(EXIT_CONFIG_INVALID, err.to_string())
                .with_hint("run `sortkeep config check <FILE>` to see what is wrong"),
            OrganizeError::Archive(_) => CliError::new(EXIT_ARCHIVE_WRITE, err.to_string())
                .with_hint("check that the archive directory is writable, or pass --archive-dir"),
        }
    }
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level).format_timestamp(None).parse_default_env();
    let _ = builder.try_init();
}

/// `--config`/`$SORTKEEP_CONFIG`, then the per-user file if present, then built-in defaults.
fn base_config(explicit: Option<&Path>) -> Result<OrganizerConfig, CliError> {
    if let Some(path) = explicit {
        log::info!("using config {}", path.display());
        return Ok(OrganizerConfig::load(path)?);
    }
    match OrganizerConfig::user_config_path().filter(|p| p.is_file()) {
        Some(path) => {
            log::info!("using config {}", path.display());
            Ok(OrganizerConfig::load(&path)?)
        }
        None => {
            log::info!("using built-in config");
            Ok(OrganizerConfig::embedded()?)
        }
    }
}

fn resolve_config(cli: &Cli) -> Result<OrganizerConfig, CliError> {
    let mut config = base_config(cli.config.as_deref())?;

    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(dir) = &cli.archive_dir {
        // Relative to the working directory, not the data directory.
        config.archive.dir = if dir.is_absolute() {
            dir.clone()
        } else {
            std::env::current_dir()
                .map_err(|e| CliError::general(format!("cannot read working directory: {e}")))?
                .join(dir)
        };
    }
    log::debug!(
        "data dir {}, archive dir {}",
        config.data_dir.display(),
        config.archive_dir().display()
    );
    Ok(config)
}

fn run(cli: Cli) -> Result<(), CliError> {
    match &cli.command {
        Commands::Config {
            command: ConfigCommands::Check { file: Some(file) },
        } => commands::cmd_config_check(&OrganizerConfig::load(file)?, Some(file.as_path())),
        Commands::Config { command } => {
            let config = resolve_config(&cli)?;
            match command {
                ConfigCommands::Show => commands::cmd_config_show(&config),
                ConfigCommands::Check { .. } => commands::cmd_config_check(&config, None),
            }
        }
        Commands::Validate { json } => commands::cmd_validate(&resolve_config(&cli)?, *json),
        Commands::Analyze { json } => commands::cmd_analyze(&resolve_config(&cli)?, *json),
        Commands::Archive { live, json } => {
            commands::cmd_archive(&resolve_config(&cli)?, *live, *json)
        }
        Commands::Structure { json } => commands::cmd_structure(&resolve_config(&cli)?, *json),
        Commands::Report { live, output } => {
            commands::cmd_report(&resolve_config(&cli)?, *live, output.as_deref())
        }
        Commands::Archives { json } => commands::cmd_archives(&resolve_config(&cli)?, *json),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

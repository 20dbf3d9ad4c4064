// rostersync CLI - roster reconciliation and submission intake

mod console;
mod exit_codes;
mod reconcile;
mod roster_cmd;
mod store;
mod student;
mod util;
mod workflow;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::debug;
use rostersync_config::{ConfigError, Settings};
use rostersync_recon::{ReconError, Scope};

use exit_codes::{
    config_exit_code, recon_exit_code, store_exit_code, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE,
};
use store::{Store, StoreError};

#[derive(Parser)]
#[command(name = "rostersync")]
#[command(about = "Link student rosters across systems and sort out group submissions")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Settings file (default: the platform config directory)
    #[arg(long, global = true, value_name = "FILE", env = "ROSTERSYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Storage root, overrides `[storage] root`
    #[arg(long, global = true, value_name = "DIR", env = "ROSTERSYNC_ROOT")]
    root: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug). RUST_LOG overrides.
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the stored system-A roster
    Roster {
        #[command(subcommand)]
        command: RosterCommands,
    },

    /// Link stored identities to a system-B export (exit 3 = leftovers remain)
    #[command(after_help = "\
Candidates already linked in an earlier run are skipped, so running again
after a fresh export only looks at what is left.

Examples:
  rostersync reconcile lms-export.csv
  rostersync reconcile lms-export.csv --dry-run
  rostersync reconcile lms-export.csv --json --output recon.json")]
    Reconcile {
        /// System-B export (CSV with id, name and email columns)
        candidates: PathBuf,

        /// Print the run as JSON on stdout instead of the human report
        #[arg(long)]
        json: bool,

        /// Also write the JSON report to this file
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Do not save links back into the roster
        #[arg(long)]
        dry_run: bool,
    },

    /// Parse one submission file name into a group (exit 4 = problems recorded)
    #[command(after_help = "\
Examples:
  rostersync parse Anna-Mueller_Boris-Schmidt_ex03.zip --exercise 3
  rostersync parse 'mueller schmidt.zip' --exercise 3 --json")]
    Parse {
        /// File name as uploaded
        file_name: String,

        /// Exercise number the file belongs to
        #[arg(long, short = 'e')]
        exercise: u32,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Batch steps over a directory of submissions
    Workflow {
        #[command(subcommand)]
        command: WorkflowCommands,
    },

    /// Show the info card of one student
    #[command(after_help = "\
Examples:
  rostersync student mueller
  rostersync student 'anna m' --scope all")]
    Student {
        /// Name or part of a name
        query: String,

        /// Which students to search
        #[arg(long, short = 's', default_value = "mine")]
        scope: Scope,
    },

    /// Take over a student of another tutorial
    Import {
        /// Name or part of a name
        query: String,
    },

    /// Hand one of your students over to another tutor
    Export {
        /// Name or part of a name
        query: String,
    },

    /// Settings file helpers
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum RosterCommands {
    /// Store the students of one tutorial
    #[command(after_help = "\
The file is a JSON array of objects with `id`, `name` and optional `email`
and `subject` fields. Adding a tutorial again replaces its students but keeps
links that were already made.

Examples:
  rostersync roster add t1 tutorial-1.json --mine
  rostersync roster add t2 tutorial-2.json")]
    Add {
        /// Tutorial id
        tutorial_id: String,

        /// JSON file with the tutorial's students
        file: PathBuf,

        /// This is one of your own tutorials
        #[arg(long)]
        mine: bool,
    },

    /// Overview of stored tutorials
    Show,
}

#[derive(Subcommand)]
enum WorkflowCommands {
    /// Check every archive in a directory and write one meta.json per submission
    #[command(after_help = "\
Each file gets a directory named after its canonical group label (or its own
name when no group could be formed). A failing file is reported and the batch
carries on. Exit 4 when any submission carries a problem.

Examples:
  rostersync workflow prepare ~/Downloads/ex03 --exercise 3
  rostersync workflow prepare ./uploads -e 3 --out ./graded/ex03")]
    Prepare {
        /// Directory with the uploaded archives
        dir: PathBuf,

        /// Exercise number
        #[arg(long, short = 'e')]
        exercise: u32,

        /// Output directory (default: <root>/exercises/exNN)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Write a commented settings file if none exists
    Init,
    /// Print the effective settings as TOML
    Show,
    /// Print where the settings file is looked up
    Path,
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            "\nengine:  rostersync-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            "\nengine:  rostersync-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
        )
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "error",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Config { command } => cmd_config(command, cli.config.as_deref(), cli.root),
        command => Context::load(cli.config.as_deref(), cli.root).and_then(|ctx| run(command, ctx)),
    };

    match result {
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

fn run(command: Commands, ctx: Context) -> Result<(), CliError> {
    match command {
        Commands::Roster { command } => match command {
            RosterCommands::Add { tutorial_id, file, mine } => {
                roster_cmd::cmd_roster_add(&ctx, &tutorial_id, &file, mine)
            }
            RosterCommands::Show => roster_cmd::cmd_roster_show(&ctx),
        },
        Commands::Reconcile { candidates, json, output, dry_run } => {
            reconcile::cmd_reconcile(&ctx, &candidates, json, output, dry_run)
        }
        Commands::Parse { file_name, exercise, json } => {
            workflow::cmd_parse(&ctx, &file_name, exercise, json)
        }
        Commands::Workflow { command } => match command {
            WorkflowCommands::Prepare { dir, exercise, out } => {
                workflow::cmd_prepare(&ctx, &dir, exercise, out)
            }
        },
        Commands::Student { query, scope } => student::cmd_student(&ctx, &query, scope),
        Commands::Import { query } => student::cmd_import(&ctx, &query),
        Commands::Export { query } => student::cmd_export(&ctx, &query),
        Commands::Config { .. } => Err(CliError::args("config is handled before loading settings")),
    }
}

// ============================================================================
// context
// ============================================================================

/// Everything a command needs: effective settings plus the store they point at.
pub struct Context {
    pub settings: Settings,
    pub store: Store,
}

impl Context {
    fn load(config: Option<&Path>, root: Option<PathBuf>) -> Result<Self, CliError> {
        let settings = Settings::load(config).map_err(CliError::config)?;
        let store = Store::new(root.unwrap_or_else(|| settings.storage_root()));
        debug!("storage root {}", store.root().display());
        Ok(Self { settings, store })
    }
}

// ============================================================================
// config
// ============================================================================

fn cmd_config(command: ConfigCommands, config: Option<&Path>, root: Option<PathBuf>) -> Result<(), CliError> {
    let path = config.map(Path::to_path_buf).unwrap_or_else(Settings::config_path);
    match command {
        ConfigCommands::Path => {
            println!("{}", path.display());
            Ok(())
        }
        ConfigCommands::Init => {
            if Settings::create_default_file(&path).map_err(CliError::config)? {
                eprintln!("wrote {}", path.display());
            } else {
                eprintln!("{} already exists, left unchanged", path.display());
            }
            Ok(())
        }
        ConfigCommands::Show => {
            let mut settings = Settings::load(config).map_err(CliError::config)?;
            if root.is_some() {
                settings.storage.root = root;
            }
            let text = toml::to_string_pretty(&settings)
                .map_err(|e| CliError::new(EXIT_ERROR, format!("cannot render settings: {e}")))?;
            print!("{text}");
            Ok(())
        }
    }
}

// ============================================================================
// errors
// ============================================================================

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

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn config(err: ConfigError) -> Self {
        let code = config_exit_code(&err);
        let hint = match &err {
            ConfigError::NotFound(_) => Some("run `rostersync config init` to create one".to_string()),
            ConfigError::Invalid { .. } => Some("check the [submissions] and [candidates.columns] sections".to_string()),
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }

    pub fn recon(err: ReconError) -> Self {
        let code = recon_exit_code(&err);
        let hint = match &err {
            ReconError::MissingColumn { .. } => {
                Some("map the export's headers under [candidates.columns] in the settings".to_string())
            }
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }

    pub fn store(err: StoreError) -> Self {
        let code = store_exit_code(&err);
        let hint = match &err {
            StoreError::Corrupt { .. } => Some("restore the file from a backup or remove it to start over".to_string()),
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

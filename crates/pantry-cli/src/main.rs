mod commands;
mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pantry_core::ListKind;
use pantry_db::{init_database, RedbDraftStore};

use commands::CliError;
use config::Config;

#[derive(Parser)]
#[command(name = "pantry", about = "Inspect and repair locally stored meal plans and grocery lists")]
struct Cli {
    /// Database file (overrides PANTRY_DB_PATH env var)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the canonical form of a persisted list file (no database required)
    Normalize {
        /// JSON file in any supported list shape
        file: PathBuf,
    },
    /// Named draft management
    Drafts {
        #[command(subcommand)]
        command: DraftCommands,
    },
    /// Print the auto-saved working list, falling back to its backup
    Current {
        #[arg(long)]
        kind: Option<ListKind>,
    },
    /// Remove the auto-saved working list and its backup. Drafts are kept.
    Clear {
        #[arg(long)]
        kind: Option<ListKind>,
    },
}

#[derive(Subcommand)]
enum DraftCommands {
    /// List drafts, newest first
    List {
        #[arg(long)]
        kind: Option<ListKind>,
    },
    /// Normalize a list file and store it as a draft
    Save {
        file: PathBuf,
        #[arg(long)]
        kind: Option<ListKind>,
        /// Draft name (defaults to "<label> - <date time>")
        #[arg(long)]
        name: Option<String>,
    },
    /// Print a draft's payload
    Show {
        id: String,
    },
}

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    // Load configuration
    let mut config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            eprintln!("Optional: PANTRY_DB_PATH, PANTRY_DEFAULT_KIND");
            std::process::exit(1);
        }
    };
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    if let Err(e) = run(cli.command, &config) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands, config: &Config) -> Result<(), CliError> {
    let mut out = std::io::stdout().lock();
    let kind_or_default = |kind: Option<ListKind>| kind.unwrap_or(config.default_kind);

    match command {
        Commands::Normalize { file } => commands::normalize_file(&file, &mut out),
        Commands::Drafts { command } => {
            let store = open_store(config)?;
            match command {
                DraftCommands::List { kind } => {
                    commands::list_drafts(&store, kind_or_default(kind), &mut out)
                }
                DraftCommands::Save { file, kind, name } => commands::save_draft(
                    &store,
                    kind_or_default(kind),
                    &file,
                    name.as_deref(),
                    &mut out,
                ),
                DraftCommands::Show { id } => commands::show_draft(&store, &id, &mut out),
            }
        }
        Commands::Current { kind } => {
            commands::show_current(&open_store(config)?, kind_or_default(kind), &mut out)
        }
        Commands::Clear { kind } => {
            commands::clear(&open_store(config)?, kind_or_default(kind), &mut out)
        }
    }
}

fn open_store(config: &Config) -> Result<RedbDraftStore, CliError> {
    tracing::debug!("Database path: {}", config.db_path.display());
    Ok(RedbDraftStore::new(init_database(&config.db_path)?))
}

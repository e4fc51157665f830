//! # Halal Scan CLI (`halal-scan`)
//!
//! Runs the scan server and the curation workflow around it.
//!
//! ## Usage
//!
//! ```bash
//! halal-scan --config ./config/halal-scan.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `halal-scan init` | Create the SQLite database and run schema migrations |
//! | `halal-scan serve` | Start the HTTP scan server |
//! | `halal-scan classify <text-file>` | Classify label text without OCR |
//! | `halal-scan scan <image-file>` | OCR and classify a local photo |
//! | `halal-scan reference import <json-file>` | Load curated reference ingredients |
//! | `halal-scan reference list` | Show curated reference ingredients |
//! | `halal-scan candidates list` | Show names the learner has collected |
//!
//! Logging goes to stderr and honours `RUST_LOG`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use halal_scan::{config, curate, migrate, scan, server};

const DEFAULT_LOG_FILTER: &str = "halal_scan=info,halal_scan_core=info,tower_http=info";

#[derive(Parser)]
#[command(
    name = "halal-scan",
    about = "Halal Scan: ingredient-level halal classification for food label photos",
    version
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "./config/halal-scan.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    Init,

    /// Start the HTTP scan server.
    Serve,

    /// Classify label text from a file and print the verdict as JSON.
    Classify {
        /// Plain-text file holding the label text.
        file: PathBuf,

        /// Record unclassified names as candidates.
        #[arg(long)]
        learn: bool,
    },

    /// Run OCR on an image file and print the verdict as JSON.
    Scan {
        /// Photo of the ingredient label.
        image: PathBuf,
    },

    /// Manage curated reference ingredients.
    Reference {
        #[command(subcommand)]
        action: ReferenceAction,
    },

    /// Review names collected by the learner.
    Candidates {
        #[command(subcommand)]
        action: CandidatesAction,
    },
}

#[derive(Subcommand)]
enum ReferenceAction {
    /// Import entries from a JSON array file.
    Import { file: PathBuf },
    /// List all reference ingredients in lookup order.
    List,
}

#[derive(Subcommand)]
enum CandidatesAction {
    /// List candidate ingredients awaiting review.
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Classify { file, learn } => {
            scan::run_classify_file(&cfg, &file, learn).await?;
        }
        Commands::Scan { image } => {
            scan::run_scan_image(&cfg, &image).await?;
        }
        Commands::Reference { action } => match action {
            ReferenceAction::Import { file } => {
                curate::run_reference_import(&cfg, &file).await?;
            }
            ReferenceAction::List => {
                curate::run_reference_list(&cfg).await?;
            }
        },
        Commands::Candidates {
            action: CandidatesAction::List,
        } => {
            curate::run_candidates_list(&cfg).await?;
        }
    }

    Ok(())
}

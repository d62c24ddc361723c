//! Sheetwise CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod manifest;

#[derive(Parser)]
#[command(name = "sheetwise")]
#[command(about = "Decide which scenes and event sheets an edit forces to recompile", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Policy config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the sheets a scene reaches and who owns each of them
    Analyze {
        /// Project manifest (TOML)
        #[arg(short, long)]
        project: PathBuf,

        /// Scene under edit
        #[arg(short, long)]
        scene: String,
    },
    /// Print the actions an edit requires, one JSON object per line
    Decide {
        /// Project manifest (TOML)
        #[arg(short, long)]
        project: PathBuf,

        /// The edit, as JSON (e.g. '{"SheetDeleted":{"name":"Common"}}')
        #[arg(short, long)]
        edit: String,

        /// Print recheck actions as-is instead of expanding them
        #[arg(long)]
        no_resolve: bool,
    },
    /// Show version
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine-readable.
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "sheetwise={log_level},sheetwise_core={log_level},sheetwise_policy={log_level}"
        )))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Sheetwise v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Analyze { project, scene } => commands::analyze(&project, &scene),
        Commands::Decide {
            project,
            edit,
            no_resolve,
        } => commands::decide(&project, &edit, cli.config.as_deref(), !no_resolve),
        Commands::Version => {
            println!("Sheetwise v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

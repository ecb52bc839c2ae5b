//! ilgraph CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "ilgraph")]
#[command(about = "Export compiler IL snapshots as BIGV or XML graph files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Export configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write every snapshot of a method dump to one graph file
    Export {
        /// Method dump (JSON)
        dump: PathBuf,

        /// Output format: binary, xml or none
        #[arg(short, long)]
        format: Option<String>,

        /// Directory to write graph files into
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },
    /// Summarize the snapshots of a method dump
    Inspect {
        /// Method dump (JSON)
        dump: PathBuf,
    },
    /// Show version
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "ilgraph={0},ilgraph_core={0},ilgraph_writer={0}",
            log_level
        )))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Export {
            dump,
            format,
            out_dir,
        } => {
            let config = commands::load_config(cli.config.as_deref(), format.as_deref(), out_dir)?;
            commands::export(&dump, config)
        }
        Commands::Inspect { dump } => commands::inspect(&dump),
        Commands::Version => {
            println!("ilgraph v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "renderlens")]
#[command(about = "Browse render farm statistics by sequence, shot and frame")]
#[command(version)]
struct Cli {
    /// Working directory (defaults to current directory)
    #[arg(short, long, global = true)]
    path: Option<PathBuf>,

    /// Path to the config file (defaults to .renderlens/config.toml, then ~/.renderlens/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },

    /// List the configured stats
    Stats,

    /// List sequences with render data on the share
    Sequences,

    /// Show render stats for a sequence, optionally drilled down to a shot
    View {
        /// Sequence to load, e.g. Seq040
        sequence: String,

        /// Shot to show frame by frame
        #[arg(long)]
        shot: Option<String>,

        /// Render layer ("All Render Layers" combines every layer)
        #[arg(long)]
        layer: Option<String>,

        /// History version (shot view with a single render layer only)
        #[arg(long)]
        history: Option<String>,

        /// Stat to show
        #[arg(long)]
        stat: Option<String>,
    },

    /// Show stats from your own stat files
    Custom {
        /// Stat files or glob patterns
        #[arg(required = true)]
        patterns: Vec<String>,

        /// Render layer
        #[arg(long)]
        layer: Option<String>,

        /// Stat to show
        #[arg(long)]
        stat: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    // Determine the working directory
    let work_dir = cli.path.unwrap_or_else(|| PathBuf::from("."));

    if let Commands::Init { force } = cli.command {
        return cli::init::init_command(cli.config, force).await;
    }

    let config = cli::load_config(&work_dir, cli.config.as_deref())?;

    match cli.command {
        Commands::Init { .. } => {}
        Commands::Stats => {
            cli::catalog::stats_command(&config)?;
        }
        Commands::Sequences => {
            cli::catalog::sequences_command(&config).await?;
        }
        Commands::View {
            sequence,
            shot,
            layer,
            history,
            stat,
        } => {
            let request = cli::view::ViewRequest {
                sequence,
                shot,
                layer,
                history,
                stat,
            };
            cli::view::view_command(&config, request).await?;
        }
        Commands::Custom {
            patterns,
            layer,
            stat,
        } => {
            cli::custom::custom_command(&config, &work_dir, &patterns, layer, stat).await?;
        }
    }

    Ok(())
}

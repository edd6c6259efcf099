use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stagehand_core::AppConfig;

mod commands;

#[derive(Parser)]
#[command(name = "stagehand")]
#[command(author, version, about = "Scroll stage and animation coordination engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ~/.config/stagehand/config.toml)
    #[arg(short = 'c', long = "config", global = true)]
    config_path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive the engine from a timed event script and print frame snapshots
    Replay {
        /// JSON array of `{ "at_ms": .., "event": { "type": .. } }` entries
        #[arg(short = 's', long)]
        script: PathBuf,
        /// Static content file, overriding the configured source
        #[arg(long)]
        content: Option<PathBuf>,
        /// Enter directly, e.g. `53/browse` or `54/read`
        #[arg(short = 'd', long)]
        deep_link: Option<String>,
        /// Number of frames to run (defaults to the script length plus two seconds)
        #[arg(short = 'n', long)]
        frames: Option<u32>,
        /// Print every frame instead of only frames that changed
        #[arg(long)]
        all: bool,
    },
    /// List the items of the configured content source
    List {
        /// Static content file, overriding the configured source
        #[arg(long)]
        content: Option<PathBuf>,
    },
    /// Print the effective configuration
    Config {
        /// Write the default configuration to ~/.config/stagehand/config.toml
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config_path {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    let config = Arc::new(config);

    // Initialize logging; stdout is reserved for command output
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.general.log_level.clone()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match cli.command {
        Commands::Replay {
            script,
            content,
            deep_link,
            frames,
            all,
        } => {
            let args = commands::replay::ReplayArgs {
                script,
                content,
                deep_link,
                frames,
                all,
            };
            commands::replay::run(config, args).await
        }
        Commands::List { content } => commands::list::run(&config, content.as_deref()).await,
        Commands::Config { init } => {
            commands::config::run(&config, cli.config_path.as_deref(), init)
        }
    }
}

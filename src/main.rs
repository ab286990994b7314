//! ML Worker - Main Server
//!
//! Embedding generation and entity extraction sidecar for GraphRAG Notes.

use anyhow::Result;
use clap::{Parser, Subcommand};
use ml_worker::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ml-worker")]
#[command(about = "Embedding and entity extraction sidecar")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the ML worker server
    Serve {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Skip the startup model preload (model loads on first request)
        #[arg(long)]
        no_preload: bool,
    },

    /// Extract entities from a text and print them as JSON
    Extract {
        /// Text to extract entities from
        text: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,ml_worker=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::from_env()?;

    match cli.command {
        Commands::Serve { port, no_preload } => {
            if let Some(port) = port {
                config.server_port = port;
            }
            if no_preload {
                config.preload_model = false;
            }
            ml_worker::start_server(config).await
        }
        Commands::Extract { text } => {
            let entities = ml_worker::entities::extract(&text);
            println!("{}", serde_json::to_string_pretty(&entities)?);
            Ok(())
        }
    }
}

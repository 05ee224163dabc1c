use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use trellis::anthropic::AnthropicClient;
use trellis::{chat, server};

// Define the command-line interface structure using clap
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

// Define the available subcommands
#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Start the questionnaire web server.
    Serve {
        #[arg(long, default_value_t = 3000, help = "Port for the web server.")]
        port: u16,
    },
    /// Fill in the questionnaire from the terminal, against a running server.
    Chat {
        #[arg(
            long,
            default_value = "http://127.0.0.1:3000",
            help = "Base URL of the questionnaire server."
        )]
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (for ANTHROPIC_API_KEY and friends)
    dotenvy::dotenv().ok();

    // Reads log level from the RUST_LOG environment variable
    // (e.g. RUST_LOG=info,trellis=debug)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port } => {
            info!("Starting questionnaire server on port {}...", port);

            // One client for the whole process, handed to the router state.
            let anthropic = AnthropicClient::from_env()
                .context("Cannot start without Anthropic credentials")?;
            info!("Relaying conversations to model {}", anthropic.model());

            server::start_web_server(port, anthropic).await?;
        }
        Commands::Chat { url } => {
            info!("Starting terminal questionnaire session...");
            chat::run_chat(&url).await.context("Chat session failed")?;
        }
    }

    Ok(())
}

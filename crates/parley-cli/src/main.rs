mod commands;
mod prompt;

use anyhow::Result;
use clap::{Parser, Subcommand};
use parley::client::service::DEFAULT_SERVER;
use tracing_subscriber::EnvFilter;

use commands::{chat, providers, version};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address of the chat server
    #[arg(long, global = true, env = "PARLEY_SERVER_URL", default_value = DEFAULT_SERVER)]
    server: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// List the providers the server offers and whether they are configured
    Providers,

    /// Start an interactive conversation
    Chat {
        /// Provider to talk to
        #[arg(short, long, default_value = "openai")]
        provider: String,

        /// Ask the server to add platform context to each request
        #[arg(long)]
        context: bool,

        /// Wait for the whole reply instead of printing it as it arrives
        #[arg(long)]
        no_stream: bool,
    },

    /// Print the client version
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Diagnostics go to stderr so they never interleave with a reply
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Command::Providers) => providers::execute(&cli.server).await,
        Some(Command::Chat {
            provider,
            context,
            no_stream,
        }) => chat::execute(&cli.server, provider, context, !no_stream).await,
        Some(Command::Version) => version::execute(),
        None => chat::execute(&cli.server, "openai".to_string(), false, true).await,
    }
}

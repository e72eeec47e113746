use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod prompt;
mod session;

use commands::chat::ChatArgs;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Chat with the travel assistant
    Chat(ChatArgs),

    /// Run a single capability and print its output
    Tool {
        /// Capability name, see `wayfarer tools`
        name: String,

        /// Arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
    },

    /// List the available capabilities
    Tools,

    /// Print the version
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they never interleave with rendered replies
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Command::Chat(args)) => commands::chat::execute(args).await,
        Some(Command::Tool { name, args }) => commands::tool::execute(&name, &args).await,
        Some(Command::Tools) => commands::tool::list(),
        Some(Command::Version) => commands::version::execute(),
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    }
}

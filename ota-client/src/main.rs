use clap::{Parser, Subcommand};
use tracing::Level;

use ota_client::{ExtractArgs, ListArgs, commands};

#[derive(Parser)]
#[command(
    name = "otadump",
    about = "Unpack Android OTA update payloads into partition images",
    version,
    author,
    long_about = "A command-line tool for reconstructing raw partition images from Android update-engine payloads, including incremental payloads resolved against a full OTA baseline."
)]
struct Cli {
    /// Set the logging level
    #[arg(short, long, value_enum, default_value = "info")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Reconstruct partition images from an OTA payload
    Extract(ExtractArgs),

    /// List the partitions inside an OTA payload
    List(ListArgs),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::from(cli.log_level))
        .with_target(false)
        .init();

    match cli.command {
        Commands::Extract(args) => commands::extract::handle(args).await?,
        Commands::List(args) => commands::list::handle(args).await?,
    }

    Ok(())
}

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use fxconv::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for fxconv::AppCommand {
    fn from(cmd: Commands) -> fxconv::AppCommand {
        match cmd {
            Commands::Currencies => fxconv::AppCommand::Currencies,
            Commands::Convert { from, to, amount } => fxconv::AppCommand::Convert {
                from: from.to_uppercase(),
                to: to.to_uppercase(),
                amount,
            },
            Commands::Serve { address } => fxconv::AppCommand::Serve { address },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// List the currencies in today's rate table
    Currencies,
    /// Convert an amount of minor units between two currencies
    Convert {
        /// Currency code to convert from, e.g. USD
        from: String,
        /// Currency code to convert to, e.g. EUR
        to: String,
        /// Amount in minor units (e.g. cents)
        #[arg(allow_hyphen_values = true)]
        amount: i64,
    },
    /// Serve the conversion API over HTTP
    Serve {
        /// Listen address, overrides the configuration file
        #[arg(short, long)]
        address: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => fxconv::cli::setup::setup(),
        Some(cmd) => fxconv::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

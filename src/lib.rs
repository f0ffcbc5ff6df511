pub mod api;
pub mod cli;
pub mod core;
pub mod providers;

use crate::core::config::AppConfig;
use crate::core::converter::CurrencyConverter;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Currencies,
    Convert {
        from: String,
        to: String,
        amount: i64,
    },
    Serve {
        address: Option<String>,
    },
}

/// Builds the converter over the configured ECB feed.
pub fn build_converter(config: &AppConfig) -> CurrencyConverter {
    let source = providers::EcbRateSource::new(&config.providers.ecb.url);
    CurrencyConverter::new(Arc::new(source))
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Currency converter starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let converter = build_converter(&config);

    match command {
        AppCommand::Currencies => cli::currencies::run(&converter).await,
        AppCommand::Convert { from, to, amount } => {
            cli::convert::run(&converter, &from, &to, amount).await
        }
        AppCommand::Serve { address } => {
            let address = address.unwrap_or_else(|| config.server.address.clone());
            let server = api::server::ApiServer::new(converter, config.server.bearer_token);
            api::server::serve(server, &address).await
        }
    }
}

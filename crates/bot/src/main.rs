use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;
use teloxide::prelude::*;

use farmconnect::cli::{Cli, Commands};
use farmconnect::seed::run_seed;
use farmconnect::telegram::{create_bot, schema, setup_bot_commands, HandlerDeps};
use farmconnect::telegram::onboarding::OnboardingStore;
use farmconnect::web::start_web_server;
use farmconnect_core::logging::init_logger;
use farmconnect_core::storage::create_pool;
use farmconnect_core::config;

/// Main entry point: parses CLI arguments and dispatches to a subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, database, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Load environment variables from .env if present, before any config
    // Lazy static reads them
    let _ = dotenv();

    // Initialize logger (console + file)
    init_logger(&config::LOG_FILE_PATH)?;

    match cli.command {
        Some(Commands::Seed) => {
            let db_pool = create_pool(&config::DATABASE_PATH)?;
            run_seed(&db_pool)?;
            Ok(())
        }
        Some(Commands::Run) | None => run_bot().await,
    }
}

async fn run_bot() -> Result<()> {
    log::info!("Starting Osnabrück Farm Connect bot");

    let db_pool = Arc::new(create_pool(&config::DATABASE_PATH)?);
    log::info!("Database ready at {}", &*config::DATABASE_PATH);

    let bot = create_bot()?;
    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to register bot commands: {}", e);
    }

    // HTTP surface (payment webhook, health) runs alongside long polling
    let web_db = Arc::clone(&db_pool);
    let web_port = *config::WEB_PORT;
    tokio::spawn(async move {
        if let Err(e) = start_web_server(web_port, web_db).await {
            log::error!("Web server exited: {}", e);
        }
    });

    let deps = HandlerDeps::new(Arc::clone(&db_pool), OnboardingStore::new());
    let handler = schema(deps);

    log::info!("Starting bot in long polling mode");
    Dispatcher::builder(bot, handler)
        .dependencies(DependencyMap::new())
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    log::info!("Dispatcher shutdown gracefully");
    Ok(())
}

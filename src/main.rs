//! # Case Matcher Main Driver
//!
//! ## Purpose
//! Main entry point for the case matching server. Orchestrates initialization
//! of all system components and starts the web server for handling
//! classification and similarity requests.
//!
//! ## Architecture Flow
//! 1. Parse command line arguments and load configuration
//! 2. Initialize logging and tracing
//! 3. Open the case store and build the classifier and ranker
//! 4. Start the web API server
//! 5. Handle shutdown signals gracefully

use clap::{Arg, Command};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use legal_case_matcher::{
    api::ApiServer,
    classifier::CaseTypeClassifier,
    config::Config,
    errors::{MatchError, Result},
    ranker::SimilarityRanker,
    storage::CaseStore,
    AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("case-match-server")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Legal Search Team")
        .about("Legal case classification and similarity matching server")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("config.toml"),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("Server port")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("check-health")
                .long("check-health")
                .help("Run health checks and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let config_path = matches.get_one::<String>("config").expect("has default");
    let mut config = Config::from_file(config_path)?;

    if let Some(port) = matches.get_one::<u16>("port") {
        config.server.port = *port;
    }

    let config = Arc::new(config);

    init_logging(&config)?;

    info!("Starting Legal Case Matcher v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded from: {}", config_path);

    let app_state = initialize_components(config.clone())?;

    if matches.get_flag("check-health") {
        app_state.store.health_check()?;
        info!("All health checks passed");
        return Ok(());
    }

    let server = ApiServer::new(app_state.clone());
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.run().await {
            error!("Server error: {}", e);
        }
    });

    info!(
        "Legal Case Matcher started on {}:{}",
        config.server.host, config.server.port
    );

    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Received SIGINT, shutting down gracefully...");
        }
        _ = server_handle => {
            warn!("Server stopped unexpectedly");
        }
    }

    app_state.store.flush().await?;
    info!("Legal Case Matcher shut down successfully");

    Ok(())
}

/// Initialize logging and tracing
fn init_logging(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .map_err(|_| MatchError::Config {
            message: format!("Invalid log level: {}", config.logging.level),
        })?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    if config.logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }

    Ok(())
}

/// Initialize all application components
fn initialize_components(config: Arc<Config>) -> Result<AppState> {
    info!("Initializing application components...");

    let store = Arc::new(CaseStore::open(config.storage.clone())?);
    store.health_check()?;
    info!("Case store is healthy ({} cases)", store.count());

    let classifier = Arc::new(CaseTypeClassifier::new(config.classifier.clone()));
    info!(
        "Classifier loaded with {} categories",
        config.classifier.categories.len()
    );

    let ranker = Arc::new(SimilarityRanker::new(config.ranker.clone())?);

    Ok(AppState {
        config,
        classifier,
        ranker,
        store,
    })
}

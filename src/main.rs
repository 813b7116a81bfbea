//! Brainlink - second-brain bookmark service

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use brainlink::{config::Args, db::MongoClient, server, store::Stores};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("brainlink={},info", log_level).into()),
        )
        .with((!args.log_json).then(tracing_subscriber::fmt::layer))
        .with(args.log_json.then(|| tracing_subscriber::fmt::layer().json()))
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Brainlink - second brain service");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("MongoDB: {} (db '{}')", args.mongodb_uri, args.mongodb_db);
    if !args.api_prefix().is_empty() {
        info!("API prefix: {}", args.api_prefix());
    }
    info!("Token lifetime: {}s", args.jwt_expiry_seconds);
    info!("======================================");

    // MongoDB is optional in dev mode only
    let stores = match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
        Ok(client) => match Stores::mongo(&client).await {
            Ok(stores) => stores,
            Err(e) => {
                error!("Failed to prepare MongoDB collections: {}", e);
                std::process::exit(1);
            }
        },
        Err(e) => {
            if args.dev_mode {
                warn!("MongoDB connection failed (dev mode, using in-memory store): {}", e);
                Stores::memory()
            } else {
                error!("MongoDB connection failed: {}", e);
                std::process::exit(1);
            }
        }
    };

    let state = match server::AppState::new(args, stores) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            error!("Failed to initialize: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server::run(state).await {
        error!("Server error: {:?}", e);
        std::process::exit(1);
    }

    Ok(())
}

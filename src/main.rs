mod config;
mod db;
mod error;
mod handlers;
mod models;
mod scoring;

use config::Settings;
use db::Database;
use handlers::Store;
use log::{error, info};
use std::process;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Initialize logging
    dotenvy::dotenv().ok();
    env_logger::init();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            process::exit(1);
        }
    };

    let catalog = match settings.load_catalog() {
        Ok(catalog) => catalog,
        Err(e) => {
            error!("Failed to load question catalog: {}", e);
            process::exit(1);
        }
    };
    info!("Loaded {} questions", catalog.len());

    // Initialize database
    let database = match Database::connect(&settings.database_url, settings.max_connections).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            process::exit(1);
        }
    };
    let pool = database.pool().clone();
    let store: Store = Arc::new(database);

    info!(
        "Server starting on http://{}:{} (admin page at {})",
        settings.address, settings.port, settings.admin_path
    );

    let result = handlers::build(&settings, catalog, store).launch().await;
    pool.close().await;
    if let Err(e) = result {
        error!("Server error: {}", e);
        process::exit(1);
    }
    info!("Server stopped");
}

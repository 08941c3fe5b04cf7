use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::time::Duration;
use tracing::{error, info, warn};

use crate::common::db_errors::DbErrorKind;
use crate::config::DatabaseConfig;

fn connect_options(config: &DatabaseConfig) -> ConnectOptions {
    let mut opt = ConnectOptions::new(config.url.clone());

    opt.max_connections(config.max_connections)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(5))
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(3600))
        .sqlx_logging(true)
        .sqlx_logging_level(tracing::log::LevelFilter::Debug);

    opt
}

/// Open the connection pool. Transient failures are retried up to
/// `connect_attempts` times with `retry_delay` between attempts.
pub async fn establish_connection(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let attempts = config.connect_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match Database::connect(connect_options(config)).await {
            Ok(db) => {
                info!("Database connection established (attempt {})", attempt);
                return Ok(db);
            }
            Err(err) if attempt < attempts && DbErrorKind::from_db_err(&err).is_retryable() => {
                warn!(
                    "Connection attempt {} of {} failed: {}. Retrying in {:?}",
                    attempt, attempts, err, config.retry_delay
                );
                tokio::time::sleep(config.retry_delay).await;
            }
            Err(err) => {
                error!(
                    "Failed to connect to database after {} attempts: {}",
                    attempts, err
                );
                return Err(err);
            }
        }
    }
}

pub fn get_database_url(database_path: Option<&str>) -> String {
    match database_path {
        Some(path) if path == ":memory:" => "sqlite::memory:".to_string(),
        Some(path) => format!("sqlite://{}?mode=rwc", path),
        None => "sqlite://ea-catalog.db?mode=rwc".to_string(),
    }
}

pub mod connection;
pub mod entities;
pub mod migrations;
pub mod seed_data;

#[cfg(test)]
pub mod test_utils;

pub use connection::*;

use anyhow::Result;
use clap::Subcommand;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::config::DatabaseConfig;
use migrations::Migrator;

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum MigrateDirection {
    Up,
    Down,
    Fresh,
}

/// Connect and bring the schema up to date.
pub async fn setup_database(config: &DatabaseConfig) -> Result<DatabaseConnection> {
    let db = establish_connection(config).await?;
    Migrator::up(&db, None).await?;
    info!("Database migrations completed");
    Ok(db)
}

pub async fn migrate_database(config: &DatabaseConfig, direction: MigrateDirection) -> Result<()> {
    let db = establish_connection(config).await?;

    match direction {
        MigrateDirection::Up => {
            info!("Running migrations up");
            Migrator::up(&db, None).await?;
        }
        MigrateDirection::Down => {
            info!("Running migrations down");
            Migrator::down(&db, None).await?;
        }
        MigrateDirection::Fresh => {
            info!("Running fresh migrations (down then up)");
            Migrator::down(&db, None).await?;
            Migrator::up(&db, None).await?;
        }
    }

    info!("Database migration completed");
    Ok(())
}

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use ea_catalog::auth::{AdminActor, AdminRole};
use ea_catalog::common;
use ea_catalog::config::{AuthArgs, DatabaseArgs};
use ea_catalog::database::{self, seed_data, MigrateDirection};
use ea_catalog::export::ExportFormat;
use ea_catalog::services::entity_service::EntityFilter;
use ea_catalog::services::{AdminService, ExportService, GraphFilter, ValidationService};

#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    #[clap(short, long, global = true)]
    log_level: Option<String>,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    #[cfg(feature = "server")]
    Serve {
        #[clap(flatten)]
        database: DatabaseArgs,
        #[clap(flatten)]
        server: ea_catalog::config::ServerArgs,
        #[clap(flatten)]
        auth: AuthArgs,
    },
    Db {
        #[clap(subcommand)]
        command: DbCommands,
    },
    Admin {
        #[clap(subcommand)]
        command: AdminCommands,
    },
    /// Render the catalog graph to a file or stdout
    Export {
        #[clap(short, long, value_enum, default_value = "json")]
        format: ExportFormat,
        #[clap(short, long)]
        output: Option<String>,
        /// Only include entities of this type
        #[clap(long = "type")]
        entity_type: Option<String>,
        /// Comma separated relationship types
        #[clap(long)]
        relationship_types: Option<String>,
        #[clap(long, default_value = "0")]
        min_connections: usize,
        #[clap(flatten)]
        database: DatabaseArgs,
    },
}

#[derive(Subcommand, Debug)]
enum DbCommands {
    Migrate {
        #[clap(subcommand)]
        direction: MigrateDirection,
        #[clap(flatten)]
        database: DatabaseArgs,
    },
    /// Insert the sample catalog; existing rows are left alone
    Seed {
        #[clap(flatten)]
        database: DatabaseArgs,
    },
}

#[derive(Subcommand, Debug)]
enum AdminCommands {
    Create {
        username: String,
        #[clap(long, env = "NEW_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
        #[clap(long, default_value = "admin")]
        role: String,
        #[clap(flatten)]
        database: DatabaseArgs,
        #[clap(flatten)]
        auth: AuthArgs,
    },
    /// Clear a lockout
    Unlock {
        username: String,
        #[clap(flatten)]
        database: DatabaseArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    setup_logging(&args.log_level);

    match args.command {
        #[cfg(feature = "server")]
        Commands::Serve {
            database,
            server,
            auth,
        } => {
            let config = ea_catalog::config::CatalogConfig {
                database: database.to_config()?,
                server: server.to_config(),
                auth: auth.to_config()?,
            };
            info!("Starting server on port {}", config.server.port);
            ea_catalog::server::start_server(&config).await?;
        }
        Commands::Db { command } => match command {
            DbCommands::Migrate {
                direction,
                database,
            } => {
                info!("Running database migration: {:?}", direction);
                database::migrate_database(&database.to_config()?, direction).await?;
            }
            DbCommands::Seed { database } => {
                let db = database::setup_database(&database.to_config()?).await?;
                let summary = seed_data::seed_sample_catalog(&db).await?;
                info!(
                    "Seeded {} entities and {} relationships",
                    summary.entities_created, summary.relationships_created
                );
            }
        },
        Commands::Admin { command } => match command {
            AdminCommands::Create {
                username,
                password,
                role,
                database,
                auth,
            } => {
                let role = AdminRole::parse(&role)?;
                let auth = auth.to_config()?;
                let db = database::setup_database(&database.to_config()?).await?;
                AdminService::new(db, auth.bcrypt_cost)
                    .create_admin(&AdminActor::system(), &username, &password, role)
                    .await?;
                info!("Created {} '{}'", role.as_str(), username);
            }
            AdminCommands::Unlock { username, database } => {
                let db = database::setup_database(&database.to_config()?).await?;
                AdminService::new(db, bcrypt::DEFAULT_COST)
                    .unlock_admin(&AdminActor::system(), &username)
                    .await?;
                info!("Unlocked '{}'", username);
            }
        },
        Commands::Export {
            format,
            output,
            entity_type,
            relationship_types,
            min_connections,
            database,
        } => {
            let filter = export_filter(
                entity_type.as_deref(),
                relationship_types.as_deref(),
                min_connections,
            )?;
            let db = database::setup_database(&database.to_config()?).await?;
            let rendered = ExportService::new(db).export_graph(format, &filter).await?;

            match output {
                Some(path) => {
                    common::write_string_to_file(&path, &rendered)?;
                    info!("Wrote {:?} export to {}", format, path);
                }
                None => println!("{}", rendered),
            }
        }
    }

    Ok(())
}

fn export_filter(
    entity_type: Option<&str>,
    relationship_types: Option<&str>,
    min_connections: usize,
) -> Result<GraphFilter> {
    let entity_type = entity_type
        .map(ValidationService::parse_entity_type)
        .transpose()?;
    let relationship_types = relationship_types
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ValidationService::parse_relationship_type)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(GraphFilter {
        entities: EntityFilter {
            entity_type,
            ..Default::default()
        },
        relationship_types,
        show_relationships: true,
        min_connections,
    })
}

fn setup_logging(log_level: &Option<String>) {
    let log_level = match log_level
        .as_ref()
        .unwrap_or(&"info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!("handlebars=off,{}", log_level)))
        .without_time()
        .init();
}

//! Process configuration
//!
//! `CatalogConfig` is built once in `main` from command line arguments, each
//! of which falls back to an environment variable, and is then passed by
//! reference to connection setup and the HTTP application state.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Args;
use url::Url;

use crate::database::get_database_url;

#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub auth: AuthConfig,
}

/// Database connection settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    /// Attempts made to open the initial connection before giving up.
    pub connect_attempts: u32,
    /// Pause between connection attempts.
    pub retry_delay: Duration,
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connect_attempts: 5,
            retry_delay: Duration::from_secs(2),
            max_connections: 20,
        }
    }

    pub fn is_sqlite(&self) -> bool {
        self.url.starts_with("sqlite:")
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            cors_origin: None,
        }
    }
}

/// Password, lockout and session policy.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Consecutive failures that lock an account.
    pub lockout_threshold: i32,
    /// Seconds a locked account stays locked after the last failure.
    pub lockout_window_secs: i64,
    pub session_ttl_hours: i64,
    pub bcrypt_cost: u32,
    /// Password for the `superadmin` account created when no super admin exists.
    pub bootstrap_password: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            lockout_threshold: 5,
            lockout_window_secs: 300,
            session_ttl_hours: 24,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            bootstrap_password: None,
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct DatabaseArgs {
    /// Full database URL, takes precedence over the PG* settings
    #[clap(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
    #[clap(long, env = "PGHOST")]
    pub pg_host: Option<String>,
    #[clap(long, env = "PGPORT")]
    pub pg_port: Option<u16>,
    #[clap(long, env = "PGDATABASE")]
    pub pg_database: Option<String>,
    #[clap(long, env = "PGUSER")]
    pub pg_user: Option<String>,
    #[clap(long, env = "PGPASSWORD", hide_env_values = true)]
    pub pg_password: Option<String>,
    /// Local SQLite file instead of PostgreSQL
    #[clap(long, conflicts_with = "database_url")]
    pub sqlite: Option<String>,
    /// Connection attempts before giving up
    #[clap(long, default_value = "5")]
    pub connect_attempts: u32,
}

impl DatabaseArgs {
    pub fn to_config(&self) -> Result<DatabaseConfig> {
        let url = match (&self.sqlite, &self.database_url) {
            (Some(path), _) => get_database_url(Some(path)),
            (None, Some(url)) if !url.trim().is_empty() => url.clone(),
            _ => self.postgres_url()?,
        };
        let mut config = DatabaseConfig::new(url);
        config.connect_attempts = self.connect_attempts.max(1);
        Ok(config)
    }

    fn postgres_url(&self) -> Result<String> {
        let host = self
            .pg_host
            .as_deref()
            .ok_or_else(|| anyhow!("No database configured: set DATABASE_URL or PGHOST"))?;
        let database = self
            .pg_database
            .as_deref()
            .ok_or_else(|| anyhow!("PGDATABASE must be set when DATABASE_URL is not"))?;
        let port = self.pg_port.unwrap_or(5432);

        let mut url = Url::parse(&format!("postgres://{}:{}", host, port))
            .with_context(|| format!("Invalid PGHOST '{}'", host))?;
        url.set_path(database);

        // Userinfo is percent-encoded so reserved characters survive
        if let Some(user) = &self.pg_user {
            url.set_username(user)
                .map_err(|_| anyhow!("PGUSER cannot be applied to '{}'", host))?;
            url.set_password(self.pg_password.as_deref())
                .map_err(|_| anyhow!("PGPASSWORD cannot be applied to '{}'", host))?;
        }

        Ok(url.to_string())
    }
}

#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    #[clap(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,
    #[clap(short, long, env = "PORT", default_value = "5000")]
    pub port: u16,
    #[clap(long)]
    pub cors_origin: Option<String>,
}

impl ServerArgs {
    pub fn to_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.host.clone(),
            port: self.port,
            cors_origin: self.cors_origin.clone(),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct AuthArgs {
    /// Password for the bootstrap `superadmin` account
    #[clap(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,
    #[clap(long, default_value = "5")]
    pub lockout_threshold: i32,
    #[clap(long, default_value = "300")]
    pub lockout_window_secs: i64,
    #[clap(long, default_value = "24")]
    pub session_ttl_hours: i64,
    #[clap(long, default_value = "12")]
    pub bcrypt_cost: u32,
}

// Mirrors bcrypt's cost bounds, which the crate does not export.
pub(crate) const BCRYPT_MIN_COST: u32 = 4;
pub(crate) const BCRYPT_MAX_COST: u32 = 31;

impl AuthArgs {
    pub fn to_config(&self) -> Result<AuthConfig> {
        if self.lockout_threshold < 1 {
            return Err(anyhow!("lockout threshold must be at least 1"));
        }
        if !(BCRYPT_MIN_COST..=BCRYPT_MAX_COST).contains(&self.bcrypt_cost) {
            return Err(anyhow!(
                "bcrypt cost must be between {} and {}",
                BCRYPT_MIN_COST,
                BCRYPT_MAX_COST
            ));
        }
        Ok(AuthConfig {
            lockout_threshold: self.lockout_threshold,
            lockout_window_secs: self.lockout_window_secs.max(0),
            session_ttl_hours: self.session_ttl_hours.max(1),
            bcrypt_cost: self.bcrypt_cost,
            bootstrap_password: self
                .admin_password
                .clone()
                .filter(|password| !password.is_empty()),
        })
    }
}

//! Runtime settings loaded via `OrthoConfig`.
//!
//! Values are layered from defaults, configuration files, `QUESTBANK_*`
//! environment variables and command-line flags.

use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};
use ortho_config::OrthoConfig;
use serde::Deserialize;
use std::ffi::OsString;
use thiserror::Error;

/// `PostgreSQL` connection pool shared by the Diesel adapters.
pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Errors raised while loading settings or building the pool.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Settings could not be loaded or merged.
    #[error("failed to load settings: {0}")]
    Load(String),

    /// A database pool was requested but no URL is configured.
    #[error("database_url is not configured")]
    MissingDatabaseUrl,

    /// The connection pool could not be created.
    #[error("failed to build connection pool: {0}")]
    Pool(#[from] PoolError),
}

/// Settings for the task and ledger services.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "QUESTBANK")]
pub struct QuestbankSettings {
    /// `PostgreSQL` connection URL; the in-memory adapters are used when unset.
    pub database_url: Option<String>,
    /// Upper bound on pooled database connections.
    #[ortho_config(default = 10)]
    pub pool_max_size: u32,
    /// Number of balances returned by the leaderboard.
    #[ortho_config(default = 10)]
    pub leaderboard_limit: usize,
    /// Emit logs as JSON lines instead of human-readable text.
    pub log_json: Option<bool>,
}

impl QuestbankSettings {
    /// Returns whether logs should be emitted as JSON, defaulting to text.
    #[must_use]
    pub fn log_json(&self) -> bool {
        self.log_json.unwrap_or(false)
    }

    /// Loads settings from the given argument list plus environment and files.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Load`] when a layer cannot be parsed.
    pub fn load_from_args<I>(args: I) -> Result<Self, SettingsError>
    where
        I: IntoIterator<Item = OsString>,
    {
        Self::load_from_iter(args).map_err(|err| SettingsError::Load(err.to_string()))
    }

    /// Builds a Diesel connection pool for the configured database.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::MissingDatabaseUrl`] when no URL is set or
    /// [`SettingsError::Pool`] when the pool cannot connect.
    pub fn build_pool(&self) -> Result<PgPool, SettingsError> {
        let url = self
            .database_url
            .as_deref()
            .ok_or(SettingsError::MissingDatabaseUrl)?;
        let pool = Pool::builder()
            .max_size(self.pool_max_size)
            .build(ConnectionManager::<PgConnection>::new(url))?;
        Ok(pool)
    }
}

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors from the vote store and its pool
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Invalid table name: {0}")]
    InvalidTableName(String),

    /// Write refused by the store with its own error code
    #[error("Store rejected write ({code}): {message}")]
    Rejected { code: String, message: String },

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Short machine-readable code for this failure.
    ///
    /// PostgreSQL errors report their SQLSTATE (`23505`, `42P01`, ...).
    pub fn code(&self) -> String {
        match self {
            DatabaseError::Rejected { code, .. } => code.clone(),
            DatabaseError::Sqlx(sqlx::Error::Database(db_err)) => db_err
                .code()
                .map(|c| c.into_owned())
                .unwrap_or_else(|| "DATABASE_ERROR".to_string()),
            DatabaseError::Sqlx(sqlx::Error::PoolTimedOut) => "POOL_TIMED_OUT".to_string(),
            DatabaseError::Sqlx(sqlx::Error::Io(_)) => "CONNECTION_ERROR".to_string(),
            DatabaseError::Sqlx(_) => "DATABASE_ERROR".to_string(),
            DatabaseError::ConfigMissing(_) | DatabaseError::InvalidDatabaseUrl => "CONFIG_ERROR".to_string(),
            DatabaseError::InvalidTableName(_) => "INVALID_TABLE".to_string(),
        }
    }
}

/// Builds the PostgreSQL pool and guards identifiers spliced into SQL
pub struct DatabaseManager;

impl DatabaseManager {
    /// Open a pool for the configured database
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let url = config
            .url
            .as_deref()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;

        // Reject garbage early so the error names the URL rather than a socket failure
        url::Url::parse(url).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!("Created database pool (max {} connections)", config.max_connections);
        Ok(pool)
    }

    /// Quote SQL identifier to prevent injection
    pub fn quote_identifier(name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    /// Table names are spliced into SQL, so only `[A-Za-z_][A-Za-z0-9_]*` is accepted
    pub fn is_valid_table_name(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return false,
        }
        name.len() <= 63 && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_table_names() {
        assert!(DatabaseManager::is_valid_table_name("votes"));
        assert!(DatabaseManager::is_valid_table_name("_votes_2024"));
        assert!(!DatabaseManager::is_valid_table_name(""));
        assert!(!DatabaseManager::is_valid_table_name("2024_votes"));
        assert!(!DatabaseManager::is_valid_table_name("votes-archive"));
        assert!(!DatabaseManager::is_valid_table_name("votes; DROP TABLE votes"));
    }

    #[test]
    fn quotes_identifiers() {
        assert_eq!(DatabaseManager::quote_identifier("votes"), "\"votes\"");
        assert_eq!(DatabaseManager::quote_identifier("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn rejected_errors_report_their_code() {
        let err = DatabaseError::Rejected {
            code: "23514".to_string(),
            message: "check violation".to_string(),
        };
        assert_eq!(err.code(), "23514");
        assert_eq!(DatabaseError::Sqlx(sqlx::Error::PoolTimedOut).code(), "POOL_TIMED_OUT");
    }

    #[tokio::test]
    async fn connect_requires_database_url() {
        let config = DatabaseConfig {
            url: None,
            max_connections: 1,
            connection_timeout: 1,
            votes_table: "votes".to_string(),
        };
        let err = DatabaseManager::connect(&config).await.unwrap_err();
        assert!(matches!(err, DatabaseError::ConfigMissing("DATABASE_URL")));
    }
}

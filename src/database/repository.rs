use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgExecutor, types::Json, PgPool};
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{NewVote, VoteRecord};
use crate::database::store::VoteStore;

const VOTE_COLUMNS: &str = "id, voter_id, vote, ip, client_ip, client_info, created_at";

/// PostgreSQL-backed vote store
#[derive(Clone)]
pub struct PgVoteStore {
    table: String,
    pool: PgPool,
}

impl PgVoteStore {
    pub fn new(table_name: &str, pool: PgPool) -> Result<Self, DatabaseError> {
        if !DatabaseManager::is_valid_table_name(table_name) {
            return Err(DatabaseError::InvalidTableName(table_name.to_string()));
        }
        Ok(Self {
            table: DatabaseManager::quote_identifier(table_name),
            pool,
        })
    }

    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let pool = DatabaseManager::connect(config).await?;
        Self::new(&config.votes_table, pool)
    }

    /// Create the votes table and its address index when missing
    pub async fn ensure_schema(&self) -> Result<(), DatabaseError> {
        let ddl = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                id          UUID PRIMARY KEY,
                voter_id    TEXT NOT NULL,
                vote        JSONB NOT NULL,
                ip          TEXT NOT NULL,
                client_ip   TEXT NOT NULL DEFAULT '',
                client_info TEXT NOT NULL DEFAULT '',
                created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
            table = self.table
        );
        sqlx::query(&ddl).execute(&self.pool).await?;

        let index_name = DatabaseManager::quote_identifier(&format!(
            "{}_client_ip_idx",
            self.table.trim_matches('"')
        ));
        let index = format!(
            "CREATE INDEX IF NOT EXISTS {} ON {} (client_ip)",
            index_name, self.table
        );
        sqlx::query(&index).execute(&self.pool).await?;

        tracing::info!("Ensured votes table {}", self.table);
        Ok(())
    }

    async fn insert_with<'c, E>(&self, executor: E, vote: &NewVote) -> Result<VoteRecord, DatabaseError>
    where
        E: PgExecutor<'c>,
    {
        let sql = format!(
            "INSERT INTO {} (id, voter_id, vote, ip, client_ip, client_info, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            self.table, VOTE_COLUMNS
        );

        let record = sqlx::query_as::<_, VoteRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(&vote.voter_id)
            .bind(Json(&vote.vote))
            .bind(vote.audit_ip())
            .bind(&vote.client_ip)
            .bind(&vote.client_info)
            .bind(Utc::now())
            .fetch_one(executor)
            .await?;

        Ok(record)
    }
}

#[async_trait]
impl VoteStore for PgVoteStore {
    async fn insert(&self, vote: NewVote) -> Result<VoteRecord, DatabaseError> {
        self.insert_with(&self.pool, &vote).await
    }

    async fn insert_if_new_address(&self, vote: NewVote) -> Result<Option<VoteRecord>, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        // Held until commit or rollback; serializes ballots from one address
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(&vote.client_ip)
            .execute(&mut *tx)
            .await?;

        let sql = format!("SELECT EXISTS (SELECT 1 FROM {} WHERE client_ip = $1)", self.table);
        let exists: bool = sqlx::query_scalar(&sql)
            .bind(&vote.client_ip)
            .fetch_one(&mut *tx)
            .await?;
        if exists {
            tx.rollback().await?;
            return Ok(None);
        }

        let record = self.insert_with(&mut *tx, &vote).await?;
        tx.commit().await?;
        Ok(Some(record))
    }

    async fn list(&self, limit: Option<i64>, offset: i64) -> Result<Vec<VoteRecord>, DatabaseError> {
        // LIMIT NULL is LIMIT ALL in PostgreSQL
        let sql = format!(
            "SELECT {} FROM {} ORDER BY created_at DESC, id LIMIT $1 OFFSET $2",
            VOTE_COLUMNS, self.table
        );
        let records = sqlx::query_as::<_, VoteRecord>(&sql)
            .bind(limit)
            .bind(offset.max(0))
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }

    async fn count(&self) -> Result<i64, DatabaseError> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table);
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

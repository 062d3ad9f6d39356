use async_trait::async_trait;

use super::manager::DatabaseError;
use super::models::{NewVote, VoteRecord};

/// Persistence seam for ballots.
///
/// `PgVoteStore` is the production implementation; `MemoryVoteStore` backs
/// `serve --memory` and the test suites.
#[async_trait]
pub trait VoteStore: Send + Sync {
    /// Insert one ballot and return the stored row
    async fn insert(&self, vote: NewVote) -> Result<VoteRecord, DatabaseError>;

    /// Insert unless a ballot from the same `client_ip` is already stored.
    ///
    /// The check and the insert happen as one step, so concurrent ballots from
    /// one address store at most one row. `Ok(None)` means an earlier ballot won.
    async fn insert_if_new_address(&self, vote: NewVote) -> Result<Option<VoteRecord>, DatabaseError>;

    /// Newest first. `limit: None` returns everything past `offset`.
    async fn list(&self, limit: Option<i64>, offset: i64) -> Result<Vec<VoteRecord>, DatabaseError>;

    async fn count(&self) -> Result<i64, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;
}

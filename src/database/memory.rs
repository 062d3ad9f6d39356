use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::{NewVote, VoteRecord};
use super::store::VoteStore;

/// Process-local vote store, for `serve --memory` and tests
#[derive(Default)]
pub struct MemoryVoteStore {
    votes: RwLock<Vec<VoteRecord>>,
}

impl MemoryVoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored ballot in insertion order
    pub async fn snapshot(&self) -> Vec<VoteRecord> {
        self.votes.read().await.clone()
    }
}

#[async_trait]
impl VoteStore for MemoryVoteStore {
    async fn insert(&self, vote: NewVote) -> Result<VoteRecord, DatabaseError> {
        let record = vote.into_record(Uuid::new_v4(), Utc::now());
        self.votes.write().await.push(record.clone());
        Ok(record)
    }

    async fn insert_if_new_address(&self, vote: NewVote) -> Result<Option<VoteRecord>, DatabaseError> {
        // One write guard covers both the lookup and the push
        let mut votes = self.votes.write().await;
        if votes.iter().any(|v| v.client_ip == vote.client_ip) {
            return Ok(None);
        }
        let record = vote.into_record(Uuid::new_v4(), Utc::now());
        votes.push(record.clone());
        Ok(Some(record))
    }

    async fn list(&self, limit: Option<i64>, offset: i64) -> Result<Vec<VoteRecord>, DatabaseError> {
        let votes = self.votes.read().await;
        let take = limit.map(|l| l.max(0) as usize).unwrap_or(usize::MAX);
        Ok(votes
            .iter()
            .rev()
            .skip(offset.max(0) as usize)
            .take(take)
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<i64, DatabaseError> {
        Ok(self.votes.read().await.len() as i64)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

use crate::config::{DispatchMode, ValidationPolicy};
use crate::database::{DatabaseError, NewVote, VoteRecord, VoteStore};
use super::webhook::{LinkError, LinkPolicy, Notifier};

#[derive(Debug, Error)]
pub enum VoteError {
    #[error("vote must contain exactly {expected} choices")]
    InvalidShape { expected: usize, actual: Option<usize> },

    #[error("a vote from this address was already recorded")]
    DuplicateIp,

    #[error("webhook link rejected: {0}")]
    LinkRejected(LinkError),

    #[error(transparent)]
    Store(DatabaseError),
}

/// One ballot as received from the client, with its resolved address
#[derive(Debug, Clone)]
pub struct Submission {
    pub voter_id: String,
    pub vote: Value,
    pub link: Option<String>,
    pub info: Option<String>,
    pub client_ip: String,
}

/// Per-position tallies over every stored ballot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoteSummary {
    pub total: i64,
    /// `positions[i]` maps each choice seen at position `i` to its count
    pub positions: Vec<BTreeMap<String, u64>>,
}

/// Validates, stores and announces ballots
pub struct VoteService {
    store: Arc<dyn VoteStore>,
    notifier: Arc<dyn Notifier>,
    policy: ValidationPolicy,
    links: LinkPolicy,
    dispatch: DispatchMode,
}

impl VoteService {
    pub fn new(
        store: Arc<dyn VoteStore>,
        notifier: Arc<dyn Notifier>,
        policy: ValidationPolicy,
        links: LinkPolicy,
        dispatch: DispatchMode,
    ) -> Self {
        Self {
            store,
            notifier,
            policy,
            links,
            dispatch,
        }
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    /// Record one ballot.
    ///
    /// Nothing is written and no webhook fires unless every check passes and
    /// the insert succeeds. The webhook outcome never changes the result.
    pub async fn submit(&self, submission: Submission) -> Result<VoteRecord, VoteError> {
        let choices = self.validate_shape(submission.vote)?;

        let target = self
            .links
            .resolve(submission.link.as_deref())
            .map_err(VoteError::LinkRejected)?;

        let info = if self.policy.record_info {
            submission.info.unwrap_or_default()
        } else {
            String::new()
        };
        let ballot = NewVote::new(submission.voter_id, choices, submission.client_ip, info);

        let record = if self.policy.reject_duplicate_ip {
            let client_ip = ballot.client_ip.clone();
            match self
                .store
                .insert_if_new_address(ballot)
                .await
                .map_err(VoteError::Store)?
            {
                Some(record) => record,
                None => {
                    tracing::info!(client_ip = %client_ip, "Rejected repeat vote from address");
                    return Err(VoteError::DuplicateIp);
                }
            }
        } else {
            self.store.insert(ballot).await.map_err(VoteError::Store)?
        };

        tracing::info!(
            vote_id = %record.id,
            voter_id = %record.voter_id,
            client_ip = %record.client_ip,
            "Vote recorded"
        );

        if let Some(url) = target {
            self.dispatch(url).await;
        }

        Ok(record)
    }

    fn validate_shape(&self, vote: Value) -> Result<Vec<Value>, VoteError> {
        let expected = self.policy.required_choices;
        match vote {
            Value::Array(items) if items.len() == expected => Ok(items),
            Value::Array(items) => Err(VoteError::InvalidShape {
                expected,
                actual: Some(items.len()),
            }),
            _ => Err(VoteError::InvalidShape { expected, actual: None }),
        }
    }

    async fn dispatch(&self, url: Url) {
        match self.dispatch {
            DispatchMode::Await => notify_logged(self.notifier.as_ref(), &url).await,
            DispatchMode::Background => {
                let notifier = Arc::clone(&self.notifier);
                tokio::spawn(async move {
                    notify_logged(notifier.as_ref(), &url).await;
                });
            }
        }
    }

    pub async fn list(&self, limit: Option<i64>, offset: i64) -> Result<Vec<VoteRecord>, DatabaseError> {
        self.store.list(limit, offset).await
    }

    pub async fn count(&self) -> Result<i64, DatabaseError> {
        self.store.count().await
    }

    pub async fn summary(&self) -> Result<VoteSummary, DatabaseError> {
        let votes = self.store.list(None, 0).await?;

        let mut positions: Vec<BTreeMap<String, u64>> = vec![BTreeMap::new(); self.policy.required_choices];
        for record in &votes {
            for (slot, choice) in positions.iter_mut().zip(&record.vote) {
                *slot.entry(choice_key(choice)).or_insert(0) += 1;
            }
        }

        Ok(VoteSummary {
            total: votes.len() as i64,
            positions,
        })
    }

    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        self.store.health_check().await
    }
}

async fn notify_logged(notifier: &dyn Notifier, url: &Url) {
    if let Err(e) = notifier.notify(url).await {
        tracing::warn!("Webhook {} failed: {}", url, e);
    }
}

fn choice_key(choice: &Value) -> String {
    match choice {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

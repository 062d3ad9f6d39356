use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{postgres::PgRow, types::Json, FromRow, Row};
use uuid::Uuid;

/// A stored ballot, one row of the votes table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub id: Uuid,
    pub voter_id: String,
    pub vote: Vec<Value>,
    /// Legacy audit text: `IP=<address>,info:<info>`
    pub ip: String,
    pub client_ip: String,
    pub client_info: String,
    pub created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for VoteRecord {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let Json(vote): Json<Vec<Value>> = row.try_get("vote")?;
        Ok(Self {
            id: row.try_get("id")?,
            voter_id: row.try_get("voter_id")?,
            vote,
            ip: row.try_get("ip")?,
            client_ip: row.try_get("client_ip")?,
            client_info: row.try_get("client_info")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Ballot ready for insertion; id and timestamp are assigned by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewVote {
    pub voter_id: String,
    pub vote: Vec<Value>,
    pub client_ip: String,
    pub client_info: String,
}

impl NewVote {
    pub fn new(
        voter_id: impl Into<String>,
        vote: Vec<Value>,
        client_ip: impl Into<String>,
        client_info: impl Into<String>,
    ) -> Self {
        Self {
            voter_id: voter_id.into(),
            vote,
            client_ip: client_ip.into(),
            client_info: client_info.into(),
        }
    }

    /// Composite audit string kept in the `ip` column for older readers
    pub fn audit_ip(&self) -> String {
        format!("IP={},info:{}", self.client_ip, self.client_info)
    }

    pub fn into_record(self, id: Uuid, created_at: DateTime<Utc>) -> VoteRecord {
        let ip = self.audit_ip();
        VoteRecord {
            id,
            voter_id: self.voter_id,
            vote: self.vote,
            ip,
            client_ip: self.client_ip,
            client_info: self.client_info,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn audit_ip_merges_address_and_info() {
        let vote = NewVote::new("u1", vec![json!("a"), json!("b"), json!("c")], "1.2.3.4", "note");
        assert_eq!(vote.audit_ip(), "IP=1.2.3.4,info:note");
    }

    #[test]
    fn into_record_keeps_typed_columns() {
        let vote = NewVote::new("u1", vec![json!(1), json!(2), json!(3)], "10.0.0.1", "");
        let record = vote.into_record(Uuid::new_v4(), Utc::now());

        assert_eq!(record.ip, "IP=10.0.0.1,info:");
        assert_eq!(record.client_ip, "10.0.0.1");
        assert_eq!(record.client_info, "");
        assert_eq!(record.vote.len(), 3);
    }
}

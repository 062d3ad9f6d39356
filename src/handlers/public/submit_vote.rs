// handlers/public/submit_vote.rs - POST /api/submit_vote

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::middleware::ClientAddr;
use crate::services::Submission;
use crate::state::AppState;

/// Request body. Field names follow the browser page's payload.
#[derive(Debug, Deserialize)]
pub struct SubmitVoteRequest {
    #[serde(rename = "UID")]
    pub uid: String,
    /// Shape is checked by the vote service, not by deserialization
    pub vote: Value,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub info: Option<String>,
}

/**
 * POST /api/submit_vote - Record one ballot
 *
 * Expected Input:
 * ```json
 * {
 *   "UID": "string",              // voter identifier, not checked
 *   "vote": ["a", "b", "c"],      // exactly three choices
 *   "link": "https://...",        // called once after the ballot is stored
 *   "info": "string"              // optional free text
 * }
 * ```
 *
 * 200 with an empty body on success. 400 with `statusMessage` set to the
 * reason, or to the store's error code when the insert was refused.
 */
pub async fn submit_vote(
    State(state): State<AppState>,
    ClientAddr(client_ip): ClientAddr,
    payload: Result<Json<SubmitVoteRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(body) = payload?;

    state
        .votes
        .submit(Submission {
            voter_id: body.uid,
            vote: body.vote,
            link: body.link,
            info: body.info,
            client_ip,
        })
        .await?;

    Ok(StatusCode::OK)
}

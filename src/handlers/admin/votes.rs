use axum::{
    extract::{Extension, Query, State},
    response::Html,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::VoteSummary;
use crate::state::AppState;

const ADMIN_HTML: &str = include_str!("../../../assets/admin.html");

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 500;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /admin - gated by `admin_page_gate`
pub async fn admin_page() -> Html<&'static str> {
    Html(ADMIN_HTML)
}

/// GET /admin/api/votes - newest ballots first
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Value> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = query.offset.unwrap_or(0).max(0);

    let votes = state.votes.list(Some(limit), offset).await?;
    let total = state.votes.count().await?;

    tracing::debug!(admin = %user.subject, "Listed {} votes", votes.len());

    Ok(ApiResponse::success(json!({
        "total": total,
        "limit": limit,
        "offset": offset,
        "votes": votes
    })))
}

/// GET /admin/api/votes/summary
pub async fn summary(State(state): State<AppState>) -> ApiResult<VoteSummary> {
    let summary = state.votes.summary().await?;
    Ok(ApiResponse::success(summary))
}

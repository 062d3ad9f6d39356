use axum::{
    extract::{Request, State},
    http::{header::COOKIE, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::auth::{validate_jwt, Claims, ADMIN_COOKIE};
use crate::error::ApiError;
use crate::state::AppState;

pub const LOGIN_PATH: &str = "/admin/login";

/// Authenticated caller extracted from a JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub subject: String,
    pub role: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            subject: claims.sub,
            role: claims.role,
        }
    }
}

/// Guards `/admin/api/*`: 401 without a token, 403 for non-admin tokens
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = authenticate(&state, request.headers())?;
    if !claims.is_admin() {
        return Err(ApiError::forbidden("Admin access required"));
    }

    request.extensions_mut().insert(AuthUser::from(claims));
    Ok(next.run(request).await)
}

/// Guards the admin page itself; browsers without a session go to the login page
pub async fn admin_page_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    match authenticate(&state, request.headers()) {
        Ok(claims) if claims.is_admin() => next.run(request).await,
        _ => Redirect::to(LOGIN_PATH).into_response(),
    }
}

/// Applies only when the validation policy requires a session to vote
pub async fn vote_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !state.votes.policy().require_auth_for_votes {
        return Ok(next.run(request).await);
    }

    let claims = authenticate(&state, request.headers())?;
    request.extensions_mut().insert(AuthUser::from(claims));
    Ok(next.run(request).await)
}

fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Claims, ApiError> {
    let token = extract_token(headers)
        .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

    validate_jwt(&state.config.security, &token).map_err(|e| {
        tracing::debug!("Rejected token: {}", e);
        ApiError::unauthorized(e.to_string())
    })
}

/// Bearer token from `Authorization`, else the admin session cookie
fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == ADMIN_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

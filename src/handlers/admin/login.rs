// handlers/admin/login.rs - GET/POST /admin/login

use axum::{
    extract::{rejection::JsonRejection, State},
    http::header::SET_COOKIE,
    response::{Html, IntoResponse},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::auth::{generate_jwt, verify_admin_password, Claims, ADMIN_COOKIE, ADMIN_ROLE};
use crate::error::ApiError;
use crate::middleware::ApiResponse;
use crate::state::AppState;

const LOGIN_HTML: &str = include_str!("../../../assets/login.html");

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

/// GET /admin/login
pub async fn login_page() -> Html<&'static str> {
    Html(LOGIN_HTML)
}

/**
 * POST /admin/login - exchange the admin password for a session token
 *
 * The token comes back in the body (for scripts) and as an HttpOnly cookie
 * (for the admin page).
 */
pub async fn login_post(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = payload?;
    let security = &state.config.security;

    if security.admin_password.is_none() {
        tracing::warn!("Admin login attempted but no admin password is configured");
        return Err(ApiError::forbidden("Admin login is disabled"));
    }

    if !verify_admin_password(security, &body.password) {
        tracing::warn!("Admin login failed");
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let claims = Claims::new("admin", ADMIN_ROLE, security.jwt_expiry_hours);
    let token = generate_jwt(security, &claims).map_err(|e| {
        tracing::error!("Failed to issue admin token: {}", e);
        ApiError::internal_server_error("Failed to issue token")
    })?;

    let max_age = security.jwt_expiry_hours * 3600;
    let secure = if security.require_https { "; Secure" } else { "" };
    let cookie = format!(
        "{}={}; Path=/admin; HttpOnly; SameSite=Strict; Max-Age={}{}",
        ADMIN_COOKIE, token, max_age, secure
    );

    tracing::info!("Admin session issued");

    Ok((
        [(SET_COOKIE, cookie)],
        ApiResponse::success(json!({
            "token": token,
            "expires_in": max_age
        })),
    ))
}

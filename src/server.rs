use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::SecurityConfig;
use crate::handlers::{admin, public};
use crate::middleware::{
    admin_auth_middleware, admin_page_gate, rate_limit_middleware, security_headers_middleware,
    vote_auth_middleware,
};
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        // Public
        .route("/", get(public::index))
        .route("/health", get(public::health))
        .merge(vote_routes(&state))
        .merge(admin_routes(&state))
        // Global middleware
        .layer(DefaultBodyLimit::max(state.config.api.max_request_size_bytes))
        .layer(from_fn_with_state(state.clone(), security_headers_middleware));

    if state.config.security.enable_cors {
        router = router.layer(cors_layer(&state.config.security));
    }
    if state.config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn vote_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/submit_vote", post(public::submit_vote))
        .route_layer(from_fn_with_state(state.clone(), vote_auth_middleware))
        .route_layer(from_fn_with_state(state.clone(), rate_limit_middleware))
}

fn admin_routes(state: &AppState) -> Router<AppState> {
    let page = Router::new()
        .route("/admin", get(admin::admin_page))
        .route_layer(from_fn_with_state(state.clone(), admin_page_gate));

    let api = Router::new()
        .route("/admin/api/votes", get(admin::votes_list))
        .route("/admin/api/votes/summary", get(admin::votes_summary))
        .route_layer(from_fn_with_state(state.clone(), admin_auth_middleware));

    Router::new()
        .route("/admin/login", get(admin::login_page).post(admin::login_post))
        .merge(page)
        .merge(api)
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Serve until Ctrl-C. Peer addresses are exposed to handlers through `ConnectInfo`.
pub async fn serve(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    let app = app(state);
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{routing::get, Router};
use tokio::net::TcpListener;

use vote_api::config::{AppConfig, DispatchMode};
use vote_api::database::{DatabaseError, NewVote, VoteRecord, VoteStore};
use vote_api::services::HttpNotifier;
use vote_api::AppState;

pub const ADMIN_PASSWORD: &str = "correct horse battery staple";

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
}

/// Development preset tuned for deterministic tests
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.api.enable_request_logging = false;
    config.api.enable_rate_limiting = false;
    config.webhook.dispatch = DispatchMode::Await;
    config.webhook.allow_private_targets = true;
    config.webhook.timeout_ms = 1_000;
    config.security.admin_password = Some(ADMIN_PASSWORD.to_string());
    config
}

async fn bind_free_port() -> Result<(u16, TcpListener)> {
    // Pick an unused port for isolation
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("failed to bind 127.0.0.1:{}", port))?;
    Ok((port, listener))
}

/// Start the API in-process on its own port
pub async fn spawn_server(config: AppConfig, store: Arc<dyn VoteStore>) -> Result<TestServer> {
    let notifier = HttpNotifier::new(Duration::from_millis(config.webhook.timeout_ms))?;
    let state = AppState::new(config, store, Arc::new(notifier))?;

    let (port, listener) = bind_free_port().await?;
    tokio::spawn(async move {
        if let Err(e) = vote_api::serve(listener, state).await {
            eprintln!("test server stopped: {e}");
        }
    });

    Ok(TestServer {
        port,
        base_url: format!("http://127.0.0.1:{}", port),
    })
}

/// Counts GETs to `/hook`
pub struct HookReceiver {
    pub base_url: String,
    hits: Arc<AtomicUsize>,
}

impl HookReceiver {
    pub fn url(&self) -> String {
        format!("{}/hook", self.base_url)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

pub async fn spawn_hook_receiver() -> Result<HookReceiver> {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    let app = Router::new().route(
        "/hook",
        get(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                "ok"
            }
        }),
    );

    let (port, listener) = bind_free_port().await?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(HookReceiver {
        base_url: format!("http://127.0.0.1:{}", port),
        hits,
    })
}

/// Store double whose inserts always fail with a fixed code
pub struct FailingStore {
    pub code: &'static str,
}

#[async_trait]
impl VoteStore for FailingStore {
    async fn insert(&self, _vote: NewVote) -> Result<VoteRecord, DatabaseError> {
        Err(DatabaseError::Rejected {
            code: self.code.to_string(),
            message: "insert refused".to_string(),
        })
    }

    async fn insert_if_new_address(&self, vote: NewVote) -> Result<Option<VoteRecord>, DatabaseError> {
        self.insert(vote).await.map(Some)
    }

    async fn list(&self, _limit: Option<i64>, _offset: i64) -> Result<Vec<VoteRecord>, DatabaseError> {
        Ok(Vec::new())
    }

    async fn count(&self) -> Result<i64, DatabaseError> {
        Ok(0)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Err(DatabaseError::Sqlx(sqlx::Error::PoolTimedOut))
    }
}

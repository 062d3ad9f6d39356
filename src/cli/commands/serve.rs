use clap::Args;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::database::{MemoryVoteStore, PgVoteStore, VoteStore};
use crate::services::HttpNotifier;
use crate::state::AppState;

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[arg(long, help = "Port to listen on (overrides VOTE_API_PORT)")]
    pub port: Option<u16>,

    #[arg(long, help = "Keep votes in process memory instead of PostgreSQL")]
    pub memory: bool,

    #[arg(long, help = "Create the votes table before serving")]
    pub migrate: bool,
}

pub async fn handle(args: ServeArgs, mut config: AppConfig) -> anyhow::Result<()> {
    if let Some(port) = args.port {
        config.server.port = port;
    }

    tracing::info!("Starting Vote API in {:?} mode", config.environment);

    let store: Arc<dyn VoteStore> = if args.memory {
        tracing::warn!("Using in-memory vote store; votes are lost on restart");
        Arc::new(MemoryVoteStore::new())
    } else {
        let store = PgVoteStore::connect(&config.database).await?;
        if args.migrate {
            store.ensure_schema().await?;
        }
        Arc::new(store)
    };

    let notifier = HttpNotifier::new(Duration::from_millis(config.webhook.timeout_ms))?;

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let state = AppState::new(config, store, Arc::new(notifier))?;

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;

    tracing::info!("Vote API listening on http://{}", bind_addr);

    crate::server::serve(listener, state).await
}

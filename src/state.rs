use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::database::VoteStore;
use crate::middleware::RateLimiter;
use crate::services::{LinkPolicy, Notifier, VoteService};

/// Shared handles passed to every handler and middleware
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub votes: Arc<VoteService>,
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn VoteStore>, notifier: Arc<dyn Notifier>) -> anyhow::Result<Self> {
        let links = LinkPolicy::from_config(&config.webhook)?;
        let votes = VoteService::new(
            store,
            notifier,
            config.policy.clone(),
            links,
            config.webhook.dispatch,
        );
        let limiter = RateLimiter::new(
            config.api.rate_limit_requests,
            Duration::from_secs(config.api.rate_limit_window_secs),
        );

        Ok(Self {
            config: Arc::new(config),
            votes: Arc::new(votes),
            limiter: Arc::new(limiter),
        })
    }
}

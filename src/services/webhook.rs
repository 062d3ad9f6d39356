use async_trait::async_trait;
use std::net::IpAddr;
use std::time::Duration;
use thiserror::Error;
use url::{Host, Url};

use crate::config::{WebhookConfig, WebhookMode};

/// Why a webhook link was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("link is not a valid URL")]
    Invalid,

    #[error("link scheme '{0}' is not allowed")]
    Scheme(String),

    #[error("link has no host")]
    MissingHost,

    #[error("host '{0}' is not on the allow-list")]
    HostNotAllowed(String),

    #[error("host '{0}' is a private or loopback address")]
    PrivateTarget(String),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("webhook request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("webhook answered {0}")]
    Status(reqwest::StatusCode),
}

/// Sends the post-vote notification
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, link: &Url) -> Result<(), NotifyError>;
}

/// `reqwest`-backed notifier issuing a plain GET
pub struct HttpNotifier {
    client: reqwest::Client,
}

impl HttpNotifier {
    pub fn new(timeout: Duration) -> Result<Self, NotifyError> {
        // Redirects would let an allowed host bounce the call somewhere private
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("vote-api/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn notify(&self, link: &Url) -> Result<(), NotifyError> {
        let response = self.client.get(link.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status));
        }
        tracing::debug!(%status, "Webhook {} answered", link);
        Ok(())
    }
}

/// Decides which URL, if any, gets called after a vote is stored
#[derive(Debug, Clone, PartialEq)]
pub enum LinkPolicy {
    Disabled,
    Fixed(Url),
    Caller {
        allowed_hosts: Vec<String>,
        allow_private: bool,
    },
}

impl LinkPolicy {
    pub fn from_config(config: &WebhookConfig) -> anyhow::Result<Self> {
        Ok(match config.mode {
            WebhookMode::Disabled => LinkPolicy::Disabled,
            WebhookMode::Fixed => {
                let raw = config
                    .fixed_url
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("WEBHOOK_URL is required when WEBHOOK_MODE=fixed"))?;
                let url = Url::parse(raw).map_err(|e| anyhow::anyhow!("invalid WEBHOOK_URL '{}': {}", raw, e))?;
                LinkPolicy::Fixed(url)
            }
            WebhookMode::Caller => LinkPolicy::Caller {
                allowed_hosts: config
                    .allowed_hosts
                    .iter()
                    .map(|h| h.to_ascii_lowercase())
                    .collect(),
                allow_private: config.allow_private_targets,
            },
        })
    }

    /// Resolve the caller's `link` into the URL to notify.
    ///
    /// `Ok(None)` means no notification. An empty or missing caller link is
    /// not an error.
    pub fn resolve(&self, link: Option<&str>) -> Result<Option<Url>, LinkError> {
        match self {
            LinkPolicy::Disabled => Ok(None),
            LinkPolicy::Fixed(url) => Ok(Some(url.clone())),
            LinkPolicy::Caller { allowed_hosts, allow_private } => {
                let raw = match link.map(str::trim) {
                    Some(raw) if !raw.is_empty() => raw,
                    _ => return Ok(None),
                };
                let url = Url::parse(raw).map_err(|_| LinkError::Invalid)?;
                check_target(&url, allowed_hosts, *allow_private)?;
                Ok(Some(url))
            }
        }
    }
}

fn check_target(url: &Url, allowed_hosts: &[String], allow_private: bool) -> Result<(), LinkError> {
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(LinkError::Scheme(other.to_string())),
    }

    let host = url.host().ok_or(LinkError::MissingHost)?;
    let host_name = url.host_str().unwrap_or_default().to_ascii_lowercase();

    if !allowed_hosts.is_empty() && !allowed_hosts.iter().any(|h| *h == host_name) {
        return Err(LinkError::HostNotAllowed(host_name));
    }

    if allow_private {
        return Ok(());
    }

    let private = match host {
        Host::Ipv4(v4) => is_private_ip(IpAddr::V4(v4)),
        Host::Ipv6(v6) => is_private_ip(IpAddr::V6(v6)),
        Host::Domain(domain) => {
            let domain = domain.to_ascii_lowercase();
            domain == "localhost" || domain.ends_with(".localhost")
        }
    };

    if private {
        return Err(LinkError::PrivateTarget(host_name));
    }
    Ok(())
}

fn is_private_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let [a, b, ..] = v4.octets();
            v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
                // 100.64.0.0/10 carrier-grade NAT
                || (a == 100 && (b & 0xc0) == 64)
        }
        IpAddr::V6(v6) => {
            if let Some(v4) = v6.to_ipv4_mapped() {
                return is_private_ip(IpAddr::V4(v4));
            }
            let first = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                || (first & 0xfe00) == 0xfc00 // unique local
                || (first & 0xffc0) == 0xfe80 // link local
        }
    }
}

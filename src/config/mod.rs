use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub policy: ValidationPolicy,
    pub webhook: WebhookConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection string; taken from DATABASE_URL
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub votes_table: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_rate_limiting: bool,
    pub rate_limit_requests: u32,
    pub rate_limit_window_secs: u64,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub enable_security_headers: bool,
    pub require_https: bool,
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    /// Admin login is refused while this is unset
    pub admin_password: Option<String>,
}

/// Rules applied to every ballot before it reaches the store.
///
/// The rules changed between releases (IP dedup added then dropped, the info
/// string added later), so each of them is a switch rather than a code path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationPolicy {
    pub required_choices: usize,
    pub reject_duplicate_ip: bool,
    pub record_info: bool,
    pub require_auth_for_votes: bool,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            required_choices: 3,
            reject_duplicate_ip: false,
            record_info: true,
            require_auth_for_votes: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WebhookMode {
    /// Call whatever `link` the voter sent (subject to the target checks)
    Caller,
    /// Ignore the voter's link and call `WebhookConfig::fixed_url`
    Fixed,
    Disabled,
}

impl FromStr for WebhookMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "caller" => Ok(WebhookMode::Caller),
            "fixed" => Ok(WebhookMode::Fixed),
            "disabled" | "off" | "none" => Ok(WebhookMode::Disabled),
            other => Err(format!("unknown webhook mode '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchMode {
    /// Webhook call finishes before the response is sent
    Await,
    /// Webhook call is spawned and the response goes out immediately
    Background,
}

impl FromStr for DispatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "await" | "sync" => Ok(DispatchMode::Await),
            "background" | "spawn" => Ok(DispatchMode::Background),
            other => Err(format!("unknown dispatch mode '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub mode: WebhookMode,
    pub fixed_url: Option<String>,
    /// Empty means any public host is accepted
    pub allowed_hosts: Vec<String>,
    pub allow_private_targets: bool,
    pub timeout_ms: u64,
    pub dispatch: DispatchMode,
    /// Link the voting page sends along with each ballot
    pub page_link: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Some(port) = env::var("VOTE_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_VOTES_TABLE") {
            self.database.votes_table = v;
        }

        // API overrides
        if let Ok(v) = env::var("API_ENABLE_RATE_LIMITING") {
            self.api.enable_rate_limiting = v.parse().unwrap_or(self.api.enable_rate_limiting);
        }
        if let Ok(v) = env::var("API_RATE_LIMIT_REQUESTS") {
            self.api.rate_limit_requests = v.parse().unwrap_or(self.api.rate_limit_requests);
        }
        if let Ok(v) = env::var("API_RATE_LIMIT_WINDOW_SECS") {
            self.api.rate_limit_window_secs = v.parse().unwrap_or(self.api.rate_limit_window_secs);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = split_list(&v);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_HEADERS") {
            self.security.enable_security_headers = v.parse().unwrap_or(self.security.enable_security_headers);
        }
        if let Ok(v) = env::var("SECURITY_REQUIRE_HTTPS") {
            self.security.require_https = v.parse().unwrap_or(self.security.require_https);
        }
        if let Ok(v) = env::var("SECURITY_JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_ADMIN_PASSWORD") {
            self.security.admin_password = Some(v).filter(|p| !p.is_empty());
        }

        // Validation policy overrides
        if let Ok(v) = env::var("VOTE_REQUIRED_CHOICES") {
            self.policy.required_choices = v.parse().unwrap_or(self.policy.required_choices);
        }
        if let Ok(v) = env::var("VOTE_REJECT_DUPLICATE_IP") {
            self.policy.reject_duplicate_ip = v.parse().unwrap_or(self.policy.reject_duplicate_ip);
        }
        if let Ok(v) = env::var("VOTE_RECORD_INFO") {
            self.policy.record_info = v.parse().unwrap_or(self.policy.record_info);
        }
        if let Ok(v) = env::var("VOTE_REQUIRE_AUTH") {
            self.policy.require_auth_for_votes = v.parse().unwrap_or(self.policy.require_auth_for_votes);
        }

        // Webhook overrides
        if let Ok(v) = env::var("WEBHOOK_MODE") {
            match v.parse() {
                Ok(mode) => self.webhook.mode = mode,
                Err(e) => tracing::warn!("Ignoring WEBHOOK_MODE: {}", e),
            }
        }
        if let Ok(v) = env::var("WEBHOOK_URL") {
            self.webhook.fixed_url = Some(v).filter(|u| !u.is_empty());
        }
        if let Ok(v) = env::var("WEBHOOK_ALLOWED_HOSTS") {
            self.webhook.allowed_hosts = split_list(&v);
        }
        if let Ok(v) = env::var("WEBHOOK_ALLOW_PRIVATE_TARGETS") {
            self.webhook.allow_private_targets = v.parse().unwrap_or(self.webhook.allow_private_targets);
        }
        if let Ok(v) = env::var("WEBHOOK_TIMEOUT_MS") {
            self.webhook.timeout_ms = v.parse().unwrap_or(self.webhook.timeout_ms);
        }
        if let Ok(v) = env::var("WEBHOOK_DISPATCH") {
            match v.parse() {
                Ok(mode) => self.webhook.dispatch = mode,
                Err(e) => tracing::warn!("Ignoring WEBHOOK_DISPATCH: {}", e),
            }
        }
        if let Ok(v) = env::var("WEBHOOK_PAGE_LINK") {
            self.webhook.page_link = v;
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { port: 3000 },
            database: DatabaseConfig {
                url: None,
                max_connections: 5,
                connection_timeout: 30,
                votes_table: "votes".to_string(),
            },
            api: ApiConfig {
                enable_rate_limiting: false,
                rate_limit_requests: 5,
                rate_limit_window_secs: 60,
                enable_request_logging: true,
                max_request_size_bytes: 64 * 1024,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                enable_security_headers: true,
                require_https: false,
                jwt_secret: "development-secret-change-me".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                admin_password: None,
            },
            policy: ValidationPolicy::default(),
            webhook: WebhookConfig {
                mode: WebhookMode::Caller,
                fixed_url: None,
                allowed_hosts: Vec::new(),
                allow_private_targets: true,
                timeout_ms: 5_000,
                dispatch: DispatchMode::Await,
                page_link: String::new(),
            },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig { port: 3000 },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 10,
                votes_table: "votes".to_string(),
            },
            api: ApiConfig {
                enable_rate_limiting: true,
                rate_limit_requests: 5,
                rate_limit_window_secs: 60,
                enable_request_logging: true,
                max_request_size_bytes: 16 * 1024,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                enable_security_headers: true,
                require_https: true,
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                admin_password: None,
            },
            policy: ValidationPolicy::default(),
            webhook: WebhookConfig {
                mode: WebhookMode::Caller,
                fixed_url: None,
                allowed_hosts: Vec::new(),
                allow_private_targets: false,
                timeout_ms: 5_000,
                dispatch: DispatchMode::Await,
                page_link: String::new(),
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig { port: 3000 },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 5,
                votes_table: "votes".to_string(),
            },
            api: ApiConfig {
                enable_rate_limiting: true,
                rate_limit_requests: 5,
                rate_limit_window_secs: 60,
                enable_request_logging: false,
                max_request_size_bytes: 16 * 1024,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
                enable_security_headers: true,
                require_https: true,
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
                admin_password: None,
            },
            policy: ValidationPolicy::default(),
            webhook: WebhookConfig {
                mode: WebhookMode::Caller,
                fixed_url: None,
                allowed_hosts: Vec::new(),
                allow_private_targets: false,
                timeout_ms: 3_000,
                dispatch: DispatchMode::Background,
                page_link: String::new(),
            },
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert!(!config.api.enable_rate_limiting);
        assert!(config.webhook.allow_private_targets);
        assert_eq!(config.webhook.dispatch, DispatchMode::Await);
        assert_eq!(config.policy, ValidationPolicy::default());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(config.api.enable_rate_limiting);
        assert_eq!(config.api.rate_limit_requests, 5);
        assert_eq!(config.api.rate_limit_window_secs, 60);
        assert!(!config.webhook.allow_private_targets);
        assert!(config.security.jwt_secret.is_empty());
    }

    #[test]
    fn default_policy_matches_latest_rules() {
        let policy = ValidationPolicy::default();
        assert_eq!(policy.required_choices, 3);
        assert!(!policy.reject_duplicate_ip);
        assert!(policy.record_info);
        assert!(!policy.require_auth_for_votes);
    }

    #[test]
    fn parses_webhook_and_dispatch_modes() {
        assert_eq!("Caller".parse::<WebhookMode>().unwrap(), WebhookMode::Caller);
        assert_eq!("fixed".parse::<WebhookMode>().unwrap(), WebhookMode::Fixed);
        assert_eq!("off".parse::<WebhookMode>().unwrap(), WebhookMode::Disabled);
        assert!("sometimes".parse::<WebhookMode>().is_err());

        assert_eq!("background".parse::<DispatchMode>().unwrap(), DispatchMode::Background);
        assert_eq!(" await ".parse::<DispatchMode>().unwrap(), DispatchMode::Await);
    }

    #[test]
    fn splits_comma_lists() {
        assert_eq!(
            split_list("hooks.example.com, , api.example.org "),
            vec!["hooks.example.com".to_string(), "api.example.org".to_string()]
        );
    }
}

use axum::{
    extract::{Request, State},
    http::{
        header::{
            CONTENT_SECURITY_POLICY, REFERRER_POLICY, STRICT_TRANSPORT_SECURITY, X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS, X_XSS_PROTECTION,
        },
        HeaderName, HeaderValue,
    },
    middleware::Next,
    response::Response,
};

use crate::config::SecurityConfig;
use crate::state::AppState;

const CROSS_ORIGIN_OPENER_POLICY: HeaderName = HeaderName::from_static("cross-origin-opener-policy");
const CROSS_ORIGIN_RESOURCE_POLICY: HeaderName = HeaderName::from_static("cross-origin-resource-policy");

// No font-src directive: pages may pull fonts from anywhere
const CSP_BASE: &str = "base-uri 'none'; form-action 'self'; frame-ancestors 'self'; \
img-src 'self' data:; object-src 'none'; script-src-attr 'none'; style-src 'self' https: 'unsafe-inline'";

pub fn content_security_policy(security: &SecurityConfig) -> String {
    if security.require_https {
        format!("{}; upgrade-insecure-requests", CSP_BASE)
    } else {
        CSP_BASE.to_string()
    }
}

/// Adds the hardening headers to every response.
/// Cross-Origin-Embedder-Policy is left off so third-party embeds keep working.
pub async fn security_headers_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    let security = &state.config.security;
    if !security.enable_security_headers {
        return response;
    }

    let headers = response.headers_mut();
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("no-referrer"));
    headers.insert(X_XSS_PROTECTION, HeaderValue::from_static("0"));
    headers.insert(CROSS_ORIGIN_OPENER_POLICY, HeaderValue::from_static("same-origin"));
    headers.insert(CROSS_ORIGIN_RESOURCE_POLICY, HeaderValue::from_static("same-origin"));

    if let Ok(csp) = HeaderValue::from_str(&content_security_policy(security)) {
        headers.insert(CONTENT_SECURITY_POLICY, csp);
    }

    if security.require_https {
        headers.insert(
            STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=15552000; includeSubDomains"),
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn csp_omits_font_src() {
        let security = AppConfig::production().security;
        let csp = content_security_policy(&security);
        assert!(!csp.contains("font-src"));
        assert!(csp.ends_with("upgrade-insecure-requests"));
    }

    #[test]
    fn csp_skips_upgrade_over_plain_http() {
        let security = AppConfig::development().security;
        assert!(!content_security_policy(&security).contains("upgrade-insecure-requests"));
    }
}

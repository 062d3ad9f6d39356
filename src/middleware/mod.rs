pub mod auth;
pub mod client_ip;
pub mod rate_limit;
pub mod response;
pub mod security_headers;

pub use auth::{admin_auth_middleware, admin_page_gate, vote_auth_middleware, AuthUser};
pub use client_ip::{resolve_client_addr, ClientAddr};
pub use rate_limit::{rate_limit_middleware, RateLimiter};
pub use response::{ApiResponse, ApiResult};
pub use security_headers::security_headers_middleware;

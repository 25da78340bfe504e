//! Cross-origin policy for the browser UI.

use axum::http::{HeaderValue, Method};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tracing::warn;

const METHODS: [Method; 7] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::OPTIONS,
    Method::HEAD,
];

#[derive(Clone, Debug)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:5173".to_string()],
            allow_credentials: true,
        }
    }
}

/// Build the CORS layer. Request headers are mirrored so CSRF tokens and
/// other custom headers pass preflight.
///
/// A `*` origin allows any origin but cannot be combined with credentials;
/// credentials are dropped in that case.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let wildcard = config.allowed_origins.iter().any(|o| o.trim() == "*");

    let (origin, credentials) = if wildcard {
        if config.allow_credentials {
            warn!("wildcard CORS origin configured, disabling credentials");
        }
        (AllowOrigin::any(), false)
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %origin, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        (AllowOrigin::list(origins), config.allow_credentials)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(METHODS.to_vec())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(credentials)
}

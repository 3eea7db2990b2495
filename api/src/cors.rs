use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

const LOCAL_ORIGIN_PREFIXES: [&str; 2] = ["http://localhost", "http://127.0.0.1"];

/// Which browser origins may call the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginPolicy {
    /// No allow-list configured.
    AllowAny,
    /// Listed origins, plus anything served from localhost or 127.0.0.1.
    AllowList(Vec<String>),
}

impl OriginPolicy {
    pub fn from_config(origins: Option<Vec<String>>) -> Self {
        match origins {
            Some(list) => OriginPolicy::AllowList(list),
            None => OriginPolicy::AllowAny,
        }
    }

    pub fn is_allowed(&self, origin: &str) -> bool {
        match self {
            OriginPolicy::AllowAny => true,
            OriginPolicy::AllowList(list) => {
                LOCAL_ORIGIN_PREFIXES.iter().any(|p| origin.starts_with(p))
                    || list.iter().any(|allowed| allowed == origin)
            }
        }
    }
}

/// The request's origin is echoed back rather than `*`, since credentials are allowed.
pub fn cors_layer(policy: OriginPolicy) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin.to_str().map(|o| policy.is_allowed(o)).unwrap_or(false)
        }))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
        ])
        .expose_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(12 * 60 * 60))
}

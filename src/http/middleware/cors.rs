//! CORS header injection.
//! Answers preflight requests and decorates every other response.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::CorsConfig;

/// Precomputed header values for a `CorsConfig`.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    any_origin: bool,
    origins: HashSet<String>,
    allow_methods: Option<HeaderValue>,
    allow_headers: Option<HeaderValue>,
}

impl CorsPolicy {
    pub fn from_config(config: &CorsConfig) -> Self {
        Self {
            any_origin: config.allowed_origins.iter().any(|o| o == "*"),
            origins: config.allowed_origins.iter().cloned().collect(),
            allow_methods: HeaderValue::from_str(&config.allowed_methods.join(", ")).ok(),
            allow_headers: HeaderValue::from_str(&config.allowed_headers.join(", ")).ok(),
        }
    }

    fn allows(&self, origin: &HeaderValue) -> bool {
        self.any_origin || origin.to_str().is_ok_and(|o| self.origins.contains(o))
    }

    /// Add CORS headers without overriding any the response already carries.
    fn apply(&self, origin: Option<&HeaderValue>, headers: &mut HeaderMap) {
        match origin {
            Some(origin) if self.allows(origin) => {
                headers
                    .entry(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                    .or_insert_with(|| origin.clone());
                headers
                    .entry(header::VARY)
                    .or_insert(HeaderValue::from_static("Origin"));
            }
            None if self.any_origin => {
                headers
                    .entry(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                    .or_insert(HeaderValue::from_static("*"));
            }
            _ => {}
        }

        if let Some(methods) = &self.allow_methods {
            headers
                .entry(header::ACCESS_CONTROL_ALLOW_METHODS)
                .or_insert_with(|| methods.clone());
        }
        if let Some(allowed) = &self.allow_headers {
            headers
                .entry(header::ACCESS_CONTROL_ALLOW_HEADERS)
                .or_insert_with(|| allowed.clone());
        }
    }
}

/// Preflight `OPTIONS` requests are answered with 204 and never reach the router.
pub async fn cors_middleware(
    State(policy): State<Arc<CorsPolicy>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let origin = request.headers().get(header::ORIGIN).cloned();

    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };

    policy.apply(origin.as_ref(), response.headers_mut());
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(origins: &[&str]) -> CorsPolicy {
        CorsPolicy::from_config(&CorsConfig {
            allowed_origins: origins.iter().map(|o| o.to_string()).collect(),
            ..CorsConfig::default()
        })
    }

    #[test]
    fn test_wildcard_echoes_origin() {
        let mut headers = HeaderMap::new();
        policy(&["*"]).apply(Some(&HeaderValue::from_static("http://app.local")), &mut headers);

        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "http://app.local");
        assert_eq!(headers[header::VARY], "Origin");
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_METHODS],
            "GET, POST, PUT, DELETE, OPTIONS"
        );
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type, Authorization");
    }

    #[test]
    fn test_unlisted_origin_not_allowed() {
        let mut headers = HeaderMap::new();
        policy(&["http://a.local"]).apply(Some(&HeaderValue::from_static("http://b.local")), &mut headers);

        assert!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
        assert!(headers.get(header::ACCESS_CONTROL_ALLOW_METHODS).is_some());
    }

    #[test]
    fn test_listed_origin_allowed() {
        let mut headers = HeaderMap::new();
        policy(&["http://a.local"]).apply(Some(&HeaderValue::from_static("http://a.local")), &mut headers);

        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "http://a.local");
    }

    #[test]
    fn test_existing_headers_win() {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("https://mapped"));
        policy(&["*"]).apply(Some(&HeaderValue::from_static("http://app.local")), &mut headers);

        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "https://mapped");
    }
}

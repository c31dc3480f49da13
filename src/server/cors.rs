use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, ACCESS_CONTROL_REQUEST_HEADERS,
    ACCESS_CONTROL_REQUEST_METHOD, ORIGIN, VARY,
};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::debug;

const DEFAULT_ALLOWED_METHODS: &str = "GET, POST, OPTIONS";
const PREFLIGHT_MAX_AGE_SECS: &str = "600";

/// Credentialed CORS restricted to an exact origin allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    allowed_origins: Vec<String>,
}

impl CorsPolicy {
    pub fn new<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed_origins: origins
                .into_iter()
                .map(|origin| origin.as_ref().trim_end_matches('/').to_string())
                .collect(),
        }
    }

    pub fn allows(&self, origin: &HeaderValue) -> bool {
        origin
            .to_str()
            .map(|origin| self.allowed_origins.iter().any(|allowed| allowed == origin))
            .unwrap_or(false)
    }
}

fn allow_origin(headers: &mut HeaderMap, origin: HeaderValue) {
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(
        ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.append(VARY, HeaderValue::from_static("Origin"));
}

fn is_preflight(request: &Request) -> bool {
    *request.method() == Method::OPTIONS
        && request.headers().contains_key(ACCESS_CONTROL_REQUEST_METHOD)
}

/// Any method is allowed, so the requested one is echoed back.
fn preflight_response(
    origin: HeaderValue,
    requested_method: Option<HeaderValue>,
    requested_headers: Option<HeaderValue>,
) -> Response {
    let mut response = StatusCode::OK.into_response();
    let headers = response.headers_mut();
    allow_origin(headers, origin);
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        requested_method.unwrap_or_else(|| HeaderValue::from_static(DEFAULT_ALLOWED_METHODS)),
    );
    if let Some(requested) = requested_headers {
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, requested);
    }
    headers.insert(
        ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static(PREFLIGHT_MAX_AGE_SECS),
    );
    response
}

pub async fn apply(
    State(policy): State<Arc<CorsPolicy>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(origin) = request.headers().get(ORIGIN).cloned() else {
        return next.run(request).await;
    };
    let allowed = policy.allows(&origin);

    if is_preflight(&request) {
        if !allowed {
            debug!(origin = ?origin, "rejected CORS preflight");
            return (StatusCode::BAD_REQUEST, "Disallowed CORS origin").into_response();
        }
        let requested_method = request.headers().get(ACCESS_CONTROL_REQUEST_METHOD).cloned();
        let requested_headers = request.headers().get(ACCESS_CONTROL_REQUEST_HEADERS).cloned();
        return preflight_response(origin, requested_method, requested_headers);
    }

    let mut response = next.run(request).await;
    if allowed {
        allow_origin(response.headers_mut(), origin);
    }
    response
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use axum::http::header::ACCESS_CONTROL_ALLOW_METHODS;

    use super::{CorsPolicy, preflight_response};

    #[test]
    fn allows_only_exact_origins() {
        let policy = CorsPolicy::new(["http://localhost:3000", "https://ask.example/"]);

        assert!(policy.allows(&HeaderValue::from_static("http://localhost:3000")));
        assert!(policy.allows(&HeaderValue::from_static("https://ask.example")));
        assert!(!policy.allows(&HeaderValue::from_static("http://localhost:3001")));
        assert!(!policy.allows(&HeaderValue::from_static("https://evil.example")));
    }

    #[test]
    fn preflight_echoes_requested_method() {
        let response = preflight_response(
            HeaderValue::from_static("http://localhost:3000"),
            Some(HeaderValue::from_static("DELETE")),
            None,
        );

        assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_METHODS], "DELETE");
    }
}

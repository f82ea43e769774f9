//! Same-origin RSS relay endpoint.
//!
//! `GET /api/rss?url=<encoded>` forwards a feed request on behalf of the
//! browser and answers with permissive CORS headers. The hostname allow-list
//! is a security boundary: a disallowed target is rejected with 403 before
//! any outbound request is made.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use url::Url;

use super::{error::ApiError, AppState};
use crate::feeds::FetchError;

/// News hosts the relay will forward to; subdomains count.
pub const ALLOWED_FEED_DOMAINS: [&str; 7] = [
    "elementy.ru",
    "ria.ru",
    "rg.ru",
    "gazeta.ru",
    "lenta.ru",
    "jinr.ru",
    "nplus1.ru",
];

pub fn is_allowed_host(host: &str) -> bool {
    ALLOWED_FEED_DOMAINS
        .iter()
        .any(|domain| host == *domain || host.ends_with(&format!(".{}", domain)))
}

/// Validate the `url` parameter without touching the network.
pub fn validate_target(raw: Option<&str>) -> Result<Url, ApiError> {
    let raw = raw.ok_or_else(|| ApiError::BadRequest("missing url parameter".to_string()))?;
    let target =
        Url::parse(raw).map_err(|e| ApiError::BadRequest(format!("invalid url: {}", e)))?;
    let host = target
        .host_str()
        .ok_or_else(|| ApiError::BadRequest("url has no host".to_string()))?;
    if !is_allowed_host(host) {
        return Err(ApiError::Forbidden);
    }
    Ok(target)
}

#[derive(Debug, Deserialize)]
pub struct RelayQuery {
    url: Option<String>,
}

pub async fn relay(State(app): State<Arc<AppState>>, Query(query): Query<RelayQuery>) -> Response {
    let target = match validate_target(query.url.as_deref()) {
        Ok(target) => target,
        Err(e) => return e.into_response(),
    };

    let fetcher = app.fetcher.clone();
    let timeout = app.relay_timeout;
    let fetched = tokio::task::spawn_blocking(move || fetcher.fetch(target.as_str(), timeout)).await;

    match fetched {
        Ok(Ok(body)) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/xml; charset=utf-8"),
                (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            ],
            body,
        )
            .into_response(),
        Ok(Err(FetchError::Timeout)) => ApiError::UpstreamTimeout.into_response(),
        Ok(Err(FetchError::Status(code))) => {
            // Pass the upstream failure status through to the caller
            let status =
                StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_GATEWAY);
            (status, Json(json!({ "error": "upstream request failed" }))).into_response()
        }
        Ok(Err(FetchError::Transport(message))) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "error": message })),
        )
            .into_response(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

/// CORS preflight for the relay.
pub async fn preflight() -> Response {
    (
        StatusCode::NO_CONTENT,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "GET, OPTIONS"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "*"),
        ],
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::FeedFetcher;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingFetcher {
        calls: AtomicUsize,
    }

    impl FeedFetcher for CountingFetcher {
        fn fetch(&self, _url: &str, _timeout: Duration) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("<rss/>".to_string())
        }
    }

    #[test]
    fn test_allow_list_covers_subdomains_only() {
        assert!(is_allowed_host("lenta.ru"));
        assert!(is_allowed_host("www.jinr.ru"));
        assert!(is_allowed_host("rss.elementy.ru"));
        assert!(!is_allowed_host("evil.example.com"));
        assert!(!is_allowed_host("notlenta.ru"));
        assert!(!is_allowed_host("lenta.ru.evil.example"));
    }

    #[test]
    fn test_validate_rejects_missing_and_malformed() {
        assert!(matches!(
            validate_target(None),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            validate_target(Some("not a url")),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            validate_target(Some("https://evil.example.com/rss")),
            Err(ApiError::Forbidden)
        ));
        assert!(validate_target(Some("https://lenta.ru/rss")).is_ok());
    }

    #[tokio::test]
    async fn test_disallowed_target_makes_no_outbound_call() {
        let fetcher = Arc::new(CountingFetcher {
            calls: AtomicUsize::new(0),
        });
        let dir = tempfile::tempdir().unwrap();
        let app = AppState::for_tests(&dir, fetcher.clone());

        let response = relay(
            State(app),
            Query(RelayQuery {
                url: Some("https://evil.example.com/rss".to_string()),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_allowed_target_is_fetched_with_cors() {
        let fetcher = Arc::new(CountingFetcher {
            calls: AtomicUsize::new(0),
        });
        let dir = tempfile::tempdir().unwrap();
        let app = AppState::for_tests(&dir, fetcher.clone());

        let response = relay(
            State(app),
            Query(RelayQuery {
                url: Some("https://lenta.ru/rss".to_string()),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "*"
        );
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }
}

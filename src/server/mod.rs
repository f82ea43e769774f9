//! HTTP surface of the kiosk: the RSS relay, the ticker snapshot, route
//! planning and CRUD over the content partitions.

pub mod content;
pub mod error;
pub mod relay;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::Config;
use crate::feeds::{FeedChain, FeedFetcher, HttpFetcher, Ticker};
use crate::session::SessionGate;
use crate::store::{Store, SystemSettings};

/// Shared state behind every handler.
pub struct AppState {
    pub store: Arc<Store>,
    pub chain: Arc<FeedChain>,
    pub ticker: Arc<Ticker>,
    pub fetcher: Arc<dyn FeedFetcher>,
    pub sessions: SessionGate,
    pub relay_timeout: Duration,
}

impl AppState {
    pub fn new(config: &Config) -> Arc<Self> {
        let fetcher: Arc<dyn FeedFetcher> = Arc::new(HttpFetcher);
        let timeout = Duration::from_secs(config.feeds.fetch_timeout_secs);

        let seed_settings = SystemSettings {
            idle_timeout: config.kiosk.idle_timeout_ms,
            ..SystemSettings::default()
        };

        Arc::new(Self {
            store: Arc::new(Store::with_seed_settings(config.db_path.clone(), seed_settings)),
            chain: Arc::new(FeedChain::with_fetcher(
                config.feeds.relay_base.clone(),
                config.feeds.public_relays.clone(),
                timeout,
                fetcher.clone(),
            )),
            ticker: Arc::new(Ticker::default()),
            fetcher,
            sessions: SessionGate::new(config.data_dir()),
            relay_timeout: timeout,
        })
    }

    #[cfg(test)]
    pub(crate) fn for_tests(
        dir: &tempfile::TempDir,
        fetcher: Arc<dyn FeedFetcher>,
    ) -> Arc<Self> {
        let timeout = Duration::from_secs(1);
        Arc::new(Self {
            store: Arc::new(Store::new(dir.path().join("kiosk.db"))),
            chain: Arc::new(FeedChain::with_fetcher(
                None,
                Vec::new(),
                timeout,
                fetcher.clone(),
            )),
            ticker: Arc::new(Ticker::default()),
            fetcher,
            sessions: SessionGate::new(dir.path().to_path_buf()),
            relay_timeout: timeout,
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/rss", get(relay::relay).options(relay::preflight))
        .route("/api/ticker", get(content::ticker))
        .route("/api/route", get(content::route_plan))
        .route("/api/pois", get(content::list_pois).post(content::put_poi))
        .route(
            "/api/pois/:id",
            get(content::get_poi)
                .put(content::update_poi)
                .delete(content::delete_poi),
        )
        .route("/api/news", get(content::list_news).post(content::put_news))
        .route(
            "/api/news/:id",
            get(content::get_news)
                .put(content::update_news)
                .delete(content::delete_news),
        )
        .route(
            "/api/media",
            get(content::list_media).post(content::put_media),
        )
        .route(
            "/api/media/:id",
            get(content::get_media)
                .put(content::update_media)
                .delete(content::delete_media),
        )
        .route(
            "/api/albums",
            get(content::list_albums).post(content::put_album),
        )
        .route(
            "/api/albums/:id",
            get(content::get_album)
                .put(content::update_album)
                .delete(content::delete_album),
        )
        .route(
            "/api/icons",
            get(content::list_icons).post(content::put_icon),
        )
        .route(
            "/api/icons/:id",
            get(content::get_icon).delete(content::delete_icon),
        )
        .route(
            "/api/feeds",
            get(content::list_feeds).post(content::put_feed),
        )
        .route(
            "/api/feeds/:id",
            get(content::get_feed).delete(content::delete_feed),
        )
        .route(
            "/api/settings/system",
            get(content::get_system_settings).put(content::put_system_settings),
        )
        .route(
            "/api/settings/timer",
            get(content::get_timer_settings).put(content::put_timer_settings),
        )
        .route("/api/login", post(content::login))
        .route("/api/logout", post(content::logout))
        .route("/api/session", get(content::session_state))
        .route("/api/store/reset", post(content::reset_store))
        .with_state(state)
}

/// Bind and serve until ctrl-c.
pub async fn serve(config: &Config, state: Arc<AppState>) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::FetchError;

    struct NoopFetcher;

    impl FeedFetcher for NoopFetcher {
        fn fetch(&self, _url: &str, _timeout: Duration) -> Result<String, FetchError> {
            Err(FetchError::Status(500))
        }
    }

    #[tokio::test]
    async fn test_router_builds() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::for_tests(&dir, Arc::new(NoopFetcher));
        let _ = router(state);
    }
}

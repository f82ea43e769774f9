//! Cross-origin feed retrieval with layered relay fallback.
//!
//! Kiosk deployments sit behind networks where a direct fetch of a remote
//! feed usually fails, so retrieval walks a fixed ladder: the same-origin
//! relay (when configured), then each public CORS relay in order, then a
//! direct fetch as a last resort. Stages run strictly one after another —
//! racing the relays in parallel would burn their rate limits on every
//! refresh cycle.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("upstream returned HTTP {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(String),
}

/// One outbound HTTP GET. Implemented by the real `ureq` client and by test
/// doubles; everything above the fetcher is deterministic.
pub trait FeedFetcher: Send + Sync {
    /// Fetch `url`, returning the body text on HTTP 2xx.
    fn fetch(&self, url: &str, timeout: Duration) -> Result<String, FetchError>;
}

/// `ureq`-backed fetcher used in production.
pub struct HttpFetcher;

impl FeedFetcher for HttpFetcher {
    fn fetch(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        match agent.get(url).call() {
            Ok(response) => response
                .into_string()
                .map_err(|e| FetchError::Transport(e.to_string())),
            Err(ureq::Error::Status(code, _)) => Err(FetchError::Status(code)),
            Err(ureq::Error::Transport(t)) => {
                let message = t.to_string();
                if message.contains("timed out") {
                    Err(FetchError::Timeout)
                } else {
                    Err(FetchError::Transport(message))
                }
            }
        }
    }
}

/// The retrieval ladder for one feed URL.
pub struct FeedChain {
    fetcher: Arc<dyn FeedFetcher>,
    relay_base: Option<String>,
    public_relays: Vec<String>,
    timeout: Duration,
}

impl FeedChain {
    pub fn new(relay_base: Option<String>, public_relays: Vec<String>, timeout: Duration) -> Self {
        Self::with_fetcher(relay_base, public_relays, timeout, Arc::new(HttpFetcher))
    }

    pub fn with_fetcher(
        relay_base: Option<String>,
        public_relays: Vec<String>,
        timeout: Duration,
        fetcher: Arc<dyn FeedFetcher>,
    ) -> Self {
        Self {
            fetcher,
            relay_base,
            public_relays,
            timeout,
        }
    }

    /// Walk the stages in order and return the first body retrieved, or
    /// `None` when every stage failed (the caller skips the feed).
    pub fn fetch_feed(&self, feed_url: &str) -> Option<String> {
        let stages = self.stage_urls(feed_url);
        let total = stages.len();
        for (index, stage_url) in stages.iter().enumerate() {
            match self.fetcher.fetch(stage_url, self.timeout) {
                Ok(body) => {
                    debug!(
                        "Feed {} retrieved via stage {}/{}",
                        feed_url,
                        index + 1,
                        total
                    );
                    return Some(body);
                }
                Err(e) => {
                    warn!(
                        "Feed {} stage {}/{} failed: {}",
                        feed_url,
                        index + 1,
                        total,
                        e
                    );
                }
            }
        }
        None
    }

    /// Stage URLs in attempt order: relay endpoint, public relays, direct.
    fn stage_urls(&self, feed_url: &str) -> Vec<String> {
        let encoded: String = url::form_urlencoded::byte_serialize(feed_url.as_bytes()).collect();

        let mut stages = Vec::with_capacity(self.public_relays.len() + 2);
        if let Some(base) = &self.relay_base {
            stages.push(format!(
                "{}/api/rss?url={}",
                base.trim_end_matches('/'),
                encoded
            ));
        }
        for template in &self.public_relays {
            stages.push(template.replace("{url}", &encoded));
        }
        stages.push(feed_url.to_string());
        stages
    }
}

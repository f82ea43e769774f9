//! Ticker assembly: pool items across feeds, sort, cap, degrade gracefully.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{info, warn};

use super::chain::FeedChain;
use super::parse::parse_items;
use crate::store::{RssFeed, Store};

/// Final item cap across all feeds.
pub const TICKER_CAP: usize = 10;

/// The single synthetic headline shown when every feed and every fallback
/// stage failed. Deliberate user-visible degradation, not a silent failure.
pub const NEWS_UNAVAILABLE_MESSAGE: &str = "News could not be loaded right now";

/// One headline in the ticker crawl.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerItem {
    pub title: String,
    pub link: String,
    pub published: DateTime<Utc>,
    /// Display name of the feed the item came from.
    pub source: String,
}

pub fn fallback_item() -> TickerItem {
    TickerItem {
        title: NEWS_UNAVAILABLE_MESSAGE.to_string(),
        link: String::new(),
        published: Utc::now(),
        source: "system".to_string(),
    }
}

/// Run the retrieval chain over `feeds` and assemble the ticker: per-feed
/// parse (already capped per feed), pooled, newest first, capped again.
/// An empty pool collapses to the single fallback item.
pub fn collect(chain: &FeedChain, feeds: &[RssFeed]) -> Vec<TickerItem> {
    let mut pool: Vec<TickerItem> = Vec::new();

    for feed in feeds {
        let Some(body) = chain.fetch_feed(&feed.url) else {
            continue;
        };
        match parse_items(&body) {
            Ok(items) => {
                pool.extend(items.into_iter().map(|item| TickerItem {
                    title: item.title,
                    link: item.link,
                    published: item.published,
                    source: feed.name.clone(),
                }));
            }
            Err(e) => warn!("Feed {} returned unparsable XML: {}", feed.url, e),
        }
    }

    if pool.is_empty() {
        return vec![fallback_item()];
    }

    pool.sort_by(|a, b| b.published.cmp(&a.published));
    pool.truncate(TICKER_CAP);
    pool
}

/// Latest ticker snapshot, shared between the refresh task and the HTTP
/// handlers.
pub struct Ticker {
    items: RwLock<Vec<TickerItem>>,
    refreshed_at: RwLock<Option<DateTime<Utc>>>,
}

impl Default for Ticker {
    fn default() -> Self {
        Self {
            items: RwLock::new(vec![fallback_item()]),
            refreshed_at: RwLock::new(None),
        }
    }
}

impl Ticker {
    pub fn current(&self) -> Vec<TickerItem> {
        self.items
            .read()
            .map(|items| items.clone())
            .unwrap_or_else(|_| vec![fallback_item()])
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at.read().ok().and_then(|at| *at)
    }

    pub fn replace(&self, items: Vec<TickerItem>) {
        if let Ok(mut slot) = self.items.write() {
            *slot = items;
        }
        if let Ok(mut at) = self.refreshed_at.write() {
            *at = Some(Utc::now());
        }
    }
}

/// One refresh pass: active feeds from the store, chain, snapshot swap.
/// A store failure degrades to "no feeds", which degrades to the fallback
/// item — the ticker never crashes the kiosk.
pub async fn refresh_once(store: &Store, chain: &Arc<FeedChain>, ticker: &Ticker) {
    let feeds = match store.db().await {
        Ok(db) => db.feeds_by_active(true).unwrap_or_default(),
        Err(e) => {
            warn!("Ticker refresh could not reach the store: {}", e);
            Vec::new()
        }
    };

    let chain = chain.clone();
    let items = tokio::task::spawn_blocking(move || collect(&chain, &feeds))
        .await
        .unwrap_or_else(|_| vec![fallback_item()]);

    info!("Ticker refreshed with {} item(s)", items.len());
    ticker.replace(items);
}

/// Periodic refresh loop, spawned at server start.
pub async fn run_refresh_loop(
    store: Arc<Store>,
    chain: Arc<FeedChain>,
    ticker: Arc<Ticker>,
    interval: Duration,
) {
    loop {
        refresh_once(&store, &chain, &ticker).await;
        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::chain::{FeedFetcher, FetchError};
    use std::sync::Mutex;
    use std::time::Duration;

    struct CannedFetcher {
        bodies: Mutex<Vec<Result<String, ()>>>,
    }

    impl FeedFetcher for CannedFetcher {
        fn fetch(&self, _url: &str, _timeout: Duration) -> Result<String, FetchError> {
            let mut bodies = self.bodies.lock().unwrap();
            if bodies.is_empty() {
                return Err(FetchError::Status(500));
            }
            bodies.remove(0).map_err(|_| FetchError::Status(500))
        }
    }

    fn direct_chain(bodies: Vec<Result<String, ()>>) -> FeedChain {
        FeedChain::with_fetcher(
            None,
            Vec::new(),
            Duration::from_secs(1),
            Arc::new(CannedFetcher {
                bodies: Mutex::new(bodies),
            }),
        )
    }

    fn feed(name: &str) -> RssFeed {
        RssFeed {
            id: name.to_string(),
            name: name.to_string(),
            url: format!("https://{}.example/rss", name),
            active: true,
        }
    }

    fn rss(items: &[(&str, &str)]) -> String {
        let mut body = String::from("<rss><channel>");
        for (title, date) in items {
            body.push_str(&format!(
                "<item><title>{}</title><link>https://x</link><pubDate>{}</pubDate></item>",
                title, date
            ));
        }
        body.push_str("</channel></rss>");
        body
    }

    #[test]
    fn test_merges_and_sorts_newest_first() {
        let chain = direct_chain(vec![
            Ok(rss(&[("Old", "Mon, 02 Mar 2026 08:00:00 +0000")])),
            Ok(rss(&[("New", "Tue, 03 Mar 2026 08:00:00 +0000")])),
        ]);
        let items = collect(&chain, &[feed("alpha"), feed("beta")]);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "New");
        assert_eq!(items[0].source, "beta");
        assert_eq!(items[1].title, "Old");
    }

    #[test]
    fn test_caps_pooled_items() {
        let many: Vec<(String, String)> = (0..10)
            .map(|i| {
                (
                    format!("Item {}", i),
                    format!("Mon, 02 Mar 2026 08:{:02}:00 +0000", i),
                )
            })
            .collect();
        let pairs: Vec<(&str, &str)> = many
            .iter()
            .map(|(t, d)| (t.as_str(), d.as_str()))
            .collect();
        let chain = direct_chain(vec![Ok(rss(&pairs)), Ok(rss(&pairs))]);

        let items = collect(&chain, &[feed("alpha"), feed("beta")]);
        assert_eq!(items.len(), TICKER_CAP);
    }

    #[test]
    fn test_failed_feed_is_skipped_not_fatal() {
        let chain = direct_chain(vec![
            Err(()),
            Ok(rss(&[("Survivor", "Mon, 02 Mar 2026 08:00:00 +0000")])),
        ]);
        let items = collect(&chain, &[feed("broken"), feed("alive")]);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Survivor");
    }

    #[test]
    fn test_total_failure_yields_single_fallback_item() {
        let chain = direct_chain(vec![Err(()), Err(())]);
        let items = collect(&chain, &[feed("alpha"), feed("beta")]);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, NEWS_UNAVAILABLE_MESSAGE);
    }

    #[test]
    fn test_no_feeds_yields_fallback_item() {
        let chain = direct_chain(Vec::new());
        let items = collect(&chain, &[]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, NEWS_UNAVAILABLE_MESSAGE);
    }
}

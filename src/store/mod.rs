//! Partitioned local store backing the kiosk content.
//!
//! Seven partitions live in one SQLite file: pois, news, media, albums,
//! icons, feeds and settings. Each partition is keyed by a string id and
//! carries the secondary indexes the kiosk pages filter on. The store owns
//! all derived state: album item counts are recomputed whenever media rows
//! touch an album, and album deletion cascades over its media in one
//! transaction.

mod schema;
pub mod albums;
pub mod feeds;
pub mod icons;
pub mod media;
pub mod news;
pub mod pois;
pub mod settings;
pub mod sqlite;

pub use albums::{Album, AlbumType};
pub use feeds::RssFeed;
pub use icons::MarkerIcon;
pub use media::{MediaCategory, MediaItem, MediaType};
pub use news::NewsItem;
pub use pois::{Poi, PoiCategory};
pub use settings::{EventTimer, OrganizationInfo, SystemSettings, TimerSettings};
pub use sqlite::SqliteDb;

use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// How long a database open may take before it is treated as failed.
pub const INIT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database is not available: {0}")]
    Unavailable(String),

    #[error("database initialization timed out after {0:?}")]
    InitTimeout(Duration),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Assign an id for a record that was stored without one.
///
/// Mirrors the kiosk's historical id scheme: the current epoch time in
/// milliseconds as a decimal string. Not unique under concurrent writers
/// within one millisecond; callers that need distinct ids in a tight loop
/// supply their own.
pub(crate) fn next_record_id() -> String {
    Utc::now().timestamp_millis().to_string()
}

/// Current time as an RFC 3339 string, the format all entity timestamps use.
pub(crate) fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

enum InitState {
    Closed,
    Ready(Arc<SqliteDb>),
    Failed(String),
}

/// Process-lifetime handle to the kiosk database.
///
/// The underlying SQLite handle is opened lazily on first use. Concurrent
/// callers racing into `db()` share a single in-flight open rather than
/// opening the file twice. A failed open is cached so later calls fail fast
/// instead of repeating the expensive attempt; `reset()` clears the cached
/// failure (and any open handle) and permits a fresh open.
pub struct Store {
    path: PathBuf,
    seed_settings: SystemSettings,
    state: tokio::sync::Mutex<InitState>,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_seed_settings(path, SystemSettings::default())
    }

    /// Like `new`, but seeds the settings singleton from `settings` on a
    /// first run instead of the built-in defaults.
    pub fn with_seed_settings(path: impl Into<PathBuf>, settings: SystemSettings) -> Self {
        Self {
            path: path.into(),
            seed_settings: settings,
            state: tokio::sync::Mutex::new(InitState::Closed),
        }
    }

    /// Open (or return the already-open) database handle.
    ///
    /// The open itself runs on the blocking pool under [`INIT_TIMEOUT`].
    /// First-run seeding happens here, after a successful open; seeding
    /// failures are logged, never propagated.
    pub async fn db(&self) -> Result<Arc<SqliteDb>, StoreError> {
        let mut state = self.state.lock().await;

        match &*state {
            InitState::Ready(db) => return Ok(db.clone()),
            InitState::Failed(message) => {
                return Err(StoreError::Unavailable(message.clone()));
            }
            InitState::Closed => {}
        }

        match self.open_with_timeout().await {
            Ok(db) => {
                match db.seed_if_empty_with(&self.seed_settings) {
                    Ok(true) => info!("Seeded demonstration content into empty store"),
                    Ok(false) => {}
                    Err(e) => warn!("First-run seeding failed: {}", e),
                }
                *state = InitState::Ready(db.clone());
                Ok(db)
            }
            Err(e) => {
                warn!("Store initialization failed: {}", e);
                *state = InitState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Drop the cached handle or cached failure so the next `db()` call
    /// attempts a fresh open. Recovery path for a closed or corrupted
    /// handle (e.g. the database file was deleted underneath us).
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        *state = InitState::Closed;
    }

    async fn open_with_timeout(&self) -> Result<Arc<SqliteDb>, StoreError> {
        let path = self.path.clone();
        let open = tokio::task::spawn_blocking(move || -> Result<SqliteDb, StoreError> {
            let db = SqliteDb::open(&path)?;
            db.initialize()?;
            Ok(db)
        });

        match tokio::time::timeout(INIT_TIMEOUT, open).await {
            Ok(Ok(Ok(db))) => Ok(Arc::new(db)),
            Ok(Ok(Err(e))) => Err(e),
            Ok(Err(join_error)) => Err(StoreError::Unavailable(join_error.to_string())),
            Err(_) => Err(StoreError::InitTimeout(INIT_TIMEOUT)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_is_shared() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path().join("kiosk.db"));

        let a = store.db().await.unwrap();
        let b = store.db().await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn test_failed_open_is_cached_until_reset() {
        let dir = tempfile::tempdir().unwrap();
        // A directory at the database path makes the open fail
        let path = dir.path().join("kiosk.db");
        std::fs::create_dir_all(&path).unwrap();

        let store = Store::new(&path);
        assert!(store.db().await.is_err());

        // Second call fails fast with the cached error
        match store.db().await {
            Err(StoreError::Unavailable(_)) => {}
            other => panic!("expected cached failure, got {:?}", other.map(|_| ())),
        }

        // After removing the obstacle, reset permits a fresh attempt
        std::fs::remove_dir_all(&path).unwrap();
        store.reset().await;
        assert!(store.db().await.is_ok());
    }
}

//! Types and storage for RSS feed configs.

use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use super::sqlite::SqliteDb;
use super::{next_record_id, StoreError};

/// An RSS source; only active feeds participate in the ticker cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RssFeed {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

fn row_to_feed(row: &Row<'_>) -> rusqlite::Result<RssFeed> {
    Ok(RssFeed {
        id: row.get(0)?,
        name: row.get(1)?,
        url: row.get(2)?,
        active: row.get(3)?,
    })
}

impl SqliteDb {
    pub fn feeds_all(&self) -> Result<Vec<RssFeed>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT id, name, url, active FROM feeds")?;
        let feeds = stmt
            .query_map([], row_to_feed)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(feeds)
    }

    pub fn feeds_by_active(&self, active: bool) -> Result<Vec<RssFeed>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT id, name, url, active FROM feeds WHERE active = ?")?;
        let feeds = stmt
            .query_map([active], row_to_feed)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(feeds)
    }

    pub fn feed_by_id(&self, id: &str) -> Result<Option<RssFeed>, StoreError> {
        let conn = self.conn();
        let feed = conn
            .query_row(
                "SELECT id, name, url, active FROM feeds WHERE id = ?",
                [id],
                row_to_feed,
            )
            .optional()?;
        Ok(feed)
    }

    pub fn put_feed(&self, mut feed: RssFeed) -> Result<RssFeed, StoreError> {
        if feed.id.is_empty() {
            feed.id = next_record_id();
        }
        let conn = self.conn();
        conn.execute(
            "INSERT OR REPLACE INTO feeds (id, name, url, active) VALUES (?, ?, ?, ?)",
            params![feed.id, feed.name, feed.url, feed.active],
        )?;
        Ok(feed)
    }

    pub fn remove_feed(&self, id: &str) -> Result<bool, StoreError> {
        let conn = self.conn();
        let removed = conn.execute("DELETE FROM feeds WHERE id = ?", [id])?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::sqlite::open_test_db;

    #[test]
    fn test_active_filter() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_test_db(&dir);

        db.put_feed(RssFeed {
            id: "f1".to_string(),
            name: "Science".to_string(),
            url: "https://elementy.ru/rss/news".to_string(),
            active: true,
        })
        .unwrap();
        db.put_feed(RssFeed {
            id: "f2".to_string(),
            name: "Paused".to_string(),
            url: "https://lenta.ru/rss".to_string(),
            active: false,
        })
        .unwrap();

        let active = db.feeds_by_active(true).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "f1");
        assert_eq!(db.feeds_by_active(false).unwrap().len(), 1);
    }
}

//! Types and storage for admin-authored news items.

use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use super::sqlite::SqliteDb;
use super::{next_record_id, now_iso, StoreError};

/// A news item authored in the admin panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Publish date as an ISO 8601 string.
    #[serde(default)]
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

fn row_to_news(row: &Row<'_>) -> rusqlite::Result<NewsItem> {
    Ok(NewsItem {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        image: row.get(3)?,
        date: row.get(4)?,
        url: row.get(5)?,
    })
}

impl SqliteDb {
    pub fn news_all(&self) -> Result<Vec<NewsItem>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT id, title, content, image, date, url FROM news")?;
        let items = stmt
            .query_map([], row_to_news)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(items)
    }

    /// Newest first, for the news page listing.
    pub fn news_latest(&self) -> Result<Vec<NewsItem>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT id, title, content, image, date, url FROM news ORDER BY date DESC")?;
        let items = stmt
            .query_map([], row_to_news)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(items)
    }

    pub fn news_by_date(&self, date: &str) -> Result<Vec<NewsItem>, StoreError> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT id, title, content, image, date, url FROM news WHERE date = ?")?;
        let items = stmt
            .query_map([date], row_to_news)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(items)
    }

    pub fn news_by_id(&self, id: &str) -> Result<Option<NewsItem>, StoreError> {
        let conn = self.conn();
        let item = conn
            .query_row(
                "SELECT id, title, content, image, date, url FROM news WHERE id = ?",
                [id],
                row_to_news,
            )
            .optional()?;
        Ok(item)
    }

    pub fn put_news(&self, mut item: NewsItem) -> Result<NewsItem, StoreError> {
        if item.id.is_empty() {
            item.id = next_record_id();
        }
        if item.date.is_empty() {
            item.date = now_iso();
        }
        let conn = self.conn();
        conn.execute(
            "INSERT OR REPLACE INTO news (id, title, content, image, date, url) VALUES (?, ?, ?, ?, ?, ?)",
            params![item.id, item.title, item.content, item.image, item.date, item.url],
        )?;
        Ok(item)
    }

    pub fn remove_news(&self, id: &str) -> Result<bool, StoreError> {
        let conn = self.conn();
        let removed = conn.execute("DELETE FROM news WHERE id = ?", [id])?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::sqlite::open_test_db;

    fn item(id: &str, date: &str) -> NewsItem {
        NewsItem {
            id: id.to_string(),
            title: format!("Item {}", id),
            content: String::new(),
            image: None,
            date: date.to_string(),
            url: None,
        }
    }

    #[test]
    fn test_latest_is_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_test_db(&dir);

        db.put_news(item("a", "2026-01-10T09:00:00+00:00")).unwrap();
        db.put_news(item("b", "2026-03-02T09:00:00+00:00")).unwrap();
        db.put_news(item("c", "2026-02-15T09:00:00+00:00")).unwrap();

        let ids: Vec<String> = db.news_latest().unwrap().into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_missing_date_defaults_to_now() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_test_db(&dir);

        let saved = db
            .put_news(NewsItem {
                id: String::new(),
                title: "No date".to_string(),
                content: String::new(),
                image: None,
                date: String::new(),
                url: None,
            })
            .unwrap();
        assert!(!saved.id.is_empty());
        assert!(!saved.date.is_empty());
    }
}

//! Types and storage for gallery media items.
//!
//! Media rows are the one partition with derived state elsewhere: every
//! write or delete that touches an `album_id` recomputes that album's item
//! count inside the same transaction (moving an item between albums
//! recomputes both sides).

use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use super::sqlite::{refresh_album_count, SqliteDb};
use super::{next_record_id, now_iso, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "image" => Some(MediaType::Image),
            "video" => Some(MediaType::Video),
            _ => None,
        }
    }
}

/// Gallery section the item appears under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaCategory {
    Photo,
    Video,
}

impl MediaCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaCategory::Photo => "photo",
            MediaCategory::Video => "video",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "photo" => Some(MediaCategory::Photo),
            "video" => Some(MediaCategory::Video),
            _ => None,
        }
    }
}

/// A gallery item; `album_id` is `None` for items outside any album.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    pub category: MediaCategory,
    #[serde(default)]
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

fn row_to_media(row: &Row<'_>) -> rusqlite::Result<MediaItem> {
    let media_type: String = row.get(3)?;
    let category: String = row.get(6)?;
    let tags: Option<String> = row.get(12)?;
    Ok(MediaItem {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        media_type: MediaType::from_str(&media_type).unwrap_or(MediaType::Image),
        url: row.get(4)?,
        thumbnail: row.get(5)?,
        category: MediaCategory::from_str(&category).unwrap_or(MediaCategory::Photo),
        date: row.get(7)?,
        album_id: row.get(8)?,
        file_size: row.get(9)?,
        duration: row.get(10)?,
        dimensions: row.get(11)?,
        tags: tags.and_then(|t| serde_json::from_str(&t).ok()),
    })
}

const MEDIA_COLUMNS: &str = "id, title, description, media_type, url, thumbnail, category, date, \
     album_id, file_size, duration, dimensions, tags";

impl SqliteDb {
    pub fn media_all(&self) -> Result<Vec<MediaItem>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!("SELECT {} FROM media", MEDIA_COLUMNS))?;
        let items = stmt
            .query_map([], row_to_media)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(items)
    }

    pub fn media_by_type(&self, media_type: MediaType) -> Result<Vec<MediaItem>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM media WHERE media_type = ?",
            MEDIA_COLUMNS
        ))?;
        let items = stmt
            .query_map([media_type.as_str()], row_to_media)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(items)
    }

    pub fn media_by_category(&self, category: MediaCategory) -> Result<Vec<MediaItem>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM media WHERE category = ?",
            MEDIA_COLUMNS
        ))?;
        let items = stmt
            .query_map([category.as_str()], row_to_media)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(items)
    }

    pub fn media_by_album(&self, album_id: &str) -> Result<Vec<MediaItem>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM media WHERE album_id = ?",
            MEDIA_COLUMNS
        ))?;
        let items = stmt
            .query_map([album_id], row_to_media)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(items)
    }

    pub fn media_by_id(&self, id: &str) -> Result<Option<MediaItem>, StoreError> {
        let conn = self.conn();
        let item = conn
            .query_row(
                &format!("SELECT {} FROM media WHERE id = ?", MEDIA_COLUMNS),
                [id],
                row_to_media,
            )
            .optional()?;
        Ok(item)
    }

    /// Insert-or-replace a media item and refresh the affected album counts
    /// before returning.
    pub fn put_media(&self, mut item: MediaItem) -> Result<MediaItem, StoreError> {
        if item.id.is_empty() {
            item.id = next_record_id();
        }
        if item.date.is_empty() {
            item.date = now_iso();
        }

        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let previous_album: Option<String> = tx
            .query_row("SELECT album_id FROM media WHERE id = ?", [&item.id], |row| {
                row.get(0)
            })
            .optional()?
            .flatten();

        tx.execute(
            &format!(
                "INSERT OR REPLACE INTO media ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                MEDIA_COLUMNS
            ),
            params![
                item.id,
                item.title,
                item.description,
                item.media_type.as_str(),
                item.url,
                item.thumbnail,
                item.category.as_str(),
                item.date,
                item.album_id,
                item.file_size,
                item.duration,
                item.dimensions,
                item.tags
                    .as_ref()
                    .map(|t| serde_json::to_string(t).unwrap_or_else(|_| "[]".to_string())),
            ],
        )?;

        if let Some(previous) = &previous_album {
            if item.album_id.as_deref() != Some(previous.as_str()) {
                refresh_album_count(&tx, previous)?;
            }
        }
        if let Some(album_id) = &item.album_id {
            refresh_album_count(&tx, album_id)?;
        }

        tx.commit()?;
        Ok(item)
    }

    pub fn remove_media(&self, id: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let album_id: Option<String> = tx
            .query_row("SELECT album_id FROM media WHERE id = ?", [id], |row| {
                row.get(0)
            })
            .optional()?
            .flatten();

        let removed = tx.execute("DELETE FROM media WHERE id = ?", [id])?;
        if let Some(album_id) = &album_id {
            refresh_album_count(&tx, album_id)?;
        }

        tx.commit()?;
        Ok(removed > 0)
    }
}

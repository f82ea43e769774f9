//! Types and storage for media albums.

use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use super::sqlite::{refresh_album_count, SqliteDb};
use super::{next_record_id, now_iso, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlbumType {
    Photo,
    Video,
    Mixed,
}

impl AlbumType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlbumType::Photo => "photo",
            AlbumType::Video => "video",
            AlbumType::Mixed => "mixed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "photo" => Some(AlbumType::Photo),
            "video" => Some(AlbumType::Video),
            "mixed" => Some(AlbumType::Mixed),
            _ => None,
        }
    }
}

/// An album of gallery media.
///
/// `item_count` is derived from the media partition and maintained by the
/// store; `cover_image_id` may dangle (the UI falls back to the first image).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image_id: Option<String>,
    #[serde(rename = "type")]
    pub album_type: AlbumType,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub item_count: i64,
}

fn row_to_album(row: &Row<'_>) -> rusqlite::Result<Album> {
    let album_type: String = row.get(4)?;
    Ok(Album {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        cover_image_id: row.get(3)?,
        album_type: AlbumType::from_str(&album_type).unwrap_or(AlbumType::Mixed),
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
        item_count: row.get(7)?,
    })
}

const ALBUM_COLUMNS: &str =
    "id, name, description, cover_image_id, album_type, created_at, updated_at, item_count";

impl SqliteDb {
    pub fn albums_all(&self) -> Result<Vec<Album>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!("SELECT {} FROM albums", ALBUM_COLUMNS))?;
        let albums = stmt
            .query_map([], row_to_album)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(albums)
    }

    /// Newest first, for the gallery album grid.
    pub fn albums_recent(&self) -> Result<Vec<Album>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM albums ORDER BY created_at DESC",
            ALBUM_COLUMNS
        ))?;
        let albums = stmt
            .query_map([], row_to_album)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(albums)
    }

    pub fn albums_by_type(&self, album_type: AlbumType) -> Result<Vec<Album>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM albums WHERE album_type = ?",
            ALBUM_COLUMNS
        ))?;
        let albums = stmt
            .query_map([album_type.as_str()], row_to_album)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(albums)
    }

    pub fn album_by_id(&self, id: &str) -> Result<Option<Album>, StoreError> {
        let conn = self.conn();
        let album = conn
            .query_row(
                &format!("SELECT {} FROM albums WHERE id = ?", ALBUM_COLUMNS),
                [id],
                row_to_album,
            )
            .optional()?;
        Ok(album)
    }

    /// Insert-or-replace an album. Timestamps are filled in when missing and
    /// the stored item count is always recomputed from the media partition,
    /// so a stale count supplied by the caller cannot stick.
    pub fn put_album(&self, mut album: Album) -> Result<Album, StoreError> {
        if album.id.is_empty() {
            album.id = next_record_id();
        }
        let now = now_iso();
        if album.created_at.is_empty() {
            album.created_at = now.clone();
        }
        album.updated_at = now;

        let mut conn = self.conn();
        let tx = conn.transaction()?;

        album.item_count = tx.query_row(
            "SELECT COUNT(*) FROM media WHERE album_id = ?",
            [&album.id],
            |row| row.get(0),
        )?;

        tx.execute(
            &format!(
                "INSERT OR REPLACE INTO albums ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                ALBUM_COLUMNS
            ),
            params![
                album.id,
                album.name,
                album.description,
                album.cover_image_id,
                album.album_type.as_str(),
                album.created_at,
                album.updated_at,
                album.item_count,
            ],
        )?;

        tx.commit()?;
        Ok(album)
    }

    /// Delete an album and every media item inside it, as one transaction.
    /// No intermediate state (orphaned media, or media without their album)
    /// is ever observable.
    pub fn remove_album(&self, id: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM media WHERE album_id = ?", [id])?;
        let removed = tx.execute("DELETE FROM albums WHERE id = ?", [id])?;

        tx.commit()?;
        Ok(removed > 0)
    }
}

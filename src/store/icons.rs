//! Types and storage for custom map marker icons.

use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use super::sqlite::SqliteDb;
use super::{next_record_id, StoreError};

/// A marker glyph overriding the default for its category.
///
/// The optional blob carries locally-uploaded image bytes; it is stored but
/// never serialized into API responses (icons are referenced by URL).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerIcon {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub category: String,
    pub url: String,
    #[serde(skip)]
    pub blob: Option<Vec<u8>>,
}

fn row_to_icon(row: &Row<'_>) -> rusqlite::Result<MarkerIcon> {
    Ok(MarkerIcon {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        url: row.get(3)?,
        blob: row.get(4)?,
    })
}

impl SqliteDb {
    pub fn icons_all(&self) -> Result<Vec<MarkerIcon>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT id, name, category, url, blob FROM icons")?;
        let icons = stmt
            .query_map([], row_to_icon)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(icons)
    }

    pub fn icons_by_category(&self, category: &str) -> Result<Vec<MarkerIcon>, StoreError> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT id, name, category, url, blob FROM icons WHERE category = ?")?;
        let icons = stmt
            .query_map([category], row_to_icon)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(icons)
    }

    pub fn icon_by_id(&self, id: &str) -> Result<Option<MarkerIcon>, StoreError> {
        let conn = self.conn();
        let icon = conn
            .query_row(
                "SELECT id, name, category, url, blob FROM icons WHERE id = ?",
                [id],
                row_to_icon,
            )
            .optional()?;
        Ok(icon)
    }

    pub fn put_icon(&self, mut icon: MarkerIcon) -> Result<MarkerIcon, StoreError> {
        if icon.id.is_empty() {
            icon.id = next_record_id();
        }
        let conn = self.conn();
        conn.execute(
            "INSERT OR REPLACE INTO icons (id, name, category, url, blob) VALUES (?, ?, ?, ?, ?)",
            params![icon.id, icon.name, icon.category, icon.url, icon.blob],
        )?;
        Ok(icon)
    }

    pub fn remove_icon(&self, id: &str) -> Result<bool, StoreError> {
        let conn = self.conn();
        let removed = conn.execute("DELETE FROM icons WHERE id = ?", [id])?;
        Ok(removed > 0)
    }
}

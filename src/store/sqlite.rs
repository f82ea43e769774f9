//! SQLite backend: handle lifecycle, schema, first-run seeding.
//!
//! Entity CRUD lives next to the record types (`pois`, `media`, ...); this
//! module owns the connection and everything that touches the schema.

use rusqlite::{params, Connection, Transaction};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::albums::{Album, AlbumType};
use super::feeds::RssFeed;
use super::pois::{Poi, PoiCategory};
use super::schema::{MIGRATIONS, SCHEMA};
use super::settings::SystemSettings;
use super::{now_iso, StoreError};

pub struct SqliteDb {
    conn: Mutex<Connection>,
}

impl SqliteDb {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn initialize(&self) -> Result<(), StoreError> {
        let conn = self.conn();
        conn.execute_batch(SCHEMA)?;
        // Migrations are additive and individually best-effort
        for migration in MIGRATIONS {
            let _ = conn.execute(migration, []);
        }
        Ok(())
    }

    /// Seed demonstration content when the POI partition is empty.
    ///
    /// One demo POI, the system settings singleton, one default feed and two
    /// default albums, written in a single transaction. Returns whether
    /// seeding happened, so a reloaded kiosk never duplicates the demo data.
    pub fn seed_if_empty(&self) -> Result<bool, StoreError> {
        self.seed_if_empty_with(&SystemSettings::default())
    }

    pub fn seed_if_empty_with(&self, settings: &SystemSettings) -> Result<bool, StoreError> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let pois: i64 = tx.query_row("SELECT COUNT(*) FROM pois", [], |row| row.get(0))?;
        if pois > 0 {
            return Ok(false);
        }

        let poi = demo_poi();
        tx.execute(
            r#"
            INSERT INTO pois (id, name, short_description, full_description, lat, lng, images, address, category, icon_url)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                poi.id,
                poi.name,
                poi.short_description,
                poi.full_description,
                poi.coordinates[0],
                poi.coordinates[1],
                serde_json::to_string(&poi.images).unwrap_or_else(|_| "[]".to_string()),
                poi.address,
                poi.category.as_str(),
                poi.icon_url,
            ],
        )?;

        let payload = serde_json::to_string(settings)
            .map_err(|e| StoreError::Unavailable(format!("settings encode failed: {}", e)))?;
        tx.execute(
            "INSERT INTO settings (id, payload, updated_at) VALUES (?, ?, ?)",
            params![SystemSettings::ID, payload, now_iso()],
        )?;

        let feed = default_feed();
        tx.execute(
            "INSERT INTO feeds (id, name, url, active) VALUES (?, ?, ?, ?)",
            params![feed.id, feed.name, feed.url, feed.active],
        )?;

        for album in default_albums() {
            tx.execute(
                r#"
                INSERT INTO albums (id, name, description, cover_image_id, album_type, created_at, updated_at, item_count)
                VALUES (?, ?, ?, ?, ?, ?, ?, 0)
                "#,
                params![
                    album.id,
                    album.name,
                    album.description,
                    album.cover_image_id,
                    album.album_type.as_str(),
                    album.created_at,
                    album.updated_at,
                ],
            )?;
        }

        tx.commit()?;
        Ok(true)
    }

    pub(crate) fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Recompute an album's derived item count from the media partition and bump
/// its modification time. Runs inside the caller's transaction.
pub(crate) fn refresh_album_count(tx: &Transaction<'_>, album_id: &str) -> rusqlite::Result<()> {
    let count: i64 = tx.query_row(
        "SELECT COUNT(*) FROM media WHERE album_id = ?",
        [album_id],
        |row| row.get(0),
    )?;
    tx.execute(
        "UPDATE albums SET item_count = ?, updated_at = ? WHERE id = ?",
        params![count, now_iso(), album_id],
    )?;
    Ok(())
}

fn demo_poi() -> Poi {
    Poi {
        id: "demo-main-building".to_string(),
        name: "Institute Main Building".to_string(),
        short_description: "Administration and visitor reception".to_string(),
        full_description: "The historical main building of the institute. \
            Visitor passes, the exhibition hall and the conference centre are here."
            .to_string(),
        coordinates: [56.7417, 37.189],
        images: Vec::new(),
        address: "6 Joliot-Curie St".to_string(),
        category: PoiCategory::Building,
        icon_url: None,
    }
}

fn default_feed() -> RssFeed {
    RssFeed {
        id: "default-feed".to_string(),
        name: "Institute news".to_string(),
        url: "https://www.jinr.ru/feed/".to_string(),
        active: true,
    }
}

fn default_albums() -> Vec<Album> {
    let now = now_iso();
    vec![
        Album {
            id: "default-photo-album".to_string(),
            name: "Photo archive".to_string(),
            description: Some("Photographs of the institute campus".to_string()),
            cover_image_id: None,
            album_type: AlbumType::Photo,
            created_at: now.clone(),
            updated_at: now.clone(),
            item_count: 0,
        },
        Album {
            id: "default-video-album".to_string(),
            name: "Video archive".to_string(),
            description: Some("Films and lecture recordings".to_string()),
            cover_image_id: None,
            album_type: AlbumType::Video,
            created_at: now.clone(),
            updated_at: now,
            item_count: 0,
        },
    ]
}

#[cfg(test)]
pub(crate) fn open_test_db(dir: &tempfile::TempDir) -> SqliteDb {
    let db = SqliteDb::open(&dir.path().join("test.db")).unwrap();
    db.initialize().unwrap();
    db
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_test_db(&dir);
        db.initialize().unwrap();
        db.initialize().unwrap();
    }

    #[test]
    fn test_seed_only_when_pois_empty() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_test_db(&dir);

        assert!(db.seed_if_empty().unwrap());
        // Simulated reload: seeding again must be a no-op
        assert!(!db.seed_if_empty().unwrap());

        assert_eq!(db.pois_all().unwrap().len(), 1);
        assert_eq!(db.feeds_all().unwrap().len(), 1);
        assert_eq!(db.albums_all().unwrap().len(), 2);
        assert!(db.system_settings().unwrap().is_some());
    }

    #[test]
    fn test_seed_skipped_when_poi_exists() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_test_db(&dir);

        let poi = Poi {
            id: "existing".to_string(),
            name: "Laboratory".to_string(),
            coordinates: [56.74, 37.19],
            category: PoiCategory::Building,
            ..Default::default()
        };
        db.put_poi(poi).unwrap();

        assert!(!db.seed_if_empty().unwrap());
        assert_eq!(db.pois_all().unwrap().len(), 1);
        assert!(db.system_settings().unwrap().is_none());
    }
}

//! Types and storage for map points of interest.

use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use super::sqlite::SqliteDb;
use super::{next_record_id, StoreError};

/// Category of a point of interest.
///
/// The map page uses the category both for filtering and for the default
/// marker color; `"all"` in filter requests is a caller-side sentinel for
/// "no filter", not a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoiCategory {
    Building,
    Attraction,
    Entrance,
    Food,
    Entertainment,
}

impl PoiCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PoiCategory::Building => "building",
            PoiCategory::Attraction => "attraction",
            PoiCategory::Entrance => "entrance",
            PoiCategory::Food => "food",
            PoiCategory::Entertainment => "entertainment",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "building" => Some(PoiCategory::Building),
            "attraction" => Some(PoiCategory::Attraction),
            "entrance" => Some(PoiCategory::Entrance),
            "food" => Some(PoiCategory::Food),
            "entertainment" => Some(PoiCategory::Entertainment),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PoiCategory::Building => "Buildings",
            PoiCategory::Attraction => "Attractions",
            PoiCategory::Entrance => "Entrances",
            PoiCategory::Food => "Cafes and canteens",
            PoiCategory::Entertainment => "Leisure",
        }
    }

    /// Default marker color on the map.
    pub fn color(&self) -> &'static str {
        match self {
            PoiCategory::Building => "#1e88e5",
            PoiCategory::Attraction => "#43a047",
            PoiCategory::Entrance => "#fb8c00",
            PoiCategory::Food => "#e53935",
            PoiCategory::Entertainment => "#8e24aa",
        }
    }
}

/// A point of interest shown on the kiosk map.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poi {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub full_description: String,
    /// Always a `[lat, lng]` pair.
    pub coordinates: [f64; 2],
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub address: String,
    pub category: PoiCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

impl Default for Poi {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            short_description: String::new(),
            full_description: String::new(),
            coordinates: [0.0, 0.0],
            images: Vec::new(),
            address: String::new(),
            category: PoiCategory::Building,
            icon_url: None,
        }
    }
}

fn row_to_poi(row: &Row<'_>) -> rusqlite::Result<Poi> {
    let images: String = row.get(6)?;
    let category: String = row.get(8)?;
    Ok(Poi {
        id: row.get(0)?,
        name: row.get(1)?,
        short_description: row.get(2)?,
        full_description: row.get(3)?,
        coordinates: [row.get(4)?, row.get(5)?],
        images: serde_json::from_str(&images).unwrap_or_default(),
        address: row.get(7)?,
        category: PoiCategory::from_str(&category).unwrap_or(PoiCategory::Building),
        icon_url: row.get(9)?,
    })
}

const POI_COLUMNS: &str =
    "id, name, short_description, full_description, lat, lng, images, address, category, icon_url";

impl SqliteDb {
    pub fn pois_all(&self) -> Result<Vec<Poi>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!("SELECT {} FROM pois", POI_COLUMNS))?;
        let pois = stmt
            .query_map([], row_to_poi)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(pois)
    }

    pub fn pois_by_category(&self, category: PoiCategory) -> Result<Vec<Poi>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM pois WHERE category = ?",
            POI_COLUMNS
        ))?;
        let pois = stmt
            .query_map([category.as_str()], row_to_poi)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(pois)
    }

    pub fn poi_by_id(&self, id: &str) -> Result<Option<Poi>, StoreError> {
        let conn = self.conn();
        let poi = conn
            .query_row(
                &format!("SELECT {} FROM pois WHERE id = ?", POI_COLUMNS),
                [id],
                row_to_poi,
            )
            .optional()?;
        Ok(poi)
    }

    /// Insert-or-replace by primary key; assigns an id when missing.
    pub fn put_poi(&self, mut poi: Poi) -> Result<Poi, StoreError> {
        if poi.id.is_empty() {
            poi.id = next_record_id();
        }
        let conn = self.conn();
        conn.execute(
            r#"
            INSERT OR REPLACE INTO pois (id, name, short_description, full_description, lat, lng, images, address, category, icon_url)
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
        Ok(poi)
    }

    pub fn remove_poi(&self, id: &str) -> Result<bool, StoreError> {
        let conn = self.conn();
        let removed = conn.execute("DELETE FROM pois WHERE id = ?", [id])?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::sqlite::open_test_db;

    #[test]
    fn test_put_assigns_id_and_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_test_db(&dir);

        let saved = db
            .put_poi(Poi {
                name: "Test".to_string(),
                coordinates: [56.74, 37.19],
                category: PoiCategory::Attraction,
                ..Default::default()
            })
            .unwrap();
        assert!(!saved.id.is_empty());

        let fetched = db.poi_by_id(&saved.id).unwrap().unwrap();
        assert_eq!(fetched.name, "Test");
        assert_eq!(fetched.coordinates, [56.74, 37.19]);
        assert_eq!(fetched.category, PoiCategory::Attraction);
    }

    #[test]
    fn test_put_replaces_existing() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_test_db(&dir);

        db.put_poi(Poi {
            id: "p1".to_string(),
            name: "Before".to_string(),
            coordinates: [1.0, 2.0],
            category: PoiCategory::Building,
            ..Default::default()
        })
        .unwrap();
        db.put_poi(Poi {
            id: "p1".to_string(),
            name: "After".to_string(),
            coordinates: [1.0, 2.0],
            category: PoiCategory::Building,
            ..Default::default()
        })
        .unwrap();

        assert_eq!(db.pois_all().unwrap().len(), 1);
        assert_eq!(db.poi_by_id("p1").unwrap().unwrap().name, "After");
    }

    #[test]
    fn test_filter_by_category() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_test_db(&dir);

        for (id, category) in [
            ("a", PoiCategory::Building),
            ("b", PoiCategory::Food),
            ("c", PoiCategory::Food),
        ] {
            db.put_poi(Poi {
                id: id.to_string(),
                name: id.to_uppercase(),
                coordinates: [56.7, 37.1],
                category,
                ..Default::default()
            })
            .unwrap();
        }

        assert_eq!(db.pois_by_category(PoiCategory::Food).unwrap().len(), 2);
        assert_eq!(db.pois_by_category(PoiCategory::Entrance).unwrap().len(), 0);
        assert_eq!(db.pois_all().unwrap().len(), 3);
    }

    #[test]
    fn test_remove() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_test_db(&dir);

        db.put_poi(Poi {
            id: "p1".to_string(),
            name: "X".to_string(),
            coordinates: [0.0, 0.0],
            category: PoiCategory::Entrance,
            ..Default::default()
        })
        .unwrap();

        assert!(db.remove_poi("p1").unwrap());
        assert!(!db.remove_poi("p1").unwrap());
        assert!(db.poi_by_id("p1").unwrap().is_none());
    }
}

//! Keyed singleton settings: system settings and the event countdown timer.
//!
//! Both live in the settings partition as JSON payloads under fixed ids, so
//! adding a field never needs a schema change.

use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::sqlite::SqliteDb;
use super::{now_iso, StoreError};

/// Organization card shown on the info page and in the idle screen footer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationInfo {
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub logo: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub website: String,
}

impl Default for OrganizationInfo {
    fn default() -> Self {
        Self {
            name: "JINR".to_string(),
            full_name: "Joint Institute for Nuclear Research".to_string(),
            logo: String::new(),
            description: "International intergovernmental research organization in Dubna"
                .to_string(),
            address: "6 Joliot-Curie St, Dubna, Moscow region".to_string(),
            phone: "+7 (496) 216-50-59".to_string(),
            email: "post@jinr.ru".to_string(),
            website: "https://www.jinr.ru".to_string(),
        }
    }
}

/// The system settings singleton, stored under [`SystemSettings::ID`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemSettings {
    /// Idle screen timeout in milliseconds.
    pub idle_timeout: u64,
    #[serde(default)]
    pub loading_gif: String,
    #[serde(default)]
    pub organization_info: OrganizationInfo,
}

impl SystemSettings {
    pub const ID: &'static str = "system_settings";
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            idle_timeout: 60_000,
            loading_gif: String::new(),
            organization_info: OrganizationInfo::default(),
        }
    }
}

/// A countdown-event descriptor shown on the idle screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTimer {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Target moment as an ISO 8601 string.
    pub event_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub enabled: bool,
    #[serde(default)]
    pub background_color: String,
    #[serde(default)]
    pub text_color: String,
}

/// The timer singleton, stored under [`TimerSettings::ID`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSettings {
    #[serde(default = "TimerSettings::default_id")]
    pub id: String,
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer: Option<EventTimer>,
}

impl TimerSettings {
    pub const ID: &'static str = "timer-settings";

    fn default_id() -> String {
        Self::ID.to_string()
    }
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            id: Self::ID.to_string(),
            enabled: false,
            timer: None,
        }
    }
}

impl SqliteDb {
    pub fn system_settings(&self) -> Result<Option<SystemSettings>, StoreError> {
        Ok(self
            .setting_payload(SystemSettings::ID)?
            .and_then(|payload| serde_json::from_str(&payload).ok()))
    }

    pub fn put_system_settings(&self, settings: &SystemSettings) -> Result<(), StoreError> {
        let payload = serde_json::to_string(settings)
            .map_err(|e| StoreError::Unavailable(format!("settings encode failed: {}", e)))?;
        self.put_setting_payload(SystemSettings::ID, &payload)
    }

    pub fn timer_settings(&self) -> Result<Option<TimerSettings>, StoreError> {
        Ok(self
            .setting_payload(TimerSettings::ID)?
            .and_then(|payload| serde_json::from_str(&payload).ok()))
    }

    pub fn put_timer_settings(&self, settings: &TimerSettings) -> Result<(), StoreError> {
        let payload = serde_json::to_string(settings)
            .map_err(|e| StoreError::Unavailable(format!("timer encode failed: {}", e)))?;
        self.put_setting_payload(TimerSettings::ID, &payload)
    }

    fn setting_payload(&self, id: &str) -> Result<Option<String>, StoreError> {
        let conn = self.conn();
        let payload = conn
            .query_row("SELECT payload FROM settings WHERE id = ?", [id], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(payload)
    }

    fn put_setting_payload(&self, id: &str, payload: &str) -> Result<(), StoreError> {
        let conn = self.conn();
        conn.execute(
            "INSERT OR REPLACE INTO settings (id, payload, updated_at) VALUES (?, ?, ?)",
            params![id, payload, now_iso()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::sqlite::open_test_db;

    #[test]
    fn test_system_settings_singleton() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_test_db(&dir);

        assert!(db.system_settings().unwrap().is_none());

        let mut settings = SystemSettings::default();
        settings.idle_timeout = 120_000;
        db.put_system_settings(&settings).unwrap();
        db.put_system_settings(&settings).unwrap();

        let loaded = db.system_settings().unwrap().unwrap();
        assert_eq!(loaded.idle_timeout, 120_000);
        assert_eq!(loaded.organization_info.name, "JINR");
    }

    #[test]
    fn test_timer_singleton_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_test_db(&dir);

        let timer = TimerSettings {
            id: TimerSettings::ID.to_string(),
            enabled: true,
            timer: Some(EventTimer {
                title: "Open day".to_string(),
                description: String::new(),
                event_date: "2026-09-01T10:00:00+00:00".to_string(),
                image: None,
                enabled: true,
                background_color: "#003366".to_string(),
                text_color: "#ffffff".to_string(),
            }),
        };
        db.put_timer_settings(&timer).unwrap();

        let loaded = db.timer_settings().unwrap().unwrap();
        assert!(loaded.enabled);
        assert_eq!(loaded.timer.unwrap().title, "Open day");
    }
}

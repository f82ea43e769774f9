//! Admin session gate.
//!
//! A kiosk convenience gate, not real authentication: one fixed credential
//! pair, checked verbatim, with a flag-and-timestamp record in a local JSON
//! file. The session stays valid for 24 hours from login and is re-checked
//! on every admin call.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "kiosk-dubna";

pub const SESSION_TTL_HOURS: i64 = 24;

#[derive(Debug, Serialize, Deserialize)]
struct SessionRecord {
    authenticated: bool,
    timestamp: DateTime<Utc>,
}

pub struct SessionGate {
    path: PathBuf,
}

impl SessionGate {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            path: data_dir.join("session.json"),
        }
    }

    /// Check the fixed credentials; on success the session file is written
    /// with the current timestamp. Returns whether login succeeded.
    pub fn login(&self, username: &str, password: &str) -> Result<bool> {
        if username != ADMIN_USERNAME || password != ADMIN_PASSWORD {
            return Ok(false);
        }

        let record = SessionRecord {
            authenticated: true,
            timestamp: Utc::now(),
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string(&record)?)?;
        Ok(true)
    }

    /// A session is valid when it exists, is flagged authenticated and its
    /// timestamp is less than 24 hours old.
    pub fn is_valid(&self) -> bool {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(_) => return false,
        };
        let record: SessionRecord = match serde_json::from_str(&content) {
            Ok(record) => record,
            Err(e) => {
                warn!("Session file is unreadable, treating as logged out: {}", e);
                return false;
            }
        };

        record.authenticated
            && Utc::now() - record.timestamp < Duration::hours(SESSION_TTL_HOURS)
    }

    pub fn logout(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(dir: &tempfile::TempDir) -> SessionGate {
        SessionGate::new(dir.path().to_path_buf())
    }

    #[test]
    fn test_login_with_fixed_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let gate = gate(&dir);

        assert!(!gate.is_valid());
        assert!(!gate.login("admin", "wrong").unwrap());
        assert!(!gate.is_valid());

        assert!(gate.login(ADMIN_USERNAME, ADMIN_PASSWORD).unwrap());
        assert!(gate.is_valid());
    }

    #[test]
    fn test_expired_session_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let gate = gate(&dir);

        let stale = SessionRecord {
            authenticated: true,
            timestamp: Utc::now() - Duration::hours(SESSION_TTL_HOURS + 1),
        };
        std::fs::write(
            dir.path().join("session.json"),
            serde_json::to_string(&stale).unwrap(),
        )
        .unwrap();

        assert!(!gate.is_valid());
    }

    #[test]
    fn test_logout_clears_session() {
        let dir = tempfile::tempdir().unwrap();
        let gate = gate(&dir);

        gate.login(ADMIN_USERNAME, ADMIN_PASSWORD).unwrap();
        gate.logout().unwrap();
        assert!(!gate.is_valid());
        // Logging out twice is fine
        gate.logout().unwrap();
    }

    #[test]
    fn test_corrupt_session_file_is_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        let gate = gate(&dir);

        std::fs::write(dir.path().join("session.json"), "not json").unwrap();
        assert!(!gate.is_valid());
    }
}

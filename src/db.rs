//! Player profile persistence.
//!
//! Two stores implement [`ProfileStore`]: a JSON file (the classic
//! `player_profile.json` layout) and a single-row SQLite table. Callers go
//! through [`load_or_create`] and [`save_profile`], which never fail: errors
//! are logged and the session continues with defaults or unsaved progress.

use crate::archetype::ArchetypeVector;
use crate::error::Result;
use crate::logging;
use crate::profile::PlayerProfile;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::{Path, PathBuf};

pub trait ProfileStore {
    /// `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> Result<Option<PlayerProfile>>;
    fn save(&self, profile: &PlayerProfile) -> Result<()>;
    /// Human-readable location for display.
    fn location(&self) -> String;
}

// ============ JSON File Store ============

pub struct JsonProfileStore {
    path: PathBuf,
}

impl JsonProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProfileStore for JsonProfileStore {
    fn load(&self) -> Result<Option<PlayerProfile>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&self.path)?;
        let profile: PlayerProfile = serde_json::from_str(&json)?;
        Ok(Some(profile))
    }

    fn save(&self, profile: &PlayerProfile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(profile)?;

        // Temp file first, then rename over the profile
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

// ============ SQLite Store ============

pub struct SqliteProfileStore {
    conn: Connection,
    path: PathBuf,
}

impl SqliteProfileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(&path)?;
        init_schema(&conn)?;
        Ok(Self { conn, path })
    }

    /// In-memory store, mostly for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self {
            conn,
            path: PathBuf::from(":memory:"),
        })
    }

    /// RFC 3339 timestamp of the last save, if any.
    pub fn last_updated(&self) -> Result<Option<String>> {
        let updated = self
            .conn
            .query_row(
                "SELECT updated_at FROM player_profile WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(updated)
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        -- Single-row player progression
        CREATE TABLE IF NOT EXISTS player_profile (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            level INTEGER NOT NULL DEFAULT 1,
            total_xp INTEGER NOT NULL DEFAULT 0,
            clarity_xp INTEGER NOT NULL DEFAULT 0,
            integration_xp INTEGER NOT NULL DEFAULT 0,
            depth_xp INTEGER NOT NULL DEFAULT 0,
            adaptability_xp INTEGER NOT NULL DEFAULT 0,
            initiator REAL NOT NULL DEFAULT 0.2,
            listener REAL NOT NULL DEFAULT 0.2,
            challenger REAL NOT NULL DEFAULT 0.2,
            synthesizer REAL NOT NULL DEFAULT 0.2,
            explorer REAL NOT NULL DEFAULT 0.2,
            updated_at TEXT NOT NULL
        );
        ",
    )?;
    Ok(())
}

impl ProfileStore for SqliteProfileStore {
    fn load(&self) -> Result<Option<PlayerProfile>> {
        let profile = self
            .conn
            .query_row(
                "SELECT level, total_xp, clarity_xp, integration_xp, depth_xp, adaptability_xp,
                        initiator, listener, challenger, synthesizer, explorer
                 FROM player_profile WHERE id = 1",
                [],
                |row| {
                    Ok(PlayerProfile {
                        level: row.get(0)?,
                        total_xp: row.get(1)?,
                        clarity_xp: row.get(2)?,
                        integration_xp: row.get(3)?,
                        depth_xp: row.get(4)?,
                        adaptability_xp: row.get(5)?,
                        archetype: ArchetypeVector {
                            initiator: row.get(6)?,
                            listener: row.get(7)?,
                            challenger: row.get(8)?,
                            synthesizer: row.get(9)?,
                            explorer: row.get(10)?,
                        },
                    })
                },
            )
            .optional()?;
        Ok(profile)
    }

    fn save(&self, profile: &PlayerProfile) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let a = &profile.archetype;
        self.conn.execute(
            "INSERT OR REPLACE INTO player_profile
                (id, level, total_xp, clarity_xp, integration_xp, depth_xp, adaptability_xp,
                 initiator, listener, challenger, synthesizer, explorer, updated_at)
             VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                profile.level,
                profile.total_xp,
                profile.clarity_xp,
                profile.integration_xp,
                profile.depth_xp,
                profile.adaptability_xp,
                a.initiator,
                a.listener,
                a.challenger,
                a.synthesizer,
                a.explorer,
                now
            ],
        )?;
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

// ============ Store Selection ============

/// `.db`, `.sqlite` and `.sqlite3` paths use SQLite, anything else JSON.
pub fn open_store(path: &Path) -> Result<Box<dyn ProfileStore>> {
    let is_sqlite = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "db" | "sqlite" | "sqlite3"))
        .unwrap_or(false);

    if is_sqlite {
        Ok(Box::new(SqliteProfileStore::open(path)?))
    } else {
        Ok(Box::new(JsonProfileStore::new(path)))
    }
}

// ============ Best-Effort Boundary ============

/// Load the saved profile, or defaults when missing or unreadable.
pub fn load_or_create(store: &dyn ProfileStore) -> PlayerProfile {
    match store.load() {
        Ok(Some(mut profile)) => {
            profile.normalize_archetype();
            if profile.level == 0 {
                profile.level = 1;
            }
            logging::log_profile(
                None,
                &format!(
                    "Loaded profile from {}: level {}, {} XP",
                    store.location(),
                    profile.level,
                    profile.total_xp
                ),
            );
            profile
        }
        Ok(None) => {
            logging::log_profile(
                None,
                &format!("No profile at {}, starting fresh", store.location()),
            );
            PlayerProfile::default()
        }
        Err(e) => {
            logging::log_error(
                None,
                &format!(
                    "Failed to load profile from {}: {}. Using defaults",
                    store.location(),
                    e
                ),
            );
            PlayerProfile::default()
        }
    }
}

/// Save the profile. Returns whether the save succeeded; failures are only logged.
pub fn save_profile(store: &dyn ProfileStore, profile: &PlayerProfile) -> bool {
    match store.save(profile) {
        Ok(()) => {
            logging::log_profile(
                None,
                &format!(
                    "Saved profile to {}: level {}, {} XP, class {}",
                    store.location(),
                    profile.level,
                    profile.total_xp,
                    profile.class_name()
                ),
            );
            true
        }
        Err(e) => {
            logging::log_error(
                None,
                &format!("Failed to save profile to {}: {}", store.location(), e),
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::StatXp;

    fn sample_profile() -> PlayerProfile {
        let mut profile = PlayerProfile::default();
        profile.add_xp(400, StatXp::uniform(100));
        profile.blend_archetype(
            &ArchetypeVector::from_array([0.1, 0.5, 0.1, 0.2, 0.1]),
            0.15,
        );
        profile
    }

    #[test]
    fn test_json_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonProfileStore::new(dir.path().join("nested").join("player_profile.json"));

        assert!(store.load().unwrap().is_none());

        let profile = sample_profile();
        store.save(&profile).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.level, profile.level);
        assert_eq!(loaded.total_xp, profile.total_xp);
        assert_eq!(loaded.integration_xp, profile.integration_xp);
        for (a, b) in loaded.archetype.to_array().iter().zip(profile.archetype.to_array()) {
            assert!((a - b).abs() < 1e-12);
        }
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn test_json_store_reads_classic_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("player_profile.json");
        fs::write(
            &path,
            r#"{
  "Level": 3,
  "TotalXP": 350,
  "ClarityXP": 87,
  "IntegrationXP": 87,
  "DepthXP": 87,
  "AdaptabilityXP": 87,
  "Initiator": 2.0,
  "Listener": 1.0,
  "Challenger": 1.0,
  "Synthesizer": 0.0,
  "Explorer": 0.0
}"#,
        )
        .unwrap();

        let profile = load_or_create(&JsonProfileStore::new(&path));
        assert_eq!(profile.level, 3);
        assert_eq!(profile.total_xp, 350);
        assert_eq!(profile.depth_xp, 87);
        assert!((profile.archetype.initiator - 0.5).abs() < 1e-12);
        assert!((profile.archetype.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_corrupt_json_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("player_profile.json");
        fs::write(&path, "{ not json").unwrap();

        let store = JsonProfileStore::new(&path);
        assert!(store.load().is_err());
        assert_eq!(load_or_create(&store), PlayerProfile::default());
    }

    #[test]
    fn test_save_failure_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        // The parent "directory" is a regular file, so the write must fail
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();
        let store = JsonProfileStore::new(blocker.join("player_profile.json"));

        assert!(!save_profile(&store, &PlayerProfile::default()));
    }

    #[test]
    fn test_sqlite_store_round_trip() {
        let store = SqliteProfileStore::open_in_memory().unwrap();
        assert!(store.load().unwrap().is_none());
        assert!(store.last_updated().unwrap().is_none());

        let profile = sample_profile();
        assert!(save_profile(&store, &profile));
        assert_eq!(store.load().unwrap(), Some(profile.clone()));
        assert!(store.last_updated().unwrap().is_some());

        // Saving again replaces the single row
        let mut next = profile;
        next.add_xp(10, StatXp::default());
        store.save(&next).unwrap();
        assert_eq!(store.load().unwrap().map(|p| p.total_xp), Some(410));
    }

    #[test]
    fn test_open_store_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let sqlite = open_store(&dir.path().join("profile.db")).unwrap();
        sqlite.save(&PlayerProfile::default()).unwrap();
        assert!(dir.path().join("profile.db").exists());

        let json = open_store(&dir.path().join("profile.json")).unwrap();
        json.save(&PlayerProfile::default()).unwrap();
        let text = fs::read_to_string(dir.path().join("profile.json")).unwrap();
        assert!(text.contains("\"TotalXP\""));
        assert!(text.contains("\"Explorer\""));
    }
}

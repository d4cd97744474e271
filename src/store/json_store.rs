use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Serialize, de::DeserializeOwned};

use crate::engine::mischief::{MischiefStats, MischiefStore};
use crate::session::result::{SessionFilter, SessionRecord};
use crate::store::gateway::{AuthGrant, Gateway, GatewayError, survives_clear};
use crate::store::schema::{ActiveSessionData, AppState};

const STATE_FILE: &str = "data.json";
const SESSIONS_FILE: &str = "sessions.json";
const MISCHIEF_FILE: &str = "mischief.json";
const ACTIVE_SESSION_FILE: &str = "active_session.json";
const NO_USER_KEY: &str = "default";

/// File-backed gateway plus the per-device data that never leaves it
/// (mischief counters, the in-progress run).
pub struct JsonStore {
    base_dir: PathBuf,
    admin_pin: Option<String>,
}

impl JsonStore {
    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)?;
        Ok(Self {
            base_dir,
            admin_pin: None,
        })
    }

    pub fn with_admin_pin(mut self, pin: Option<String>) -> Self {
        self.admin_pin = pin.filter(|p| !p.is_empty());
        self
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    /// Missing or unreadable files load as the default value.
    fn load_or_default<T: DeserializeOwned + Default>(&self, name: &str) -> T {
        let path = self.file_path(name);
        if !path.exists() {
            return T::default();
        }
        match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                log::warn!("ignoring unreadable {}: {e}", path.display());
                T::default()
            }),
            Err(e) => {
                log::warn!("failed to read {}: {e}", path.display());
                T::default()
            }
        }
    }

    /// Missing files load as `None`; corrupt ones are an error.
    fn load_strict<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, GatewayError> {
        let path = self.file_path(name);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save<T: Serialize + ?Sized>(&self, name: &str, data: &T) -> Result<(), GatewayError> {
        let path = self.file_path(name);
        let tmp_path = path.with_extension("tmp");

        let json = serde_json::to_string_pretty(data)?;
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    fn load_sessions(&self) -> Result<Vec<SessionRecord>, GatewayError> {
        Ok(self.load_strict(SESSIONS_FILE)?.unwrap_or_default())
    }

    pub fn load_active_session(&self) -> Option<ActiveSessionData> {
        let data: ActiveSessionData = self.load_or_default(ACTIVE_SESSION_FILE);
        if data.needs_reset() {
            log::info!("discarding in-progress session from an older version");
            return None;
        }
        data.session.is_some().then_some(data)
    }

    pub fn save_active_session(&self, data: &ActiveSessionData) -> Result<()> {
        self.save(ACTIVE_SESSION_FILE, data)?;
        Ok(())
    }

    pub fn clear_active_session(&self) -> Result<()> {
        let path = self.file_path(ACTIVE_SESSION_FILE);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

impl Gateway for JsonStore {
    fn load_state(&self) -> Result<Option<AppState>, GatewayError> {
        self.load_strict(STATE_FILE)
    }

    fn save_state(&self, state: &AppState) -> Result<(), GatewayError> {
        self.save(STATE_FILE, state)
    }

    fn save_session(&self, record: &SessionRecord) -> Result<(), GatewayError> {
        let mut sessions = self.load_sessions()?;
        sessions.push(record.clone());
        self.save(SESSIONS_FILE, &sessions)
    }

    fn query_sessions(&self, filter: &SessionFilter) -> Result<Vec<SessionRecord>, GatewayError> {
        let mut sessions = self.load_sessions()?;
        sessions.retain(|s| filter.matches(s));
        Ok(sessions)
    }

    fn clear_sessions(&self, user_id: Option<&str>) -> Result<(), GatewayError> {
        let mut sessions = self.load_sessions()?;
        sessions.retain(|s| survives_clear(s, user_id));
        self.save(SESSIONS_FILE, &sessions)
    }

    fn authenticate(&self, pin: &str) -> Result<AuthGrant, GatewayError> {
        let state = self.load_state()?.unwrap_or_default();
        let grant = AuthGrant {
            user_ids: state
                .users
                .iter()
                .filter(|u| u.pin.as_deref() == Some(pin))
                .map(|u| u.id.clone())
                .collect(),
            is_admin: self.admin_pin.as_deref() == Some(pin),
        };
        if grant.is_empty() {
            return Err(GatewayError::AuthDenied);
        }
        Ok(grant)
    }
}

impl MischiefStore for JsonStore {
    fn mischief(&self, user_id: Option<&str>) -> MischiefStats {
        let all: HashMap<String, MischiefStats> = self.load_or_default(MISCHIEF_FILE);
        all.get(user_id.unwrap_or(NO_USER_KEY))
            .copied()
            .unwrap_or_default()
    }

    fn set_mischief(&mut self, user_id: Option<&str>, stats: MischiefStats) {
        let mut all: HashMap<String, MischiefStats> = self.load_or_default(MISCHIEF_FILE);
        all.insert(user_id.unwrap_or(NO_USER_KEY).to_string(), stats);
        if let Err(e) = self.save(MISCHIEF_FILE, &all) {
            log::warn!("failed to save mischief stats: {e}");
        }
    }
}

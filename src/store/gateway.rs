use serde::{Deserialize, Serialize};

use crate::session::result::{SessionFilter, SessionRecord};
use crate::store::schema::AppState;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "network")]
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server answered {status} for {path}")]
    Status { status: u16, path: String },

    #[error("PIN not recognised")]
    AuthDenied,
}

/// Who a PIN unlocks.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthGrant {
    #[serde(default)]
    pub user_ids: Vec<String>,
    #[serde(default)]
    pub is_admin: bool,
}

impl AuthGrant {
    pub fn is_empty(&self) -> bool {
        self.user_ids.is_empty() && !self.is_admin
    }

    pub fn allows_user(&self, user_id: &str) -> bool {
        self.is_admin || self.user_ids.iter().any(|id| id == user_id)
    }
}

/// Server of record for household state and the session log.
pub trait Gateway {
    /// `Ok(None)` when nothing has been stored yet.
    fn load_state(&self) -> Result<Option<AppState>, GatewayError>;

    fn save_state(&self, state: &AppState) -> Result<(), GatewayError>;

    /// Append one completed run to the log.
    fn save_session(&self, record: &SessionRecord) -> Result<(), GatewayError>;

    fn query_sessions(&self, filter: &SessionFilter) -> Result<Vec<SessionRecord>, GatewayError>;

    /// With a user, drop that user's and unowned sessions; without, drop all.
    fn clear_sessions(&self, user_id: Option<&str>) -> Result<(), GatewayError>;

    fn authenticate(&self, pin: &str) -> Result<AuthGrant, GatewayError>;
}

/// Sessions kept by a clear for `user_id`.
pub(crate) fn survives_clear(record: &SessionRecord, user_id: Option<&str>) -> bool {
    match (user_id, record.user_id.as_deref()) {
        (None, _) => false,
        (Some(_), None) => false,
        (Some(user), Some(owner)) => owner != user,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::policy::Activity;
    use crate::session::result::{SessionMeta, SessionWordResult};
    use chrono::Utc;

    fn record(user: Option<&str>) -> SessionRecord {
        let meta = SessionMeta {
            id: "s".to_string(),
            date: Utc::now(),
            list_id: "l1".to_string(),
            list_name: "W".to_string(),
            user_id: user.map(str::to_string),
        };
        SessionRecord::from_results(meta, Activity::Learn, false, &[SessionWordResult::new("a", "a", true)])
    }

    #[test]
    fn test_clear_semantics() {
        assert!(!survives_clear(&record(Some("u1")), Some("u1")));
        assert!(!survives_clear(&record(None), Some("u1")));
        assert!(survives_clear(&record(Some("u2")), Some("u1")));
        assert!(!survives_clear(&record(Some("u2")), None));
    }

    #[test]
    fn test_grant_helpers() {
        assert!(AuthGrant::default().is_empty());
        let grant = AuthGrant {
            user_ids: vec!["u1".to_string()],
            is_admin: false,
        };
        assert!(grant.allows_user("u1"));
        assert!(!grant.allows_user("u2"));
        let admin = AuthGrant {
            user_ids: Vec::new(),
            is_admin: true,
        };
        assert!(admin.allows_user("anyone"));
    }

    #[test]
    fn test_error_messages() {
        let err = GatewayError::Status {
            status: 503,
            path: "/api/state".to_string(),
        };
        assert_eq!(err.to_string(), "server answered 503 for /api/state");
        assert_eq!(GatewayError::AuthDenied.to_string(), "PIN not recognised");
    }
}

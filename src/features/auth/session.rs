//! Session persistence with remember-me driven durability.
//!
//! A remembered session goes to the durable storage area and survives a
//! restart; otherwise it lives in the session-scoped area for the lifetime of
//! the process. Only one copy is authoritative: saving to one area removes the
//! entry from the other, and reads never merge the two.

use super::{
    storage::{FileStorage, MemoryStorage, StorageArea},
    token::decode_claims,
};
use crate::api::AppError;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::{path::Path, sync::Arc};
use tracing::{debug, warn};

/// Fixed key under which the session is stored in either area.
pub const SESSION_STORAGE_KEY: &str = "eq_portal.auth";
/// File name of the durable storage area inside the data directory.
pub const DURABLE_STORAGE_FILE: &str = "storage.json";
/// Lifetime assumed for tokens that do not carry an `exp` claim.
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub user: User,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("token", &"[redacted]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl Session {
    /// Builds a session from an access token, using its claims when it is a
    /// JWT and the submitted identifier otherwise.
    #[must_use]
    pub fn from_access_token(token: &str, identifier: &str, now: DateTime<Utc>) -> Self {
        let claims = decode_claims(token).unwrap_or_default();
        let identifier = identifier.trim();
        let fallback_email = if identifier.contains('@') {
            identifier.to_string()
        } else {
            String::new()
        };

        let expires_at = claims
            .exp
            .and_then(|exp| Utc.timestamp_opt(exp, 0).single())
            .unwrap_or_else(|| now + Duration::hours(DEFAULT_SESSION_TTL_HOURS));

        Self {
            user: User {
                id: claims.sub.unwrap_or_default(),
                email: claims.email.unwrap_or(fallback_email),
                name: claims.name.unwrap_or_else(|| identifier.to_string()),
            },
            token: token.trim().to_string(),
            expires_at,
        }
    }

    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.token.trim().is_empty() && self.expires_at > now
    }
}

/// Where a stored session was found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Durability {
    Persistent,
    SessionScoped,
}

pub struct SessionStore {
    durable: Arc<dyn StorageArea>,
    scoped: Arc<dyn StorageArea>,
}

impl SessionStore {
    #[must_use]
    pub fn new(durable: Arc<dyn StorageArea>, scoped: Arc<dyn StorageArea>) -> Self {
        Self { durable, scoped }
    }

    /// Durable area in `data_dir`, session-scoped area in memory.
    #[must_use]
    pub fn open(data_dir: &Path) -> Self {
        Self::new(
            Arc::new(FileStorage::new(data_dir.join(DURABLE_STORAGE_FILE))),
            Arc::new(MemoryStorage::new()),
        )
    }

    /// Persists the session. `persistent` selects the durable area.
    ///
    /// # Errors
    /// Returns [`AppError::Storage`] when the session has no token or the
    /// storage area cannot be written.
    pub fn save(&self, session: &Session, persistent: bool) -> Result<(), AppError> {
        if session.token.trim().is_empty() {
            return Err(AppError::Storage(
                "refusing to persist a session without a token".to_string(),
            ));
        }

        let raw = serde_json::to_string(session)
            .map_err(|err| AppError::Serialization(format!("Failed to encode session: {err}")))?;
        let (target, other) = if persistent {
            (&self.durable, &self.scoped)
        } else {
            (&self.scoped, &self.durable)
        };

        // Clear the other area first so a failed save never leaves a session.
        other.remove_item(SESSION_STORAGE_KEY)?;
        target.set_item(SESSION_STORAGE_KEY, &raw)?;
        debug!(persistent, "session saved");
        Ok(())
    }

    /// Returns the current session, preferring the durable area.
    #[must_use]
    pub fn get(&self) -> Option<Session> {
        self.get_at(Utc::now())
    }

    #[must_use]
    pub fn get_at(&self, now: DateTime<Utc>) -> Option<Session> {
        self.lookup(now).map(|(session, _)| session)
    }

    /// Returns the current session and the area it was read from.
    #[must_use]
    pub fn lookup(&self, now: DateTime<Utc>) -> Option<(Session, Durability)> {
        [
            (&self.durable, Durability::Persistent),
            (&self.scoped, Durability::SessionScoped),
        ]
        .into_iter()
        .find_map(|(area, durability)| {
            read_valid(area.as_ref(), durability, now).map(|session| (session, durability))
        })
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.get().is_some()
    }

    /// Removes the session from both areas.
    ///
    /// # Errors
    /// Returns [`AppError::Storage`] when either area cannot be written.
    pub fn clear(&self) -> Result<(), AppError> {
        let durable = self.durable.remove_item(SESSION_STORAGE_KEY);
        let scoped = self.scoped.remove_item(SESSION_STORAGE_KEY);
        durable?;
        scoped?;
        debug!("session cleared");
        Ok(())
    }
}

// Expired or undecodable entries are dropped so they are never read again.
fn read_valid(area: &dyn StorageArea, durability: Durability, now: DateTime<Utc>) -> Option<Session> {
    let raw = match area.get_item(SESSION_STORAGE_KEY) {
        Ok(raw) => raw?,
        Err(err) => {
            warn!(?durability, "failed to read session: {err}");
            return None;
        }
    };

    match serde_json::from_str::<Session>(&raw) {
        Ok(session) if session.is_valid_at(now) => Some(session),
        Ok(_) => {
            debug!(?durability, "discarding expired session");
            discard(area, durability);
            None
        }
        Err(err) => {
            warn!(?durability, "discarding undecodable session: {err}");
            discard(area, durability);
            None
        }
    }
}

fn discard(area: &dyn StorageArea, durability: Durability) {
    if let Err(err) = area.remove_item(SESSION_STORAGE_KEY) {
        warn!(?durability, "failed to remove stale session: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::auth::{storage::StorageError, token::encode_test_jwt};
    use serde_json::json;

    fn session(token: &str, expires_at: DateTime<Utc>) -> Session {
        Session {
            user: User {
                id: "u-1".to_string(),
                email: "ada@eq.test".to_string(),
                name: "Ada".to_string(),
            },
            token: token.to_string(),
            expires_at,
        }
    }

    fn stores() -> (Arc<MemoryStorage>, Arc<MemoryStorage>, SessionStore) {
        let durable = Arc::new(MemoryStorage::new());
        let scoped = Arc::new(MemoryStorage::new());
        let store = SessionStore::new(durable.clone(), scoped.clone());
        (durable, scoped, store)
    }

    #[test]
    fn from_access_token_uses_jwt_claims() {
        let now = Utc::now();
        let token = encode_test_jwt(&json!({
            "sub": "u-9",
            "email": "grace@eq.test",
            "name": "Grace",
            "exp": 4_102_444_800_i64
        }));

        let session = Session::from_access_token(&token, "someone", now);
        assert_eq!(session.user.id, "u-9");
        assert_eq!(session.user.email, "grace@eq.test");
        assert_eq!(session.user.name, "Grace");
        assert_eq!(session.expires_at.timestamp(), 4_102_444_800);
    }

    #[test]
    fn from_access_token_falls_back_to_identifier() {
        let now = Utc::now();
        let session = Session::from_access_token("opaque", " ada@eq.test ", now);
        assert_eq!(session.user.id, "");
        assert_eq!(session.user.email, "ada@eq.test");
        assert_eq!(session.user.name, "ada@eq.test");
        assert_eq!(
            session.expires_at,
            now + Duration::hours(DEFAULT_SESSION_TTL_HOURS)
        );

        let session = Session::from_access_token("opaque", "ada", now);
        assert_eq!(session.user.email, "");
        assert_eq!(session.user.name, "ada");
    }

    #[test]
    fn save_rejects_empty_token() {
        let (durable, scoped, store) = stores();
        let result = store.save(&session("  ", Utc::now() + Duration::hours(1)), true);
        assert!(matches!(result, Err(AppError::Storage(_))));
        assert_eq!(durable.get_item(SESSION_STORAGE_KEY).ok().flatten(), None);
        assert_eq!(scoped.get_item(SESSION_STORAGE_KEY).ok().flatten(), None);
    }

    #[test]
    fn save_selects_area_and_keeps_one_copy() -> Result<(), AppError> {
        let (durable, scoped, store) = stores();
        let later = Utc::now() + Duration::hours(1);

        store.save(&session("scoped", later), false)?;
        assert!(scoped.get_item(SESSION_STORAGE_KEY)?.is_some());
        assert!(durable.get_item(SESSION_STORAGE_KEY)?.is_none());

        store.save(&session("durable", later), true)?;
        assert!(durable.get_item(SESSION_STORAGE_KEY)?.is_some());
        assert!(scoped.get_item(SESSION_STORAGE_KEY)?.is_none());

        let (found, durability) = store.lookup(Utc::now()).expect("session");
        assert_eq!(found.token, "durable");
        assert_eq!(durability, Durability::Persistent);
        Ok(())
    }

    #[test]
    fn get_prefers_durable_and_never_merges() -> Result<(), AppError> {
        let (durable, scoped, store) = stores();
        let later = Utc::now() + Duration::hours(1);
        let durable_session = session("durable", later);
        let mut scoped_session = session("scoped", later);
        scoped_session.user.name = "Other".to_string();

        durable.set_item(SESSION_STORAGE_KEY, &serde_json::to_string(&durable_session).unwrap_or_default())?;
        scoped.set_item(SESSION_STORAGE_KEY, &serde_json::to_string(&scoped_session).unwrap_or_default())?;

        assert_eq!(store.get(), Some(durable_session));
        Ok(())
    }

    #[test]
    fn expired_sessions_are_discarded() -> Result<(), AppError> {
        let (durable, _scoped, store) = stores();
        let now = Utc::now();
        store.save(&session("old", now - Duration::minutes(1)), true)?;

        assert_eq!(store.get_at(now), None);
        assert!(durable.get_item(SESSION_STORAGE_KEY)?.is_none());
        Ok(())
    }

    #[test]
    fn corrupt_durable_entry_falls_through_to_scoped() -> Result<(), AppError> {
        let (durable, _scoped, store) = stores();
        let later = Utc::now() + Duration::hours(1);
        store.save(&session("scoped", later), false)?;
        durable.set_item(SESSION_STORAGE_KEY, "{broken")?;

        let found = store.get().expect("scoped session");
        assert_eq!(found.token, "scoped");
        assert!(durable.get_item(SESSION_STORAGE_KEY)?.is_none());
        Ok(())
    }

    #[test]
    fn clear_removes_both_areas() -> Result<(), AppError> {
        let (durable, scoped, store) = stores();
        let later = Utc::now() + Duration::hours(1);
        durable.set_item(SESSION_STORAGE_KEY, "x")?;
        store.save(&session("scoped", later), false)?;
        durable.set_item(SESSION_STORAGE_KEY, "x")?;

        store.clear()?;
        assert!(durable.get_item(SESSION_STORAGE_KEY)?.is_none());
        assert!(scoped.get_item(SESSION_STORAGE_KEY)?.is_none());
        assert!(!store.is_authenticated());
        Ok(())
    }

    #[test]
    fn debug_redacts_token() {
        let rendered = format!("{:?}", session("secret-token", Utc::now()));
        assert!(!rendered.contains("secret-token"));
    }

    #[test]
    fn persistent_session_survives_reopen() -> Result<(), AppError> {
        let dir = tempfile::tempdir().map_err(|err| AppError::Storage(err.to_string()))?;
        let later = Utc::now() + Duration::hours(1);

        SessionStore::open(dir.path()).save(&session("kept", later), true)?;
        assert_eq!(
            SessionStore::open(dir.path()).get().map(|s| s.token),
            Some("kept".to_string())
        );

        SessionStore::open(dir.path()).save(&session("tab", later), false)?;
        assert_eq!(SessionStore::open(dir.path()).get(), None);
        Ok(())
    }

    #[test]
    fn corrupt_storage_file_does_not_block_saves() -> Result<(), AppError> {
        let dir = tempfile::tempdir().map_err(|err| AppError::Storage(err.to_string()))?;
        std::fs::write(dir.path().join(DURABLE_STORAGE_FILE), "{broken")
            .map_err(|err| AppError::Storage(err.to_string()))?;
        let later = Utc::now() + Duration::hours(1);
        let store = SessionStore::open(dir.path());

        assert_eq!(store.get(), None);

        store.save(&session("tab", later), false)?;
        assert_eq!(
            store.lookup(Utc::now()).map(|(s, d)| (s.token, d)),
            Some(("tab".to_string(), Durability::SessionScoped))
        );

        store.save(&session("kept", later), true)?;
        assert_eq!(
            SessionStore::open(dir.path()).get().map(|s| s.token),
            Some("kept".to_string())
        );

        store.clear()?;
        assert_eq!(store.get(), None);
        Ok(())
    }

    struct RejectingStorage;

    impl StorageArea for RejectingStorage {
        fn get_item(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn set_item(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Poisoned)
        }

        fn remove_item(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Poisoned)
        }
    }

    #[test]
    fn failed_save_leaves_no_session_behind() {
        let scoped = Arc::new(MemoryStorage::new());
        let store = SessionStore::new(Arc::new(RejectingStorage), scoped.clone());
        let later = Utc::now() + Duration::hours(1);

        assert!(matches!(
            store.save(&session("tab", later), false),
            Err(AppError::Storage(_))
        ));
        assert_eq!(scoped.get_item(SESSION_STORAGE_KEY).ok().flatten(), None);
        assert_eq!(store.get(), None);
    }
}

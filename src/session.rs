//! Signed-in session: token, role and the persisted session file.
//!
//! The JWT payload is decoded locally and trusted as-is. The signature is never
//! checked here; the backend remains the authority on every request.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::error::{AppError, Result};
use crate::routing::Role;

const SESSION_FILE: &str = "session.json";

/// Claims read from the token payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Claims {
    /// Username or email.
    pub sub: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, alias = "userId", alias = "user_id")]
    pub user_id: Option<i64>,
    /// Expiry as seconds since the epoch.
    #[serde(default)]
    pub exp: Option<i64>,
}

/// Decode the payload segment of a JWT without verifying it.
pub fn decode_claims(token: &str) -> Result<Claims> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| AppError::session("token is not a JWT"))?;

    // Some issuers keep the padding; the no-pad engine rejects it.
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| AppError::session(format!("invalid token payload: {e}")))?;

    Ok(serde_json::from_slice(&bytes)?)
}

/// Everything the portal remembers about the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub role: Role,
    pub username: String,
    pub user_id: Option<i64>,
    /// Patient or staff record id, resolved after login.
    #[serde(default)]
    pub profile_id: Option<i64>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Build a session from a freshly issued token.
    ///
    /// `fallback_role` covers backends that return the role next to the token
    /// instead of inside it.
    pub fn from_token(token: &str, fallback_role: Option<&str>) -> Result<Self> {
        let claims = decode_claims(token)?;
        let role_str = claims
            .role
            .as_deref()
            .or(fallback_role)
            .ok_or_else(|| AppError::session("token carries no role"))?;
        let role = role_str.parse::<Role>().map_err(AppError::session)?;

        Ok(Self {
            token: token.to_string(),
            role,
            username: claims.sub,
            user_id: claims.user_id,
            profile_id: None,
            expires_at: claims.exp.and_then(|secs| DateTime::from_timestamp(secs, 0)),
        })
    }

    /// Whether the token expiry has passed at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }

    /// Patients may only see their own data; staff may see any patient.
    pub fn can_access_patient(&self, patient_id: i64) -> bool {
        match self.role {
            Role::Patient => self.profile_id == Some(patient_id),
            Role::Doctor | Role::Radiologist | Role::Admin => true,
        }
    }

    /// Fail with `Forbidden` when [`Self::can_access_patient`] says no.
    pub fn ensure_patient_access(&self, patient_id: i64) -> Result<()> {
        if self.can_access_patient(patient_id) {
            Ok(())
        } else {
            Err(AppError::forbidden("patients can only access their own records"))
        }
    }
}

/// Session file on disk, the desktop counterpart of browser storage.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(SESSION_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored session, if any. Unreadable files count as absent.
    pub fn load(&self) -> Option<Session> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&content) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!("Ignoring unreadable session file {:?}: {}", self.path, e);
                None
            }
        }
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(session)?)?;
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Shared, thread-safe view of the current session.
///
/// The API client reads the token from here on every request and clears it on
/// a 401; the UI reads the role from here on every frame.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    inner: Arc<RwLock<Option<Session>>>,
    store: Option<SessionStore>,
}

impl SessionHandle {
    /// In-memory handle with no persistence.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Handle backed by a session file, pre-loaded from it.
    pub fn persistent(store: SessionStore) -> Self {
        let loaded = store.load().filter(|s| !s.is_expired(Utc::now()));
        Self {
            inner: Arc::new(RwLock::new(loaded)),
            store: Some(store),
        }
    }

    pub fn current(&self) -> Option<Session> {
        self.inner.read().ok().and_then(|guard| guard.clone())
    }

    pub fn token(&self) -> Option<String> {
        self.inner
            .read()
            .ok()
            .and_then(|guard| guard.as_ref().map(|s| s.token.clone()))
    }

    pub fn role(&self) -> Option<Role> {
        self.inner.read().ok().and_then(|guard| guard.as_ref().map(|s| s.role))
    }

    pub fn is_signed_in(&self) -> bool {
        self.token().is_some()
    }

    /// Replace the current session and persist it.
    pub fn set(&self, session: Session) {
        if let Some(store) = &self.store
            && let Err(e) = store.save(&session)
        {
            tracing::warn!("Failed to persist session: {}", e);
        }
        if let Ok(mut guard) = self.inner.write() {
            *guard = Some(session);
        }
    }

    /// Record the patient/staff id resolved after login.
    pub fn set_profile_id(&self, profile_id: Option<i64>) {
        let updated = match self.inner.write() {
            Ok(mut guard) => guard.as_mut().map(|s| {
                s.profile_id = profile_id;
                s.clone()
            }),
            Err(_) => None,
        };
        if let (Some(store), Some(session)) = (&self.store, updated)
            && let Err(e) = store.save(&session)
        {
            tracing::warn!("Failed to persist session: {}", e);
        }
    }

    /// Drop the session from memory and disk.
    pub fn clear(&self) {
        if let Ok(mut guard) = self.inner.write() {
            *guard = None;
        }
        if let Some(store) = &self.store
            && let Err(e) = store.clear()
        {
            tracing::warn!("Failed to remove session file: {}", e);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build an unsigned token with the given JSON payload.
    pub(crate) fn make_token(payload: &str) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload);
        format!("{header}.{body}.signature")
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("portal_session_{name}_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_decode_claims() {
        let token = make_token(r#"{"sub":"jane@example.org","role":"DOCTOR","userId":12,"exp":4102444800}"#);
        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.sub, "jane@example.org");
        assert_eq!(claims.role.as_deref(), Some("DOCTOR"));
        assert_eq!(claims.user_id, Some(12));
        assert_eq!(claims.exp, Some(4102444800));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_claims("not-a-token").is_err());
        assert!(decode_claims("a.!!!.c").is_err());
    }

    #[test]
    fn test_session_from_token_uses_fallback_role() {
        let token = make_token(r#"{"sub":"pat"}"#);
        let session = Session::from_token(&token, Some("ROLE_PATIENT")).unwrap();
        assert_eq!(session.role, Role::Patient);
        assert_eq!(session.username, "pat");

        assert!(Session::from_token(&token, None).is_err());
    }

    #[test]
    fn test_expiry() {
        let token = make_token(r#"{"sub":"a","role":"ADMIN","exp":1000}"#);
        let session = Session::from_token(&token, None).unwrap();
        assert!(session.is_expired(Utc::now()));
    }

    #[test]
    fn test_patient_can_only_access_own_record() {
        let token = make_token(r#"{"sub":"p","role":"PATIENT"}"#);
        let mut session = Session::from_token(&token, None).unwrap();
        session.profile_id = Some(7);

        assert!(session.can_access_patient(7));
        assert!(!session.can_access_patient(8));
        assert!(matches!(session.ensure_patient_access(8), Err(AppError::Forbidden(_))));
    }

    #[test]
    fn test_patient_without_profile_has_no_access() {
        let token = make_token(r#"{"sub":"p","role":"PATIENT"}"#);
        let session = Session::from_token(&token, None).unwrap();
        assert!(!session.can_access_patient(1));
    }

    #[test]
    fn test_staff_can_access_any_patient() {
        let token = make_token(r#"{"sub":"r","role":"RADIOLOGIST"}"#);
        let session = Session::from_token(&token, None).unwrap();
        assert!(session.can_access_patient(1));
        assert!(session.can_access_patient(999));
    }

    #[test]
    fn test_store_save_load_clear() {
        let dir = temp_dir("store");
        let store = SessionStore::new(&dir);
        let token = make_token(r#"{"sub":"d","role":"DOCTOR","userId":3}"#);
        let session = Session::from_token(&token, None).unwrap();

        store.save(&session).unwrap();
        assert_eq!(store.load(), Some(session));

        store.clear().unwrap();
        assert_eq!(store.load(), None);
        // Clearing twice is fine
        store.clear().unwrap();

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_handle_clear_removes_file() {
        let dir = temp_dir("handle");
        let store = SessionStore::new(&dir);
        let handle = SessionHandle::persistent(store.clone());
        assert!(!handle.is_signed_in());

        let token = make_token(r#"{"sub":"a","role":"ADMIN"}"#);
        handle.set(Session::from_token(&token, None).unwrap());
        assert_eq!(handle.role(), Some(Role::Admin));
        assert!(store.path().exists());

        handle.set_profile_id(Some(42));
        assert_eq!(store.load().and_then(|s| s.profile_id), Some(42));

        handle.clear();
        assert!(!handle.is_signed_in());
        assert!(!store.path().exists());

        std::fs::remove_dir_all(&dir).ok();
    }
}

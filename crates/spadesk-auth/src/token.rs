//! Durable bearer token storage.

use crate::Result;
use crate::jwt::decode_claims;

use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use spadesk_api::{
    Claims, DurableStorage, STORAGE_KEY_ROLE, STORAGE_KEY_TOKEN, STORAGE_KEY_USER, SpaError,
    UserProfile,
};

/// Holds the bearer token and the profile that came with it.
///
/// The `token`, `user` and `role` keys are written and removed together. Claims
/// are never persisted on their own; [`TokenStore::decode`] derives them from the
/// token every time.
pub struct TokenStore {
    storage: Arc<dyn DurableStorage>,
    token: RwLock<Option<String>>,
}

impl TokenStore {
    /// Hydrate from durable storage. A stored token that does not decode or has
    /// expired is discarded along with its companion keys.
    pub fn open(storage: Arc<dyn DurableStorage>) -> Self {
        Self::open_at(storage, now_unix())
    }

    pub fn open_at(storage: Arc<dyn DurableStorage>, now_unix: i64) -> Self {
        let stored = storage.get(STORAGE_KEY_TOKEN).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to read stored token");
            None
        });

        let store = Self {
            storage,
            token: RwLock::new(None),
        };

        if let Some(token) = stored {
            match decode_claims(&token) {
                Ok(claims) if !claims.is_expired(now_unix) => {
                    tracing::debug!(role = %claims.role, "restored session from storage");
                    *store.lock() = Some(token);
                }
                Ok(_) => {
                    tracing::info!("stored token has expired, starting anonymous");
                    store.remove_all();
                }
                Err(e) => {
                    tracing::warn!(error = %e, "stored token is unreadable, starting anonymous");
                    store.remove_all();
                }
            }
        }

        store
    }

    /// Store a freshly issued token with its profile. The token must decode;
    /// otherwise nothing is written.
    pub fn set(&self, token: &str, user: &UserProfile) -> Result<Claims> {
        let claims = decode_claims(token)?;
        let user_json = serde_json::to_string(user)
            .map_err(|e| SpaError::Storage(format!("failed to encode user: {e}")))?;

        let mut guard = self.lock();
        let written = self
            .storage
            .set(STORAGE_KEY_TOKEN, token)
            .and_then(|()| self.storage.set(STORAGE_KEY_USER, &user_json))
            .and_then(|()| self.storage.set(STORAGE_KEY_ROLE, claims.role.as_str()));

        if let Err(e) = written {
            self.remove_all();
            *guard = None;
            return Err(e);
        }

        *guard = Some(token.to_string());
        Ok(claims)
    }

    pub fn get(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Remove the token and its companion keys. Returns whether a token was
    /// held; clearing an empty store is a no-op.
    pub fn clear(&self) -> bool {
        let mut guard = self.lock();
        let had_token = guard.take().is_some();
        self.remove_all();
        had_token
    }

    /// Claims of the held token, if any. Never fails.
    pub fn decode(&self) -> Option<Claims> {
        self.get().and_then(|token| decode_claims(&token).ok())
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.get()?;
        let json = self.storage.get(STORAGE_KEY_USER).ok()??;
        serde_json::from_str(&json).ok()
    }

    fn lock(&self) -> RwLockWriteGuard<'_, Option<String>> {
        self.token.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn remove_all(&self) {
        for key in [STORAGE_KEY_TOKEN, STORAGE_KEY_USER, STORAGE_KEY_ROLE] {
            if let Err(e) = self.storage.remove(key) {
                tracing::warn!(key, error = %e, "failed to remove session key");
            }
        }
    }
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
}

//! Process-wide session state: who is logged in, and with which token.

use super::{
    errors::{AuthError, AuthResult},
    models::{AuthSession, User},
    storage::{KeyValueStore, TOKEN_KEY, USER_KEY},
};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default, Clone)]
struct Cached {
    token: Option<String>,
    user: Option<User>,
}

/// Single source of truth for the logged-in session.
///
/// Durable state is read once by [`SessionStore::hydrate`]; afterwards reads
/// are served from memory and every mutation writes through to storage
/// before the in-memory copy changes. Only this type writes the session keys.
pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
    cached: RwLock<Cached>,
}

impl SessionStore {
    /// Load the persisted session from `storage`.
    ///
    /// A user snapshot that fails to decode, or a storage document that
    /// cannot be parsed, is treated as logged out rather than an error.
    ///
    /// # Errors
    ///
    /// * `AuthError::Storage` - Storage could not be read at all
    pub fn hydrate(storage: Arc<dyn KeyValueStore>) -> AuthResult<Self> {
        let token = storage.get(TOKEN_KEY)?.filter(|t| !t.is_empty());
        let user = match storage.get(USER_KEY)? {
            Some(raw) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    log::warn!("Ignoring malformed cached user: {e}");
                    None
                }
            },
            None => None,
        };

        log::debug!(
            "Session hydrated (token: {}, user: {})",
            token.is_some(),
            user.as_ref().map(|u| u.email.as_str()).unwrap_or("-")
        );

        Ok(Self {
            storage,
            cached: RwLock::new(Cached { token, user }),
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, Cached> {
        self.cached
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Cached> {
        self.cached
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Persist token and user together.
    ///
    /// # Errors
    ///
    /// * `AuthError::EmptyToken` - `token` is empty
    /// * `AuthError::Storage` - Write failed; in-memory state is unchanged
    pub fn save_auth(&self, token: &str, user: &User) -> AuthResult<()> {
        if token.is_empty() {
            return Err(AuthError::EmptyToken);
        }

        let encoded = serde_json::to_string(user)?;
        let mut cached = self.write();
        self.storage
            .set_many(&[(TOKEN_KEY, token), (USER_KEY, encoded.as_str())])?;
        cached.token = Some(token.to_string());
        cached.user = Some(user.clone());

        log::info!("Saved session for {} ({})", user.email, user.role);
        Ok(())
    }

    /// Replace the cached user after a profile edit, keeping the token.
    ///
    /// # Errors
    ///
    /// * `AuthError::NotAuthenticated` - No token is stored
    pub fn update_user(&self, user: &User) -> AuthResult<()> {
        let token = self.token().ok_or(AuthError::NotAuthenticated)?;
        self.save_auth(&token, user)
    }

    /// Replace the token after a refresh, keeping the cached user.
    ///
    /// # Errors
    ///
    /// * `AuthError::NotAuthenticated` - No user is cached
    pub fn replace_token(&self, token: &str) -> AuthResult<()> {
        let user = self.current_user().ok_or(AuthError::NotAuthenticated)?;
        self.save_auth(token, &user)
    }

    /// Current bearer token, if any
    pub fn token(&self) -> Option<String> {
        self.read().token.clone()
    }

    /// Current user snapshot, if any
    pub fn current_user(&self) -> Option<User> {
        self.read().user.clone()
    }

    /// Token and user, only when both are present
    pub fn session(&self) -> Option<AuthSession> {
        let cached = self.read();
        match (&cached.token, &cached.user) {
            (Some(token), Some(user)) => Some(AuthSession {
                token: token.clone(),
                user: user.clone(),
            }),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().user.is_some()
    }

    /// Clear both session keys.
    ///
    /// # Errors
    ///
    /// * `AuthError::Storage` - Keys could not be removed; in-memory state is unchanged
    pub fn logout(&self) -> AuthResult<()> {
        let mut cached = self.write();
        self.storage.remove_many(&[TOKEN_KEY, USER_KEY])?;
        if let Some(user) = cached.user.take() {
            log::info!("Logged out {}", user.email);
        }
        cached.token = None;
        Ok(())
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cached = self.read();
        f.debug_struct("SessionStore")
            .field("authenticated", &cached.user.is_some())
            .field("has_token", &cached.token.is_some())
            .finish()
    }
}

//! Session state, durable storage and route guarding.
//!
//! This module provides:
//! - A [`SessionStore`] hydrated once at startup from durable storage
//! - Atomic token + user persistence under the `skillatics_token` and
//!   `skillatics_user` keys
//! - A closed [`Role`] enum and exhaustive route guarding
//!
//! ## Example
//!
//! ```
//! use skillatics::auth::{guard, GuardDecision, MemoryStore, Route, SessionStore};
//! use std::sync::Arc;
//!
//! let session = SessionStore::hydrate(Arc::new(MemoryStore::new())).unwrap();
//! let decision = guard(Route::Test, session.current_user().as_ref());
//! assert_eq!(decision, GuardDecision::Redirect(Route::Login));
//! ```

pub mod errors;
pub mod guard;
pub mod models;
pub mod storage;
pub mod store;

pub use errors::{AuthError, AuthResult};
pub use guard::{Access, GuardDecision, Route, guard};
pub use models::{
    AuthSession, OtpPurpose, OtpRequest, ProfileUpdate, Role, TokenResponse, User, UserId,
    VerifyOtpRequest, validate_email, validate_otp,
};
pub use storage::{FileStore, KeyValueStore, MemoryStore, TOKEN_KEY, USER_KEY};
pub use store::SessionStore;

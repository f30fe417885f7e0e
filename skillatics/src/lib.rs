//! # Skillatics
//!
//! Client library for the Skillatics placement-readiness platform: adaptive
//! aptitude tests, coding practice against a remote judge, and proctoring.
//!
//! The library owns every stateful flow so a front end only renders state
//! and forwards input.
//!
//! ## Core Modules
//!
//! - [`auth`]: Session store, durable storage and the role-based route guard
//! - [`api`]: REST gateway with bearer injection and bounded read retries
//! - [`test_session`]: Adaptive test state machine and its driver
//! - [`coding`]: Code editor state, language templates, run and submit
//! - [`proctor`]: Violation collection and scoped camera ownership
//! - [`config`]: Environment-driven client configuration
//!
//! ## Example
//!
//! ```
//! use skillatics::auth::{MemoryStore, Route, SessionStore, guard, GuardDecision};
//! use std::sync::Arc;
//!
//! let session = SessionStore::hydrate(Arc::new(MemoryStore::new())).unwrap();
//! let decision = guard(Route::Test, session.current_user().as_ref());
//! assert_eq!(decision, GuardDecision::Redirect(Route::Login));
//! ```

pub mod api;
pub mod auth;
pub mod coding;
pub mod config;
pub mod proctor;
pub mod single_flight;
pub mod test_session;

pub use api::{ApiClient, ApiError, ApiResult};
pub use auth::{Role, SessionStore, User};
pub use config::{ClientConfig, ConfigError};

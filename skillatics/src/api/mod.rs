//! REST gateway: one [`ApiClient`] for every backend endpoint.
//!
//! Every request reads the bearer token from the session store when it is
//! built and carries an `X-Request-Id`. Reads are retried with bounded
//! backoff; writes are sent once.

mod admin;
pub mod client;
pub mod errors;
mod insights;
mod learning;
pub mod models;
pub mod retry;

pub use client::{ApiClient, REQUEST_ID_HEADER};
pub use errors::{ApiError, ApiResult};
pub use insights::DEFAULT_LEADERBOARD_LIMIT;
pub use models::*;
pub use retry::{RetryPolicy, with_retry};

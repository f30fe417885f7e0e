//! HTTP gateway to the Skillatics REST API.

use super::errors::{ApiError, ApiResult};
use super::models::ProfileResponse;
use super::retry::{RetryPolicy, with_retry};
use crate::auth::{
    OtpPurpose, OtpRequest, ProfileUpdate, SessionStore, TokenResponse, User, VerifyOtpRequest,
    validate_email, validate_otp,
};
use crate::config::ClientConfig;
use reqwest::{Method, RequestBuilder};
use serde::de::{DeserializeOwned, IgnoredAny};
use std::sync::Arc;
use uuid::Uuid;

/// Header carrying the per-request correlation id
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Paths callable without a stored token
const PUBLIC_PATHS: &[&str] = &["/auth/request-otp", "/auth/verify-otp"];

/// Client for every backend endpoint.
///
/// The bearer token is read from the [`SessionStore`] when each request is
/// built, so a login or logout on one handle is seen by every clone.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
    session: Arc<SessionStore>,
}

impl ApiClient {
    /// Create a client from validated configuration
    ///
    /// # Errors
    ///
    /// * `ApiError::Network` - The HTTP client could not be constructed
    pub fn new(config: &ClientConfig, session: Arc<SessionStore>) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(concat!("skillatics/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            retry: config.retry,
            session,
        })
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a request and decode the JSON body.
    ///
    /// `decorate` attaches the body and is called once per attempt. Only
    /// GET is retried.
    pub(crate) async fn call<T, F>(&self, method: Method, path: &str, decorate: F) -> ApiResult<T>
    where
        T: DeserializeOwned,
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        let token = self.session.token();
        if token.is_none() && !PUBLIC_PATHS.contains(&path) {
            return Err(ApiError::NotAuthenticated);
        }

        let policy = if method == Method::GET {
            self.retry
        } else {
            RetryPolicy::none()
        };
        let label = format!("{method} {path}");
        let url = format!("{}{}", self.base_url, path);

        with_retry(policy, &label, |attempt| {
            let request_id = Uuid::new_v4().to_string();
            let mut builder = self
                .http
                .request(method.clone(), &url)
                .header(REQUEST_ID_HEADER, &request_id);
            if let Some(token) = &token {
                builder = builder.bearer_auth(token);
            }
            let request = decorate(builder);
            let label = &label;

            async move {
                log::debug!("{label} (request {request_id}, attempt {attempt})");
                let response = request.send().await?;
                let status = response.status();
                let body = response.text().await?;

                if !status.is_success() {
                    let err = ApiError::from_status(status.as_u16(), &body);
                    log::debug!("{label} (request {request_id}) failed: {err}");
                    return Err(err);
                }
                decode(&body)
            }
        })
        .await
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.call(Method::GET, path, |b| b).await
    }

    pub(crate) async fn post<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.call(Method::POST, path, |b| b.json(body)).await
    }

    pub(crate) async fn put<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.call(Method::PUT, path, |b| b.json(body)).await
    }

    /// Send and discard whatever the backend replies with
    pub(crate) async fn ack(&self, method: Method, path: &str, body: Option<&serde_json::Value>) -> ApiResult<()> {
        let _: IgnoredAny = self
            .call(method, path, |b| match body {
                Some(body) => b.json(body),
                None => b,
            })
            .await?;
        Ok(())
    }

    // Auth

    /// Ask the backend to email a one-time code
    pub async fn request_otp(
        &self,
        email: &str,
        purpose: OtpPurpose,
        name: Option<&str>,
    ) -> ApiResult<()> {
        validate_email(email).map_err(ApiError::Validation)?;
        if purpose == OtpPurpose::Register && name.is_none_or(|n| n.trim().is_empty()) {
            return Err(ApiError::Validation("Name is required to register".to_string()));
        }

        let request = OtpRequest {
            email: email.trim().to_string(),
            purpose,
            name: name.map(|n| n.trim().to_string()),
        };
        let _: IgnoredAny = self.post("/auth/request-otp", &request).await?;
        log::info!("OTP requested for {} ({purpose:?})", request.email);
        Ok(())
    }

    /// Exchange an OTP for a token without touching the session
    pub async fn verify_otp(
        &self,
        email: &str,
        otp: &str,
        name: Option<&str>,
    ) -> ApiResult<TokenResponse> {
        validate_email(email).map_err(ApiError::Validation)?;
        validate_otp(otp).map_err(ApiError::Validation)?;

        let request = VerifyOtpRequest {
            email: email.trim().to_string(),
            otp: otp.to_string(),
            name: name.map(|n| n.trim().to_string()),
        };
        self.post("/auth/verify-otp", &request).await
    }

    /// Verify an OTP and persist the resulting session.
    ///
    /// # Errors
    ///
    /// * `ApiError::Validation` - Malformed email or OTP; nothing was sent
    /// * `ApiError::Decode` - The backend returned a token without a user
    /// * `ApiError::Session` - The session could not be written
    pub async fn login_with_otp(&self, email: &str, otp: &str, name: Option<&str>) -> ApiResult<User> {
        let response = self.verify_otp(email, otp, name).await?;
        let Some(user) = response.user else {
            return Err(ApiError::Decode(
                "verification response carried no user".to_string(),
            ));
        };

        self.session.save_auth(&response.token, &user)?;
        log::info!("Logged in as {} ({})", user.email, user.role);
        Ok(user)
    }

    /// Save profile fields and refresh the cached user from the reply
    pub async fn update_profile(&self, update: &ProfileUpdate) -> ApiResult<Option<User>> {
        if update.is_empty() {
            return Err(ApiError::Validation("Nothing to update".to_string()));
        }
        update.validate().map_err(ApiError::Validation)?;

        let response: Option<ProfileResponse> = self.post("/auth/update-profile", update).await?;
        let response = response.unwrap_or_default();

        match (response.token.filter(|t| !t.is_empty()), response.user) {
            (Some(token), Some(user)) => self.session.save_auth(&token, &user)?,
            (None, Some(user)) => self.session.update_user(&user)?,
            (Some(token), None) => self.session.replace_token(&token)?,
            (None, None) => log::debug!("Profile update returned no user"),
        }
        Ok(self.session.current_user())
    }

    /// Swap the stored token for a fresh one
    pub async fn refresh_token(&self) -> ApiResult<()> {
        let response: TokenResponse = self
            .call(Method::POST, "/auth/refresh-token", |b| b)
            .await?;

        match response.user {
            Some(user) => self.session.save_auth(&response.token, &user)?,
            None => self.session.replace_token(&response.token)?,
        }
        log::debug!("Session token refreshed");
        Ok(())
    }

    /// Clear the local session; the backend keeps no logout state
    pub fn logout(&self) -> ApiResult<()> {
        self.session.logout()?;
        log::info!("Logged out");
        Ok(())
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

/// Decode a JSON body; an empty body reads as `null`
fn decode<T: DeserializeOwned>(body: &str) -> ApiResult<T> {
    let body = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Check an id before splicing it into a path
pub(crate) fn segment(id: &str) -> ApiResult<&str> {
    if !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        Ok(id)
    } else {
        Err(ApiError::Validation(format!("Invalid id '{id}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryStore;

    fn client() -> ApiClient {
        let session = SessionStore::hydrate(Arc::new(MemoryStore::new())).unwrap();
        let config = ClientConfig {
            api_base_url: "http://127.0.0.1:9/api/".to_string(),
            ..ClientConfig::default()
        };
        ApiClient::new(&config, Arc::new(session)).unwrap()
    }

    #[test]
    fn test_decode_empty_body_as_null() {
        let value: Option<u32> = decode("  ").unwrap();
        assert_eq!(value, None);
        assert!(matches!(decode::<u32>("{}"), Err(ApiError::Decode(_))));
    }

    #[test]
    fn test_segment_rejects_path_tricks() {
        assert_eq!(segment("64f1c2ab").unwrap(), "64f1c2ab");
        assert!(segment("").is_err());
        assert!(segment("../users").is_err());
        assert!(segment("a/b").is_err());
        assert!(segment("a?b=1").is_err());
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        assert_eq!(client().base_url(), "http://127.0.0.1:9/api");
    }

    #[tokio::test]
    async fn test_protected_call_without_token() {
        let err = client().get::<IgnoredAny>("/data/my-results").await.unwrap_err();
        assert!(matches!(err, ApiError::NotAuthenticated));
    }

    #[tokio::test]
    async fn test_bad_otp_never_sent() {
        let err = client()
            .login_with_otp("a@b.io", "12ab", None)
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "OTP must be exactly 6 digits");
    }

    #[tokio::test]
    async fn test_register_needs_name() {
        let err = client()
            .request_otp("a@b.io", OtpPurpose::Register, Some("  "))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}

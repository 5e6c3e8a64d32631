//! Remote authentication service client.
//!
//! ARCHITECTURE
//! ============
//! `SessionBackend` is the seam between the session manager and the network.
//! `HttpBackend` talks to the real service over `reqwest` with a cookie jar,
//! so the session cookie set by `/user/login` is replayed on every later call.
//! No client-held token is ever sent.
//!
//! ERROR HANDLING
//! ==============
//! Any non-200 status, transport failure, or undecodable body becomes
//! `SessionError::Backend` carrying the endpoint URL. A 200 with a `null`
//! body is not an error here; the session manager decides what "no user"
//! means for each operation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;

use crate::config::SessionConfig;
use crate::error::{ConfigError, SessionError};
use crate::user::{CurrentUser, UserDetails};

pub const CURRENT_USER_PATH: &str = "/user/current";
pub const LOGIN_PATH: &str = "/user/login";

/// Remote session API consumed by [`crate::session::SessionManager`].
#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// `GET /user/current`.
    async fn current_user(&self) -> Result<Option<CurrentUser>, SessionError>;

    /// `POST /user/login`. `Ok(None)` means the credentials were rejected.
    async fn login(&self, username: &str, password: &str) -> Result<Option<CurrentUser>, SessionError>;

    /// `DELETE /user/login`. Only the status matters.
    async fn logout(&self) -> Result<(), SessionError>;

    /// `POST /user/current`. `Ok(None)` means creation was rejected.
    async fn create_user(&self, details: &UserDetails) -> Result<Option<CurrentUser>, SessionError>;
}

// =============================================================================
// HTTP BACKEND
// =============================================================================

pub struct HttpBackend {
    http: reqwest::Client,
    config: SessionConfig,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

impl HttpBackend {
    /// Build a cookie-carrying client for the configured service.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: SessionConfig) -> Result<Self, ConfigError> {
        let mut builder = reqwest::Client::builder()
            .cookie_store(true)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs));
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        let http = builder
            .build()
            .map_err(|e| ConfigError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, config })
    }

    async fn send(&self, request: reqwest::RequestBuilder, url: &str) -> Result<String, SessionError> {
        let response = request
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| SessionError::backend(url, e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::debug!(%url, status = status.as_u16(), "session backend returned non-200");
            return Err(SessionError::backend(url, format!("status {}", status.as_u16())));
        }
        response
            .text()
            .await
            .map_err(|e| SessionError::backend(url, e.to_string()))
    }

    async fn fetch_user(&self, request: reqwest::RequestBuilder, url: &str) -> Result<Option<CurrentUser>, SessionError> {
        let body = self.send(request, url).await?;
        CurrentUser::from_response_body(&body).map_err(|reason| SessionError::backend(url, reason))
    }
}

#[async_trait]
impl SessionBackend for HttpBackend {
    async fn current_user(&self) -> Result<Option<CurrentUser>, SessionError> {
        let url = self.config.endpoint(CURRENT_USER_PATH);
        self.fetch_user(self.http.get(&url), &url).await
    }

    async fn login(&self, username: &str, password: &str) -> Result<Option<CurrentUser>, SessionError> {
        let url = self.config.endpoint(LOGIN_PATH);
        let request = self.http.post(&url).json(&LoginRequest { username, password });
        self.fetch_user(request, &url).await
    }

    async fn logout(&self) -> Result<(), SessionError> {
        let url = self.config.endpoint(LOGIN_PATH);
        self.send(self.http.delete(&url), &url).await.map(|_| ())
    }

    async fn create_user(&self, details: &UserDetails) -> Result<Option<CurrentUser>, SessionError> {
        let url = self.config.endpoint(CURRENT_USER_PATH);
        self.fetch_user(self.http.post(&url).json(details), &url).await
    }
}

#[cfg(test)]
#[path = "backend_test.rs"]
mod tests;

//! HTTP client for the Share2Go backend
//!
//! Every call except login and registration carries the session's bearer
//! token. Responses are screened before any caller sees them:
//! - 401 tears the session down (if the rejected token is still current)
//! - 403 is logged and surfaced as [`ApiError::Forbidden`]
//! - other non-2xx answers become [`ApiError::Status`]

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use super::ApiError;
use crate::config::ApiConfig;
use crate::services::SessionManager;

/// Whether a request carries the bearer token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Auth {
    Bearer,
    Public,
}

/// Backend client bound to one session
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionManager>,
}

impl ApiClient {
    /// Create a client from configuration
    pub fn new(config: &ApiConfig, session: Arc<SessionManager>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    /// Session this client authenticates with
    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// Backend base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{}", self.base_url, path))
    }

    /// Send a request and screen the response status.
    pub(crate) async fn execute(
        &self,
        request: RequestBuilder,
        auth: Auth,
    ) -> Result<Response, ApiError> {
        let sent_token = match auth {
            Auth::Bearer => self.session.bearer_token().await,
            Auth::Public => None,
        };

        let request = match &sent_token {
            Some(token) => request.bearer_auth(token),
            None => {
                if auth == Auth::Bearer {
                    tracing::debug!("No session token, sending request unauthenticated");
                }
                request
            }
        };

        let request = request.build()?;
        let method = request.method().clone();
        let path = request.url().path().to_string();
        tracing::debug!("{} {}", method, path);

        let response = self.http.execute(request).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = ApiError::from_status(status, &body);

        match status {
            StatusCode::UNAUTHORIZED => {
                if let Some(token) = &sent_token {
                    tracing::warn!("{} {} rejected the session token", method, path);
                    self.session.handle_authorization_rejected(token).await;
                }
            }
            StatusCode::FORBIDDEN => {
                tracing::warn!("{} {} forbidden: user lacks required permissions", method, path);
            }
            _ => {
                tracing::debug!("{} {} failed with {}", method, path, status);
            }
        }

        Err(error)
    }

    /// Send a request and decode a JSON body
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        auth: Auth,
    ) -> Result<T, ApiError> {
        let response = self.execute(request, auth).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Send a request whose body is plain text (or nothing)
    pub(crate) async fn send_text(
        &self,
        request: RequestBuilder,
        auth: Auth,
    ) -> Result<String, ApiError> {
        let response = self.execute(request, auth).await?;
        Ok(response.text().await?)
    }

    /// GET a JSON resource with the bearer token
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send_json(self.request(Method::GET, path), Auth::Bearer).await
    }
}

//! Authentication endpoints
//!
//! Login and registration are the two public calls. A successful login hands
//! the token and whatever identity fields the backend returned to the
//! [`SessionManager`](crate::services::SessionManager), which has the final
//! say on the identity.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::client::Auth;
use super::responses::UserProfile;
use super::{ApiClient, ApiError};
use crate::models::{Identity, RegisterInput, ServerIdentity, UserId};

/// Login request body
#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Logout request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LogoutRequest<'a> {
    user_id: &'a UserId,
}

/// Login response
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "LoginFields")]
pub struct LoginResponse {
    /// Bearer token (`token`, falling back to `accessToken`)
    pub token: String,
    /// Identity fields the backend chose to include
    pub identity: ServerIdentity,
}

/// Login response as received
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginFields {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
    #[serde(flatten)]
    identity: ServerIdentity,
}

impl TryFrom<LoginFields> for LoginResponse {
    type Error = &'static str;

    fn try_from(fields: LoginFields) -> Result<Self, Self::Error> {
        let token = fields
            .token
            .filter(|t| !t.is_empty())
            .or(fields.access_token)
            .ok_or("login response carries no token")?;
        Ok(Self {
            token,
            identity: fields.identity,
        })
    }
}

impl ApiClient {
    /// POST /auth/login - Log in and establish the session
    ///
    /// Returns the reconciled identity. Wrong credentials come back as
    /// [`ApiError::Unauthorized`] without touching any existing session.
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, ApiError> {
        let request = self
            .request(Method::POST, "/auth/login")
            .json(&LoginRequest { email, password });
        let response: LoginResponse = self.send_json(request, Auth::Public).await?;

        let identity = self
            .session()
            .login(&response.token, response.identity)
            .await?;
        Ok(identity)
    }

    /// POST /api/users/register - Create an account
    ///
    /// Does not log in; the caller proceeds to the login page.
    pub async fn register(&self, input: &RegisterInput) -> Result<UserProfile, ApiError> {
        if input.email.trim().is_empty() || input.password.is_empty() {
            return Err(ApiError::Validation("Email and password are required".to_string()));
        }

        let request = self.request(Method::POST, "/api/users/register").json(input);
        let profile: UserProfile = self.send_json(request, Auth::Public).await?;
        tracing::info!("Registered {} as {}", profile.email, profile.role);
        Ok(profile)
    }

    /// POST /auth/logout - Log out
    ///
    /// The backend is told first on a best-effort basis; the local session is
    /// cleared whatever it answers.
    pub async fn logout(&self) {
        if let Some(identity) = self.session().current_identity().await {
            let request = self
                .request(Method::POST, "/auth/logout")
                .json(&LogoutRequest { user_id: &identity.id });
            if let Err(e) = self.send_text(request, Auth::Bearer).await {
                tracing::debug!("Backend logout failed: {}", e);
            }
        }
        self.session().logout().await;
    }
}

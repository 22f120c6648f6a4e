//! POST /api/auth/signup
//! POST /api/auth/login
//! GET  /api/auth/user

use tracing::info;

use super::ApiClient;
use crate::error::{ClientError, Result};
use crate::models::wire::{AuthResponse, CurrentUser, LoginRequest, SignupRequest};

impl ApiClient {
    /// Register a new account; the server answers with a token like `login`
    pub async fn signup(&self, request: SignupRequest) -> Result<AuthResponse> {
        let request = SignupRequest {
            username: request.username.trim().to_string(),
            email: request.email.trim().to_string(),
            password: request.password,
        };
        if request.username.is_empty() || request.email.is_empty() || request.password.is_empty() {
            return Err(ClientError::Validation(
                "Username, email and password are required".to_string(),
            ));
        }

        let auth: AuthResponse = self
            .send_json(self.post("/api/auth/signup").json(&request), "signup")
            .await?;
        info!(username = %request.username, "Signed up");
        Ok(auth)
    }

    /// Exchange credentials for a bearer token.
    ///
    /// The token is not stored by this call; the caller decides which session
    /// receives it.
    pub async fn login(&self, username_or_email: &str, password: &str) -> Result<AuthResponse> {
        let body = LoginRequest {
            username_or_email: username_or_email.to_string(),
            password: password.to_string(),
        };
        let auth: AuthResponse = self
            .send_json(self.post("/api/auth/login").json(&body), "login")
            .await?;
        info!(username = auth.username.as_deref().unwrap_or(""), "Logged in");
        Ok(auth)
    }

    /// Username and email behind the session's token
    pub async fn current_user(&self) -> Result<CurrentUser> {
        self.send_json(self.get("/api/auth/user"), "current_user")
            .await
    }
}

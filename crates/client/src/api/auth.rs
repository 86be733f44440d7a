//! `/auth` endpoints.

use greenshoes_core::{BearerToken, UserProfile};
use tracing::instrument;

use super::ApiClient;
use super::types::{
    AuthResponse, CheckEmailRequest, CheckEmailResponse, LoginRequest, RegisterRequest,
};
use crate::error::ApiError;

impl ApiClient {
    /// `POST /auth/login`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the credentials are rejected or the request
    /// fails. A 401 here never signs the session out.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email_or_username: &str,
        password: &str,
    ) -> Result<(BearerToken, UserProfile), ApiError> {
        let body = LoginRequest {
            email: email_or_username,
            password,
        };
        let response: AuthResponse = self.post("/auth/login", &body).await?;
        Ok((BearerToken::new(response.token), response.user))
    }

    /// `POST /auth/register`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the API refuses the account or the request fails.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
    ) -> Result<(BearerToken, UserProfile), ApiError> {
        let body = RegisterRequest {
            name: full_name,
            full_name,
            email,
            password,
        };
        let response: AuthResponse = self.post("/auth/register", &body).await?;
        Ok((BearerToken::new(response.token), response.user))
    }

    /// `POST /auth/check-email`: whether an account already uses `email`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn check_email(&self, email: &str) -> Result<bool, ApiError> {
        let response: CheckEmailResponse = self
            .post("/auth/check-email", &CheckEmailRequest { email })
            .await?;
        Ok(response.exists)
    }
}

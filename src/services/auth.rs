//! Auth Flows
//!
//! Token exchange and account registration against the records service.

use std::sync::Arc;

use suluk_api::endpoints;
use suluk_api::types::{RegisterRequest, TokenResponse};
use suluk_api::{ApiError, Method, RequestBody, RequestDispatcher};
use thiserror::Error;

use crate::models::session::SessionState;
use crate::services::session::SessionManager;

pub const LOGIN_FAILED_MESSAGE: &str = "Login failed";
pub const REGISTRATION_FAILED_MESSAGE: &str = "Registration failed";

/// A rejected login or registration. `Display` is the user-facing message.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{message}")]
    Rejected {
        message: String,
        #[source]
        cause: ApiError,
    },

    /// The token was issued but could not be stored.
    #[error("{0}")]
    Storage(String),
}

impl AuthError {
    fn rejected(cause: ApiError, http_fallback: &str) -> Self {
        Self::Rejected {
            message: cause.user_message(http_fallback),
            cause,
        }
    }
}

fn require(field: &str, value: &str) -> Result<(), AuthError> {
    if value.trim().is_empty() {
        return Err(AuthError::InvalidInput(format!("{} is required", field)));
    }
    Ok(())
}

pub struct AuthService {
    dispatcher: Arc<RequestDispatcher>,
    session: Arc<SessionManager>,
}

impl AuthService {
    pub fn new(dispatcher: Arc<RequestDispatcher>, session: Arc<SessionManager>) -> Self {
        Self {
            dispatcher,
            session,
        }
    }

    /// Exchange credentials for a token and hand it to the session.
    ///
    /// The identity endpoint is only reached when the token endpoint
    /// accepted the credentials. The returned state is whatever the session
    /// settled into; an unconfirmed identity yields `Unauthenticated`, not an
    /// error.
    pub async fn login(&self, username: &str, password: &str) -> Result<SessionState, AuthError> {
        require("Username", username)?;
        require("Password", password)?;

        let token: TokenResponse = self
            .dispatcher
            .post_form(
                endpoints::TOKEN,
                &[("username", username), ("password", password)],
            )
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "token exchange failed");
                AuthError::rejected(e, LOGIN_FAILED_MESSAGE)
            })?;

        self.session
            .login(&token.access_token)
            .await
            .map_err(|e| AuthError::Storage(format!("Could not store credentials: {}", e)))
    }

    /// Create an account. Does not log in.
    pub async fn register(&self, username: &str, password: &str) -> Result<(), AuthError> {
        require("Username", username)?;
        require("Password", password)?;

        let body = serde_json::to_value(RegisterRequest {
            username: username.to_string(),
            password: password.to_string(),
        })
        .map_err(|e| {
            AuthError::rejected(
                ApiError::invalid_response(e.to_string()),
                REGISTRATION_FAILED_MESSAGE,
            )
        })?;

        self.dispatcher
            .request(Method::Post, endpoints::REGISTER, RequestBody::Json(body), &[])
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "registration failed");
                AuthError::rejected(e, REGISTRATION_FAILED_MESSAGE)
            })?;

        tracing::info!(username, "account registered");
        Ok(())
    }
}

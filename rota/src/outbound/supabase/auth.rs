//! GoTrue-backed authentication adapter.
//!
//! This adapter owns transport details only: endpoint paths, headers, HTTP
//! error mapping, and JSON decoding into domain sessions.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use reqwest::{Method, StatusCode};
use serde::Serialize;

use super::client::SupabaseClient;
use super::dto::{
    AuthErrorDto, PasswordGrantDto, RefreshGrantDto, SessionDto, SignUpDto, SignUpRequestDto,
    UserMetadataDto,
};
use super::http::body_preview;
use crate::domain::ports::{AuthGateway, AuthGatewayError};
use crate::domain::{LoginCredentials, Registration, SecretToken, Session, SignUpOutcome};

const TOKEN_PATH: &str = "/auth/v1/token";
const SIGN_UP_PATH: &str = "/auth/v1/signup";
const LOGOUT_PATH: &str = "/auth/v1/logout";

/// Auth adapter for the hosted GoTrue service.
pub struct SupabaseAuthGateway {
    client: Arc<SupabaseClient>,
    clock: Arc<dyn Clock>,
}

impl SupabaseAuthGateway {
    pub fn new(client: Arc<SupabaseClient>, clock: Arc<dyn Clock>) -> Self {
        Self { client, clock }
    }

    async fn post_json<B: Serialize + Sync>(
        &self,
        path: &str,
        grant_type: Option<&str>,
        body: &B,
        bearer: Option<&SecretToken>,
    ) -> Result<(StatusCode, Vec<u8>), AuthGatewayError> {
        let mut url = self
            .client
            .endpoint(path)
            .map_err(|error| AuthGatewayError::transport(error.to_string()))?;
        if let Some(grant_type) = grant_type {
            url.query_pairs_mut().append_pair("grant_type", grant_type);
        }
        let mut request = self.client.request(Method::POST, url).json(body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token.expose());
        }
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(map_transport_error)?;
        Ok((status, bytes.to_vec()))
    }

    fn decode_session(&self, body: &[u8]) -> Result<Session, AuthGatewayError> {
        let dto: SessionDto = serde_json::from_slice(body).map_err(|error| {
            AuthGatewayError::decode(format!("invalid session payload: {error}"))
        })?;
        dto.into_session(self.clock.utc())
            .map_err(AuthGatewayError::decode)
    }
}

#[async_trait]
impl AuthGateway for SupabaseAuthGateway {
    async fn sign_in(&self, credentials: &LoginCredentials) -> Result<Session, AuthGatewayError> {
        let body = PasswordGrantDto {
            email: credentials.email(),
            password: credentials.password(),
        };
        let (status, bytes) = self
            .post_json(TOKEN_PATH, Some("password"), &body, None)
            .await?;
        if !status.is_success() {
            return Err(map_status_error(status, &bytes));
        }
        self.decode_session(&bytes)
    }

    async fn sign_up(
        &self,
        registration: &Registration,
    ) -> Result<SignUpOutcome, AuthGatewayError> {
        let body = SignUpRequestDto {
            email: registration.credentials().email(),
            password: registration.credentials().password(),
            data: UserMetadataDto {
                first_name: Some(registration.first_name().to_owned()),
                last_name: Some(registration.last_name().to_owned()),
            },
        };
        let (status, bytes) = self.post_json(SIGN_UP_PATH, None, &body, None).await?;
        if !status.is_success() {
            return Err(map_status_error(status, &bytes));
        }
        decode_sign_up(&bytes, self.clock.utc())
    }

    async fn refresh(&self, refresh_token: &SecretToken) -> Result<Session, AuthGatewayError> {
        let body = RefreshGrantDto {
            refresh_token: refresh_token.expose(),
        };
        let (status, bytes) = self
            .post_json(TOKEN_PATH, Some("refresh_token"), &body, None)
            .await?;
        if !status.is_success() {
            return Err(map_status_error(status, &bytes));
        }
        self.decode_session(&bytes)
    }

    async fn sign_out(&self, access_token: &SecretToken) -> Result<(), AuthGatewayError> {
        let (status, bytes) = self
            .post_json(LOGOUT_PATH, None, &serde_json::json!({}), Some(access_token))
            .await?;
        if status.is_success() {
            Ok(())
        } else {
            Err(map_status_error(status, &bytes))
        }
    }
}

fn decode_sign_up(
    body: &[u8],
    now: chrono::DateTime<chrono::Utc>,
) -> Result<SignUpOutcome, AuthGatewayError> {
    let dto: SignUpDto = serde_json::from_slice(body)
        .map_err(|error| AuthGatewayError::decode(format!("invalid sign-up payload: {error}")))?;
    match dto {
        SignUpDto::Session(session) => session
            .into_session(now)
            .map(SignUpOutcome::SignedIn)
            .map_err(AuthGatewayError::decode),
        SignUpDto::User(_) => Ok(SignUpOutcome::ConfirmationRequired),
    }
}

fn map_transport_error(error: reqwest::Error) -> AuthGatewayError {
    AuthGatewayError::transport(error.to_string())
}

fn map_status_error(status: StatusCode, body: &[u8]) -> AuthGatewayError {
    let decoded: AuthErrorDto = serde_json::from_slice(body).unwrap_or_default();
    let detail = decoded
        .message()
        .map(str::to_owned)
        .unwrap_or_else(|| body_preview(body));
    let message = if detail.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {detail}", status.as_u16())
    };

    if decoded.is_invalid_credentials() {
        return AuthGatewayError::invalid_credentials(message);
    }
    match status {
        StatusCode::UNAUTHORIZED => AuthGatewayError::invalid_credentials(message),
        _ if status.is_client_error() => AuthGatewayError::rejected(message),
        _ => AuthGatewayError::transport(message),
    }
}

//! Port for the hosted authentication collaborator.

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};

use crate::domain::{
    LoginCredentials, Manager, Registration, SecretToken, Session, SignUpOutcome, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by authentication adapters.
    pub enum AuthGatewayError {
        /// Email and password did not match an account.
        InvalidCredentials => "invalid login credentials",
        /// The service refused the request (duplicate account, expired token).
        Rejected => "auth request rejected",
        /// The service could not be reached.
        Transport => "auth service unreachable",
        /// The service answered with a payload we could not read.
        Decode => "auth response could not be decoded",
    }
}

/// Port for signing managers in and out.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Exchange email and password for a session.
    async fn sign_in(&self, credentials: &LoginCredentials) -> Result<Session, AuthGatewayError>;

    /// Create an account, storing first and last name as user metadata.
    async fn sign_up(&self, registration: &Registration)
    -> Result<SignUpOutcome, AuthGatewayError>;

    /// Exchange a refresh token for a fresh session.
    async fn refresh(&self, refresh_token: &SecretToken) -> Result<Session, AuthGatewayError>;

    /// Revoke the session behind `access_token`.
    async fn sign_out(&self, access_token: &SecretToken) -> Result<(), AuthGatewayError>;
}

/// Fixture identity accepted by [`FixtureAuthGateway`].
pub const FIXTURE_MANAGER_ID: &str = "123e4567-e89b-12d3-a456-426614174000";

/// In-memory authenticator for tests and offline demos.
///
/// `manager@example.com` / `password` signs in; everything else is refused.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureAuthGateway;

impl FixtureAuthGateway {
    fn session(email: &str, first_name: Option<String>) -> Result<Session, AuthGatewayError> {
        let id = UserId::new(FIXTURE_MANAGER_ID)
            .map_err(|err| AuthGatewayError::decode(format!("invalid fixture user id: {err}")))?;
        Ok(Session::new(
            Manager::new(id, email, first_name, None),
            SecretToken::new("fixture-access"),
            SecretToken::new("fixture-refresh"),
            Utc::now() + TimeDelta::hours(1),
        ))
    }
}

#[async_trait]
impl AuthGateway for FixtureAuthGateway {
    async fn sign_in(&self, credentials: &LoginCredentials) -> Result<Session, AuthGatewayError> {
        if credentials.email() == "manager@example.com" && credentials.password() == "password" {
            Self::session(credentials.email(), None)
        } else {
            Err(AuthGatewayError::invalid_credentials(
                "email or password not recognised",
            ))
        }
    }

    async fn sign_up(
        &self,
        registration: &Registration,
    ) -> Result<SignUpOutcome, AuthGatewayError> {
        Self::session(
            registration.credentials().email(),
            Some(registration.first_name().to_owned()),
        )
        .map(SignUpOutcome::SignedIn)
    }

    async fn refresh(&self, _refresh_token: &SecretToken) -> Result<Session, AuthGatewayError> {
        Self::session("manager@example.com", None)
    }

    async fn sign_out(&self, _access_token: &SecretToken) -> Result<(), AuthGatewayError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("manager@example.com", "password", true)]
    #[case("manager@example.com", "wrong", false)]
    #[case("other@example.com", "password", false)]
    #[tokio::test]
    async fn fixture_gateway_accepts_only_the_fixture_account(
        #[case] email: &str,
        #[case] password: &str,
        #[case] should_succeed: bool,
    ) {
        let gateway = FixtureAuthGateway;
        let creds = LoginCredentials::try_from_parts(email, password).expect("credentials shape");
        match (should_succeed, gateway.sign_in(&creds).await) {
            (true, Ok(session)) => {
                assert_eq!(session.manager().id().to_string(), FIXTURE_MANAGER_ID);
            }
            (false, Err(err)) => assert!(matches!(err, AuthGatewayError::InvalidCredentials { .. })),
            (true, Err(err)) => panic!("expected success, got error: {err:?}"),
            (false, Ok(session)) => panic!("expected failure, got session: {session:?}"),
        }
    }

    #[tokio::test]
    async fn fixture_sign_up_keeps_first_name() {
        let registration = Registration::try_from_parts("Ada", "Byron", "ada@example.com", "secret1")
            .expect("valid registration");
        let outcome = FixtureAuthGateway
            .sign_up(&registration)
            .await
            .expect("fixture sign-up succeeds");
        let SignUpOutcome::SignedIn(session) = outcome else {
            panic!("fixture never asks for confirmation");
        };
        assert_eq!(session.manager().display_name(), "ADA");
    }

    #[test]
    fn error_messages_carry_context() {
        let err = AuthGatewayError::transport("connection refused");
        assert_eq!(err.to_string(), "auth service unreachable: connection refused");
    }
}

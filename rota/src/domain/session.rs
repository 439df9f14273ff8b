//! In-process session state for the signed-in manager.
//!
//! The session lives only as long as the process. Changes are broadcast on a
//! `watch` channel so the idle watchdog and the terminal adapter can follow
//! sign-in and sign-out without polling.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::TimeDelta;
use mockable::Clock;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::domain::Error;
use crate::domain::idle::SessionTerminator;
use crate::domain::ports::{AuthGateway, AuthGatewayError};
use crate::domain::{LoginCredentials, Manager, Registration, Session, SignUpOutcome, UserId};

/// Tokens closer than this to expiry are refreshed before use.
pub const REFRESH_MARGIN_SECONDS: i64 = 60;

/// Holds the current session and brokers calls to the auth collaborator.
pub struct SessionManager {
    gateway: Arc<dyn AuthGateway>,
    clock: Arc<dyn Clock>,
    state: watch::Sender<Option<Session>>,
}

impl SessionManager {
    /// Start signed out.
    pub fn new(gateway: Arc<dyn AuthGateway>, clock: Arc<dyn Clock>) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            gateway,
            clock,
            state,
        }
    }

    /// Sign in with validated credentials and publish the new session.
    pub async fn sign_in(&self, credentials: &LoginCredentials) -> Result<Manager, Error> {
        let session = self
            .gateway
            .sign_in(credentials)
            .await
            .map_err(map_auth_error)?;
        let manager = session.manager().clone();
        info!(user_id = %manager.id(), "manager signed in");
        self.state.send_replace(Some(session));
        Ok(manager)
    }

    /// Register a new manager. A confirmed account is signed in immediately.
    pub async fn sign_up(&self, registration: &Registration) -> Result<SignUpOutcome, Error> {
        let outcome = self
            .gateway
            .sign_up(registration)
            .await
            .map_err(map_auth_error)?;
        match &outcome {
            SignUpOutcome::SignedIn(session) => {
                info!(user_id = %session.manager().id(), "manager registered and signed in");
                self.state.send_replace(Some(session.clone()));
            }
            SignUpOutcome::ConfirmationRequired => {
                info!("manager registered; email confirmation pending");
            }
        }
        Ok(outcome)
    }

    /// Drop the local session and revoke it remotely.
    ///
    /// Local state is cleared first and stays cleared when the remote call
    /// fails. Failures are logged, never retried.
    pub async fn sign_out(&self) {
        let Some(session) = self.state.send_replace(None) else {
            debug!("sign-out requested without a session");
            return;
        };
        match self.gateway.sign_out(session.access_token()).await {
            Ok(()) => info!(user_id = %session.manager().id(), "manager signed out"),
            Err(error) => warn!(
                user_id = %session.manager().id(),
                error = %error,
                "remote sign-out failed; local session cleared"
            ),
        }
    }

    /// Refresh the access token when it is about to expire.
    ///
    /// Returns the session in force afterwards.
    pub async fn refresh_if_needed(&self) -> Result<Session, Error> {
        let session = self.require_session()?;
        let margin = TimeDelta::seconds(REFRESH_MARGIN_SECONDS);
        if !session.expires_within(self.clock.utc(), margin) {
            return Ok(session);
        }
        match self.gateway.refresh(session.refresh_token()).await {
            Ok(fresh) => {
                let published = self.state.send_if_modified(|current| {
                    if current.as_ref() != Some(&session) {
                        return false;
                    }
                    *current = Some(fresh.clone());
                    true
                });
                if !published {
                    debug!("session changed during token refresh; dropping new tokens");
                    return Err(Error::unauthorized("sign in to continue"));
                }
                debug!(user_id = %fresh.manager().id(), "access token refreshed");
                Ok(fresh)
            }
            Err(error) => {
                warn!(error = %error, "token refresh failed");
                Err(map_auth_error(error))
            }
        }
    }

    /// The current session, if signed in.
    pub fn current(&self) -> Option<Session> {
        self.state.borrow().clone()
    }

    /// Whether a manager is signed in.
    pub fn is_signed_in(&self) -> bool {
        self.state.borrow().is_some()
    }

    /// Owner id for scoping data access.
    pub fn owner(&self) -> Result<UserId, Error> {
        self.require_session()
            .map(|session| session.manager().id().clone())
    }

    /// Upper-cased greeting name, empty when signed out.
    pub fn display_name(&self) -> String {
        self.state
            .borrow()
            .as_ref()
            .map(|session| session.manager().display_name())
            .unwrap_or_default()
    }

    /// Subscribe to session changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.state.subscribe()
    }

    fn require_session(&self) -> Result<Session, Error> {
        self.current()
            .ok_or_else(|| Error::unauthorized("sign in to continue"))
    }
}

#[async_trait]
impl SessionTerminator for SessionManager {
    async fn terminate(&self) {
        self.sign_out().await;
    }
}

fn map_auth_error(error: AuthGatewayError) -> Error {
    match error {
        AuthGatewayError::InvalidCredentials { message } => Error::unauthorized(message),
        AuthGatewayError::Rejected { message } => Error::invalid_request(message),
        AuthGatewayError::Transport { message } => Error::service_unavailable(message),
        AuthGatewayError::Decode { message } => Error::internal(message),
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for session state transitions.
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::SecretToken;
    use crate::domain::ports::MockAuthGateway;
    use chrono::{DateTime, TimeZone, Utc};
    use crate::test_support::MutableClock;
    use rstest::{fixture, rstest};
    use tokio::sync::Notify;

    #[fixture]
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 11, 9, 0, 0)
            .single()
            .expect("valid time")
    }

    fn clock_at(now: DateTime<Utc>) -> Arc<dyn Clock> {
        Arc::new(MutableClock::new(now))
    }

    fn session(expires_at: DateTime<Utc>) -> Session {
        Session::new(
            Manager::new(UserId::random(), "ada@example.com", Some("Ada".into()), None),
            SecretToken::new("access"),
            SecretToken::new("refresh"),
            expires_at,
        )
    }

    fn creds() -> LoginCredentials {
        LoginCredentials::try_from_parts("ada@example.com", "secret1").expect("valid creds")
    }

    #[rstest]
    #[tokio::test]
    async fn sign_in_publishes_session(now: DateTime<Utc>) {
        let mut gateway = MockAuthGateway::new();
        let issued = session(now + TimeDelta::hours(1));
        gateway
            .expect_sign_in()
            .times(1)
            .return_once(move |_| Ok(issued));
        let manager = SessionManager::new(Arc::new(gateway), clock_at(now));
        let mut changes = manager.subscribe();

        let signed_in = manager.sign_in(&creds()).await.expect("sign in succeeds");

        assert_eq!(signed_in.display_name(), "ADA");
        assert!(changes.has_changed().expect("sender alive"));
        assert!(changes.borrow_and_update().is_some());
        assert_eq!(manager.display_name(), "ADA");
    }

    #[rstest]
    #[case(AuthGatewayError::invalid_credentials("nope"), ErrorCode::Unauthorized)]
    #[case(AuthGatewayError::rejected("exists"), ErrorCode::InvalidRequest)]
    #[case(AuthGatewayError::transport("down"), ErrorCode::ServiceUnavailable)]
    #[case(AuthGatewayError::decode("junk"), ErrorCode::InternalError)]
    #[tokio::test]
    async fn sign_in_failures_map_to_domain_codes(
        now: DateTime<Utc>,
        #[case] failure: AuthGatewayError,
        #[case] expected: ErrorCode,
    ) {
        let mut gateway = MockAuthGateway::new();
        gateway
            .expect_sign_in()
            .return_once(move |_| Err(failure));
        let manager = SessionManager::new(Arc::new(gateway), clock_at(now));

        let err = manager.sign_in(&creds()).await.expect_err("sign in fails");

        assert_eq!(err.code(), expected);
        assert!(!manager.is_signed_in());
    }

    #[rstest]
    #[tokio::test]
    async fn sign_out_clears_state_even_when_remote_call_fails(now: DateTime<Utc>) {
        let mut gateway = MockAuthGateway::new();
        let issued = session(now + TimeDelta::hours(1));
        gateway.expect_sign_in().return_once(move |_| Ok(issued));
        gateway
            .expect_sign_out()
            .times(1)
            .return_once(|_| Err(AuthGatewayError::transport("offline")));
        let manager = SessionManager::new(Arc::new(gateway), clock_at(now));
        manager.sign_in(&creds()).await.expect("sign in succeeds");

        manager.sign_out().await;

        assert!(manager.current().is_none());
        assert_eq!(manager.display_name(), "");
    }

    #[rstest]
    #[tokio::test]
    async fn sign_out_without_session_skips_remote_call(now: DateTime<Utc>) {
        let mut gateway = MockAuthGateway::new();
        gateway.expect_sign_out().never();
        let manager = SessionManager::new(Arc::new(gateway), clock_at(now));
        manager.sign_out().await;
        assert!(!manager.is_signed_in());
    }

    #[rstest]
    #[tokio::test]
    async fn confirmation_required_keeps_manager_signed_out(now: DateTime<Utc>) {
        let mut gateway = MockAuthGateway::new();
        gateway
            .expect_sign_up()
            .return_once(|_| Ok(SignUpOutcome::ConfirmationRequired));
        let manager = SessionManager::new(Arc::new(gateway), clock_at(now));
        let registration =
            Registration::try_from_parts("Ada", "Byron", "ada@example.com", "secret1")
                .expect("valid registration");

        let outcome = manager.sign_up(&registration).await.expect("sign up succeeds");

        assert_eq!(outcome, SignUpOutcome::ConfirmationRequired);
        assert!(!manager.is_signed_in());
    }

    #[rstest]
    #[case(TimeDelta::seconds(30), true)]
    #[case(TimeDelta::minutes(30), false)]
    #[tokio::test]
    async fn refreshes_only_near_expiry(
        now: DateTime<Utc>,
        #[case] lifetime: TimeDelta,
        #[case] should_refresh: bool,
    ) {
        let mut gateway = MockAuthGateway::new();
        let issued = session(now + lifetime);
        let fresh = session(now + TimeDelta::hours(1));
        let fresh_expiry = fresh.expires_at();
        gateway.expect_sign_in().return_once(move |_| Ok(issued));
        gateway
            .expect_refresh()
            .times(usize::from(should_refresh))
            .return_once(move |_| Ok(fresh));
        let manager = SessionManager::new(Arc::new(gateway), clock_at(now));
        manager.sign_in(&creds()).await.expect("sign in succeeds");

        let current = manager.refresh_if_needed().await.expect("refresh succeeds");

        assert_eq!(current.expires_at() == fresh_expiry, should_refresh);
    }

    /// Gateway whose refresh waits until the test releases it.
    struct HeldRefreshGateway {
        issued: Session,
        fresh: Session,
        release: Notify,
    }

    #[async_trait]
    impl AuthGateway for HeldRefreshGateway {
        async fn sign_in(&self, _credentials: &LoginCredentials) -> Result<Session, AuthGatewayError> {
            Ok(self.issued.clone())
        }

        async fn sign_up(
            &self,
            _registration: &Registration,
        ) -> Result<SignUpOutcome, AuthGatewayError> {
            Ok(SignUpOutcome::ConfirmationRequired)
        }

        async fn refresh(&self, _refresh_token: &SecretToken) -> Result<Session, AuthGatewayError> {
            self.release.notified().await;
            Ok(self.fresh.clone())
        }

        async fn sign_out(&self, _access_token: &SecretToken) -> Result<(), AuthGatewayError> {
            Ok(())
        }
    }

    #[rstest]
    #[tokio::test]
    async fn refresh_finishing_after_sign_out_stays_signed_out(now: DateTime<Utc>) {
        let gateway = Arc::new(HeldRefreshGateway {
            issued: session(now + TimeDelta::seconds(30)),
            fresh: session(now + TimeDelta::hours(1)),
            release: Notify::new(),
        });
        let manager = SessionManager::new(gateway.clone(), clock_at(now));
        manager.sign_in(&creds()).await.expect("sign in succeeds");

        let refresh = manager.refresh_if_needed();
        let sign_out = async {
            manager.sign_out().await;
            gateway.release.notify_one();
        };
        let (refreshed, ()) = tokio::join!(refresh, sign_out);

        let err = refreshed.expect_err("session ended mid-refresh");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
        assert!(!manager.is_signed_in());
    }

    #[rstest]
    #[tokio::test]
    async fn owner_requires_a_session(now: DateTime<Utc>) {
        let manager = SessionManager::new(Arc::new(MockAuthGateway::new()), clock_at(now));
        let err = manager.owner().expect_err("signed out");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }
}

//! Authentication primitives: credentials, registrations, and sessions.
//!
//! Raw form values are validated here before any call reaches the auth
//! collaborator. Secrets are wrapped in `Zeroizing` so they are wiped on drop.

use std::fmt;

use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

use super::user::Manager;

/// Shortest password the registration form accepts.
pub const MIN_PASSWORD_LEN: usize = 6;
/// Shortest email the registration form accepts.
pub const MIN_EMAIL_LEN: usize = 3;

/// Domain error returned when login or registration values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialsValidationError {
    /// Email was missing or blank once trimmed.
    EmptyEmail,
    /// Email was shorter than the registration minimum.
    EmailTooShort { min: usize },
    /// Password was blank.
    EmptyPassword,
    /// Password was shorter than the registration minimum.
    PasswordTooShort { min: usize },
    /// First name was blank.
    EmptyFirstName,
    /// Last name was blank.
    EmptyLastName,
}

impl fmt::Display for CredentialsValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::EmailTooShort { min } => write!(f, "email must be at least {min} characters"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::PasswordTooShort { min } => {
                write!(f, "password must be at least {min} characters")
            }
            Self::EmptyFirstName => write!(f, "first name must not be empty"),
            Self::EmptyLastName => write!(f, "last name must not be empty"),
        }
    }
}

impl std::error::Error for CredentialsValidationError {}

/// Validated login credentials.
///
/// ## Invariants
/// - `email` is trimmed and must not be empty after trimming.
/// - `password` must not be empty; surrounding whitespace is kept as typed.
///
/// # Examples
/// ```
/// use rota::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" boss@example.com ", "hunter22").unwrap();
/// assert_eq!(creds.email(), "boss@example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, CredentialsValidationError> {
        let normalized = email.trim();
        if normalized.is_empty() {
            return Err(CredentialsValidationError::EmptyEmail);
        }

        if password.is_empty() {
            return Err(CredentialsValidationError::EmptyPassword);
        }

        Ok(Self {
            email: normalized.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Validated sign-up request for a new manager account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    credentials: LoginCredentials,
    first_name: String,
    last_name: String,
}

impl Registration {
    /// Validate the registration form.
    pub fn try_from_parts(
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
    ) -> Result<Self, CredentialsValidationError> {
        let first_name = first_name.trim();
        if first_name.is_empty() {
            return Err(CredentialsValidationError::EmptyFirstName);
        }
        let last_name = last_name.trim();
        if last_name.is_empty() {
            return Err(CredentialsValidationError::EmptyLastName);
        }
        let credentials = LoginCredentials::try_from_parts(email, password)?;
        if credentials.email().chars().count() < MIN_EMAIL_LEN {
            return Err(CredentialsValidationError::EmailTooShort { min: MIN_EMAIL_LEN });
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(CredentialsValidationError::PasswordTooShort {
                min: MIN_PASSWORD_LEN,
            });
        }
        Ok(Self {
            credentials,
            first_name: first_name.to_owned(),
            last_name: last_name.to_owned(),
        })
    }

    pub fn credentials(&self) -> &LoginCredentials {
        &self.credentials
    }

    pub fn first_name(&self) -> &str {
        self.first_name.as_str()
    }

    pub fn last_name(&self) -> &str {
        self.last_name.as_str()
    }
}

/// Opaque bearer token; never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretToken(Zeroizing<String>);

impl SecretToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(Zeroizing::new(raw.into()))
    }

    /// Expose the raw token for an outbound request header.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for SecretToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretToken(..)")
    }
}

/// An authenticated session held in memory for the life of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    manager: Manager,
    access_token: SecretToken,
    refresh_token: SecretToken,
    expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(
        manager: Manager,
        access_token: SecretToken,
        refresh_token: SecretToken,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            manager,
            access_token,
            refresh_token,
            expires_at,
        }
    }

    pub fn manager(&self) -> &Manager {
        &self.manager
    }

    pub fn access_token(&self) -> &SecretToken {
        &self.access_token
    }

    pub fn refresh_token(&self) -> &SecretToken {
        &self.refresh_token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Whether the access token expires within `margin` of `now`.
    pub fn expires_within(&self, now: DateTime<Utc>, margin: chrono::TimeDelta) -> bool {
        self.expires_at <= now + margin
    }
}

/// Result of a registration attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// The account is live and signed in.
    SignedIn(Session),
    /// The account exists but the email must be confirmed before login.
    ConfirmationRequired,
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::UserId;
    use chrono::{TimeDelta, TimeZone};
    use rstest::rstest;

    #[rstest]
    #[case("", "pw", CredentialsValidationError::EmptyEmail)]
    #[case("   ", "pw", CredentialsValidationError::EmptyEmail)]
    #[case("user@example.com", "", CredentialsValidationError::EmptyPassword)]
    fn invalid_credentials(
        #[case] email: &str,
        #[case] password: &str,
        #[case] expected: CredentialsValidationError,
    ) {
        let err = LoginCredentials::try_from_parts(email, password)
            .expect_err("invalid inputs must fail");
        assert_eq!(err, expected);
    }

    #[rstest]
    #[case("  boss@example.com  ", "secret")]
    #[case("ops@example.com", " spaced password ")]
    fn valid_credentials_trim_email(#[case] email: &str, #[case] password: &str) {
        let creds = LoginCredentials::try_from_parts(email, password)
            .expect("valid inputs should succeed");
        assert_eq!(creds.email(), email.trim());
        assert_eq!(creds.password(), password);
    }

    #[rstest]
    #[case(" ", "Patel", "a@b.co", "secret1", CredentialsValidationError::EmptyFirstName)]
    #[case("Aarav", "", "a@b.co", "secret1", CredentialsValidationError::EmptyLastName)]
    #[case("Aarav", "Patel", "ab", "secret1", CredentialsValidationError::EmailTooShort { min: 3 })]
    #[case("Aarav", "Patel", "a@b.co", "short", CredentialsValidationError::PasswordTooShort { min: 6 })]
    fn invalid_registrations(
        #[case] first: &str,
        #[case] last: &str,
        #[case] email: &str,
        #[case] password: &str,
        #[case] expected: CredentialsValidationError,
    ) {
        assert_eq!(
            Registration::try_from_parts(first, last, email, password),
            Err(expected)
        );
    }

    #[test]
    fn registration_trims_names() {
        let registration = Registration::try_from_parts(" Aarav ", " Patel ", "a@b.co", "secret1")
            .expect("valid registration");
        assert_eq!(registration.first_name(), "Aarav");
        assert_eq!(registration.last_name(), "Patel");
        assert_eq!(registration.credentials().email(), "a@b.co");
    }

    #[test]
    fn tokens_are_redacted_in_debug_output() {
        let token = SecretToken::new("super-secret");
        assert_eq!(format!("{token:?}"), "SecretToken(..)");
        assert_eq!(token.expose(), "super-secret");
    }

    #[test]
    fn expiry_margin_is_inclusive() {
        let now = Utc
            .with_ymd_and_hms(2026, 2, 11, 9, 0, 0)
            .single()
            .expect("valid time");
        let session = Session::new(
            Manager::new(UserId::random(), "a@b.co", None, None),
            SecretToken::new("access"),
            SecretToken::new("refresh"),
            now + TimeDelta::seconds(60),
        );
        assert!(session.expires_within(now, TimeDelta::seconds(60)));
        assert!(!session.expires_within(now, TimeDelta::seconds(59)));
    }
}

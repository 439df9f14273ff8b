//! Manager accounts as seen by the rota.
//!
//! The authenticated manager is the owner of every employee and shift row.

use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

/// Why a manager id was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyId,
    InvalidId,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => f.write_str("manager id is empty"),
            Self::InvalidId => f.write_str("manager id is not a UUID"),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Auth-service id of a manager; the `owner_id` on every row.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserId(Uuid);

impl UserId {
    /// Parse the id the auth service returned.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        raw.as_ref().parse()
    }

    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl FromStr for UserId {
    type Err = UserValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        Uuid::parse_str(trimmed)
            .map(Self)
            .map_err(|_| UserValidationError::InvalidId)
    }
}

impl From<Uuid> for UserId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// The signed-in manager.
///
/// Names come from the metadata captured at registration and may be absent
/// for accounts created elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manager {
    id: UserId,
    email: String,
    first_name: Option<String>,
    last_name: Option<String>,
}

impl Manager {
    /// Assemble a manager from the auth collaborator's user record.
    pub fn new(
        id: UserId,
        email: impl Into<String>,
        first_name: Option<String>,
        last_name: Option<String>,
    ) -> Self {
        let non_blank = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        Self {
            id,
            email: email.into(),
            first_name: non_blank(first_name),
            last_name: non_blank(last_name),
        }
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    pub fn first_name(&self) -> Option<&str> {
        self.first_name.as_deref()
    }

    pub fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref()
    }

    /// Upper-cased greeting name: the first name, else the email's local part.
    ///
    /// # Examples
    /// ```
    /// use rota::domain::{Manager, UserId};
    ///
    /// let manager = Manager::new(UserId::random(), "sam@example.com", None, None);
    /// assert_eq!(manager.display_name(), "SAM");
    /// ```
    pub fn display_name(&self) -> String {
        if let Some(first) = self.first_name() {
            return first.trim().to_uppercase();
        }
        let local = self
            .email
            .split_once('@')
            .map_or(self.email.as_str(), |(local, _)| local);
        local.to_uppercase()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for manager identity helpers.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", UserValidationError::EmptyId)]
    #[case("   ", UserValidationError::EmptyId)]
    #[case("not-a-uuid", UserValidationError::InvalidId)]
    fn rejects_bad_ids(#[case] raw: &str, #[case] expected: UserValidationError) {
        assert_eq!(UserId::new(raw), Err(expected));
    }

    #[test]
    fn prints_the_hyphenated_form() {
        let id = UserId::new(" 3FA85F64-5717-4562-B3FC-2C963F66AFA6 ").expect("valid id");
        assert_eq!(id.to_string(), "3fa85f64-5717-4562-b3fc-2c963f66afa6");
    }

    #[rstest]
    #[case(Some("  alice "), "ada@example.com", "ALICE")]
    #[case(None, "ada@example.com", "ADA")]
    #[case(Some("   "), "ada@example.com", "ADA")]
    #[case(None, "no-at-sign", "NO-AT-SIGN")]
    fn derives_display_name(
        #[case] first: Option<&str>,
        #[case] email: &str,
        #[case] expected: &str,
    ) {
        let manager = Manager::new(UserId::random(), email, first.map(str::to_owned), None);
        assert_eq!(manager.display_name(), expected);
    }
}

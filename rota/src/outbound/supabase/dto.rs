//! DTOs for the Supabase auth (GoTrue) and data (PostgREST) payloads.
//!
//! Adapters decode into these transport DTOs first, then map into domain
//! values in one pass.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::ports::ShiftRecord;
use crate::domain::{
    Employee, EmployeeId, Manager, SecretToken, Session, Shift, UserId, parse_day_key,
};

#[derive(Debug, Deserialize)]
pub(super) struct SessionDto {
    pub(super) access_token: String,
    pub(super) refresh_token: String,
    #[serde(default)]
    pub(super) expires_in: Option<i64>,
    #[serde(default)]
    pub(super) expires_at: Option<i64>,
    pub(super) user: UserDto,
}

#[derive(Debug, Deserialize)]
pub(super) struct UserDto {
    pub(super) id: String,
    #[serde(default)]
    pub(super) email: Option<String>,
    #[serde(default)]
    pub(super) user_metadata: UserMetadataDto,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub(super) struct UserMetadataDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) last_name: Option<String>,
}

/// Sign-up answers with a session when email confirmation is off, and with
/// the bare user record when it is on.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum SignUpDto {
    Session(SessionDto),
    User(UserDto),
}

/// Error body shapes used by GoTrue across versions.
#[derive(Debug, Default, Deserialize)]
pub(super) struct AuthErrorDto {
    #[serde(default)]
    pub(super) error: Option<String>,
    #[serde(default)]
    pub(super) error_code: Option<String>,
    #[serde(default)]
    pub(super) error_description: Option<String>,
    #[serde(default)]
    pub(super) msg: Option<String>,
}

impl AuthErrorDto {
    pub(super) fn message(&self) -> Option<&str> {
        self.error_description
            .as_deref()
            .or(self.msg.as_deref())
            .or(self.error.as_deref())
    }

    pub(super) fn is_invalid_credentials(&self) -> bool {
        [self.error.as_deref(), self.error_code.as_deref()]
            .into_iter()
            .flatten()
            .any(|code| code == "invalid_grant" || code == "invalid_credentials")
    }
}

#[derive(Debug, Serialize)]
pub(super) struct PasswordGrantDto<'a> {
    pub(super) email: &'a str,
    pub(super) password: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct SignUpRequestDto<'a> {
    pub(super) email: &'a str,
    pub(super) password: &'a str,
    pub(super) data: UserMetadataDto,
}

#[derive(Debug, Serialize)]
pub(super) struct RefreshGrantDto<'a> {
    pub(super) refresh_token: &'a str,
}

impl UserDto {
    pub(super) fn into_manager(self) -> Result<Manager, String> {
        let id = UserId::new(&self.id).map_err(|error| format!("user id {}: {error}", self.id))?;
        Ok(Manager::new(
            id,
            self.email.unwrap_or_default(),
            self.user_metadata.first_name,
            self.user_metadata.last_name,
        ))
    }
}

impl SessionDto {
    /// Absolute expiry wins; otherwise count `expires_in` from `now`.
    pub(super) fn into_session(self, now: DateTime<Utc>) -> Result<Session, String> {
        let expires_at = match (self.expires_at, self.expires_in) {
            (Some(at), _) => Utc
                .timestamp_opt(at, 0)
                .single()
                .ok_or_else(|| format!("expires_at {at} out of range"))?,
            (None, Some(seconds)) => now + TimeDelta::seconds(seconds.max(0)),
            (None, None) => return Err("session carries no expiry".to_owned()),
        };
        let manager = self.user.into_manager()?;
        Ok(Session::new(
            manager,
            SecretToken::new(self.access_token),
            SecretToken::new(self.refresh_token),
            expires_at,
        ))
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct EmployeeRowDto {
    pub(super) id: Uuid,
    pub(super) first_name: String,
    pub(super) last_name: String,
    #[serde(default)]
    pub(super) contracted_minutes: Option<i64>,
    #[serde(default)]
    pub(super) is_active: Option<bool>,
}

impl EmployeeRowDto {
    pub(super) fn into_employee(self) -> Employee {
        let minutes = self
            .contracted_minutes
            .map_or(0, |value| u32::try_from(value.max(0)).unwrap_or(u32::MAX));
        Employee::new(
            EmployeeId::from(self.id),
            self.first_name,
            self.last_name,
            minutes,
            self.is_active.unwrap_or(true),
        )
    }
}

#[derive(Debug, Serialize)]
pub(super) struct NewEmployeeDto<'a> {
    pub(super) owner_id: &'a str,
    pub(super) first_name: &'a str,
    pub(super) last_name: &'a str,
    pub(super) contracted_minutes: u32,
    pub(super) is_active: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct EmployeePatchDto<'a> {
    pub(super) first_name: &'a str,
    pub(super) last_name: &'a str,
    pub(super) contracted_minutes: u32,
}

#[derive(Debug, Serialize)]
pub(super) struct ActivePatchDto {
    pub(super) is_active: bool,
}

#[derive(Debug, Deserialize)]
pub(super) struct ShiftRowDto {
    pub(super) employee_id: Uuid,
    pub(super) shift_date: String,
    #[serde(default)]
    pub(super) start_time: Option<String>,
    #[serde(default)]
    pub(super) end_time: Option<String>,
    #[serde(default)]
    pub(super) break_minutes: Option<i64>,
}

impl ShiftRowDto {
    pub(super) fn into_record(self) -> Result<ShiftRecord, String> {
        let day = parse_day_key(&self.shift_date)
            .map_err(|error| format!("shift_date {:?}: {error}", self.shift_date))?;
        Ok(ShiftRecord {
            employee_id: EmployeeId::from(self.employee_id),
            day,
            shift: Shift::from_parts(
                self.start_time.as_deref(),
                self.end_time.as_deref(),
                self.break_minutes.unwrap_or(0),
            ),
        })
    }
}

#[derive(Debug, Serialize)]
pub(super) struct ShiftUpsertDto {
    pub(super) owner_id: String,
    pub(super) employee_id: String,
    pub(super) shift_date: String,
    pub(super) start_time: Option<String>,
    pub(super) end_time: Option<String>,
    pub(super) break_minutes: u32,
}

#[cfg(test)]
mod tests {
    //! Regression coverage for payload decoding.
    use super::*;

    #[test]
    fn decodes_session_with_metadata() {
        let body = r#"{
            "access_token": "a", "refresh_token": "r", "expires_in": 3600,
            "user": {
                "id": "3fa85f64-5717-4562-b3fc-2c963f66afa6",
                "email": "ada@example.com",
                "user_metadata": { "first_name": "Ada" }
            }
        }"#;
        let dto: SessionDto = serde_json::from_str(body).expect("decodes");
        let now = Utc::now();
        let session = dto.into_session(now).expect("maps");
        assert_eq!(session.manager().display_name(), "ADA");
        assert_eq!(session.expires_at(), now + TimeDelta::seconds(3600));
    }

    #[test]
    fn sign_up_without_session_is_a_user_record() {
        let body = r#"{ "id": "3fa85f64-5717-4562-b3fc-2c963f66afa6", "email": "ada@example.com" }"#;
        let dto: SignUpDto = serde_json::from_str(body).expect("decodes");
        assert!(matches!(dto, SignUpDto::User(_)));
    }

    #[test]
    fn shift_rows_accept_seconds_and_nulls() {
        let body = r#"[
            { "employee_id": "3fa85f64-5717-4562-b3fc-2c963f66afa6", "shift_date": "2026-02-09",
              "start_time": "09:00:00", "end_time": "17:30:00", "break_minutes": 30 },
            { "employee_id": "3fa85f64-5717-4562-b3fc-2c963f66afa6", "shift_date": "2026-02-10",
              "start_time": null, "end_time": "17:30", "break_minutes": null }
        ]"#;
        let rows: Vec<ShiftRowDto> = serde_json::from_str(body).expect("decodes");
        let records: Vec<ShiftRecord> = rows
            .into_iter()
            .map(ShiftRowDto::into_record)
            .collect::<Result<_, _>>()
            .expect("maps");
        assert_eq!(records.first().map(|r| r.shift.paid_minutes()), Some(480));
        assert_eq!(records.get(1).map(|r| r.shift.paid_minutes()), Some(0));
    }

    #[test]
    fn employee_rows_default_missing_flags() {
        let body = r#"{ "id": "3fa85f64-5717-4562-b3fc-2c963f66afa6",
            "first_name": "Ada", "last_name": "Byron", "contracted_minutes": -5 }"#;
        let dto: EmployeeRowDto = serde_json::from_str(body).expect("decodes");
        let employee = dto.into_employee();
        assert!(employee.is_active());
        assert_eq!(employee.contracted_minutes(), 0);
    }

    #[test]
    fn recognises_invalid_grant() {
        let dto: AuthErrorDto = serde_json::from_str(
            r#"{ "error": "invalid_grant", "error_description": "Invalid login credentials" }"#,
        )
        .expect("decodes");
        assert!(dto.is_invalid_credentials());
        assert_eq!(dto.message(), Some("Invalid login credentials"));
    }
}

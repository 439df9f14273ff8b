//! Employees and the employee editor rules.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::time::{STEP_MINUTES, whole_minutes};

/// Highest contracted week the editor accepts, in minutes (80 hours).
pub const MAX_CONTRACTED_MINUTES: u32 = 80 * 60;

/// Validation errors returned by [`EmployeeForm::validate`] and
/// [`EmployeeId::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmployeeValidationError {
    InvalidId,
    EmptyFirstName,
    EmptyLastName,
    HoursNotNumeric,
    HoursTooHigh { max_hours: u32 },
}

impl fmt::Display for EmployeeValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidId => write!(f, "employee id must be a valid UUID"),
            Self::EmptyFirstName => write!(f, "First name is required."),
            Self::EmptyLastName => write!(f, "Last name is required."),
            Self::HoursNotNumeric => write!(
                f,
                "Contracted hours must be a number (e.g. 39 or 39.5)."
            ),
            Self::HoursTooHigh { max_hours } => write!(
                f,
                "Contracted hours seems too high (max {max_hours})."
            ),
        }
    }
}

impl std::error::Error for EmployeeValidationError {}

/// Stable employee identifier assigned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeId(Uuid);

impl EmployeeId {
    /// Parse an identifier from its string form.
    pub fn new(id: impl AsRef<str>) -> Result<Self, EmployeeValidationError> {
        Uuid::parse_str(id.as_ref().trim())
            .map(Self)
            .map_err(|_| EmployeeValidationError::InvalidId)
    }

    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for EmployeeId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Validated employee details written by the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDetails {
    first_name: String,
    last_name: String,
    contracted_minutes: u32,
}

impl EmployeeDetails {
    /// Trimmed first name.
    pub fn first_name(&self) -> &str {
        self.first_name.as_str()
    }

    /// Trimmed last name.
    pub fn last_name(&self) -> &str {
        self.last_name.as_str()
    }

    /// Contracted weekly minutes, on the 15-minute grid.
    pub fn contracted_minutes(&self) -> u32 {
        self.contracted_minutes
    }
}

/// A member of staff on the rota.
///
/// ## Invariants
/// - `details` satisfies the editor rules when created locally; rows read from
///   the backend are taken as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    id: EmployeeId,
    #[serde(flatten)]
    details: EmployeeDetails,
    active: bool,
}

impl Employee {
    /// Assemble an employee from stored values.
    pub fn new(
        id: EmployeeId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        contracted_minutes: u32,
        active: bool,
    ) -> Self {
        Self {
            id,
            details: EmployeeDetails {
                first_name: first_name.into(),
                last_name: last_name.into(),
                contracted_minutes,
            },
            active,
        }
    }

    pub fn id(&self) -> EmployeeId {
        self.id
    }

    pub fn first_name(&self) -> &str {
        self.details.first_name()
    }

    pub fn last_name(&self) -> &str {
        self.details.last_name()
    }

    pub fn contracted_minutes(&self) -> u32 {
        self.details.contracted_minutes()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Copy of this employee with a different active flag.
    #[must_use]
    pub fn with_active(&self, active: bool) -> Self {
        Self {
            active,
            ..self.clone()
        }
    }

    /// `First Last` label used for display and ordering.
    pub fn label(&self) -> String {
        format!("{} {}", self.first_name(), self.last_name())
    }

    /// Compare by label ignoring case, the order the dashboard lists staff.
    pub fn cmp_by_label(&self, other: &Self) -> Ordering {
        self.label()
            .to_lowercase()
            .cmp(&other.label().to_lowercase())
            .then_with(|| self.label().cmp(&other.label()))
    }
}

/// Raw employee editor input.
///
/// # Examples
/// ```
/// use rota::domain::EmployeeForm;
///
/// let details = EmployeeForm::new(" Aarav ", "Patel", "39.5").validate().unwrap();
/// assert_eq!(details.first_name(), "Aarav");
/// assert_eq!(details.contracted_minutes(), 2370);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeeForm {
    first_name: String,
    last_name: String,
    contracted_hours: String,
}

impl EmployeeForm {
    /// Capture raw editor input.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        contracted_hours: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            contracted_hours: contracted_hours.into(),
        }
    }

    /// Prefill the editor from an existing employee.
    pub fn from_employee(employee: &Employee) -> Self {
        Self::new(
            employee.first_name(),
            employee.last_name(),
            hours_input_from_minutes(employee.contracted_minutes()),
        )
    }

    /// Validate names and convert contracted hours to minutes.
    pub fn validate(&self) -> Result<EmployeeDetails, EmployeeValidationError> {
        let first_name = self.first_name.trim();
        if first_name.is_empty() {
            return Err(EmployeeValidationError::EmptyFirstName);
        }
        let last_name = self.last_name.trim();
        if last_name.is_empty() {
            return Err(EmployeeValidationError::EmptyLastName);
        }
        let contracted_minutes = minutes_from_hours_input(&self.contracted_hours)
            .ok_or(EmployeeValidationError::HoursNotNumeric)?;
        if contracted_minutes > MAX_CONTRACTED_MINUTES {
            return Err(EmployeeValidationError::HoursTooHigh {
                max_hours: MAX_CONTRACTED_MINUTES / 60,
            });
        }
        Ok(EmployeeDetails {
            first_name: first_name.to_owned(),
            last_name: last_name.to_owned(),
            contracted_minutes,
        })
    }
}

/// Convert an hours value such as `"39.5"` or `"16,25"` to whole minutes on
/// the 15-minute grid.
///
/// Returns `None` for blank, non-numeric, or negative input. Values too large
/// to represent saturate, so the caller's upper bound still rejects them.
pub fn minutes_from_hours_input(raw: &str) -> Option<u32> {
    let normalised = raw.trim().replacen(',', ".", 1);
    if normalised.is_empty() {
        return None;
    }
    let hours = normalised.parse::<f64>().ok()?;
    if !hours.is_finite() || hours < 0.0 {
        return None;
    }
    let step = f64::from(STEP_MINUTES);
    let minutes = (hours * 60.0 / step).round() * step;
    whole_minutes(minutes).or(Some(u32::MAX))
}

/// Render minutes back into the editor's hours field (`2370` -> `"39.5"`).
pub fn hours_input_from_minutes(minutes: u32) -> String {
    let formatted = format!("{:.2}", f64::from(minutes) / 60.0);
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_owned()
}

/// Human label for contracted hours (`"39 hrs 30 mins"`).
pub fn contracted_hours_label(minutes: u32) -> String {
    let hours = minutes / 60;
    match minutes % 60 {
        0 => format!("{hours} hrs"),
        rest => format!("{hours} hrs {rest} mins"),
    }
}

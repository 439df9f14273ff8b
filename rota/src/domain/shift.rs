//! Shifts, paid-minute calculation, and shift editor validation.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::time::{
    ClockTime, MINUTES_PER_DAY, STEP_MINUTES, normalise_time_input, snap_to_step, whole_minutes,
};

/// Longest break the editor accepts, in minutes.
pub const MAX_BREAK_MINUTES: u32 = 120;

/// One employee's working hours on one day.
///
/// Start and end are optional: a row read back from the backend may carry a
/// blank or unreadable value, and such a shift simply pays nothing.
///
/// # Examples
/// ```
/// use rota::domain::Shift;
///
/// let shift = Shift::from_parts(Some("22:00"), Some("06:00"), 0);
/// assert_eq!(shift.paid_minutes(), 480);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    start: Option<ClockTime>,
    end: Option<ClockTime>,
    break_minutes: u32,
}

impl Shift {
    /// Build a shift from validated times.
    pub fn new(start: ClockTime, end: ClockTime, break_minutes: u32) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            break_minutes,
        }
    }

    /// Build a shift leniently from raw values.
    ///
    /// Unparseable times become absent and negative breaks count as zero.
    pub fn from_parts(start: Option<&str>, end: Option<&str>, break_minutes: i64) -> Self {
        let parse = |raw: Option<&str>| raw.and_then(|value| ClockTime::parse_stored(value).ok());
        Self {
            start: parse(start),
            end: parse(end),
            break_minutes: u32::try_from(break_minutes.max(0)).unwrap_or(u32::MAX),
        }
    }

    /// Shift start, when present.
    pub fn start(&self) -> Option<ClockTime> {
        self.start
    }

    /// Shift end, when present.
    pub fn end(&self) -> Option<ClockTime> {
        self.end
    }

    /// Unpaid break in minutes.
    pub fn break_minutes(&self) -> u32 {
        self.break_minutes
    }

    /// Whether both ends of the shift are known.
    pub fn is_scheduled(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    /// Elapsed minutes from start to end, wrapping past midnight.
    ///
    /// An end earlier than the start is read as the following day. Equal
    /// start and end give zero.
    pub fn duration_minutes(&self) -> u32 {
        match (self.start, self.end) {
            (Some(start), Some(end)) => {
                (end.minutes() + MINUTES_PER_DAY - start.minutes()) % MINUTES_PER_DAY
            }
            _ => 0,
        }
    }

    /// Paid minutes: duration minus break, never below zero.
    pub fn paid_minutes(&self) -> u32 {
        self.duration_minutes().saturating_sub(self.break_minutes)
    }
}

/// Human label for a break used in grid cells.
///
/// # Examples
/// ```
/// use rota::domain::break_label;
///
/// assert_eq!(break_label(0), "NO BREAK");
/// assert_eq!(break_label(75), "BREAK = 1h 15m");
/// ```
pub fn break_label(break_minutes: u32) -> String {
    let hours = break_minutes / 60;
    let minutes = break_minutes % 60;
    match (hours, minutes) {
        (0, 0) => "NO BREAK".to_owned(),
        (0, m) => format!("BREAK = {m}m"),
        (h, 0) => format!("BREAK = {h}h"),
        (h, m) => format!("BREAK = {h}h {m}m"),
    }
}

/// Snap raw break input the way the editor does when the field loses focus.
///
/// Blank and non-numeric input is returned unchanged; numbers are clamped to
/// `[0, 120]` and rounded to 15 minutes, and zero becomes blank.
pub fn normalise_break_input(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let Ok(value) = trimmed.parse::<f64>() else {
        return trimmed.to_owned();
    };
    if !value.is_finite() {
        return trimmed.to_owned();
    }
    let Some(clamped) = whole_minutes(value.clamp(0.0, f64::from(MAX_BREAK_MINUTES))) else {
        return trimmed.to_owned();
    };
    let snapped = snap_to_step(clamped, STEP_MINUTES);
    if snapped == 0 {
        String::new()
    } else {
        snapped.to_string()
    }
}

/// Errors reported by the shift editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShiftValidationError {
    /// Start or end was left blank.
    MissingTimes,
    /// Start or end did not parse as a time.
    InvalidTime,
    /// Break was not a number.
    BreakNotNumeric,
    /// Break was below zero.
    NegativeBreak,
    /// Break was longer than two hours.
    BreakTooLong { max: u32 },
    /// Break was not on the 15-minute grid.
    BreakOffStep { step: u32 },
}

impl fmt::Display for ShiftValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTimes => write!(f, "Please enter both Start and End."),
            Self::InvalidTime => write!(f, "Start/End must be a valid time."),
            Self::BreakNotNumeric => write!(f, "Break must be a number (minutes)."),
            Self::NegativeBreak => write!(f, "Break cannot be negative."),
            Self::BreakTooLong { max } => {
                write!(f, "Break cannot exceed {} hours.", max / 60)
            }
            Self::BreakOffStep { step } => write!(f, "Break must be in {step}-minute steps."),
        }
    }
}

impl std::error::Error for ShiftValidationError {}

/// What a valid shift editor wants committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftFormOutcome {
    /// Nothing was entered; closing the editor commits nothing.
    Untouched,
    /// A complete shift ready to be saved.
    Ready(Shift),
}

/// Raw shift editor input.
///
/// # Examples
/// ```
/// use rota::domain::{ShiftForm, ShiftFormOutcome};
///
/// let form = ShiftForm::new("900", "1730", "30");
/// let ShiftFormOutcome::Ready(shift) = form.validate().unwrap() else {
///     panic!("expected a shift");
/// };
/// assert_eq!(shift.paid_minutes(), 480);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShiftForm {
    start: String,
    end: String,
    break_minutes: String,
}

impl ShiftForm {
    /// Capture raw editor input.
    pub fn new(
        start: impl Into<String>,
        end: impl Into<String>,
        break_minutes: impl Into<String>,
    ) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            break_minutes: break_minutes.into(),
        }
    }

    /// Prefill the editor from an existing shift.
    pub fn from_shift(shift: &Shift) -> Self {
        let time = |value: Option<ClockTime>| value.map(|t| t.to_string()).unwrap_or_default();
        let break_minutes = match shift.break_minutes() {
            0 => String::new(),
            minutes => minutes.to_string(),
        };
        Self {
            start: time(shift.start()),
            end: time(shift.end()),
            break_minutes,
        }
    }

    /// Raw start input.
    pub fn start(&self) -> &str {
        self.start.as_str()
    }

    /// Raw end input.
    pub fn end(&self) -> &str {
        self.end.as_str()
    }

    /// Raw break input.
    pub fn break_minutes(&self) -> &str {
        self.break_minutes.as_str()
    }

    fn is_untouched(&self) -> bool {
        let break_raw = self.break_minutes.trim();
        self.start.trim().is_empty()
            && self.end.trim().is_empty()
            && (break_raw.is_empty() || break_raw == "0")
    }

    /// Validate the input, normalising times onto the 15-minute grid.
    pub fn validate(&self) -> Result<ShiftFormOutcome, ShiftValidationError> {
        if self.is_untouched() {
            return Ok(ShiftFormOutcome::Untouched);
        }

        let start = normalise_time_input(&self.start);
        let end = normalise_time_input(&self.end);
        if start.is_empty() || end.is_empty() {
            return Err(ShiftValidationError::MissingTimes);
        }
        let (Ok(start), Ok(end)) = (ClockTime::parse_hh_mm(&start), ClockTime::parse_hh_mm(&end))
        else {
            return Err(ShiftValidationError::InvalidTime);
        };

        let break_minutes = parse_break(&self.break_minutes)?;
        Ok(ShiftFormOutcome::Ready(Shift::new(start, end, break_minutes)))
    }
}

fn parse_break(raw: &str) -> Result<u32, ShiftValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    let value = trimmed
        .parse::<i64>()
        .map_err(|_| ShiftValidationError::BreakNotNumeric)?;
    if value < 0 {
        return Err(ShiftValidationError::NegativeBreak);
    }
    let value = u32::try_from(value).map_err(|_| ShiftValidationError::BreakTooLong {
        max: MAX_BREAK_MINUTES,
    })?;
    if value > MAX_BREAK_MINUTES {
        return Err(ShiftValidationError::BreakTooLong {
            max: MAX_BREAK_MINUTES,
        });
    }
    if value % STEP_MINUTES != 0 {
        return Err(ShiftValidationError::BreakOffStep { step: STEP_MINUTES });
    }
    Ok(value)
}

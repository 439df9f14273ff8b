//! Time-of-day values and the minute arithmetic behind shift editing.
//!
//! Times are minutes since midnight. Editors accept loose input ("900",
//! "0915", "13:37") and snap it onto the 15-minute grid used by the rota.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Minutes in one calendar day.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Granularity of every stored time and break value.
pub const STEP_MINUTES: u32 = 15;

static HH_MM_RE: OnceLock<Regex> = OnceLock::new();
static DIGITS_RE: OnceLock<Regex> = OnceLock::new();

fn hh_mm_regex() -> &'static Regex {
    HH_MM_RE.get_or_init(|| {
        Regex::new(r"^(\d{2}):(\d{2})$")
            .unwrap_or_else(|error| panic!("time regex failed to compile: {error}"))
    })
}

fn digits_regex() -> &'static Regex {
    DIGITS_RE.get_or_init(|| {
        Regex::new(r"^\d{3,4}$")
            .unwrap_or_else(|error| panic!("digits regex failed to compile: {error}"))
    })
}

/// Errors raised when parsing a time of day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeParseError {
    /// Input was not in `HH:MM` form.
    Malformed,
    /// Hours or minutes fell outside the clock range.
    OutOfRange,
}

impl fmt::Display for TimeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "time must be in HH:MM form"),
            Self::OutOfRange => write!(f, "time must be between 00:00 and 23:59"),
        }
    }
}

impl std::error::Error for TimeParseError {}

/// A time of day stored as minutes since midnight.
///
/// ## Invariants
/// - The inner value is always within `0..=1439`.
///
/// # Examples
/// ```
/// use rota::domain::ClockTime;
///
/// let time: ClockTime = "17:30".parse().unwrap();
/// assert_eq!(time.minutes(), 1050);
/// assert_eq!(time.to_string(), "17:30");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(u16);

impl ClockTime {
    /// Midnight at the start of the day.
    pub const MIDNIGHT: Self = Self(0);

    /// Build a time from minutes since midnight.
    pub fn from_minutes(minutes: u32) -> Result<Self, TimeParseError> {
        u16::try_from(minutes)
            .ok()
            .filter(|value| u32::from(*value) < MINUTES_PER_DAY)
            .map(Self)
            .ok_or(TimeParseError::OutOfRange)
    }

    /// Build a time from an hour and minute pair.
    pub fn from_hm(hours: u32, minutes: u32) -> Result<Self, TimeParseError> {
        if hours > 23 || minutes > 59 {
            return Err(TimeParseError::OutOfRange);
        }
        Self::from_minutes(hours * 60 + minutes)
    }

    /// Minutes since midnight.
    pub fn minutes(self) -> u32 {
        u32::from(self.0)
    }

    /// Snap onto the 15-minute grid, wrapping 24:00 back to midnight.
    pub fn snapped(self) -> Self {
        let snapped = snap_to_step(self.minutes(), STEP_MINUTES) % MINUTES_PER_DAY;
        Self::from_minutes(snapped).unwrap_or(Self::MIDNIGHT)
    }

    /// Parse a strict `HH:MM` value, trimming surrounding whitespace.
    ///
    /// Seconds (`HH:MM:SS`) are not accepted here; see
    /// [`ClockTime::parse_stored`] for backend column values.
    pub fn parse_hh_mm(raw: &str) -> Result<Self, TimeParseError> {
        let captures = hh_mm_regex()
            .captures(raw.trim())
            .ok_or(TimeParseError::Malformed)?;
        let hours = captures
            .get(1)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .ok_or(TimeParseError::Malformed)?;
        let minutes = captures
            .get(2)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .ok_or(TimeParseError::Malformed)?;
        Self::from_hm(hours, minutes)
    }

    /// Parse a value read back from the backend, which may carry seconds.
    pub fn parse_stored(raw: &str) -> Result<Self, TimeParseError> {
        let trimmed = raw.trim();
        match trimmed.rsplit_once(':') {
            Some((hh_mm, seconds)) if hh_mm.contains(':') && is_two_digits(seconds) => {
                Self::parse_hh_mm(hh_mm)
            }
            _ => Self::parse_hh_mm(trimmed),
        }
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl FromStr for ClockTime {
    type Err = TimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_hh_mm(s)
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for ClockTime {
    type Error = TimeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_stored(&value)
    }
}

fn is_two_digits(raw: &str) -> bool {
    raw.len() == 2 && raw.bytes().all(|b| b.is_ascii_digit())
}

/// Whole minutes from a float, or `None` when it is not finite, negative, or
/// beyond `u32`.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "value is rounded and range-checked against u32 first"
)]
pub(crate) fn whole_minutes(value: f64) -> Option<u32> {
    let rounded = value.round();
    if !rounded.is_finite() || rounded < 0.0 || rounded > f64::from(u32::MAX) {
        return None;
    }
    Some(rounded as u32)
}

/// Round `minutes` to the nearest multiple of `step`, halves rounding up.
///
/// # Examples
/// ```
/// use rota::domain::snap_to_step;
///
/// assert_eq!(snap_to_step(7, 15), 0);
/// assert_eq!(snap_to_step(8, 15), 15);
/// assert_eq!(snap_to_step(125, 15), 120);
/// ```
pub fn snap_to_step(minutes: u32, step: u32) -> u32 {
    if step == 0 {
        return minutes;
    }
    (minutes + step / 2) / step * step
}

/// Normalise free-form time input to `HH:MM` on the 15-minute grid.
///
/// Accepts `HH:MM` and three or four digit strings (`"900"`, `"1330"`).
/// Anything else is returned trimmed and otherwise untouched so the editor
/// can report it.
///
/// # Examples
/// ```
/// use rota::domain::normalise_time_input;
///
/// assert_eq!(normalise_time_input("900"), "09:00");
/// assert_eq!(normalise_time_input("13:37"), "13:30");
/// assert_eq!(normalise_time_input(" soon "), "soon");
/// ```
pub fn normalise_time_input(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Ok(time) = ClockTime::parse_hh_mm(trimmed) {
        return time.snapped().to_string();
    }

    if digits_regex().is_match(trimmed) {
        let digits = format!("{trimmed:0>4}");
        let (hours, minutes) = digits.split_at(2);
        if let (Ok(hours), Ok(minutes)) = (hours.parse::<u32>(), minutes.parse::<u32>()) {
            if let Ok(time) = ClockTime::from_hm(hours, minutes) {
                return time.snapped().to_string();
            }
        }
    }

    trimmed.to_owned()
}

/// Format a minute count as `HH:MM`; hours are not wrapped at 24.
///
/// # Examples
/// ```
/// use rota::domain::minutes_to_hh_mm;
///
/// assert_eq!(minutes_to_hh_mm(2370), "39:30");
/// ```
pub fn minutes_to_hh_mm(total_minutes: u32) -> String {
    format!("{:02}:{:02}", total_minutes / 60, total_minutes % 60)
}

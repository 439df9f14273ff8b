//! Week navigation over calendar dates.
//!
//! Weeks run Sunday to Saturday. Everything here works on `NaiveDate`, so
//! daylight-saving changes and time zones never move a day.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use mockable::Clock;

/// Number of days shown in the rota.
pub const DAYS_PER_WEEK: usize = 7;

/// Sunday on or before `date`.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use rota::domain::week_start;
///
/// let wednesday = NaiveDate::from_ymd_opt(2026, 2, 11).unwrap();
/// assert_eq!(week_start(wednesday), NaiveDate::from_ymd_opt(2026, 2, 8).unwrap());
/// ```
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = u64::from(date.weekday().num_days_from_sunday());
    date.checked_sub_days(Days::new(offset))
        .unwrap_or(NaiveDate::MIN)
}

/// The seven dates of the week containing `anchor`, Sunday first.
pub fn week_days(anchor: NaiveDate) -> [NaiveDate; DAYS_PER_WEEK] {
    let sunday = week_start(anchor);
    let mut days = [sunday; DAYS_PER_WEEK];
    for (offset, day) in (0_u64..).zip(days.iter_mut()) {
        *day = sunday.checked_add_days(Days::new(offset)).unwrap_or(NaiveDate::MAX);
    }
    days
}

/// The week currently on screen, identified by its Sunday.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use rota::domain::VisibleWeek;
///
/// let week = VisibleWeek::containing(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
/// assert_eq!(week.start().to_string(), "2025-12-28");
/// assert_eq!(week.next().start().to_string(), "2026-01-04");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VisibleWeek {
    start: NaiveDate,
}

impl VisibleWeek {
    /// The week containing `anchor`.
    pub fn containing(anchor: NaiveDate) -> Self {
        Self {
            start: week_start(anchor),
        }
    }

    /// The week containing today's local date.
    pub fn current(clock: &dyn Clock) -> Self {
        Self::containing(clock.local().date_naive())
    }

    /// Sunday of the week.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Saturday of the week.
    pub fn end(&self) -> NaiveDate {
        self.start
            .checked_add_days(Days::new(DAYS_PER_WEEK as u64 - 1))
            .unwrap_or(NaiveDate::MAX)
    }

    /// All seven days, Sunday first.
    pub fn days(&self) -> [NaiveDate; DAYS_PER_WEEK] {
        week_days(self.start)
    }

    /// Whether `date` falls inside this week.
    pub fn contains(&self, date: NaiveDate) -> bool {
        (self.start..=self.end()).contains(&date)
    }

    /// The week before.
    #[must_use]
    pub fn previous(&self) -> Self {
        Self::containing(
            self.start
                .checked_sub_days(Days::new(DAYS_PER_WEEK as u64))
                .unwrap_or(self.start),
        )
    }

    /// The week after.
    #[must_use]
    pub fn next(&self) -> Self {
        Self::containing(
            self.start
                .checked_add_days(Days::new(DAYS_PER_WEEK as u64))
                .unwrap_or(self.start),
        )
    }

    /// Heading shown above the grid, e.g. `Sunday 08th February 2026`.
    pub fn heading(&self) -> String {
        let day = self.start.day();
        format!(
            "{} {:02}{} {}",
            self.start.format("%A"),
            day,
            ordinal_suffix(day),
            self.start.format("%B %Y")
        )
    }
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

/// Backend key for a calendar day (`YYYY-MM-DD`).
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a backend day key.
pub fn parse_day_key(raw: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
}

/// Short column label, e.g. `Sun 08 Feb`.
pub fn day_label(date: NaiveDate) -> String {
    date.format("%a %d %b").to_string()
}

/// Saturday and Sunday are shaded in the grid.
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

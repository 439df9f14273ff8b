//! Week rota cache: employee -> day -> shift for the visible week.
//!
//! The cache is never authoritative. It is rebuilt from the backend whenever
//! the visible week changes and each local edit produces a new value.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::ports::ShiftRecord;
use super::{EmployeeId, Shift, VisibleWeek};

/// Shifts of one visible week, keyed by employee then calendar day.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use rota::domain::{EmployeeId, Shift, VisibleWeek, WeekRota};
///
/// let week = VisibleWeek::containing(NaiveDate::from_ymd_opt(2026, 2, 11).unwrap());
/// let employee = EmployeeId::random();
/// let monday = NaiveDate::from_ymd_opt(2026, 2, 9).unwrap();
/// let rota = WeekRota::empty(week)
///     .with_shift(employee, monday, Shift::from_parts(Some("09:00"), Some("17:30"), 30));
/// assert_eq!(rota.weekly_paid_minutes(employee), 480);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekRota {
    week: VisibleWeek,
    entries: BTreeMap<EmployeeId, BTreeMap<NaiveDate, Shift>>,
}

impl WeekRota {
    pub fn empty(week: VisibleWeek) -> Self {
        Self {
            week,
            entries: BTreeMap::new(),
        }
    }

    /// Build the cache from fetched rows. A later row for the same
    /// (employee, day) replaces an earlier one.
    pub fn from_records(week: VisibleWeek, records: impl IntoIterator<Item = ShiftRecord>) -> Self {
        let mut entries: BTreeMap<EmployeeId, BTreeMap<NaiveDate, Shift>> = BTreeMap::new();
        for record in records {
            entries
                .entry(record.employee_id)
                .or_default()
                .insert(record.day, record.shift);
        }
        Self { week, entries }
    }

    /// Week the rows were fetched for.
    pub fn week(&self) -> VisibleWeek {
        self.week
    }

    pub fn shift(&self, employee: EmployeeId, day: NaiveDate) -> Option<&Shift> {
        self.entries.get(&employee).and_then(|days| days.get(&day))
    }

    /// Copy with the (employee, day) entry set.
    #[must_use]
    pub fn with_shift(&self, employee: EmployeeId, day: NaiveDate, shift: Shift) -> Self {
        let mut next = self.clone();
        next.entries.entry(employee).or_default().insert(day, shift);
        next
    }

    /// Copy with the (employee, day) entry removed.
    #[must_use]
    pub fn without_shift(&self, employee: EmployeeId, day: NaiveDate) -> Self {
        let mut next = self.clone();
        if let Some(days) = next.entries.get_mut(&employee) {
            days.remove(&day);
            if days.is_empty() {
                next.entries.remove(&employee);
            }
        }
        next
    }

    /// Paid minutes across the seven days of `week` for one employee.
    pub fn paid_minutes_in(&self, employee: EmployeeId, week: VisibleWeek) -> u32 {
        let Some(days) = self.entries.get(&employee) else {
            return 0;
        };
        week.days()
            .iter()
            .filter_map(|day| days.get(day))
            .map(Shift::paid_minutes)
            .fold(0_u32, u32::saturating_add)
    }

    /// Paid minutes across the cached week for one employee.
    pub fn weekly_paid_minutes(&self, employee: EmployeeId) -> u32 {
        self.paid_minutes_in(employee, self.week)
    }

    /// Number of cached shifts.
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

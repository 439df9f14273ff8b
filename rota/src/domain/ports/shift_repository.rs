//! Port for shift persistence keyed on (employee, day).

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{EmployeeId, Shift, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by shift repository adapters.
    pub enum ShiftRepositoryError {
        /// The backend refused the caller's token.
        Unauthorized => "shift repository rejected credentials",
        /// Repository connection could not be established.
        Connection => "shift repository connection failed",
        /// Query or mutation failed during execution.
        Query => "shift repository query failed",
    }
}

/// One stored shift row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftRecord {
    pub employee_id: EmployeeId,
    pub day: NaiveDate,
    pub shift: Shift,
}

/// Port for range reads, upserts and deletes of an owner's shifts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShiftRepository: Send + Sync {
    /// Shifts of `owner` dated within `from..=to`.
    async fn list_in_range(
        &self,
        owner: &UserId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ShiftRecord>, ShiftRepositoryError>;

    /// Insert or replace the shift for the record's (employee, day).
    async fn upsert(&self, owner: &UserId, record: &ShiftRecord)
    -> Result<(), ShiftRepositoryError>;

    /// Remove the shift for (employee, day), if any.
    async fn delete(
        &self,
        owner: &UserId,
        employee_id: EmployeeId,
        day: NaiveDate,
    ) -> Result<(), ShiftRepositoryError>;
}

/// Fixture implementation for tests that do not exercise shift persistence.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureShiftRepository;

#[async_trait]
impl ShiftRepository for FixtureShiftRepository {
    async fn list_in_range(
        &self,
        _owner: &UserId,
        _from: NaiveDate,
        _to: NaiveDate,
    ) -> Result<Vec<ShiftRecord>, ShiftRepositoryError> {
        Ok(Vec::new())
    }

    async fn upsert(
        &self,
        _owner: &UserId,
        _record: &ShiftRecord,
    ) -> Result<(), ShiftRepositoryError> {
        Ok(())
    }

    async fn delete(
        &self,
        _owner: &UserId,
        _employee_id: EmployeeId,
        _day: NaiveDate,
    ) -> Result<(), ShiftRepositoryError> {
        Ok(())
    }
}

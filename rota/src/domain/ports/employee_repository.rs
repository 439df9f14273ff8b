//! Port for employee persistence scoped to the owning manager.

use async_trait::async_trait;

use crate::domain::{Employee, EmployeeDetails, EmployeeId, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by employee repository adapters.
    pub enum EmployeeRepositoryError {
        /// The backend refused the caller's token.
        Unauthorized => "employee repository rejected credentials",
        /// Repository connection could not be established.
        Connection => "employee repository connection failed",
        /// Query or mutation failed during execution.
        Query => "employee repository query failed",
    }
}

/// Port for reading and writing an owner's employees.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    /// All employees of `owner`, ordered by first name.
    async fn list_for_owner(&self, owner: &UserId)
    -> Result<Vec<Employee>, EmployeeRepositoryError>;

    /// Create an active employee.
    async fn insert(
        &self,
        owner: &UserId,
        details: &EmployeeDetails,
    ) -> Result<(), EmployeeRepositoryError>;

    /// Replace names and contracted minutes.
    async fn update(
        &self,
        owner: &UserId,
        id: EmployeeId,
        details: &EmployeeDetails,
    ) -> Result<(), EmployeeRepositoryError>;

    /// Flip the active flag.
    async fn set_active(
        &self,
        owner: &UserId,
        id: EmployeeId,
        active: bool,
    ) -> Result<(), EmployeeRepositoryError>;

    /// Remove the employee.
    async fn delete(&self, owner: &UserId, id: EmployeeId) -> Result<(), EmployeeRepositoryError>;
}

/// Fixture implementation for tests that do not exercise employee persistence.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureEmployeeRepository;

#[async_trait]
impl EmployeeRepository for FixtureEmployeeRepository {
    async fn list_for_owner(
        &self,
        _owner: &UserId,
    ) -> Result<Vec<Employee>, EmployeeRepositoryError> {
        Ok(Vec::new())
    }

    async fn insert(
        &self,
        _owner: &UserId,
        _details: &EmployeeDetails,
    ) -> Result<(), EmployeeRepositoryError> {
        Ok(())
    }

    async fn update(
        &self,
        _owner: &UserId,
        _id: EmployeeId,
        _details: &EmployeeDetails,
    ) -> Result<(), EmployeeRepositoryError> {
        Ok(())
    }

    async fn set_active(
        &self,
        _owner: &UserId,
        _id: EmployeeId,
        _active: bool,
    ) -> Result<(), EmployeeRepositoryError> {
        Ok(())
    }

    async fn delete(
        &self,
        _owner: &UserId,
        _id: EmployeeId,
    ) -> Result<(), EmployeeRepositoryError> {
        Ok(())
    }
}

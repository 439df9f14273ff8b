//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod auth_gateway;
mod employee_repository;
mod shift_repository;

#[cfg(test)]
pub use auth_gateway::MockAuthGateway;
pub use auth_gateway::{AuthGateway, AuthGatewayError, FIXTURE_MANAGER_ID, FixtureAuthGateway};
#[cfg(test)]
pub use employee_repository::MockEmployeeRepository;
pub use employee_repository::{
    EmployeeRepository, EmployeeRepositoryError, FixtureEmployeeRepository,
};
#[cfg(test)]
pub use shift_repository::MockShiftRepository;
pub use shift_repository::{
    FixtureShiftRepository, ShiftRecord, ShiftRepository, ShiftRepositoryError,
};

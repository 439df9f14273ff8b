//! Weekly staff rota library: domain services, hosted-backend adapters, and
//! the terminal dashboard.

pub mod domain;
pub mod inbound;
pub mod outbound;
pub mod settings;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use settings::{RotaSettings, SettingsError};

//! Domain primitives, services, and the ports they depend on.
//!
//! Purpose: define strongly typed domain entities and the services that
//! operate on them. Adapters live under `inbound` and `outbound`; nothing in
//! this module performs I/O directly.
//!
//! Public surface:
//! - Value types: [`ClockTime`], [`Shift`], [`Employee`], [`VisibleWeek`],
//!   [`Manager`], [`Session`].
//! - Editors: [`ShiftForm`], [`EmployeeForm`], [`LoginCredentials`],
//!   [`Registration`].
//! - Services: [`SessionManager`], [`RotaBoard`], [`IdleSupervisor`].
//! - Errors: [`Error`] with [`ErrorCode`].

pub mod auth;
pub mod employee;
pub mod error;
pub mod idle;
pub mod ports;
pub mod rota;
pub mod rota_board;
pub mod session;
pub mod shift;
pub mod time;
pub mod user;
pub mod week;

pub use self::auth::{
    CredentialsValidationError, LoginCredentials, MIN_EMAIL_LEN, MIN_PASSWORD_LEN, Registration,
    SecretToken, Session, SignUpOutcome,
};
pub use self::employee::{
    Employee, EmployeeDetails, EmployeeForm, EmployeeId, EmployeeValidationError,
    MAX_CONTRACTED_MINUTES, contracted_hours_label, hours_input_from_minutes,
    minutes_from_hours_input,
};
pub use self::error::{DomainError, DomainErrorValidationError, ErrorCode};
pub use self::idle::{
    IdleConfig, IdleEvent, IdlePhase, IdleSupervisor, IdleWatchdog, SessionTerminator,
    countdown_label,
};
pub use self::rota::WeekRota;
pub use self::rota_board::{RotaBoard, RotaBoardPorts, ShiftSave, WeekLoad};
pub use self::session::SessionManager;
pub use self::shift::{
    MAX_BREAK_MINUTES, Shift, ShiftForm, ShiftFormOutcome, ShiftValidationError, break_label,
    normalise_break_input,
};
pub use self::time::{
    ClockTime, MINUTES_PER_DAY, STEP_MINUTES, TimeParseError, minutes_to_hh_mm,
    normalise_time_input, snap_to_step,
};
pub use self::user::{Manager, UserId, UserValidationError};
pub use self::week::{
    DAYS_PER_WEEK, VisibleWeek, day_key, day_label, is_weekend, parse_day_key, week_days,
    week_start,
};

/// Domain error returned by services.
pub type Error = DomainError;

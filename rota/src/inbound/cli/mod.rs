//! Terminal dashboard: a line-oriented shell over the rota services.

pub mod command;
pub mod render;
pub mod shell;

pub use command::{DayRef, HELP, ShellCommand, ShellLine, WeekTarget, parse_line};
pub use shell::{Flow, Shell, ShellContext, describe_idle_event};

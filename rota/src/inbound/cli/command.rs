//! Shell command grammar.
//!
//! Each input line is parsed by `clap` with `no_binary_name`, so the first
//! word is the subcommand.

use chrono::{NaiveDate, Weekday};
use clap::{Parser, Subcommand};

use crate::domain::{VisibleWeek, parse_day_key};

/// One parsed input line.
#[derive(Debug, Parser)]
#[command(
    name = "rota",
    no_binary_name = true,
    disable_help_flag = true,
    disable_help_subcommand = true,
    disable_version_flag = true
)]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: ShellCommand,
}

/// Commands understood by the interactive shell.
///
/// Employee rows are addressed by their 1-based position in the listing.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum ShellCommand {
    /// Sign in with email and password.
    Login { email: String, password: String },
    /// Create a manager account.
    Register {
        first_name: String,
        last_name: String,
        email: String,
        password: String,
    },
    /// Sign out.
    Logout,
    /// Move the visible week.
    Week {
        #[arg(value_parser = parse_week_target)]
        target: Option<WeekTarget>,
    },
    /// Print the rota grid for the visible week.
    Show,
    /// Reload and list employees.
    Employees,
    /// Select an employee row for editing.
    Select { row: usize },
    /// Add an employee.
    AddEmployee {
        first_name: String,
        last_name: String,
        #[arg(allow_hyphen_values = true)]
        contracted_hours: String,
    },
    /// Edit the selected employee; omitted fields keep their value.
    EditEmployee {
        #[arg(long)]
        first: Option<String>,
        #[arg(long)]
        last: Option<String>,
        #[arg(long, allow_hyphen_values = true)]
        hours: Option<String>,
    },
    /// Delete the selected employee and their shifts.
    DeleteEmployee {
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },
    /// Flip the selected employee between active and inactive.
    ToggleActive,
    /// Save a shift for an employee row on a day of the visible week.
    Shift {
        row: usize,
        #[arg(value_parser = parse_day_ref)]
        day: DayRef,
        start: String,
        end: String,
        #[arg(allow_hyphen_values = true)]
        break_minutes: Option<String>,
    },
    /// Remove a shift.
    Clear {
        row: usize,
        #[arg(value_parser = parse_day_ref)]
        day: DayRef,
    },
    /// Dismiss the idle warning.
    Stay,
    /// Show the signed-in manager.
    Whoami,
    /// List commands.
    Help,
    /// Leave the shell.
    #[command(alias = "exit")]
    Quit,
}

impl ShellCommand {
    /// Commands honoured while the idle warning is showing.
    pub fn allowed_during_warning(&self) -> bool {
        matches!(self, Self::Stay | Self::Logout)
    }
}

/// Target of the `week` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekTarget {
    Previous,
    Next,
    This,
    Containing(NaiveDate),
}

fn parse_week_target(raw: &str) -> Result<WeekTarget, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "prev" | "previous" => Ok(WeekTarget::Previous),
        "next" => Ok(WeekTarget::Next),
        "this" | "today" => Ok(WeekTarget::This),
        other => parse_day_key(other)
            .map(WeekTarget::Containing)
            .map_err(|_| format!("expected prev, next, this or YYYY-MM-DD, got `{raw}`")),
    }
}

/// A day named by weekday or by date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayRef {
    Weekday(Weekday),
    Date(NaiveDate),
}

impl DayRef {
    /// Resolve against the visible week; dates outside it are refused.
    pub fn resolve(self, week: VisibleWeek) -> Result<NaiveDate, String> {
        match self {
            Self::Weekday(weekday) => week
                .days()
                .into_iter()
                .find(|day| chrono::Datelike::weekday(day) == weekday)
                .ok_or_else(|| format!("{weekday} is not in the visible week")),
            Self::Date(date) if week.contains(date) => Ok(date),
            Self::Date(date) => Err(format!(
                "{date} is outside the visible week ({} to {})",
                week.start(),
                week.end()
            )),
        }
    }
}

fn parse_day_ref(raw: &str) -> Result<DayRef, String> {
    if let Ok(weekday) = raw.trim().parse::<Weekday>() {
        return Ok(DayRef::Weekday(weekday));
    }
    parse_day_key(raw)
        .map(DayRef::Date)
        .map_err(|_| format!("expected a weekday (mon, tue, ...) or YYYY-MM-DD, got `{raw}`"))
}

/// Parse one input line. Blank lines yield `Ok(None)`.
///
/// # Examples
/// ```
/// use rota::inbound::cli::{ShellCommand, parse_line};
///
/// assert_eq!(parse_line("whoami").unwrap(), Some(ShellCommand::Whoami));
/// assert_eq!(parse_line("   ").unwrap(), None);
/// ```
pub fn parse_line(line: &str) -> Result<Option<ShellCommand>, String> {
    let words = split_words(line)?;
    if words.is_empty() {
        return Ok(None);
    }
    ShellLine::try_parse_from(words)
        .map(|parsed| Some(parsed.command))
        .map_err(|error| error.render().to_string())
}

/// Split on whitespace, keeping double-quoted runs together.
fn split_words(line: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut pending = false;
    for ch in line.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                pending = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if pending {
                    words.push(std::mem::take(&mut current));
                    pending = false;
                }
            }
            c => {
                current.push(c);
                pending = true;
            }
        }
    }
    if in_quotes {
        return Err("unterminated quote".to_owned());
    }
    if pending {
        words.push(current);
    }
    Ok(words)
}

/// Help text printed by the `help` command.
pub const HELP: &str = "\
Commands:
  login <email> <password>
  register <first> <last> <email> <password>
  logout
  week [prev|next|this|YYYY-MM-DD]
  show
  employees
  select <row>
  add-employee <first> <last> <hours>
  edit-employee [--first <name>] [--last <name>] [--hours <hours>]
  delete-employee --yes
  toggle-active
  shift <row> <day> <start> <end> [break]
  clear <row> <day>
  stay
  whoami
  help
  quit";

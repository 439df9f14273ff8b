//! Interactive loop: reads command lines, drives the domain services, and
//! prints idle warnings as they arrive.

use std::sync::Arc;

use mockable::Clock;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::debug;

use crate::domain::{
    Employee, EmployeeForm, Error, IdleEvent, IdleSupervisor, LoginCredentials, Registration,
    RotaBoard, SessionManager, ShiftForm, ShiftSave, SignUpOutcome, VisibleWeek, WeekLoad,
    break_label, day_label, hours_input_from_minutes, minutes_to_hh_mm,
};

use super::command::{DayRef, HELP, ShellCommand, WeekTarget, parse_line};
use super::render::{render_countdown, render_employees, render_grid, render_whoami};

const PROMPT: &str = "rota> ";
const WARNING_ONLY: &str = "Your session is about to time out. Type `stay` to continue or `logout`.";
const SIGNED_OUT: &str = "Sign in to continue (`login <email> <password>`).";

/// Whether the loop keeps reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Services the shell drives.
#[derive(Clone)]
pub struct ShellContext {
    pub session: Arc<SessionManager>,
    pub board: Arc<RotaBoard>,
    pub idle: Arc<IdleSupervisor>,
    pub clock: Arc<dyn Clock>,
}

/// Terminal front end for the rota.
pub struct Shell {
    ctx: ShellContext,
}

impl Shell {
    pub fn new(ctx: ShellContext) -> Self {
        Self { ctx }
    }

    /// Read lines until `quit` or end of input, interleaving idle events.
    pub async fn run<R, W>(
        &self,
        input: R,
        output: &mut W,
        mut idle_events: mpsc::UnboundedReceiver<IdleEvent>,
    ) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        write_text(output, "Weekly rota. Type `help` for commands.\n").await?;
        write_text(output, PROMPT).await?;
        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    let (flow, text) = self.handle_line(&line).await;
                    write_block(output, &text).await?;
                    if flow == Flow::Quit {
                        return Ok(());
                    }
                    write_text(output, PROMPT).await?;
                }
                Some(event) = idle_events.recv() => {
                    if event == IdleEvent::Expired {
                        self.ctx.board.reset().ok();
                    }
                    let mut text = String::from("\n");
                    text.push_str(&describe_idle_event(event));
                    text.push('\n');
                    text.push_str(PROMPT);
                    write_text(output, &text).await?;
                }
            }
        }
        self.sign_out_on_exit().await;
        Ok(())
    }

    /// Handle one input line and return what to print.
    pub async fn handle_line(&self, line: &str) -> (Flow, String) {
        let signed_in = self.ctx.session.is_signed_in();
        let warning = signed_in && self.ctx.idle.is_warning();
        if signed_in && !warning {
            self.ctx.idle.record_activity();
        }

        let command = match parse_line(line) {
            Ok(Some(command)) => command,
            Ok(None) => return (Flow::Continue, String::new()),
            Err(message) => return (Flow::Continue, message.trim_end().to_owned()),
        };
        if warning && !command.allowed_during_warning() {
            return (Flow::Continue, WARNING_ONLY.to_owned());
        }
        if command == ShellCommand::Quit {
            self.sign_out_on_exit().await;
            return (Flow::Quit, "Bye.".to_owned());
        }
        if requires_session(&command) && !signed_in {
            return (Flow::Continue, SIGNED_OUT.to_owned());
        }

        let text = self
            .execute(command)
            .await
            .unwrap_or_else(|error| describe_error(&error));
        (Flow::Continue, text)
    }

    async fn execute(&self, command: ShellCommand) -> Result<String, Error> {
        let ShellContext {
            session,
            board,
            idle,
            clock,
        } = &self.ctx;
        match command {
            ShellCommand::Login { email, password } => {
                let credentials = LoginCredentials::try_from_parts(&email, &password)
                    .map_err(|err| Error::invalid_request(err.to_string()))?;
                let manager = session.sign_in(&credentials).await?;
                let mut text = format!("Welcome, {}.", manager.display_name());
                self.append_dashboard(&mut text).await;
                Ok(text)
            }
            ShellCommand::Register {
                first_name,
                last_name,
                email,
                password,
            } => {
                let registration =
                    Registration::try_from_parts(&first_name, &last_name, &email, &password)
                        .map_err(|err| Error::invalid_request(err.to_string()))?;
                match session.sign_up(&registration).await? {
                    SignUpOutcome::SignedIn(created) => {
                        let mut text =
                            format!("Account created. Welcome, {}.", created.manager().display_name());
                        self.append_dashboard(&mut text).await;
                        Ok(text)
                    }
                    SignUpOutcome::ConfirmationRequired => Ok(
                        "Account created. Confirm your email address, then log in.".to_owned(),
                    ),
                }
            }
            ShellCommand::Logout => {
                session.sign_out().await;
                board.reset()?;
                Ok("Signed out.".to_owned())
            }
            ShellCommand::Week { target } => {
                let load = match target {
                    None => {
                        let week = board.visible_week()?;
                        return Ok(format!("Week of {}", week.heading()));
                    }
                    Some(WeekTarget::Previous) => board.previous_week().await?,
                    Some(WeekTarget::Next) => board.next_week().await?,
                    Some(WeekTarget::This) => board.this_week(clock.as_ref()).await?,
                    Some(WeekTarget::Containing(date)) => {
                        board.show_week(VisibleWeek::containing(date)).await?
                    }
                };
                match load {
                    WeekLoad::Applied { .. } => self.grid(),
                    WeekLoad::Superseded => Ok("A newer week was requested.".to_owned()),
                }
            }
            ShellCommand::Show => self.grid(),
            ShellCommand::Employees => {
                let employees = board.refresh_employees().await?;
                let selected = board.selected()?.map(|employee| employee.id());
                Ok(render_employees(&employees, selected).trim_end().to_owned())
            }
            ShellCommand::Select { row } => {
                let employee = self.employee_at(row)?;
                let employee = board.select(employee.id())?;
                Ok(format!("Selected {}.", employee.label()))
            }
            ShellCommand::AddEmployee {
                first_name,
                last_name,
                contracted_hours,
            } => {
                let form = EmployeeForm::new(first_name, last_name, contracted_hours);
                let employees = board.add_employee(&form).await?;
                Ok(render_employees(&employees, board.selected()?.map(|e| e.id()))
                    .trim_end()
                    .to_owned())
            }
            ShellCommand::EditEmployee { first, last, hours } => {
                let employee = self.require_selection()?;
                let form = EmployeeForm::new(
                    first.unwrap_or_else(|| employee.first_name().to_owned()),
                    last.unwrap_or_else(|| employee.last_name().to_owned()),
                    hours.unwrap_or_else(|| hours_input_from_minutes(employee.contracted_minutes())),
                );
                board.edit_employee(employee.id(), &form).await?;
                Ok(format!("Updated {}.", employee.label()))
            }
            ShellCommand::DeleteEmployee { yes } => {
                let employee = self.require_selection()?;
                if !yes {
                    return Ok(format!(
                        "This removes {} and all their shifts. Run `delete-employee --yes` to confirm.",
                        employee.label()
                    ));
                }
                board.delete_employee(employee.id()).await?;
                Ok(format!("Deleted {}.", employee.label()))
            }
            ShellCommand::ToggleActive => {
                let employee = self.require_selection()?;
                let active = board.toggle_active(employee.id()).await?;
                let state = if active { "active" } else { "inactive" };
                Ok(format!("{} is now {state}.", employee.label()))
            }
            ShellCommand::Shift {
                row,
                day,
                start,
                end,
                break_minutes,
            } => {
                let employee = self.employee_at(row)?;
                let date = self.resolve_day(day)?;
                let form = ShiftForm::new(start, end, break_minutes.unwrap_or_default());
                match board.save_shift(employee.id(), date, &form).await? {
                    ShiftSave::Saved(shift) => Ok(format!(
                        "{} on {}: {}-{}, {}, paid {}.",
                        employee.label(),
                        day_label(date),
                        shift.start().map(|t| t.to_string()).unwrap_or_default(),
                        shift.end().map(|t| t.to_string()).unwrap_or_default(),
                        break_label(shift.break_minutes()),
                        minutes_to_hh_mm(shift.paid_minutes()),
                    )),
                    ShiftSave::Untouched => Ok("Nothing to save.".to_owned()),
                }
            }
            ShellCommand::Clear { row, day } => {
                let employee = self.employee_at(row)?;
                let date = self.resolve_day(day)?;
                board.clear_shift(employee.id(), date).await?;
                Ok(format!("Cleared {} on {}.", employee.label(), day_label(date)))
            }
            ShellCommand::Stay => {
                if idle.stay() {
                    Ok("Welcome back.".to_owned())
                } else {
                    Ok(String::new())
                }
            }
            ShellCommand::Whoami => Ok(session.current().map_or_else(
                || "Not signed in.".to_owned(),
                |current| render_whoami(current.manager()),
            )),
            ShellCommand::Help => Ok(HELP.to_owned()),
            ShellCommand::Quit => Ok(String::new()),
        }
    }

    /// After sign-in, load the current week and staff and print the grid.
    async fn append_dashboard(&self, text: &mut String) {
        let board = &self.ctx.board;
        let loaded = match board.refresh_employees().await {
            Ok(_) => board.this_week(self.ctx.clock.as_ref()).await.map(|_| ()),
            Err(error) => Err(error),
        };
        let body = loaded.and_then(|()| self.grid());
        text.push('\n');
        match body {
            Ok(grid) => text.push_str(&grid),
            Err(error) => text.push_str(&format!("Could not load the rota: {error}")),
        }
    }

    fn grid(&self) -> Result<String, Error> {
        let board = &self.ctx.board;
        let week = board.visible_week()?;
        let employees = board.employees()?;
        let rota = board.rota()?;
        let selected = board.selected()?.map(|employee| employee.id());
        Ok(render_grid(week, &employees, &rota, selected)
            .trim_end()
            .to_owned())
    }

    fn employee_at(&self, row: usize) -> Result<Employee, Error> {
        let employees = self.ctx.board.employees()?;
        row.checked_sub(1)
            .and_then(|index| employees.get(index))
            .cloned()
            .ok_or_else(|| {
                Error::not_found(format!(
                    "No employee in row {row}. Run `employees` to list them."
                ))
            })
    }

    fn require_selection(&self) -> Result<Employee, Error> {
        self.ctx
            .board
            .selected()?
            .ok_or_else(|| Error::invalid_request("Select an employee first (`select <row>`)."))
    }

    fn resolve_day(&self, day: DayRef) -> Result<chrono::NaiveDate, Error> {
        let week = self.ctx.board.visible_week()?;
        day.resolve(week).map_err(Error::invalid_request)
    }

    async fn sign_out_on_exit(&self) {
        if self.ctx.session.is_signed_in() {
            debug!("signing out before exit");
            self.ctx.session.sign_out().await;
        }
    }
}

fn requires_session(command: &ShellCommand) -> bool {
    !matches!(
        command,
        ShellCommand::Login { .. }
            | ShellCommand::Register { .. }
            | ShellCommand::Whoami
            | ShellCommand::Help
            | ShellCommand::Quit
            | ShellCommand::Stay
    )
}

fn describe_error(error: &Error) -> String {
    debug!(code = %error.code(), error = %error, "command failed");
    if error.code().is_retryable() {
        format!("Error: {error} Try again shortly.")
    } else {
        format!("Error: {error}")
    }
}

/// Text printed for an idle event.
pub fn describe_idle_event(event: IdleEvent) -> String {
    match event {
        IdleEvent::WarningStarted { remaining_seconds }
        | IdleEvent::Countdown { remaining_seconds } => render_countdown(remaining_seconds),
        IdleEvent::Expired => "Signed out after inactivity.".to_owned(),
    }
}

async fn write_text<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> io::Result<()> {
    output.write_all(text.as_bytes()).await?;
    output.flush().await
}

async fn write_block<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> io::Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    write_text(output, text).await?;
    write_text(output, "\n").await
}

#[cfg(test)]
mod tests;

//! Plain-text rendering for the terminal dashboard.

use std::fmt::Write as _;

use crate::domain::{
    Employee, EmployeeId, Manager, Shift, VisibleWeek, WeekRota, break_label,
    contracted_hours_label, countdown_label, day_label, is_weekend, minutes_to_hh_mm,
};

const NAME_WIDTH: usize = 24;
const CELL_WIDTH: usize = 13;
const EMPTY_CELL: &str = "-";

/// Render the visible week as a grid: one row per employee, one column per
/// day, with contracted and weekly paid totals.
///
/// Weekend columns are marked with `*`; the selected row with `>`.
pub fn render_grid(
    week: VisibleWeek,
    employees: &[Employee],
    rota: &WeekRota,
    selected: Option<EmployeeId>,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Week of {}", week.heading());

    let mut header = format!("{:<4}{:<NAME_WIDTH$}{:>8}{:>8}", "", "Employee", "Contract", "Total");
    for day in week.days() {
        let marker = if is_weekend(day) { "*" } else { "" };
        let _ = write!(header, "  {:<CELL_WIDTH$}", format!("{}{marker}", day_label(day)));
    }
    out.push_str(header.trim_end());
    out.push('\n');

    if employees.is_empty() {
        out.push_str("No employees yet. Use `add-employee` to create one.\n");
        return out;
    }

    for (index, employee) in employees.iter().enumerate() {
        let pointer = if selected == Some(employee.id()) { '>' } else { ' ' };
        let mut times = format!(
            "{pointer}{:<3}{:<NAME_WIDTH$}{:>8}{:>8}",
            index + 1,
            truncate(&row_label(employee), NAME_WIDTH - 1),
            minutes_to_hh_mm(employee.contracted_minutes()),
            minutes_to_hh_mm(rota.paid_minutes_in(employee.id(), week)),
        );
        let mut breaks = format!("{:<4}{:<NAME_WIDTH$}{:>16}", "", "", "");
        for day in week.days() {
            let shift = rota.shift(employee.id(), day).filter(|shift| shift.is_scheduled());
            let (time_cell, break_cell) = shift.map_or_else(
                || (EMPTY_CELL.to_owned(), String::new()),
                |shift| (time_range(shift), compact_break(shift.break_minutes())),
            );
            let _ = write!(times, "  {time_cell:<CELL_WIDTH$}");
            let _ = write!(breaks, "  {break_cell:<CELL_WIDTH$}");
        }
        out.push_str(times.trim_end());
        out.push('\n');
        let breaks = breaks.trim_end();
        if !breaks.is_empty() {
            out.push_str(breaks);
            out.push('\n');
        }
    }
    out
}

fn row_label(employee: &Employee) -> String {
    if employee.is_active() {
        employee.label()
    } else {
        format!("{} (off)", employee.label())
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_owned();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('~');
    cut
}

fn time_range(shift: &Shift) -> String {
    match (shift.start(), shift.end()) {
        (Some(start), Some(end)) => format!("{start}-{end}"),
        _ => EMPTY_CELL.to_owned(),
    }
}

/// Grid cells are narrow; drop the `BREAK = ` prefix.
fn compact_break(minutes: u32) -> String {
    let label = break_label(minutes);
    match label.strip_prefix("BREAK = ") {
        Some(rest) => format!("brk {rest}"),
        None => label,
    }
}

/// Numbered employee list with contract and status.
pub fn render_employees(employees: &[Employee], selected: Option<EmployeeId>) -> String {
    if employees.is_empty() {
        return "No employees yet.\n".to_owned();
    }
    let mut out = String::new();
    for (index, employee) in employees.iter().enumerate() {
        let pointer = if selected == Some(employee.id()) { '>' } else { ' ' };
        let status = if employee.is_active() { "active" } else { "inactive" };
        let _ = writeln!(
            out,
            "{pointer}{:<3}{:<NAME_WIDTH$}{:<16}{status}",
            index + 1,
            employee.label(),
            contracted_hours_label(employee.contracted_minutes()),
        );
    }
    out
}

/// Greeting for the signed-in manager.
pub fn render_whoami(manager: &Manager) -> String {
    format!("Signed in as {} <{}>", manager.display_name(), manager.email())
}

/// Idle warning line.
pub fn render_countdown(remaining_seconds: u64) -> String {
    format!(
        "Still there? Signing out in {}. Type `stay` to continue.",
        countdown_label(remaining_seconds)
    )
}

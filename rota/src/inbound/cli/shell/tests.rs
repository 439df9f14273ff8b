//! Tests for the interactive shell.

use chrono::{NaiveDate, TimeDelta, TimeZone, Utc};
use rstest::{fixture, rstest};
use tokio::io::BufReader;

use super::*;
use crate::domain::ports::{EmployeeRepositoryError, ShiftRecord};
use crate::domain::{
    EmployeeId, IdleConfig, Manager, RotaBoardPorts, SessionTerminator, Shift, UserId,
};
use crate::test_support::{
    InMemoryEmployeeRepository, InMemoryShiftRepository, MutableClock, StaticAuthGateway,
};

struct Harness {
    shell: Shell,
    clock: Arc<MutableClock>,
    manager: Manager,
    employees: Arc<InMemoryEmployeeRepository>,
    shifts: Arc<InMemoryShiftRepository>,
    gateway: Arc<StaticAuthGateway>,
    idle: Arc<IdleSupervisor>,
    idle_events: mpsc::UnboundedReceiver<IdleEvent>,
}

#[fixture]
fn harness() -> Harness {
    let now = Utc
        .with_ymd_and_hms(2026, 2, 11, 12, 0, 0)
        .single()
        .expect("valid time");
    let clock = Arc::new(MutableClock::new(now));
    let manager = Manager::new(
        UserId::random(),
        "manager@example.com",
        Some("Morgan".to_owned()),
        None,
    );
    let gateway = Arc::new(StaticAuthGateway::new(
        manager.clone(),
        now + TimeDelta::days(30),
    ));
    let session = Arc::new(SessionManager::new(gateway.clone(), clock.clone()));
    let employees = Arc::new(InMemoryEmployeeRepository::default());
    let shifts = Arc::new(InMemoryShiftRepository::default());
    let board = Arc::new(RotaBoard::new(
        RotaBoardPorts::new(employees.clone(), shifts.clone()),
        session.clone(),
        clock.as_ref(),
    ));
    let terminator: Arc<dyn SessionTerminator> = session.clone();
    let (idle, idle_events) = IdleSupervisor::new(IdleConfig::default(), clock.clone(), terminator);
    let shell = Shell::new(ShellContext {
        session,
        board,
        idle: idle.clone(),
        clock: clock.clone(),
    });
    Harness {
        shell,
        clock,
        manager,
        employees,
        shifts,
        gateway,
        idle,
        idle_events,
    }
}

fn seed(h: &Harness, first: &str, last: &str) -> EmployeeId {
    let employee = Employee::new(EmployeeId::random(), first, last, 2340, true);
    let id = employee.id();
    h.employees.seed(h.manager.id(), employee);
    id
}

async fn say(h: &Harness, line: &str) -> String {
    let (flow, text) = h.shell.handle_line(line).await;
    assert_eq!(flow, Flow::Continue, "`{line}` should not end the shell");
    text
}

#[rstest]
#[tokio::test]
async fn login_prints_greeting_and_current_grid(harness: Harness) {
    seed(&harness, "Aarav", "Patel");
    let text = say(&harness, "login manager@example.com password").await;
    assert!(text.starts_with("Welcome, MORGAN."));
    assert!(text.contains("Week of Sunday 08th February 2026"));
    assert!(text.contains("Aarav Patel"));
}

#[rstest]
#[case::show("show")]
#[case::employees("employees")]
#[case::shift("shift 1 mon 09:00 17:00")]
#[tokio::test]
async fn data_commands_require_a_session(harness: Harness, #[case] line: &str) {
    assert_eq!(say(&harness, line).await, SIGNED_OUT);
}

#[rstest]
#[tokio::test]
async fn invalid_login_is_rejected_before_any_call(harness: Harness) {
    let text = say(&harness, "login \"  \" password").await;
    assert_eq!(text, "Error: email must not be empty");
    assert!(!harness.shell.ctx.session.is_signed_in());
}

#[rstest]
#[tokio::test]
async fn shift_command_saves_and_reports_paid_time(harness: Harness) {
    let id = seed(&harness, "Aarav", "Patel");
    say(&harness, "login manager@example.com password").await;

    let text = say(&harness, "shift 1 mon 900 1730 30").await;
    assert_eq!(
        text,
        "Aarav Patel on Mon 09 Feb: 09:00-17:30, BREAK = 30m, paid 08:00."
    );
    let monday = NaiveDate::from_ymd_opt(2026, 2, 9).expect("valid date");
    let stored = harness.shifts.stored(id, monday).expect("shift persisted");
    assert_eq!(stored.shift.paid_minutes(), 480);

    let text = say(&harness, "clear 1 2026-02-09").await;
    assert_eq!(text, "Cleared Aarav Patel on Mon 09 Feb.");
    assert!(harness.shifts.stored(id, monday).is_none());
}

#[rstest]
#[tokio::test]
async fn invalid_shift_input_surfaces_the_validation_message(harness: Harness) {
    seed(&harness, "Aarav", "Patel");
    say(&harness, "login manager@example.com password").await;
    let text = say(&harness, "shift 1 tue 09:00 17:00 200").await;
    assert!(text.starts_with("Error: "), "unexpected output: {text}");
    assert!(text.to_lowercase().contains("break"));
}

#[rstest]
#[tokio::test]
async fn week_navigation_reloads_the_grid(harness: Harness) {
    let id = seed(&harness, "Aarav", "Patel");
    harness.shifts.seed(
        harness.manager.id(),
        ShiftRecord {
            employee_id: id,
            day: NaiveDate::from_ymd_opt(2026, 2, 16).expect("valid date"),
            shift: Shift::from_parts(Some("22:00"), Some("06:00"), 0),
        },
    );
    say(&harness, "login manager@example.com password").await;

    let text = say(&harness, "week next").await;
    assert!(text.contains("Week of Sunday 15th February 2026"));
    assert!(text.contains("22:00-06:00"));
    assert!(text.contains("08:00"));

    let text = say(&harness, "week").await;
    assert_eq!(text, "Week of Sunday 15th February 2026");
}

#[rstest]
#[tokio::test]
async fn employee_lifecycle_through_selection(harness: Harness) {
    seed(&harness, "Mia", "Wong");
    say(&harness, "login manager@example.com password").await;

    assert_eq!(
        say(&harness, "edit-employee --hours 20").await,
        "Error: Select an employee first (`select <row>`)."
    );
    assert_eq!(say(&harness, "select 1").await, "Selected Mia Wong.");
    assert_eq!(say(&harness, "edit-employee --hours 20").await, "Updated Mia Wong.");
    assert_eq!(say(&harness, "toggle-active").await, "Mia Wong is now inactive.");
    assert!(
        say(&harness, "delete-employee")
            .await
            .contains("delete-employee --yes")
    );
    assert_eq!(say(&harness, "delete-employee --yes").await, "Deleted Mia Wong.");
    assert_eq!(say(&harness, "employees").await, "No employees yet.");
}

#[rstest]
#[tokio::test]
async fn unknown_rows_are_reported(harness: Harness) {
    say(&harness, "login manager@example.com password").await;
    assert_eq!(
        say(&harness, "select 3").await,
        "Error: No employee in row 3. Run `employees` to list them."
    );
}

#[rstest]
#[tokio::test]
async fn warning_only_honours_stay_and_logout(harness: Harness) {
    say(&harness, "login manager@example.com password").await;
    harness.clock.advance_seconds(60);
    assert_eq!(
        harness.idle.tick().await,
        Some(IdleEvent::WarningStarted {
            remaining_seconds: 30
        })
    );

    assert_eq!(say(&harness, "show").await, WARNING_ONLY);
    assert_eq!(say(&harness, "stay").await, "Welcome back.");
    assert!(!harness.idle.is_warning());
    assert!(say(&harness, "show").await.starts_with("Week of"));
}

#[rstest]
#[tokio::test]
async fn logout_during_warning_signs_out(harness: Harness) {
    say(&harness, "login manager@example.com password").await;
    harness.clock.advance_seconds(61);
    harness.idle.tick().await;

    assert_eq!(say(&harness, "logout").await, "Signed out.");
    assert_eq!(harness.gateway.sign_out_count(), 1);
    assert_eq!(say(&harness, "show").await, SIGNED_OUT);
}

#[rstest]
#[tokio::test]
async fn logout_drops_the_previous_grid(harness: Harness) {
    seed(&harness, "Aarav", "Patel");
    assert!(
        say(&harness, "login manager@example.com password")
            .await
            .contains("Aarav Patel")
    );
    assert_eq!(say(&harness, "logout").await, "Signed out.");

    harness
        .employees
        .fail_next(EmployeeRepositoryError::connection("offline"));
    let text = say(&harness, "login manager@example.com password").await;
    assert!(text.contains("Could not load the rota"), "unexpected output: {text}");

    let grid = say(&harness, "show").await;
    assert!(!grid.contains("Aarav Patel"), "stale grid: {grid}");
    assert!(grid.contains("No employees yet"));
}

#[rstest]
#[tokio::test]
async fn scripted_session_runs_to_quit(harness: Harness) {
    let Harness {
        shell,
        gateway,
        idle_events,
        ..
    } = harness;
    let input = BufReader::new(&b"whoami\nlogin manager@example.com password\nwhoami\nquit\nshow\n"[..]);
    let mut output = Vec::new();

    shell
        .run(input, &mut output, idle_events)
        .await
        .expect("shell runs");

    let text = String::from_utf8(output).expect("utf-8 output");
    assert!(text.contains("Not signed in."));
    assert!(text.contains("Signed in as MORGAN <manager@example.com>"));
    assert!(text.trim_end().ends_with("Bye."));
    assert_eq!(gateway.sign_out_count(), 1);
}

#[rstest]
#[case(IdleEvent::WarningStarted { remaining_seconds: 30 }, "Still there? Signing out in 0:30. Type `stay` to continue.")]
#[case(IdleEvent::Countdown { remaining_seconds: 9 }, "Still there? Signing out in 0:09. Type `stay` to continue.")]
#[case(IdleEvent::Expired, "Signed out after inactivity.")]
fn idle_events_are_described(#[case] event: IdleEvent, #[case] expected: &str) {
    assert_eq!(describe_idle_event(event), expected);
}

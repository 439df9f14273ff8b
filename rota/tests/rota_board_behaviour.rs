//! Behavioural tests for planning a week through the rota board.
use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use rota::domain::ports::{EmployeeRepositoryError, ShiftRecord};
use rota::domain::{
    Employee, EmployeeForm, EmployeeId, ErrorCode, Manager, RotaBoard, RotaBoardPorts, Shift,
    ShiftForm, ShiftSave, UserId, VisibleWeek, WeekLoad,
};
use rota::test_support::{
    InMemoryEmployeeRepository, InMemoryShiftRepository, MutableClock, signed_in_session,
};
use rstest::{fixture, rstest};

fn date(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, m, d).expect("valid date")
}

#[fixture]
fn clock() -> Arc<MutableClock> {
    let now = Utc
        .with_ymd_and_hms(2026, 2, 11, 9, 30, 0)
        .single()
        .expect("valid time");
    Arc::new(MutableClock::new(now))
}

struct World {
    board: RotaBoard,
    manager: Manager,
    employees: Arc<InMemoryEmployeeRepository>,
    shifts: Arc<InMemoryShiftRepository>,
}

async fn world(clock: Arc<MutableClock>) -> World {
    let employees = Arc::new(InMemoryEmployeeRepository::default());
    let shifts = Arc::new(InMemoryShiftRepository::default());
    let (session, manager) = signed_in_session(clock.clone()).await;
    let board = RotaBoard::new(
        RotaBoardPorts::new(employees.clone(), shifts.clone()),
        session,
        clock.as_ref(),
    );
    World {
        board,
        manager,
        employees,
        shifts,
    }
}

#[rstest]
#[tokio::test]
async fn manager_plans_a_week_and_sees_paid_totals(clock: Arc<MutableClock>) {
    let w = world(clock).await;
    w.board
        .add_employee(&EmployeeForm::new("Aarav", "Patel", "39.5"))
        .await
        .expect("employee added");
    let employees = w.board.employees().expect("employees cached");
    let aarav = employees.first().expect("one employee").id();
    assert_eq!(
        employees.first().map(Employee::contracted_minutes),
        Some(2370)
    );

    let day_shift = w
        .board
        .save_shift(aarav, date(2, 9), &ShiftForm::new("900", "17:30", "30"))
        .await
        .expect("day shift saved");
    let night_shift = w
        .board
        .save_shift(aarav, date(2, 13), &ShiftForm::new("22:00", "06:00", ""))
        .await
        .expect("night shift saved");

    assert!(matches!(day_shift, ShiftSave::Saved(shift) if shift.paid_minutes() == 480));
    assert!(matches!(night_shift, ShiftSave::Saved(shift) if shift.paid_minutes() == 480));
    assert_eq!(w.board.weekly_total_minutes(aarav), Ok(960));
    assert!(w.shifts.stored(aarav, date(2, 13)).is_some());
}

#[rstest]
#[tokio::test]
async fn shifts_outside_the_visible_week_do_not_count(clock: Arc<MutableClock>) {
    let w = world(clock).await;
    let id = EmployeeId::random();
    w.employees
        .seed(w.manager.id(), Employee::new(id, "Mia", "Wong", 960, true));
    for day in [date(2, 7), date(2, 8), date(2, 14), date(2, 15)] {
        w.shifts.seed(
            w.manager.id(),
            ShiftRecord {
                employee_id: id,
                day,
                shift: Shift::from_parts(Some("10:00"), Some("12:00"), 0),
            },
        );
    }
    w.board.refresh_employees().await.expect("employees load");

    let load = w
        .board
        .show_week(VisibleWeek::containing(date(2, 11)))
        .await
        .expect("week loads");

    assert_eq!(load, WeekLoad::Applied { shift_count: 2 });
    assert_eq!(w.board.weekly_total_minutes(id), Ok(240));
    assert_eq!(w.shifts.range_queries().last(), Some(&(date(2, 8), date(2, 14))));
}

#[rstest]
#[tokio::test]
async fn other_owners_rows_stay_invisible(clock: Arc<MutableClock>) {
    let w = world(clock).await;
    let stranger = UserId::random();
    w.employees.seed(
        &stranger,
        Employee::new(EmployeeId::random(), "Zed", "Other", 0, true),
    );
    w.employees.seed(
        w.manager.id(),
        Employee::new(EmployeeId::random(), "Ana", "Mine", 0, true),
    );

    let employees = w.board.refresh_employees().await.expect("employees load");
    let labels: Vec<String> = employees.iter().map(Employee::label).collect();
    assert_eq!(labels, ["Ana Mine"]);
}

#[rstest]
#[tokio::test]
async fn failed_toggle_restores_the_previous_flag(clock: Arc<MutableClock>) {
    let w = world(clock).await;
    let id = EmployeeId::random();
    w.employees
        .seed(w.manager.id(), Employee::new(id, "Mia", "Wong", 960, true));
    w.board.refresh_employees().await.expect("employees load");
    w.employees
        .fail_next(EmployeeRepositoryError::connection("backend offline"));

    let err = w.board.toggle_active(id).await.expect_err("toggle fails");

    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    let cached = w.board.employees().expect("employees cached");
    assert_eq!(cached.first().map(Employee::is_active), Some(true));
    assert_eq!(w.employees.stored(id).map(|e| e.is_active()), Some(true));
}

#[rstest]
#[tokio::test]
async fn deleting_an_employee_clears_the_selection(clock: Arc<MutableClock>) {
    let w = world(clock).await;
    let id = EmployeeId::random();
    w.employees
        .seed(w.manager.id(), Employee::new(id, "Mia", "Wong", 960, true));
    w.board.refresh_employees().await.expect("employees load");
    w.board.select(id).expect("employee selectable");

    let remaining = w.board.delete_employee(id).await.expect("delete succeeds");

    assert!(remaining.is_empty());
    assert_eq!(w.board.selected(), Ok(None));
}

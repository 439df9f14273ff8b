//! Dashboard service: visible week, rota cache, employee list and selection.
//!
//! Every backend call is scoped to the signed-in manager, and cached rows
//! belong to the manager they were fetched for: a session change empties the
//! cache before anything reads it. Writes update local state only after the
//! backend accepts them, except the active toggle which applies first and
//! rolls back on failure.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;
use mockable::Clock;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::domain::ports::{
    EmployeeRepository, EmployeeRepositoryError, ShiftRecord, ShiftRepository,
    ShiftRepositoryError,
};
use crate::domain::session::SessionManager;
use crate::domain::{
    Employee, EmployeeForm, EmployeeId, Error, Shift, ShiftForm, ShiftFormOutcome, UserId,
    VisibleWeek, WeekRota, day_key,
};

/// Port bundle required by the rota board.
pub struct RotaBoardPorts {
    /// Employee persistence adapter.
    pub employees: Arc<dyn EmployeeRepository>,
    /// Shift persistence adapter.
    pub shifts: Arc<dyn ShiftRepository>,
}

impl RotaBoardPorts {
    pub fn new(employees: Arc<dyn EmployeeRepository>, shifts: Arc<dyn ShiftRepository>) -> Self {
        Self { employees, shifts }
    }
}

/// Result of a week fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekLoad {
    /// The fetched rows now back the cache.
    Applied { shift_count: usize },
    /// A newer week was requested while this one was in flight.
    Superseded,
}

/// Result of saving a shift editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftSave {
    Saved(Shift),
    /// The editor was left blank; nothing was written.
    Untouched,
}

struct BoardState {
    owner: Option<UserId>,
    week: VisibleWeek,
    rota: Arc<WeekRota>,
    employees: Arc<Vec<Employee>>,
    selected: Option<EmployeeId>,
}

impl BoardState {
    fn clear_owned(&mut self) {
        self.rota = Arc::new(WeekRota::empty(self.week));
        self.employees = Arc::new(Vec::new());
        self.selected = None;
    }

    /// Whether a write for `owner` on `day` may still touch the cache.
    fn accepts_write(&self, owner: &UserId, day: NaiveDate) -> bool {
        self.owner.as_ref() == Some(owner)
            && self.week.contains(day)
            && self.rota.week().contains(day)
    }
}

/// Domain service behind the dashboard.
pub struct RotaBoard {
    employees_repo: Arc<dyn EmployeeRepository>,
    shifts_repo: Arc<dyn ShiftRepository>,
    session: Arc<SessionManager>,
    generation: AtomicU64,
    state: Mutex<BoardState>,
}

impl RotaBoard {
    /// Start on the current week with an empty cache.
    pub fn new(ports: RotaBoardPorts, session: Arc<SessionManager>, clock: &dyn Clock) -> Self {
        let week = VisibleWeek::current(clock);
        Self {
            employees_repo: ports.employees,
            shifts_repo: ports.shifts,
            session,
            generation: AtomicU64::new(0),
            state: Mutex::new(BoardState {
                owner: None,
                week,
                rota: Arc::new(WeekRota::empty(week)),
                employees: Arc::new(Vec::new()),
                selected: None,
            }),
        }
    }

    pub fn visible_week(&self) -> Result<VisibleWeek, Error> {
        Ok(self.lock_state()?.week)
    }

    /// Snapshot of the cache. Never observed half-updated.
    pub fn rota(&self) -> Result<Arc<WeekRota>, Error> {
        Ok(Arc::clone(&self.lock_state()?.rota))
    }

    /// Snapshot of the employee list in display order.
    pub fn employees(&self) -> Result<Arc<Vec<Employee>>, Error> {
        Ok(Arc::clone(&self.lock_state()?.employees))
    }

    /// Paid minutes for `employee` across the visible week.
    pub fn weekly_total_minutes(&self, employee: EmployeeId) -> Result<u32, Error> {
        let state = self.lock_state()?;
        Ok(state.rota.paid_minutes_in(employee, state.week))
    }

    /// Make `week` visible and hydrate the cache for it.
    ///
    /// The week changes immediately. A fetch that finishes after a newer one
    /// was requested is discarded. A failed fetch keeps the previous cache.
    pub async fn show_week(&self, week: VisibleWeek) -> Result<WeekLoad, Error> {
        self.lock_state()?.week = week;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let owner = self.owner().await?;

        let fetched = self
            .shifts_repo
            .list_in_range(&owner, week.start(), week.end())
            .await;
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(week = %week.start(), "discarding superseded week fetch");
            return Ok(WeekLoad::Superseded);
        }
        let records = fetched.map_err(|error| {
            warn!(week = %week.start(), error = %error, "failed to fetch shifts");
            map_shift_error(error)
        })?;

        let rota = WeekRota::from_records(week, records);
        let shift_count = rota.len();
        let mut state = self.lock_state()?;
        if self.generation.load(Ordering::SeqCst) != generation {
            return Ok(WeekLoad::Superseded);
        }
        state.rota = Arc::new(rota);
        debug!(week = %week.start(), shift_count, "week rota hydrated");
        Ok(WeekLoad::Applied { shift_count })
    }

    pub async fn previous_week(&self) -> Result<WeekLoad, Error> {
        let week = self.visible_week()?.previous();
        self.show_week(week).await
    }

    pub async fn next_week(&self) -> Result<WeekLoad, Error> {
        let week = self.visible_week()?.next();
        self.show_week(week).await
    }

    pub async fn this_week(&self, clock: &dyn Clock) -> Result<WeekLoad, Error> {
        self.show_week(VisibleWeek::current(clock)).await
    }

    /// Validate and persist a shift editor for (employee, day).
    ///
    /// On failure the cache is unchanged and the caller keeps its input.
    pub async fn save_shift(
        &self,
        employee_id: EmployeeId,
        day: NaiveDate,
        form: &ShiftForm,
    ) -> Result<ShiftSave, Error> {
        let outcome = form.validate().map_err(|err| {
            Error::invalid_request(err.to_string()).with_details(json!({
                "field": "shift",
                "employeeId": employee_id.to_string(),
                "shiftDate": day_key(day),
            }))
        })?;
        let ShiftFormOutcome::Ready(shift) = outcome else {
            return Ok(ShiftSave::Untouched);
        };

        let owner = self.owner().await?;
        let record = ShiftRecord {
            employee_id,
            day,
            shift,
        };
        self.shifts_repo
            .upsert(&owner, &record)
            .await
            .map_err(|error| {
                warn!(
                    employee_id = %employee_id,
                    shift_date = %day_key(day),
                    error = %error,
                    "failed to save shift"
                );
                map_shift_error(error)
            })?;

        let mut state = self.lock_state()?;
        if state.accepts_write(&owner, day) {
            state.rota = Arc::new(state.rota.with_shift(employee_id, day, shift));
        } else {
            debug!(shift_date = %day_key(day), "visible week moved; leaving saved shift to the next fetch");
        }
        info!(employee_id = %employee_id, shift_date = %day_key(day), "shift saved");
        Ok(ShiftSave::Saved(shift))
    }

    /// Delete the shift for (employee, day).
    pub async fn clear_shift(&self, employee_id: EmployeeId, day: NaiveDate) -> Result<(), Error> {
        let owner = self.owner().await?;
        self.shifts_repo
            .delete(&owner, employee_id, day)
            .await
            .map_err(|error| {
                warn!(
                    employee_id = %employee_id,
                    shift_date = %day_key(day),
                    error = %error,
                    "failed to clear shift"
                );
                map_shift_error(error)
            })?;

        let mut state = self.lock_state()?;
        if state.accepts_write(&owner, day) {
            state.rota = Arc::new(state.rota.without_shift(employee_id, day));
        } else {
            debug!(shift_date = %day_key(day), "visible week moved; leaving cleared shift to the next fetch");
        }
        info!(employee_id = %employee_id, shift_date = %day_key(day), "shift cleared");
        Ok(())
    }

    /// Reload employees, sorted by label. Clears a selection that no longer
    /// resolves.
    pub async fn refresh_employees(&self) -> Result<Arc<Vec<Employee>>, Error> {
        let owner = self.owner().await?;
        let mut listed = self
            .employees_repo
            .list_for_owner(&owner)
            .await
            .map_err(|error| {
                warn!(error = %error, "failed to fetch employees");
                map_employee_error(error)
            })?;
        listed.sort_by(Employee::cmp_by_label);
        let listed = Arc::new(listed);

        let mut state = self.lock_state()?;
        if state.owner.as_ref() != Some(&owner) {
            debug!("session changed during employee fetch; discarding result");
            return Ok(Arc::clone(&state.employees));
        }
        let vanished = state
            .selected
            .filter(|selected| !listed.iter().any(|employee| employee.id() == *selected));
        if let Some(selected) = vanished {
            debug!(employee_id = %selected, "selected employee vanished; clearing selection");
            state.selected = None;
        }
        state.employees = Arc::clone(&listed);
        Ok(listed)
    }

    /// Create an employee from editor input, then refresh the list.
    pub async fn add_employee(&self, form: &EmployeeForm) -> Result<Arc<Vec<Employee>>, Error> {
        let details = form
            .validate()
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        let owner = self.owner().await?;
        self.employees_repo
            .insert(&owner, &details)
            .await
            .map_err(|error| {
                warn!(error = %error, "failed to add employee");
                map_employee_error(error)
            })?;
        info!(first_name = details.first_name(), "employee added");
        self.refresh_employees().await
    }

    /// Update an employee from editor input, then refresh the list.
    pub async fn edit_employee(
        &self,
        employee_id: EmployeeId,
        form: &EmployeeForm,
    ) -> Result<Arc<Vec<Employee>>, Error> {
        let details = form
            .validate()
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        let owner = self.owner().await?;
        self.employees_repo
            .update(&owner, employee_id, &details)
            .await
            .map_err(|error| {
                warn!(employee_id = %employee_id, error = %error, "failed to update employee");
                map_employee_error(error)
            })?;
        info!(employee_id = %employee_id, "employee updated");
        self.refresh_employees().await
    }

    /// Remove an employee, drop the selection if it pointed there, then
    /// refresh the list.
    pub async fn delete_employee(&self, employee_id: EmployeeId) -> Result<Arc<Vec<Employee>>, Error> {
        let owner = self.owner().await?;
        self.employees_repo
            .delete(&owner, employee_id)
            .await
            .map_err(|error| {
                warn!(employee_id = %employee_id, error = %error, "failed to delete employee");
                map_employee_error(error)
            })?;
        {
            let mut state = self.lock_state()?;
            if state.selected == Some(employee_id) {
                state.selected = None;
            }
        }
        info!(employee_id = %employee_id, "employee deleted");
        self.refresh_employees().await
    }

    /// Flip the active flag optimistically.
    ///
    /// Returns the new flag. The previous list is restored when the write
    /// fails.
    pub async fn toggle_active(&self, employee_id: EmployeeId) -> Result<bool, Error> {
        let (previous, active, snapshot_owner) = {
            let mut state = self.lock_state()?;
            let previous = Arc::clone(&state.employees);
            let current = previous
                .iter()
                .find(|employee| employee.id() == employee_id)
                .ok_or_else(|| not_found(employee_id))?;
            let active = !current.is_active();
            let tentative = previous
                .iter()
                .map(|employee| {
                    if employee.id() == employee_id {
                        employee.with_active(active)
                    } else {
                        employee.clone()
                    }
                })
                .collect();
            state.employees = Arc::new(tentative);
            (previous, active, state.owner.clone())
        };

        let written = match self.owner().await {
            Ok(owner) => self
                .employees_repo
                .set_active(&owner, employee_id, active)
                .await
                .map_err(map_employee_error),
            Err(error) => Err(error),
        };
        if let Err(error) = written {
            warn!(employee_id = %employee_id, error = %error, "failed to toggle employee; rolling back");
            let mut state = self.lock_state()?;
            if state.owner == snapshot_owner {
                state.employees = previous;
            }
            return Err(error);
        }
        info!(employee_id = %employee_id, active, "employee active flag changed");
        Ok(active)
    }

    /// Select an employee as the edit/delete target.
    pub fn select(&self, employee_id: EmployeeId) -> Result<Employee, Error> {
        let mut state = self.lock_state()?;
        let employee = state
            .employees
            .iter()
            .find(|employee| employee.id() == employee_id)
            .cloned()
            .ok_or_else(|| not_found(employee_id))?;
        state.selected = Some(employee_id);
        Ok(employee)
    }

    /// Drop cached employees, shifts and the selection, and discard any
    /// fetch still in flight. The visible week is kept.
    pub fn reset(&self) -> Result<(), Error> {
        let mut state = self.state.lock().map_err(|_| poisoned())?;
        state.clear_owned();
        state.owner = self.session.owner().ok();
        self.generation.fetch_add(1, Ordering::SeqCst);
        debug!("rota board reset");
        Ok(())
    }

    /// The selected employee, if it still resolves.
    pub fn selected(&self) -> Result<Option<Employee>, Error> {
        let state = self.lock_state()?;
        Ok(state.selected.and_then(|id| {
            state
                .employees
                .iter()
                .find(|employee| employee.id() == id)
                .cloned()
        }))
    }

    async fn owner(&self) -> Result<UserId, Error> {
        let session = self.session.refresh_if_needed().await?;
        Ok(session.manager().id().clone())
    }

    /// Lock the state, first emptying it if the signed-in manager is not the
    /// one it was filled for.
    fn lock_state(&self) -> Result<MutexGuard<'_, BoardState>, Error> {
        let mut state = self.state.lock().map_err(|_| poisoned())?;
        let owner = self.session.owner().ok();
        if state.owner != owner {
            if state.owner.is_some() {
                debug!("session changed; dropping cached rota data");
            }
            state.clear_owned();
            state.owner = owner;
            self.generation.fetch_add(1, Ordering::SeqCst);
        }
        Ok(state)
    }
}

fn poisoned() -> Error {
    Error::internal("rota board state poisoned")
}

fn not_found(employee_id: EmployeeId) -> Error {
    Error::not_found(format!("employee {employee_id} not found"))
        .with_details(json!({ "employeeId": employee_id.to_string() }))
}

fn map_employee_error(error: EmployeeRepositoryError) -> Error {
    match error {
        EmployeeRepositoryError::Unauthorized { message } => Error::unauthorized(message),
        EmployeeRepositoryError::Connection { message } => Error::service_unavailable(message),
        EmployeeRepositoryError::Query { message } => Error::internal(message),
    }
}

fn map_shift_error(error: ShiftRepositoryError) -> Error {
    match error {
        ShiftRepositoryError::Unauthorized { message } => Error::unauthorized(message),
        ShiftRepositoryError::Connection { message } => Error::service_unavailable(message),
        ShiftRepositoryError::Query { message } => Error::internal(message),
    }
}

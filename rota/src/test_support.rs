//! Test utilities for the rota crate.
//!
//! Shared doubles for unit tests (in `src/`) and integration tests (in
//! `tests/`). Compiled for tests and behind the `test-support` feature.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, TimeDelta, Utc};
use mockable::Clock;

use crate::domain::ports::{
    AuthGateway, AuthGatewayError, EmployeeRepository, EmployeeRepositoryError, ShiftRecord,
    ShiftRepository, ShiftRepositoryError,
};
use crate::domain::{
    Employee, EmployeeDetails, EmployeeId, LoginCredentials, Manager, Registration, SecretToken,
    Session, SessionManager, SignUpOutcome, UserId,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(_) => panic!("test double mutex poisoned"),
    }
}

/// Clock whose time only moves when a test says so.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, delta: Duration) {
        let delta = match TimeDelta::from_std(delta) {
            Ok(delta) => delta,
            Err(error) => {
                panic!("failed to convert Duration to TimeDelta: {error}; delta={delta:?}")
            }
        };
        *lock(&self.0) += delta;
    }

    pub fn advance_seconds(&self, seconds: i64) {
        *lock(&self.0) += TimeDelta::seconds(seconds);
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *lock(&self.0) = now;
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *lock(&self.0)
    }
}

/// Auth double that signs anyone in as one fixed manager.
pub struct StaticAuthGateway {
    manager: Manager,
    expires_at: DateTime<Utc>,
    sign_outs: Mutex<u32>,
    fail_sign_out: bool,
}

impl StaticAuthGateway {
    pub fn new(manager: Manager, expires_at: DateTime<Utc>) -> Self {
        Self {
            manager,
            expires_at,
            sign_outs: Mutex::new(0),
            fail_sign_out: false,
        }
    }

    /// Make remote sign-out fail, as an unreachable service would.
    #[must_use]
    pub fn failing_sign_out(mut self) -> Self {
        self.fail_sign_out = true;
        self
    }

    pub fn manager(&self) -> &Manager {
        &self.manager
    }

    pub fn sign_out_count(&self) -> u32 {
        *lock(&self.sign_outs)
    }

    fn session(&self) -> Session {
        Session::new(
            self.manager.clone(),
            SecretToken::new("static-access"),
            SecretToken::new("static-refresh"),
            self.expires_at,
        )
    }
}

#[async_trait]
impl AuthGateway for StaticAuthGateway {
    async fn sign_in(&self, _credentials: &LoginCredentials) -> Result<Session, AuthGatewayError> {
        Ok(self.session())
    }

    async fn sign_up(
        &self,
        _registration: &Registration,
    ) -> Result<SignUpOutcome, AuthGatewayError> {
        Ok(SignUpOutcome::SignedIn(self.session()))
    }

    async fn refresh(&self, _refresh_token: &SecretToken) -> Result<Session, AuthGatewayError> {
        Ok(self.session())
    }

    async fn sign_out(&self, _access_token: &SecretToken) -> Result<(), AuthGatewayError> {
        *lock(&self.sign_outs) += 1;
        if self.fail_sign_out {
            return Err(AuthGatewayError::transport("sign-out unavailable"));
        }
        Ok(())
    }
}

/// A session manager already signed in through a [`StaticAuthGateway`]
/// whose tokens outlive any test.
pub async fn signed_in_session(clock: Arc<dyn Clock>) -> (Arc<SessionManager>, Manager) {
    let manager = Manager::new(
        UserId::random(),
        "manager@example.com",
        Some("Morgan".to_owned()),
        Some("Reyes".to_owned()),
    );
    let expires_at = clock.utc() + TimeDelta::days(365);
    let gateway = Arc::new(StaticAuthGateway::new(manager.clone(), expires_at));
    let session = Arc::new(SessionManager::new(gateway, clock));
    let credentials = match LoginCredentials::try_from_parts("manager@example.com", "password") {
        Ok(credentials) => credentials,
        Err(error) => panic!("fixture credentials invalid: {error}"),
    };
    if let Err(error) = session.sign_in(&credentials).await {
        panic!("static sign-in failed: {error}");
    }
    (session, manager)
}

type EmployeeRows = BTreeMap<EmployeeId, (UserId, Employee)>;

/// Employee store that honours owner scoping and can fail on demand.
#[derive(Default)]
pub struct InMemoryEmployeeRepository {
    rows: Mutex<EmployeeRows>,
    fail_next: Mutex<Option<EmployeeRepositoryError>>,
    writes: Mutex<u32>,
}

impl InMemoryEmployeeRepository {
    /// Seed a stored employee for `owner`.
    pub fn seed(&self, owner: &UserId, employee: Employee) {
        lock(&self.rows).insert(employee.id(), (owner.clone(), employee));
    }

    /// Fail the next call with `error`.
    pub fn fail_next(&self, error: EmployeeRepositoryError) {
        *lock(&self.fail_next) = Some(error);
    }

    /// Number of accepted writes.
    pub fn write_count(&self) -> u32 {
        *lock(&self.writes)
    }

    pub fn stored(&self, id: EmployeeId) -> Option<Employee> {
        lock(&self.rows).get(&id).map(|(_, employee)| employee.clone())
    }

    fn check(&self) -> Result<(), EmployeeRepositoryError> {
        lock(&self.fail_next).take().map_or(Ok(()), Err)
    }

    fn record_write(&self) {
        *lock(&self.writes) += 1;
    }

    fn owned_mut<R>(
        &self,
        owner: &UserId,
        id: EmployeeId,
        f: impl FnOnce(&mut Employee) -> R,
    ) -> Result<R, EmployeeRepositoryError> {
        let mut rows = lock(&self.rows);
        match rows.get_mut(&id) {
            Some((row_owner, employee)) if row_owner == owner => Ok(f(employee)),
            _ => Err(EmployeeRepositoryError::query(format!("no employee {id}"))),
        }
    }
}

#[async_trait]
impl EmployeeRepository for InMemoryEmployeeRepository {
    async fn list_for_owner(
        &self,
        owner: &UserId,
    ) -> Result<Vec<Employee>, EmployeeRepositoryError> {
        self.check()?;
        let mut listed: Vec<Employee> = lock(&self.rows)
            .values()
            .filter(|(row_owner, _)| row_owner == owner)
            .map(|(_, employee)| employee.clone())
            .collect();
        listed.sort_by(|a, b| a.first_name().cmp(b.first_name()));
        Ok(listed)
    }

    async fn insert(
        &self,
        owner: &UserId,
        details: &EmployeeDetails,
    ) -> Result<(), EmployeeRepositoryError> {
        self.check()?;
        let employee = Employee::new(
            EmployeeId::random(),
            details.first_name(),
            details.last_name(),
            details.contracted_minutes(),
            true,
        );
        self.seed(owner, employee);
        self.record_write();
        Ok(())
    }

    async fn update(
        &self,
        owner: &UserId,
        id: EmployeeId,
        details: &EmployeeDetails,
    ) -> Result<(), EmployeeRepositoryError> {
        self.check()?;
        self.owned_mut(owner, id, |employee| {
            *employee = Employee::new(
                id,
                details.first_name(),
                details.last_name(),
                details.contracted_minutes(),
                employee.is_active(),
            );
        })?;
        self.record_write();
        Ok(())
    }

    async fn set_active(
        &self,
        owner: &UserId,
        id: EmployeeId,
        active: bool,
    ) -> Result<(), EmployeeRepositoryError> {
        self.check()?;
        self.owned_mut(owner, id, |employee| *employee = employee.with_active(active))?;
        self.record_write();
        Ok(())
    }

    async fn delete(&self, owner: &UserId, id: EmployeeId) -> Result<(), EmployeeRepositoryError> {
        self.check()?;
        self.owned_mut(owner, id, |_| ())?;
        lock(&self.rows).remove(&id);
        self.record_write();
        Ok(())
    }
}

type ShiftRows = BTreeMap<(EmployeeId, NaiveDate), (UserId, ShiftRecord)>;

/// Shift store keyed on (employee, day) with owner scoping.
#[derive(Default)]
pub struct InMemoryShiftRepository {
    rows: Mutex<ShiftRows>,
    fail_next: Mutex<Option<ShiftRepositoryError>>,
    range_queries: Mutex<Vec<(NaiveDate, NaiveDate)>>,
}

impl InMemoryShiftRepository {
    pub fn seed(&self, owner: &UserId, record: ShiftRecord) {
        lock(&self.rows).insert((record.employee_id, record.day), (owner.clone(), record));
    }

    pub fn fail_next(&self, error: ShiftRepositoryError) {
        *lock(&self.fail_next) = Some(error);
    }

    pub fn stored(&self, employee_id: EmployeeId, day: NaiveDate) -> Option<ShiftRecord> {
        lock(&self.rows)
            .get(&(employee_id, day))
            .map(|(_, record)| *record)
    }

    /// Ranges requested so far, oldest first.
    pub fn range_queries(&self) -> Vec<(NaiveDate, NaiveDate)> {
        lock(&self.range_queries).clone()
    }

    fn check(&self) -> Result<(), ShiftRepositoryError> {
        lock(&self.fail_next).take().map_or(Ok(()), Err)
    }
}

#[async_trait]
impl ShiftRepository for InMemoryShiftRepository {
    async fn list_in_range(
        &self,
        owner: &UserId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ShiftRecord>, ShiftRepositoryError> {
        lock(&self.range_queries).push((from, to));
        self.check()?;
        Ok(lock(&self.rows)
            .values()
            .filter(|(row_owner, record)| {
                row_owner == owner && (from..=to).contains(&record.day)
            })
            .map(|(_, record)| *record)
            .collect())
    }

    async fn upsert(
        &self,
        owner: &UserId,
        record: &ShiftRecord,
    ) -> Result<(), ShiftRepositoryError> {
        self.check()?;
        self.seed(owner, *record);
        Ok(())
    }

    async fn delete(
        &self,
        owner: &UserId,
        employee_id: EmployeeId,
        day: NaiveDate,
    ) -> Result<(), ShiftRepositoryError> {
        self.check()?;
        let mut rows = lock(&self.rows);
        let owned = rows
            .get(&(employee_id, day))
            .is_some_and(|(row_owner, _)| row_owner == owner);
        if owned {
            rows.remove(&(employee_id, day));
        }
        Ok(())
    }
}

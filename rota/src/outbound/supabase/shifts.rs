//! PostgREST adapter for the `shifts` table.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Method;
use tokio::sync::watch;

use super::client::SupabaseClient;
use super::dto::{ShiftRowDto, ShiftUpsertDto};
use super::http::RestFailure;
use super::rest::{Postgrest, QueryParam, eq};
use crate::domain::ports::{ShiftRecord, ShiftRepository, ShiftRepositoryError};
use crate::domain::{EmployeeId, Session, UserId, day_key};

const TABLE: &str = "shifts";
const COLUMNS: &str = "employee_id,shift_date,start_time,end_time,break_minutes";
const UPSERT_PREFER: &str = "resolution=merge-duplicates,return=minimal";

/// Shift repository backed by the hosted data API.
pub struct SupabaseShiftRepository {
    rest: Postgrest,
}

impl SupabaseShiftRepository {
    pub fn new(client: Arc<SupabaseClient>, sessions: watch::Receiver<Option<Session>>) -> Self {
        Self {
            rest: Postgrest::new(client, sessions),
        }
    }
}

fn range_params(owner: &UserId, from: NaiveDate, to: NaiveDate) -> Vec<QueryParam> {
    vec![
        ("select", COLUMNS.to_owned()),
        eq("owner_id", owner),
        ("shift_date", format!("gte.{}", day_key(from))),
        ("shift_date", format!("lte.{}", day_key(to))),
    ]
}

fn delete_params(owner: &UserId, employee_id: EmployeeId, day: NaiveDate) -> Vec<QueryParam> {
    vec![
        eq("owner_id", owner),
        eq("employee_id", employee_id),
        eq("shift_date", day_key(day)),
    ]
}

fn upsert_body(owner: &UserId, record: &ShiftRecord) -> ShiftUpsertDto {
    ShiftUpsertDto {
        owner_id: owner.to_string(),
        employee_id: record.employee_id.to_string(),
        shift_date: day_key(record.day),
        start_time: record.shift.start().map(|time| time.to_string()),
        end_time: record.shift.end().map(|time| time.to_string()),
        break_minutes: record.shift.break_minutes(),
    }
}

fn decode_rows(body: &[u8]) -> Result<Vec<ShiftRecord>, RestFailure> {
    let rows: Vec<ShiftRowDto> = serde_json::from_slice(body)
        .map_err(|error| RestFailure::Query(format!("invalid shifts payload: {error}")))?;
    rows.into_iter()
        .map(|row| row.into_record().map_err(RestFailure::Query))
        .collect()
}

#[async_trait]
impl ShiftRepository for SupabaseShiftRepository {
    async fn list_in_range(
        &self,
        owner: &UserId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ShiftRecord>, ShiftRepositoryError> {
        let url = self.rest.table_url(TABLE, &range_params(owner, from, to))?;
        let body = self.rest.send::<()>(Method::GET, url, None, None).await?;
        Ok(decode_rows(&body)?)
    }

    async fn upsert(
        &self,
        owner: &UserId,
        record: &ShiftRecord,
    ) -> Result<(), ShiftRepositoryError> {
        let url = self.rest.table_url(
            TABLE,
            &[("on_conflict", "employee_id,shift_date".to_owned())],
        )?;
        let body = upsert_body(owner, record);
        self.rest
            .send(Method::POST, url, Some(&body), Some(UPSERT_PREFER))
            .await?;
        Ok(())
    }

    async fn delete(
        &self,
        owner: &UserId,
        employee_id: EmployeeId,
        day: NaiveDate,
    ) -> Result<(), ShiftRepositoryError> {
        let url = self
            .rest
            .table_url(TABLE, &delete_params(owner, employee_id, day))?;
        self.rest
            .send::<()>(Method::DELETE, url, None, Some("return=minimal"))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for shift query shapes and payloads.
    use super::*;
    use crate::domain::Shift;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, d).expect("valid date")
    }

    #[test]
    fn range_query_is_inclusive_on_both_ends() {
        let owner = UserId::random();
        let params = range_params(&owner, date(8), date(14));
        assert!(params.contains(&("shift_date", "gte.2026-02-08".to_owned())));
        assert!(params.contains(&("shift_date", "lte.2026-02-14".to_owned())));
        assert!(params.contains(&eq("owner_id", &owner)));
    }

    #[test]
    fn upsert_payload_uses_backend_formats() {
        let owner = UserId::random();
        let record = ShiftRecord {
            employee_id: EmployeeId::random(),
            day: date(9),
            shift: Shift::from_parts(Some("09:00"), Some("17:30"), 30),
        };
        let body = serde_json::to_value(upsert_body(&owner, &record)).expect("serialises");
        assert_eq!(body["shift_date"], "2026-02-09");
        assert_eq!(body["start_time"], "09:00");
        assert_eq!(body["end_time"], "17:30");
        assert_eq!(body["break_minutes"], 30);
        assert_eq!(body["owner_id"], owner.to_string());
    }

    #[test]
    fn delete_is_keyed_on_owner_employee_and_day() {
        let owner = UserId::random();
        let employee = EmployeeId::random();
        let params = delete_params(&owner, employee, date(9));
        assert_eq!(
            params,
            [
                eq("owner_id", &owner),
                eq("employee_id", employee),
                eq("shift_date", "2026-02-09"),
            ]
        );
    }

    #[test]
    fn bad_dates_fail_decoding() {
        let body = br#"[{"employee_id":"3fa85f64-5717-4562-b3fc-2c963f66afa6","shift_date":"09/02/2026"}]"#;
        assert!(matches!(decode_rows(body), Err(RestFailure::Query(_))));
    }
}

//! PostgREST adapter for the `employees` table.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use tokio::sync::watch;

use super::client::SupabaseClient;
use super::dto::{ActivePatchDto, EmployeePatchDto, EmployeeRowDto, NewEmployeeDto};
use super::http::RestFailure;
use super::rest::{Postgrest, QueryParam, eq};
use crate::domain::ports::{EmployeeRepository, EmployeeRepositoryError};
use crate::domain::{Employee, EmployeeDetails, EmployeeId, Session, UserId};

const TABLE: &str = "employees";
const RETURN_MINIMAL: &str = "return=minimal";

/// Employee repository backed by the hosted data API.
pub struct SupabaseEmployeeRepository {
    rest: Postgrest,
}

impl SupabaseEmployeeRepository {
    pub fn new(client: Arc<SupabaseClient>, sessions: watch::Receiver<Option<Session>>) -> Self {
        Self {
            rest: Postgrest::new(client, sessions),
        }
    }
}

fn list_params(owner: &UserId) -> Vec<QueryParam> {
    vec![
        ("select", "*".to_owned()),
        eq("owner_id", owner),
        ("order", "first_name.asc".to_owned()),
    ]
}

fn row_params(owner: &UserId, id: EmployeeId) -> Vec<QueryParam> {
    vec![eq("id", id), eq("owner_id", owner)]
}

fn decode_rows(body: &[u8]) -> Result<Vec<Employee>, RestFailure> {
    let rows: Vec<EmployeeRowDto> = serde_json::from_slice(body)
        .map_err(|error| RestFailure::Query(format!("invalid employees payload: {error}")))?;
    Ok(rows.into_iter().map(EmployeeRowDto::into_employee).collect())
}

#[async_trait]
impl EmployeeRepository for SupabaseEmployeeRepository {
    async fn list_for_owner(
        &self,
        owner: &UserId,
    ) -> Result<Vec<Employee>, EmployeeRepositoryError> {
        let url = self.rest.table_url(TABLE, &list_params(owner))?;
        let body = self.rest.send::<()>(Method::GET, url, None, None).await?;
        Ok(decode_rows(&body)?)
    }

    async fn insert(
        &self,
        owner: &UserId,
        details: &EmployeeDetails,
    ) -> Result<(), EmployeeRepositoryError> {
        let url = self.rest.table_url(TABLE, &[])?;
        let owner_id = owner.to_string();
        let body = NewEmployeeDto {
            owner_id: &owner_id,
            first_name: details.first_name(),
            last_name: details.last_name(),
            contracted_minutes: details.contracted_minutes(),
            is_active: true,
        };
        self.rest
            .send(Method::POST, url, Some(&body), Some(RETURN_MINIMAL))
            .await?;
        Ok(())
    }

    async fn update(
        &self,
        owner: &UserId,
        id: EmployeeId,
        details: &EmployeeDetails,
    ) -> Result<(), EmployeeRepositoryError> {
        let url = self.rest.table_url(TABLE, &row_params(owner, id))?;
        let body = EmployeePatchDto {
            first_name: details.first_name(),
            last_name: details.last_name(),
            contracted_minutes: details.contracted_minutes(),
        };
        self.rest
            .send(Method::PATCH, url, Some(&body), Some(RETURN_MINIMAL))
            .await?;
        Ok(())
    }

    async fn set_active(
        &self,
        owner: &UserId,
        id: EmployeeId,
        active: bool,
    ) -> Result<(), EmployeeRepositoryError> {
        let url = self.rest.table_url(TABLE, &row_params(owner, id))?;
        let body = ActivePatchDto { is_active: active };
        self.rest
            .send(Method::PATCH, url, Some(&body), Some(RETURN_MINIMAL))
            .await?;
        Ok(())
    }

    async fn delete(&self, owner: &UserId, id: EmployeeId) -> Result<(), EmployeeRepositoryError> {
        let url = self.rest.table_url(TABLE, &row_params(owner, id))?;
        self.rest
            .send::<()>(Method::DELETE, url, None, Some(RETURN_MINIMAL))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for employee query shapes.
    use super::*;

    #[test]
    fn list_is_owner_scoped_and_ordered() {
        let owner = UserId::new("3fa85f64-5717-4562-b3fc-2c963f66afa6").expect("valid id");
        let params = list_params(&owner);
        assert!(params.contains(&("owner_id", "eq.3fa85f64-5717-4562-b3fc-2c963f66afa6".to_owned())));
        assert!(params.contains(&("order", "first_name.asc".to_owned())));
    }

    #[test]
    fn row_filters_include_owner() {
        let owner = UserId::random();
        let id = EmployeeId::random();
        let params = row_params(&owner, id);
        assert_eq!(params, [eq("id", id), eq("owner_id", &owner)]);
    }

    #[test]
    fn rejects_malformed_rows() {
        let err = decode_rows(br#"[{"id":"nope"}]"#).expect_err("bad rows");
        assert!(matches!(err, RestFailure::Query(_)));
    }
}

//! Minimal PostgREST request plumbing shared by the data adapters.

use std::sync::Arc;

use reqwest::header::HeaderValue;
use reqwest::{Method, Url};
use serde::Serialize;
use tokio::sync::watch;

use super::client::SupabaseClient;
use super::http::RestFailure;
use crate::domain::{SecretToken, Session};

const REST_PREFIX: &str = "/rest/v1/";

/// One filter or modifier in a PostgREST query string.
pub(super) type QueryParam = (&'static str, String);

/// `column=eq.value`.
pub(super) fn eq(column: &'static str, value: impl std::fmt::Display) -> QueryParam {
    (column, format!("eq.{value}"))
}

/// Request context: the shared client plus the live session for bearer auth.
pub(super) struct Postgrest {
    client: Arc<SupabaseClient>,
    sessions: watch::Receiver<Option<Session>>,
}

impl Postgrest {
    pub(super) fn new(
        client: Arc<SupabaseClient>,
        sessions: watch::Receiver<Option<Session>>,
    ) -> Self {
        Self { client, sessions }
    }

    pub(super) fn table_url(&self, table: &str, params: &[QueryParam]) -> Result<Url, RestFailure> {
        let mut url = self
            .client
            .endpoint(&format!("{REST_PREFIX}{table}"))
            .map_err(|error| RestFailure::Query(error.to_string()))?;
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn access_token(&self) -> Result<SecretToken, RestFailure> {
        self.sessions
            .borrow()
            .as_ref()
            .map(|session| session.access_token().clone())
            .ok_or_else(|| RestFailure::Unauthorized("no active session".to_owned()))
    }

    /// Send one request and return the body of a successful response.
    ///
    /// Reads select the schema with `Accept-Profile`, writes with
    /// `Content-Profile`.
    pub(super) async fn send<B: Serialize + Sync>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        prefer: Option<&'static str>,
    ) -> Result<Vec<u8>, RestFailure> {
        let token = self.access_token()?;
        let profile_header = if method == Method::GET {
            "Accept-Profile"
        } else {
            "Content-Profile"
        };
        let schema = HeaderValue::from_str(self.client.schema())
            .map_err(|error| RestFailure::Query(format!("invalid schema name: {error}")))?;

        let mut request = self
            .client
            .request(method, url)
            .bearer_auth(token.expose())
            .header(profile_header, schema);
        if let Some(prefer) = prefer {
            request = request.header("Prefer", prefer);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|error| RestFailure::from_transport(&error))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|error| RestFailure::from_transport(&error))?;
        if !status.is_success() {
            return Err(RestFailure::from_status(status, bytes.as_ref()));
        }
        Ok(bytes.to_vec())
    }
}

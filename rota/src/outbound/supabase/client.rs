//! Process-wide Supabase connection shared by the auth and data adapters.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Url};
use thiserror::Error;
use zeroize::Zeroizing;

static SHARED: OnceLock<Arc<SupabaseClient>> = OnceLock::new();

/// Connection values for the hosted backend.
#[derive(Clone)]
pub struct SupabaseConfig {
    /// Project base URL, e.g. `https://abc.supabase.co`.
    pub url: Url,
    /// Public (anon) API key sent with every request.
    pub anon_key: Zeroizing<String>,
    /// Postgres schema holding the rota tables.
    pub schema: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

/// Errors raised while building the shared client.
#[derive(Debug, Error)]
pub enum SupabaseClientError {
    #[error("failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
    #[error("invalid endpoint path {path}: {message}")]
    Endpoint { path: String, message: String },
}

/// Thin wrapper over a reqwest client bound to one project.
pub struct SupabaseClient {
    http: Client,
    base_url: Url,
    anon_key: Zeroizing<String>,
    schema: String,
}

impl SupabaseClient {
    /// Build a client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: SupabaseConfig) -> Result<Self, SupabaseClientError> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            http,
            base_url: config.url,
            anon_key: config.anon_key,
            schema: config.schema,
        })
    }

    /// Initialise the shared client once. Later calls return the instance
    /// installed first and ignore their config.
    pub fn install(config: SupabaseConfig) -> Result<Arc<Self>, SupabaseClientError> {
        if let Some(existing) = SHARED.get() {
            return Ok(Arc::clone(existing));
        }
        let built = Arc::new(Self::new(config)?);
        Ok(Arc::clone(SHARED.get_or_init(|| built)))
    }

    /// The shared client, if installed.
    pub fn shared() -> Option<Arc<Self>> {
        SHARED.get().cloned()
    }

    pub fn schema(&self) -> &str {
        self.schema.as_str()
    }

    /// Resolve `path` against the project URL.
    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, SupabaseClientError> {
        self.base_url
            .join(path)
            .map_err(|error| SupabaseClientError::Endpoint {
                path: path.to_owned(),
                message: error.to_string(),
            })
    }

    /// Start a request carrying the project API key.
    pub(crate) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", self.anon_key.as_str())
            .header(reqwest::header::ACCEPT, "application/json")
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for endpoint resolution.
    use super::*;
    use rstest::rstest;

    fn client(base: &str) -> SupabaseClient {
        SupabaseClient::new(SupabaseConfig {
            url: Url::parse(base).expect("valid url"),
            anon_key: Zeroizing::new("anon".to_owned()),
            schema: "coop".to_owned(),
            request_timeout: Duration::from_secs(5),
        })
        .expect("client builds")
    }

    #[rstest]
    #[case("https://abc.supabase.co", "/rest/v1/shifts", "https://abc.supabase.co/rest/v1/shifts")]
    #[case("https://abc.supabase.co/", "auth/v1/logout", "https://abc.supabase.co/auth/v1/logout")]
    fn resolves_endpoints(#[case] base: &str, #[case] path: &str, #[case] expected: &str) {
        let url = client(base).endpoint(path).expect("endpoint resolves");
        assert_eq!(url.as_str(), expected);
    }

    #[test]
    fn install_keeps_the_first_client() {
        let config = |schema: &str| SupabaseConfig {
            url: Url::parse("https://abc.supabase.co").expect("valid url"),
            anon_key: Zeroizing::new("anon".to_owned()),
            schema: schema.to_owned(),
            request_timeout: Duration::from_secs(5),
        };
        let first = SupabaseClient::install(config("coop")).expect("install succeeds");
        let second = SupabaseClient::install(config("other")).expect("install succeeds");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.schema(), "coop");
        let shared = SupabaseClient::shared().expect("client installed");
        assert!(Arc::ptr_eq(&first, &shared));
    }

    #[test]
    fn exposes_schema() {
        assert_eq!(client("https://abc.supabase.co").schema(), "coop");
    }
}

use std::time::Duration;

use super::error::{CouchDaoError, CouchResult};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(4);

/// Runtime configuration describing how to reach the CouchDB session database.
#[derive(Debug, Clone)]
pub struct CouchConfig {
    /// Server URL without the database segment.
    pub base_url: String,
    /// Database holding the session documents.
    pub database: String,
    /// Basic-auth user, if any.
    pub username: Option<String>,
    /// Basic-auth password, if any.
    pub password: Option<String>,
    /// Per-request timeout; kept below the sync interval so one slow cycle cannot overlap the next.
    pub request_timeout: Duration,
}

impl CouchConfig {
    /// Configuration without credentials and with the default timeout.
    pub fn new(base_url: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            database: database.into(),
            username: None,
            password: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Attach basic-auth credentials to the configuration.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Build a configuration from the environment.
    ///
    /// Returns `Ok(None)` when `COUCH_BASE_URL` is unset, meaning online mode has no backend.
    pub fn from_env() -> CouchResult<Option<Self>> {
        let Ok(base_url) = std::env::var("COUCH_BASE_URL") else {
            return Ok(None);
        };
        let database = std::env::var("COUCH_DB")
            .map_err(|_| CouchDaoError::MissingEnvVar { var: "COUCH_DB" })?;

        let mut config = Self::new(base_url, database);

        if let (Some(username), Some(password)) = (
            std::env::var("COUCH_USERNAME").ok(),
            std::env::var("COUCH_PASSWORD").ok(),
        ) {
            config = config.with_credentials(username, password);
        }

        if let Some(timeout_ms) = std::env::var("COUCH_TIMEOUT_MS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|ms| *ms > 0)
        {
            config.request_timeout = Duration::from_millis(timeout_ms);
        }

        Ok(Some(config))
    }
}

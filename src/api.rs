use serde::{Deserialize, Serialize};

use std::time::Duration;

use crate::error::{ContextError, ReportError};
use crate::report::VehicleReport;
use crate::session::SessionStore;

/// The base URL of the deployed report service.
pub const DEFAULT_BASE_URL: &str = "https://anthonyx82.ddns.net/taller/api";

/// The body sent to the login endpoint.
#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// The body returned by the login endpoint.
#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: String,
    #[allow(dead_code)]
    token_type: String,
}

/// A client for the report service.
///
/// Shared reports are public on the service as deployed, so by default no
/// credentials are sent with the report request. Deployments that gate the
/// report endpoint can set `require_auth_header`, in which case the bearer
/// token from the session store is attached and its absence is an error.
pub struct ApiClient {
    base_url: String,
    require_auth_header: bool,
    session: SessionStore,
    client: reqwest::blocking::Client,
}

impl ApiClient {
    /// Creates a client for the service at `base_url`. A trailing slash on the
    /// base URL is tolerated.
    pub fn new(
        base_url: &str,
        require_auth_header: bool,
        session: SessionStore,
    ) -> Result<ApiClient, ContextError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|error| {
                ContextError::with_error("Unable to build the HTTP client", &error)
            })?;

        Ok(ApiClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            require_auth_header,
            session,
            client,
        })
    }

    /// Fetches the report identified by the given share token.
    ///
    /// An empty token fails immediately with `ReportError::InvalidToken`
    /// without contacting the service. A single request is attempted; any
    /// transport failure, non-success status or undecodable body is reported
    /// as `ReportError::NotFoundOrExpired`, retrying is up to the caller.
    pub fn load_report(&self, token: &str) -> Result<VehicleReport, ReportError> {
        if token.is_empty() {
            return Err(ReportError::InvalidToken);
        }

        let mut request = self
            .client
            .get(format!("{}/informe/{}", self.base_url, token));
        if self.require_auth_header {
            let session_token = self
                .session
                .load_token()
                .ok_or(ReportError::MissingSession)?;
            request = request.bearer_auth(session_token);
        }

        let response = request.send().map_err(|error| {
            ReportError::NotFoundOrExpired(ContextError::with_error(
                "Unable to reach the report service",
                &error,
            ))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReportError::NotFoundOrExpired(ContextError::with_context(
                format!("The report service answered with status {status}"),
            )));
        }

        let body = response.text().map_err(|error| {
            ReportError::NotFoundOrExpired(ContextError::with_error(
                "Unable to read the report response",
                &error,
            ))
        })?;
        serde_json::from_str(&body).map_err(|error| {
            log::error!("The report payload could not be decoded: {}", error);
            ReportError::NotFoundOrExpired(ContextError::with_error(
                "Unable to decode the report payload",
                &error,
            ))
        })
    }

    /// Authenticates against the service and persists the obtained bearer
    /// token in the session store.
    pub fn login(&self, username: &str, password: &str) -> Result<(), ContextError> {
        let body = serde_json::to_string(&LoginRequest { username, password })
            .map_err(|error| ContextError::with_error("Unable to encode the login request", &error))?;
        let response = self
            .client
            .post(format!("{}/login", self.base_url))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .map_err(|error| {
                ContextError::with_error("Unable to reach the report service", &error)
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ContextError::with_context(format!(
                "The login was rejected with status {status}"
            )));
        }

        let login: LoginResponse = response
            .text()
            .map_err(|error| ContextError::with_error("Unable to read the login response", &error))
            .and_then(|body| {
                serde_json::from_str(&body).map_err(|error| {
                    ContextError::with_error("Unable to decode the login response", &error)
                })
            })?;

        self.session.save_token(&login.access_token)
    }

    /// Discards the stored session, if any.
    pub fn logout(&self) -> Result<(), ContextError> {
        self.session.clear()
    }
}

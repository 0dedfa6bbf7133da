//! Shared infrastructure for the ERP connector.
//!
//! The connector reuses:
//! - `FetchClient`: HTTP client with error classification
//! - `resolve_credential`: config > env > error
//!
//! The client is fail-fast: every request gets exactly one attempt, and
//! rate limits or upstream failures surface immediately as exit codes.
//! Reconciliation runs against accounting data; a half-fetched ledger is
//! worse than no ledger, so nothing here retries or backs off.

use std::time::Duration;

use crate::exit_codes;
use crate::CliError;

// ── Constants ───────────────────────────────────────────────────────

pub(super) const USER_AGENT: &str = concat!("xcheck/", env!("CARGO_PKG_VERSION"));

// ── FetchClient ─────────────────────────────────────────────────────

/// Shared HTTP client that handles error classification.
///
/// The connector owns its credentials and base URL. It passes a
/// request-building closure to [`request`] which sends it once and maps
/// HTTP status codes to the standard exit codes.
pub(super) struct FetchClient {
    pub(super) http: reqwest::blocking::Client,
    source_name: String,
    error_extractor: fn(&serde_json::Value, u16) -> String,
}

impl FetchClient {
    pub(super) fn new(
        source_name: &str,
        error_extractor: fn(&serde_json::Value, u16) -> String,
        timeout_secs: u64,
    ) -> Result<Self, CliError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| CliError {
                code: exit_codes::EXIT_FETCH_UPSTREAM,
                message: format!("failed to build HTTP client: {}", e),
                hint: None,
            })?;

        Ok(Self {
            http,
            source_name: source_name.to_string(),
            error_extractor,
        })
    }

    /// Make a single request and classify the outcome.
    ///
    /// `build_request` receives the underlying `reqwest::blocking::Client`
    /// and must return a fully configured `RequestBuilder` (URL, auth,
    /// headers, query params).
    pub(super) fn request(
        &self,
        build_request: impl Fn(&reqwest::blocking::Client) -> reqwest::blocking::RequestBuilder,
    ) -> Result<serde_json::Value, CliError> {
        let req = build_request(&self.http);
        let resp = req.send().map_err(|e| CliError {
            code: exit_codes::EXIT_FETCH_UPSTREAM,
            message: format!("{} upstream error: {}", self.source_name, e),
            hint: None,
        })?;

        let status = resp.status().as_u16();

        if status == 401 || status == 403 {
            let body: serde_json::Value = resp.json().unwrap_or(serde_json::Value::Null);
            let msg = (self.error_extractor)(&body, status);
            return Err(CliError {
                code: exit_codes::EXIT_FETCH_AUTH,
                message: format!("{} auth failed ({}): {}", self.source_name, status, msg),
                hint: Some(
                    "check api_key / api_secret in the [erp] config section \
                     (or XCHECK_ERP_KEY / XCHECK_ERP_SECRET)"
                        .into(),
                ),
            });
        }

        if status == 400 {
            let body: serde_json::Value = resp.json().unwrap_or(serde_json::Value::Null);
            let msg = (self.error_extractor)(&body, status);
            return Err(CliError {
                code: exit_codes::EXIT_FETCH_VALIDATION,
                message: format!("{} request rejected ({}): {}", self.source_name, status, msg),
                hint: None,
            });
        }

        if status == 429 {
            return Err(CliError {
                code: exit_codes::EXIT_FETCH_RATE_LIMIT,
                message: format!("{} rate limited (429)", self.source_name),
                hint: Some("wait a minute and re-run".into()),
            });
        }

        if status >= 400 {
            let body: serde_json::Value = resp.json().unwrap_or(serde_json::Value::Null);
            let msg = (self.error_extractor)(&body, status);
            return Err(CliError {
                code: exit_codes::EXIT_FETCH_UPSTREAM,
                message: format!("{} error ({}): {}", self.source_name, status, msg),
                hint: None,
            });
        }

        // Success: parse JSON (read as text first to handle BOM-prefixed
        // responses from some reverse proxies)
        let text = resp.text().map_err(|e| CliError {
            code: exit_codes::EXIT_FETCH_UPSTREAM,
            message: format!("failed to read {} response body: {}", self.source_name, e),
            hint: None,
        })?;
        let trimmed = text.trim_start_matches('\u{feff}');
        let body: serde_json::Value = serde_json::from_str(trimmed).map_err(|e| CliError {
            code: exit_codes::EXIT_FETCH_UPSTREAM,
            message: format!(
                "failed to parse {} JSON response: {} (body: {})",
                self.source_name,
                e,
                &trimmed[..trimmed.len().min(200)],
            ),
            hint: None,
        })?;

        Ok(body)
    }
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve a credential: config value takes precedence, then the
/// environment variable, then error with `EXIT_FETCH_NOT_AUTH`.
pub(super) fn resolve_credential(
    configured: Option<String>,
    what: &str,
    env_var: &str,
) -> Result<String, CliError> {
    if let Some(value) = configured {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return Ok(trimmed.to_string());
        }
    }

    if let Ok(value) = std::env::var(env_var) {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return Ok(trimmed.to_string());
        }
    }

    Err(CliError {
        code: exit_codes::EXIT_FETCH_NOT_AUTH,
        message: format!("missing ERPNext {}", what),
        hint: Some(format!(
            "set {} in the [erp] config section or export {}",
            what, env_var,
        )),
    })
}

// ── Tests ───────────────────────────────────────────────────────────

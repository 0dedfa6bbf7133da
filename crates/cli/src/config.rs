//! Run configuration: the TOML file behind `--config`.
//!
//! One file describes a reconciliation run: which ERP account to pull,
//! which statement CSV to read, the date window, and where the report
//! goes. Credentials may live here or in the environment.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;

use crosscheck_recon::DEFAULT_TOLERANCE;

use crate::CliError;

// ── Sections ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RunConfig {
    /// GL account whose entries are reconciled.
    pub account: String,

    /// Restrict to one company when the site hosts several.
    pub company: Option<String>,

    /// Window start, inclusive (`YYYY-MM-DD`). Open-ended when absent.
    pub from_date: Option<String>,

    /// Window end, inclusive (`YYYY-MM-DD`). Open-ended when absent.
    pub to_date: Option<String>,

    pub erp: ErpConfig,
    pub statement: StatementConfig,

    #[serde(default)]
    pub matching: MatchingConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct ErpConfig {
    /// ERPNext site root, e.g. `https://erp.example.com`.
    pub base_url: String,

    /// API key; falls back to `XCHECK_ERP_KEY`.
    pub api_key: Option<String>,

    /// API secret; falls back to `XCHECK_ERP_SECRET`.
    pub api_secret: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Statement CSV location and column names.
///
/// Defaults follow the HDFC netbanking export; other banks override
/// the column names here.
#[derive(Debug, Deserialize)]
pub struct StatementConfig {
    pub file: PathBuf,

    #[serde(rename = "txn_id", default = "default_txn_id_column")]
    pub txn_id_column: String,

    #[serde(rename = "date", default = "default_date_column")]
    pub date_column: String,

    #[serde(rename = "withdrawal", default = "default_withdrawal_column")]
    pub withdrawal_column: String,

    #[serde(rename = "deposit", default = "default_deposit_column")]
    pub deposit_column: String,

    #[serde(rename = "balance", default = "default_balance_column")]
    pub balance_column: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Amount slack when comparing summed vouchers to a statement line.
    pub tolerance: f64,

    /// Also flag matches that have other plausible voucher subsets.
    pub strict: bool,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            strict: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Report destination, overwritten on every run.
    pub report: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report: PathBuf::from("output.txt"),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}
fn default_txn_id_column() -> String {
    "Tran. Id".into()
}
fn default_date_column() -> String {
    "Transaction Date".into()
}
fn default_withdrawal_column() -> String {
    "Withdrawal Amt (INR)".into()
}
fn default_deposit_column() -> String {
    "Deposit Amt (INR)".into()
}
fn default_balance_column() -> String {
    "Balance (INR)".into()
}

// ── Loading and validation ──────────────────────────────────────────

pub fn load_config(path: &Path) -> Result<RunConfig, CliError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        CliError::args(format!("cannot read config {}: {}", path.display(), e))
            .with_hint("xcheck expects a TOML run config; see `xcheck validate --help`")
    })?;
    parse_config(&text, &path.display().to_string())
}

pub fn parse_config(text: &str, origin: &str) -> Result<RunConfig, CliError> {
    let config: RunConfig = toml::from_str(text)
        .map_err(|e| CliError::args(format!("invalid config {}: {}", origin, e)))?;
    config.validate()?;
    Ok(config)
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), CliError> {
        if self.account.trim().is_empty() {
            return Err(CliError::args("account must not be empty"));
        }
        if self.erp.base_url.trim().is_empty() {
            return Err(CliError::args("erp.base_url must not be empty"));
        }
        if !self.matching.tolerance.is_finite() || self.matching.tolerance < 0.0 {
            return Err(CliError::args(
                "matching.tolerance must be a non-negative amount",
            ));
        }

        if let (Some(from), Some(to)) = self.date_range()? {
            if from > to {
                return Err(CliError::args(format!(
                    "from_date {} is after to_date {}",
                    from, to,
                )));
            }
        }

        Ok(())
    }

    /// Parse the configured window. Blank strings count as absent.
    pub fn date_range(&self) -> Result<(Option<NaiveDate>, Option<NaiveDate>), CliError> {
        let from = parse_config_date("from_date", self.from_date.as_deref())?;
        let to = parse_config_date("to_date", self.to_date.as_deref())?;
        Ok((from, to))
    }
}

fn parse_config_date(key: &str, value: Option<&str>) -> Result<Option<NaiveDate>, CliError> {
    let Some(raw) = value else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| {
            CliError::args(format!("invalid {} '{}' (expected YYYY-MM-DD)", key, trimmed))
        })
}

// ── Tests ───────────────────────────────────────────────────────────

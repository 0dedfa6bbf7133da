//! `xcheck run`: fetch the ledger, reconcile, write the report.
//!
//! The pipeline: load config, read the statement CSV, pull GL entries
//! from ERPNext, drop vouchers that are not submitted, compute running
//! balances over the full listing, trim to the date window, match, and
//! write the report file. Stderr carries diagnostics; stdout stays
//! empty unless `--json` asks for the machine-readable result.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crosscheck_recon::normalize::in_range;
use crosscheck_recon::{
    filter_submitted, reconcile, render_report, with_running_balance, LedgerEntry, MatchPolicy,
    ReconReport,
};

use crate::config;
use crate::exit_codes;
use crate::fetch::erpnext::{self, ErpClient};
use crate::statement::{self, LoadDiagnostics};
use crate::CliError;

/// Machine-readable result for `xcheck run --json`.
#[derive(Serialize)]
struct RunOutput<'a> {
    account: &'a str,
    company: Option<&'a str>,
    from_date: Option<String>,
    to_date: Option<String>,
    generated_at: String,
    report: &'a ReconReport,
}

pub fn cmd_run(
    config_path: &Path,
    report_override: Option<PathBuf>,
    json: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let config = config::load_config(config_path)?;
    let (from, to) = config.date_range()?;
    let report_path = report_override.as_deref().unwrap_or(&config.output.report);

    let (key, secret) =
        erpnext::resolve_credentials(config.erp.api_key.clone(), config.erp.api_secret.clone())?;

    let (transactions, diagnostics) =
        statement::load_statement(&config.statement, from, to, quiet)?;

    let client = ErpClient::new(&config.erp.base_url, key, secret, config.erp.timeout_secs)?;
    let entries = client.fetch_ledger(
        &config.account,
        config.company.as_deref(),
        from,
        to,
        quiet,
    )?;

    let entries = filter_submitted(entries, &client).map_err(|e| CliError {
        code: exit_codes::EXIT_FETCH_UPSTREAM,
        message: e.to_string(),
        hint: None,
    })?;

    // Balances accumulate over everything fetched; the window only
    // trims what the report shows.
    let entries = with_running_balance(entries);
    let entries: Vec<LedgerEntry> = entries
        .into_iter()
        .filter(|e| in_range(e.posting_date, from, to))
        .collect();

    let policy = MatchPolicy {
        tolerance: config.matching.tolerance,
        strict: config.matching.strict,
    };
    let report = reconcile(&transactions, &entries, &policy);

    let rendered = render_report(&report);
    std::fs::write(report_path, rendered).map_err(|e| CliError {
        code: exit_codes::EXIT_REPORT_WRITE,
        message: format!("cannot write report {}: {}", report_path.display(), e),
        hint: None,
    })?;

    if !quiet {
        print_run_summary(report_path, &diagnostics, &report);
    }

    if json {
        let output = RunOutput {
            account: &config.account,
            company: config.company.as_deref(),
            from_date: from.map(|d| d.to_string()),
            to_date: to.map(|d| d.to_string()),
            generated_at: chrono::Utc::now().to_rfc3339(),
            report: &report,
        };
        let text = serde_json::to_string_pretty(&output).map_err(|e| CliError {
            code: exit_codes::EXIT_REPORT_WRITE,
            message: format!("cannot serialize run output: {}", e),
            hint: None,
        })?;
        println!("{}", text);
    }

    if !report.summary.fully_reconciled() {
        // Report already written; exit 1 without an error line.
        return Err(CliError {
            code: exit_codes::EXIT_MISMATCH,
            message: String::new(),
            hint: None,
        });
    }

    Ok(())
}

fn print_run_summary(report_path: &Path, diag: &LoadDiagnostics, report: &ReconReport) {
    let mut line = format!(
        "statement: {} rows read, {} kept",
        diag.rows_read, diag.rows_kept,
    );
    if diag.skipped_dates > 0 {
        line.push_str(&format!(", {} skipped (bad dates)", diag.skipped_dates));
    }
    if diag.coerced_amounts > 0 {
        line.push_str(&format!(", {} amounts coerced to zero", diag.coerced_amounts));
    }
    eprintln!("{}", line);

    let s = &report.summary;
    eprintln!(
        "reconciled {} transactions against {} ledger entries: {} matched, {} missing in ERP, {} missing in sheet",
        s.transactions, s.ledger_entries, s.matched, s.missing_in_erp, s.missing_in_sheet,
    );
    if s.ambiguous > 0 {
        eprintln!(
            "{} matches have alternate voucher splits (review the report)",
            s.ambiguous,
        );
    }
    eprintln!("report written to {}", report_path.display());
}

pub fn cmd_validate(config_path: &Path) -> Result<(), CliError> {
    let config = config::load_config(config_path)?;
    let (from, to) = config.date_range()?;

    let window = match (from, to) {
        (None, None) => "open".to_string(),
        (Some(f), None) => format!("{} ..", f),
        (None, Some(t)) => format!(".. {}", t),
        (Some(f), Some(t)) => format!("{} .. {}", f, t),
    };

    println!("config OK");
    println!("  account:   {}", config.account);
    println!(
        "  company:   {}",
        config.company.as_deref().unwrap_or("(any)"),
    );
    println!("  statement: {}", config.statement.file.display());
    println!("  window:    {}", window);
    println!("  report:    {}", config.output.report.display());

    Ok(())
}

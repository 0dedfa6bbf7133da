//! `xcheck ledger`: print the balanced GL listing for the account.
//!
//! Same fetch pipeline as `run`, without the statement side: list,
//! drop unsubmitted vouchers, compute running balances, trim to the
//! window, print.

use std::path::Path;

use crosscheck_recon::normalize::in_range;
use crosscheck_recon::{filter_submitted, render_ledger, with_running_balance, LedgerEntry};

use crate::config;
use crate::exit_codes;
use crate::fetch::erpnext::{self, ErpClient};
use crate::CliError;

pub fn cmd_ledger(config_path: &Path, json: bool, quiet: bool) -> Result<(), CliError> {
    let config = config::load_config(config_path)?;
    let (from, to) = config.date_range()?;

    let (key, secret) =
        erpnext::resolve_credentials(config.erp.api_key.clone(), config.erp.api_secret.clone())?;
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
    let entries = with_running_balance(entries);
    let entries: Vec<LedgerEntry> = entries
        .into_iter()
        .filter(|e| in_range(e.posting_date, from, to))
        .collect();

    if json {
        let text = serde_json::to_string_pretty(&entries).map_err(|e| CliError {
            code: exit_codes::EXIT_FETCH_UPSTREAM,
            message: format!("cannot serialize ledger: {}", e),
            hint: None,
        })?;
        println!("{}", text);
    } else {
        print!("{}", render_ledger(&entries));
    }
    Ok(())
}

//! Bank statement CSV loader.
//!
//! Reads a netbanking CSV export into [`BankTransaction`] rows using the
//! column names from the run config. Bank exports are messy in known
//! ways, so the loader is forgiving: rows with unreadable dates are
//! skipped with a warning, junk amounts coerce to zero, and both are
//! counted in [`LoadDiagnostics`] so the run summary can say what was
//! ignored. A missing column is a schema error and aborts.

use chrono::NaiveDate;

use crosscheck_recon::model::BankTransaction;
use crosscheck_recon::normalize::{in_range, parse_amount, parse_statement_date};

use crate::config::StatementConfig;
use crate::exit_codes;
use crate::CliError;

/// What the loader saw while reading, for the run summary.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoadDiagnostics {
    pub rows_read: usize,
    pub rows_kept: usize,
    pub skipped_dates: usize,
    pub coerced_amounts: usize,
}

pub fn load_statement(
    config: &StatementConfig,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    quiet: bool,
) -> Result<(Vec<BankTransaction>, LoadDiagnostics), CliError> {
    let content = std::fs::read_to_string(&config.file).map_err(|e| CliError {
        code: exit_codes::EXIT_STATEMENT_READ,
        message: format!("cannot read statement {}: {}", config.file.display(), e),
        hint: None,
    })?;
    parse_statement(&content, config, from, to, quiet)
}

pub fn parse_statement(
    content: &str,
    config: &StatementConfig,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    quiet: bool,
) -> Result<(Vec<BankTransaction>, LoadDiagnostics), CliError> {
    // Some banks prefix the export with a BOM
    let content = content.trim_start_matches('\u{feff}');

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(content.as_bytes());

    // Header cells arrive padded in some exports; trim before matching
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| CliError {
            code: exit_codes::EXIT_STATEMENT_READ,
            message: format!("cannot read statement header: {}", e),
            hint: None,
        })?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let idx = |name: &str| -> Result<usize, CliError> {
        headers.iter().position(|h| h == name).ok_or_else(|| CliError {
            code: exit_codes::EXIT_STATEMENT_SCHEMA,
            message: format!("statement is missing column '{}'", name),
            hint: Some(format!("available columns: {}", headers.join(", "))),
        })
    };

    let txn_id_idx = idx(&config.txn_id_column)?;
    let date_idx = idx(&config.date_column)?;
    let withdrawal_idx = idx(&config.withdrawal_column)?;
    let deposit_idx = idx(&config.deposit_column)?;
    let balance_idx = idx(&config.balance_column)?;

    let mut diagnostics = LoadDiagnostics::default();
    let mut transactions = Vec::new();

    for (i, result) in reader.records().enumerate() {
        let record = result.map_err(|e| CliError {
            code: exit_codes::EXIT_STATEMENT_READ,
            message: format!("statement row {}: {}", i + 2, e),
            hint: None,
        })?;
        diagnostics.rows_read += 1;

        let raw_date = record.get(date_idx).unwrap_or("");
        let Some(date) = parse_statement_date(raw_date) else {
            diagnostics.skipped_dates += 1;
            if !quiet {
                eprintln!(
                    "warning: skipping row {}: unrecognized date '{}'",
                    i + 2,
                    raw_date.trim(),
                );
            }
            continue;
        };

        let mut amount = |cell_idx: usize| -> f64 {
            match parse_amount(record.get(cell_idx).unwrap_or("")) {
                Some(value) => value,
                None => {
                    diagnostics.coerced_amounts += 1;
                    0.0
                }
            }
        };
        let withdrawal = amount(withdrawal_idx);
        let deposit = amount(deposit_idx);
        let balance = amount(balance_idx);

        if !in_range(date, from, to) {
            continue;
        }

        diagnostics.rows_kept += 1;
        transactions.push(BankTransaction {
            txn_id: record.get(txn_id_idx).unwrap_or("").trim().to_string(),
            date,
            withdrawal,
            deposit,
            balance,
        });
    }

    Ok((transactions, diagnostics))
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn hdfc_config() -> StatementConfig {
        StatementConfig {
            file: PathBuf::from("statement.csv"),
            txn_id_column: "Tran. Id".into(),
            date_column: "Transaction Date".into(),
            withdrawal_column: "Withdrawal Amt (INR)".into(),
            deposit_column: "Deposit Amt (INR)".into(),
            balance_column: "Balance (INR)".into(),
        }
    }

    const HEADER: &str =
        "Tran. Id,Transaction Date,Withdrawal Amt (INR),Deposit Amt (INR),Balance (INR)";

    fn parse(content: &str) -> (Vec<BankTransaction>, LoadDiagnostics) {
        parse_statement(content, &hdfc_config(), None, None, true).unwrap()
    }

    #[test]
    fn loads_hdfc_shaped_rows() {
        let content = format!(
            "{}\nNEFT123,05/Apr/2025,\"1,500.00\",,\"98,500.00\"\nIMPS456,06/Apr/2025,,250.50,\"98,750.50\"\n",
            HEADER,
        );
        let (txns, diag) = parse(&content);

        assert_eq!(txns.len(), 2);
        assert_eq!(txns[0].txn_id, "NEFT123");
        assert_eq!(txns[0].date, NaiveDate::from_ymd_opt(2025, 4, 5).unwrap());
        assert_eq!(txns[0].withdrawal, 1500.0);
        assert_eq!(txns[0].deposit, 0.0);
        assert_eq!(txns[0].balance, 98_500.0);
        assert_eq!(txns[1].deposit, 250.5);

        assert_eq!(diag.rows_read, 2);
        assert_eq!(diag.rows_kept, 2);
        assert_eq!(diag.skipped_dates, 0);
        assert_eq!(diag.coerced_amounts, 0);
    }

    #[test]
    fn missing_column_is_a_schema_error() {
        let content = "Tran. Id,Transaction Date,Withdrawal Amt (INR),Balance (INR)\n\
                       NEFT123,05/Apr/2025,100.00,900.00\n";
        let err = parse_statement(content, &hdfc_config(), None, None, true).unwrap_err();

        assert_eq!(err.code, exit_codes::EXIT_STATEMENT_SCHEMA);
        assert!(err.message.contains("Deposit Amt (INR)"));
        assert!(err.hint.unwrap().contains("Tran. Id"));
    }

    #[test]
    fn unreadable_dates_are_skipped_and_counted() {
        let content = format!(
            "{}\nTXN1,garbage,100.00,,900.00\nTXN2,07-04-2025,50.00,,850.00\n",
            HEADER,
        );
        let (txns, diag) = parse(&content);

        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].txn_id, "TXN2");
        assert_eq!(diag.rows_read, 2);
        assert_eq!(diag.rows_kept, 1);
        assert_eq!(diag.skipped_dates, 1);
    }

    #[test]
    fn junk_amounts_coerce_to_zero_and_count() {
        let content = format!("{}\nTXN1,05/Apr/2025,12x45,,900.00\n", HEADER);
        let (txns, diag) = parse(&content);

        assert_eq!(txns[0].withdrawal, 0.0);
        assert_eq!(diag.coerced_amounts, 1);
        // blank deposit is an ordinary zero, not a coercion
        assert_eq!(txns[0].deposit, 0.0);
    }

    #[test]
    fn date_range_filter_is_inclusive() {
        let content = format!(
            "{}\nTXN1,2025-04-01,10.00,,90.00\nTXN2,2025-04-15,10.00,,80.00\nTXN3,2025-04-30,10.00,,70.00\nTXN4,2025-05-01,10.00,,60.00\n",
            HEADER,
        );
        let from = NaiveDate::from_ymd_opt(2025, 4, 1);
        let to = NaiveDate::from_ymd_opt(2025, 4, 30);
        let (txns, diag) = parse_statement(&content, &hdfc_config(), from, to, true).unwrap();

        let ids: Vec<&str> = txns.iter().map(|t| t.txn_id.as_str()).collect();
        assert_eq!(ids, vec!["TXN1", "TXN2", "TXN3"]);
        assert_eq!(diag.rows_read, 4);
        assert_eq!(diag.rows_kept, 3);
    }

    #[test]
    fn txn_id_is_trimmed() {
        let content = format!("{}\n  NEFT123  ,05/Apr/2025,100.00,,900.00\n", HEADER);
        let (txns, _) = parse(&content);
        assert_eq!(txns[0].txn_id, "NEFT123");
    }

    #[test]
    fn bom_and_padded_headers_resolve() {
        let content = "\u{feff}Tran. Id ,Transaction Date , Withdrawal Amt (INR), Deposit Amt (INR) ,Balance (INR)\n\
                       TXN1,05/Apr/2025,100.00,,900.00\n";
        let (txns, diag) = parse(content);
        assert_eq!(txns.len(), 1);
        assert_eq!(diag.rows_kept, 1);
    }

    #[test]
    fn load_statement_reports_missing_file() {
        let mut config = hdfc_config();
        config.file = PathBuf::from("/nonexistent/statement.csv");
        let err = load_statement(&config, None, None, true).unwrap_err();

        assert_eq!(err.code, exit_codes::EXIT_STATEMENT_READ);
        assert!(err.message.contains("cannot read statement"));
    }

    #[test]
    fn load_statement_reads_a_real_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statement.csv");
        std::fs::write(
            &path,
            format!("{}\nTXN1,05/Apr/2025,,750.00,\"1,750.00\"\n", HEADER),
        )
        .unwrap();

        let mut config = hdfc_config();
        config.file = path;
        let (txns, _) = load_statement(&config, None, None, true).unwrap();

        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].deposit, 750.0);
        assert_eq!(txns[0].balance, 1750.0);
    }
}

//! Fixed-width text rendering for reconciliation reports and ledger
//! listings. Layout is part of the output contract: columns are padded,
//! never truncated, and amounts carry thousands separators.

use num_format::{Locale, ToFormattedString};

use crate::model::{LedgerEntry, ReconReport, ReportRow};

/// Render an amount as `1,234,567.89`. Rounding happens in cents so the
/// fraction never disagrees with the grouped whole part.
pub fn format_amount(value: f64) -> String {
    let cents_total = (value * 100.0).round() as i64;
    let cents_abs = cents_total.abs();
    let whole = (cents_abs / 100).to_formatted_string(&Locale::en);
    let frac = cents_abs % 100;
    if cents_total < 0 {
        format!("-{whole}.{frac:02}")
    } else {
        format!("{whole}.{frac:02}")
    }
}

fn opt_amount(value: Option<f64>) -> String {
    value.map(format_amount).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Reconciliation report
// ---------------------------------------------------------------------------

/// Render the full mismatch report, header and dash rule included. The
/// double pipe separates statement columns from ledger columns.
pub fn render_report(report: &ReconReport) -> String {
    let header = format!(
        "{:<12} | {:<12} | {:>12} | {:>12} | {:>12} || {:>12} | {:>12} | {:>12} | {:<18} | Status",
        "Tran. Id",
        "Date",
        "Withdrawal",
        "Deposit",
        "Stmt Balance",
        "ERP Debit",
        "ERP Credit",
        "ERP Balance",
        "Voucher No",
    );
    let mut out = String::with_capacity((report.rows.len() + 2) * (header.len() + 1));
    out.push_str(&header);
    out.push('\n');
    out.push_str(&"-".repeat(header.len()));
    out.push('\n');
    for row in &report.rows {
        out.push_str(&render_row(row));
        out.push('\n');
    }
    out
}

fn render_row(row: &ReportRow) -> String {
    let status = if row.ambiguous {
        format!("{} (ambiguous)", row.status)
    } else {
        row.status.to_string()
    };
    // Dates render to a String first; chrono's formatter ignores width.
    let date = row.date.format("%Y-%m-%d").to_string();
    format!(
        "{:<12} | {:<12} | {:>12} | {:>12} | {:>12} || {:>12} | {:>12} | {:>12} | {:<18} | {}",
        row.txn_id.as_deref().unwrap_or(""),
        date,
        opt_amount(row.withdrawal),
        opt_amount(row.deposit),
        opt_amount(row.stmt_balance),
        opt_amount(row.erp_debit),
        opt_amount(row.erp_credit),
        opt_amount(row.erp_balance),
        row.voucher_nos.join(", "),
        status,
    )
}

// ---------------------------------------------------------------------------
// Ledger listing
// ---------------------------------------------------------------------------

/// Render a plain ledger listing with running balances. Column labels use
/// the collaborator's vocabulary, so the kind column reads "Voucher Type".
pub fn render_ledger(entries: &[LedgerEntry]) -> String {
    let header = format!(
        "{:<12} | {:<20} | {:<14} | {:>12} | {:>12} | {:>14} | {:<20} | {:<18}",
        "Date",
        "Account",
        "Voucher Type",
        "Debit",
        "Credit",
        "Balance",
        "Against Account",
        "Voucher No",
    );
    let mut out = String::with_capacity((entries.len() + 2) * (header.len() + 1));
    out.push_str(&header);
    out.push('\n');
    out.push_str(&"-".repeat(header.len()));
    out.push('\n');
    for entry in entries {
        let date = entry.posting_date.format("%Y-%m-%d").to_string();
        out.push_str(&format!(
            "{:<12} | {:<20} | {:<14} | {:>12} | {:>12} | {:>14} | {:<20} | {:<18}\n",
            date,
            entry.account,
            entry.voucher_kind,
            format_amount(entry.debit),
            format_amount(entry.credit),
            format_amount(entry.balance),
            entry.against,
            entry.voucher_no,
        ));
    }
    out
}

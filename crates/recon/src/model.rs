use chrono::NaiveDate;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One posted debit/credit line fetched from the books of record.
///
/// Read-only snapshot for the duration of a run: the matcher never mutates
/// an entry, it only annotates the sequence with running balances and
/// consumes entries out of its working pool.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerEntry {
    pub posting_date: NaiveDate,
    pub account: String,
    /// Voucher kind as reported by the collaborator ("Journal Entry",
    /// "Payment Entry", invoice kinds, anything else).
    pub voucher_kind: String,
    pub debit: f64,
    pub credit: f64,
    /// Counter-account label.
    pub against: String,
    /// Identifier of the owning voucher document.
    pub voucher_no: String,
    /// Cheque/reference number pulled from the owning voucher, for kinds
    /// that carry one. This is the field bank transaction ids are matched
    /// against.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Running balance (cumulative debit - credit). Zero until the sequence
    /// is annotated.
    pub balance: f64,
}

/// One normalized bank-statement row.
///
/// At most one of withdrawal/deposit is nonzero in well-formed input; the
/// matcher picks its direction from whichever side is positive and does not
/// enforce exclusivity.
#[derive(Debug, Clone, Serialize)]
pub struct BankTransaction {
    pub txn_id: String,
    pub date: NaiveDate,
    pub withdrawal: f64,
    pub deposit: f64,
    /// Statement-side balance, informational only.
    pub balance: f64,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Classification of one report row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStatus {
    /// Statement transaction reconciled against one or more ledger entries.
    Match,
    /// Statement transaction with no reconciling ledger entries.
    MissingInErp,
    /// Ledger entry never consumed by any statement transaction.
    MissingInSheet,
}

impl RowStatus {
    /// Label used in the rendered report.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Match => "Match",
            Self::MissingInErp => "Missing in ERP",
            Self::MissingInSheet => "Missing in Sheet",
        }
    }
}

impl std::fmt::Display for RowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One classified row: a statement transaction (in statement order) or a
/// leftover ledger entry (appended after the statement pass, in pool order).
///
/// Column population mirrors the rendered report: statement-side amounts are
/// present only on statement rows, ledger-side amounts only where the report
/// shows them (matched rows on the matching side, leftover rows on both).
#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    pub status: RowStatus,
    /// Statement transaction id; absent on leftover rows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub txn_id: Option<String>,
    /// Statement date, or posting date on leftover rows.
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub withdrawal: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deposit: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stmt_balance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub erp_debit: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub erp_credit: Option<f64>,
    /// Running matched-ledger balance after this row took effect.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub erp_balance: Option<f64>,
    /// Voucher identifiers consumed by a match, or the single owning voucher
    /// on a leftover row. Empty when nothing reconciled.
    pub voucher_nos: Vec<String>,
    /// Set under strict matching when a proper subset of the consumed
    /// candidates would also have reconciled the amount.
    pub ambiguous: bool,
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ReconSummary {
    pub transactions: usize,
    pub ledger_entries: usize,
    pub matched: usize,
    pub missing_in_erp: usize,
    pub missing_in_sheet: usize,
    pub ambiguous: usize,
}

impl ReconSummary {
    /// True when every statement row matched, no ledger entry was left over,
    /// and no match was flagged ambiguous.
    pub fn fully_reconciled(&self) -> bool {
        self.missing_in_erp == 0 && self.missing_in_sheet == 0 && self.ambiguous == 0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconReport {
    pub rows: Vec<ReportRow>,
    pub summary: ReconSummary,
}

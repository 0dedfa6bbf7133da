//! `crosscheck-recon`: bank-statement to ERP-ledger reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded transactions and ledger entries,
//! returns a classified report. No CLI or IO dependencies.

pub mod balance;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod report;
pub mod status;

pub use balance::with_running_balance;
pub use matcher::{reconcile, reference_contains, MatchPolicy, DEFAULT_TOLERANCE};
pub use model::{
    BankTransaction, LedgerEntry, ReconReport, ReconSummary, ReportRow, RowStatus,
};
pub use report::{format_amount, render_ledger, render_report};
pub use status::{filter_submitted, StatusError, StatusResolver, VoucherStatus};

//! Statement-to-ledger matching.
//!
//! Transactions are walked in statement order against a pool of ledger
//! entries. Each transaction claims every still-unconsumed entry whose
//! reference contains the transaction id and whose side agrees with the
//! transaction direction, then the claimed amounts are summed and tested
//! against the transaction amount. Consumed entries leave the pool for
//! good; whatever is left over at the end is reported against the ledger
//! side.

use crate::model::{BankTransaction, LedgerEntry, ReconReport, ReconSummary, ReportRow, RowStatus};

/// Amount tolerance used when none is configured. Two values closer than
/// this are considered equal.
pub const DEFAULT_TOLERANCE: f64 = 0.01;

/// Candidate sets larger than this are never probed for alternate
/// decompositions; the probe is exponential in the set size.
const STRICT_PROBE_LIMIT: usize = 20;

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Tunable knobs for a reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchPolicy {
    /// Absolute amount tolerance. A candidate sum within this of the
    /// transaction amount counts as equal (strictly less-than).
    pub tolerance: f64,
    /// When set, matched rows are additionally probed for a smaller
    /// candidate subset that would also have satisfied the tolerance.
    /// Such rows keep their match but are flagged ambiguous.
    pub strict: bool,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            strict: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Reference test
// ---------------------------------------------------------------------------

/// Substring test used for claiming entries. An absent or empty reference
/// never matches; an empty transaction id matches any non-empty reference.
pub fn reference_contains(reference: Option<&str>, txn_id: &str) -> bool {
    match reference {
        Some(r) => !r.is_empty() && r.contains(txn_id),
        None => false,
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Reconcile a bank statement against a submitted ledger entry sequence.
///
/// `entries` must already carry running balances and be restricted to
/// submitted vouchers; this pass neither re-sorts nor re-filters. Rows
/// come out in statement order followed by the unclaimed ledger entries
/// in ledger order.
pub fn reconcile(
    transactions: &[BankTransaction],
    entries: &[LedgerEntry],
    policy: &MatchPolicy,
) -> ReconReport {
    let mut consumed = vec![false; entries.len()];
    let mut rows = Vec::with_capacity(transactions.len() + entries.len());
    let mut erp_running = 0.0_f64;
    let mut matched = 0usize;
    let mut missing_in_erp = 0usize;
    let mut ambiguous_rows = 0usize;

    for txn in transactions {
        let is_deposit = txn.deposit > 0.0;
        let is_withdrawal = txn.withdrawal > 0.0;

        // Claim phase: a deposit consumes debit entries, a withdrawal
        // consumes credit entries. A row carrying both amounts claims on
        // both sides, deposit side first.
        let mut candidates: Vec<usize> = Vec::new();
        for (idx, entry) in entries.iter().enumerate() {
            if consumed[idx] {
                continue;
            }
            if !reference_contains(entry.reference.as_deref(), &txn.txn_id) {
                continue;
            }
            if is_deposit && entry.debit > 0.0 {
                candidates.push(idx);
            } else if is_withdrawal && entry.credit > 0.0 {
                candidates.push(idx);
            }
        }

        let total_debit: f64 = candidates.iter().map(|&i| entries[i].debit).sum();
        let total_credit: f64 = candidates.iter().map(|&i| entries[i].credit).sum();

        let deposit_match = is_deposit && (total_debit - txn.deposit).abs() < policy.tolerance;
        let withdrawal_match = !deposit_match
            && is_withdrawal
            && (total_credit - txn.withdrawal).abs() < policy.tolerance;
        let is_match = deposit_match || withdrawal_match;

        let mut voucher_nos = Vec::new();
        let mut erp_balance = None;
        let mut ambiguous = false;
        if is_match {
            voucher_nos = candidates
                .iter()
                .map(|&i| entries[i].voucher_no.clone())
                .collect();
            for &i in &candidates {
                consumed[i] = true;
                erp_running += entries[i].debit - entries[i].credit;
            }
            erp_balance = Some(erp_running);
            if policy.strict {
                let (amounts, target): (Vec<f64>, f64) = if deposit_match {
                    let a = candidates.iter().map(|&i| entries[i].debit).collect();
                    (a, txn.deposit)
                } else {
                    let a = candidates.iter().map(|&i| entries[i].credit).collect();
                    (a, txn.withdrawal)
                };
                ambiguous = has_alternate_subset(&amounts, target, policy.tolerance);
            }
        }

        if is_match {
            matched += 1;
        } else {
            missing_in_erp += 1;
        }
        if ambiguous {
            ambiguous_rows += 1;
        }
        rows.push(ReportRow {
            status: if is_match {
                RowStatus::Match
            } else {
                RowStatus::MissingInErp
            },
            txn_id: Some(txn.txn_id.clone()),
            date: txn.date,
            withdrawal: Some(txn.withdrawal),
            deposit: Some(txn.deposit),
            stmt_balance: Some(txn.balance),
            erp_debit: (is_match && is_deposit).then_some(total_debit),
            erp_credit: (is_match && is_withdrawal).then_some(total_credit),
            erp_balance,
            voucher_nos,
            ambiguous,
        });
    }

    // Leftover pass: unclaimed entries surface on the ledger side, and
    // the running balance keeps accumulating through them.
    let mut missing_in_sheet = 0usize;
    for (idx, entry) in entries.iter().enumerate() {
        if consumed[idx] {
            continue;
        }
        erp_running += entry.debit - entry.credit;
        missing_in_sheet += 1;
        rows.push(ReportRow {
            status: RowStatus::MissingInSheet,
            txn_id: None,
            date: entry.posting_date,
            withdrawal: None,
            deposit: None,
            stmt_balance: None,
            erp_debit: Some(entry.debit),
            erp_credit: Some(entry.credit),
            erp_balance: Some(erp_running),
            voucher_nos: vec![entry.voucher_no.clone()],
            ambiguous: false,
        });
    }

    ReconReport {
        rows,
        summary: ReconSummary {
            transactions: transactions.len(),
            ledger_entries: entries.len(),
            matched,
            missing_in_erp,
            missing_in_sheet,
            ambiguous: ambiguous_rows,
        },
    }
}

/// True when some non-empty proper subset of `amounts` also lands within
/// tolerance of `target`. Only called for matched rows, so the full set
/// is known to satisfy the tolerance already.
fn has_alternate_subset(amounts: &[f64], target: f64, tolerance: f64) -> bool {
    let n = amounts.len();
    if n < 2 || n > STRICT_PROBE_LIMIT {
        return false;
    }
    let full: u32 = (1u32 << n) - 1;
    for mask in 1..full {
        let sum: f64 = amounts
            .iter()
            .enumerate()
            .filter(|&(i, _)| mask & (1u32 << i) != 0)
            .map(|(_, a)| a)
            .sum();
        if (sum - target).abs() < tolerance {
            return true;
        }
    }
    false
}

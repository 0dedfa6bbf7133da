use crate::model::LedgerEntry;

/// Annotate a date-ordered entry sequence with running balances: each
/// entry's balance is the previous balance plus (debit - credit), starting
/// from zero.
pub fn with_running_balance(mut entries: Vec<LedgerEntry>) -> Vec<LedgerEntry> {
    let mut balance = 0.0;
    for entry in &mut entries {
        balance += entry.debit - entry.credit;
        entry.balance = balance;
    }
    entries
}

// Property-based tests for statement-to-ledger matching.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::HashMap;

use chrono::NaiveDate;
use proptest::prelude::*;

use crosscheck_recon::{
    reconcile, BankTransaction, LedgerEntry, MatchPolicy, ReconReport, RowStatus,
};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

fn config_128() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(128),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

// Whole-rupee amounts keep every candidate sum exact in f64, so no
// generated case can sit on the tolerance boundary.
const MAX_AMOUNT: i64 = 100_000;

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 4, day).unwrap()
}

/// How an entry's reference relates to the transaction pool.
#[derive(Debug, Clone, Copy)]
enum RefKind {
    /// Reference embeds the id of transaction `i`.
    Linked(usize),
    /// Reference is present but mentions no transaction.
    Noise,
    Absent,
}

#[derive(Debug, Clone)]
struct Scenario {
    txns: Vec<BankTransaction>,
    entries: Vec<LedgerEntry>,
}

fn build_scenario(
    txn_specs: Vec<(i64, bool, u32)>,
    entry_specs: Vec<(i64, bool, u32, RefKind)>,
) -> Scenario {
    let txns = txn_specs
        .iter()
        .enumerate()
        .map(|(i, &(amount, is_deposit, day))| BankTransaction {
            txn_id: format!("TXN{i}"),
            date: d(day),
            withdrawal: if is_deposit { 0.0 } else { amount as f64 },
            deposit: if is_deposit { amount as f64 } else { 0.0 },
            balance: 0.0,
        })
        .collect();
    let entries = entry_specs
        .iter()
        .enumerate()
        .map(|(j, &(amount, is_debit, day, ref_kind))| LedgerEntry {
            posting_date: d(day),
            account: "HDFC Bank - PC".into(),
            voucher_kind: "Journal Entry".into(),
            debit: if is_debit { amount as f64 } else { 0.0 },
            credit: if is_debit { 0.0 } else { amount as f64 },
            against: "Debtors".into(),
            voucher_no: format!("JE-{j}"),
            reference: match ref_kind {
                RefKind::Linked(i) if !txn_specs.is_empty() => Some(format!("UTR/TXN{i}/{j}")),
                RefKind::Linked(_) => None,
                RefKind::Noise => Some(format!("UTR-{j}")),
                RefKind::Absent => None,
            },
            balance: 0.0,
        })
        .collect();
    Scenario { txns, entries }
}

/// Small mixed pools: a handful of transactions, entries that link to
/// them, ignore them, or carry no reference at all.
fn scenario() -> impl Strategy<Value = Scenario> {
    proptest::collection::vec((1..=MAX_AMOUNT, any::<bool>(), 1u32..=28), 0..6).prop_flat_map(
        |txn_specs| {
            let n = txn_specs.len();
            let ref_kind = prop_oneof![
                3 => (0..n.max(1)).prop_map(RefKind::Linked),
                1 => Just(RefKind::Noise),
                1 => Just(RefKind::Absent),
            ];
            (
                Just(txn_specs),
                proptest::collection::vec((1..=MAX_AMOUNT, any::<bool>(), 1u32..=28, ref_kind), 0..8),
            )
                .prop_map(|(t, e)| build_scenario(t, e))
        },
    )
}

fn run(s: &Scenario) -> ReconReport {
    reconcile(&s.txns, &s.entries, &MatchPolicy::default())
}

fn shuffle<T>(items: &mut [T], mut seed: u64) {
    for i in (1..items.len()).rev() {
        seed = seed
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let j = (seed >> 33) as usize % (i + 1);
        items.swap(i, j);
    }
}

fn sorted_vouchers(rows: &[crosscheck_recon::ReportRow]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|r| {
            let mut v = r.voucher_nos.clone();
            v.sort_unstable();
            v
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Invariants
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn reconcile_is_deterministic(s in scenario()) {
        let a = serde_json::to_value(run(&s)).unwrap();
        let b = serde_json::to_value(run(&s)).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn every_side_is_accounted_for(s in scenario()) {
        let report = run(&s);
        prop_assert_eq!(
            report.summary.matched + report.summary.missing_in_erp,
            s.txns.len()
        );
        prop_assert_eq!(
            report.rows.len(),
            s.txns.len() + report.summary.missing_in_sheet
        );
        let consumed: usize = report
            .rows
            .iter()
            .filter(|r| r.status == RowStatus::Match)
            .map(|r| r.voucher_nos.len())
            .sum();
        prop_assert_eq!(consumed + report.summary.missing_in_sheet, s.entries.len());
    }

    /// Every ledger entry shows up in exactly one row: either consumed by
    /// a match or surfaced as a leftover. Nothing is dropped or doubled.
    #[test]
    fn vouchers_partition_across_rows(s in scenario()) {
        let report = run(&s);
        let mut seen: Vec<&str> = report
            .rows
            .iter()
            .flat_map(|r| r.voucher_nos.iter().map(String::as_str))
            .collect();
        seen.sort_unstable();
        let mut all: Vec<&str> = s.entries.iter().map(|e| e.voucher_no.as_str()).collect();
        all.sort_unstable();
        prop_assert_eq!(seen, all);
    }

    /// Replaying the consumed vouchers against the entry table reproduces
    /// every reported running balance.
    #[test]
    fn running_balance_is_reconstructible(s in scenario()) {
        let report = run(&s);
        let by_no: HashMap<&str, &LedgerEntry> =
            s.entries.iter().map(|e| (e.voucher_no.as_str(), e)).collect();
        let mut acc = 0.0_f64;
        for row in &report.rows {
            for no in &row.voucher_nos {
                let entry = by_no[no.as_str()];
                acc += entry.debit - entry.credit;
            }
            if let Some(balance) = row.erp_balance {
                prop_assert!(
                    (balance - acc).abs() < 1e-6,
                    "balance drift: reported {} vs replayed {}",
                    balance,
                    acc
                );
            }
        }
    }

    /// Strict mode may only annotate; statuses, claims and balances are
    /// untouched.
    #[test]
    fn strict_mode_only_annotates(s in scenario()) {
        let lax = run(&s);
        let strict = reconcile(
            &s.txns,
            &s.entries,
            &MatchPolicy { strict: true, ..MatchPolicy::default() },
        );
        let lax_statuses: Vec<RowStatus> = lax.rows.iter().map(|r| r.status).collect();
        let strict_statuses: Vec<RowStatus> = strict.rows.iter().map(|r| r.status).collect();
        prop_assert_eq!(lax_statuses, strict_statuses);
        prop_assert_eq!(sorted_vouchers(&lax.rows), sorted_vouchers(&strict.rows));
        prop_assert_eq!(lax.summary.matched, strict.summary.matched);
        prop_assert_eq!(lax.summary.missing_in_sheet, strict.summary.missing_in_sheet);
    }
}

// ---------------------------------------------------------------------------
// Metamorphic
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_128())]

    /// Reordering the ledger can reorder claims within a row but never
    /// change what each statement row resolves to.
    #[test]
    fn entry_order_does_not_change_outcomes(s in scenario(), seed in any::<u64>()) {
        let base = run(&s);
        let mut shuffled = s.entries.clone();
        shuffle(&mut shuffled, seed);
        let permuted = reconcile(&s.txns, &shuffled, &MatchPolicy::default());

        let n = s.txns.len();
        let base_statuses: Vec<RowStatus> = base.rows[..n].iter().map(|r| r.status).collect();
        let perm_statuses: Vec<RowStatus> = permuted.rows[..n].iter().map(|r| r.status).collect();
        prop_assert_eq!(base_statuses, perm_statuses);
        prop_assert_eq!(
            sorted_vouchers(&base.rows[..n]),
            sorted_vouchers(&permuted.rows[..n])
        );
        prop_assert_eq!(base.summary.matched, permuted.summary.matched);
        prop_assert_eq!(base.summary.missing_in_erp, permuted.summary.missing_in_erp);
        prop_assert_eq!(base.summary.missing_in_sheet, permuted.summary.missing_in_sheet);
    }

    /// An entry that no transaction references lands as exactly one extra
    /// leftover row and disturbs nothing else.
    #[test]
    fn unreferenced_entry_only_adds_a_leftover(
        s in scenario(),
        amount in 1..=MAX_AMOUNT,
        is_debit in any::<bool>(),
    ) {
        let base = run(&s);
        let mut extended = s.entries.clone();
        extended.push(LedgerEntry {
            posting_date: d(20),
            account: "HDFC Bank - PC".into(),
            voucher_kind: "Journal Entry".into(),
            debit: if is_debit { amount as f64 } else { 0.0 },
            credit: if is_debit { 0.0 } else { amount as f64 },
            against: "Debtors".into(),
            voucher_no: "JE-EXTRA".into(),
            reference: Some("UNLINKED".into()),
            balance: 0.0,
        });
        let grown = reconcile(&s.txns, &extended, &MatchPolicy::default());

        prop_assert_eq!(grown.summary.matched, base.summary.matched);
        prop_assert_eq!(grown.summary.missing_in_erp, base.summary.missing_in_erp);
        prop_assert_eq!(
            grown.summary.missing_in_sheet,
            base.summary.missing_in_sheet + 1
        );
        let n = s.txns.len();
        let base_statuses: Vec<RowStatus> = base.rows[..n].iter().map(|r| r.status).collect();
        let grown_statuses: Vec<RowStatus> = grown.rows[..n].iter().map(|r| r.status).collect();
        prop_assert_eq!(base_statuses, grown_statuses);
    }

    /// A transaction whose amount is booked as several referenced splits
    /// always reconciles, whichever side it is on.
    #[test]
    fn constructed_split_always_matches(
        parts in proptest::collection::vec(1..=MAX_AMOUNT, 1..5),
        is_deposit in any::<bool>(),
    ) {
        let amounts: Vec<f64> = parts.iter().map(|&c| c as f64).collect();
        let total: f64 = amounts.iter().sum();
        let txn = BankTransaction {
            txn_id: "TXN0".into(),
            date: d(10),
            withdrawal: if is_deposit { 0.0 } else { total },
            deposit: if is_deposit { total } else { 0.0 },
            balance: 0.0,
        };
        let entries: Vec<LedgerEntry> = amounts
            .iter()
            .enumerate()
            .map(|(j, &a)| LedgerEntry {
                posting_date: d(9),
                account: "HDFC Bank - PC".into(),
                voucher_kind: "Journal Entry".into(),
                debit: if is_deposit { a } else { 0.0 },
                credit: if is_deposit { 0.0 } else { a },
                against: "Debtors".into(),
                voucher_no: format!("JE-{j}"),
                reference: Some(format!("TXN0/{j}")),
                balance: 0.0,
            })
            .collect();

        let report = reconcile(&[txn], &entries, &MatchPolicy::default());
        prop_assert_eq!(report.rows[0].status, RowStatus::Match);
        prop_assert_eq!(report.summary.missing_in_sheet, 0);
        prop_assert_eq!(report.rows[0].voucher_nos.len(), entries.len());
    }
}

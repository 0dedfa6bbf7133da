use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use crate::model::LedgerEntry;

// ---------------------------------------------------------------------------
// Voucher status
// ---------------------------------------------------------------------------

/// Finalization state of a voucher document. Wire encoding is the
/// collaborator's docstatus integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoucherStatus {
    Draft,
    Submitted,
    Cancelled,
}

impl VoucherStatus {
    /// Decode a docstatus code. Unknown codes yield `None`; the owning
    /// entry is then treated as unresolvable and dropped.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Draft),
            1 => Some(Self::Submitted),
            2 => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for VoucherStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Resolver seam
// ---------------------------------------------------------------------------

/// Batched voucher-status lookup. One call covers every voucher of one
/// kind; implementations must not fan out per entry. Vouchers absent from
/// the returned map are treated as unresolvable.
pub trait StatusResolver {
    fn resolve(
        &self,
        voucher_kind: &str,
        voucher_nos: &[String],
    ) -> Result<HashMap<String, VoucherStatus>, StatusError>;
}

/// Transport failure while resolving voucher statuses. Fatal for the run:
/// entries are never reconciled against an unverified voucher set.
#[derive(Debug)]
pub struct StatusError {
    pub voucher_kind: String,
    pub message: String,
}

impl fmt::Display for StatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "status lookup for '{}' failed: {}",
            self.voucher_kind, self.message
        )
    }
}

impl std::error::Error for StatusError {}

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// Keep only entries whose owning voucher resolved to submitted.
///
/// The entry listing alone does not guarantee the owning document is
/// finalized: a draft or cancelled voucher can still have stored entries
/// that must not be reconciled against. Voucher identifiers are grouped by
/// kind and each kind is resolved in one call; entries whose voucher has no
/// resolvable status are dropped. Input order is preserved.
pub fn filter_submitted<R: StatusResolver>(
    entries: Vec<LedgerEntry>,
    resolver: &R,
) -> Result<Vec<LedgerEntry>, StatusError> {
    let mut by_kind: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for entry in &entries {
        by_kind
            .entry(entry.voucher_kind.as_str())
            .or_default()
            .insert(entry.voucher_no.as_str());
    }

    let mut status: HashMap<(String, String), VoucherStatus> = HashMap::new();
    for (kind, nos) in &by_kind {
        let nos: Vec<String> = nos.iter().map(|n| n.to_string()).collect();
        let resolved = resolver.resolve(kind, &nos)?;
        for (no, st) in resolved {
            status.insert((kind.to_string(), no), st);
        }
    }

    Ok(entries
        .into_iter()
        .filter(|e| {
            matches!(
                status.get(&(e.voucher_kind.clone(), e.voucher_no.clone())),
                Some(VoucherStatus::Submitted)
            )
        })
        .collect())
}

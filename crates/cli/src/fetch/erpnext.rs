//! ERPNext REST connector for GL entries and their parent vouchers.
//!
//! Talks to the `/api/resource/{doctype}` listing endpoint with token
//! auth. Three concerns live here:
//!
//! - `fetch_ledger`: paginated GL Entry listing for one account
//! - reference attachment, batched per voucher kind with one lookup each
//! - [`StatusResolver`]: submission status for parent vouchers

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;

use crosscheck_recon::{LedgerEntry, StatusError, StatusResolver, VoucherStatus};

use crate::exit_codes;
use crate::CliError;

use super::common::{self, FetchClient};

// ── Constants ───────────────────────────────────────────────────────

const PAGE_SIZE: usize = 500;
const GL_ORDER: &str = "posting_date asc, name asc";

pub const ENV_API_KEY: &str = "XCHECK_ERP_KEY";
pub const ENV_API_SECRET: &str = "XCHECK_ERP_SECRET";

// ── Credentials ─────────────────────────────────────────────────────

/// Resolve the ERPNext key/secret pair: config > env > error.
pub fn resolve_credentials(
    api_key: Option<String>,
    api_secret: Option<String>,
) -> Result<(String, String), CliError> {
    let key = common::resolve_credential(api_key, "api_key", ENV_API_KEY)?;
    let secret = common::resolve_credential(api_secret, "api_secret", ENV_API_SECRET)?;
    Ok((key, secret))
}

// ── Reference dispatch ──────────────────────────────────────────────

/// Where a voucher kind keeps its bank reference: `(doctype, field)`.
///
/// Journal entries carry the instrument number in `cheque_no`; anything
/// payment-shaped keeps the UTR in `reference_no` on Payment Entry.
/// Other kinds have no reference and never match by transaction id.
fn reference_source(voucher_kind: &str) -> Option<(&'static str, &'static str)> {
    if voucher_kind == "Journal Entry" {
        Some(("Journal Entry", "cheque_no"))
    } else if voucher_kind.to_lowercase().contains("payment") {
        Some(("Payment Entry", "reference_no"))
    } else {
        None
    }
}

// ── Internal row representation ─────────────────────────────────────

/// GL row with its document name, kept for sorting before the name is
/// dropped.
struct RawGlRow {
    name: String,
    entry: LedgerEntry,
}

fn parse_gl_row(item: &serde_json::Value) -> Option<RawGlRow> {
    let date_str = item["posting_date"].as_str().unwrap_or("");
    let posting_date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").ok()?;

    Some(RawGlRow {
        name: item["name"].as_str().unwrap_or("").to_string(),
        entry: LedgerEntry {
            posting_date,
            account: item["account"].as_str().unwrap_or("").to_string(),
            voucher_kind: item["voucher_type"].as_str().unwrap_or("").to_string(),
            debit: item["debit"].as_f64().unwrap_or(0.0),
            credit: item["credit"].as_f64().unwrap_or(0.0),
            against: item["against"].as_str().unwrap_or("").to_string(),
            voucher_no: item["voucher_no"].as_str().unwrap_or("").to_string(),
            reference: None,
            balance: 0.0,
        },
    })
}

// ── ERPNext client ──────────────────────────────────────────────────

pub struct ErpClient {
    client: FetchClient,
    base: url::Url,
    api_key: String,
    api_secret: String,
}

impl ErpClient {
    pub fn new(
        base_url: &str,
        api_key: String,
        api_secret: String,
        timeout_secs: u64,
    ) -> Result<Self, CliError> {
        let base = url::Url::parse(base_url).map_err(|e| CliError {
            code: exit_codes::EXIT_USAGE,
            message: format!("invalid ERPNext base_url '{}': {}", base_url, e),
            hint: None,
        })?;
        if base.scheme() != "http" && base.scheme() != "https" {
            return Err(CliError {
                code: exit_codes::EXIT_USAGE,
                message: format!("ERPNext base_url must be http(s), got '{}'", base_url),
                hint: None,
            });
        }

        Ok(Self {
            client: FetchClient::new("ERPNext", extract_erpnext_error, timeout_secs)?,
            base,
            api_key,
            api_secret,
        })
    }

    fn resource_url(&self, doctype: &str) -> url::Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["api", "resource", doctype]);
        }
        url
    }

    /// List every row of a doctype matching `filters`, following
    /// `limit_start` pagination until a short page.
    fn list_resource(
        &self,
        doctype: &str,
        filters: &serde_json::Value,
        fields: &serde_json::Value,
        order_by: Option<&str>,
    ) -> Result<Vec<serde_json::Value>, CliError> {
        let url = self.resource_url(doctype);
        let auth = format!("token {}:{}", self.api_key, self.api_secret);

        let mut rows = Vec::new();
        let mut start = 0usize;
        let mut prev_first_name: Option<String> = None;

        loop {
            let mut params = vec![
                ("filters".to_string(), filters.to_string()),
                ("fields".to_string(), fields.to_string()),
                ("limit_start".to_string(), start.to_string()),
                ("limit_page_length".to_string(), PAGE_SIZE.to_string()),
            ];
            if let Some(order_by) = order_by {
                params.push(("order_by".to_string(), order_by.to_string()));
            }

            let body = self.client.request(|http| {
                http.get(url.clone())
                    .header("Authorization", auth.as_str())
                    .query(&params)
            })?;

            let page = body["data"].as_array().ok_or_else(|| CliError {
                code: exit_codes::EXIT_FETCH_UPSTREAM,
                message: format!("ERPNext {} response missing 'data' array", doctype),
                hint: None,
            })?;

            let count = page.len();

            // Pagination guard: detect stuck pagination
            if count == PAGE_SIZE {
                let first_name = page
                    .first()
                    .and_then(|row| row["name"].as_str())
                    .map(|s| s.to_string());
                if first_name.is_some() && first_name == prev_first_name {
                    return Err(CliError {
                        code: exit_codes::EXIT_FETCH_UPSTREAM,
                        message: format!(
                            "ERPNext {} pagination stuck: same page returned twice",
                            doctype,
                        ),
                        hint: None,
                    });
                }
                prev_first_name = first_name;
            }

            rows.extend(page.iter().cloned());

            if count < PAGE_SIZE {
                break;
            }

            start += PAGE_SIZE;
        }

        Ok(rows)
    }

    /// Fetch submitted GL entries for `account`, oldest first.
    ///
    /// The server filter narrows by posting date only when both bounds
    /// are present; one-sided ranges are trimmed later, after running
    /// balances are computed from the full listing.
    pub fn fetch_ledger(
        &self,
        account: &str,
        company: Option<&str>,
        from_date: Option<NaiveDate>,
        to_date: Option<NaiveDate>,
        quiet: bool,
    ) -> Result<Vec<LedgerEntry>, CliError> {
        let mut filters = vec![
            serde_json::json!(["account", "=", account]),
            serde_json::json!(["docstatus", "=", 1]),
        ];
        if let (Some(from), Some(to)) = (from_date, to_date) {
            filters.push(serde_json::json!([
                "posting_date",
                "between",
                [from.to_string(), to.to_string()],
            ]));
        }
        if let Some(company) = company {
            filters.push(serde_json::json!(["company", "=", company]));
        }
        let filters = serde_json::Value::Array(filters);
        let fields = serde_json::json!([
            "name",
            "posting_date",
            "account",
            "voucher_type",
            "debit",
            "credit",
            "against",
            "voucher_no",
        ]);

        let items = self.list_resource("GL Entry", &filters, &fields, Some(GL_ORDER))?;
        if !quiet {
            eprintln!("fetched {} GL entries for {}", items.len(), account);
        }

        let mut rows = Vec::new();
        for item in &items {
            match parse_gl_row(item) {
                Some(row) => rows.push(row),
                None => {
                    if !quiet {
                        eprintln!(
                            "warning: skipping GL entry {} with unparseable posting_date",
                            item["name"].as_str().unwrap_or("?"),
                        );
                    }
                }
            }
        }

        // order_by holds within a page; re-sort so the ordering stays
        // stable across page boundaries.
        rows.sort_by(|a, b| {
            (a.entry.posting_date, a.name.as_str())
                .cmp(&(b.entry.posting_date, b.name.as_str()))
        });

        let mut entries: Vec<LedgerEntry> = rows.into_iter().map(|r| r.entry).collect();
        self.attach_references(&mut entries)?;
        Ok(entries)
    }

    /// Attach bank references to entries, one lookup per voucher kind.
    fn attach_references(&self, entries: &mut [LedgerEntry]) -> Result<(), CliError> {
        let mut by_kind: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for entry in entries.iter() {
            if entry.voucher_no.is_empty() {
                continue;
            }
            by_kind
                .entry(entry.voucher_kind.clone())
                .or_default()
                .insert(entry.voucher_no.clone());
        }

        let mut references: HashMap<(String, String), String> = HashMap::new();
        for (kind, nos) in &by_kind {
            let Some((doctype, ref_field)) = reference_source(kind) else {
                continue;
            };
            let names: Vec<&str> = nos.iter().map(|s| s.as_str()).collect();
            let filters = serde_json::json!([["name", "in", names]]);
            let fields = serde_json::json!(["name", ref_field]);

            let rows = self.list_resource(doctype, &filters, &fields, None)?;
            for row in rows {
                let name = row["name"].as_str().unwrap_or("");
                let reference = row[ref_field].as_str().unwrap_or("");
                if !name.is_empty() && !reference.is_empty() {
                    references.insert(
                        (kind.clone(), name.to_string()),
                        reference.to_string(),
                    );
                }
            }
        }

        for entry in entries.iter_mut() {
            entry.reference = references
                .get(&(entry.voucher_kind.clone(), entry.voucher_no.clone()))
                .cloned();
        }

        Ok(())
    }
}

impl StatusResolver for ErpClient {
    fn resolve(
        &self,
        voucher_kind: &str,
        voucher_nos: &[String],
    ) -> Result<HashMap<String, VoucherStatus>, StatusError> {
        let filters = serde_json::json!([["name", "in", voucher_nos]]);
        let fields = serde_json::json!(["name", "docstatus"]);

        let rows = self
            .list_resource(voucher_kind, &filters, &fields, None)
            .map_err(|e| StatusError {
                voucher_kind: voucher_kind.to_string(),
                message: e.message,
            })?;

        let mut statuses = HashMap::new();
        for row in rows {
            let name = row["name"].as_str().unwrap_or("");
            if name.is_empty() {
                continue;
            }
            if let Some(status) = row["docstatus"].as_i64().and_then(VoucherStatus::from_code) {
                statuses.insert(name.to_string(), status);
            }
        }

        Ok(statuses)
    }
}

// ── Error extraction ────────────────────────────────────────────────

/// Pull a human-readable message out of an ERPNext error body.
fn extract_erpnext_error(body: &serde_json::Value, status: u16) -> String {
    if let Some(msg) = body.get("message").and_then(|v| v.as_str()) {
        return msg.to_string();
    }
    if let Some(exc) = body.get("exc_type").and_then(|v| v.as_str()) {
        return exc.to_string();
    }
    if let Some(raw) = body.get("_server_messages").and_then(|v| v.as_str()) {
        return raw.to_string();
    }
    format!("HTTP {}", status)
}

// ── Tests ───────────────────────────────────────────────────────────

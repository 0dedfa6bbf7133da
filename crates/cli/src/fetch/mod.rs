//! ERPNext connector plumbing.
//!
//! `common` owns the HTTP client and credential resolution; `erpnext`
//! speaks the `/api/resource` listing protocol for GL entries, voucher
//! references, and submission status.

mod common;
pub mod erpnext;

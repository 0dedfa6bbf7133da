//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success, statement fully reconciled      |
//! | 1       | Universal        | Run completed but mismatches remain      |
//! | 2       | Universal        | Usage error (bad args, bad config)       |
//! | 10-19   | statement        | Bank statement loading                   |
//! | 20-29   | report           | Report output                            |
//! | 50-59   | fetch            | ERP connector                            |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - the statement reconciled completely.
pub const EXIT_SUCCESS: u8 = 0;

/// Run completed and the report was written, but at least one row is
/// missing on either side. Like `diff(1)`, exit 1 means "sides differ."
pub const EXIT_MISMATCH: u8 = 1;

/// Usage error - bad arguments, unreadable or invalid config, missing
/// required config keys.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Statement (10-19)
// =============================================================================

/// Statement file missing or unreadable.
pub const EXIT_STATEMENT_READ: u8 = 10;

/// Statement header is missing a required column.
pub const EXIT_STATEMENT_SCHEMA: u8 = 11;

// =============================================================================
// Report (20-29)
// =============================================================================

/// Report file could not be created or written.
pub const EXIT_REPORT_WRITE: u8 = 20;

// =============================================================================
// Fetch / adapter (50-59): ERP connector
// =============================================================================

/// No API credentials provided (neither config nor env var).
pub const EXIT_FETCH_NOT_AUTH: u8 = 50;

/// Auth rejected by upstream (401/403).
pub const EXIT_FETCH_AUTH: u8 = 51;

/// Bad request rejected by upstream (400).
pub const EXIT_FETCH_VALIDATION: u8 = 52;

/// Rate limited (429).
pub const EXIT_FETCH_RATE_LIMIT: u8 = 53;

/// Upstream error (5xx) or network failure.
pub const EXIT_FETCH_UPSTREAM: u8 = 54;

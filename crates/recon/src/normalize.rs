use chrono::NaiveDate;

/// Date formats accepted on statement rows, tried in order.
pub const STATEMENT_DATE_FORMATS: [&str; 5] = [
    "%d/%b/%Y",
    "%d-%b-%Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%Y-%m-%d",
];

/// Parse a statement date in any accepted format; first format that parses
/// wins. `None` means the row should be skipped with a diagnostic.
pub fn parse_statement_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    STATEMENT_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

/// Strict amount parse: strips thousands separators and surrounding
/// whitespace. Blank input is zero; `None` means the value is non-blank and
/// non-numeric.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned = raw.replace(',', "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Some(0.0);
    }
    cleaned.parse::<f64>().ok()
}

/// Lenient variant used on statement rows: unparseable values coerce to
/// zero rather than failing the row.
pub fn clean_amount(raw: &str) -> f64 {
    parse_amount(raw).unwrap_or(0.0)
}

/// Inclusive date-range check with open-ended bounds.
pub fn in_range(date: NaiveDate, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
    if let Some(from) = from {
        if date < from {
            return false;
        }
    }
    if let Some(to) = to {
        if date > to {
            return false;
        }
    }
    true
}

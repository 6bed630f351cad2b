use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Case- and whitespace-insensitive form of a free-text label.
///
/// Lower-casing is Unicode aware so accented stage names such as
/// "Confirmation de RÉCEPTION" compare equal to their lower-case spelling.
pub(crate) fn normalize_label(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}', '\u{00a0}'], " ");
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.to_lowercase()
}

/// Trimmed display label, `None` when nothing printable is left.
pub(crate) fn clean_label(value: &str) -> Option<String> {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

/// Converts a monetary amount to whole cents.
///
/// Non-finite and negative amounts coerce to zero.
pub(crate) fn amount_to_cents(value: f64) -> u64 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    (value * 100.0).round() as u64
}

/// Parses a textual amount the way a lenient numeric coercion would:
/// surrounding whitespace is ignored and anything unparseable is zero.
pub(crate) fn parse_amount(value: &str) -> u64 {
    try_parse_amount(value).unwrap_or(0)
}

/// Like [`parse_amount`], but `None` for blank or non-numeric text.
pub(crate) fn try_parse_amount(value: &str) -> Option<u64> {
    value.trim().parse::<f64>().ok().map(amount_to_cents)
}

// Shorter digit runs are more likely compact dates than epoch values.
const MIN_EPOCH_DIGITS: usize = 10;

/// Epoch timestamps are milliseconds, matching what JavaScript CRM clients emit.
pub(crate) fn timestamp_from_millis(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}

/// Accepts RFC 3339, naive `YYYY-MM-DD[ T]HH:MM:SS[.f]` (taken as UTC),
/// bare `YYYY-MM-DD`, and epoch milliseconds written as a digit string.
pub(crate) fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    let digits = trimmed.strip_prefix('-').unwrap_or(trimmed);
    if digits.len() >= MIN_EPOCH_DIGITS && digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return trimmed.parse::<i64>().ok().and_then(timestamp_from_millis);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

//! Object naming.

use chrono::{DateTime, Utc};

/// Reduce a client filename to a safe base name.
///
/// Trailing separators are dropped and the part after the last remaining `/`
/// or `\` is kept. Every character outside `[A-Za-z0-9._-]` then becomes one
/// `_` per UTF-16 code unit.
pub fn sanitize_filename(original: &str) -> String {
    let trimmed = original.trim_end_matches(['/', '\\']);
    let base = trimmed.rsplit(['/', '\\']).next().unwrap_or(trimmed);
    let mut out = String::with_capacity(base.len());
    for c in base.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
            out.push(c);
        } else {
            out.extend(std::iter::repeat_n('_', c.len_utf16()));
        }
    }
    out
}

/// `<unix-millis>-<sanitized-original>`.
pub fn object_name(original: &str, ingested_at: DateTime<Utc>) -> String {
    format!(
        "{}-{}",
        ingested_at.timestamp_millis(),
        sanitize_filename(original)
    )
}

//! Raw cell → count coercion. Suppression markers come out as missing, never as zero.

/// Fixed suppression sentinels, compared case-insensitively after trimming.
pub const SUPPRESSION_MARKERS: [&str; 11] = [
    "*", ".", "-", "-1", "<5", "<10", "n/a", "na", "", "---", "n<10",
];

/// Returns `true` if `raw` is a suppression marker (or blank).
pub fn is_suppressed(raw: &str) -> bool {
    let cleaned = raw.trim().to_ascii_lowercase();
    SUPPRESSION_MARKERS.contains(&cleaned.as_str()) || is_less_than_marker(&cleaned)
}

/// `<` followed by optional spaces and digits, e.g. `< 20`.
fn is_less_than_marker(cleaned: &str) -> bool {
    cleaned
        .strip_prefix('<')
        .map(str::trim_start)
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

/// Coerce a raw source cell into a count.
///
/// - thousands separators and surrounding whitespace are stripped (`" 1,234 "` → `1234`)
/// - suppression markers and anything unparseable are `None`
/// - integral decimals (`"3068.0"`) are accepted; other decimals round to the nearest integer
/// - values outside the `i64` range are `None`, never clamped
pub fn coerce_count(raw: &str) -> Option<i64> {
    if is_suppressed(raw) {
        return None;
    }
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if let Ok(v) = cleaned.parse::<i64>() {
        return Some(v);
    }
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => {
            let rounded = v.round();
            (-I64_BOUND..I64_BOUND).contains(&rounded).then_some(rounded as i64)
        }
        _ => None,
    }
}

/// 2^63: the first float magnitude an `i64` cannot hold.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

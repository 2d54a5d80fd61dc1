use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::warn;

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the timezone of the running system.
///
/// Uses the `iana-time-zone` crate directly, no subprocess calls.
/// Falls back to UTC if detection fails or the reported name is unknown.
pub fn system_timezone() -> Tz {
    iana_time_zone::get_timezone()
        .ok()
        .and_then(|name| name.parse::<Tz>().ok())
        .unwrap_or(Tz::UTC)
}

/// Resolve a timezone selector from configuration.
///
/// `"auto"` (case-insensitive) selects the system timezone; any other value
/// is parsed as an IANA name, with a warning and system fallback when it is
/// not recognised.
pub fn resolve_timezone(selector: &str) -> Tz {
    if selector.eq_ignore_ascii_case("auto") {
        return system_timezone();
    }
    selector.parse::<Tz>().unwrap_or_else(|_| {
        warn!(
            "unrecognised timezone \"{}\", falling back to the system timezone",
            selector
        );
        system_timezone()
    })
}

// ── Timestamp parsing ─────────────────────────────────────────────────────────

/// Parse an ISO 8601 / RFC 3339 timestamp string into a UTC [`DateTime`].
///
/// Handles the common `Z`-suffix form, fixed UTC offsets, and naive
/// datetimes (interpreted as UTC). Returns `None` for empty strings or
/// unrecognised formats.
pub fn parse_utc(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }

    // Replace trailing 'Z' with '+00:00'.
    let normalised = if let Some(stripped) = s.strip_suffix('Z') {
        format!("{}+00:00", stripped)
    } else {
        s.to_string()
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalised) {
        return Some(dt.with_timezone(&Utc));
    }

    const FMTS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
    for fmt in FMTS {
        if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }

    None
}

// ── Bucket keys ───────────────────────────────────────────────────────────────

/// Month key for a raw timestamp string: its first seven characters
/// (`"YYYY-MM"`). Month bucketing intentionally stays in UTC so that month
/// keys line up with month filters over the raw strings.
pub fn month_prefix(ts: &str) -> &str {
    ts.get(..7).unwrap_or(ts)
}

/// Local calendar date key (`"YYYY-MM-DD"`) for a raw UTC timestamp string.
///
/// The timestamp is converted into `tz` before the date is taken, so an
/// event at 03:30 UTC lands on the previous day for zones west of UTC.
/// Unparseable timestamps fall back to the raw string prefix.
pub fn local_day_key(ts: &str, tz: &Tz) -> String {
    match parse_utc(ts) {
        Some(dt) => dt.with_timezone(tz).format("%Y-%m-%d").to_string(),
        None => ts.get(..10).unwrap_or(ts).to_string(),
    }
}

/// Local clock-hour key (`"YYYY-MM-DDTHH"`) for a raw UTC timestamp string.
///
/// Same conversion rules as [`local_day_key`].
pub fn local_hour_key(ts: &str, tz: &Tz) -> String {
    match parse_utc(ts) {
        Some(dt) => dt.with_timezone(tz).format("%Y-%m-%dT%H").to_string(),
        None => ts.get(..13).unwrap_or(ts).to_string(),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

//! Absence duration helpers. Yparéo reports durations in minutes; bulletins
//! display them as `3h05`-style strings.

use time::macros::format_description;
use time::Date;

/// Parse a duration string such as `"3h20"` or `"45 minutes"` into minutes.
/// Returns `None` when neither form applies.
pub(crate) fn parse_duration_to_minutes(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some((hours, minutes)) = trimmed.split_once('h') {
        let hours: i64 = hours.trim().parse().ok()?;
        let minutes: i64 = minutes.trim().parse().ok()?;
        return Some(hours * 60 + minutes);
    }

    trimmed.split_whitespace().next()?.parse().ok()
}

pub(crate) fn format_minutes(minutes: i64) -> String {
    if minutes == 0 {
        return "00h00".to_string();
    }

    let hours = minutes / 60;
    let remaining = minutes % 60;
    if hours > 0 {
        format!("{hours}h{remaining:02}")
    } else {
        format!("{remaining} minutes")
    }
}

/// The Yparéo absence endpoints take `dd-mm-yyyy` range bounds.
pub(crate) fn is_french_date(value: &str) -> bool {
    let format = format_description!("[day]-[month]-[year]");
    Date::parse(value, &format).is_ok()
}

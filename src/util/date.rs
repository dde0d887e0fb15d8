use chrono::{DateTime, NaiveDate};

/// Renders a raw feed date string for display.
///
/// Feeds carry dates in whatever shape their generator produced: RFC 3339
/// for Atom `updated`/`published`, RFC 2822 for RSS `pubDate`, sometimes a
/// bare calendar date. Each format is tried in that order and the result
/// is rendered as a long-form date (`March 5, 2024`).
///
/// An unparsable input is returned unchanged — this is a display
/// fallback, not an error.
///
/// # Examples
///
/// ```
/// use newsprint::util::format_date;
///
/// assert_eq!(format_date("2024-03-05T00:00:00Z"), "March 5, 2024");
/// assert_eq!(format_date("Tue, 05 Mar 2024 08:30:00 GMT"), "March 5, 2024");
/// assert_eq!(format_date("not-a-date"), "not-a-date");
/// ```
pub fn format_date(raw: &str) -> String {
    let date = DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_rfc2822(raw))
        .map(|dt| dt.date_naive())
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"));

    match date {
        Ok(date) => date.format("%B %-d, %Y").to_string(),
        Err(_) => raw.to_string(),
    }
}

//! Clip duration strings
//!
//! Slot descriptors carry their play length as a colon-separated string
//! (`"5:30"`, `"1:02:45"`). This module converts those strings to whole
//! seconds at slot resolution time, and formats seconds back into the
//! same shapes for display and logging.

use crate::error::{Error, Result};

/// Parse a colon-separated duration string into whole seconds.
///
/// Accepts two fields (`m:ss`) or three (`h:mm:ss`), most significant
/// first: with `k` fields, the field at position `i` contributes
/// `value * 60^(k-1-i)` seconds. Field values are unsigned integers and
/// are not range-checked against 60, so `"90:00"` is ninety minutes.
///
/// # Errors
///
/// `Error::Config` on an empty string, a non-numeric or empty field, or
/// a field count other than 2 or 3.
///
/// # Examples
///
/// ```
/// use seamq_common::duration::parse_duration;
///
/// assert_eq!(parse_duration("0:10").unwrap(), 10);
/// assert_eq!(parse_duration("5:30").unwrap(), 330);
/// assert_eq!(parse_duration("1:02:45").unwrap(), 3765);
/// assert!(parse_duration("").is_err());
/// assert!(parse_duration("90").is_err());
/// ```
pub fn parse_duration(text: &str) -> Result<u64> {
    let fields: Vec<&str> = text.split(':').collect();

    if fields.len() < 2 || fields.len() > 3 {
        return Err(Error::Config(format!(
            "duration '{}' must have 2 or 3 colon-separated fields",
            text
        )));
    }

    let mut total: u64 = 0;
    for field in &fields {
        let value: u64 = field.parse().map_err(|_| {
            Error::Config(format!(
                "duration '{}' has a non-numeric field '{}'",
                text, field
            ))
        })?;
        total = total * 60 + value;
    }

    Ok(total)
}

/// Format whole seconds as a duration string with the given field count.
///
/// The inverse of [`parse_duration`]: 2 fields yields `m:ss` (minutes
/// unbounded), 3 fields yields `h:mm:ss` (hours unbounded). Field counts
/// outside 2..=3 are clamped into that range.
///
/// # Examples
///
/// ```
/// use seamq_common::duration::format_duration;
///
/// assert_eq!(format_duration(330, 2), "5:30");
/// assert_eq!(format_duration(3765, 3), "1:02:45");
/// ```
pub fn format_duration(seconds: u64, fields: usize) -> String {
    match fields.clamp(2, 3) {
        2 => format!("{}:{:02}", seconds / 60, seconds % 60),
        _ => format!(
            "{}:{:02}:{:02}",
            seconds / 3600,
            (seconds % 3600) / 60,
            seconds % 60
        ),
    }
}

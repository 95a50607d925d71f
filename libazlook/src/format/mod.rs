//! Human-readable formatting for sizes and times.

use chrono::{DateTime, Utc};
use chrono_humanize::Humanize;
use humansize::{BINARY, format_size as format_size_human};


/// Formats a byte count with binary units (KiB, MiB).
///
/// # Examples
///
/// ```
/// use libazlook::format::format_size;
///
/// assert_eq!(format_size(1024 * 1024 * 5), "5 MiB");
/// assert_eq!(format_size(525), "525 B");
/// ```
pub fn format_size(size_bytes: u64) -> String {
    format_size_human(size_bytes, BINARY)
}

/// Formats a timestamp relative to now, e.g. `a day ago`.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.humanize()
}

/// Formats a timestamp as an HTTP date (`x-ms-date`, `Last-Modified`).
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use libazlook::format::format_rfc1123;
///
/// let t = Utc.with_ymd_and_hms(2021, 12, 2, 8, 5, 9).unwrap();
/// assert_eq!(format_rfc1123(&t), "Thu, 02 Dec 2021 08:05:09 GMT");
/// ```
pub fn format_rfc1123(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Formats a timestamp as `MM/DD/YYYY HH:MM:SS +00:00`.
///
/// This is the console rendering of a UTC date-time-with-offset used by the
/// blob probe output.
pub fn format_offset_datetime(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%m/%d/%Y %H:%M:%S %:z").to_string()
}

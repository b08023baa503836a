//! IDO filter helpers.

use chrono::{DateTime, Utc};

/// Formats a timestamp the way IDO date filters expect it: `YYYY-MM-DD HH:MM:SS`, UTC.
pub fn format_filter_datetime(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_filter_datetime_format() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 7, 14, 5, 9).unwrap();
        assert_eq!(format_filter_datetime(ts), "2026-03-07 14:05:09");
    }
}

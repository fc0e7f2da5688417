//! Timestamp helpers
//!
//! All timestamps are ISO-8601 UTC strings with a trailing `Z` and
//! microsecond precision, e.g. "2024-02-17T00:04:16.789000Z".

use chrono::{SecondsFormat, Utc};

/// Current UTC time as an ISO-8601 string with trailing `Z`.
pub fn utc_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utc_now_format() {
        let ts = utc_now();
        assert!(ts.ends_with('Z'));
        assert!(ts.contains('T'));
        // At least millisecond resolution
        let frac = ts.split('.').nth(1).unwrap();
        assert!(frac.len() > 3);
    }
}

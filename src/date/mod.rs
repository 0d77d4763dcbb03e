pub mod guess;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::error::ExtractError;

pub use guess::{matching_pattern, patterns, DatePattern, Extraction, Guard, TimeOfDay};

/// strftime layout of the canonical timestamp.
pub const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// A UTC instant taken from a filename.
///
/// Displays as `YYYY-MM-DDTHH:MM:SSZ`. Milliseconds captured from the name are
/// kept in the value but never printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Whole seconds since the Unix epoch.
    pub fn unix_seconds(&self) -> i64 {
        self.0.timestamp()
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(CANONICAL_FORMAT))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Infer the capture time encoded in a media filename.
///
/// The filename is matched as given; strip directories before calling.
pub fn extract_date(filename: &str) -> Result<Timestamp, ExtractError> {
    guess::guess_date_from_filename(filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_canonical_format_drops_subseconds() {
        let dt = Utc.with_ymd_and_hms(2019, 1, 30, 17, 24, 50).unwrap()
            + chrono::Duration::milliseconds(999);
        let ts = Timestamp::from(dt);
        assert_eq!(ts.to_string(), "2019-01-30T17:24:50Z");
        assert_eq!(ts.unix_seconds(), 1548869090);
        assert_eq!(serde_json::to_string(&ts).unwrap(), "\"2019-01-30T17:24:50Z\"");
    }

    #[test]
    fn test_extract_date() {
        assert_eq!(
            extract_date("Screenshot_2016-04-16-09-12-10.png").unwrap().to_string(),
            "2016-04-16T09:12:10Z"
        );
        assert!(matches!(
            extract_date("random_file.png"),
            Err(ExtractError::NoPatternMatched { .. })
        ));
    }
}

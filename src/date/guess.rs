use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use regex::{Captures, Regex};
use std::sync::LazyLock;

use super::Timestamp;
use crate::error::ExtractError;

/// How a matched pattern turns its captures into an instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extraction {
    /// Calendar fields from the `y`, `mo`, `d` groups, with the time of day
    /// resolved by the given policy.
    Calendar(TimeOfDay),
    /// Unix epoch in milliseconds from the `epoch` group.
    EpochMillis,
}

/// Normalization policy for the time-of-day part of a calendar capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOfDay {
    /// `h`, `mi` and `s` are all captured.
    Exact,
    /// `h`, `mi`, `s` plus a three digit `ms` group.
    ExactMillis,
    /// `h` and `mi` are captured, seconds are 00.
    ZeroSeconds,
    /// Date only, 00:00:00.
    Midnight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// Decoded UTC year must fall in the inclusive range.
    YearWithin(i32, i32),
}

pub struct DatePattern {
    pub name: &'static str,
    /// Illustrative filename of this shape.
    pub example: &'static str,
    regex: &'static LazyLock<Regex>,
    /// Takes the fields from this regex's first match in the whole filename
    /// instead of from the predicate's match.
    capture: Option<&'static LazyLock<Regex>>,
    pub extraction: Extraction,
    pub guard: Option<Guard>,
}

const DATE_DASHED: &str = r"(?P<y>[0-9]{4})-(?P<mo>[0-9]{2})-(?P<d>[0-9]{2})";
const DATE_COMPACT: &str = r"(?P<y>[0-9]{4})(?P<mo>[0-9]{2})(?P<d>[0-9]{2})";
const TIME_COMPACT: &str = r"(?P<h>[0-9]{2})(?P<mi>[0-9]{2})(?P<s>[0-9]{2})";
const EXTENSION: &str = r"\.[a-zA-Z0-9]+";

fn compile(pattern: String) -> Regex {
    Regex::new(&pattern).unwrap()
}

static RE_DASHED_DATETIME: LazyLock<Regex> = LazyLock::new(|| {
    compile(format!(r"{DATE_DASHED}[-_](?P<h>[0-9]{{2}})-(?P<mi>[0-9]{{2}})-(?P<s>[0-9]{{2}})"))
});
static RE_COMPACT_DATETIME: LazyLock<Regex> =
    LazyLock::new(|| compile(format!(r"{DATE_COMPACT}[_-]{TIME_COMPACT}")));
static RE_DOTTED_TIME: LazyLock<Regex> = LazyLock::new(|| {
    compile(format!(r"{DATE_DASHED}[ _](?P<h>[0-9]{{2}})\.(?P<mi>[0-9]{{2}})\.(?P<s>[0-9]{{2}})"))
});
static RE_COMPACT_DATETIME_ALT: LazyLock<Regex> =
    LazyLock::new(|| compile(format!(r"{DATE_COMPACT}[-_]{TIME_COMPACT}")));
static RE_WHATSAPP: LazyLock<Regex> =
    LazyLock::new(|| compile(format!(r"IMG-{DATE_COMPACT}-WA[0-9]+")));
static RE_DATE_HOUR_MINUTE: LazyLock<Regex> =
    LazyLock::new(|| compile(format!(r"{DATE_DASHED}_(?P<h>[0-9]{{2}})(?P<mi>[0-9]{{2}})")));
static RE_IMG_DASHED: LazyLock<Regex> =
    LazyLock::new(|| compile(format!(r"IMG_{DATE_DASHED}-{TIME_COMPACT}[0-9]{{2}}")));
static RE_DATE_ONLY: LazyLock<Regex> =
    LazyLock::new(|| compile(format!(r"{DATE_DASHED}[^\t\n\x0C\r .]*{EXTENSION}")));
static RE_FIRST_DATE_DASHED: LazyLock<Regex> = LazyLock::new(|| compile(DATE_DASHED.to_string()));
static RE_EPOCH_MILLIS: LazyLock<Regex> = LazyLock::new(|| {
    compile(format!(r"(?:^|[^0-9])(?P<epoch>[0-9]{{13}})[^0-9\t\n\x0C\r .]*{EXTENSION}$"))
});
static RE_BURST: LazyLock<Regex> =
    LazyLock::new(|| compile(format!(r"BURST{DATE_COMPACT}{TIME_COMPACT}")));
static RE_TRAILING_COMPACT: LazyLock<Regex> =
    LazyLock::new(|| compile(format!(r"_{DATE_COMPACT}{TIME_COMPACT}{EXTENSION}$")));
static RE_CAMERA_ZOOM: LazyLock<Regex> =
    LazyLock::new(|| compile(format!(r"CameraZOOM-{DATE_COMPACT}[0-9]+{EXTENSION}$")));
static RE_DASH_MILLIS: LazyLock<Regex> =
    LazyLock::new(|| compile(format!(r"-{DATE_COMPACT}{TIME_COMPACT}(?P<ms>[0-9]{{3}})")));

/// Recognizers in priority order. Several shapes overlap, so the first match
/// wins and the order is part of the behavior.
static PATTERNS: &[DatePattern] = &[
    DatePattern {
        name: "dashed-datetime",
        example: "Screenshot_2016-04-16-09-12-10.png",
        regex: &RE_DASHED_DATETIME,
        capture: None,
        extraction: Extraction::Calendar(TimeOfDay::Exact),
        guard: None,
    },
    DatePattern {
        name: "compact-datetime",
        example: "IMG_20190130_172450.jpg",
        regex: &RE_COMPACT_DATETIME,
        capture: None,
        extraction: Extraction::Calendar(TimeOfDay::Exact),
        guard: None,
    },
    DatePattern {
        name: "dotted-time",
        example: "2020-12-31 23.59.59.jpg",
        regex: &RE_DOTTED_TIME,
        capture: None,
        extraction: Extraction::Calendar(TimeOfDay::Exact),
        guard: None,
    },
    // Same shape as compact-datetime, so it never gets selected.
    DatePattern {
        name: "compact-datetime-alt",
        example: "photo-20211225-153045.jpg",
        regex: &RE_COMPACT_DATETIME_ALT,
        capture: None,
        extraction: Extraction::Calendar(TimeOfDay::Exact),
        guard: None,
    },
    DatePattern {
        name: "whatsapp",
        example: "IMG-20160123-WA0000.jpg",
        regex: &RE_WHATSAPP,
        capture: None,
        extraction: Extraction::Calendar(TimeOfDay::Midnight),
        guard: None,
    },
    DatePattern {
        name: "date-hour-minute",
        example: "2015-11-01_1234.mp4",
        regex: &RE_DATE_HOUR_MINUTE,
        capture: None,
        extraction: Extraction::Calendar(TimeOfDay::ZeroSeconds),
        guard: None,
    },
    DatePattern {
        name: "img-dashed-compact-time",
        example: "IMG_2016-07-10-18472672.png",
        regex: &RE_IMG_DASHED,
        capture: None,
        extraction: Extraction::Calendar(TimeOfDay::Exact),
        guard: None,
    },
    DatePattern {
        name: "date-only",
        example: "2015-05-17-edited.jpg",
        regex: &RE_DATE_ONLY,
        capture: Some(&RE_FIRST_DATE_DASHED),
        extraction: Extraction::Calendar(TimeOfDay::Midnight),
        guard: None,
    },
    DatePattern {
        name: "epoch-millis",
        example: "1431877338773-edited.jpg",
        regex: &RE_EPOCH_MILLIS,
        capture: None,
        extraction: Extraction::EpochMillis,
        guard: Some(Guard::YearWithin(2010, 2023)),
    },
    DatePattern {
        name: "burst",
        example: "00000IMG_00000_BURST20190113203829_COVER.jpg",
        regex: &RE_BURST,
        capture: None,
        extraction: Extraction::Calendar(TimeOfDay::Exact),
        guard: None,
    },
    DatePattern {
        name: "trailing-compact",
        example: "Burst_Cover_GIF_Action_20180420201801.gif",
        regex: &RE_TRAILING_COMPACT,
        capture: None,
        extraction: Extraction::Calendar(TimeOfDay::Exact),
        guard: None,
    },
    DatePattern {
        name: "camera-zoom",
        example: "CameraZOOM-20150829144707466.jpg",
        regex: &RE_CAMERA_ZOOM,
        capture: None,
        extraction: Extraction::Calendar(TimeOfDay::Midnight),
        guard: None,
    },
    DatePattern {
        name: "dash-compact-millis",
        example: "VID-20150829144707466.mp4",
        regex: &RE_DASH_MILLIS,
        capture: None,
        extraction: Extraction::Calendar(TimeOfDay::ExactMillis),
        guard: None,
    },
];

impl DatePattern {
    pub fn is_match(&self, filename: &str) -> bool {
        self.regex.is_match(filename)
    }

    /// Decode a filename this pattern has already matched.
    fn decode(&self, filename: &str, caps: &Captures) -> Result<Timestamp, ExtractError> {
        let malformed = || ExtractError::MalformedCapture {
            filename: filename.to_string(),
            pattern: self.name,
        };

        let instant = match self.extraction {
            Extraction::Calendar(time_of_day) => {
                let date = NaiveDate::from_ymd_opt(
                    field(caps, "y").ok_or_else(malformed)? as i32,
                    field(caps, "mo").ok_or_else(malformed)?,
                    field(caps, "d").ok_or_else(malformed)?,
                )
                .ok_or_else(malformed)?;
                let time = time_of_day.resolve(caps).ok_or_else(malformed)?;
                date.and_time(time).and_utc()
            }
            Extraction::EpochMillis => {
                let millis: i64 = caps
                    .name("epoch")
                    .and_then(|m| m.as_str().parse().ok())
                    .ok_or_else(malformed)?;
                DateTime::from_timestamp_millis(millis).ok_or_else(malformed)?
            }
        };

        if let Some(guard) = self.guard {
            if let Err(year) = guard.check(&instant) {
                return Err(ExtractError::ImplausibleValue {
                    filename: filename.to_string(),
                    pattern: self.name,
                    year,
                });
            }
        }

        Ok(Timestamp::from(instant))
    }
}

impl TimeOfDay {
    fn resolve(self, caps: &Captures) -> Option<NaiveTime> {
        match self {
            TimeOfDay::Exact => {
                NaiveTime::from_hms_opt(field(caps, "h")?, field(caps, "mi")?, field(caps, "s")?)
            }
            TimeOfDay::ExactMillis => NaiveTime::from_hms_milli_opt(
                field(caps, "h")?,
                field(caps, "mi")?,
                field(caps, "s")?,
                field(caps, "ms")?,
            ),
            TimeOfDay::ZeroSeconds => NaiveTime::from_hms_opt(field(caps, "h")?, field(caps, "mi")?, 0),
            TimeOfDay::Midnight => NaiveTime::from_hms_opt(0, 0, 0),
        }
    }
}

impl Guard {
    /// Returns the offending year on rejection.
    fn check(self, instant: &DateTime<Utc>) -> Result<(), i32> {
        match self {
            Guard::YearWithin(min, max) => {
                let year = instant.year();
                if (min..=max).contains(&year) {
                    Ok(())
                } else {
                    Err(year)
                }
            }
        }
    }
}

fn field(caps: &Captures, name: &str) -> Option<u32> {
    caps.name(name)?.as_str().parse().ok()
}

/// All recognizers, highest priority first.
pub fn patterns() -> &'static [DatePattern] {
    PATTERNS
}

/// The recognizer the cascade would select for `filename`, if any.
pub fn matching_pattern(filename: &str) -> Option<&'static DatePattern> {
    PATTERNS.iter().find(|pat| pat.is_match(filename))
}

/// Run the cascade. The first matching pattern decides the outcome, even
/// when its captures turn out not to be a valid date.
pub fn guess_date_from_filename(filename: &str) -> Result<Timestamp, ExtractError> {
    for pat in PATTERNS {
        let Some(caps) = pat.regex.captures(filename) else {
            continue;
        };
        let caps = match pat.capture {
            Some(re) => re.captures(filename),
            None => Some(caps),
        };
        return match caps {
            Some(caps) => pat.decode(filename, &caps),
            None => Err(ExtractError::MalformedCapture {
                filename: filename.to_string(),
                pattern: pat.name,
            }),
        };
    }

    Err(ExtractError::NoPatternMatched {
        filename: filename.to_string(),
    })
}

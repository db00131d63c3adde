use chrono::format::{ParseError, ParseErrorKind};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

const ZONED_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y%m%dT%H%M%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%a %b %e %H:%M:%S %Y",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%Y%m%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%a, %d %b %Y",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateParse {
    Recognized,
    /// No known layout fits the text
    Unrecognized,
    /// A layout fits but the field values are impossible, e.g. month 13
    Invalid(String),
}

/// Permissive date check over a fixed set of common layouts
pub fn parse_date(text: &str) -> DateParse {
    let text = text.trim();
    let attempts = [
        DateTime::parse_from_rfc3339(text).map(drop),
        DateTime::parse_from_rfc2822(text).map(drop),
    ]
    .into_iter()
    .chain(ZONED_FORMATS.iter().map(|f| DateTime::parse_from_str(text, f).map(drop)))
    .chain(DATETIME_FORMATS.iter().map(|f| NaiveDateTime::parse_from_str(text, f).map(drop)))
    .chain(DATE_FORMATS.iter().map(|f| NaiveDate::parse_from_str(text, f).map(drop)));

    let mut invalid: Option<ParseError> = None;
    for attempt in attempts {
        match attempt {
            Ok(()) => return DateParse::Recognized,
            Err(e) if matches!(e.kind(), ParseErrorKind::OutOfRange | ParseErrorKind::Impossible) => {
                invalid.get_or_insert(e);
            }
            Err(_) => {}
        }
    }

    match invalid {
        Some(e) => DateParse::Invalid(e.to_string()),
        None => DateParse::Unrecognized,
    }
}

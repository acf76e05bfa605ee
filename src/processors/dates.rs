// photoprep/src/processors/dates.rs
//! Capture-date resolution for catalog entries.
//!
//! A date is taken from the first source that yields one:
//!
//! 1. EXIF `DateTimeOriginal`, parsed as `YYYY:MM:DD HH:MM:SS`
//! 2. the file's modification time, in local time
//! 3. the current local time
//!
//! Dates are rendered as `D/M/YYYY H:MM AM|PM` with no leading zeros on
//! day, month, or hour.

use super::metadata::MetadataProcessor;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use exif::{In, Tag, Value};
use std::path::Path;

const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";
const NATIVE_FORMAT: &str = "%-d/%-m/%Y %-I:%M %p";
const PADDED_FORMAT: &str = "%d/%m/%Y %I:%M %p";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DateStyle {
    /// Probe the native formatter at startup and fall back to trimming
    #[default]
    Auto,
    /// Padding-suppressing format directives
    Native,
    /// Zero-padded output with leading zeros trimmed afterwards
    Trimmed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormatter {
    Native,
    Trimmed,
}

impl DateFormatter {
    pub fn select(style: DateStyle) -> Self {
        match style {
            DateStyle::Auto => Self::detect(),
            DateStyle::Native => DateFormatter::Native,
            DateStyle::Trimmed => DateFormatter::Trimmed,
        }
    }

    /// Uses the native formatter only if it renders the probe instant
    /// without padding.
    pub fn detect() -> Self {
        let probe = NaiveDate::from_ymd_opt(2024, 3, 5).and_then(|d| d.and_hms_opt(9, 5, 0));

        match probe {
            Some(probe) if DateFormatter::Native.format(&probe) == "5/3/2024 9:05 AM" => {
                DateFormatter::Native
            }
            _ => {
                log::debug!("Native date formatting unavailable, trimming zeros instead");
                DateFormatter::Trimmed
            }
        }
    }

    pub fn format(&self, datetime: &NaiveDateTime) -> String {
        match self {
            DateFormatter::Native => datetime.format(NATIVE_FORMAT).to_string(),
            DateFormatter::Trimmed => trim_leading_zeros(&datetime.format(PADDED_FORMAT).to_string()),
        }
    }
}

// "05/03/2024 09:05 AM" -> "5/3/2024 9:05 AM"
fn trim_leading_zeros(padded: &str) -> String {
    padded
        .trim_start_matches('0')
        .replace("/0", "/")
        .replace(" 0", " ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource {
    Embedded,
    FileModified,
    Now,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDate {
    pub datetime: NaiveDateTime,
    pub source: DateSource,
}

pub struct DateResolver {
    formatter: DateFormatter,
    metadata: MetadataProcessor,
}

impl DateResolver {
    pub fn new(formatter: DateFormatter) -> Self {
        Self {
            formatter,
            metadata: MetadataProcessor::new(),
        }
    }

    pub fn resolve(&self, path: &Path) -> ResolvedDate {
        if let Some(datetime) = self.embedded_date(path) {
            return ResolvedDate {
                datetime,
                source: DateSource::Embedded,
            };
        }

        if let Some(datetime) = modified_date(path) {
            return ResolvedDate {
                datetime,
                source: DateSource::FileModified,
            };
        }

        ResolvedDate {
            datetime: Local::now().naive_local(),
            source: DateSource::Now,
        }
    }

    pub fn resolve_formatted(&self, path: &Path) -> String {
        let resolved = self.resolve(path);
        log::debug!("Date for {} from {:?}", path.display(), resolved.source);
        self.formatter.format(&resolved.datetime)
    }

    fn embedded_date(&self, path: &Path) -> Option<NaiveDateTime> {
        let exif = match self.metadata.read_metadata(path) {
            Ok(exif) => exif?,
            Err(e) => {
                log::debug!("Cannot read EXIF date from {}: {}", path.display(), e);
                return None;
            }
        };

        let field = exif.get_field(Tag::DateTimeOriginal, In::PRIMARY)?;
        let raw = match field.value {
            Value::Ascii(ref values) => values.first()?,
            _ => return None,
        };

        parse_exif_datetime(std::str::from_utf8(raw).ok()?)
    }
}

pub fn parse_exif_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim_end_matches('\0').trim();
    NaiveDateTime::parse_from_str(text, EXIF_DATE_FORMAT).ok()
}

fn modified_date(path: &Path) -> Option<NaiveDateTime> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    let datetime: DateTime<Local> = modified.into();
    Some(datetime.naive_local())
}

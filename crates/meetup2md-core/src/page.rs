//! Exported markdown pages.

use std::fmt;
use std::fs;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, TimeZone};
use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::event::EventRecord;
use crate::transform::{clean_description, event_venue};

/// Timestamp format used in page headers.
pub const HEADER_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// A markdown page with a Pelican-style metadata header.
///
/// Pages are derived from exactly one [`EventRecord`] and written once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedPage {
    pub title: String,
    /// When the page was generated, in wall-clock time.
    pub generated_at: NaiveDateTime,
    /// When the event starts, in wall-clock time.
    pub event_date: NaiveDateTime,
    pub event_location: String,
    /// The record's update timestamp in milliseconds.
    pub event_updated: i64,
    /// Cleaned markdown description.
    pub body: String,
}

impl ExportedPage {
    /// Builds a page for a record.
    ///
    /// The event date is rendered in the timezone of `generated_at`, so both
    /// header timestamps share the same wall clock.
    pub fn from_record<Tz: TimeZone>(
        record: &EventRecord,
        title: impl Into<String>,
        generated_at: &DateTime<Tz>,
    ) -> Self {
        let tz = generated_at.timezone();
        Self {
            title: title.into(),
            generated_at: generated_at.naive_local(),
            event_date: record.start_in(&tz).naive_local(),
            event_location: event_venue(record),
            event_updated: record.updated,
            body: clean_description(&record.description),
        }
    }

    /// Renders the page as it is written to disk.
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Writes the page to `path`, replacing any existing file.
    pub fn write_to(&self, path: &Path) -> CoreResult<()> {
        fs::write(path, self.render()).map_err(|e| CoreError::io(path, e))
    }
}

impl fmt::Display for ExportedPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Title: {}", self.title)?;
        writeln!(f, "Date: {}", self.generated_at.format(HEADER_DATETIME_FORMAT))?;
        writeln!(f, "event_date: {}", self.event_date.format(HEADER_DATETIME_FORMAT))?;
        writeln!(f, "event_location: {}", self.event_location)?;
        writeln!(f, "event_updated: {}", self.event_updated)?;
        writeln!(f)?;
        writeln!(f, "{}", self.body)
    }
}

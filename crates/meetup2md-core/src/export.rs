//! Export pipeline: filter events, print summaries, write pages.
//!
//! The pipeline never overwrites an existing page unless asked to. A page
//! that already exists is reported at error level and the run continues with
//! the next event.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Local, TimeZone, Utc};
use regex::Regex;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::error::{CoreError, CoreResult};
use crate::event::EventRecord;
use crate::page::ExportedPage;
use crate::transform::{derive_title, event_venue, output_filename};

/// Time format used in the per-event summary.
pub const SUMMARY_TIME_FORMAT: &str = "%A %B %d, %Y %I:%M %p";

/// Separator printed after every summary.
pub const SUMMARY_SEPARATOR: &str = "----";

/// Options controlling an export run.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Only events whose name matches are processed. `None` matches all.
    pub name_filter: Option<Regex>,
    /// Where pages are written. `None` prints summaries only.
    pub output_dir: Option<PathBuf>,
    /// Replace pages that already exist.
    pub overwrite: bool,
    /// Pattern removed from event names to build titles.
    pub title_cleanup: Option<Regex>,
}

impl ExportOptions {
    /// Builder method to set the name filter.
    pub fn with_name_filter(mut self, filter: Regex) -> Self {
        self.name_filter = Some(filter);
        self
    }

    /// Builder method to set the output directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Builder method to allow overwriting.
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Builder method to set the title cleanup pattern.
    pub fn with_title_cleanup(mut self, cleanup: Regex) -> Self {
        self.title_cleanup = Some(cleanup);
        self
    }

    fn matches(&self, name: &str) -> bool {
        self.name_filter
            .as_ref()
            .is_none_or(|filter| filter.is_match(name))
    }
}

/// Counters for a finished export run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    /// Events that passed the name filter.
    pub matched: usize,
    /// Pages written.
    pub written: usize,
    /// Pages left alone because they already existed.
    pub preserved: usize,
}

/// Filters, summarizes and writes events.
///
/// Times are rendered in `Tz`, the local timezone unless the pipeline is
/// built with [`ExportPipeline::with_timezone`].
#[derive(Debug, Clone)]
pub struct ExportPipeline<Tz: TimeZone = Local> {
    options: ExportOptions,
    tz: Tz,
}

impl ExportPipeline<Local> {
    /// Creates a pipeline rendering times in the local timezone.
    pub fn new(options: ExportOptions) -> Self {
        Self { options, tz: Local }
    }
}

impl<Tz: TimeZone> ExportPipeline<Tz>
where
    Tz::Offset: std::fmt::Display,
{
    /// Renders times in another timezone.
    pub fn with_timezone<T: TimeZone>(self, tz: T) -> ExportPipeline<T> {
        ExportPipeline {
            options: self.options,
            tz,
        }
    }

    /// Returns the options this pipeline runs with.
    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Processes every record in order.
    ///
    /// Summaries go to `out`. Records are handled one at a time; the first
    /// write failure aborts the run.
    pub fn run<W: Write>(&self, records: &[EventRecord], out: &mut W) -> CoreResult<ExportReport> {
        let mut report = ExportReport::default();

        for record in records {
            if !self.options.matches(&record.name) {
                debug!(event_id = %record.id, name = %record.name, "Event filtered out");
                continue;
            }
            report.matched += 1;
            self.process(record, out, &mut report)?;
        }

        info!(
            matched = report.matched,
            written = report.written,
            preserved = report.preserved,
            "Export finished"
        );
        Ok(report)
    }

    fn process<W: Write>(
        &self,
        record: &EventRecord,
        out: &mut W,
        report: &mut ExportReport,
    ) -> CoreResult<()> {
        let title = derive_title(&record.name, self.options.title_cleanup.as_ref());
        let start = record.start_in(&self.tz);

        writeln!(out, "Name: {}", record.name).map_err(summary_error)?;
        writeln!(out, "Title: {}", title).map_err(summary_error)?;
        writeln!(out, "Time: {}", start.format(SUMMARY_TIME_FORMAT)).map_err(summary_error)?;
        writeln!(out, "Venue: {}", event_venue(record)).map_err(summary_error)?;

        if let Some(dir) = &self.options.output_dir {
            let path = output_filename(&start, &title, dir);
            writeln!(out, " -> {}", path.display()).map_err(summary_error)?;
            self.write_page(record, &title, &path, report)?;
        }

        writeln!(out, "{}", SUMMARY_SEPARATOR).map_err(summary_error)?;
        Ok(())
    }

    fn write_page(
        &self,
        record: &EventRecord,
        title: &str,
        path: &Path,
        report: &mut ExportReport,
    ) -> CoreResult<()> {
        if path.exists() && !self.options.overwrite {
            error!("will not overwrite existing file: {}", path.display());
            report.preserved += 1;
            return Ok(());
        }

        let generated_at = Utc::now().with_timezone(&self.tz);
        ExportedPage::from_record(record, title, &generated_at).write_to(path)?;
        debug!(event_id = %record.id, path = %path.display(), "Page written");
        report.written += 1;
        Ok(())
    }
}

fn summary_error(source: std::io::Error) -> CoreError {
    CoreError::io("<summary output>", source)
}

//! Event export step.

use std::io::Write;
use std::path::PathBuf;

use tracing::debug;

use meetup2md_core::{ExportOptions, ExportPipeline, ExportReport, compile_pattern};
use meetup2md_providers::{EventQuery, EventSource};

use crate::cli::Cli;
use crate::config::CredentialStore;
use crate::error::{ClientError, ClientResult};

/// Default name filter: matches every event.
pub const DEFAULT_NAME_FILTER: &str = "";

/// Event options after merging the command line with `[events]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventOptions {
    pub group_name: String,
    pub name_filter: String,
    pub time_range: String,
    pub event_status: String,
    pub title_cleanup: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub overwrite: bool,
}

impl EventOptions {
    /// Resolves every option, command line first.
    ///
    /// # Errors
    ///
    /// - [`ClientError::OutputDirectoryMissing`] if the output directory is
    ///   set but does not exist
    /// - [`ClientError::MissingGroupName`] if no group is configured
    pub fn resolve(cli: &Cli, store: &CredentialStore) -> ClientResult<Self> {
        let output_dir = cli
            .output_dir
            .clone()
            .filter(|dir| !dir.as_os_str().is_empty())
            .or_else(|| store.option("output_dir", None).map(PathBuf::from));
        if let Some(dir) = &output_dir
            && !dir.is_dir()
        {
            return Err(ClientError::OutputDirectoryMissing(dir.clone()));
        }

        let group_name = store
            .option("group_name", cli.group_name.as_deref())
            .ok_or(ClientError::MissingGroupName)?;

        Ok(Self {
            group_name,
            name_filter: store.option_or("name_filter", cli.name_filter.as_deref(), DEFAULT_NAME_FILTER),
            time_range: store.option_or(
                "time_range",
                cli.time_range.as_deref(),
                EventQuery::DEFAULT_TIME_RANGE,
            ),
            event_status: store.option_or(
                "event_status",
                cli.event_status.as_deref(),
                EventQuery::DEFAULT_STATUS,
            ),
            title_cleanup: store.option("title_cleanup", cli.title_cleanup.as_deref()),
            output_dir,
            overwrite: cli.overwrite,
        })
    }

    /// Returns the API query for these options.
    pub fn query(&self) -> EventQuery {
        EventQuery::new(&self.group_name)
            .with_time_range(&self.time_range)
            .with_status(&self.event_status)
    }

    /// Compiles the patterns into export options.
    pub fn export_options(&self) -> ClientResult<ExportOptions> {
        let mut options = ExportOptions::default()
            .with_name_filter(compile_pattern("name filter", &self.name_filter)?)
            .with_overwrite(self.overwrite);
        if let Some(cleanup) = self.title_cleanup.as_deref() {
            options = options.with_title_cleanup(compile_pattern("title cleanup", cleanup)?);
        }
        if let Some(dir) = &self.output_dir {
            options = options.with_output_dir(dir);
        }
        Ok(options)
    }
}

/// Fetches the events and exports them, writing summaries to `out`.
///
/// Patterns are compiled before the API is contacted.
pub async fn export<S, W>(source: &S, options: &EventOptions, out: &mut W) -> ClientResult<ExportReport>
where
    S: EventSource + ?Sized,
    W: Write,
{
    let pipeline = ExportPipeline::new(options.export_options()?);

    debug!(
        source = source.name(),
        group = %options.group_name,
        time_range = %options.time_range,
        status = %options.event_status,
        "Fetching events"
    );
    let records = source.fetch_events(options.query()).await?;
    debug!("Fetched {} events", records.len());

    Ok(pipeline.run(&records, out)?)
}

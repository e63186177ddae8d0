//! Core types: event records, markdown rendering, page export

pub mod error;
pub mod event;
pub mod export;
pub mod markdown;
pub mod page;
pub mod tracing;
pub mod transform;

pub use error::{CoreError, CoreResult};
pub use event::{EventRecord, Venue};
pub use export::{ExportOptions, ExportPipeline, ExportReport};
pub use markdown::html_to_markdown;
pub use page::ExportedPage;
pub use tracing::{init_tracing, TracingConfig, TracingError};
pub use transform::{
    clean_description, compile_pattern, derive_title, event_venue, format_venue,
    output_filename, slugify,
};

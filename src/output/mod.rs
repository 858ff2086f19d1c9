//! Output formatting for query results

use clap::ValueEnum;

use crate::filter::ImageRef;
use crate::query::Params;

pub mod formatters;
pub mod json;
pub mod table;

pub use json::{ErrorBody, ImageResult, content_type, encode};
pub use table::{ImageRow, format_table};

/// Output format for CLI results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// JSON array, shaped like the query API response
    #[default]
    Json,
    /// Human-readable table
    Table,
}

/// Render ranked query results.
pub fn render(
    images: &[ImageRef],
    format: OutputFormat,
    params: &Params,
    state_tag: &str,
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Json => encode(
            images.iter().map(|image| &**image),
            params.pretty,
            params.callback.as_deref(),
        ),
        OutputFormat::Table => {
            let rows: Vec<ImageRow> = images
                .iter()
                .map(|image| ImageRow::new(image, state_tag))
                .collect();
            Ok(format_table(&rows))
        }
    }
}

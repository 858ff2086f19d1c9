//! Table output formatting

use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Rows},
};

use super::formatters::{format_creation_date, truncate};
use crate::image::Image;

/// Longest name shown before truncation.
const NAME_WIDTH: usize = 40;

/// One image as a table row
#[derive(Debug, Clone, Tabled)]
pub struct ImageRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "REGION")]
    pub region: String,
    #[tabled(rename = "OWNER")]
    pub owner_id: String,
    #[tabled(rename = "NAME")]
    pub name: String,
    #[tabled(rename = "STATE")]
    pub state: String,
    #[tabled(rename = "CREATED")]
    pub created: String,
}

impl ImageRow {
    /// Row for `image`, reading its state from `state_tag`.
    pub fn new(image: &Image, state_tag: &str) -> Self {
        Self {
            id: image.id().to_string(),
            region: image.region().to_string(),
            owner_id: image.owner_id().to_string(),
            name: truncate(image.name(), NAME_WIDTH),
            state: image.tag(state_tag).unwrap_or("-").to_string(),
            created: format_creation_date(image.creation_date()),
        }
    }
}

/// Format data as a table
pub fn format_table<T: Tabled>(data: &[T]) -> String {
    if data.is_empty() {
        return "No results found.".to_string();
    }

    let mut table = Table::new(data);
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));

    table.to_string()
}

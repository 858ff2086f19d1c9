//! JSON response encoding

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;

use crate::error::Error;
use crate::image::Image;

/// Content type of a plain JSON response
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Content type of a callback-wrapped response
pub const JAVASCRIPT_CONTENT_TYPE: &str = "application/javascript";

/// One image in a query response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageResult {
    pub id: String,
    pub region: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "virtualizationtype")]
    pub virtualization_type: String,
    #[serde(rename = "creationdate")]
    pub creation_date: String,
    pub tags: BTreeMap<String, String>,
}

impl From<&Image> for ImageResult {
    fn from(image: &Image) -> Self {
        Self {
            id: image.id().to_string(),
            region: image.region().to_string(),
            name: image.name().to_string(),
            description: image.description().to_string(),
            virtualization_type: image.virtualization_type().to_string(),
            creation_date: image.creation_date().to_string(),
            tags: image.tags().clone(),
        }
    }
}

/// Error body returned for rejected queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub id: String,
    pub message: String,
}

impl From<&Error> for ErrorBody {
    fn from(err: &Error) -> Self {
        let id = if err.is_client_error() {
            "bad_request"
        } else {
            "internal_error"
        };
        Self {
            id: id.to_string(),
            message: err.to_string(),
        }
    }
}

/// Encode ranked images as a JSON array.
///
/// `pretty` indents by one space. A `callback` wraps the compact array as
/// `callback(...);` and takes precedence over `pretty`.
pub fn encode<'a, I>(images: I, pretty: bool, callback: Option<&str>) -> Result<String, serde_json::Error>
where
    I: IntoIterator<Item = &'a Image>,
{
    let results: Vec<ImageResult> = images.into_iter().map(ImageResult::from).collect();

    match callback.filter(|name| !name.is_empty()) {
        Some(name) => Ok(format!("{}({});", name, serde_json::to_string(&results)?)),
        None if pretty => to_string_indented(&results),
        None => serde_json::to_string(&results),
    }
}

/// Content type matching [`encode`]'s output.
pub fn content_type(callback: Option<&str>) -> &'static str {
    match callback {
        Some(name) if !name.is_empty() => JAVASCRIPT_CONTENT_TYPE,
        _ => JSON_CONTENT_TYPE,
    }
}

fn to_string_indented<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let mut out = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b" "));
    value.serialize(&mut ser)?;
    // serde_json only writes valid UTF-8.
    Ok(String::from_utf8_lossy(&out).into_owned())
}

//! Page manifests: the JSON files listing pages to keep in the search index.
//!
//! A manifest is re-read in full on every trigger. Parsing is all-or-nothing:
//! the first schema violation aborts the read and no records are returned.

mod error;
mod page;
mod parser;

pub use error::ParseError;
pub use page::{MODIFIED_FORMAT, Page, parse_modified};
pub use parser::{parse_manifest, read_manifest};

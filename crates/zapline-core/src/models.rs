mod catalog;
mod label;
mod result;

pub use catalog::{CatalogEntry, CatalogRecord};
pub use label::{RawLabel, COUNTRY_ATTRIBUTES, EPG_ID_ATTRIBUTES};
pub use result::{MatchResult, Tier};

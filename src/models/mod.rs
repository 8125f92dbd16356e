//! Core data models for the location pipeline.

pub mod location;
pub mod record;
pub mod row;

pub use location::{Location, ParseLocationError, DEFAULT_PLACES};
pub use record::{LocationRecord, SourceType};
pub use row::{clean_row, display_value, tiploc_from_atco, NaptanRecord, OsmRecord, Row};

//! TIPLOC lookup table, waterfall fill and reports.

mod missing;
mod report;
mod stages;
mod table;

pub use missing::{fetch_reference_docs, reference_names, transport_for, NO_TRANSPORT};
pub use report::{
    build_missing_rows, unresolved_share, write_locations_report, write_missing_report,
    MissingRow,
};
pub use table::LocationTable;

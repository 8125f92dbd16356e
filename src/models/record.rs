//! Rows of the TIPLOC lookup table.

use std::fmt;

use super::Location;

/// Where a resolved location came from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceType {
    /// TIPLOC eastings and northings geography file
    Foi,
    /// BPLAN geography, clipped to the country boundary
    Bplan,
    /// NaPTAN stop registry extract
    Naptan,
    /// OpenStreetMap extract
    Osm,
    /// Manual TIPLOC to stop-area map, joined to NaPTAN
    NaptanMap,
    /// Copied from another TIPLOC in the table
    OverlapA,
    /// Copied from the unclipped BPLAN geography
    OverlapB,
    /// Label given by a manual override row
    Other(String),
}

impl SourceType {
    pub fn as_str(&self) -> &str {
        match self {
            SourceType::Foi => "FOI",
            SourceType::Bplan => "BPLAN",
            SourceType::Naptan => "NaPTAN",
            SourceType::Osm => "OSM",
            SourceType::NaptanMap => "NaPTAN_MAP",
            SourceType::OverlapA => "overlapA",
            SourceType::OverlapB => "overlapB",
            SourceType::Other(label) => label,
        }
    }
}

impl From<&str> for SourceType {
    fn from(label: &str) -> Self {
        match label {
            "FOI" => SourceType::Foi,
            "BPLAN" => SourceType::Bplan,
            "NaPTAN" => SourceType::Naptan,
            "OSM" => SourceType::Osm,
            "NaPTAN_MAP" => SourceType::NaptanMap,
            "overlapA" => SourceType::OverlapA,
            "overlapB" => SourceType::OverlapB,
            other => SourceType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One TIPLOC with whatever has been resolved for it so far
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationRecord {
    pub tiploc: String,
    pub source: Option<SourceType>,
    /// `"lat,lon"` text as found in the source
    pub location: Option<String>,
    pub description: Option<String>,
}

impl LocationRecord {
    pub fn new(tiploc: &str) -> Self {
        Self {
            tiploc: tiploc.to_string(),
            ..Self::default()
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.location.is_some()
    }

    /// OpenStreetMap URL for a resolved record with a parseable location
    pub fn map_url(&self) -> Option<String> {
        let location: Location = self.location.as_deref()?.parse().ok()?;
        Some(location.map_url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_labels_round_trip_known_names() {
        for label in ["FOI", "BPLAN", "NaPTAN", "OSM", "NaPTAN_MAP", "overlapA", "overlapB"] {
            assert_eq!(SourceType::from(label).as_str(), label);
        }
        assert_eq!(
            SourceType::from("wikipedia"),
            SourceType::Other("wikipedia".into())
        );
    }

    #[test]
    fn test_map_url_needs_location() {
        let mut record = LocationRecord::new("EUSTON");
        assert_eq!(record.map_url(), None);
        record.location = Some("51.528,-0.1335".into());
        assert_eq!(
            record.map_url().as_deref(),
            Some("https://www.openstreetmap.org/#map=19/51.528/-0.1335")
        );
    }
}

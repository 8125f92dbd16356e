//! Geography reference files: FOI TIPLOC points and BPLAN locations.

use std::path::Path;

use anyhow::Result;
use geo::Point;

use super::{non_empty, Candidate};
use crate::models::{display_value, Row, SourceType, DEFAULT_PLACES};
use crate::spatial::{location_string, read_feature_collection, BoundaryIndex};

fn text(properties: &Row, key: &str) -> Option<String> {
    non_empty(properties.get(key).map(display_value))
}

/// Read the FOI file (properties `TIPLOC` and `NAME`)
pub fn read_foi(path: &Path) -> Result<Vec<Candidate>> {
    let features = read_feature_collection(path)?;
    Ok(foi_candidates(
        features
            .into_iter()
            .map(|f| (f.properties, f.centroid))
            .collect(),
    ))
}

pub fn foi_candidates(features: Vec<(Row, Option<Point<f64>>)>) -> Vec<Candidate> {
    features
        .into_iter()
        .filter_map(|(properties, centroid)| {
            Some(Candidate {
                tiploc: text(&properties, "TIPLOC")?,
                source: SourceType::Foi,
                description: text(&properties, "NAME"),
                location: centroid.map(|p| location_string(p, DEFAULT_PLACES)),
            })
        })
        .collect()
}

/// One BPLAN location with its centroid
#[derive(Debug, Clone)]
pub struct BplanRow {
    pub tiploc: String,
    pub description: Option<String>,
    pub point: Option<Point<f64>>,
}

/// The full BPLAN geography. The merge consults a clipped view; the
/// overlap step falls back to the unclipped rows.
#[derive(Debug, Clone, Default)]
pub struct BplanTable {
    pub rows: Vec<BplanRow>,
}

impl BplanTable {
    /// Read the BPLAN file (properties `Location Code` and `Location name`)
    pub fn load(path: &Path) -> Result<Self> {
        let features = read_feature_collection(path)?;
        let rows = features
            .into_iter()
            .filter_map(|f| {
                Some(BplanRow {
                    tiploc: text(&f.properties, "Location Code")?,
                    description: text(&f.properties, "Location name"),
                    point: f.centroid,
                })
            })
            .collect();
        Ok(Self { rows })
    }

    /// Candidates whose point lies inside `boundary`
    pub fn clipped_candidates(&self, boundary: &BoundaryIndex) -> Vec<Candidate> {
        self.rows
            .iter()
            .filter_map(|row| {
                let point = row.point?;
                if !boundary.contains(point.x(), point.y()) {
                    return None;
                }
                Some(Candidate {
                    tiploc: row.tiploc.clone(),
                    source: SourceType::Bplan,
                    description: row.description.clone(),
                    location: Some(location_string(point, DEFAULT_PLACES)),
                })
            })
            .collect()
    }

    /// Location of the first unclipped row for `tiploc`
    pub fn location_of(&self, tiploc: &str) -> Option<String> {
        self.rows
            .iter()
            .find(|row| row.tiploc == tiploc)
            .and_then(|row| row.point)
            .map(|p| location_string(p, DEFAULT_PLACES))
    }
}

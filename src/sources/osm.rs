//! OpenStreetMap extract (`OSM-All.jsonl`).

use std::collections::HashSet;

use super::Candidate;
use crate::models::{OsmRecord, SourceType};

/// Rows that carry a TIPLOC, first row per TIPLOC only
pub fn osm_candidates(records: &[OsmRecord]) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter_map(|r| {
            let tiploc = r.tiploc.clone()?;
            if !seen.insert(tiploc.clone()) {
                return None;
            }
            Some(Candidate {
                tiploc,
                source: SourceType::Osm,
                description: r.name.clone(),
                location: r.location.clone(),
            })
        })
        .collect()
}

//! The TIPLOC lookup table and its priority-ordered fill.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::models::{LocationRecord, SourceType};
use crate::sources::{non_empty, BplanTable, Candidate, OverlapRow, OverrideRow};

/// TIPLOCs in facet order, each with its resolved location (if any)
#[derive(Debug, Clone, Default)]
pub struct LocationTable {
    records: Vec<LocationRecord>,
    index: HashMap<String, usize>,
}

impl LocationTable {
    /// One empty record per distinct key, in the given order
    pub fn new<I: IntoIterator<Item = String>>(keys: I) -> Self {
        let mut table = Self::default();
        for key in keys {
            table.entry(&key);
        }
        table
    }

    fn entry(&mut self, tiploc: &str) -> &mut LocationRecord {
        let idx = match self.index.get(tiploc) {
            Some(&idx) => idx,
            None => {
                self.records.push(LocationRecord::new(tiploc));
                self.index.insert(tiploc.to_string(), self.records.len() - 1);
                self.records.len() - 1
            }
        };
        &mut self.records[idx]
    }

    pub fn get(&self, tiploc: &str) -> Option<&LocationRecord> {
        self.index.get(tiploc).map(|&idx| &self.records[idx])
    }

    pub fn records(&self) -> &[LocationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records with a location
    pub fn found(&self) -> usize {
        self.records.iter().filter(|r| r.is_resolved()).count()
    }

    pub fn missing(&self) -> usize {
        self.len() - self.found()
    }

    /// Records still without a location, in table order
    pub fn unresolved(&self) -> impl Iterator<Item = &LocationRecord> {
        self.records.iter().filter(|r| !r.is_resolved())
    }

    pub fn log_progress(&self, stage: &str) {
        info!("TIPLOCs: {} of {} ({})", self.missing(), self.len(), stage);
    }

    /// Seed descriptions from reference names, first name per TIPLOC
    pub fn set_names(&mut self, names: &[(String, String)]) {
        let mut seen = std::collections::HashSet::new();
        for (tiploc, name) in names {
            if !seen.insert(tiploc.as_str()) {
                continue;
            }
            if let Some(&idx) = self.index.get(tiploc) {
                self.records[idx].description = Some(name.clone());
            }
        }
    }

    /// Fill records that have no location yet. For each TIPLOC the first
    /// candidate carrying a location wins and sets source, description and
    /// location together. Returns how many records were filled.
    pub fn fill_missing(&mut self, candidates: &[Candidate]) -> usize {
        let mut filled = 0;
        for candidate in candidates {
            let Some(location) = &candidate.location else {
                continue;
            };
            let Some(&idx) = self.index.get(&candidate.tiploc) else {
                continue;
            };
            let record = &mut self.records[idx];
            if record.is_resolved() {
                continue;
            }
            record.source = Some(candidate.source.clone());
            record.description = candidate.description.clone();
            record.location = Some(location.clone());
            filled += 1;
        }
        filled
    }

    /// Apply manual overrides unconditionally, adding unknown TIPLOCs
    pub fn apply_overrides(&mut self, rows: &[OverrideRow]) -> usize {
        for row in rows {
            let record = self.entry(row.tiploc.trim());
            record.source = non_empty(row.source.clone()).map(|s| SourceType::from(s.as_str()));
            record.description = non_empty(row.description.clone());
            record.location = non_empty(row.location.clone());
        }
        rows.len()
    }

    /// Give each overlap TIPLOC the location of its mapped TIPLOC.
    ///
    /// A mapped TIPLOC in the table lends its current location (`overlapA`);
    /// otherwise the unclipped BPLAN location is used (`overlapB`).
    pub fn apply_overlaps(&mut self, rows: &[OverlapRow], bplan: &BplanTable) -> usize {
        let mut applied = 0;
        for row in rows {
            let Some(mapped) = non_empty(row.mapped_tiploc.clone()) else {
                continue;
            };
            let lent = self.get(&mapped).map(|r| r.location.clone());

            let record = self.entry(row.tiploc.trim());
            record.description = non_empty(row.description.clone());
            match lent {
                Some(location) => {
                    record.source = Some(SourceType::OverlapA);
                    record.location = location;
                }
                None => {
                    record.source = Some(SourceType::OverlapB);
                    match bplan.location_of(&mapped) {
                        Some(location) => record.location = Some(location),
                        None => warn!(
                            "{}: mapped TIPLOC {} is neither in the table nor in BPLAN",
                            row.tiploc, mapped
                        ),
                    }
                }
            }
            applied += 1;
        }
        applied
    }

    /// Fill descriptions still missing from reference names
    pub fn fill_descriptions(&mut self, names: &HashMap<String, String>) {
        for record in self.records.iter_mut().filter(|r| r.description.is_none()) {
            if let Some(name) = names.get(&record.tiploc) {
                record.description = Some(name.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::BplanRow;
    use geo::Point;

    fn candidate(tiploc: &str, source: SourceType, location: Option<&str>) -> Candidate {
        Candidate {
            tiploc: tiploc.into(),
            source,
            description: Some(format!("{} desc", tiploc)),
            location: location.map(String::from),
        }
    }

    fn table() -> LocationTable {
        LocationTable::new(["EUSTON", "CREWE", "BLTCHLY", "EUSTON"].map(String::from))
    }

    #[test]
    fn test_new_dedupes_and_keeps_order() {
        let t = table();
        let keys: Vec<&str> = t.records().iter().map(|r| r.tiploc.as_str()).collect();
        assert_eq!(keys, vec!["EUSTON", "CREWE", "BLTCHLY"]);
        assert_eq!(t.missing(), 3);
    }

    #[test]
    fn test_waterfall_priority() {
        let mut t = table();
        let first = t.fill_missing(&[
            candidate("EUSTON", SourceType::Foi, Some("51.528,-0.1335")),
            candidate("CREWE", SourceType::Foi, None),
            candidate("UNKNOWN", SourceType::Foi, Some("0.0,0.0")),
        ]);
        assert_eq!(first, 1);

        let second = t.fill_missing(&[
            candidate("EUSTON", SourceType::Naptan, Some("1.0,1.0")),
            candidate("CREWE", SourceType::Naptan, Some("53.09,-2.43")),
            candidate("CREWE", SourceType::Naptan, Some("9.0,9.0")),
        ]);
        assert_eq!(second, 1);

        let euston = t.get("EUSTON").unwrap();
        assert_eq!(euston.source, Some(SourceType::Foi));
        assert_eq!(euston.location.as_deref(), Some("51.528,-0.1335"));

        let crewe = t.get("CREWE").unwrap();
        assert_eq!(crewe.source, Some(SourceType::Naptan));
        assert_eq!(crewe.location.as_deref(), Some("53.09,-2.43"));
        assert_eq!(crewe.description.as_deref(), Some("CREWE desc"));

        assert!(t.get("UNKNOWN").is_none());
        assert_eq!(t.found(), 2);
        assert_eq!(t.unresolved().count(), 1);
    }

    #[test]
    fn test_overrides_replace_and_insert() {
        let mut t = table();
        t.fill_missing(&[candidate("EUSTON", SourceType::Foi, Some("51.528,-0.1335"))]);
        t.apply_overrides(&[
            OverrideRow {
                tiploc: "EUSTON".into(),
                source: Some("wikipedia".into()),
                description: Some("London Euston".into()),
                location: Some("51.5282,-0.1337".into()),
            },
            OverrideRow {
                tiploc: "NEWCODE".into(),
                source: None,
                description: None,
                location: Some("50.0,-1.0".into()),
            },
        ]);
        let euston = t.get("EUSTON").unwrap();
        assert_eq!(euston.source, Some(SourceType::Other("wikipedia".into())));
        assert_eq!(euston.location.as_deref(), Some("51.5282,-0.1337"));
        assert_eq!(t.get("NEWCODE").unwrap().location.as_deref(), Some("50.0,-1.0"));
        assert_eq!(t.len(), 4);
    }

    #[test]
    fn test_overlaps() {
        let mut t = table();
        t.fill_missing(&[candidate("EUSTON", SourceType::Foi, Some("51.528,-0.1335"))]);
        let bplan = BplanTable {
            rows: vec![BplanRow {
                tiploc: "MILTONK".into(),
                description: None,
                point: Some(Point::new(-0.774, 52.034)),
            }],
        };
        let rows = vec![
            OverlapRow {
                tiploc: "CREWE".into(),
                description: Some("Crewe (shared)".into()),
                mapped_tiploc: Some("EUSTON".into()),
            },
            OverlapRow {
                tiploc: "BLTCHLY".into(),
                description: Some("Bletchley".into()),
                mapped_tiploc: Some("MILTONK".into()),
            },
        ];
        assert_eq!(t.apply_overlaps(&rows, &bplan), 2);

        let crewe = t.get("CREWE").unwrap();
        assert_eq!(crewe.source, Some(SourceType::OverlapA));
        assert_eq!(crewe.location.as_deref(), Some("51.528,-0.1335"));
        assert_eq!(crewe.description.as_deref(), Some("Crewe (shared)"));

        let bletchley = t.get("BLTCHLY").unwrap();
        assert_eq!(bletchley.source, Some(SourceType::OverlapB));
        assert_eq!(bletchley.location.as_deref(), Some("52.034,-0.774"));
    }

    #[test]
    fn test_names_and_description_fill() {
        let mut t = table();
        t.set_names(&[
            ("EUSTON".into(), "EUSTON LONDON".into()),
            ("EUSTON".into(), "SECOND".into()),
        ]);
        assert_eq!(
            t.get("EUSTON").unwrap().description.as_deref(),
            Some("EUSTON LONDON")
        );

        let names: HashMap<String, String> =
            [("CREWE".to_string(), "CREWE".to_string())].into_iter().collect();
        t.fill_descriptions(&names);
        assert_eq!(t.get("CREWE").unwrap().description.as_deref(), Some("CREWE"));
        assert_eq!(t.get("BLTCHLY").unwrap().description, None);
    }
}

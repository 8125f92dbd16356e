//! Hand-maintained mapping files under `data/`.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use serde::Deserialize;

use super::{non_empty, read_tsv, Candidate};
use crate::models::SourceType;

/// `data/TIPLOC-map.tsv`: TIPLOC to NaPTAN stop area
#[derive(Debug, Clone, Deserialize)]
pub struct TiplocMapRow {
    #[serde(rename = "TIPLOC", default)]
    pub tiploc: Option<String>,
    #[serde(rename = "StopAreaCode", default)]
    pub stop_area_code: Option<String>,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
}

/// `data/wikipedia-map.tsv`: locations applied unconditionally
#[derive(Debug, Clone, Deserialize)]
pub struct OverrideRow {
    #[serde(rename = "TIPLOC")]
    pub tiploc: String,
    #[serde(rename = "type", default)]
    pub source: Option<String>,
    #[serde(rename = "Description", default)]
    pub description: Option<String>,
    #[serde(rename = "_location_", default)]
    pub location: Option<String>,
}

/// `data/overlap-map.tsv`: TIPLOCs sharing another TIPLOC's location
#[derive(Debug, Clone, Deserialize)]
pub struct OverlapRow {
    #[serde(rename = "TIPLOC")]
    pub tiploc: String,
    #[serde(rename = "Description", default)]
    pub description: Option<String>,
    #[serde(rename = "mapped TIPLOC", default)]
    pub mapped_tiploc: Option<String>,
}

pub fn read_tiploc_map(path: &Path) -> Result<Vec<TiplocMapRow>> {
    read_tsv(path)
}

pub fn read_overrides(path: &Path) -> Result<Vec<OverrideRow>> {
    Ok(read_tsv::<OverrideRow>(path)?
        .into_iter()
        .filter(|r| !r.tiploc.trim().is_empty())
        .collect())
}

/// Overlap rows that name a mapped TIPLOC
pub fn read_overlaps(path: &Path) -> Result<Vec<OverlapRow>> {
    Ok(read_tsv::<OverlapRow>(path)?
        .into_iter()
        .filter(|r| non_empty(r.mapped_tiploc.clone()).is_some())
        .collect())
}

/// Map rows with a TIPLOC, located through their stop area's NaPTAN entry
pub fn tiploc_map_candidates(
    rows: &[TiplocMapRow],
    locations_by_atco: &HashMap<String, String>,
) -> Vec<Candidate> {
    rows.iter()
        .filter_map(|row| {
            let tiploc = non_empty(row.tiploc.clone())?;
            let location = row
                .stop_area_code
                .as_ref()
                .and_then(|code| locations_by_atco.get(code.trim()))
                .cloned();
            Some(Candidate {
                tiploc,
                source: SourceType::NaptanMap,
                description: non_empty(row.name.clone()),
                location,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_tiploc_map_joins_naptan() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "TIPLOC\tStopAreaCode\tName").unwrap();
        writeln!(file, "CREWSJN\t910GCREWE\tCrewe South Junction").unwrap();
        writeln!(file, "\t910GCREWE\tNo code").unwrap();
        writeln!(file, "LOSTJN\t910GLOST\tLost Junction").unwrap();
        let rows = read_tiploc_map(file.path()).unwrap();

        let by_atco: HashMap<String, String> =
            [("910GCREWE".to_string(), "53.0897,-2.4331".to_string())]
                .into_iter()
                .collect();
        let candidates = tiploc_map_candidates(&rows, &by_atco);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].tiploc, "CREWSJN");
        assert_eq!(candidates[0].location.as_deref(), Some("53.0897,-2.4331"));
        assert_eq!(candidates[0].source, SourceType::NaptanMap);
        assert_eq!(candidates[1].location, None);
    }

    #[test]
    fn test_overlaps_need_mapped_tiploc() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "TIPLOC\tDescription\tmapped TIPLOC").unwrap();
        writeln!(file, "EUSTON1\tEuston Platform 1\tEUSTON").unwrap();
        writeln!(file, "ORPHAN\tNothing mapped\t").unwrap();
        let rows = read_overlaps(file.path()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].mapped_tiploc.as_deref(), Some("EUSTON"));
    }

    #[test]
    fn test_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "TIPLOC\ttype\tDescription\t_location_").unwrap();
        writeln!(file, "BLTCHLY\twikipedia\tBletchley\t51.9955,-0.7362").unwrap();
        let rows = read_overrides(file.path()).unwrap();
        assert_eq!(rows[0].source.as_deref(), Some("wikipedia"));
        assert_eq!(rows[0].location.as_deref(), Some("51.9955,-0.7362"));
    }
}

//! Readers for the ranked reference datasets consulted by the merge.
//!
//! Each reader turns its file into [`Candidate`] rows in file order; the
//! merge decides which candidate wins.

mod geography;
mod manual;
mod naptan;
mod osm;

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use flate2::read::GzDecoder;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::models::SourceType;

pub use geography::{foi_candidates, read_foi, BplanRow, BplanTable};
pub use manual::{
    read_overlaps, read_overrides, read_tiploc_map, tiploc_map_candidates, OverlapRow,
    OverrideRow, TiplocMapRow,
};
pub use naptan::NaptanTable;
pub use osm::osm_candidates;

/// A proposed location for a TIPLOC from one source
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub tiploc: String,
    pub source: SourceType,
    pub description: Option<String>,
    pub location: Option<String>,
}

/// Open a file for reading, decompressing `.gz` files on the fly
pub fn open_reader(path: &Path) -> Result<Box<dyn Read>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let reader: Box<dyn Read> = if path.extension().map_or(false, |e| e == "gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };
    Ok(reader)
}

/// Read line-delimited JSON, skipping blank lines
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let reader = BufReader::new(open_reader(path)?);
    let mut rows = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: invalid JSON row", path.display(), idx + 1))?;
        rows.push(row);
    }
    info!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Read a tab-separated file with a header row
pub fn read_tsv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(open_reader(path)?);

    let mut rows = Vec::new();
    for (idx, result) in csv_reader.deserialize().enumerate() {
        let row: T =
            result.with_context(|| format!("{}: bad row {}", path.display(), idx + 2))?;
        rows.push(row);
    }
    info!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Trimmed text, `None` when empty
pub(crate) fn non_empty(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use serde::Deserialize;
    use std::io::Write;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Pair {
        a: String,
        b: Option<String>,
    }

    #[test]
    fn test_read_jsonl_gz() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.jsonl.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder
            .write_all(b"{\"a\": \"x\", \"b\": \"y\"}\n\n{\"a\": \"z\"}")
            .unwrap();
        encoder.finish().unwrap();

        let rows: Vec<Pair> = read_jsonl(&path).unwrap();
        assert_eq!(
            rows,
            vec![
                Pair { a: "x".into(), b: Some("y".into()) },
                Pair { a: "z".into(), b: None },
            ]
        );
    }

    #[test]
    fn test_read_tsv_empty_fields_are_none() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "a\tb\tignored").unwrap();
        writeln!(file, "x\t\t1").unwrap();
        writeln!(file, "y\tz\t2").unwrap();
        let rows: Vec<Pair> = read_tsv(file.path()).unwrap();
        assert_eq!(rows[0], Pair { a: "x".into(), b: None });
        assert_eq!(rows[1], Pair { a: "y".into(), b: Some("z".into()) });
    }
}

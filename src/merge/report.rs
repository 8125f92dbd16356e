//! TSV reports of resolved and unresolved TIPLOCs.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use csv::WriterBuilder;
use tracing::info;

use super::LocationTable;
use crate::models::{display_value, Row};

fn tsv_writer(path: &Path) -> Result<csv::Writer<std::fs::File>> {
    WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))
}

/// Write `TIPLOC`, `type`, `_location_` and `Description` for every record
pub fn write_locations_report(table: &LocationTable, path: &Path) -> Result<()> {
    let mut writer = tsv_writer(path)?;
    writer.write_record(["TIPLOC", "type", "_location_", "Description"])?;
    for record in table.records() {
        let source = record.source.as_ref().map(|s| s.as_str()).unwrap_or("");
        writer.write_record([
            record.tiploc.as_str(),
            source,
            record.location.as_deref().unwrap_or(""),
            record.description.as_deref().unwrap_or(""),
        ])?;
    }
    writer.flush()?;
    info!("Wrote {} locations to {}", table.len(), path.display());
    Ok(())
}

/// One reference document of an unresolved TIPLOC
#[derive(Debug, Clone, PartialEq)]
pub struct MissingRow {
    pub tiploc: String,
    /// Remaining reference fields, in document order
    pub fields: Row,
    /// Number of timetable paths calling at the TIPLOC
    pub count: Option<u64>,
    pub transport: String,
}

impl MissingRow {
    /// First four characters of the TIPLOC, for grouping nearby codes
    pub fn key(&self) -> String {
        self.tiploc.chars().take(4).collect()
    }
}

/// Join reference docs with path counts and transport, busiest first
pub fn build_missing_rows(
    docs: Vec<Row>,
    counts: &HashMap<String, u64>,
    transport: &HashMap<String, String>,
) -> Vec<MissingRow> {
    let mut rows: Vec<MissingRow> = docs
        .into_iter()
        .filter_map(|mut doc| {
            let tiploc = doc.remove("TIPLOC").map(|v| display_value(&v))?;
            doc.remove("_version_");
            Some(MissingRow {
                count: counts.get(&tiploc).copied(),
                transport: transport.get(&tiploc).cloned().unwrap_or_default(),
                tiploc,
                fields: doc,
            })
        })
        .collect();
    rows.sort_by(|a, b| b.count.unwrap_or(0).cmp(&a.count.unwrap_or(0)));
    rows
}

/// Write the missing report. Reference columns are taken in order of first
/// appearance across all rows.
pub fn write_missing_report(rows: &[MissingRow], path: &Path) -> Result<()> {
    let mut columns: Vec<&str> = Vec::new();
    for row in rows {
        for key in row.fields.keys() {
            if !columns.contains(&key.as_str()) {
                columns.push(key);
            }
        }
    }

    let mut writer = tsv_writer(path)?;
    let mut header = vec!["TIPLOC"];
    header.extend(&columns);
    header.extend(["count", "Transport", "k"]);
    writer.write_record(&header)?;

    for row in rows {
        let mut record = vec![row.tiploc.clone()];
        record.extend(
            columns
                .iter()
                .map(|c| row.fields.get(*c).map(display_value).unwrap_or_default()),
        );
        record.push(row.count.map(|c| c.to_string()).unwrap_or_default());
        record.push(row.transport.clone());
        record.push(row.key());
        writer.write_record(&record)?;
    }
    writer.flush()?;
    info!("Wrote {} missing rows to {}", rows.len(), path.display());
    Ok(())
}

/// Share of path calls made at unresolved TIPLOCs
pub fn unresolved_share(table: &LocationTable, counts: &HashMap<String, u64>) -> f64 {
    let total: u64 = counts.values().sum();
    if total == 0 {
        return 0.0;
    }
    let unresolved: u64 = table
        .unresolved()
        .filter_map(|r| counts.get(&r.tiploc))
        .sum();
    unresolved as f64 / total as f64
}

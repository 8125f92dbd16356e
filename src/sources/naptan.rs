//! NaPTAN stop registry extract (`NaPTAN-All.jsonl`).

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;

use super::{read_jsonl, Candidate};
use crate::models::{NaptanRecord, SourceType};

#[derive(Debug, Clone, Default)]
pub struct NaptanTable {
    pub records: Vec<NaptanRecord>,
}

impl NaptanTable {
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self {
            records: read_jsonl(path)?,
        })
    }

    /// Stop points and areas that carry a TIPLOC
    pub fn candidates(&self) -> Vec<Candidate> {
        self.records
            .iter()
            .filter_map(|r| {
                Some(Candidate {
                    tiploc: r.tiploc.clone()?,
                    source: SourceType::Naptan,
                    description: r.name.clone(),
                    location: r.location.clone(),
                })
            })
            .collect()
    }

    /// `AtcoCode` to location, keeping the first located row per code
    pub fn locations_by_atco(&self) -> HashMap<String, String> {
        let mut by_atco = HashMap::new();
        for record in &self.records {
            if let (Some(atco), Some(location)) = (&record.atco_code, &record.location) {
                by_atco
                    .entry(atco.clone())
                    .or_insert_with(|| location.clone());
            }
        }
        by_atco
    }
}

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::Level;

use crate::solr::{SolrClient, DEFAULT_PORT};

/// `INFO`, or `DEBUG` when `--verbose` is given
pub fn log_level(verbose: bool) -> Level {
    if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    }
}

/// Solr connection flags shared by every binary that talks to Solr
#[derive(clap::Args, Debug, Clone)]
pub struct SolrArgs {
    /// Solr host
    #[arg(long, env = "SOLRHOST", default_value = "localhost")]
    pub solr_host: String,

    /// Solr port
    #[arg(long, env = "SOLRPORT", default_value_t = DEFAULT_PORT)]
    pub solr_port: u16,
}

impl SolrArgs {
    pub fn connect(&self) -> Result<SolrClient> {
        SolrClient::new(&self.solr_host, self.solr_port).context("Invalid Solr address")
    }
}

/// Inputs, outputs and collection names for a `locate` run.
///
/// Every field has a default, so an empty file (or no file) is valid.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct LocateConfig {
    pub collections: CollectionConfig,
    pub inputs: InputConfig,
    pub outputs: OutputConfig,
    pub boundary: BoundaryConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CollectionConfig {
    /// Timetable paths, faceted by TIPLOC
    pub path: String,
    /// TIPLOC reference records
    pub reference: String,
    /// Basic schedules, holding headcodes
    pub schedule: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct InputConfig {
    pub foi: PathBuf,
    pub bplan: PathBuf,
    pub naptan: PathBuf,
    pub osm: PathBuf,
    pub tiploc_map: PathBuf,
    pub overrides: PathBuf,
    pub overlaps: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub locations: PathBuf,
    pub missing: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BoundaryConfig {
    pub shapefile: PathBuf,
    pub field: String,
    pub value: String,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            path: "PATH".into(),
            reference: "TR".into(),
            schedule: "BS".into(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            foi: "TIPLOC_Eastings_and_Northings.json".into(),
            bplan: "Geography-LOC.json".into(),
            naptan: "NaPTAN-All.jsonl".into(),
            osm: "OSM-All.jsonl".into(),
            tiploc_map: "data/TIPLOC-map.tsv".into(),
            overrides: "data/wikipedia-map.tsv".into(),
            overlaps: "data/overlap-map.tsv".into(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            locations: "locations-report.tsv".into(),
            missing: "missing-report.tsv".into(),
        }
    }
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            shapefile: "shape-file/ne_110m_admin_0_countries_lakes.shp".into(),
            field: "ISO_A2".into(),
            value: "GB".into(),
        }
    }
}

impl LocateConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: LocateConfig = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(clap::Parser)]
    struct Cli {
        #[command(flatten)]
        solr: SolrArgs,
    }

    #[test]
    fn test_log_level() {
        assert_eq!(log_level(false), Level::INFO);
        assert_eq!(log_level(true), Level::DEBUG);
    }

    #[test]
    fn test_solr_args() {
        use clap::Parser;
        let cli = Cli::parse_from(["prog", "--solr-host", "solr.internal", "--solr-port", "8984"]);
        assert_eq!(cli.solr.solr_host, "solr.internal");
        assert_eq!(cli.solr.solr_port, 8984);
        let client = cli.solr.connect().unwrap();
        assert_eq!(client.base_url().as_str(), "http://solr.internal:8984/");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: LocateConfig = toml::from_str("").unwrap();
        assert_eq!(config.collections.path, "PATH");
        assert_eq!(config.inputs.naptan, PathBuf::from("NaPTAN-All.jsonl"));
        assert_eq!(config.boundary.value, "GB");
    }

    #[test]
    fn test_partial_override() {
        let config: LocateConfig = toml::from_str(
            r#"
[collections]
path = "PATH2"

[outputs]
missing = "out/missing.tsv"
"#,
        )
        .unwrap();
        assert_eq!(config.collections.path, "PATH2");
        assert_eq!(config.collections.reference, "TR");
        assert_eq!(config.outputs.missing, PathBuf::from("out/missing.tsv"));
        assert_eq!(
            config.outputs.locations,
            PathBuf::from("locations-report.tsv")
        );
    }
}

//! Resolve a location for every timetabled TIPLOC.
//!
//! Sources are consulted in rank order; a TIPLOC keeps the first location
//! found. Manual overrides and overlaps are applied last.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

use tiploc_mapper::config::{log_level, LocateConfig, SolrArgs};
use tiploc_mapper::merge::{
    build_missing_rows, fetch_reference_docs, reference_names, transport_for, unresolved_share,
    write_locations_report, write_missing_report, LocationTable,
};
use tiploc_mapper::solr::{QueryParams, SolrClient};
use tiploc_mapper::spatial::{load_shapefile_boundaries, BoundaryIndex};

#[derive(Parser, Debug)]
#[command(name = "locate")]
#[command(about = "Resolve TIPLOC locations from ranked reference sources")]
struct Args {
    #[command(flatten)]
    solr: SolrArgs,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    /// TOML file overriding collection names and file paths
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log the map URL of one TIPLOC once resolved
    #[arg(long)]
    show: Option<String>,
}

const NAME_FIELD: &str = "TPS_Description";

/// Every reference name, first per TIPLOC
async fn load_names(
    client: &SolrClient,
    reference: &str,
) -> Result<(Vec<(String, String)>, HashMap<String, String>)> {
    let docs = client
        .get_query(
            reference,
            QueryParams::new("*:*").fl(&format!("TIPLOC,{}", NAME_FIELD)),
            None,
        )
        .await
        .with_context(|| format!("Failed to read names from {}", reference))?;
    let names = reference_names(&docs, NAME_FIELD);
    let mut lookup = HashMap::new();
    for (tiploc, name) in &names {
        lookup.entry(tiploc.clone()).or_insert_with(|| name.clone());
    }
    Ok((names, lookup))
}

async fn missing_report(
    client: &SolrClient,
    config: &LocateConfig,
    table: &LocationTable,
    counts: &HashMap<String, u64>,
) -> Result<()> {
    let collections = &config.collections;
    let codes: Vec<String> = table.unresolved().map(|r| r.tiploc.clone()).collect();
    info!("Looking up transport for {} unresolved TIPLOCs", codes.len());

    let pb = ProgressBar::new(codes.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})",
            )?
            .progress_chars("#>-"),
    );
    let mut transport = HashMap::new();
    for code in &codes {
        let headcode =
            transport_for(client, &collections.path, &collections.schedule, code).await?;
        transport.insert(code.clone(), headcode);
        pb.inc(1);
    }
    pb.finish_with_message("done");

    let docs = fetch_reference_docs(client, &collections.reference, &codes).await?;
    let rows = build_missing_rows(docs, counts, &transport);
    write_missing_report(&rows, &config.outputs.missing)?;

    info!(
        "Unresolved TIPLOCs carry {:.2}% of path calls",
        100.0 * unresolved_share(table, counts)
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level(args.verbose))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match &args.config {
        Some(path) => LocateConfig::load_from_file(path)?,
        None => LocateConfig::default(),
    };
    let client = args.solr.connect()?;
    let collections = &config.collections;

    let counts = client
        .facet_counts(&collections.path, "TIPLOC")
        .await
        .with_context(|| format!("Failed to facet {} by TIPLOC", collections.path))?;
    let mut table = LocationTable::new(counts.iter().map(|(k, _)| k.clone()));
    let counts: HashMap<String, u64> = counts.into_iter().collect();

    let (names, lookup) = load_names(&client, &collections.reference).await?;
    table.set_names(&names);
    table.log_progress("timetable");

    let boundaries = load_shapefile_boundaries(
        &config.boundary.shapefile,
        &config.boundary.field,
        &config.boundary.value,
    )?;
    let boundary = BoundaryIndex::build(boundaries);
    table.fill_from_sources(&config.inputs, &boundary)?;
    table.fill_descriptions(&lookup);

    if let Some(tiploc) = &args.show {
        match table.get(tiploc).and_then(|r| r.map_url()) {
            Some(url) => info!("{}: {}", tiploc, url),
            None => warn!("{}: no location", tiploc),
        }
    }

    write_locations_report(&table, &config.outputs.locations)?;
    missing_report(&client, &config, &table, &counts).await?;

    info!(
        "Resolved {} of {} TIPLOCs",
        table.found(),
        table.len()
    );
    Ok(())
}

//! Extract rail stops and stop areas from the NaPTAN Solr collections
//! into `NaPTAN-All.jsonl`.

mod fields;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

use tiploc_mapper::config::{log_level, SolrArgs};
use tiploc_mapper::solr::{QueryParams, SolrClient};

use crate::fields::{field_list, stop_area_row, stop_point_row, STOP_AREA_FIELDS, STOP_POINT_FIELDS};

#[derive(Parser, Debug)]
#[command(name = "process-naptan")]
#[command(about = "Extract NaPTAN rail records from Solr")]
struct Args {
    #[command(flatten)]
    solr: SolrArgs,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    /// StopPoint collection
    #[arg(long, default_value = "StopPoint")]
    stop_points: String,

    /// StopArea collection
    #[arg(long, default_value = "StopArea")]
    stop_areas: String,

    /// Output line-delimited JSON
    #[arg(short, long, default_value = "NaPTAN-All.jsonl")]
    output: PathBuf,

    /// Stop type counts
    #[arg(long, default_value = "output/StopTypes.tsv")]
    stop_types: PathBuf,
}

async fn write_stop_types(client: &SolrClient, collection: &str, path: &Path) -> Result<()> {
    let counts = client
        .facet_counts(collection, "StopClassification.StopType")
        .await?;
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    writer.write_record(["StopType", "#"])?;
    for (stop_type, count) in &counts {
        writer.write_record([stop_type.clone(), count.to_string()])?;
    }
    writer.flush()?;
    info!("Wrote {} stop types to {}", counts.len(), path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level(args.verbose))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let client = args.solr.connect()?;

    write_stop_types(&client, &args.stop_points, &args.stop_types).await?;

    let points = client
        .get_query(
            &args.stop_points,
            QueryParams::new("AtcoCode:9*").fl(&field_list(STOP_POINT_FIELDS)),
            None,
        )
        .await
        .context("StopPoint query failed")?;
    info!("{} stop points", points.len());

    let areas = client
        .get_query(
            &args.stop_areas,
            QueryParams::new("ParentStopAreaRef.value:9* OR StopAreaCode:9*")
                .fl(&field_list(STOP_AREA_FIELDS)),
            None,
        )
        .await
        .context("StopArea query failed")?;
    info!("{} stop areas", areas.len());

    let file = File::create(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    let mut writer = BufWriter::new(file);
    let rows = points
        .into_iter()
        .map(stop_point_row)
        .chain(areas.into_iter().map(stop_area_row));
    let mut written = 0usize;
    for row in rows {
        serde_json::to_writer(&mut writer, &row)?;
        writer.write_all(b"\n")?;
        written += 1;
    }
    writer.flush()?;
    info!("Wrote {} rows to {}", written, args.output.display());
    Ok(())
}

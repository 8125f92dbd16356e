//! Flatten a rail OSM extract into `OSM-All.jsonl`.
//!
//! Every tagged object becomes one row carrying its tags, layer, id,
//! centroid and (where tagged) TIPLOC.

mod geometry;
mod tags;

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use geo::{Centroid, Point};
use indicatif::{ProgressBar, ProgressStyle};
use osmpbfreader::{OsmObj, OsmPbfReader};
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

use tiploc_mapper::config::log_level;
use tiploc_mapper::models::Row;

use crate::geometry::GeometryResolver;
use crate::tags::{build_row, has_interesting_tags, is_area, relation_layer, Layer, TiplocExtractor};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

const LAYERS: [Layer; 4] = [
    Layer::Points,
    Layer::Lines,
    Layer::Multipolygons,
    Layer::OtherRelations,
];

#[derive(Parser, Debug)]
#[command(name = "process-osm")]
#[command(about = "Extract tagged rail objects from an OSM PBF file")]
struct Args {
    /// OSM PBF extract
    #[arg(default_value = "great-britain-rail-all.osm.pbf")]
    file: PathBuf,

    /// Output line-delimited JSON
    #[arg(short, long, default_value = "OSM-All.jsonl")]
    output: PathBuf,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

fn open_pbf(path: &Path) -> Result<OsmPbfReader<BufReader<File>>> {
    let file = File::open(path)
        .with_context(|| format!("{}: No such file or directory", path.display()))?;
    Ok(OsmPbfReader::new(BufReader::new(file)))
}

fn main() -> Result<()> {
    let args = Args::parse();
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level(args.verbose))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if !args.file.exists() {
        anyhow::bail!("{}: No such file or directory", args.file.display());
    }
    info!("File: {}", args.file.display());

    let mut reader = open_pbf(&args.file)?;
    let resolver = GeometryResolver::build(&mut reader, has_interesting_tags)?;
    let extractor = TiplocExtractor::new()?;

    info!("Counting objects...");
    reader.rewind()?;
    let total_count = reader.iter().filter(|o| o.is_ok()).count() as u64;
    info!("Total OSM objects: {}", total_count);

    let pb = ProgressBar::new(total_count);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})",
            )?
            .progress_chars("#>-"),
    );

    let mut layers: [Vec<Row>; 4] = Default::default();
    reader.rewind()?;
    for obj in reader.iter() {
        pb.inc(1);
        let obj = match obj {
            Ok(obj) => obj,
            Err(e) => {
                warn!("Skipping unreadable object: {}", e);
                continue;
            }
        };
        if !has_interesting_tags(obj.tags()) {
            continue;
        }

        let (layer, osm_id, centroid): (Layer, i64, Option<Point<f64>>) = match &obj {
            OsmObj::Node(node) => (
                Layer::Points,
                node.id.0,
                Some(Point::new(node.lon(), node.lat())),
            ),
            OsmObj::Way(way) => {
                let closed = way.nodes.len() >= 4 && way.nodes.first() == way.nodes.last();
                if closed && is_area(&way.tags) {
                    let centroid = resolver.way_polygon(way.id).and_then(|p| p.centroid());
                    (Layer::Multipolygons, way.id.0, centroid)
                } else {
                    let centroid = resolver.way_line(way.id).and_then(|l| l.centroid());
                    (Layer::Lines, way.id.0, centroid)
                }
            }
            OsmObj::Relation(rel) => {
                let layer = relation_layer(&rel.tags);
                let centroid = resolver.relation_centroid(rel.id, layer == Layer::Multipolygons);
                (layer, rel.id.0, centroid)
            }
        };

        let row = build_row(obj.tags(), layer, osm_id, centroid, extractor.tiploc(obj.tags()));
        let slot = LAYERS.iter().position(|l| *l == layer).unwrap_or(0);
        layers[slot].push(row);
    }
    pb.finish_with_message("done");

    let file = File::create(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    let mut writer = BufWriter::new(file);
    for (layer, rows) in LAYERS.iter().zip(&layers) {
        info!("{}: {} rows", layer.as_str(), rows.len());
        for row in rows {
            serde_json::to_writer(&mut writer, row)?;
            writer.write_all(b"\n")?;
        }
    }
    writer.flush()?;

    let with_tiploc = layers
        .iter()
        .flatten()
        .filter(|r| r.contains_key("TIPLOC"))
        .count();
    info!(
        "Wrote {} rows ({} with TIPLOC) to {}",
        layers.iter().map(Vec::len).sum::<usize>(),
        with_tiploc,
        args.output.display()
    );
    Ok(())
}

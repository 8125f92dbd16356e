//! The ranked fill, from the highest ranked source to the manual maps.

use anyhow::Result;
use tracing::info;

use super::LocationTable;
use crate::config::InputConfig;
use crate::models::OsmRecord;
use crate::sources::{
    osm_candidates, read_foi, read_jsonl, read_overlaps, read_overrides, read_tiploc_map,
    tiploc_map_candidates, BplanTable, NaptanTable,
};
use crate::spatial::BoundaryIndex;

impl LocationTable {
    /// Fill from every source in rank order: FOI, BPLAN inside `boundary`,
    /// NaPTAN, OSM and the TIPLOC map. Overrides and overlaps are applied
    /// after that. Progress is logged after each stage.
    pub fn fill_from_sources(&mut self, inputs: &InputConfig, boundary: &BoundaryIndex) -> Result<()> {
        let filled = self.fill_missing(&read_foi(&inputs.foi)?);
        info!("FOI: {} filled", filled);
        self.log_progress("FOI");

        let bplan = BplanTable::load(&inputs.bplan)?;
        let filled = self.fill_missing(&bplan.clipped_candidates(boundary));
        info!("BPLAN: {} filled", filled);
        self.log_progress("BPLAN");

        let naptan = NaptanTable::load(&inputs.naptan)?;
        let filled = self.fill_missing(&naptan.candidates());
        info!("NaPTAN: {} filled", filled);
        self.log_progress("NaPTAN");

        let osm: Vec<OsmRecord> = read_jsonl(&inputs.osm)?;
        let filled = self.fill_missing(&osm_candidates(&osm));
        info!("OSM: {} filled", filled);
        self.log_progress("OSM");

        let tiploc_map = read_tiploc_map(&inputs.tiploc_map)?;
        let filled = self.fill_missing(&tiploc_map_candidates(
            &tiploc_map,
            &naptan.locations_by_atco(),
        ));
        info!("NaPTAN_MAP: {} filled", filled);
        self.log_progress("NaPTAN_MAP");

        let applied = self.apply_overrides(&read_overrides(&inputs.overrides)?);
        info!("{} overrides applied", applied);
        self.log_progress("overrides");

        let applied = self.apply_overlaps(&read_overlaps(&inputs.overlaps)?, &bplan);
        info!("{} overlaps applied", applied);
        self.log_progress("overlaps");
        Ok(())
    }
}

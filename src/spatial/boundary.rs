//! Spatial index of boundary polygons for clipping point sets.

use std::path::Path;

use anyhow::{Context, Result};
use geo::{BoundingRect, Intersects, MultiPolygon, Point};
use rstar::{RTree, RTreeObject, AABB};
use tracing::info;

/// Wrapper for R-tree indexing of a boundary
struct IndexedPolygon {
    geometry: MultiPolygon<f64>,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedPolygon {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl IndexedPolygon {
    fn new(geometry: MultiPolygon<f64>) -> Option<Self> {
        let rect = geometry.bounding_rect()?;
        Some(Self {
            envelope: AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
            geometry,
        })
    }
}

/// Union of boundary polygons, queried with clip semantics
pub struct BoundaryIndex {
    tree: RTree<IndexedPolygon>,
}

impl BoundaryIndex {
    /// Build spatial index from boundary polygons
    pub fn build(boundaries: Vec<MultiPolygon<f64>>) -> Self {
        let indexed: Vec<IndexedPolygon> = boundaries
            .into_iter()
            .filter_map(IndexedPolygon::new)
            .collect();
        let tree = RTree::bulk_load(indexed);
        info!("Boundary index built with {} polygons", tree.size());
        Self { tree }
    }

    /// True for points inside or on the edge of any boundary
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        let point = Point::new(lon, lat);
        self.tree
            .locate_in_envelope_intersecting(&AABB::from_point([lon, lat]))
            .any(|ip| ip.geometry.intersects(&point))
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

/// Read the polygons of a shapefile whose character field `field` equals
/// `value`, e.g. `ISO_A2 = GB` in a Natural Earth countries file
pub fn load_shapefile_boundaries(path: &Path, field: &str, value: &str) -> Result<Vec<MultiPolygon<f64>>> {
    info!(
        "Loading boundaries with {}={} from {}",
        field,
        value,
        path.display()
    );
    let rows = shapefile::read(path)
        .with_context(|| format!("failed reading '{}'", path.display()))?;

    let mut boundaries = Vec::new();
    for (idx, (shape, record)) in rows.into_iter().enumerate() {
        let matches = matches!(
            record.get(field),
            Some(shapefile::dbase::FieldValue::Character(Some(s))) if s.trim() == value
        );
        if !matches {
            continue;
        }
        let polygon = match shape {
            shapefile::Shape::Polygon(polygon) => geo_types::MultiPolygon::<f64>::try_from(polygon),
            shapefile::Shape::PolygonM(polygon) => geo_types::MultiPolygon::<f64>::try_from(polygon),
            shapefile::Shape::PolygonZ(polygon) => geo_types::MultiPolygon::<f64>::try_from(polygon),
            other => anyhow::bail!(
                "unexpected shape type {} found at row {}, must be polygonal",
                other.shapetype(),
                idx
            ),
        }
        .map_err(|e| anyhow::anyhow!("failed to convert shapefile polygon at row {}: {}", idx, e))?;
        boundaries.push(polygon);
    }

    if boundaries.is_empty() {
        anyhow::bail!(
            "no shapes with {}={} in {}",
            field,
            value,
            path.display()
        );
    }
    Ok(boundaries)
}

//! GeoJSON feature collection reader.

use std::path::Path;

use anyhow::{Context, Result};
use geo::Point;
use geojson::GeoJson;
use tracing::{info, warn};

use super::centroid_of;
use crate::models::Row;

/// Properties and centroid of one feature
#[derive(Debug, Clone)]
pub struct FeatureRow {
    pub properties: Row,
    pub centroid: Option<Point<f64>>,
}

/// Read a FeatureCollection, reducing each geometry to its centroid.
///
/// Coordinates are taken as lon/lat (CRS84).
pub fn read_feature_collection(path: &Path) -> Result<Vec<FeatureRow>> {
    info!("Reading features from {}", path.display());
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("unable to load file {}", path.display()))?;
    let dataset: GeoJson = contents
        .parse()
        .with_context(|| format!("failed to read file {} as GeoJSON", path.display()))?;
    let collection = match dataset {
        GeoJson::FeatureCollection(collection) => collection,
        GeoJson::Feature(_) => anyhow::bail!(
            "expected a FeatureCollection but found a single Feature in {}",
            path.display()
        ),
        GeoJson::Geometry(_) => anyhow::bail!(
            "expected a FeatureCollection but found a single Geometry in {}",
            path.display()
        ),
    };

    let mut rows = Vec::with_capacity(collection.features.len());
    for (idx, feature) in collection.features.into_iter().enumerate() {
        let centroid = match feature.geometry {
            Some(geometry) => match geo::Geometry::<f64>::try_from(geometry) {
                Ok(geometry) => centroid_of(&geometry),
                Err(e) => {
                    warn!("feature {} in {}: bad geometry: {}", idx, path.display(), e);
                    None
                }
            },
            None => None,
        };
        rows.push(FeatureRow {
            properties: feature.properties.unwrap_or_default(),
            centroid,
        });
    }

    info!("Read {} features from {}", rows.len(), path.display());
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_points_and_polygons() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
  "type": "FeatureCollection",
  "name": "TIPLOC",
  "features": [
    {{"type": "Feature", "properties": {{"TIPLOC": "EUSTON", "NAME": "London Euston"}},
      "geometry": {{"type": "Point", "coordinates": [-0.1335, 51.528]}}}},
    {{"type": "Feature", "properties": {{"TIPLOC": "BOX"}},
      "geometry": {{"type": "Polygon", "coordinates": [[[0,0],[2,0],[2,2],[0,2],[0,0]]]}}}},
    {{"type": "Feature", "properties": {{"TIPLOC": "NOGEOM"}}, "geometry": null}}
  ]
}}"#
        )
        .unwrap();

        let rows = read_feature_collection(file.path()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].properties["NAME"], "London Euston");
        let p = rows[0].centroid.unwrap();
        assert_eq!((p.x(), p.y()), (-0.1335, 51.528));
        let c = rows[1].centroid.unwrap();
        assert_eq!((c.x(), c.y()), (1.0, 1.0));
        assert!(rows[2].centroid.is_none());
    }

    #[test]
    fn test_rejects_single_feature() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"type": "Feature", "properties": {{}}, "geometry": {{"type": "Point", "coordinates": [0, 0]}}}}"#
        )
        .unwrap();
        assert!(read_feature_collection(file.path()).is_err());
    }
}

//! Layer assignment and row building for tagged OSM objects.

use geo::Point;
use osmpbfreader::Tags;
use regex::Regex;
use serde_json::Value;

use tiploc_mapper::models::{tiploc_from_atco, Row, DEFAULT_PLACES};
use tiploc_mapper::spatial::location_string;

/// Output layer, named after the GDAL OSM driver layers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Points,
    Lines,
    Multipolygons,
    OtherRelations,
}

impl Layer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Points => "points",
            Layer::Lines => "lines",
            Layer::Multipolygons => "multipolygons",
            Layer::OtherRelations => "other_relations",
        }
    }
}

/// Keys that make a closed way an area
const AREA_KEYS: &[&str] = &[
    "aeroway", "amenity", "boundary", "building", "craft", "geological", "historic", "landuse",
    "leisure", "military", "natural", "office", "place", "shop", "sport", "tourism",
];

/// Tags that carry no feature information on their own
const UNINTERESTING: &[&str] = &["created_by", "source", "note", "fixme", "FIXME"];

pub fn has_interesting_tags(tags: &Tags) -> bool {
    tags.iter()
        .any(|(k, v)| !v.is_empty() && !UNINTERESTING.contains(&k.as_str()))
}

fn tag<'a>(tags: &'a Tags, key: &str) -> Option<&'a str> {
    tags.get(key).map(|v| v.as_str()).filter(|v| !v.is_empty())
}

/// A closed way is an area when tagged `area=yes`, or carries an area key
/// (or a platform tag) and is not `area=no`
pub fn is_area(tags: &Tags) -> bool {
    match tag(tags, "area") {
        Some("yes") => return true,
        Some("no") => return false,
        _ => {}
    }
    AREA_KEYS.iter().any(|k| tag(tags, k).is_some())
        || tag(tags, "highway") == Some("platform")
        || tag(tags, "public_transport") == Some("platform")
}

pub fn relation_layer(tags: &Tags) -> Layer {
    match tag(tags, "type") {
        Some("multipolygon") | Some("boundary") => Layer::Multipolygons,
        _ => Layer::OtherRelations,
    }
}

/// Picks the TIPLOC for a set of tags
pub struct TiplocExtractor {
    separator: Regex,
}

impl TiplocExtractor {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            separator: Regex::new(r"\s*;\s*")?,
        })
    }

    /// `ref:tiploc` (first value of a `;` list), else the NaPTAN rail code
    /// without its `9100` prefix
    pub fn tiploc(&self, tags: &Tags) -> Option<String> {
        if let Some(value) = tag(tags, "ref:tiploc") {
            if let Some(first) = self.separator.split(value.trim()).find(|s| !s.is_empty()) {
                return Some(first.to_string());
            }
        }
        tag(tags, "naptan:AtcoCode")
            .map(tiploc_from_atco)
            .filter(|t| !t.is_empty())
    }
}

/// All non-empty tags plus `layer`, `osm_id`, `_location_` and `TIPLOC`
pub fn build_row(
    tags: &Tags,
    layer: Layer,
    osm_id: i64,
    centroid: Option<Point<f64>>,
    tiploc: Option<String>,
) -> Row {
    let mut row = Row::new();
    for (k, v) in tags.iter() {
        if !v.is_empty() {
            row.insert(k.to_string(), Value::String(v.to_string()));
        }
    }
    row.insert("layer".into(), layer.as_str().into());
    row.insert("osm_id".into(), osm_id.to_string().into());
    if let Some(point) = centroid {
        row.insert("_location_".into(), location_string(point, DEFAULT_PLACES).into());
    }
    if let Some(tiploc) = tiploc {
        row.insert("TIPLOC".into(), tiploc.into());
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        let mut tags = Tags::new();
        for (k, v) in pairs {
            tags.insert((*k).into(), (*v).into());
        }
        tags
    }

    #[test]
    fn test_tiploc_precedence() {
        let extractor = TiplocExtractor::new().unwrap();
        let both = tags(&[("ref:tiploc", "CREWE"), ("naptan:AtcoCode", "9100CREWEXX")]);
        assert_eq!(extractor.tiploc(&both).as_deref(), Some("CREWE"));

        let naptan = tags(&[("naptan:AtcoCode", "9100EUSTON")]);
        assert_eq!(extractor.tiploc(&naptan).as_deref(), Some("EUSTON"));

        let multi = tags(&[("ref:tiploc", "WLSDNJL ; WLSDJHL")]);
        assert_eq!(extractor.tiploc(&multi).as_deref(), Some("WLSDNJL"));

        assert_eq!(extractor.tiploc(&tags(&[("name", "Signal box")])), None);
        assert_eq!(extractor.tiploc(&tags(&[("ref:tiploc", "")])), None);
    }

    #[test]
    fn test_area_rules() {
        assert!(is_area(&tags(&[("building", "train_station")])));
        assert!(is_area(&tags(&[("public_transport", "platform")])));
        assert!(is_area(&tags(&[("railway", "platform"), ("area", "yes")])));
        assert!(!is_area(&tags(&[("building", "yes"), ("area", "no")])));
        assert!(!is_area(&tags(&[("railway", "rail")])));
    }

    #[test]
    fn test_relation_layer() {
        assert_eq!(relation_layer(&tags(&[("type", "multipolygon")])), Layer::Multipolygons);
        assert_eq!(relation_layer(&tags(&[("type", "route")])), Layer::OtherRelations);
    }

    #[test]
    fn test_build_row() {
        let t = tags(&[("name", "Crewe"), ("railway", "station"), ("operator", "")]);
        let row = build_row(
            &t,
            Layer::Points,
            42,
            Some(Point::new(-2.4331844, 53.0896102)),
            Some("CREWE".into()),
        );
        assert_eq!(row["name"], "Crewe");
        assert!(!row.contains_key("operator"));
        assert_eq!(row["layer"], "points");
        assert_eq!(row["osm_id"], "42");
        assert_eq!(row["_location_"], "53.08961,-2.433184");
        assert_eq!(row["TIPLOC"], "CREWE");
    }

    #[test]
    fn test_interesting_tags() {
        assert!(!has_interesting_tags(&tags(&[("created_by", "JOSM")])));
        assert!(has_interesting_tags(&tags(&[("railway", "signal")])));
    }
}

use geo::{Centroid, Geometry, Point};

use crate::models::Location;

/// Centroid of any geometry, `None` for empty ones
pub fn centroid_of(geometry: &Geometry<f64>) -> Option<Point<f64>> {
    geometry.centroid()
}

/// `"lat,lon"` text for an (x=lon, y=lat) point rounded to `places`
pub fn location_string(point: Point<f64>, places: u32) -> String {
    Location::new(point.y(), point.x())
        .rounded(places)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, LineString};

    #[test]
    fn test_polygon_centroid_location() {
        let square = polygon![
            (x: -1.0, y: 52.0),
            (x: 0.0, y: 52.0),
            (x: 0.0, y: 53.0),
            (x: -1.0, y: 53.0),
            (x: -1.0, y: 52.0),
        ];
        let centre = centroid_of(&Geometry::Polygon(square)).unwrap();
        assert_eq!(location_string(centre, 6), "52.5,-0.5");
    }

    #[test]
    fn test_empty_geometry_has_no_centroid() {
        let empty = Geometry::LineString(LineString::<f64>::new(vec![]));
        assert!(centroid_of(&empty).is_none());
    }
}

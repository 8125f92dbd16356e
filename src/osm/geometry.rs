use anyhow::Result;
use geo::{Centroid, Coord, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};
use hashbrown::{HashMap, HashSet};
use osmpbfreader::{NodeId, OsmId, OsmObj, OsmPbfReader, RelationId, Tags, WayId};
use sled::Db;
use std::io::{Read, Seek};
use tempfile::{Builder, TempDir};
use tracing::info;

/// Resolves way and relation geometry from node coordinates held on disk
pub struct GeometryResolver {
    node_db: Db,
    way_nodes: HashMap<WayId, Vec<NodeId>>,
    /// Member ways of each kept relation, with their role
    relation_ways: HashMap<RelationId, Vec<(WayId, String)>>,
    /// Member nodes of each kept relation
    relation_nodes: HashMap<RelationId, Vec<NodeId>>,
    _dir: TempDir,
}

impl GeometryResolver {
    /// Scan the file three times: relations, then ways, then nodes. Only
    /// objects passing `filter` (and the ways they reference) are kept.
    pub fn build<R: Read + Seek, F>(reader: &mut OsmPbfReader<R>, filter: F) -> Result<Self>
    where
        F: Fn(&Tags) -> bool,
    {
        info!("Building geometry index...");

        let mut needed_ways = HashSet::new();
        let mut needed_nodes = HashSet::new();
        let mut relation_ways = HashMap::new();
        let mut relation_nodes = HashMap::new();
        let mut way_nodes = HashMap::new();

        info!("Pass 1/3: relations");
        reader.rewind()?;
        for obj in reader.iter() {
            if let OsmObj::Relation(rel) = obj? {
                if !filter(&rel.tags) {
                    continue;
                }
                let ways: Vec<(WayId, String)> = rel
                    .refs
                    .iter()
                    .filter_map(|member| match member.member {
                        OsmId::Way(way_id) => Some((way_id, member.role.to_string())),
                        _ => None,
                    })
                    .collect();
                let nodes: Vec<NodeId> = rel
                    .refs
                    .iter()
                    .filter_map(|member| match member.member {
                        OsmId::Node(node_id) => Some(node_id),
                        _ => None,
                    })
                    .collect();
                needed_ways.extend(ways.iter().map(|(id, _)| *id));
                needed_nodes.extend(nodes.iter().copied());
                relation_ways.insert(rel.id, ways);
                relation_nodes.insert(rel.id, nodes);
            }
        }
        info!("Kept {} relations", relation_ways.len());

        info!("Pass 2/3: ways");
        reader.rewind()?;
        for obj in reader.iter() {
            if let OsmObj::Way(way) = obj? {
                if needed_ways.contains(&way.id) || filter(&way.tags) {
                    needed_nodes.extend(way.nodes.iter().copied());
                    way_nodes.insert(way.id, way.nodes);
                }
            }
        }
        info!(
            "Kept {} ways referencing {} nodes",
            way_nodes.len(),
            needed_nodes.len()
        );

        info!("Pass 3/3: node coordinates");
        reader.rewind()?;
        let dir = Builder::new().prefix("tiploc-osm-").tempdir()?;
        let node_db = sled::open(dir.path())?;
        let mut stored = 0usize;
        for obj in reader.iter() {
            if let OsmObj::Node(node) = obj? {
                if needed_nodes.contains(&node.id) {
                    node_db.insert(node.id.0.to_be_bytes(), &encode(node.lon(), node.lat()))?;
                    stored += 1;
                }
            }
        }
        node_db.flush()?;
        info!("Stored {} node coordinates", stored);

        Ok(Self {
            node_db,
            way_nodes,
            relation_ways,
            relation_nodes,
            _dir: dir,
        })
    }

    fn coord(&self, node: NodeId) -> Option<Coord<f64>> {
        let bytes = self.node_db.get(node.0.to_be_bytes()).ok()??;
        decode(&bytes)
    }

    /// Coordinates of a kept way, skipping nodes missing from the extract
    pub fn way_coords(&self, way_id: WayId) -> Option<Vec<Coord<f64>>> {
        let nodes = self.way_nodes.get(&way_id)?;
        Some(nodes.iter().filter_map(|n| self.coord(*n)).collect())
    }

    pub fn way_line(&self, way_id: WayId) -> Option<LineString<f64>> {
        let coords = self.way_coords(way_id)?;
        (coords.len() >= 2).then(|| LineString::new(coords))
    }

    pub fn way_polygon(&self, way_id: WayId) -> Option<Polygon<f64>> {
        let mut ring = self.way_coords(way_id)?;
        if ring.len() < 3 {
            return None;
        }
        if ring.first() != ring.last() {
            ring.push(ring[0]);
        }
        Some(Polygon::new(LineString::new(ring), vec![]))
    }

    /// Outer rings of a multipolygon relation, merged into polygons
    pub fn relation_polygons(&self, rel_id: RelationId) -> Option<MultiPolygon<f64>> {
        let rings: Vec<Vec<Coord<f64>>> = self
            .relation_ways
            .get(&rel_id)?
            .iter()
            .filter(|(_, role)| role == "outer" || role.is_empty())
            .filter_map(|(way_id, _)| self.way_coords(*way_id))
            .filter(|coords| coords.len() >= 2)
            .collect();
        let polygons = merge_rings_to_polygons(rings);
        (!polygons.is_empty()).then(|| MultiPolygon::new(polygons))
    }

    /// All member ways of a relation as lines
    pub fn relation_lines(&self, rel_id: RelationId) -> Option<MultiLineString<f64>> {
        let lines: Vec<LineString<f64>> = self
            .relation_ways
            .get(&rel_id)?
            .iter()
            .filter_map(|(way_id, _)| self.way_line(*way_id))
            .collect();
        (!lines.is_empty()).then(|| MultiLineString::new(lines))
    }

    /// Member nodes of a relation that have coordinates
    pub fn relation_points(&self, rel_id: RelationId) -> Option<MultiPoint<f64>> {
        let points: Vec<Point<f64>> = self
            .relation_nodes
            .get(&rel_id)?
            .iter()
            .filter_map(|n| self.coord(*n))
            .map(Point::from)
            .collect();
        (!points.is_empty()).then(|| MultiPoint::new(points))
    }

    /// Centroid of a relation: its polygons when `as_area`, else its member
    /// lines, else its member nodes
    pub fn relation_centroid(&self, rel_id: RelationId, as_area: bool) -> Option<Point<f64>> {
        if as_area {
            if let Some(centroid) = self.relation_polygons(rel_id).and_then(|mp| mp.centroid()) {
                return Some(centroid);
            }
        }
        if let Some(centroid) = self.relation_lines(rel_id).and_then(|l| l.centroid()) {
            return Some(centroid);
        }
        self.relation_points(rel_id)?.centroid()
    }
}

fn encode(lon: f64, lat: f64) -> [u8; 16] {
    let mut value = [0u8; 16];
    value[0..8].copy_from_slice(&lon.to_be_bytes());
    value[8..16].copy_from_slice(&lat.to_be_bytes());
    value
}

fn decode(bytes: &[u8]) -> Option<Coord<f64>> {
    let lon = f64::from_be_bytes(bytes.get(0..8)?.try_into().ok()?);
    let lat = f64::from_be_bytes(bytes.get(8..16)?.try_into().ok()?);
    Some(Coord { x: lon, y: lat })
}

/// Join open ring segments end to end and close what can be closed.
/// Segments that never close into a ring of at least four points are dropped.
pub fn merge_rings_to_polygons(segments: Vec<Vec<Coord<f64>>>) -> Vec<Polygon<f64>> {
    let mut polygons = Vec::new();
    let mut pending = segments;

    while !pending.is_empty() {
        let mut ring = pending.remove(0);

        while ring.first() != ring.last() {
            let (start, end) = (ring[0], ring[ring.len() - 1]);
            let Some(idx) = pending
                .iter()
                .position(|s| s.first() == Some(&end) || s.last() == Some(&end)
                    || s.first() == Some(&start) || s.last() == Some(&start))
            else {
                break;
            };
            let mut next = pending.remove(idx);
            if next.first() == Some(&end) {
                ring.extend(next.drain(1..));
            } else if next.last() == Some(&end) {
                next.reverse();
                ring.extend(next.drain(1..));
            } else if next.last() == Some(&start) {
                next.pop();
                next.extend(ring);
                ring = next;
            } else {
                next.reverse();
                next.pop();
                next.extend(ring);
                ring = next;
            }
        }

        if ring.len() >= 3 && ring.first() != ring.last() {
            ring.push(ring[0]);
        }
        if ring.len() >= 4 {
            polygons.push(Polygon::new(LineString::new(ring), vec![]));
        }
    }

    polygons
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> [Coord<f64>; 4] {
        [
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 1.0, y: 0.0 },
            Coord { x: 1.0, y: 1.0 },
            Coord { x: 0.0, y: 1.0 },
        ]
    }

    #[test]
    fn test_closed_ring() {
        let [a, b, c, d] = square();
        assert_eq!(merge_rings_to_polygons(vec![vec![a, b, c, d, a]]).len(), 1);
    }

    #[test]
    fn test_split_ring_any_order() {
        let [a, b, c, d] = square();
        assert_eq!(
            merge_rings_to_polygons(vec![vec![c, d, a], vec![a, b, c]]).len(),
            1
        );
        // second segment digitised backwards
        let polygons = merge_rings_to_polygons(vec![vec![a, b, c], vec![a, d, c]]);
        assert_eq!(polygons.len(), 1);
        assert_eq!(polygons[0].exterior().0.len(), 5);
    }

    #[test]
    fn test_short_segments_dropped() {
        let [a, b, c, d] = square();
        assert!(merge_rings_to_polygons(vec![vec![a, b], vec![c, d]]).is_empty());
    }

    fn resolver(
        nodes: &[(i64, f64, f64)],
        ways: &[(i64, Vec<i64>)],
        relation: (i64, Vec<i64>, Vec<i64>),
    ) -> GeometryResolver {
        let dir = Builder::new().prefix("tiploc-osm-test-").tempdir().unwrap();
        let node_db = sled::open(dir.path()).unwrap();
        for (id, lon, lat) in nodes {
            node_db.insert(id.to_be_bytes(), &encode(*lon, *lat)).unwrap();
        }
        let way_nodes = ways
            .iter()
            .map(|(id, ns)| (WayId(*id), ns.iter().map(|n| NodeId(*n)).collect()))
            .collect();
        let (rel_id, rel_ways, rel_nodes) = relation;
        let mut relation_ways = HashMap::new();
        relation_ways.insert(
            RelationId(rel_id),
            rel_ways.iter().map(|w| (WayId(*w), String::new())).collect(),
        );
        let mut relation_nodes = HashMap::new();
        relation_nodes.insert(
            RelationId(rel_id),
            rel_nodes.iter().map(|n| NodeId(*n)).collect(),
        );
        GeometryResolver {
            node_db,
            way_nodes,
            relation_ways,
            relation_nodes,
            _dir: dir,
        }
    }

    #[test]
    fn test_node_only_relation_centroid() {
        // a stop area made of two platforms' nodes
        let r = resolver(
            &[(1, -2.0, 53.0), (2, -2.2, 53.2)],
            &[],
            (10, vec![], vec![1, 2, 99]),
        );
        let c = r.relation_centroid(RelationId(10), false).unwrap();
        assert!((c.x() + 2.1).abs() < 1e-9);
        assert!((c.y() - 53.1).abs() < 1e-9);
        assert!(r.relation_centroid(RelationId(11), false).is_none());
    }

    #[test]
    fn test_relation_lines_win_over_nodes() {
        let r = resolver(
            &[(1, 0.0, 0.0), (2, 2.0, 0.0), (3, 10.0, 10.0)],
            &[(5, vec![1, 2])],
            (10, vec![5], vec![3]),
        );
        let c = r.relation_centroid(RelationId(10), false).unwrap();
        assert_eq!((c.x(), c.y()), (1.0, 0.0));
    }

    #[test]
    fn test_node_coord_encoding() {
        let coord = decode(&encode(-0.1335, 51.528)).unwrap();
        assert_eq!((coord.x, coord.y), (-0.1335, 51.528));
        assert!(decode(&[0u8; 8]).is_none());
    }
}

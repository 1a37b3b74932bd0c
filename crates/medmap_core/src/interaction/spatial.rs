//! Nearest-school and polygon queries over static school positions.
//!
//! Built once per dataset; school positions never change during a session,
//! so the tree is never rebuilt on selection changes.

use crate::dataset::DatasetIndex;
use crate::model::geometry::point_in_ring;
use crate::model::school::{PlanarPoint, SchoolKey};
use rstar::primitives::GeomWithData;
use rstar::{RTree, AABB};

type SchoolEntry = GeomWithData<[f64; 2], usize>;

/// Result of a nearest-school query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestSchool<'a> {
    pub key: &'a SchoolKey,
    pub position: PlanarPoint,
    pub distance: f64,
}

/// R-tree over school positions.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    tree: RTree<SchoolEntry>,
    keys: Vec<SchoolKey>,
    positions: Vec<PlanarPoint>,
}

impl SpatialIndex {
    pub fn build(dataset: &DatasetIndex) -> Self {
        Self::from_positions(
            dataset
                .schools()
                .map(|info| (info.key.clone(), info.position)),
        )
    }

    pub fn from_positions(entries: impl IntoIterator<Item = (SchoolKey, PlanarPoint)>) -> Self {
        let (keys, positions): (Vec<_>, Vec<_>) = entries.into_iter().unzip();
        let tree = RTree::bulk_load(
            positions
                .iter()
                .enumerate()
                .map(|(slot, position)| GeomWithData::new([position.x, position.y], slot))
                .collect(),
        );
        Self {
            tree,
            keys,
            positions,
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Closest school to `(x, y)`; `None` for an empty index or non-finite input.
    pub fn nearest(&self, x: f64, y: f64) -> Option<NearestSchool<'_>> {
        if !(x.is_finite() && y.is_finite()) {
            return None;
        }
        let entry = self.tree.nearest_neighbor(&[x, y])?;
        let position = self.positions[entry.data];
        Some(NearestSchool {
            key: &self.keys[entry.data],
            position,
            distance: position.distance_squared(&PlanarPoint::new(x, y)).sqrt(),
        })
    }

    /// Schools strictly inside the closed polygon `ring`, in key order.
    ///
    /// Rings with fewer than three vertices enclose nothing.
    pub fn within_polygon(&self, ring: &[[f64; 2]]) -> Vec<&SchoolKey> {
        if ring.len() < 3 || ring.iter().any(|[x, y]| !(x.is_finite() && y.is_finite())) {
            return Vec::new();
        }

        let (mut min, mut max) = ([f64::INFINITY; 2], [f64::NEG_INFINITY; 2]);
        for [x, y] in ring {
            min = [min[0].min(*x), min[1].min(*y)];
            max = [max[0].max(*x), max[1].max(*y)];
        }
        let envelope = AABB::from_corners(min, max);

        let mut slots = self
            .tree
            .locate_in_envelope(&envelope)
            .filter(|entry| point_in_ring(*entry.geom(), ring))
            .map(|entry| entry.data)
            .collect::<Vec<_>>();
        slots.sort_unstable_by(|a, b| self.keys[*a].cmp(&self.keys[*b]));
        slots.into_iter().map(|slot| &self.keys[slot]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::SpatialIndex;
    use crate::model::geometry::point_in_ring;
    use crate::model::school::PlanarPoint;

    fn index() -> SpatialIndex {
        SpatialIndex::from_positions(vec![
            ("Alpha".to_string(), PlanarPoint::new(10.0, 10.0)),
            ("Beta".to_string(), PlanarPoint::new(50.0, 10.0)),
            ("Gamma".to_string(), PlanarPoint::new(30.0, 40.0)),
        ])
    }

    #[test]
    fn nearest_picks_closest_school() {
        let index = index();
        let hit = index.nearest(45.0, 12.0).expect("non-empty index");
        assert_eq!(hit.key, "Beta");
        assert_eq!(hit.position, PlanarPoint::new(50.0, 10.0));
        assert!((hit.distance - 29.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn nearest_on_empty_index_is_none() {
        let index = SpatialIndex::from_positions(Vec::new());
        assert!(index.is_empty());
        assert!(index.nearest(1.0, 1.0).is_none());
        assert!(self::index().nearest(f64::NAN, 1.0).is_none());
    }

    #[test]
    fn polygon_query_returns_enclosed_keys_sorted() {
        let index = index();
        let ring = [[0.0, 0.0], [60.0, 0.0], [60.0, 20.0], [0.0, 20.0]];
        let keys = index.within_polygon(&ring);
        assert_eq!(keys, vec!["Alpha", "Beta"]);
    }

    #[test]
    fn concave_polygon_excludes_notch() {
        // U shape open at the top between x=20 and x=40
        let ring = [
            [0.0, 0.0],
            [20.0, 0.0],
            [20.0, 30.0],
            [40.0, 30.0],
            [40.0, 0.0],
            [60.0, 0.0],
            [60.0, 50.0],
            [0.0, 50.0],
        ];
        assert!(point_in_ring([10.0, 10.0], &ring));
        assert!(!point_in_ring([30.0, 10.0], &ring));
        assert!(point_in_ring([30.0, 40.0], &ring));
    }

    #[test]
    fn degenerate_ring_encloses_nothing() {
        assert!(index().within_polygon(&[[0.0, 0.0], [100.0, 100.0]]).is_empty());
    }
}

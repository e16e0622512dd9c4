use crate::config::SensingShape;
use crate::resource::Resource;
use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// Point entry for a resource, keyed by its slot in the field at index build time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResourceLocation {
    pub index: usize,
    pub position: [f64; 2],
}

impl RTreeObject for ResourceLocation {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl PointDistance for ResourceLocation {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.position[0] - point[0];
        let dy = self.position[1] - point[1];
        dx * dx + dy * dy
    }
}

/// Build an R*-tree over the current resource positions via bulk_load (O(n log n)).
pub fn build_index(resources: &[Resource]) -> RTree<ResourceLocation> {
    let locations = resources
        .iter()
        .enumerate()
        .map(|(index, r)| ResourceLocation {
            index,
            position: r.position,
        })
        .collect();
    RTree::bulk_load(locations)
}

/// Slots of every resource visible from `center`, ascending.
///
/// Uses an AABB envelope query, then filters by Euclidean distance for
/// `SensingShape::Disc`. The box test is the envelope itself.
pub fn query_sensed(
    tree: &RTree<ResourceLocation>,
    center: [f64; 2],
    radius: f64,
    shape: SensingShape,
) -> Vec<usize> {
    let envelope = AABB::from_corners(
        [center[0] - radius, center[1] - radius],
        [center[0] + radius, center[1] + radius],
    );
    let r_sq = radius * radius;

    let mut sensed: Vec<usize> = tree
        .locate_in_envelope(&envelope)
        .filter(|loc| match shape {
            SensingShape::Disc => loc.distance_2(&center) < r_sq,
            SensingShape::Box => true,
        })
        .map(|loc| loc.index)
        .collect();
    sensed.sort_unstable();
    sensed
}

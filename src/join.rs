//! Point-in-district lookup backed by an R-tree of district bounding boxes.

use crate::types::{District, Site};
use geo::bounding_rect::BoundingRect;
use geo::intersects::Intersects;
use geo::Point;
use rstar::{RTree, RTreeObject, AABB};

// Wrapper for RTree indexing
pub struct DistrictEnvelope {
    index: usize,
    aabb: AABB<[f64; 2]>,
}

impl RTreeObject for DistrictEnvelope {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

/// Districts together with an R-tree over their bounding boxes.
pub struct DistrictIndex {
    districts: Vec<District>,
    tree: RTree<DistrictEnvelope>,
}

impl DistrictIndex {
    pub fn build(districts: Vec<District>) -> Self {
        let items: Vec<DistrictEnvelope> = districts
            .iter()
            .enumerate()
            // Empty geometries have no bounding box and can never match.
            .filter_map(|(index, district)| {
                let rect = district.geometry.bounding_rect()?;
                Some(DistrictEnvelope {
                    index,
                    aabb: AABB::from_corners(
                        [rect.min().x, rect.min().y],
                        [rect.max().x, rect.max().y],
                    ),
                })
            })
            .collect();
        tracing::debug!(indexed = items.len(), "built district index");
        Self {
            districts,
            tree: RTree::bulk_load(items),
        }
    }

    pub fn districts(&self) -> &[District] {
        &self.districts
    }

    /// District whose area intersects `point`.
    ///
    /// A point on a boundary counts as inside. If districts overlap, the one
    /// that comes first in dataset order wins.
    pub fn locate(&self, point: Point<f64>) -> Option<&District> {
        let envelope = AABB::from_point([point.x(), point.y()]);
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|candidate| candidate.index)
            .filter(|&index| self.districts[index].geometry.intersects(&point))
            .min()
            .map(|index| &self.districts[index])
    }
}

/// Annotates each site with the district and zone containing it.
///
/// Output keeps input order. Sites outside every district keep `None`
/// for both fields.
pub fn join(sites: Vec<Site>, index: &DistrictIndex) -> Vec<Site> {
    sites
        .into_iter()
        .map(|mut site| {
            let hit = index.locate(site.point());
            site.district_name = hit.map(|d| d.name.clone());
            site.zone = hit.map(|d| d.zone.clone());
            site
        })
        .collect()
}

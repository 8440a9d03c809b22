//! The loaded district set and the site pipeline built on top of it.

use crate::color::color_for;
use crate::data::Boundary;
use crate::filter::{self, Selection};
use crate::join::{self, DistrictIndex};
use crate::types::{District, Site};
use crate::zones::ZoneTable;
use std::collections::BTreeSet;

/// Districts annotated with zone and color, plus the spatial index used to
/// join sites against them. Built once per load and reused for every
/// selection.
pub struct Atlas {
    index: DistrictIndex,
}

impl Atlas {
    pub fn new(boundaries: Vec<Boundary>, zones: &ZoneTable) -> Self {
        let districts: Vec<District> = boundaries
            .into_iter()
            .map(|boundary| District {
                zone: zones.classify(&boundary.name).to_string(),
                color: color_for(&boundary.name),
                name: boundary.name,
                geometry: boundary.geometry,
            })
            .collect();

        tracing::info!(districts = districts.len(), "annotated districts with zones");
        Self {
            index: DistrictIndex::build(districts),
        }
    }

    pub fn districts(&self) -> &[District] {
        self.index.districts()
    }

    /// Sorted, de-duplicated zone names present in the loaded set.
    pub fn zone_options(&self) -> Vec<String> {
        self.districts()
            .iter()
            .map(|d| d.zone.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Sorted, de-duplicated district names present in the loaded set.
    pub fn district_options(&self) -> Vec<String> {
        self.districts()
            .iter()
            .map(|d| d.name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Districts passing `selection`, in dataset order.
    pub fn select_districts<'a>(
        &'a self,
        selection: &'a Selection,
    ) -> impl Iterator<Item = &'a District> + 'a {
        filter::select(self.districts(), selection)
    }

    /// Joins sites against every loaded district, then applies `selection`.
    ///
    /// The join never sees the selection, so a site in a filtered-out
    /// district is dropped by the filter rather than left unassigned.
    pub fn locate_sites(&self, sites: Vec<Site>, selection: &Selection) -> Vec<Site> {
        let total = sites.len();
        let joined = join::join(sites, &self.index);
        let outside = joined.iter().filter(|s| s.district_name.is_none()).count();
        let kept = filter::filter(joined, selection);
        tracing::info!(total, outside, kept = kept.len(), "located sites");
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Choice;
    use geo::{polygon, MultiPolygon};

    fn boundary(name: &str, x0: f64, y0: f64, x1: f64, y1: f64) -> Boundary {
        Boundary {
            name: name.to_string(),
            geometry: MultiPolygon::new(vec![polygon![
                (x: x0, y: y0),
                (x: x1, y: y0),
                (x: x1, y: y1),
                (x: x0, y: y1),
                (x: x0, y: y0),
            ]]),
        }
    }

    fn atlas() -> Atlas {
        Atlas::new(
            vec![
                boundary("Porto", -8.8, 40.8, -7.8, 41.5),
                boundary("Braga", -8.8, 41.5, -7.8, 42.0),
                boundary("Lisboa", -9.5, 38.6, -8.8, 39.3),
                boundary("Narnia", 10.0, 10.0, 11.0, 11.0),
            ],
            &ZoneTable::default(),
        )
    }

    #[test]
    fn districts_are_annotated_once() {
        let atlas = atlas();
        let porto = &atlas.districts()[0];
        assert_eq!(porto.zone, "Porto");
        assert_eq!(porto.color, "#178ae1");
        assert_eq!(atlas.districts()[3].zone, "Unknown");
    }

    #[test]
    fn option_lists_are_sorted_and_unique() {
        let atlas = atlas();
        assert_eq!(atlas.zone_options(), ["Lisboa", "Porto", "Unknown"]);
        assert_eq!(atlas.district_options(), ["Braga", "Lisboa", "Narnia", "Porto"]);
    }

    #[test]
    fn polygon_and_site_views_agree_on_zones() {
        let atlas = atlas();
        let selection = Selection::new(Choice::Only("Porto".into()), Choice::All);
        let sites = atlas.locate_sites(
            vec![
                Site::new("P1", 41.0, -8.0),
                Site::new("L1", 38.7, -9.1),
                Site::new("B1", 41.7, -8.4),
                Site::new("SEA", 0.0, 0.0),
            ],
            &selection,
        );

        let district_names: Vec<_> = atlas.select_districts(&selection).map(|d| d.name.as_str()).collect();
        assert_eq!(district_names, ["Porto", "Braga"]);

        let codes: Vec<_> = sites.iter().map(|s| s.site_code.as_str()).collect();
        assert_eq!(codes, ["P1", "B1"]);
        for site in &sites {
            assert!(district_names.contains(&site.district_name.as_deref().unwrap()));
        }
    }

    #[test]
    fn unfiltered_sites_include_those_outside_all_districts() {
        let sites = atlas().locate_sites(
            vec![Site::new("COD1", 41.0, -8.0), Site::new("SEA", 0.0, 0.0)],
            &Selection::default(),
        );
        assert_eq!(sites[0].district_name.as_deref(), Some("Porto"));
        assert_eq!(sites[0].zone.as_deref(), Some("Porto"));
        assert_eq!(sites[1].district_name, None);
        assert_eq!(sites[1].zone, None);
    }
}

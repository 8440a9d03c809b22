//! Payloads handed to the browser map: styled district features and site markers.

use crate::types::{District, Site};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use quick_xml::escape::escape;
use serde::Serialize;
use serde_json::json;

const OUTLINE_COLOR: &str = "black";
const OUTLINE_WEIGHT: u32 = 1;
const FILL_OPACITY: f64 = 0.6;

/// Polygon feature with the tooltip fields and fill style of one district.
pub fn district_feature(district: &District) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("district".to_string(), json!(district.name));
    properties.insert("zone".to_string(), json!(district.zone));
    properties.insert("color".to_string(), json!(district.color));
    properties.insert(
        "style".to_string(),
        json!({
            "fillColor": district.color,
            "color": OUTLINE_COLOR,
            "weight": OUTLINE_WEIGHT,
            "fillOpacity": FILL_OPACITY,
        }),
    );

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::from(&district.geometry))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

pub fn district_collection<'a>(districts: impl IntoIterator<Item = &'a District>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: districts.into_iter().map(district_feature).collect(),
        foreign_members: None,
    }
}

/// One site as drawn on the map, with navigation deep links.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteMarker {
    pub site_code: String,
    pub latitude: f64,
    pub longitude: f64,
    pub district: Option<String>,
    pub zone: Option<String>,
    pub google_maps_url: String,
    pub waze_url: String,
    pub popup_html: String,
}

pub fn google_maps_url(latitude: f64, longitude: f64) -> String {
    format!("https://www.google.com/maps/dir/?api=1&destination={latitude},{longitude}")
}

pub fn waze_url(latitude: f64, longitude: f64) -> String {
    format!("https://waze.com/ul?ll={latitude},{longitude}&navigate=yes")
}

impl From<&Site> for SiteMarker {
    fn from(site: &Site) -> Self {
        let google = google_maps_url(site.latitude, site.longitude);
        let waze = waze_url(site.latitude, site.longitude);
        let popup_html = format!(
            "<b>{code}</b><br><a href='{google}' target='_blank'>Google Maps</a><br><a href='{waze}' target='_blank'>Waze</a>",
            code = escape(site.site_code.as_str()),
        );
        Self {
            site_code: site.site_code.clone(),
            latitude: site.latitude,
            longitude: site.longitude,
            district: site.district_name.clone(),
            zone: site.zone.clone(),
            google_maps_url: google,
            waze_url: waze,
            popup_html,
        }
    }
}

pub fn site_markers(sites: &[Site]) -> Vec<SiteMarker> {
    sites.iter().map(SiteMarker::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon};

    #[test]
    fn district_feature_carries_tooltip_and_style() {
        let district = District {
            name: "Porto".into(),
            geometry: MultiPolygon::new(vec![polygon![
                (x: 0.0, y: 0.0),
                (x: 1.0, y: 0.0),
                (x: 1.0, y: 1.0),
                (x: 0.0, y: 0.0),
            ]]),
            zone: "Porto".into(),
            color: "#178ae1".into(),
        };
        let feature = district_feature(&district);
        assert_eq!(feature.property("district"), Some(&json!("Porto")));
        assert_eq!(feature.property("zone"), Some(&json!("Porto")));
        let style = feature.property("style").unwrap();
        assert_eq!(style["fillColor"], "#178ae1");
        assert_eq!(style["color"], "black");
        assert!(matches!(
            feature.geometry.unwrap().value,
            Value::MultiPolygon(_)
        ));

        let collection = district_collection([&district, &district]);
        assert_eq!(collection.features.len(), 2);
    }

    #[test]
    fn marker_links_interpolate_coordinates() {
        let site = Site::new("COD1", 41.15, -8.61);
        let marker = SiteMarker::from(&site);
        assert_eq!(
            marker.google_maps_url,
            "https://www.google.com/maps/dir/?api=1&destination=41.15,-8.61"
        );
        assert_eq!(marker.waze_url, "https://waze.com/ul?ll=41.15,-8.61&navigate=yes");
        assert!(marker.popup_html.starts_with("<b>COD1</b><br>"));
        assert!(marker.popup_html.contains(&marker.waze_url));
        assert_eq!(marker.district, None);
    }

    #[test]
    fn popup_escapes_site_code_markup() {
        let marker = SiteMarker::from(&Site::new("<IMG SRC=X ONERROR=ALERT(1)>", 41.15, -8.61));
        assert!(marker
            .popup_html
            .starts_with("<b>&lt;IMG SRC=X ONERROR=ALERT(1)&gt;</b><br>"));
        assert!(!marker.popup_html.contains("<IMG"));
        assert_eq!(marker.site_code, "<IMG SRC=X ONERROR=ALERT(1)>");
    }
}

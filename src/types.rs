use geo::{MultiPolygon, Point};

/// One administrative district from the boundary dataset.
///
/// `zone` and `color` are derived once at load time and reused across filter changes.
#[derive(Debug, Clone)]
pub struct District {
    pub name: String,
    pub geometry: MultiPolygon<f64>,
    pub zone: String,
    pub color: String,
}

/// One uploaded site. `district_name`/`zone` stay `None` until joined,
/// and remain `None` when no district contains the point.
#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    pub site_code: String,
    pub latitude: f64,
    pub longitude: f64,
    pub district_name: Option<String>,
    pub zone: Option<String>,
}

impl Site {
    pub fn new(site_code: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            site_code: site_code.into(),
            latitude,
            longitude,
            district_name: None,
            zone: None,
        }
    }

    /// Geographic point in (x = longitude, y = latitude) order.
    pub fn point(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }
}

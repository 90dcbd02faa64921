//! Display coordinates for Taiwan's first-level administrative regions.
//!
//! Points are hand-placed rather than true centroids: a few are nudged so
//! neighbouring labels don't collide (新北市 sits south of 臺北市, 嘉義縣
//! and 高雄市 lean inland).

use serde::Serialize;

/// Map placement for one region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegionCoordinate {
    pub name: &'static str,
    pub latitude: f64,
    pub longitude: f64,
}

const fn region(name: &'static str, latitude: f64, longitude: f64) -> RegionCoordinate {
    RegionCoordinate {
        name,
        latitude,
        longitude,
    }
}

pub const REGION_COORDINATES: &[RegionCoordinate] = &[
    region("基隆市", 25.13, 121.74),
    region("臺北市", 25.09, 121.56),
    region("新北市", 24.95, 121.48),
    region("桃園市", 24.93, 121.25),
    region("新竹市", 24.80, 120.97),
    region("新竹縣", 24.70, 121.10),
    region("苗栗縣", 24.50, 120.90),
    region("臺中市", 24.15, 120.68),
    region("彰化縣", 24.00, 120.45),
    region("南投縣", 23.90, 120.95),
    region("雲林縣", 23.70, 120.43),
    region("嘉義市", 23.48, 120.45),
    region("嘉義縣", 23.45, 120.60),
    region("臺南市", 23.15, 120.25),
    region("高雄市", 22.80, 120.45),
    region("屏東縣", 22.45, 120.60),
    region("宜蘭縣", 24.60, 121.70),
    region("花蓮縣", 23.80, 121.50),
    region("臺東縣", 22.90, 121.10),
    region("澎湖縣", 23.57, 119.60),
    region("金門縣", 24.44, 118.33),
    region("連江縣", 26.15, 119.93),
];

/// Initial map view: roughly the middle of the main island.
pub const MAP_CENTER: (f64, f64) = (23.7, 121.0);
pub const MAP_ZOOM: u8 = 8;

/// Look up the display point for a region name. Exact match only.
pub fn coordinate_for(name: &str) -> Option<&'static RegionCoordinate> {
    REGION_COORDINATES.iter().find(|c| c.name == name)
}

//! Temperature map: per-region markers and labels on a Leaflet base map.
//!
//! `render` is pure. It turns records into a `MapArtifact`; `to_html`
//! wraps that artifact in a standalone Leaflet page for the browser.

use html_escape::encode_text;
use serde::Serialize;

use crate::regions::{coordinate_for, MAP_CENTER, MAP_ZOOM};
use crate::types::ForecastRecord;

pub const MARKER_RADIUS: u32 = 15;
pub const MARKER_FILL_OPACITY: f64 = 0.3;
/// Degrees of latitude between the temperature label and the region name.
pub const NAME_LABEL_OFFSET: f64 = 0.08;
pub const TILE_STYLE: &str = "CartoDB positron";

const TILE_URL: &str = "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png";
const TILE_ATTRIBUTION: &str = "&copy; OpenStreetMap contributors &copy; CARTO";

/// Temperature bands used for marker and label colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureBand {
    Cold,
    Cool,
    Warm,
    Hot,
}

impl TemperatureBand {
    /// Lower bound inclusive, upper bound exclusive; the top band is open.
    pub fn from_celsius(temp: f64) -> Self {
        if temp < 15.0 {
            Self::Cold
        } else if temp < 20.0 {
            Self::Cool
        } else if temp < 28.0 {
            Self::Warm
        } else {
            Self::Hot
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::Cold => "#3182ce",
            Self::Cool => "#38a169",
            Self::Warm => "#dd6b20",
            Self::Hot => "#e53e3e",
        }
    }
}

/// Color for a temperature in °C.
pub fn band(temp: f64) -> &'static str {
    TemperatureBand::from_celsius(temp).color()
}

/// Everything drawn for one region.
#[derive(Debug, Clone, Serialize)]
pub struct RegionMarker {
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    pub average_temperature: f64,
    pub band: TemperatureBand,
    pub color: &'static str,
    /// Whole-degree label, e.g. "21°C"
    pub temperature_label: String,
    pub name_label_latitude: f64,
    pub popup_html: String,
    pub temperature_html: String,
    pub name_html: String,
}

impl RegionMarker {
    fn new(record: &ForecastRecord, latitude: f64, longitude: f64) -> Self {
        let average_temperature = record.average_temperature();
        let band = TemperatureBand::from_celsius(average_temperature);
        let color = band.color();
        // Truncate toward zero: 21.5 shows as 21°C
        let temperature_label = format!("{}°C", average_temperature.trunc() as i64);
        let location = encode_text(&record.location);

        let popup_html = format!(
            "<b>{}</b><br>{}<br>氣溫: {}-{}°C<br>降雨: {}%",
            location,
            encode_text(&record.weather_description),
            record.min_temperature,
            record.max_temperature,
            record.precipitation_probability,
        );
        let temperature_html = format!(
            "<div style=\"font-size: 14px; font-weight: bold; color: {}; text-align: center; \
             text-shadow: 1px 1px 2px white;\">{}</div>",
            color, temperature_label
        );
        let name_html = format!(
            "<div style=\"font-size: 10px; color: #555; text-align: center; \
             text-shadow: 1px 1px 0px white;\">{}</div>",
            location
        );

        Self {
            location: record.location.clone(),
            latitude,
            longitude,
            average_temperature,
            band,
            color,
            temperature_label,
            name_label_latitude: latitude - NAME_LABEL_OFFSET,
            popup_html,
            temperature_html,
            name_html,
        }
    }
}

/// A rendered map: view settings plus one marker per placeable region.
#[derive(Debug, Clone, Serialize)]
pub struct MapArtifact {
    pub center: (f64, f64),
    pub zoom: u8,
    pub tile_style: &'static str,
    pub marker_radius: u32,
    pub fill_opacity: f64,
    pub markers: Vec<RegionMarker>,
    /// Regions left off the map because they have no coordinate
    pub skipped: Vec<String>,
}

impl MapArtifact {
    pub fn marker(&self, location: &str) -> Option<&RegionMarker> {
        self.markers.iter().find(|m| m.location == location)
    }

    /// Standalone Leaflet page showing this map.
    pub fn to_html(&self) -> Result<String, serde_json::Error> {
        // Keep "</script>" inside strings from closing the script element
        let data = serde_json::to_string(self)?.replace("</", "<\\/");

        Ok(MAP_PAGE_TEMPLATE
            .replace("__TILE_URL__", TILE_URL)
            .replace("__TILE_ATTRIBUTION__", TILE_ATTRIBUTION)
            .replace("__MAP_DATA__", &data))
    }
}

/// Build the map for `records`. Regions without a coordinate are skipped.
pub fn render<'a, I>(records: I) -> MapArtifact
where
    I: IntoIterator<Item = &'a ForecastRecord>,
{
    let mut markers = Vec::new();
    let mut skipped = Vec::new();

    for record in records {
        match coordinate_for(&record.location) {
            Some(coord) => {
                markers.push(RegionMarker::new(record, coord.latitude, coord.longitude));
            }
            None => {
                tracing::debug!("No map coordinate for {}, skipping", record.location);
                skipped.push(record.location.clone());
            }
        }
    }

    MapArtifact {
        center: MAP_CENTER,
        zoom: MAP_ZOOM,
        tile_style: TILE_STYLE,
        marker_radius: MARKER_RADIUS,
        fill_opacity: MARKER_FILL_OPACITY,
        markers,
        skipped,
    }
}

const MAP_PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="zh-Hant">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>台灣氣溫分布圖</title>
    <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
    <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
    <style>
        html, body, #map { height: 100%; margin: 0; }
        .region-label { background: none; border: none; }
    </style>
</head>
<body>
    <div id="map"></div>
    <script>
        const data = __MAP_DATA__;
        const map = L.map('map').setView(data.center, data.zoom);
        L.tileLayer('__TILE_URL__', {
            attribution: '__TILE_ATTRIBUTION__',
            subdomains: 'abcd',
            maxZoom: 19
        }).addTo(map);

        const labelIcon = (html) => L.divIcon({
            className: 'region-label',
            iconSize: [150, 36],
            iconAnchor: [75, 12],
            html: html
        });

        for (const m of data.markers) {
            L.circleMarker([m.latitude, m.longitude], {
                radius: data.marker_radius,
                color: m.color,
                fill: true,
                fillColor: m.color,
                fillOpacity: data.fill_opacity
            }).bindPopup(m.popup_html, { maxWidth: 200 }).addTo(map);

            L.marker([m.latitude, m.longitude], { icon: labelIcon(m.temperature_html) }).addTo(map);
            L.marker([m.name_label_latitude, m.longitude], { icon: labelIcon(m.name_html) }).addTo(map);
        }
    </script>
</body>
</html>
"#;

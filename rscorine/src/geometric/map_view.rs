use serde::Serialize;
use serde_json::json;
use std::path::Path;

use crate::collect::global_variables::{DEFAULT_ZOOM, MAP_HEIGHT_PX, MAP_WIDTH_PX};
use crate::collect::platform::{RasterPlatform, TileRequest};
use crate::commons::basic_functions::escape_html;
use crate::error::{CorineError, CorineResult, Stage};
use crate::geo_core::BoundingBox;
use crate::geometric::clip::ClippedRaster;
use crate::geometric::legend::FilteredLegend;

const LEAFLET_VERSION: &str = "1.9.4";
const BASEMAP_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";
const BASEMAP_ATTRIBUTION: &str = "&copy; OpenStreetMap contributors";

/// Classification overlay served by the raster platform
#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    pub name: String,
    pub url_template: String,
}

/// Map of a clipped classification: overlay, region outline, legend and title
#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    pub title: String,
    /// (lat, lon)
    pub center: (f64, f64),
    pub zoom: u8,
    pub bounds: Option<BoundingBox>,
    pub layer: Option<TileLayer>,
    pub boundary: geojson::Geometry,
    pub legend: FilteredLegend,
}

/// Compose the map for `clipped`, coloured with `legend`
pub fn render<P: RasterPlatform + ?Sized>(
    platform: &P,
    clipped: &ClippedRaster,
    legend: &FilteredLegend,
    title: &str,
) -> CorineResult<MapView> {
    let request = TileRequest {
        band: clipped.band().id.clone(),
        region: clipped.region().to_geojson(),
        palette: legend.palette(),
    };
    let layer = platform
        .tile_url(clipped.dataset(), &request)
        .map_err(|e| CorineError::platform(Stage::Render, e))?
        .map(|url_template| TileLayer {
            name: title.to_string(),
            url_template,
        });

    if layer.is_none() {
        log::warn!("Platform serves no tiles for {}, the map shows the outline only", clipped.dataset());
    }

    let bounds = clipped.region().bbox();
    let center = match clipped.region().centroid() {
        Some(c) => (c.y(), c.x()),
        None => bounds.map(|b| {
            let (lon, lat) = b.center();
            (lat, lon)
        }).unwrap_or((0.0, 0.0)),
    };

    Ok(MapView {
        title: title.to_string(),
        center,
        zoom: DEFAULT_ZOOM,
        bounds,
        layer,
        boundary: clipped.region().to_geojson(),
        legend: legend.clone(),
    })
}

impl MapView {
    pub fn with_zoom(mut self, zoom: u8) -> Self {
        self.zoom = zoom;
        self
    }

    /// Standalone Leaflet page of `width` x `height` pixels
    pub fn to_html(&self, width: u32, height: u32) -> String {
        let title = escape_html(&self.title);

        let legend_rows: String = self
            .legend
            .entries()
            .iter()
            .map(|e| {
                format!(
                    "<div class=\"legend-row\"><span class=\"swatch\" style=\"background:{}\"></span>{}</div>",
                    escape_html(&e.color),
                    escape_html(&e.name)
                )
            })
            .collect::<Vec<_>>()
            .join("\n        ");

        let overlay = match self.layer {
            Some(ref layer) => format!(
                "L.tileLayer({}, {{opacity: 0.8}}).addTo(map);",
                script_json(&json!(layer.url_template))
            ),
            None => String::new(),
        };

        let fit = match self.bounds {
            Some(b) => format!("map.fitBounds([[{}, {}], [{}, {}]]);", b.min_y, b.min_x, b.max_y, b.max_x),
            None => String::new(),
        };

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>{title}</title>
  <link rel="stylesheet" href="https://unpkg.com/leaflet@{leaflet}/dist/leaflet.css">
  <script src="https://unpkg.com/leaflet@{leaflet}/dist/leaflet.js"></script>
  <style>
    #map {{ width: {width}px; height: {height}px; }}
    .legend {{ background: white; padding: 6px 8px; font: 12px sans-serif; }}
    .legend-row {{ margin: 2px 0; }}
    .swatch {{ display: inline-block; width: 12px; height: 12px; margin-right: 6px; border: 1px solid #555; }}
  </style>
</head>
<body>
  <h3>{title}</h3>
  <div id="map"></div>
  <div id="legend" class="legend">
    <strong>{title}</strong>
        {legend_rows}
  </div>
  <script>
    var map = L.map('map').setView([{lat}, {lon}], {zoom});
    L.tileLayer({basemap}, {{attribution: {attribution}}}).addTo(map);
    {overlay}
    L.geoJSON({boundary}, {{style: {{color: '#000000', weight: 2, fill: false}}}}).addTo(map);
    {fit}
    var legend = L.control({{position: 'bottomright'}});
    legend.onAdd = function () {{ return document.getElementById('legend'); }};
    legend.addTo(map);
  </script>
  {footer}
</body>
</html>
"#,
            title = title,
            leaflet = LEAFLET_VERSION,
            width = width,
            height = height,
            legend_rows = legend_rows,
            lat = self.center.0,
            lon = self.center.1,
            zoom = self.zoom,
            basemap = json!(BASEMAP_URL),
            attribution = json!(BASEMAP_ATTRIBUTION),
            overlay = overlay,
            boundary = script_json(&self.boundary),
            fit = fit,
            footer = footer(),
        )
    }

    /// Write the page at the default export size
    pub fn save_html(&self, path: &Path) -> CorineResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CorineError::Export(format!("failed to create directory {:?}: {}", parent, e))
            })?;
        }
        std::fs::write(path, self.to_html(MAP_WIDTH_PX, MAP_HEIGHT_PX))
            .map_err(|e| CorineError::Export(format!("failed to write {:?}: {}", path, e)))?;
        log::info!("Map saved to: {:?}", path);
        Ok(())
    }
}

/// JSON literal safe to embed in a `<script>` element
fn script_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "null".to_string())
        .replace("</", "<\\/")
}

#[cfg(feature = "chrono")]
fn footer() -> String {
    format!(
        "<p style=\"font: 10px sans-serif; color: #777\">Generated {}</p>",
        chrono::Utc::now().format("%Y-%m-%d %H:%M UTC")
    )
}

#[cfg(not(feature = "chrono"))]
fn footer() -> String {
    String::new()
}

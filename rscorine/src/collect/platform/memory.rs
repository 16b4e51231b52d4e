use geo::{Contains, GeodesicArea, Point, Rect};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::{
    BandInfo, DatasetDescription, RasterPlatform, ReduceRequest, ReduceResponse, Reducer,
    TileRequest,
};
use crate::error::PlatformError;
use crate::geo_core::{BoundingBox, RegionOfInterest};

/// Categorical grid on a regular lon/lat lattice.
///
/// Row 0 is the northern edge. `None` marks cells without data.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassGrid {
    /// Longitude of the western edge
    pub origin_lon: f64,
    /// Latitude of the northern edge
    pub origin_lat: f64,
    /// Cell size in degrees, both axes
    pub cell_deg: f64,
    pub width: usize,
    pub height: usize,
    cells: Vec<Option<i64>>,
}

impl ClassGrid {
    pub fn new(
        origin_lon: f64,
        origin_lat: f64,
        cell_deg: f64,
        width: usize,
        height: usize,
        cells: Vec<Option<i64>>,
    ) -> Result<Self, PlatformError> {
        if cells.len() != width * height {
            return Err(PlatformError::Decode(format!(
                "grid of {}x{} needs {} cells, got {}",
                width,
                height,
                width * height,
                cells.len()
            )));
        }
        if !(cell_deg.is_finite() && cell_deg > 0.0) {
            return Err(PlatformError::Decode(format!("invalid cell size {}", cell_deg)));
        }
        Ok(ClassGrid {
            origin_lon,
            origin_lat,
            cell_deg,
            width,
            height,
            cells,
        })
    }

    /// Grid filled with a single class
    pub fn filled(
        origin_lon: f64,
        origin_lat: f64,
        cell_deg: f64,
        width: usize,
        height: usize,
        code: i64,
    ) -> Self {
        ClassGrid {
            origin_lon,
            origin_lat,
            cell_deg,
            width,
            height,
            cells: vec![Some(code); width * height],
        }
    }

    pub fn get(&self, row: usize, col: usize) -> Option<i64> {
        self.cells.get(row * self.width + col).copied().flatten()
    }

    pub fn set(&mut self, row: usize, col: usize, value: Option<i64>) {
        if row < self.height && col < self.width {
            self.cells[row * self.width + col] = value;
        }
    }

    pub fn cell_center(&self, row: usize, col: usize) -> Point<f64> {
        Point::new(
            self.origin_lon + (col as f64 + 0.5) * self.cell_deg,
            self.origin_lat - (row as f64 + 0.5) * self.cell_deg,
        )
    }

    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::new(
            self.origin_lon,
            self.origin_lat - self.height as f64 * self.cell_deg,
            self.origin_lon + self.width as f64 * self.cell_deg,
            self.origin_lat,
        )
    }

    /// Geodesic area of the central cell, in square metres
    fn central_cell_area_m2(&self) -> f64 {
        let row = self.height / 2;
        let col = self.width / 2;
        let min_x = self.origin_lon + col as f64 * self.cell_deg;
        let max_y = self.origin_lat - row as f64 * self.cell_deg;
        Rect::new((min_x, max_y - self.cell_deg), (min_x + self.cell_deg, max_y))
            .to_polygon()
            .geodesic_area_unsigned()
    }

    /// Row/column window of cells whose extent overlaps `bbox`
    fn window(&self, bbox: &BoundingBox) -> Option<(std::ops::Range<usize>, std::ops::Range<usize>)> {
        if !self.bbox().intersects(bbox) {
            return None;
        }
        let col_start = ((bbox.min_x - self.origin_lon) / self.cell_deg).floor().max(0.0) as usize;
        let col_end = (((bbox.max_x - self.origin_lon) / self.cell_deg).ceil() as usize).min(self.width);
        let row_start = ((self.origin_lat - bbox.max_y) / self.cell_deg).floor().max(0.0) as usize;
        let row_end = (((self.origin_lat - bbox.min_y) / self.cell_deg).ceil() as usize).min(self.height);
        Some((row_start..row_end, col_start..col_end))
    }
}

/// In-process raster platform backed by a [`ClassGrid`].
///
/// Implements the same contract as a remote deployment: pixel-centre clipping, native
/// scale only, `max_pixels` enforced. The reported pixel size is the side of a square
/// with the geodesic area of the central cell, so areas are accurate for grids that span
/// a small latitude range.
pub struct MemoryPlatform {
    dataset: String,
    band: BandInfo,
    properties: Map<String, Value>,
    grid: ClassGrid,
    tile_url: Option<String>,
}

impl MemoryPlatform {
    pub fn new(dataset: impl Into<String>, band: impl Into<String>, grid: ClassGrid) -> Self {
        let side = grid.central_cell_area_m2().sqrt();
        MemoryPlatform {
            dataset: dataset.into(),
            band: BandInfo {
                id: band.into(),
                crs: "EPSG:4326".to_string(),
                pixel_size: [side, -side],
            },
            properties: Map::new(),
            grid,
            tile_url: None,
        }
    }

    /// Publish legend properties for the band, in the platform's property layout
    pub fn with_legend<N, V, P>(mut self, names: N, values: V, palette: P) -> Self
    where
        N: IntoIterator,
        N::Item: Into<Value>,
        V: IntoIterator,
        V::Item: Into<Value>,
        P: IntoIterator,
        P::Item: Into<Value>,
    {
        let band = self.band.id.clone();
        let list = |items: Vec<Value>| Value::Array(items);
        self.properties.insert(
            format!("{}_class_names", band),
            list(names.into_iter().map(Into::into).collect()),
        );
        self.properties.insert(
            format!("{}_class_values", band),
            list(values.into_iter().map(Into::into).collect()),
        );
        self.properties.insert(
            format!("{}_class_palette", band),
            list(palette.into_iter().map(Into::into).collect()),
        );
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// Serve this URL template from `tile_url`
    pub fn with_tile_url(mut self, url_template: impl Into<String>) -> Self {
        self.tile_url = Some(url_template.into());
        self
    }

    pub fn band(&self) -> &BandInfo {
        &self.band
    }

    pub fn grid(&self) -> &ClassGrid {
        &self.grid
    }

    fn check_dataset(&self, dataset: &str) -> Result<(), PlatformError> {
        if dataset != self.dataset {
            return Err(PlatformError::Status {
                status: 404,
                body: format!("dataset {} not found", dataset),
            });
        }
        Ok(())
    }

    /// Values of every valid cell whose centre lies inside the region
    fn values_in(&self, request: &ReduceRequest) -> Result<Vec<i64>, PlatformError> {
        if request.band != self.band.id {
            return Err(PlatformError::Status {
                status: 400,
                body: format!("band {} not found", request.band),
            });
        }
        let scale = self.band.scale();
        if (request.scale - scale).abs() > 1e-6 * scale {
            return Err(PlatformError::Status {
                status: 400,
                body: format!("only native scale {} is supported, got {}", scale, request.scale),
            });
        }
        let region = RegionOfInterest::from_geojson(&request.region)
            .map_err(|e| PlatformError::Decode(format!("{:#}", e)))?;
        let bbox = match region.bbox() {
            Some(bbox) => bbox,
            None => return Ok(Vec::new()),
        };
        let (rows, cols) = match self.grid.window(&bbox) {
            Some(window) => window,
            None => return Ok(Vec::new()),
        };

        let candidates = (rows.len() * cols.len()) as u64;
        if candidates > request.max_pixels {
            return Err(PlatformError::Status {
                status: 400,
                body: format!(
                    "too many pixels in the region ({} > max_pixels {})",
                    candidates, request.max_pixels
                ),
            });
        }

        let mut values = Vec::new();
        for row in rows {
            for col in cols.clone() {
                if let Some(value) = self.grid.get(row, col) {
                    if region.geometry().contains(&self.grid.cell_center(row, col)) {
                        values.push(value);
                    }
                }
            }
        }
        Ok(values)
    }
}

impl RasterPlatform for MemoryPlatform {
    fn describe(&self, dataset: &str) -> Result<DatasetDescription, PlatformError> {
        self.check_dataset(dataset)?;
        Ok(DatasetDescription {
            id: self.dataset.clone(),
            bands: vec![self.band.clone()],
            properties: self.properties.clone(),
        })
    }

    fn reduce_region(
        &self,
        dataset: &str,
        request: &ReduceRequest,
    ) -> Result<ReduceResponse, PlatformError> {
        self.check_dataset(dataset)?;
        let values = self.values_in(request)?;

        let response = match request.reducer {
            Reducer::Count => ReduceResponse {
                pixels: Some(values.len() as u64),
                histogram: None,
            },
            Reducer::ClassCount { code } => ReduceResponse {
                pixels: Some(values.iter().filter(|v| **v == code).count() as u64),
                histogram: None,
            },
            Reducer::FrequencyHistogram => {
                let mut histogram: BTreeMap<String, u64> = BTreeMap::new();
                for value in values {
                    *histogram.entry(value.to_string()).or_insert(0) += 1;
                }
                ReduceResponse {
                    pixels: None,
                    histogram: Some(histogram),
                }
            }
        };
        Ok(response)
    }

    fn tile_url(&self, dataset: &str, _request: &TileRequest) -> Result<Option<String>, PlatformError> {
        self.check_dataset(dataset)?;
        Ok(self.tile_url.clone())
    }
}

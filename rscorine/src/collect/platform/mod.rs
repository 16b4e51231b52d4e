//! Client side of the remote raster platform.
//!
//! The platform stores the classification imagery and runs reductions over it; this crate
//! only describes what to compute. [`RasterPlatform`] is the session object every step
//! borrows: [`http::HttpPlatform`] talks to a real deployment, [`memory::MemoryPlatform`]
//! answers from an in-process grid for tests and offline demos.

pub mod http;
pub mod memory;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::{CorineError, CorineResult, PlatformError};
use crate::geometric::legend::LegendMetadata;

/// Band of a dataset, with its native grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandInfo {
    pub id: String,
    pub crs: String,
    /// Native pixel size in metres, `[x, y]` (y is usually negative)
    pub pixel_size: [f64; 2],
}

impl BandInfo {
    /// Native ground sample distance in metres
    pub fn scale(&self) -> f64 {
        self.pixel_size[0].abs()
    }

    /// Surface of one native pixel, in hectares
    pub fn pixel_area_ha(&self) -> CorineResult<f64> {
        let [x, y] = self.pixel_size;
        if !(x.is_finite() && y.is_finite()) || x == 0.0 || y == 0.0 {
            return Err(CorineError::MalformedMetadata(format!(
                "band {} has an unusable pixel size {:?}",
                self.id, self.pixel_size
            )));
        }
        Ok(crate::commons::basic_functions::square_metres_to_hectares((x * y).abs()))
    }
}

/// Dataset description: bands plus free-form image properties (legend lives there)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetDescription {
    pub id: String,
    pub bands: Vec<BandInfo>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl DatasetDescription {
    pub fn band(&self, band: &str) -> CorineResult<&BandInfo> {
        self.bands.iter().find(|b| b.id == band).ok_or_else(|| {
            CorineError::MalformedMetadata(format!("dataset {} has no band {:?}", self.id, band))
        })
    }

    /// The three parallel legend properties of `band`:
    /// `<band>_class_names`, `<band>_class_values`, `<band>_class_palette`.
    ///
    /// Values may be published as JSON numbers or strings; both are kept as text and
    /// parsed when the legend is resolved.
    pub fn legend_metadata(&self, band: &str) -> CorineResult<LegendMetadata> {
        Ok(LegendMetadata {
            names: self.string_list(&format!("{}_class_names", band))?,
            values: self.string_list(&format!("{}_class_values", band))?,
            palette: self.string_list(&format!("{}_class_palette", band))?,
        })
    }

    fn string_list(&self, key: &str) -> CorineResult<Vec<String>> {
        let items = self
            .properties
            .get(key)
            .and_then(Value::as_array)
            .ok_or_else(|| {
                CorineError::MalformedMetadata(format!(
                    "property {} is missing or not a list on {}",
                    key, self.id
                ))
            })?;

        items
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::String(s) => Ok(s.clone()),
                Value::Number(n) => Ok(n.to_string()),
                other => Err(CorineError::MalformedMetadata(format!(
                    "{}[{}] is neither a string nor a number: {}",
                    key, i, other
                ))),
            })
            .collect()
    }
}

/// Which pixels of the grid belong to a region.
///
/// Only the pixel-centre rule is used: a pixel counts fully when its centre lies
/// inside the polygon and not at all otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelRule {
    Center,
}

/// Server-side aggregation to run over the masked raster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Reducer {
    /// Number of valid (unmasked) pixels
    Count,
    /// Sum of the `value == code` mask, i.e. pixels of one class
    ClassCount { code: i64 },
    /// Pixel count per distinct value
    FrequencyHistogram,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReduceRequest {
    pub band: String,
    pub region: geojson::Geometry,
    /// Metres per pixel at which to reduce (native resolution)
    pub scale: f64,
    pub max_pixels: u64,
    pub pixel_rule: PixelRule,
    pub reducer: Reducer,
}

/// Reduction result. `pixels` answers `Count`/`ClassCount`, `histogram` answers
/// `FrequencyHistogram` (keys are class values as text).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReduceResponse {
    #[serde(default)]
    pub pixels: Option<u64>,
    #[serde(default)]
    pub histogram: Option<BTreeMap<String, u64>>,
}

impl ReduceResponse {
    pub fn pixels(&self) -> Result<u64, PlatformError> {
        self.pixels
            .ok_or_else(|| PlatformError::Decode("reduction returned no pixel count".to_string()))
    }

    /// Histogram keyed by class code. Keys such as `"211.0"` are accepted when integral.
    pub fn histogram(&self) -> Result<BTreeMap<i64, u64>, PlatformError> {
        let raw = self
            .histogram
            .as_ref()
            .ok_or_else(|| PlatformError::Decode("reduction returned no histogram".to_string()))?;

        raw.iter()
            .map(|(key, count)| {
                parse_class_key(key)
                    .map(|code| (code, *count))
                    .ok_or_else(|| {
                        PlatformError::Decode(format!("histogram key {:?} is not a class code", key))
                    })
            })
            .collect()
    }
}

fn parse_class_key(key: &str) -> Option<i64> {
    let key = key.trim();
    if let Ok(code) = key.parse::<i64>() {
        return Some(code);
    }
    let value = key.parse::<f64>().ok()?;
    (value.is_finite() && value.fract() == 0.0).then_some(value as i64)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteEntry {
    pub code: i64,
    pub color: String,
}

/// Request for a displayable tile layer of the masked raster
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileRequest {
    pub band: String,
    pub region: geojson::Geometry,
    pub palette: Vec<PaletteEntry>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TileResponse {
    pub url_template: String,
}

/// Session with a raster platform.
///
/// Acquired once, then passed by reference to every step. Implementations must be
/// shareable across the aggregation worker threads.
pub trait RasterPlatform: Send + Sync {
    /// Bands and properties of `dataset`
    fn describe(&self, dataset: &str) -> Result<DatasetDescription, PlatformError>;

    /// Run one reduction of `dataset` over the request's region
    fn reduce_region(
        &self,
        dataset: &str,
        request: &ReduceRequest,
    ) -> Result<ReduceResponse, PlatformError>;

    /// XYZ tile URL template (`{z}/{x}/{y}`) for the masked raster, if the platform serves tiles
    fn tile_url(&self, dataset: &str, request: &TileRequest) -> Result<Option<String>, PlatformError>;
}

#![allow(dead_code)]

use rscorine::collect::platform::{
    BandInfo, DatasetDescription, RasterPlatform, ReduceRequest, ReduceResponse, Reducer,
    TileRequest,
};
use rscorine::PlatformError;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub const DATASET: &str = "COPERNICUS/CORINE/V20/100m/2018";
pub const BAND: &str = "landcover";

/// CORINE Land Cover nomenclature: (code, hierarchical name, colour)
pub const CORINE_CLASSES: [(i64, &str, &str); 44] = [
    (111, "Artificial surfaces; Urban fabric; Continuous urban fabric", "E6004D"),
    (112, "Artificial surfaces; Urban fabric; Discontinuous urban fabric", "FF0000"),
    (121, "Artificial surfaces; Industrial, commercial and transport units; Industrial or commercial units", "CC4DF2"),
    (122, "Artificial surfaces; Industrial, commercial and transport units; Road and rail networks and associated land", "CC0000"),
    (123, "Artificial surfaces; Industrial, commercial and transport units; Port areas", "E6CCCC"),
    (124, "Artificial surfaces; Industrial, commercial and transport units; Airports", "E6CCE6"),
    (131, "Artificial surfaces; Mine, dump and construction sites; Mineral extraction sites", "A600CC"),
    (132, "Artificial surfaces; Mine, dump and construction sites; Dump sites", "A64DCC"),
    (133, "Artificial surfaces; Mine, dump and construction sites; Construction sites", "FF4DFF"),
    (141, "Artificial surfaces; Artificial, non-agricultural vegetated areas; Green urban areas", "FFA6FF"),
    (142, "Artificial surfaces; Artificial, non-agricultural vegetated areas; Sport and leisure facilities", "FFE6FF"),
    (211, "Agricultural areas; Arable land; Non-irrigated arable land", "FFFFA8"),
    (212, "Agricultural areas; Arable land; Permanently irrigated land", "FFFF00"),
    (213, "Agricultural areas; Arable land; Rice fields", "E6E600"),
    (221, "Agricultural areas; Permanent crops; Vineyards", "E68000"),
    (222, "Agricultural areas; Permanent crops; Fruit trees and berry plantations", "F2A64D"),
    (223, "Agricultural areas; Permanent crops; Olive groves", "E6A600"),
    (231, "Agricultural areas; Pastures; Pastures", "E6E64D"),
    (241, "Agricultural areas; Heterogeneous agricultural areas; Annual crops associated with permanent crops", "FFE6A6"),
    (242, "Agricultural areas; Heterogeneous agricultural areas; Complex cultivation patterns", "FFE64D"),
    (243, "Agricultural areas; Heterogeneous agricultural areas; Land principally occupied by agriculture with significant areas of natural vegetation", "E6CC4D"),
    (244, "Agricultural areas; Heterogeneous agricultural areas; Agro-forestry areas", "F2CCA6"),
    (311, "Forest and semi natural areas; Forests; Broad-leaved forest", "80FF00"),
    (312, "Forest and semi natural areas; Forests; Coniferous forest", "00A600"),
    (313, "Forest and semi natural areas; Forests; Mixed forest", "4DFF00"),
    (321, "Forest and semi natural areas; Scrub and/or herbaceous vegetation associations; Natural grasslands", "CCF24D"),
    (322, "Forest and semi natural areas; Scrub and/or herbaceous vegetation associations; Moors and heathland", "A6FF80"),
    (323, "Forest and semi natural areas; Scrub and/or herbaceous vegetation associations; Sclerophyllous vegetation", "A6E64D"),
    (324, "Forest and semi natural areas; Scrub and/or herbaceous vegetation associations; Transitional woodland-shrub", "A6F200"),
    (331, "Forest and semi natural areas; Open spaces with little or no vegetation; Beaches, dunes, sands", "E6E6E6"),
    (332, "Forest and semi natural areas; Open spaces with little or no vegetation; Bare rocks", "CCCCCC"),
    (333, "Forest and semi natural areas; Open spaces with little or no vegetation; Sparsely vegetated areas", "CCFFCC"),
    (334, "Forest and semi natural areas; Open spaces with little or no vegetation; Burnt areas", "000000"),
    (335, "Forest and semi natural areas; Open spaces with little or no vegetation; Glaciers and perpetual snow", "A6E6CC"),
    (411, "Wetlands; Inland wetlands; Inland marshes", "A6A6FF"),
    (412, "Wetlands; Inland wetlands; Peat bogs", "4D4DFF"),
    (421, "Wetlands; Maritime wetlands; Salt marshes", "CCCCFF"),
    (422, "Wetlands; Maritime wetlands; Salines", "E6E6FF"),
    (423, "Wetlands; Maritime wetlands; Intertidal flats", "A6A6E6"),
    (511, "Water bodies; Inland waters; Water courses", "00CCF2"),
    (512, "Water bodies; Inland waters; Water bodies", "80F2E6"),
    (521, "Water bodies; Marine waters; Coastal lagoons", "00FFA6"),
    (522, "Water bodies; Marine waters; Estuaries", "A6FFE6"),
    (523, "Water bodies; Marine waters; Sea and ocean", "E6F2FF"),
];

/// Codes and pixel counts of the worked example
pub const WORKED_CODES: [i64; 10] = [111, 112, 121, 142, 211, 231, 242, 311, 312, 313];
pub const WORKED_COUNTS: [u64; 10] = [
    17008, 156346, 65892, 14199, 135779, 146741, 9218, 8066, 99943, 15751,
];
pub const WORKED_KM2: [f64; 10] = [
    170.08, 1563.46, 658.92, 141.99, 1357.79, 1467.41, 92.18, 80.66, 999.43, 157.51,
];

pub fn corine_properties() -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert(
        format!("{}_class_names", BAND),
        json!(CORINE_CLASSES.iter().map(|c| c.1).collect::<Vec<_>>()),
    );
    properties.insert(
        format!("{}_class_values", BAND),
        json!(CORINE_CLASSES.iter().map(|c| c.0).collect::<Vec<_>>()),
    );
    properties.insert(
        format!("{}_class_palette", BAND),
        json!(CORINE_CLASSES.iter().map(|c| c.2).collect::<Vec<_>>()),
    );
    properties
}

/// Platform answering reductions from a fixed table of class counts.
///
/// Reduction requests are recorded so tests can inspect what was asked.
pub struct ScriptedPlatform {
    description: DatasetDescription,
    counts: BTreeMap<i64, u64>,
    fail_code: Option<i64>,
    calls: AtomicUsize,
    reducers: Mutex<Vec<Reducer>>,
}

impl ScriptedPlatform {
    pub fn new(pixel_size_m: f64, counts: &[(i64, u64)]) -> Self {
        ScriptedPlatform {
            description: DatasetDescription {
                id: DATASET.to_string(),
                bands: vec![BandInfo {
                    id: BAND.to_string(),
                    crs: "EPSG:3035".to_string(),
                    pixel_size: [pixel_size_m, -pixel_size_m],
                }],
                properties: corine_properties(),
            },
            counts: counts.iter().copied().collect(),
            fail_code: None,
            calls: AtomicUsize::new(0),
            reducers: Mutex::new(Vec::new()),
        }
    }

    /// The worked example at 100 m
    pub fn worked_example() -> Self {
        let counts: Vec<(i64, u64)> = WORKED_CODES
            .iter()
            .copied()
            .zip(WORKED_COUNTS.iter().copied())
            .collect();
        Self::new(100.0, &counts)
    }

    /// Reductions of `code` fail as if the quota were exhausted
    pub fn failing_on(mut self, code: i64) -> Self {
        self.fail_code = Some(code);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn reducers(&self) -> Vec<Reducer> {
        self.reducers.lock().unwrap().clone()
    }
}

impl RasterPlatform for ScriptedPlatform {
    fn describe(&self, dataset: &str) -> Result<DatasetDescription, PlatformError> {
        assert_eq!(dataset, DATASET);
        Ok(self.description.clone())
    }

    fn reduce_region(
        &self,
        dataset: &str,
        request: &ReduceRequest,
    ) -> Result<ReduceResponse, PlatformError> {
        assert_eq!(dataset, DATASET);
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reducers.lock().unwrap().push(request.reducer.clone());

        match request.reducer {
            Reducer::Count => Ok(ReduceResponse {
                pixels: Some(self.counts.values().sum()),
                histogram: None,
            }),
            Reducer::ClassCount { code } => {
                if self.fail_code == Some(code) {
                    return Err(PlatformError::Status {
                        status: 429,
                        body: "quota exceeded".to_string(),
                    });
                }
                Ok(ReduceResponse {
                    pixels: Some(self.counts.get(&code).copied().unwrap_or(0)),
                    histogram: None,
                })
            }
            Reducer::FrequencyHistogram => Ok(ReduceResponse {
                pixels: None,
                histogram: Some(
                    self.counts
                        .iter()
                        .map(|(code, count)| (code.to_string(), *count))
                        .collect(),
                ),
            }),
        }
    }

    fn tile_url(&self, _dataset: &str, _request: &TileRequest) -> Result<Option<String>, PlatformError> {
        Ok(None)
    }
}

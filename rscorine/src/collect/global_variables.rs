pub const OUTPUT_PATH: &str = "./output";

/// CORINE Land Cover 2018, 100 m release
pub const CORINE_DATASET: &str = "COPERNICUS/CORINE/V20/100m/2018";
pub const LANDCOVER_BAND: &str = "landcover";

pub const DEFAULT_PLATFORM_URL: &str = "http://localhost:8080";
pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
pub const USER_AGENT: &str = concat!("rscorine/", env!("CARGO_PKG_VERSION"));

/// Upper bound on pixels a single reduction may touch
pub const MAX_PIXELS: u64 = 100_000_000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_MAX_WORKERS: usize = 4;

pub const DEFAULT_ZOOM: u8 = 12;
pub const MAP_WIDTH_PX: u32 = 1000;
pub const MAP_HEIGHT_PX: u32 = 700;

pub mod collect;
pub mod commons;
pub mod error;
pub mod geo_core;
pub mod geometric;

pub use error::{CorineError, CorineResult, PlatformError, Stage};
pub use geo_core::{BoundingBox, RegionOfInterest};
pub use geometric::area::{compute_area_by_class, AggregationStrategy, AreaAggregator, AreaRecord, AreaTable};
pub use geometric::clip::{clip, ClippedRaster};
pub use geometric::corine::Corine;
pub use geometric::dataset::ClassificationDataset;
pub use geometric::legend::{filter_legend, resolve_legend, ClassificationLegend, FilteredLegend, LegendEntry};
pub use geometric::map_view::{render, MapView};

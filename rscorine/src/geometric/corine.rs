use std::path::{Path, PathBuf};

use crate::collect::global_variables::{CORINE_DATASET, LANDCOVER_BAND, MAX_PIXELS, OUTPUT_PATH};
use crate::collect::nominatim::Geocoder;
use crate::collect::platform::RasterPlatform;
use crate::error::{CorineError, CorineResult};
use crate::geo_core::RegionOfInterest;
use crate::geometric::area::{AreaAggregator, AreaTable};
use crate::geometric::clip::{clip_with_max_pixels, ClippedRaster};
use crate::geometric::dataset::ClassificationDataset;
use crate::geometric::legend::{ClassificationLegend, FilteredLegend};
use crate::geometric::map_view::{render, MapView};

/// Land-cover composition of one region.
///
/// Opens the classification dataset, clips it to the region, computes the area of every
/// class present and keeps the legend of those classes for display. The platform session
/// is borrowed for the lifetime of the run.
pub struct Corine<'a, P: RasterPlatform + ?Sized> {
    platform: &'a P,
    dataset_id: String,
    band: String,
    output_path: PathBuf,
    aggregator: AreaAggregator,
    max_pixels: u64,
    region: Option<RegionOfInterest>,
    dataset: Option<ClassificationDataset>,
    legend: Option<ClassificationLegend>,
    clipped: Option<ClippedRaster>,
    areas: Option<AreaTable>,
    filtered_legend: Option<FilteredLegend>,
}

impl<'a, P: RasterPlatform + ?Sized> Corine<'a, P> {
    /// Pipeline on CORINE Land Cover 2018, writing to `output_path` (default `./output`)
    pub fn new(platform: &'a P, output_path: Option<String>) -> Self {
        let output_path = PathBuf::from(output_path.as_deref().unwrap_or(OUTPUT_PATH));

        Corine {
            platform,
            dataset_id: CORINE_DATASET.to_string(),
            band: LANDCOVER_BAND.to_string(),
            output_path,
            aggregator: AreaAggregator::default(),
            max_pixels: MAX_PIXELS,
            region: None,
            dataset: None,
            legend: None,
            clipped: None,
            areas: None,
            filtered_legend: None,
        }
    }

    /// Use another classification dataset/band
    pub fn set_dataset(&mut self, dataset_id: &str, band: &str) {
        self.dataset_id = dataset_id.to_string();
        self.band = band.to_string();
        self.clear_results();
    }

    pub fn set_region(&mut self, region: RegionOfInterest) {
        self.region = Some(region);
        self.clear_results();
    }

    /// Look up the boundary of `place` and use it as region
    pub fn set_place<G: Geocoder + ?Sized>(&mut self, geocoder: &G, place: &str) -> CorineResult<()> {
        let region = geocoder.geocode(place)?;
        log::info!("Region: {}", region.name().unwrap_or(place));
        self.set_region(region);
        Ok(())
    }

    pub fn set_aggregator(&mut self, aggregator: AreaAggregator) {
        self.aggregator = aggregator;
        self.clear_results();
    }

    pub fn set_max_pixels(&mut self, max_pixels: u64) {
        self.max_pixels = max_pixels;
        self.clear_results();
    }

    /// Results always describe the current dataset and region, or are absent
    fn clear_results(&mut self) {
        self.dataset = None;
        self.legend = None;
        self.clipped = None;
        self.areas = None;
        self.filtered_legend = None;
    }

    /// Open, clip, aggregate and filter the legend
    pub fn run(&mut self) -> CorineResult<()> {
        self.clear_results();
        let region = self.region.as_ref().ok_or(CorineError::MissingRegion)?;

        let dataset = ClassificationDataset::open(self.platform, &self.dataset_id, &self.band)?;
        let legend = dataset.legend()?;
        let clipped = clip_with_max_pixels(self.platform, &dataset, region, self.max_pixels)?;

        let areas = self
            .aggregator
            .compute_area_by_class(self.platform, &clipped, &legend)?;
        let filtered_legend = legend.filter(areas.codes());

        log::info!(
            "{} of {} classes present, {:.2} ha in total",
            filtered_legend.len(),
            legend.len(),
            areas.total_area_ha()
        );

        self.dataset = Some(dataset);
        self.legend = Some(legend);
        self.clipped = Some(clipped);
        self.areas = Some(areas);
        self.filtered_legend = Some(filtered_legend);
        Ok(())
    }

    pub fn region(&self) -> Option<&RegionOfInterest> {
        self.region.as_ref()
    }

    pub fn dataset(&self) -> Option<&ClassificationDataset> {
        self.dataset.as_ref()
    }

    pub fn legend(&self) -> Option<&ClassificationLegend> {
        self.legend.as_ref()
    }

    pub fn clipped(&self) -> Option<&ClippedRaster> {
        self.clipped.as_ref()
    }

    pub fn areas(&self) -> Option<&AreaTable> {
        self.areas.as_ref()
    }

    pub fn filtered_legend(&self) -> Option<&FilteredLegend> {
        self.filtered_legend.as_ref()
    }

    pub fn get_output_path(&self) -> &Path {
        &self.output_path
    }

    /// Map of the clipped classification with the legend of present classes
    pub fn render_map(&self, title: &str) -> CorineResult<MapView> {
        let clipped = self.clipped.as_ref().ok_or(CorineError::NotRun)?;
        let legend = self.filtered_legend.as_ref().ok_or(CorineError::NotRun)?;
        render(self.platform, clipped, legend, title)
    }

    /// Save the area table as `<name>.csv` (default `areas.csv`) in the output path
    pub fn to_csv(&self, name: Option<&str>) -> CorineResult<PathBuf> {
        let areas = self.areas.as_ref().ok_or(CorineError::NotRun)?;
        let path = self
            .output_path
            .join(format!("{}.csv", name.unwrap_or("areas")));
        areas.save_csv(&path)?;
        Ok(path)
    }

    /// Save the map as `<name>.html` (default `landcover.html`) in the output path
    pub fn to_html(&self, name: Option<&str>, title: &str) -> CorineResult<PathBuf> {
        let map = self.render_map(title)?;
        let path = self
            .output_path
            .join(format!("{}.html", name.unwrap_or("landcover")));
        map.save_html(&path)?;
        Ok(path)
    }
}

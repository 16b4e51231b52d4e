use std::collections::BTreeSet;

use crate::collect::global_variables::MAX_PIXELS;
use crate::collect::platform::{BandInfo, PixelRule, RasterPlatform, ReduceRequest, Reducer};
use crate::error::{CorineError, CorineResult, Stage};
use crate::geo_core::RegionOfInterest;
use crate::geometric::dataset::ClassificationDataset;

/// Classification raster masked to a region of interest.
///
/// Pixels whose centre falls outside the region are no-data for every reduction built
/// from this value; values inside are untouched. The masking itself runs on the platform,
/// this only carries what is needed to address it.
#[derive(Debug, Clone, PartialEq)]
pub struct ClippedRaster {
    dataset: String,
    band: BandInfo,
    region: RegionOfInterest,
    valid_pixels: u64,
    max_pixels: u64,
}

impl ClippedRaster {
    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn band(&self) -> &BandInfo {
        &self.band
    }

    pub fn region(&self) -> &RegionOfInterest {
        &self.region
    }

    /// Pixels left valid by the clip
    pub fn valid_pixels(&self) -> u64 {
        self.valid_pixels
    }

    pub fn max_pixels(&self) -> u64 {
        self.max_pixels
    }

    /// Native pixel surface in hectares, from the band's resolution
    pub fn pixel_area_ha(&self) -> CorineResult<f64> {
        self.band.pixel_area_ha()
    }

    /// Reduction over the clipped pixels, at native scale
    pub fn reduce_request(&self, reducer: Reducer) -> ReduceRequest {
        ReduceRequest {
            band: self.band.id.clone(),
            region: self.region.to_geojson(),
            scale: self.band.scale(),
            max_pixels: self.max_pixels,
            pixel_rule: PixelRule::Center,
            reducer,
        }
    }

    /// Distinct class values present in the clipped raster
    pub fn present_codes<P: RasterPlatform + ?Sized>(&self, platform: &P) -> CorineResult<BTreeSet<i64>> {
        let response = platform
            .reduce_region(&self.dataset, &self.reduce_request(Reducer::FrequencyHistogram))
            .map_err(|e| CorineError::platform(Stage::Reduce, e))?;
        let histogram = response
            .histogram()
            .map_err(|e| CorineError::platform(Stage::Reduce, e))?;

        Ok(histogram
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|(code, _)| code)
            .collect())
    }
}

/// Mask `dataset` to `region` using the pixel-centre rule.
///
/// Fails with [`CorineError::EmptyRegion`] when no valid pixel remains, which is the case
/// when the region lies outside the raster coverage.
pub fn clip<P: RasterPlatform + ?Sized>(
    platform: &P,
    dataset: &ClassificationDataset,
    region: &RegionOfInterest,
) -> CorineResult<ClippedRaster> {
    clip_with_max_pixels(platform, dataset, region, MAX_PIXELS)
}

/// [`clip`] with an explicit per-reduction pixel budget
pub fn clip_with_max_pixels<P: RasterPlatform + ?Sized>(
    platform: &P,
    dataset: &ClassificationDataset,
    region: &RegionOfInterest,
    max_pixels: u64,
) -> CorineResult<ClippedRaster> {
    let empty = || CorineError::EmptyRegion {
        dataset: dataset.id().to_string(),
    };
    if region.is_empty() {
        return Err(empty());
    }

    let mut clipped = ClippedRaster {
        dataset: dataset.id().to_string(),
        band: dataset.band().clone(),
        region: region.clone(),
        valid_pixels: 0,
        max_pixels,
    };

    let response = platform
        .reduce_region(&clipped.dataset, &clipped.reduce_request(Reducer::Count))
        .map_err(|e| CorineError::platform(Stage::Clip, e))?;
    let valid_pixels = response
        .pixels()
        .map_err(|e| CorineError::platform(Stage::Clip, e))?;

    if valid_pixels == 0 {
        return Err(empty());
    }

    log::info!(
        "Clipped {} to {}: {} valid pixels",
        clipped.dataset,
        region.name().unwrap_or("region"),
        valid_pixels
    );
    clipped.valid_pixels = valid_pixels;
    Ok(clipped)
}

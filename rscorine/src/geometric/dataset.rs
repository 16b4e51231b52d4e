use crate::collect::platform::{BandInfo, DatasetDescription, RasterPlatform};
use crate::error::{CorineError, CorineResult, Stage};
use crate::geometric::legend::{resolve_legend, ClassificationLegend, LegendMetadata};

/// Handle on a classification band of a platform dataset.
///
/// Holds the description fetched once at open time; the imagery itself stays remote.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationDataset {
    description: DatasetDescription,
    band: BandInfo,
}

impl ClassificationDataset {
    /// Fetch the description of `dataset` and select `band`
    pub fn open<P: RasterPlatform + ?Sized>(
        platform: &P,
        dataset: &str,
        band: &str,
    ) -> CorineResult<Self> {
        log::info!("Opening {} (band {})", dataset, band);
        let description = platform
            .describe(dataset)
            .map_err(|e| CorineError::platform(Stage::Metadata, e))?;
        Self::from_description(description, band)
    }

    pub fn from_description(description: DatasetDescription, band: &str) -> CorineResult<Self> {
        let band = description.band(band)?.clone();
        // Fail early rather than at the first area computation
        band.pixel_area_ha()?;
        Ok(ClassificationDataset { description, band })
    }

    pub fn id(&self) -> &str {
        &self.description.id
    }

    pub fn band(&self) -> &BandInfo {
        &self.band
    }

    pub fn description(&self) -> &DatasetDescription {
        &self.description
    }

    pub fn legend_metadata(&self) -> CorineResult<LegendMetadata> {
        self.description.legend_metadata(&self.band.id)
    }

    /// Resolved legend of the band
    pub fn legend(&self) -> CorineResult<ClassificationLegend> {
        resolve_legend(&self.legend_metadata()?)
    }
}

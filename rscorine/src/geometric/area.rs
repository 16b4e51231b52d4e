use serde::Serialize;
use std::fmt;
use std::io::Write;
use std::path::Path;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

#[cfg(feature = "indicatif")]
use indicatif::{ProgressBar, ProgressStyle};

use crate::collect::global_variables::DEFAULT_MAX_WORKERS;
use crate::collect::platform::{RasterPlatform, Reducer};
use crate::commons::basic_functions::hectares_to_square_km;
use crate::error::{CorineError, CorineResult, Stage};
use crate::geometric::clip::ClippedRaster;
use crate::geometric::legend::ClassificationLegend;

/// Surface covered by one class inside the region
#[derive(Debug, Clone, PartialEq)]
pub struct AreaRecord {
    pub code: i64,
    pub name: String,
    /// Pixels of this class whose centre is inside the region
    pub pixels: u64,
    pub area_ha: f64,
}

impl AreaRecord {
    pub fn area_km2(&self) -> f64 {
        hectares_to_square_km(self.area_ha)
    }
}

/// CSV row, with the column names of the published tables
#[derive(Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "Class")]
    class: i64,
    #[serde(rename = "Class Name")]
    class_name: &'a str,
    #[serde(rename = "Area (ha)")]
    area_ha: f64,
}

/// Per-class areas in legend order. Classes without pixels have no record.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaTable {
    records: Vec<AreaRecord>,
    pixel_area_ha: f64,
}

impl AreaTable {
    pub fn records(&self) -> &[AreaRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, code: i64) -> Option<&AreaRecord> {
        self.records.iter().find(|r| r.code == code)
    }

    /// Codes with a record, in output order
    pub fn codes(&self) -> impl Iterator<Item = i64> + '_ {
        self.records.iter().map(|r| r.code)
    }

    /// Pixel surface used for the conversion, in hectares
    pub fn pixel_area_ha(&self) -> f64 {
        self.pixel_area_ha
    }

    pub fn total_area_ha(&self) -> f64 {
        self.records.iter().map(|r| r.area_ha).sum()
    }

    /// Whether the total fits in `region_area_ha` plus one pixel
    pub fn fits_region(&self, region_area_ha: f64) -> bool {
        self.total_area_ha() <= region_area_ha + self.pixel_area_ha
    }

    /// Write `Class,Class Name,Area (ha)` rows
    pub fn write_csv<W: Write>(&self, writer: W) -> CorineResult<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        for record in &self.records {
            wtr.serialize(CsvRow {
                class: record.code,
                class_name: &record.name,
                area_ha: record.area_ha,
            })
            .map_err(|e| CorineError::Export(format!("failed to write CSV row: {}", e)))?;
        }
        wtr.flush()
            .map_err(|e| CorineError::Export(format!("failed to flush CSV: {}", e)))?;
        Ok(())
    }

    /// Save the table as a CSV file
    pub fn save_csv(&self, path: &Path) -> CorineResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CorineError::Export(format!("failed to create directory {:?}: {}", parent, e))
            })?;
        }
        let file = std::fs::File::create(path)
            .map_err(|e| CorineError::Export(format!("failed to create {:?}: {}", path, e)))?;
        self.write_csv(file)?;
        log::info!("Area table saved to: {:?}", path);
        Ok(())
    }
}

impl fmt::Display for AreaTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name_width = self
            .records
            .iter()
            .map(|r| r.name.chars().count())
            .chain(std::iter::once("Class Name".len()))
            .max()
            .unwrap_or(0);

        writeln!(f, "{:<6} {:<name_width$} {:>12}", "Class", "Class Name", "Area (ha)")?;
        for record in &self.records {
            writeln!(
                f,
                "{:<6} {:<name_width$} {:>12.2}",
                record.code, record.name, record.area_ha
            )?;
        }
        write!(f, "{:<6} {:<name_width$} {:>12.2}", "", "Total", self.total_area_ha())
    }
}

/// How pixel counts are requested from the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AggregationStrategy {
    /// One masked-sum reduction per legend class, fanned out over a bounded pool
    #[default]
    PerClass,
    /// A single frequency-histogram reduction for all classes
    Grouped,
}

/// Computes per-class surface inside a clipped raster.
///
/// Areas are pixel counts times the native pixel surface read from the band metadata.
/// Output follows legend order whatever the strategy, and classes with no pixel are
/// left out. Any failed reduction aborts the whole computation.
#[derive(Debug, Clone)]
pub struct AreaAggregator {
    strategy: AggregationStrategy,
    #[cfg_attr(not(feature = "rayon"), allow(dead_code))]
    max_workers: usize,
    pixel_area_ha: Option<f64>,
    verbose: bool,
}

impl Default for AreaAggregator {
    fn default() -> Self {
        AreaAggregator {
            strategy: AggregationStrategy::default(),
            max_workers: DEFAULT_MAX_WORKERS,
            pixel_area_ha: None,
            verbose: false,
        }
    }
}

impl AreaAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strategy(mut self, strategy: AggregationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Upper bound on concurrent per-class reductions
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    /// Use this pixel surface instead of the one derived from the band resolution
    pub fn with_pixel_area_ha(mut self, pixel_area_ha: f64) -> Self {
        self.pixel_area_ha = Some(pixel_area_ha);
        self
    }

    /// Print each record as it is computed
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn compute_area_by_class<P: RasterPlatform + ?Sized>(
        &self,
        platform: &P,
        clipped: &ClippedRaster,
        legend: &ClassificationLegend,
    ) -> CorineResult<AreaTable> {
        let pixel_area_ha = match self.pixel_area_ha {
            Some(area) if area.is_finite() && area > 0.0 => area,
            Some(area) => {
                return Err(CorineError::MalformedMetadata(format!(
                    "pixel area override must be positive, got {}",
                    area
                )))
            }
            None => clipped.pixel_area_ha()?,
        };

        log::info!(
            "Computing area of {} classes in {} ({:?}, {} ha per pixel)",
            legend.len(),
            clipped.dataset(),
            self.strategy,
            pixel_area_ha
        );

        let progress = Progress::new(legend.len(), self.verbose);
        let counts = match self.strategy {
            AggregationStrategy::PerClass => {
                self.count_per_class(platform, clipped, legend, pixel_area_ha, &progress)?
            }
            AggregationStrategy::Grouped => {
                count_grouped(platform, clipped, legend, pixel_area_ha, &progress)?
            }
        };
        progress.finish();

        let records: Vec<AreaRecord> = legend
            .entries()
            .iter()
            .zip(counts)
            .filter(|(_, pixels)| *pixels > 0)
            .map(|(entry, pixels)| AreaRecord {
                code: entry.code,
                name: entry.name.clone(),
                pixels,
                area_ha: pixels as f64 * pixel_area_ha,
            })
            .collect();

        let table = AreaTable {
            records,
            pixel_area_ha,
        };

        let region_area_ha = clipped.region().geodesic_area_ha();
        if !table.fits_region(region_area_ha) {
            log::warn!(
                "Class areas sum to {:.2} ha, more than the region's {:.2} ha plus one pixel",
                table.total_area_ha(),
                region_area_ha
            );
        }

        Ok(table)
    }

    /// Pixel count of each legend class, in legend order
    #[cfg(feature = "rayon")]
    fn count_per_class<P: RasterPlatform + ?Sized>(
        &self,
        platform: &P,
        clipped: &ClippedRaster,
        legend: &ClassificationLegend,
        pixel_area_ha: f64,
        progress: &Progress,
    ) -> CorineResult<Vec<u64>> {
        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers)
            .build()
        {
            Ok(pool) => pool,
            Err(e) => {
                log::warn!("Could not start reduction workers ({}), running sequentially", e);
                return legend
                    .entries()
                    .iter()
                    .map(|entry| count_class(platform, clipped, entry.code, &entry.name, pixel_area_ha, progress))
                    .collect();
            }
        };

        pool.install(|| {
            legend
                .entries()
                .par_iter()
                .map(|entry| count_class(platform, clipped, entry.code, &entry.name, pixel_area_ha, progress))
                .collect()
        })
    }

    #[cfg(not(feature = "rayon"))]
    fn count_per_class<P: RasterPlatform + ?Sized>(
        &self,
        platform: &P,
        clipped: &ClippedRaster,
        legend: &ClassificationLegend,
        pixel_area_ha: f64,
        progress: &Progress,
    ) -> CorineResult<Vec<u64>> {
        legend
            .entries()
            .iter()
            .map(|entry| count_class(platform, clipped, entry.code, &entry.name, pixel_area_ha, progress))
            .collect()
    }
}

/// Masked sum of `value == code` over the region
fn count_class<P: RasterPlatform + ?Sized>(
    platform: &P,
    clipped: &ClippedRaster,
    code: i64,
    name: &str,
    pixel_area_ha: f64,
    progress: &Progress,
) -> CorineResult<u64> {
    let request = clipped.reduce_request(Reducer::ClassCount { code });
    let pixels = platform
        .reduce_region(clipped.dataset(), &request)
        .and_then(|response| response.pixels())
        .map_err(|e| CorineError::class(code, Stage::Reduce, e))?;

    log::debug!("Class {}: {} pixels", code, pixels);
    if pixels > 0 {
        progress.report(code, name, pixels as f64 * pixel_area_ha);
    }
    progress.inc();
    Ok(pixels)
}

/// All legend counts from one frequency histogram, in legend order
fn count_grouped<P: RasterPlatform + ?Sized>(
    platform: &P,
    clipped: &ClippedRaster,
    legend: &ClassificationLegend,
    pixel_area_ha: f64,
    progress: &Progress,
) -> CorineResult<Vec<u64>> {
    let request = clipped.reduce_request(Reducer::FrequencyHistogram);
    let histogram = platform
        .reduce_region(clipped.dataset(), &request)
        .and_then(|response| response.histogram())
        .map_err(|e| CorineError::platform(Stage::Reduce, e))?;

    for (code, pixels) in &histogram {
        if *pixels > 0 && !legend.contains(*code) {
            log::warn!("Ignoring {} pixels of class {} missing from the legend", pixels, code);
        }
    }

    Ok(legend
        .entries()
        .iter()
        .map(|entry| {
            let pixels = histogram.get(&entry.code).copied().unwrap_or(0);
            if pixels > 0 {
                progress.report(entry.code, &entry.name, pixels as f64 * pixel_area_ha);
            }
            progress.inc();
            pixels
        })
        .collect())
}

/// Verbose trace of records as they are computed
struct Progress {
    verbose: bool,
    #[cfg(feature = "indicatif")]
    bar: Option<ProgressBar>,
}

impl Progress {
    #[cfg_attr(not(feature = "indicatif"), allow(unused_variables))]
    fn new(total: usize, verbose: bool) -> Self {
        if verbose {
            println!("Landcover area in hectares:");
        }
        Progress {
            verbose,
            #[cfg(feature = "indicatif")]
            bar: verbose.then(|| {
                let pb = ProgressBar::new(total as u64);
                if let Ok(style) = ProgressStyle::default_bar()
                    .template("{spinner} [{bar:30}] {pos}/{len} classes")
                {
                    pb.set_style(style.progress_chars("=> "));
                }
                pb
            }),
        }
    }

    fn report(&self, code: i64, name: &str, area_ha: f64) {
        if !self.verbose {
            return;
        }
        let line = format!("{} (Class {}): {:.2} ha", name, code, area_ha);
        #[cfg(feature = "indicatif")]
        if let Some(ref bar) = self.bar {
            bar.println(line);
            return;
        }
        println!("{}", line);
    }

    fn inc(&self) {
        #[cfg(feature = "indicatif")]
        if let Some(ref bar) = self.bar {
            bar.inc(1);
        }
    }

    fn finish(&self) {
        #[cfg(feature = "indicatif")]
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}

/// Area by class with default settings; see [`AreaAggregator`]
pub fn compute_area_by_class<P: RasterPlatform + ?Sized>(
    platform: &P,
    clipped: &ClippedRaster,
    legend: &ClassificationLegend,
    verbose: bool,
) -> CorineResult<AreaTable> {
    AreaAggregator::new()
        .verbose(verbose)
        .compute_area_by_class(platform, clipped, legend)
}

use geo::polygon;
use rscorine::collect::nominatim::Geocoder;
use rscorine::collect::platform::memory::{ClassGrid, MemoryPlatform};
use rscorine::geometric::corine::Corine;
use rscorine::geometric::dataset::ClassificationDataset;
use rscorine::{clip, AreaAggregator, CorineError, RegionOfInterest, Stage};

const DATASET: &str = "test/corine";
const BAND: &str = "landcover";
const CELL: f64 = 0.001;

/// 10x10 grid at Paris: urban north half, forest south-west, water south-east,
/// one no-data cell in the south-east corner
fn platform() -> MemoryPlatform {
    let mut grid = ClassGrid::filled(2.0, 49.0, CELL, 10, 10, 111);
    for row in 5..10 {
        for col in 0..10 {
            grid.set(row, col, Some(if col < 5 { 311 } else { 512 }));
        }
    }
    grid.set(9, 9, None);

    MemoryPlatform::new(DATASET, BAND, grid)
        .with_legend(
            vec![
                "Water bodies; Inland waters; Water bodies",
                "Forest and semi natural areas; Forests; Broad-leaved forest",
                "Artificial surfaces; Urban fabric; Continuous urban fabric",
                "Water bodies; Marine waters; Sea and ocean",
            ],
            vec![512, 311, 111, 523],
            vec!["80F2E6", "80FF00", "E6004D", "E6F2FF"],
        )
        .with_tile_url("https://tiles.example.org/corine/{z}/{x}/{y}.png")
}

fn rectangle(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> RegionOfInterest {
    RegionOfInterest::from_polygon(polygon![
        (x: min_x, y: min_y),
        (x: max_x, y: min_y),
        (x: max_x, y: max_y),
        (x: min_x, y: max_y),
        (x: min_x, y: min_y),
    ])
}

fn whole_grid() -> RegionOfInterest {
    rectangle(2.0, 49.0 - 10.0 * CELL, 2.0 + 10.0 * CELL, 49.0).with_name("Grid")
}

struct FixedGeocoder;

impl Geocoder for FixedGeocoder {
    fn geocode(&self, place: &str) -> Result<RegionOfInterest, CorineError> {
        match place {
            "Grid" => Ok(whole_grid()),
            _ => Err(CorineError::Geocode {
                query: place.to_string(),
                reason: "no match".to_string(),
            }),
        }
    }
}

#[test]
fn test_areas_follow_legend_order() {
    let platform = platform();
    let dataset = ClassificationDataset::open(&platform, DATASET, BAND).unwrap();
    let legend = dataset.legend().unwrap();
    let clipped = clip(&platform, &dataset, &whole_grid()).unwrap();
    assert_eq!(clipped.valid_pixels(), 99);

    let table = AreaAggregator::new()
        .compute_area_by_class(&platform, &clipped, &legend)
        .unwrap();

    assert_eq!(table.codes().collect::<Vec<_>>(), vec![512, 311, 111]);
    assert_eq!(table.get(512).unwrap().pixels, 24);
    assert_eq!(table.get(311).unwrap().pixels, 25);
    assert_eq!(table.get(111).unwrap().pixels, 50);
    assert_eq!(table.get(111).unwrap().name, "Continuous urban fabric");
}

#[test]
fn test_total_does_not_exceed_region_area() {
    let platform = platform();
    let dataset = ClassificationDataset::open(&platform, DATASET, BAND).unwrap();
    let legend = dataset.legend().unwrap();
    let region = whole_grid();
    let clipped = clip(&platform, &dataset, &region).unwrap();

    let table = AreaAggregator::new()
        .compute_area_by_class(&platform, &clipped, &legend)
        .unwrap();
    let region_ha = region.geodesic_area_ha();

    assert!(table.fits_region(region_ha));
    // 99 of 100 cells carry data
    let ratio = table.total_area_ha() / region_ha;
    assert!((ratio - 0.99).abs() < 1e-3, "ratio {}", ratio);
}

#[test]
fn test_partial_pixels_follow_centre_rule() {
    let platform = platform();
    let dataset = ClassificationDataset::open(&platform, DATASET, BAND).unwrap();
    let legend = dataset.legend().unwrap();
    // Eastern edge cuts column 5 west of its centre
    let region = rectangle(2.0, 49.0 - 10.0 * CELL, 2.0 + 5.2 * CELL, 49.0);
    let clipped = clip(&platform, &dataset, &region).unwrap();

    let table = AreaAggregator::new()
        .compute_area_by_class(&platform, &clipped, &legend)
        .unwrap();

    assert_eq!(clipped.valid_pixels(), 50);
    assert_eq!(table.codes().collect::<Vec<_>>(), vec![311, 111]);
    assert_eq!(table.get(111).unwrap().pixels, 25);
    assert!(table.get(512).is_none());
}

#[test]
fn test_region_outside_coverage_is_empty() {
    let platform = platform();
    let dataset = ClassificationDataset::open(&platform, DATASET, BAND).unwrap();
    let err = clip(&platform, &dataset, &rectangle(10.0, 10.0, 10.1, 10.1)).unwrap_err();
    assert!(matches!(err, CorineError::EmptyRegion { .. }));
}

#[test]
fn test_unknown_dataset_fails_at_metadata_stage() {
    let platform = platform();
    let err = ClassificationDataset::open(&platform, "missing/dataset", BAND).unwrap_err();
    assert!(matches!(
        err,
        CorineError::Aggregation {
            code: None,
            stage: Stage::Metadata,
            ..
        }
    ));
}

#[test]
fn test_pipeline_writes_csv_and_html() {
    let platform = platform();
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("output");

    let mut corine = Corine::new(&platform, Some(output.to_string_lossy().into_owned()));
    corine.set_dataset(DATASET, BAND);
    corine.set_place(&FixedGeocoder, "Grid").unwrap();
    corine.run().unwrap();

    let areas = corine.areas().unwrap();
    assert_eq!(areas.len(), 3);
    let filtered = corine.filtered_legend().unwrap();
    assert_eq!(filtered.codes().collect::<Vec<_>>(), vec![512, 311, 111]);
    assert_eq!(corine.legend().unwrap().len(), 4);

    let csv_path = corine.to_csv(None).unwrap();
    assert_eq!(csv_path, output.join("areas.csv"));
    let csv = std::fs::read_to_string(&csv_path).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "Class,Class Name,Area (ha)");
    assert!(lines[1].starts_with("512,Water bodies,"));
    assert_eq!(lines.len(), 4);

    let html_path = corine.to_html(Some("grid"), "Land cover of Grid").unwrap();
    assert_eq!(html_path, output.join("grid.html"));
    let html = std::fs::read_to_string(&html_path).unwrap();
    assert!(html.contains("Land cover of Grid"));
    assert!(html.contains("https://tiles.example.org/corine/{z}/{x}/{y}.png"));
    assert!(html.contains("Broad-leaved forest"));
    assert!(!html.contains("Sea and ocean"));
}

#[test]
fn test_pipeline_requires_region_and_run() {
    let platform = platform();
    let mut corine = Corine::new(&platform, None);
    corine.set_dataset(DATASET, BAND);

    assert!(matches!(corine.to_csv(None), Err(CorineError::NotRun)));
    assert!(matches!(corine.render_map("x"), Err(CorineError::NotRun)));
    assert!(matches!(corine.run(), Err(CorineError::MissingRegion)));
    assert!(matches!(
        corine.set_place(&FixedGeocoder, "Atlantis"),
        Err(CorineError::Geocode { .. })
    ));
}

#[test]
fn test_pipeline_reports_empty_region() {
    let platform = platform();
    let mut corine = Corine::new(&platform, None);
    corine.set_dataset(DATASET, BAND);
    corine.set_region(rectangle(-5.0, 40.0, -4.9, 40.1));

    assert!(matches!(corine.run(), Err(CorineError::EmptyRegion { .. })));
    assert!(corine.areas().is_none());
}

#[test]
fn test_pipeline_enforces_pixel_budget() {
    let platform = platform();
    let mut corine = Corine::new(&platform, None);
    corine.set_dataset(DATASET, BAND);
    corine.set_region(whole_grid());
    corine.set_max_pixels(10);

    let err = corine.run().unwrap_err();
    assert!(matches!(
        err,
        CorineError::Aggregation {
            stage: Stage::Clip,
            ..
        }
    ));
}

#[test]
fn test_pipeline_with_custom_aggregator() {
    let platform = platform();
    let mut corine = Corine::new(&platform, None);
    corine.set_dataset(DATASET, BAND);
    corine.set_region(whole_grid());
    corine.set_aggregator(
        AreaAggregator::new()
            .with_strategy(rscorine::AggregationStrategy::Grouped)
            .with_pixel_area_ha(1.0),
    );
    corine.run().unwrap();

    let areas = corine.areas().unwrap();
    assert_eq!(areas.get(111).unwrap().area_ha, 50.0);
    assert_eq!(areas.total_area_ha(), 99.0);
}

#[test]
fn test_failed_rerun_drops_previous_results() {
    let platform = platform();
    let dir = tempfile::tempdir().unwrap();
    let mut corine = Corine::new(&platform, Some(dir.path().to_string_lossy().into_owned()));
    corine.set_dataset(DATASET, BAND);
    corine.set_region(whole_grid());
    corine.run().unwrap();
    assert!(corine.areas().is_some());

    corine.set_region(rectangle(-5.0, 40.0, -4.9, 40.1));
    assert!(corine.areas().is_none());
    assert!(corine.clipped().is_none());

    assert!(matches!(corine.run(), Err(CorineError::EmptyRegion { .. })));
    assert!(corine.areas().is_none());
    assert!(corine.filtered_legend().is_none());
    assert!(matches!(corine.to_csv(None), Err(CorineError::NotRun)));
    assert!(matches!(corine.to_html(None, "Land cover"), Err(CorineError::NotRun)));
}

#[test]
fn test_rerun_after_region_change_reflects_new_region() {
    let platform = platform();
    let mut corine = Corine::new(&platform, None);
    corine.set_dataset(DATASET, BAND);
    corine.set_region(whole_grid());
    corine.run().unwrap();
    assert_eq!(corine.areas().unwrap().len(), 3);

    // North half is urban only
    corine.set_region(rectangle(2.0, 49.0 - 5.0 * CELL, 2.0 + 10.0 * CELL, 49.0));
    corine.run().unwrap();
    assert_eq!(corine.areas().unwrap().codes().collect::<Vec<_>>(), vec![111]);
    assert_eq!(corine.clipped().unwrap().valid_pixels(), 50);
}

use anyhow::Result;
use geo::polygon;
use rscorine::collect::platform::memory::{ClassGrid, MemoryPlatform};
use rscorine::{AggregationStrategy, AreaAggregator, Corine, RegionOfInterest};

/// Example: the full pipeline against the in-process platform, no network needed
fn main() -> Result<()> {
    env_logger::init();

    println!("=== Example: land-cover areas on an in-memory grid ===\n");

    // 40 x 40 cells of 0.001° west of La Rochelle: urban core, fields, forest, sea
    let mut grid = ClassGrid::filled(-1.18, 46.18, 0.001, 40, 40, 211);
    for row in 0..40 {
        for col in 0..40 {
            let code = match (row, col) {
                (r, c) if (12..28).contains(&r) && (12..28).contains(&c) => 111,
                (r, _) if r >= 32 => 523,
                (_, c) if c >= 30 => 311,
                _ => continue,
            };
            grid.set(row, col, Some(code));
        }
    }

    let platform = MemoryPlatform::new("demo/corine", "landcover", grid)
        .with_legend(
            vec![
                "Artificial surfaces; Urban fabric; Continuous urban fabric",
                "Agricultural areas; Arable land; Non-irrigated arable land",
                "Forest and semi natural areas; Forests; Broad-leaved forest",
                "Water bodies; Marine waters; Coastal lagoons",
                "Water bodies; Marine waters; Sea and ocean",
            ],
            vec![111, 211, 311, 521, 523],
            vec!["E6004D", "FFFFA8", "80FF00", "00FFA6", "E6F2FF"],
        );

    let region = RegionOfInterest::from_polygon(polygon![
        (x: -1.175, y: 46.145),
        (x: -1.145, y: 46.145),
        (x: -1.145, y: 46.175),
        (x: -1.175, y: 46.175),
        (x: -1.175, y: 46.145),
    ])
    .with_name("Demo district");

    println!("Region: {}", region.name().unwrap_or("region"));
    println!("  - Geodesic area: {:.2} ha\n", region.geodesic_area_ha());

    let mut corine = Corine::new(&platform, Some("./output".to_string()));
    corine.set_dataset("demo/corine", "landcover");
    corine.set_region(region);
    corine.set_aggregator(
        AreaAggregator::new()
            .with_strategy(AggregationStrategy::Grouped)
            .verbose(true),
    );
    corine.run()?;

    if let Some(areas) = corine.areas() {
        println!("\n{}", areas);
    }
    if let Some(filtered) = corine.filtered_legend() {
        println!("\nLegend entries kept for the map:");
        for entry in filtered.entries() {
            println!("  {} {} ({})", entry.code, entry.name, entry.color);
        }
    }

    let csv = corine.to_csv(Some("demo_areas"))?;
    let html = corine.to_html(Some("demo_landcover"), "Demo district land cover")?;

    println!("\n✅ Processing complete!");
    println!("  - Area table: {:?}", csv);
    println!("  - Map: {:?}", html);

    Ok(())
}

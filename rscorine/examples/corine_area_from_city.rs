use anyhow::{Context, Result};
use rscorine::collect::nominatim::Nominatim;
use rscorine::collect::platform::http::HttpPlatform;
use rscorine::collect::settings::PlatformSettings;
use rscorine::Corine;

/// Example: CORINE land-cover areas for a city, computed on a remote platform
///
/// Usage: cargo run --example corine_area_from_city -- "La Rochelle, France"
/// The platform is configured with RSCORINE_PLATFORM_URL / RSCORINE_PLATFORM_TOKEN.
fn main() -> Result<()> {
    env_logger::init();

    let place = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "La Rochelle, France".to_string());

    println!("=== Example: CORINE Land Cover 2018 areas for {} ===\n", place);

    let settings = PlatformSettings::from_env()?;
    println!("Platform: {}", settings.base_url);
    println!("Geocoder: {}\n", settings.nominatim_url);

    let platform = HttpPlatform::new(&settings).context("Failed to create platform client")?;
    let geocoder = Nominatim::new(&settings).context("Failed to create geocoder")?;

    let mut corine = Corine::new(&platform, Some("./output".to_string()));
    corine.set_place(&geocoder, &place)?;

    if let Some(region) = corine.region() {
        println!("Boundary: {}", region.name().unwrap_or(&place));
        println!("  - Geodesic area: {:.2} ha\n", region.geodesic_area_ha());
    }

    corine.set_aggregator(rscorine::AreaAggregator::new().verbose(true));
    corine.run()?;

    if let Some(areas) = corine.areas() {
        println!("\n{}\n", areas);
        println!("Area (km²) by class:");
        for record in areas.records() {
            println!("  {:>4}  {:<45} {:>10.2}", record.code, record.name, record.area_km2());
        }
    }

    if let (Some(legend), Some(filtered)) = (corine.legend(), corine.filtered_legend()) {
        println!("\nLegend: {} of {} classes present", filtered.len(), legend.len());
    }

    let csv = corine.to_csv(None)?;
    let html = corine.to_html(None, &format!("CORINE Land Cover 2018: {}", place))?;

    println!("\n✅ Processing complete!");
    println!("  - Area table: {:?}", csv);
    println!("  - Map: {:?}", html);

    Ok(())
}

use geojson::GeoJson;
use reqwest::blocking::Client;
use url::Url;

use crate::collect::settings::PlatformSettings;
use crate::error::{CorineError, PlatformError};
use crate::geo_core::RegionOfInterest;

/// Resolves a free-text place name to its boundary polygon
pub trait Geocoder {
    fn geocode(&self, place: &str) -> Result<RegionOfInterest, CorineError>;
}

/// Geocoder backed by a Nominatim search endpoint (OpenStreetMap boundaries).
///
/// Only the best match is requested; disambiguation is left to the service.
pub struct Nominatim {
    client: Client,
    base_url: String,
}

impl Nominatim {
    pub fn new(settings: &PlatformSettings) -> Result<Self, PlatformError> {
        let client = Client::builder()
            .timeout(settings.timeout())
            // Nominatim's usage policy requires an identifying User-Agent
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(PlatformError::Http)?;

        Ok(Nominatim {
            client,
            base_url: settings.nominatim_url.trim_end_matches('/').to_string(),
        })
    }

    /// Search URL for `place`, asking for GeoJSON with polygon outlines
    pub fn search_url(&self, place: &str) -> Result<Url, CorineError> {
        Url::parse_with_params(
            &format!("{}/search", self.base_url),
            &[
                ("q", place),
                ("format", "geojson"),
                ("polygon_geojson", "1"),
                ("limit", "1"),
            ],
        )
        .map_err(|e| CorineError::Geocode {
            query: place.to_string(),
            reason: format!("invalid geocoder URL: {}", e),
        })
    }
}

impl Geocoder for Nominatim {
    fn geocode(&self, place: &str) -> Result<RegionOfInterest, CorineError> {
        let url = self.search_url(place)?;
        log::info!("Geocoding {:?}", place);
        log::debug!("GET {}", url);

        let failed = |reason: String| CorineError::Geocode {
            query: place.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| failed(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(failed(format!("geocoder returned error {}: {}", status, body)));
        }

        let text = response
            .text()
            .map_err(|e| failed(format!("failed to read response body: {}", e)))?;
        let geojson: GeoJson = text
            .parse()
            .map_err(|e| failed(format!("response is not GeoJSON: {}", e)))?;

        region_from_search_response(place, &geojson)
    }
}

/// First polygonal feature of a search response.
///
/// The region is named after the feature's `display_name`, or the query when absent.
pub fn region_from_search_response(
    place: &str,
    response: &GeoJson,
) -> Result<RegionOfInterest, CorineError> {
    let features: &[geojson::Feature] = match response {
        GeoJson::FeatureCollection(fc) => fc.features.as_slice(),
        GeoJson::Feature(f) => std::slice::from_ref(f),
        GeoJson::Geometry(_) => &[],
    };

    for feature in features {
        let geometry = match feature.geometry {
            Some(ref geometry) => geometry,
            None => continue,
        };
        // Point results (villages without a mapped boundary) cannot be clipped against
        if !matches!(
            geometry.value,
            geojson::Value::Polygon(_) | geojson::Value::MultiPolygon(_)
        ) {
            log::warn!("Skipping non-polygon result for {:?}", place);
            continue;
        }

        let region = RegionOfInterest::from_geojson(geometry).map_err(|e| CorineError::Geocode {
            query: place.to_string(),
            reason: format!("{:#}", e),
        })?;
        let name = feature
            .property("display_name")
            .and_then(|v| v.as_str())
            .unwrap_or(place)
            .to_string();
        return Ok(region.with_name(name));
    }

    Err(CorineError::Geocode {
        query: place.to_string(),
        reason: "no boundary polygon found".to_string(),
    })
}

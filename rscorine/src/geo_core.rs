use anyhow::{Context, Result};
use geo::{BoundingRect, Centroid, GeodesicArea, Geometry as GeoGeometry, MultiPolygon, Point, Polygon};

use crate::commons::basic_functions::square_metres_to_hectares;

/// Bounding box structure, in EPSG:4326 degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64, // min longitude
    pub min_y: f64, // min latitude
    pub max_x: f64, // max longitude
    pub max_y: f64, // max latitude
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        BoundingBox {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Whether the two boxes share at least a boundary point
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }

    /// Center as (lon, lat)
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}

/// Region of interest: the (possibly multi-part) boundary polygon of a place,
/// in geographic coordinates (lon/lat, EPSG:4326).
///
/// Read-only once built; every downstream step borrows it.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionOfInterest {
    name: Option<String>,
    geometry: MultiPolygon<f64>,
}

impl RegionOfInterest {
    pub fn new(geometry: MultiPolygon<f64>) -> Self {
        RegionOfInterest {
            name: None,
            geometry,
        }
    }

    pub fn from_polygon(polygon: Polygon<f64>) -> Self {
        Self::new(MultiPolygon::new(vec![polygon]))
    }

    /// Build a region from a GeoJSON geometry. Only Polygon and MultiPolygon are accepted.
    pub fn from_geojson(geometry: &geojson::Geometry) -> Result<Self> {
        let geo_geom: GeoGeometry<f64> = geometry
            .try_into()
            .context("Failed to convert GeoJSON geometry to geo geometry")?;

        match geo_geom {
            GeoGeometry::Polygon(p) => Ok(Self::from_polygon(p)),
            GeoGeometry::MultiPolygon(mp) => Ok(Self::new(mp)),
            other => anyhow::bail!(
                "Expected a Polygon or MultiPolygon boundary, got {}",
                geometry_kind(&other)
            ),
        }
    }

    /// Attach a display name (usually the geocoded place name)
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn geometry(&self) -> &MultiPolygon<f64> {
        &self.geometry
    }

    /// GeoJSON geometry as sent to the raster platform
    pub fn to_geojson(&self) -> geojson::Geometry {
        geojson::Geometry::new(geojson::Value::from(&self.geometry))
    }

    pub fn bbox(&self) -> Option<BoundingBox> {
        self.geometry
            .bounding_rect()
            .map(|r| BoundingBox::new(r.min().x, r.min().y, r.max().x, r.max().y))
    }

    pub fn centroid(&self) -> Option<Point<f64>> {
        self.geometry.centroid()
    }

    /// Geodesic area on the WGS84 ellipsoid, in hectares
    pub fn geodesic_area_ha(&self) -> f64 {
        square_metres_to_hectares(self.geometry.geodesic_area_unsigned())
    }

    pub fn is_empty(&self) -> bool {
        self.geometry.0.is_empty()
    }
}

fn geometry_kind(geometry: &GeoGeometry<f64>) -> &'static str {
    match geometry {
        GeoGeometry::Point(_) => "Point",
        GeoGeometry::Line(_) => "Line",
        GeoGeometry::LineString(_) => "LineString",
        GeoGeometry::Polygon(_) => "Polygon",
        GeoGeometry::MultiPoint(_) => "MultiPoint",
        GeoGeometry::MultiLineString(_) => "MultiLineString",
        GeoGeometry::MultiPolygon(_) => "MultiPolygon",
        GeoGeometry::GeometryCollection(_) => "GeometryCollection",
        GeoGeometry::Rect(_) => "Rect",
        GeoGeometry::Triangle(_) => "Triangle",
    }
}

use gdal::spatial_ref::SpatialRef;
use log::debug;
use proj::Proj;
use serde::Serialize;

use crate::{
    components::BoundingBox,
    errors::{Result, SpectrascanError},
};

/// Points per bounding box edge when reprojecting it.
pub const DENSIFY_POINTS: usize = 21;
const WGS84: &str = "EPSG:4326";

/// Spatial reference of a raster as reported in `spatial_info.projection`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Projection {
    pub wkt: String,
    pub name: Option<String>,
    pub epsg_code: Option<String>,
    pub proj4: Option<String>,
    pub authority: Option<String>,
}

impl Projection {
    /// Parse what GDAL can of `wkt`; anything it can not read stays `None`.
    pub fn from_wkt(wkt: &str) -> Self {
        let mut projection = Self {
            wkt: wkt.to_string(),
            ..Default::default()
        };
        let srs = match SpatialRef::from_wkt(wkt) {
            Ok(srs) => srs,
            Err(err) => {
                debug!("unreadable spatial reference: {err}");
                return projection;
            }
        };
        projection.name = srs.name().filter(|name| !name.is_empty());
        projection.authority = srs.auth_name().filter(|name| !name.is_empty());
        if projection.authority.as_deref() == Some("EPSG") {
            projection.epsg_code = srs.auth_code().ok().map(|code| code.to_string());
        }
        projection.proj4 = srs.to_proj4().ok().filter(|proj4| !proj4.is_empty());
        projection
    }

    pub fn epsg(&self) -> Option<u32> {
        self.epsg_code.as_deref()?.parse().ok()
    }

    /// EPSG codes from 3000 up are taken as projected, in meters.
    pub fn units(&self) -> &'static str {
        match self.epsg() {
            Some(code) if code >= 3000 => "meters",
            _ => "degrees",
        }
    }

    /// Definition PROJ understands, preferring the EPSG code.
    fn definition(&self) -> Result<String> {
        match (self.epsg(), self.wkt.is_empty()) {
            (Some(code), _) => Ok(format!("EPSG:{code}")),
            (None, false) => Ok(self.wkt.clone()),
            (None, true) => Err(SpectrascanError::MissingCrs),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Wgs84Bounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

/// `points` evenly spaced points along every edge of `bbox`, corners included.
pub fn densified_edges(bbox: &BoundingBox, points: usize) -> Vec<(f64, f64)> {
    let steps = points.max(2) - 1;
    let lerp = |from: f64, to: f64, step: usize| from + (to - from) * step as f64 / steps as f64;
    (0..=steps)
        .flat_map(|step| {
            let x = lerp(bbox.x_min, bbox.x_max, step);
            let y = lerp(bbox.y_min, bbox.y_max, step);
            [
                (x, bbox.y_min),
                (x, bbox.y_max),
                (bbox.x_min, y),
                (bbox.x_max, y),
            ]
        })
        .collect()
}

/// Footprint of `bbox` in longitude/latitude.
pub fn wgs84_bounds(projection: &Projection, bbox: &BoundingBox) -> Result<Wgs84Bounds> {
    let proj = Proj::new_known_crs(&projection.definition()?, WGS84, None)?;
    let mut bounds = Wgs84Bounds {
        west: f64::INFINITY,
        south: f64::INFINITY,
        east: f64::NEG_INFINITY,
        north: f64::NEG_INFINITY,
    };
    for point in densified_edges(bbox, DENSIFY_POINTS) {
        let (lon, lat) = proj.convert(point)?;
        if lon.is_finite() && lat.is_finite() {
            bounds.west = bounds.west.min(lon);
            bounds.east = bounds.east.max(lon);
            bounds.south = bounds.south.min(lat);
            bounds.north = bounds.north.max(lat);
        }
    }
    Ok(bounds)
}

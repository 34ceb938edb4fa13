use geo::{AffineTransform, Coord};
use serde::Serialize;
use shrinkwraprs::Shrinkwrap;

/// Pixel to geo transform of a raster, built from the GDAL
/// six-coefficient layout `[x0, pixel_width, skew_x, y0, skew_y, pixel_height]`.
#[derive(Shrinkwrap, Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform(AffineTransform);

/// What GDAL reports for a raster without georeferencing: pixel space, y down.
impl Default for GeoTransform {
    fn default() -> Self {
        Self::from_gdal([0., 1., 0., 0., 0., 1.])
    }
}

impl GeoTransform {
    pub fn from_gdal(gdal_transform: [f64; 6]) -> Self {
        Self(AffineTransform::new(
            gdal_transform[1],
            gdal_transform[2],
            gdal_transform[0],
            gdal_transform[4],
            gdal_transform[5],
            gdal_transform[3],
        ))
    }

    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.xoff(),
            self.a(),
            self.b(),
            self.yoff(),
            self.d(),
            self.e(),
        ]
    }

    /// Geo coordinates of the top left corner of pixel (`x`, `y`).
    pub fn pixel_to_geo(&self, x: f64, y: f64) -> (f64, f64) {
        self.0.apply(Coord { x, y }).x_y()
    }

    /// Footprint of a `width` x `height` raster, skew ignored.
    pub fn bounding_box(&self, width: usize, height: usize) -> BoundingBox {
        let x_min = self.xoff();
        let y_max = self.yoff();
        let x_max = x_min + width as f64 * self.a();
        let y_min = y_max + height as f64 * self.e();
        BoundingBox {
            x_min,
            y_min,
            x_max,
            y_max,
            center_x: (x_min + x_max) / 2.,
            center_y: (y_min + y_max) / 2.,
        }
    }

    pub fn resolution(&self) -> (f64, f64) {
        (self.a().abs(), self.e().abs())
    }

    pub fn info(&self) -> GeoTransformInfo {
        GeoTransformInfo {
            x0: self.xoff(),
            y0: self.yoff(),
            pixel_width: self.a(),
            pixel_height: self.e(),
            skew_x: self.b(),
            skew_y: self.d(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoTransformInfo {
    pub x0: f64,
    pub y0: f64,
    pub pixel_width: f64,
    pub pixel_height: f64,
    pub skew_x: f64,
    pub skew_y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
    pub center_x: f64,
    pub center_y: f64,
}

impl BoundingBox {
    pub fn area(&self) -> f64 {
        ((self.x_max - self.x_min) * (self.y_max - self.y_min)).abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn utm() -> GeoTransform {
        GeoTransform::from_gdal([500000., 10., 0., 4200000., 0., -10.])
    }

    #[rstest]
    fn default_is_pixel_space() {
        let transform = GeoTransform::default();
        assert_eq!(transform.pixel_to_geo(3., 4.), (3., 4.));
    }

    #[rstest]
    fn gdal_layout_round_trips(utm: GeoTransform) {
        assert_eq!(utm.to_gdal(), [500000., 10., 0., 4200000., 0., -10.]);
    }

    #[rstest]
    fn pixel_to_geo_follows_gdal_formula() {
        let transform = GeoTransform::from_gdal([100., 2., 0.5, 50., 0.25, -3.]);
        let (x, y) = transform.pixel_to_geo(4., 2.);
        assert_relative_eq!(x, 100. + 4. * 2. + 2. * 0.5);
        assert_relative_eq!(y, 50. + 4. * 0.25 + 2. * -3.);
    }

    #[rstest]
    fn bounding_box_of_north_up_raster(utm: GeoTransform) {
        let bbox = utm.bounding_box(100, 50);
        assert_relative_eq!(bbox.x_max, 501000.);
        assert_relative_eq!(bbox.y_min, 4199500.);
        assert_relative_eq!(bbox.center_x, 500500.);
        assert_relative_eq!(bbox.area(), 1000. * 500.);
        assert_eq!(utm.resolution(), (10., 10.));
    }
}

use serde::Serialize;
use std::{fmt::Debug, path::Path};

use crate::{
    components::{Band, DatasetMetadata, GeoTransform},
    errors::Result,
};

/// Read-only access to a raster file.
///
/// Everything the extractor knows about a file comes through this trait.
pub trait File: Debug + Sized {
    fn open<P: AsRef<Path>>(path: P) -> Result<Self>;
    fn path(&self) -> &Path;
    fn driver(&self) -> DriverInfo;
    /// (width, height)
    fn size(&self) -> (usize, usize);
    /// Spatial reference as WKT, empty when unknown.
    fn crs(&self) -> String;
    fn transform(&self) -> Result<GeoTransform>;
    fn num_bands(&self) -> usize;
    /// Band at 0-based `index`, pixels included.
    fn band(&self, index: usize) -> Result<Band>;
    fn bands(&self) -> Result<Vec<Band>> {
        (0..self.num_bands()).map(|idx| self.band(idx)).collect()
    }
    fn metadata(&self) -> DatasetMetadata;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DriverInfo {
    pub short_name: String,
    pub long_name: String,
    pub creation_options: String,
    pub extensions: String,
}

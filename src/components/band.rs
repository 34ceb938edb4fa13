use ndarray::Array2;
use serde::Serialize;

use crate::components::Metadata;

/// One raster layer as handed over by a [File](crate::components::File).
///
/// `data` is (rows, cols) and always read as `f64`, whatever the native type.
#[derive(Debug, Clone)]
pub struct Band {
    /// 1-based ordinal.
    pub index: usize,
    pub data: Array2<f64>,
    pub info: BandInfo,
}

/// Everything about a band except its pixels.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BandInfo {
    /// Number GDAL itself gives the band.
    pub band_number: usize,
    pub data_type: String,
    pub block_size: (usize, usize),
    pub color_interpretation: String,
    pub nodata_value: Option<f64>,
    pub scale: Option<f64>,
    pub offset: Option<f64>,
    pub unit_type: String,
    pub description: String,
    pub metadata: Metadata,
    /// GDAL checksum over the whole band, `None` when GDAL could not compute it.
    pub checksum: Option<i32>,
}

impl Band {
    pub fn new(index: usize, data: Array2<f64>, info: BandInfo) -> Self {
        Self { index, data, info }
    }

    /// Band with only pixels and textual evidence, as used for classification.
    pub fn from_parts(
        index: usize,
        data: Array2<f64>,
        description: impl Into<String>,
        metadata: Metadata,
    ) -> Self {
        let info = BandInfo {
            band_number: index,
            data_type: "Float64".into(),
            description: description.into(),
            metadata,
            ..Default::default()
        };
        Self { index, data, info }
    }

    pub fn description(&self) -> &str {
        &self.info.description
    }

    pub fn metadata(&self) -> &Metadata {
        &self.info.metadata
    }

    /// (width, height)
    pub fn size(&self) -> (usize, usize) {
        let (rows, cols) = self.data.dim();
        (cols, rows)
    }
}

/// Bytes per pixel of a GDAL data type name, 4 when unknown.
pub fn data_type_size(data_type: &str) -> usize {
    match data_type {
        "Byte" | "Int8" => 1,
        "UInt16" | "Int16" => 2,
        "UInt32" | "Int32" | "Float32" => 4,
        "Float64" => 8,
        _ => 4,
    }
}

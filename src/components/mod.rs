pub mod band;
pub mod engines;
pub mod file;
pub mod metadata;
pub mod transforms;

pub use band::{Band, BandInfo};
pub use engines::gdal_engine::GdalFile;
pub use file::{DriverInfo, File};
pub use metadata::{DatasetMetadata, MetadataBuckets, MetadataEntry};
pub use transforms::{BoundingBox, GeoTransform};

use std::collections::BTreeMap;

/// Ordered so that "first matching entry" rules stay deterministic.
pub type Metadata = BTreeMap<String, String>;

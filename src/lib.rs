//! Describe a georeferenced raster as one JSON document: geometry, band
//! statistics, metadata and whatever spectral indices its bands allow.

pub mod components;
pub mod crs_geo;
pub mod errors;
pub mod extractor;
pub mod indexes;
pub mod roles;
pub mod sanitize;
pub mod section;
pub mod sensors;
pub mod spectral;
pub mod stats;

pub use components::{Band, File, GdalFile, Metadata};
pub use errors::{Result, SpectrascanError};
pub use extractor::{ErrorReport, ExtractOptions, Extractor, Report};
pub use indexes::{compute_indices, ComputedIndices, IndexReport, IndexResult};
pub use roles::{classify, BandRole, RoleMap};
pub use sanitize::sanitize;
pub use section::Section;
pub use sensors::SensorFamily;

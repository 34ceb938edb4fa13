//! Spectral index catalogue.
//!
//! Which indices are computed depends only on which band roles the raster
//! turned out to have. A family whose roles are missing is left out of the
//! result; a family that fails reports its error without touching the others.

pub mod families;
pub mod rgb;
pub mod safe;

use log::info;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::{
    components::Band,
    errors::Result,
    roles::{detect_band_types, BandDetection, BandRole, RoleMap},
    section::Section,
    spectral::{self, SpectralAnalysis},
};
pub use families::{IndexFamily, ThermalStats};
pub use rgb::RgbIndices;
pub use safe::{IndexResult, IndexStats};

/// The `computed_indices` section: how each band was classified next to
/// what its roles allowed.
#[derive(Debug, Clone, Serialize)]
pub struct IndexReport {
    pub band_detection: BTreeMap<String, BandDetection>,
    #[serde(flatten)]
    pub indices: ComputedIndices,
}

impl IndexReport {
    /// `roles` must have been built from `bands`.
    pub fn new(bands: &[Band], roles: &RoleMap) -> Self {
        Self {
            band_detection: detect_band_types(bands),
            indices: compute_indices(roles),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ComputedIndices {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rgb: Option<Section<RgbIndices>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vegetation: Option<Section<IndexFamily>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub water: Option<Section<IndexFamily>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soil: Option<Section<IndexFamily>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thermal: Option<BTreeMap<String, ThermalStats>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom: Option<IndexFamily>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spectral_analysis: Option<SpectralAnalysis>,
}

fn rgb(roles: &RoleMap) -> Option<Section<RgbIndices>> {
    let red = roles.get(&BandRole::Red)?;
    let green = roles.get(&BandRole::Green)?;
    let blue = roles.get(&BandRole::Blue)?;
    Some(Section::capture(
        "RGB indices",
        rgb::rgb_indices(red.view(), green.view(), blue.view()),
    ))
}

/// A family that computed nothing counts as absent.
fn family(context: &str, result: Option<Result<IndexFamily>>) -> Option<Section<IndexFamily>> {
    match result? {
        Ok(family) if family.is_empty() => None,
        result => Some(Section::capture(context, result)),
    }
}

/// Every index family the roles of `roles` allow.
pub fn compute_indices(roles: &RoleMap) -> ComputedIndices {
    info!(
        "role map: {:?}",
        roles.iter().map(|entry| entry.name()).collect::<Vec<_>>()
    );
    ComputedIndices {
        rgb: rgb(roles),
        vegetation: family("Vegetation indices", families::vegetation(roles)),
        water: family("Water indices", families::water(roles)),
        soil: family("Soil indices", families::soil(roles)),
        thermal: families::thermal(roles),
        custom: families::custom(roles),
        spectral_analysis: spectral::analyze(roles, &roles.wavelengths()),
    }
}

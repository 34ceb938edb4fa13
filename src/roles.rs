//! Band role inference.
//!
//! A role is guessed from three kinds of evidence, strongest first:
//! keywords in the band description, a wavelength found in the band
//! metadata, and finally the band position.

use log::debug;
use ndarray::Array2;
use num_traits::ToPrimitive;
use serde::{Serialize, Serializer};
use std::{collections::BTreeMap, fmt};

use crate::components::{Band, Metadata};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BandRole {
    Blue,
    Green,
    Red,
    Nir,
    RedEdge,
    Swir1,
    Swir2,
    Thermal,
    Pan,
    Cirrus,
    Aerosol,
    /// Product specific layer, e.g. solar radiation components.
    DomainSpecific(&'static str),
    /// Wavelength known but outside every named range, in nm.
    Spectral(i64),
    /// No evidence at all, keyed by 1-based ordinal.
    Unassigned(usize),
}

impl fmt::Display for BandRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BandRole::Blue => write!(f, "blue"),
            BandRole::Green => write!(f, "green"),
            BandRole::Red => write!(f, "red"),
            BandRole::Nir => write!(f, "nir"),
            BandRole::RedEdge => write!(f, "red_edge"),
            BandRole::Swir1 => write!(f, "swir1"),
            BandRole::Swir2 => write!(f, "swir2"),
            BandRole::Thermal => write!(f, "thermal"),
            BandRole::Pan => write!(f, "pan"),
            BandRole::Cirrus => write!(f, "cirrus"),
            BandRole::Aerosol => write!(f, "aerosol"),
            BandRole::DomainSpecific(name) => write!(f, "{name}"),
            BandRole::Spectral(nm) => write!(f, "spectral_{nm}nm"),
            BandRole::Unassigned(ordinal) => write!(f, "band_{ordinal}"),
        }
    }
}

impl Serialize for BandRole {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Description keywords per role. Order is significant: the first role with
/// any matching keyword wins, so "red" shadows "red edge" and "b1" shadows "b11".
const DESCRIPTION_KEYWORDS: &[(BandRole, &[&str])] = &[
    (BandRole::Blue, &["blue", "b1", "coastal", "443", "480"]),
    (BandRole::Green, &["green", "b2", "560", "565"]),
    (BandRole::Red, &["red", "b3", "665", "660"]),
    (BandRole::Nir, &["nir", "near infrared", "b4", "832", "842"]),
    (
        BandRole::RedEdge,
        &["red edge", "vegetation red edge", "b5", "b6", "b7", "705", "740", "783"],
    ),
    (BandRole::Swir1, &["swir", "swir1", "b6", "b11", "1610", "1565"]),
    (BandRole::Swir2, &["swir2", "b7", "b12", "2190", "2200"]),
    (
        BandRole::Thermal,
        &["thermal", "tir", "lwir", "b10", "b11", "temperature", "1030", "1100", "1200"],
    ),
    (BandRole::Pan, &["panchromatic", "pan", "b8"]),
    (BandRole::Cirrus, &["cirrus", "b9", "1373"]),
    (BandRole::Aerosol, &["aerosol", "coastal aerosol", "443"]),
    (
        BandRole::DomainSpecific("dsr"),
        &["dsr", "direct solar radiation", "solar"],
    ),
    (
        BandRole::DomainSpecific("direct"),
        &["direct", "direct radiation"],
    ),
    (
        BandRole::DomainSpecific("diffuse"),
        &["diffuse", "diffuse radiation"],
    ),
];

/// Inclusive nm ranges, tested in order so shared bounds go to the earlier range.
const WAVELENGTH_RANGES: &[(f64, f64, BandRole)] = &[
    (400., 500., BandRole::Blue),
    (500., 600., BandRole::Green),
    (600., 700., BandRole::Red),
    (700., 900., BandRole::Nir),
    (1000., 1800., BandRole::Swir1),
    (1800., 2500., BandRole::Swir2),
    (8000., 15000., BandRole::Thermal),
];

const POSITIONAL_ROLES: &[BandRole] = &[
    BandRole::Blue,
    BandRole::Green,
    BandRole::Red,
    BandRole::Nir,
    BandRole::Swir1,
    BandRole::Swir2,
    BandRole::Thermal,
];

pub fn classify_by_description(description: &str) -> Option<BandRole> {
    let description = description.to_lowercase();
    DESCRIPTION_KEYWORDS
        .iter()
        .find(|(_, keywords)| {
            keywords
                .iter()
                .any(|keyword| description.contains(keyword))
        })
        .map(|(role, _)| role.clone())
}

/// First finite value under a key mentioning "wavelength" or "lambda".
pub fn extract_wavelength(metadata: &Metadata) -> Option<f64> {
    metadata
        .iter()
        .filter(|(key, _)| {
            let key = key.to_lowercase();
            key.contains("wavelength") || key.contains("lambda")
        })
        .find_map(|(_, value)| {
            value
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|wavelength| wavelength.is_finite())
        })
}

pub fn classify_by_wavelength(wavelength: f64) -> BandRole {
    WAVELENGTH_RANGES
        .iter()
        .find(|(low, high, _)| (*low..=*high).contains(&wavelength))
        .map(|(_, _, role)| role.clone())
        .unwrap_or_else(|| BandRole::Spectral(wavelength.round().to_i64().unwrap_or_default()))
}

/// `position` is 0-based.
pub fn classify_by_position(position: usize) -> BandRole {
    POSITIONAL_ROLES
        .get(position)
        .cloned()
        .unwrap_or(BandRole::Unassigned(position + 1))
}

/// Role of the band at 0-based `position`. Pure: same input, same role.
pub fn classify(description: &str, metadata: &Metadata, position: usize) -> BandRole {
    if let Some(role) = classify_by_description(description) {
        return role;
    }
    match extract_wavelength(metadata) {
        Some(wavelength) if wavelength != 0. => classify_by_wavelength(wavelength),
        _ => classify_by_position(position),
    }
}

/// Classification outcome of one band, as reported in the document.
#[derive(Debug, Clone, Serialize)]
pub struct BandDetection {
    pub band_number: usize,
    pub description: String,
    pub detected_type: BandRole,
    pub wavelength: Option<f64>,
    pub metadata: Metadata,
}

impl BandDetection {
    pub fn detect(band: &Band) -> Self {
        let position = band.index.saturating_sub(1);
        Self {
            band_number: band.index,
            description: band.description().to_string(),
            detected_type: classify(band.description(), band.metadata(), position),
            wavelength: extract_wavelength(band.metadata()),
            metadata: band.metadata().clone(),
        }
    }
}

/// Detection records keyed `band_<n>`.
pub fn detect_band_types(bands: &[Band]) -> BTreeMap<String, BandDetection> {
    bands
        .iter()
        .map(|band| (format!("band_{}", band.index), BandDetection::detect(band)))
        .collect()
}

#[derive(Debug, Clone)]
pub struct RoleEntry {
    pub role: BandRole,
    /// 1-based ordinal of the band currently holding the role.
    pub band_index: usize,
    pub wavelength: Option<f64>,
    pub data: Array2<f64>,
}

impl RoleEntry {
    pub fn name(&self) -> String {
        self.role.to_string()
    }
}

/// Role name to band array.
///
/// Bands sharing a role name collapse into one entry: the band with the
/// highest ordinal wins, keeping the position of the first band that took
/// the role.
#[derive(Debug, Clone, Default)]
pub struct RoleMap(Vec<RoleEntry>);

impl RoleMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bands(bands: &[Band]) -> Self {
        let mut sorted: Vec<&Band> = bands.iter().collect();
        sorted.sort_by_key(|band| band.index);
        sorted.into_iter().fold(Self::new(), |mut map, band| {
            let detection = BandDetection::detect(band);
            map.insert(RoleEntry {
                role: detection.detected_type,
                band_index: band.index,
                wavelength: detection.wavelength,
                data: band.data.clone(),
            });
            map
        })
    }

    pub fn insert(&mut self, entry: RoleEntry) {
        match self.0.iter_mut().find(|held| held.role == entry.role) {
            Some(held) => {
                debug!(
                    "band {} replaces band {} as {}",
                    entry.band_index, held.band_index, held.role
                );
                *held = entry;
            }
            None => self.0.push(entry),
        }
    }

    pub fn get(&self, role: &BandRole) -> Option<&Array2<f64>> {
        self.0
            .iter()
            .find(|entry| &entry.role == role)
            .map(|entry| &entry.data)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RoleEntry> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Role name to wavelength, for roles whose band exposes one.
    pub fn wavelengths(&self) -> BTreeMap<String, f64> {
        self.0
            .iter()
            .filter_map(|entry| {
                entry
                    .wavelength
                    .filter(|wavelength| *wavelength != 0.)
                    .map(|wavelength| (entry.name(), wavelength))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;
    use rstest::rstest;

    fn metadata(pairs: &[(&str, &str)]) -> Metadata {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[rstest]
    #[case("Blue", BandRole::Blue)]
    #[case("B2 green", BandRole::Green)]
    #[case("NIR", BandRole::Nir)]
    #[case("SWIR2", BandRole::Swir1)]
    #[case("Thermal", BandRole::Thermal)]
    #[case("Near Infrared", BandRole::Red)]
    #[case("Panchromatic", BandRole::Pan)]
    #[case("DSR", BandRole::DomainSpecific("dsr"))]
    #[case("Diffuse", BandRole::DomainSpecific("diffuse"))]
    fn description_keywords(#[case] description: &str, #[case] expected: BandRole) {
        assert_eq!(classify(description, &Metadata::new(), 9), expected);
    }

    #[rstest]
    fn red_shadows_nir_in_keyword_table() {
        assert_eq!(
            classify("red and nir composite", &Metadata::new(), 0),
            BandRole::Red
        );
    }

    #[rstest]
    fn red_edge_is_shadowed_by_red() {
        assert_eq!(classify("Red Edge 1", &Metadata::new(), 0), BandRole::Red);
    }

    #[rstest]
    #[case(450., BandRole::Blue)]
    #[case(500., BandRole::Blue)]
    #[case(500.5, BandRole::Green)]
    #[case(700., BandRole::Red)]
    #[case(842., BandRole::Nir)]
    #[case(1800., BandRole::Swir1)]
    #[case(2200., BandRole::Swir2)]
    #[case(10900., BandRole::Thermal)]
    #[case(950.4, BandRole::Spectral(950))]
    #[case(950.6, BandRole::Spectral(951))]
    fn wavelength_ranges(#[case] wavelength: f64, #[case] expected: BandRole) {
        assert_eq!(classify_by_wavelength(wavelength), expected);
    }

    #[rstest]
    fn wavelength_beats_position() {
        let metadata = metadata(&[("CENTRAL_WAVELENGTH", "865")]);
        assert_eq!(classify("", &metadata, 0), BandRole::Nir);
    }

    #[rstest]
    fn malformed_wavelength_is_skipped() {
        let metadata = metadata(&[("lambda_unit", "nm"), ("wavelength", "560")]);
        assert_eq!(extract_wavelength(&metadata), Some(560.));
        assert_eq!(classify("", &metadata, 0), BandRole::Green);
    }

    #[rstest]
    fn non_finite_wavelength_is_skipped() {
        let metadata = metadata(&[("wavelength", "NaN")]);
        assert_eq!(extract_wavelength(&metadata), None);
        assert_eq!(classify("", &metadata, 2), BandRole::Red);
    }

    #[rstest]
    #[case(0, BandRole::Blue)]
    #[case(3, BandRole::Nir)]
    #[case(6, BandRole::Thermal)]
    #[case(7, BandRole::Unassigned(8))]
    fn positional_fallback(#[case] position: usize, #[case] expected: BandRole) {
        assert_eq!(classify("", &Metadata::new(), position), expected);
    }

    #[rstest]
    fn classification_is_deterministic() {
        let metadata = metadata(&[("wavelength", "1375"), ("lambda", "665")]);
        let first = classify("unknown layer", &metadata, 11);
        let second = classify("unknown layer", &metadata, 11);
        assert_eq!(first, second);
    }

    #[rstest]
    #[case(BandRole::RedEdge, "red_edge")]
    #[case(BandRole::Spectral(950), "spectral_950nm")]
    #[case(BandRole::Unassigned(12), "band_12")]
    fn role_names(#[case] role: BandRole, #[case] name: &str) {
        assert_eq!(role.to_string(), name);
    }

    #[rstest]
    fn highest_ordinal_wins_shared_role() {
        let bands = vec![
            Band::from_parts(1, Array2::from_elem((1, 1), 1.), "thermal 1", Metadata::new()),
            Band::from_parts(2, Array2::from_elem((1, 1), 2.), "red", Metadata::new()),
            Band::from_parts(3, Array2::from_elem((1, 1), 3.), "thermal 2", Metadata::new()),
        ];
        let map = RoleMap::from_bands(&bands);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&BandRole::Thermal).unwrap()[[0, 0]], 3.);
        let order: Vec<String> = map.iter().map(RoleEntry::name).collect();
        assert_eq!(order, vec!["thermal", "red"]);
    }

    #[rstest]
    fn role_pairs_are_visited_once() {
        let bands: Vec<Band> = ["blue", "green", "red", "nir"]
            .iter()
            .enumerate()
            .map(|(idx, description)| {
                Band::from_parts(idx + 1, Array2::zeros((1, 1)), *description, Metadata::new())
            })
            .collect();
        let map = RoleMap::from_bands(&bands);
        let pairs: Vec<(String, String)> = map
            .iter()
            .tuple_combinations()
            .map(|(first, second)| (first.name(), second.name()))
            .collect();
        assert_eq!(pairs.len(), 6);
        assert_eq!(pairs[0], ("blue".to_string(), "green".to_string()));
        assert_eq!(pairs[5], ("red".to_string(), "nir".to_string()));
    }

    #[rstest]
    fn detection_reports_wavelength_and_type() {
        let band = Band::from_parts(
            5,
            Array2::zeros((1, 1)),
            "",
            metadata(&[("WAVELENGTH", "1610")]),
        );
        let detections = detect_band_types(&[band]);
        let detection = &detections["band_5"];
        assert_eq!(detection.detected_type, BandRole::Swir1);
        assert_eq!(detection.wavelength, Some(1610.));
    }
}

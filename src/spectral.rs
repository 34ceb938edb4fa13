//! Spectral signature of a raster: how the mean of each role relates to its
//! wavelength and to the other roles.

use itertools::Itertools;
use log::debug;
use ndarray::{Array1, ArrayView2, Zip};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::{
    errors::{Result, SpectrascanError},
    roles::{BandRole, RoleMap},
    section::Section,
};

/// Pairs with fewer jointly finite pixels get no correlation.
pub const MIN_CORRELATION_PIXELS: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpectralAnalysis {
    pub band_means: BTreeMap<String, f64>,
    pub detected_wavelengths: BTreeMap<String, f64>,
    pub band_correlations: BTreeMap<String, f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spectral_curve: Option<Section<SpectralCurve>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atmospheric_analysis: Option<AtmosphericAnalysis>,
    pub surface_material_hints: Vec<MaterialHint>,
}

impl SpectralAnalysis {
    fn is_empty(&self) -> bool {
        self.band_means.is_empty()
            && self.detected_wavelengths.is_empty()
            && self.band_correlations.is_empty()
            && self.spectral_curve.is_none()
            && self.atmospheric_analysis.is_none()
            && self.surface_material_hints.is_empty()
    }
}

/// Role means ordered by wavelength.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpectralCurve {
    pub wavelengths: Vec<f64>,
    pub reflectances: Vec<f64>,
    pub slopes: Vec<f64>,
    pub overall_trend: Trend,
    pub steepest_change: SteepestChange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SteepestChange {
    pub slope: f64,
    /// Index into `slopes`.
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtmosphericAnalysis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blue_band_analysis: Option<BlueBandAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blue_nir_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atmospheric_clarity: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlueBandAnalysis {
    pub mean: f64,
    pub std: f64,
    pub atmospheric_haze_indicator: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaterialHint {
    pub material: &'static str,
    pub confidence: &'static str,
    pub reason: &'static str,
}

fn finite(data: ArrayView2<f64>) -> Array1<f64> {
    data.iter().copied().filter(|value| value.is_finite()).collect()
}

/// Mean over finite pixels, `None` when there are none.
pub fn finite_mean(data: ArrayView2<f64>) -> Option<f64> {
    finite(data).mean()
}

/// Pearson r over pixels finite in both bands.
///
/// `None` for mismatched shapes or fewer than [MIN_CORRELATION_PIXELS]
/// usable pixels. Constant bands give NaN.
pub fn pearson(a: ArrayView2<f64>, b: ArrayView2<f64>) -> Option<f64> {
    if a.dim() != b.dim() {
        return None;
    }
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    Zip::from(&a).and(&b).for_each(|&x, &y| {
        if x.is_finite() && y.is_finite() {
            xs.push(x);
            ys.push(y);
        }
    });
    if xs.len() < MIN_CORRELATION_PIXELS {
        return None;
    }
    let (xs, ys) = (Array1::from(xs), Array1::from(ys));
    let (x_mean, y_mean) = (xs.mean()?, ys.mean()?);
    let (xs, ys) = (xs - x_mean, ys - y_mean);
    Some(xs.dot(&ys) / (xs.dot(&xs) * ys.dot(&ys)).sqrt())
}

fn correlations(roles: &RoleMap) -> BTreeMap<String, f64> {
    roles
        .iter()
        .tuple_combinations()
        .filter_map(|(first, second)| {
            let key = format!("{}_vs_{}", first.name(), second.name());
            match pearson(first.data.view(), second.data.view()) {
                Some(r) => Some((key, r)),
                None => {
                    debug!("no correlation for {key}");
                    None
                }
            }
        })
        .collect()
}

/// Curve through the role means sorted by wavelength. Needs at least three
/// wavelengths; two roles at the same wavelength make the slope undefined.
pub fn spectral_curve(
    band_means: &BTreeMap<String, f64>,
    wavelengths: &BTreeMap<String, f64>,
) -> Option<Result<SpectralCurve>> {
    if wavelengths.len() < 3 {
        return None;
    }
    let sorted: Vec<(&String, f64)> = wavelengths
        .iter()
        .map(|(name, wavelength)| (name, *wavelength))
        .sorted_by(|a, b| a.1.total_cmp(&b.1))
        .collect();
    Some(curve_through(&sorted, band_means))
}

fn curve_through(
    sorted: &[(&String, f64)],
    band_means: &BTreeMap<String, f64>,
) -> Result<SpectralCurve> {
    let wavelengths: Vec<f64> = sorted.iter().map(|(_, wavelength)| *wavelength).collect();
    let reflectances: Vec<f64> = sorted
        .iter()
        .map(|(name, _)| band_means.get(*name).copied().unwrap_or(0.))
        .collect();
    let slopes = sorted
        .iter()
        .zip(&reflectances)
        .tuple_windows()
        .map(|(((low_name, low), low_mean), ((high_name, high), high_mean))| {
            if high == low {
                return Err(SpectrascanError::DuplicateWavelength(
                    low_name.to_string(),
                    high_name.to_string(),
                ));
            }
            Ok((high_mean - low_mean) / (high - low))
        })
        .collect::<Result<Vec<f64>>>()?;

    let overall_trend = if slopes.iter().sum::<f64>() > 0. {
        Trend::Increasing
    } else {
        Trend::Decreasing
    };
    // first slope of maximal magnitude
    let steepest_change = slopes
        .iter()
        .enumerate()
        .fold(None, |steepest: Option<SteepestChange>, (position, &slope)| {
            match steepest {
                Some(held) if held.slope.abs() >= slope.abs() => Some(held),
                _ => Some(SteepestChange { slope, position }),
            }
        })
        .unwrap_or(SteepestChange {
            slope: 0.,
            position: 0,
        });

    Ok(SpectralCurve {
        wavelengths,
        reflectances,
        slopes,
        overall_trend,
        steepest_change,
    })
}

pub fn atmospheric_analysis(roles: &RoleMap) -> Option<AtmosphericAnalysis> {
    let blue = roles.get(&BandRole::Blue)?;
    let blue = finite(blue.view());
    let blue_mean = blue.mean().unwrap_or(f64::NAN);
    let blue_std = if blue.is_empty() { f64::NAN } else { blue.std(0.) };

    let blue_nir_ratio = roles.get(&BandRole::Nir).map(|nir| {
        blue_mean / finite_mean(nir.view()).unwrap_or(f64::NAN)
    });
    Some(AtmosphericAnalysis {
        blue_band_analysis: Some(BlueBandAnalysis {
            mean: blue_mean,
            std: blue_std,
            atmospheric_haze_indicator: if blue_mean > 2. * blue_std { "high" } else { "low" },
        }),
        blue_nir_ratio,
        atmospheric_clarity: blue_nir_ratio.map(|ratio| if ratio < 0.5 { "clear" } else { "hazy" }),
    })
}

/// Red, nir and swir ranges in nm, with the roles standing in for a range no
/// wavelength reached.
const SLOT_RANGES: [(f64, f64); 3] = [(600., 700.), (700., 900.), (1000., 2500.)];
const SLOT_ROLES: [&[BandRole]; 3] = [
    &[BandRole::Red],
    &[BandRole::Nir],
    &[BandRole::Swir1, BandRole::Swir2],
];

/// Red, nir and swir means. A wavelength feeds only the first range holding
/// it and later bands overwrite earlier ones. Zero means count as missing.
fn slot_means(
    band_means: &BTreeMap<String, f64>,
    wavelengths: &[(String, f64)],
) -> [Option<f64>; 3] {
    let mut slots = [None; 3];
    for (name, wavelength) in wavelengths {
        let slot = SLOT_RANGES
            .iter()
            .position(|(low, high)| (*low..=*high).contains(wavelength));
        if let Some(slot) = slot {
            slots[slot] = Some(band_means.get(name).copied().unwrap_or_default());
        }
    }
    for (slot, roles) in slots.iter_mut().zip(SLOT_ROLES) {
        if slot.is_none() {
            *slot = roles
                .iter()
                .find_map(|role| band_means.get(&role.to_string()).copied());
        }
    }
    slots.map(|mean| mean.filter(|mean| *mean != 0.))
}

/// `wavelengths` in band order.
pub fn surface_material_hints(
    band_means: &BTreeMap<String, f64>,
    wavelengths: &[(String, f64)],
) -> Vec<MaterialHint> {
    let [red, nir, swir] = slot_means(band_means, wavelengths);

    let mut hints = Vec::new();
    if let (Some(red), Some(nir)) = (red, nir) {
        if nir > 1.5 * red {
            hints.push(MaterialHint {
                material: "healthy_vegetation",
                confidence: "high",
                reason: "High NIR/Red ratio indicates chlorophyll",
            });
        } else if nir < red {
            hints.push(MaterialHint {
                material: "bare_soil_or_urban",
                confidence: "medium",
                reason: "Low NIR/Red ratio",
            });
        }
    }
    if let (Some(nir), Some(swir)) = (nir, swir) {
        if nir < 0.5 * swir {
            hints.push(MaterialHint {
                material: "water_body",
                confidence: "medium",
                reason: "Low NIR and SWIR reflectance",
            });
        }
    }
    let means: Array1<f64> = band_means.values().copied().collect();
    if let Some(brightness) = means.mean() {
        if brightness > 3. * means.std(0.) {
            hints.push(MaterialHint {
                material: "bright_surface",
                confidence: "low",
                reason: "High overall reflectance (sand, concrete, snow)",
            });
        }
    }
    hints
}

/// Spectral signature of the role-mapped bands. `None` when nothing at all
/// could be derived.
pub fn analyze(roles: &RoleMap, wavelengths: &BTreeMap<String, f64>) -> Option<SpectralAnalysis> {
    let band_means: BTreeMap<String, f64> = roles
        .iter()
        .filter_map(|entry| finite_mean(entry.data.view()).map(|mean| (entry.name(), mean)))
        .collect();
    let ordered_wavelengths: Vec<(String, f64)> = roles
        .iter()
        .filter_map(|entry| {
            let name = entry.name();
            wavelengths.get(&name).map(|wavelength| (name, *wavelength))
        })
        .collect();
    let analysis = SpectralAnalysis {
        band_correlations: correlations(roles),
        spectral_curve: spectral_curve(&band_means, wavelengths)
            .map(|curve| Section::capture("Spectral curve", curve)),
        atmospheric_analysis: atmospheric_analysis(roles),
        surface_material_hints: surface_material_hints(&band_means, &ordered_wavelengths),
        detected_wavelengths: wavelengths.clone(),
        band_means,
    };
    (!analysis.is_empty()).then_some(analysis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Band, Metadata};
    use approx::assert_relative_eq;
    use ndarray::{array, Array2};
    use rstest::rstest;

    fn means(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), *value))
            .collect()
    }

    fn ramp(rows: usize, cols: usize, scale: f64, offset: f64) -> Array2<f64> {
        Array2::from_shape_fn((rows, cols), |(row, col)| {
            (row * cols + col) as f64 * scale + offset
        })
    }

    fn role_map(bands: Vec<(&str, Array2<f64>)>) -> RoleMap {
        let bands: Vec<Band> = bands
            .into_iter()
            .enumerate()
            .map(|(idx, (description, data))| {
                Band::from_parts(idx + 1, data, description, Metadata::new())
            })
            .collect();
        RoleMap::from_bands(&bands)
    }

    #[rstest]
    fn linear_bands_correlate_perfectly() {
        let a = ramp(10, 10, 1., 0.);
        let b = ramp(10, 10, -2., 5.);
        assert_relative_eq!(pearson(a.view(), a.view()).unwrap(), 1.);
        assert_relative_eq!(pearson(a.view(), b.view()).unwrap(), -1.);
    }

    #[rstest]
    fn correlation_needs_a_hundred_joint_pixels() {
        let a = ramp(10, 10, 1., 0.);
        let mut b = ramp(10, 10, 1., 0.);
        b[[0, 0]] = f64::NAN;
        assert!(pearson(a.view(), b.view()).is_none());
        assert!(pearson(a.view(), ramp(5, 20, 1., 0.).view()).is_none());
    }

    #[rstest]
    fn correlation_keys_follow_map_order() {
        let map = role_map(vec![
            ("red", ramp(10, 10, 1., 0.)),
            ("nir", ramp(10, 10, 2., 1.)),
            ("blue", ramp(2, 2, 1., 0.)),
        ]);
        let correlations = correlations(&map);
        assert_eq!(
            correlations.keys().collect::<Vec<_>>(),
            vec!["red_vs_nir"]
        );
    }

    #[rstest]
    fn curve_is_sorted_by_wavelength() {
        let band_means = means(&[("blue", 0.1), ("red", 0.5), ("nir", 0.6)]);
        let wavelengths = means(&[("nir", 840.), ("blue", 480.), ("red", 660.)]);
        let curve = spectral_curve(&band_means, &wavelengths).unwrap().unwrap();
        assert_eq!(curve.wavelengths, vec![480., 660., 840.]);
        assert_eq!(curve.reflectances, vec![0.1, 0.5, 0.6]);
        assert_eq!(curve.overall_trend, Trend::Increasing);
        assert_relative_eq!(curve.slopes[0], 0.4 / 180., epsilon = 1e-12);
        assert_eq!(curve.steepest_change.position, 0);
    }

    #[rstest]
    fn steepest_change_keeps_first_maximum() {
        let band_means = means(&[("a", 1.), ("b", 0.), ("c", 1.), ("d", 3.)]);
        let wavelengths = means(&[("a", 100.), ("b", 200.), ("c", 300.), ("d", 400.)]);
        let curve = spectral_curve(&band_means, &wavelengths).unwrap().unwrap();
        assert_eq!(
            curve.steepest_change,
            SteepestChange {
                slope: 0.02,
                position: 2
            }
        );

        let band_means = means(&[("a", 1.), ("b", 0.), ("c", 1.)]);
        let wavelengths = means(&[("a", 100.), ("b", 200.), ("c", 300.)]);
        let curve = spectral_curve(&band_means, &wavelengths).unwrap().unwrap();
        assert_eq!(curve.steepest_change.position, 0);
        assert_eq!(curve.overall_trend, Trend::Decreasing);
    }

    #[rstest]
    fn curve_needs_three_wavelengths() {
        let wavelengths = means(&[("red", 660.), ("nir", 840.)]);
        assert!(spectral_curve(&BTreeMap::new(), &wavelengths).is_none());
    }

    #[rstest]
    fn duplicate_wavelengths_fail_the_curve() {
        let wavelengths = means(&[("red", 660.), ("band_5", 660.), ("nir", 840.)]);
        assert!(matches!(
            spectral_curve(&BTreeMap::new(), &wavelengths),
            Some(Err(SpectrascanError::DuplicateWavelength(..)))
        ));
    }

    #[rstest]
    fn blue_band_drives_atmospheric_analysis() {
        let map = role_map(vec![("nir", array![[1.]])]);
        assert!(atmospheric_analysis(&map).is_none());

        let map = role_map(vec![("blue", array![[1., 3.]]), ("nir", array![[8., 8.]])]);
        let analysis = atmospheric_analysis(&map).unwrap();
        let blue = analysis.blue_band_analysis.unwrap();
        assert_relative_eq!(blue.mean, 2.);
        assert_relative_eq!(blue.std, 1.);
        assert_eq!(blue.atmospheric_haze_indicator, "low");
        assert_relative_eq!(analysis.blue_nir_ratio.unwrap(), 0.25);
        assert_eq!(analysis.atmospheric_clarity, Some("clear"));
    }

    #[rstest]
    #[case(&[("red", 0.1), ("nir", 0.5)], &["healthy_vegetation"])]
    #[case(&[("red", 0.5), ("nir", 0.2)], &["bare_soil_or_urban"])]
    #[case(&[("red", 0.5), ("nir", 0.6)], &[])]
    #[case(&[("nir", 0.1), ("swir1", 0.5)], &["water_body"])]
    #[case(&[("red", 0.), ("nir", 0.5)], &[])]
    fn material_hints_from_role_means(#[case] pairs: &[(&str, f64)], #[case] expected: &[&str]) {
        // spread is large enough to keep the brightness hint quiet
        let mut band_means = means(pairs);
        band_means.insert("band_9".into(), -10.);
        let hints: Vec<&str> = surface_material_hints(&band_means, &[])
            .iter()
            .map(|hint| hint.material)
            .collect();
        assert_eq!(hints, expected);
    }

    #[rstest]
    fn wavelengths_take_precedence_over_roles() {
        let band_means = means(&[("red", 0.5), ("spectral_650nm", 0.1), ("nir", 0.5)]);
        let wavelengths = [("spectral_650nm".to_string(), 650.)];
        let hints = surface_material_hints(&band_means, &wavelengths);
        assert_eq!(hints[0].material, "healthy_vegetation");
    }

    #[rstest]
    fn shared_bound_feeds_only_the_first_range() {
        // 700 nm is red, so there is no nir mean to compare with swir
        let band_means = means(&[("red", 0.1), ("swir1", 1.0)]);
        let wavelengths = [("red".to_string(), 700.), ("swir1".to_string(), 1600.)];
        assert_eq!(
            slot_means(&band_means, &wavelengths),
            [Some(0.1), None, Some(1.0)]
        );
        assert!(surface_material_hints(&band_means, &wavelengths)
            .iter()
            .all(|hint| hint.material != "water_body"));
    }

    #[rstest]
    fn later_band_in_range_wins() {
        let wavelength = |nm: &str| -> Metadata {
            [("WAVELENGTH".to_string(), nm.to_string())]
                .into_iter()
                .collect()
        };
        let bands = vec![
            Band::from_parts(1, array![[0.5, 0.5]], "pan", wavelength("650")),
            Band::from_parts(2, array![[0.1, 0.1]], "cirrus", wavelength("660")),
            Band::from_parts(3, array![[0.5, 0.5]], "nir", Metadata::new()),
        ];
        let map = RoleMap::from_bands(&bands);
        let analysis = analyze(&map, &map.wavelengths()).unwrap();
        let hints: Vec<&str> = analysis
            .surface_material_hints
            .iter()
            .map(|hint| hint.material)
            .collect();
        assert_eq!(hints, ["healthy_vegetation"]);
    }

    #[rstest]
    fn uniform_means_look_bright() {
        let hints = surface_material_hints(&means(&[("band_1", 100.), ("band_2", 101.)]), &[]);
        assert_eq!(hints.len(), 1);
        assert_eq!(hints[0].material, "bright_surface");
    }

    #[rstest]
    fn analysis_of_an_empty_map_is_absent() {
        assert!(analyze(&RoleMap::new(), &BTreeMap::new()).is_none());
    }

    #[rstest]
    fn analysis_reports_finite_means() {
        let map = role_map(vec![("red", array![[1., f64::NAN, 3.]])]);
        let analysis = analyze(&map, &map.wavelengths()).unwrap();
        assert_relative_eq!(analysis.band_means["red"], 2.);
        assert!(analysis.spectral_curve.is_none());
    }
}

use itertools::Itertools;
use log::{debug, warn};
use ndarray::ArrayView2;
use serde::Serialize;
use std::collections::BTreeMap;

use super::safe::{
    normalized_difference, ratio, safe_binary_index, safe_ternary_index, IndexResult,
};
use crate::{
    errors::Result,
    roles::{BandRole, RoleMap},
};

/// Index name to result.
pub type IndexFamily = BTreeMap<String, IndexResult>;

/// Soil brightness correction factor of SAVI.
const SAVI_L: f64 = 0.5;

fn view<'a>(roles: &'a RoleMap, role: &BandRole) -> Option<ArrayView2<'a, f64>> {
    roles.get(role).map(|data| data.view())
}

/// NDVI, SAVI and RVI from red and NIR; GNDVI and EVI when green or SWIR1 exist.
/// `None` without red and NIR.
pub fn vegetation(roles: &RoleMap) -> Option<Result<IndexFamily>> {
    let red = view(roles, &BandRole::Red)?;
    let nir = view(roles, &BandRole::Nir)?;
    let green = view(roles, &BandRole::Green);
    let swir1 = view(roles, &BandRole::Swir1);
    Some(vegetation_indices(red, nir, green, swir1))
}

fn vegetation_indices(
    red: ArrayView2<f64>,
    nir: ArrayView2<f64>,
    green: Option<ArrayView2<f64>>,
    swir1: Option<ArrayView2<f64>>,
) -> Result<IndexFamily> {
    let mut family = IndexFamily::new();
    family.insert("ndvi".into(), safe_binary_index(nir, red, normalized_difference)?);
    family.insert(
        "savi".into(),
        safe_binary_index(nir, red, |nir, red| {
            ((nir - red) / (nir + red + SAVI_L)) * (1. + SAVI_L)
        })?,
    );
    family.insert("rvi".into(), safe_binary_index(nir, red, ratio)?);
    if let Some(green) = green {
        family.insert("gndvi".into(), safe_binary_index(nir, green, normalized_difference)?);
    }
    if let Some(swir1) = swir1 {
        family.insert(
            "evi".into(),
            safe_ternary_index(nir, red, swir1, |nir, red, swir1| {
                2.5 * (nir - red) / (nir + 6. * red - 7.5 * swir1 + 1.)
            })?,
        );
    }
    Ok(family)
}

/// NDWI, MNDWI and WRI, each whenever its own pair of bands exists.
pub fn water(roles: &RoleMap) -> Option<Result<IndexFamily>> {
    let green = view(roles, &BandRole::Green);
    let nir = view(roles, &BandRole::Nir);
    let swir1 = view(roles, &BandRole::Swir1);
    let pairs: [Pair; 3] = [
        ("ndwi", green, nir, normalized_difference),
        ("mndwi", green, swir1, normalized_difference),
        ("wri", nir, swir1, ratio),
    ];
    pair_family(pairs)
}

/// NDBI and BSI.
pub fn soil(roles: &RoleMap) -> Option<Result<IndexFamily>> {
    let red = view(roles, &BandRole::Red);
    let nir = view(roles, &BandRole::Nir);
    let swir1 = view(roles, &BandRole::Swir1);
    let pairs: [Pair; 2] = [
        ("ndbi", swir1, nir, normalized_difference),
        ("bsi", swir1, red, normalized_difference),
    ];
    pair_family(pairs)
}

type Pair<'a> = (
    &'static str,
    Option<ArrayView2<'a, f64>>,
    Option<ArrayView2<'a, f64>>,
    fn(f64, f64) -> f64,
);

fn pair_family<'a>(pairs: impl IntoIterator<Item = Pair<'a>>) -> Option<Result<IndexFamily>> {
    let available: Vec<_> = pairs
        .into_iter()
        .filter_map(|(name, a, b, formula)| Some((name, a?, b?, formula)))
        .collect();
    if available.is_empty() {
        return None;
    }
    Some(
        available
            .into_iter()
            .map(|(name, a, b, formula)| {
                safe_binary_index(a, b, formula).map(|result| (name.to_string(), result))
            })
            .collect(),
    )
}

/// Raw statistics of a thermal band; no finite filtering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThermalStats {
    pub mean_temperature: f64,
    pub min_temperature: f64,
    pub max_temperature: f64,
    pub temp_std: f64,
}

impl ThermalStats {
    /// NaN anywhere in the band makes every statistic NaN.
    pub fn of(data: ArrayView2<f64>) -> Self {
        let nan_aware = |pick: fn(f64, f64) -> f64| {
            move |acc: f64, &value: &f64| {
                if acc.is_nan() || value.is_nan() {
                    f64::NAN
                } else {
                    pick(acc, value)
                }
            }
        };
        Self {
            mean_temperature: data.mean().unwrap_or(f64::NAN),
            min_temperature: data.iter().fold(f64::INFINITY, nan_aware(f64::min)),
            max_temperature: data.iter().fold(f64::NEG_INFINITY, nan_aware(f64::max)),
            temp_std: if data.is_empty() { f64::NAN } else { data.std(0.) },
        }
    }
}

pub fn is_thermal(role_name: &str) -> bool {
    role_name.contains("thermal") || role_name.contains("tir")
}

/// `thermal_band_<k>` for every thermal role, in role map order.
pub fn thermal(roles: &RoleMap) -> Option<BTreeMap<String, ThermalStats>> {
    let family: BTreeMap<String, ThermalStats> = roles
        .iter()
        .filter(|entry| is_thermal(&entry.name()))
        .enumerate()
        .map(|(k, entry)| {
            (
                format!("thermal_band_{}", k + 1),
                ThermalStats::of(entry.data.view()),
            )
        })
        .collect();
    (!family.is_empty()).then_some(family)
}

/// `<a>_<b>_ratio` and `<a>_<b>_ndiff` for every unordered pair of roles.
/// Pairs that can not be computed are left out.
pub fn custom(roles: &RoleMap) -> Option<IndexFamily> {
    let mut family = IndexFamily::new();
    for (first, second) in roles.iter().tuple_combinations() {
        let (a, b) = (first.name(), second.name());
        let formulas: [(&str, fn(f64, f64) -> f64); 2] =
            [("ratio", ratio), ("ndiff", normalized_difference)];
        for (suffix, formula) in formulas {
            match safe_binary_index(first.data.view(), second.data.view(), formula) {
                Ok(result) if result.is_computable() => {
                    family.insert(format!("{a}_{b}_{suffix}"), result);
                }
                Ok(_) => debug!("{a}_{b}_{suffix} has no finite pixel"),
                Err(err) => warn!("skipping {a}_{b}_{suffix}: {err}"),
            }
        }
    }
    (!family.is_empty()).then_some(family)
}

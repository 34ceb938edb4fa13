use itertools::Itertools;
use ndarray::{Array1, ArrayView2};
use serde::Serialize;
use std::cmp::Ordering;

use crate::components::{Band, BandInfo};

/// Sentinel many products use for missing pixels.
const CONVENTIONAL_NODATA: f64 = -9999.;
/// Upper bound on histogram bins.
const MAX_BINS: usize = 256;

/// Descriptive statistics over the valid pixels of a band; every statistic is
/// `None` when no pixel is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BandStatistics {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub median: Option<f64>,
    pub q25: Option<f64>,
    pub q75: Option<f64>,
    pub valid_pixels: usize,
    pub total_pixels: usize,
    pub nodata_pixels: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub counts: Vec<usize>,
    /// Bin edges, one more than `counts`.
    pub bins: Vec<f64>,
    pub bin_count: usize,
}

/// Everything reported for one band under `band_data`.
#[derive(Debug, Clone, Serialize)]
pub struct BandReport {
    pub band_index: usize,
    #[serde(flatten)]
    pub info: BandInfo,
    pub statistics: BandStatistics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub histogram: Option<Histogram>,
}

impl BandReport {
    /// `histogram_pixel_limit` caps the valid pixel count a histogram is built for.
    pub fn new(band: &Band, histogram_pixel_limit: usize) -> Self {
        let data = band.data.view();
        let nodata = band.info.nodata_value.or_else(|| infer_nodata(data));
        let valid = sorted_valid(data, nodata);
        let histogram = (!valid.is_empty() && valid.len() <= histogram_pixel_limit)
            .then(|| histogram(&valid));
        Self {
            band_index: band.index,
            info: band.info.clone(),
            statistics: BandStatistics::of_sorted(&valid, data.len()),
            histogram,
        }
    }
}

/// Guess a no-data value for a band that declares none: 0 when zeros cover
/// more than half the band, else -9999 when it occurs. A constant band has none.
pub fn infer_nodata(data: ArrayView2<f64>) -> Option<f64> {
    let first = data.iter().next()?;
    if data.iter().all(|value| value.total_cmp(first) == Ordering::Equal) {
        return None;
    }
    let zeros = data.iter().filter(|value| **value == 0.).count();
    if zeros as f64 > data.len() as f64 * 0.5 {
        Some(0.)
    } else if data.iter().any(|value| *value == CONVENTIONAL_NODATA) {
        Some(CONVENTIONAL_NODATA)
    } else {
        None
    }
}

/// Finite pixels not equal to `nodata`, ascending.
pub fn sorted_valid(data: ArrayView2<f64>, nodata: Option<f64>) -> Vec<f64> {
    let mut valid: Vec<f64> = data
        .iter()
        .copied()
        .filter(|value| value.is_finite() && Some(*value) != nodata)
        .collect();
    valid.sort_by(f64::total_cmp);
    valid
}

/// `q`-th percentile of ascending `sorted` with linear interpolation.
pub fn percentile(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let rank = q / 100. * last as f64;
    let (low, high) = (rank.floor() as usize, rank.ceil() as usize);
    Some(sorted[low] + (sorted[high] - sorted[low]) * (rank - low as f64))
}

impl BandStatistics {
    pub fn of_sorted(sorted: &[f64], total_pixels: usize) -> Self {
        let counts = Self {
            valid_pixels: sorted.len(),
            total_pixels,
            nodata_pixels: total_pixels.saturating_sub(sorted.len()),
            ..Default::default()
        };
        let values = Array1::from(sorted.to_vec());
        let Some(mean) = values.mean() else {
            return counts;
        };
        Self {
            min: sorted.first().copied(),
            max: sorted.last().copied(),
            mean: Some(mean),
            std: Some(values.std(0.)),
            median: percentile(sorted, 50.),
            q25: percentile(sorted, 25.),
            q75: percentile(sorted, 75.),
            ..counts
        }
    }
}

/// Equal width histogram of ascending, non-empty `sorted` with one bin per
/// distinct value up to [MAX_BINS]. The last bin is closed.
pub fn histogram(sorted: &[f64]) -> Histogram {
    let bin_number = sorted.iter().dedup().count().clamp(1, MAX_BINS);
    let (mut low, mut high) = (
        sorted.first().copied().unwrap_or_default(),
        sorted.last().copied().unwrap_or_default(),
    );
    if low == high {
        low -= 0.5;
        high += 0.5;
    }
    let width = (high - low) / bin_number as f64;
    let bins: Vec<f64> = (0..=bin_number)
        .map(|edge| low + edge as f64 * width)
        .collect();

    let mut counts = vec![0; bin_number];
    for value in sorted {
        let bin = (((value - low) / width) as usize).min(bin_number - 1);
        counts[bin] += 1;
    }
    Histogram {
        counts,
        bin_count: bins.len(),
        bins,
    }
}

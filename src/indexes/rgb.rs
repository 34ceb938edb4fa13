use ndarray::{Array2, ArrayView2, Zip};
use serde::Serialize;

use super::safe::{summarize, IndexResult};
use crate::errors::{Result, SpectrascanError};

/// Perceptual statistics of an RGB triplet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RgbIndices {
    pub brightness: IndexResult,
    pub saturation: IndexResult,
    pub hue: IndexResult,
}

/// (min, max) over non-NaN values.
fn value_range(channel: &ArrayView2<f64>) -> (f64, f64) {
    channel
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), &value| {
            (min.min(value), max.max(value))
        })
}

/// Channel scaled to [0, 1] by its own range. A flat channel is left as is.
fn min_max_scaler(channel: &ArrayView2<f64>) -> impl Fn(f64) -> f64 {
    let (min, max) = value_range(channel);
    move |value| {
        if max > min {
            (value - min) / (max - min)
        } else {
            value
        }
    }
}

/// Hue in degrees. Where channels tie for the maximum, blue beats green beats red.
pub fn hue(red: f64, green: f64, blue: f64) -> f64 {
    let max = red.max(green).max(blue);
    let delta = max - red.min(green).min(blue);
    if delta.is_nan() || delta <= 0. {
        return 0.;
    }
    let sector = if max == blue {
        (red - green) / delta + 4.
    } else if max == green {
        (blue - red) / delta + 2.
    } else {
        ((green - blue) / delta).rem_euclid(6.)
    };
    sector * 60.
}

pub fn saturation(red: f64, green: f64, blue: f64) -> f64 {
    let max = red.max(green).max(blue);
    if max > 0. {
        (max - red.min(green).min(blue)) / max
    } else {
        0.
    }
}

pub fn rgb_indices<'a>(
    red: ArrayView2<'a, f64>,
    green: ArrayView2<'a, f64>,
    blue: ArrayView2<'a, f64>,
) -> Result<RgbIndices> {
    for other in [&green, &blue] {
        if red.dim() != other.dim() {
            return Err(SpectrascanError::ShapeMismatch {
                left: red.dim(),
                right: other.dim(),
            });
        }
    }

    let eight_bit = [&red, &green, &blue]
        .iter()
        .all(|channel| value_range(channel).1 <= 255.);
    let normalize = |channel: &ArrayView2<f64>| -> Array2<f64> {
        if eight_bit {
            channel.mapv(|value| value / 255.)
        } else {
            channel.mapv(min_max_scaler(channel))
        }
    };
    let (red, green, blue) = (normalize(&red), normalize(&green), normalize(&blue));

    let mut brightness = Vec::with_capacity(red.len());
    let mut saturations = Vec::with_capacity(red.len());
    let mut hues = Vec::with_capacity(red.len());
    Zip::from(&red)
        .and(&green)
        .and(&blue)
        .for_each(|&red, &green, &blue| {
            let pixel = (
                (red + green + blue) / 3.,
                saturation(red, green, blue),
                hue(red, green, blue),
            );
            if pixel.0.is_finite() && pixel.1.is_finite() && pixel.2.is_finite() {
                brightness.push(pixel.0);
                saturations.push(pixel.1);
                hues.push(pixel.2);
            }
        });

    Ok(RgbIndices {
        brightness: summarize(brightness),
        saturation: summarize(saturations),
        hue: summarize(hues),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;
    use rstest::rstest;

    #[rstest]
    #[case(1., 0., 0., 0.)]
    #[case(0., 1., 0., 120.)]
    #[case(0., 0., 1., 240.)]
    #[case(1., 0., 1., 300.)]
    #[case(1., 1., 0., 60.)]
    #[case(0.5, 0.5, 0.5, 0.)]
    fn six_sector_hue(#[case] red: f64, #[case] green: f64, #[case] blue: f64, #[case] expected: f64) {
        assert_relative_eq!(hue(red, green, blue), expected);
    }

    #[rstest]
    fn saturation_of_black_is_zero() {
        assert_eq!(saturation(0., 0., 0.), 0.);
        assert_relative_eq!(saturation(1., 0.5, 0.), 1.);
    }

    #[rstest]
    fn eight_bit_channels_divide_by_255() {
        let red = array![[255., 0.]];
        let green = array![[255., 0.]];
        let blue = array![[255., 0.]];
        let rgb = rgb_indices(red.view(), green.view(), blue.view()).unwrap();
        let brightness = rgb.brightness.stats().unwrap();
        assert_relative_eq!(brightness.max, 1.);
        assert_relative_eq!(brightness.min, 0.);
        assert_eq!(brightness.valid_pixel_count, 2);
    }

    #[rstest]
    fn wide_range_channels_are_min_max_scaled() {
        let red = array![[1000., 3000.]];
        let green = array![[1000., 3000.]];
        let blue = Array2::from_elem((1, 2), 500.);
        let rgb = rgb_indices(red.view(), green.view(), blue.view()).unwrap();
        // red and green scale to [0, 1]; flat blue stays at 500.
        let brightness = rgb.brightness.stats().unwrap();
        assert_relative_eq!(brightness.min, 500. / 3.);
        assert_relative_eq!(brightness.max, 502. / 3.);
    }

    #[rstest]
    fn nan_pixels_are_excluded_everywhere() {
        let red = array![[10., f64::NAN]];
        let green = array![[20., 5.]];
        let blue = array![[30., 5.]];
        let rgb = rgb_indices(red.view(), green.view(), blue.view()).unwrap();
        assert_eq!(rgb.hue.stats().unwrap().valid_pixel_count, 1);
        assert_eq!(rgb.saturation.stats().unwrap().valid_pixel_count, 1);
    }
}

use ndarray::{Array1, ArrayView2, Zip};
use serde::{Serialize, Serializer};

use crate::errors::{Result, SpectrascanError};

/// Summary of an index over its finite pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndexStats {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub valid_pixel_count: usize,
}

/// Outcome of an index computation; `NotComputable` when no finite pixel is left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndexResult {
    Computed(IndexStats),
    NotComputable,
}

impl IndexResult {
    pub fn stats(&self) -> Option<&IndexStats> {
        match self {
            IndexResult::Computed(stats) => Some(stats),
            IndexResult::NotComputable => None,
        }
    }

    pub fn is_computable(&self) -> bool {
        matches!(self, IndexResult::Computed(_))
    }
}

impl Serialize for IndexResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            IndexResult::Computed(stats) => stats.serialize(serializer),
            IndexResult::NotComputable => serializer.serialize_none(),
        }
    }
}

/// Statistics of the finite values of `values`; the single place
/// where non-finite numbers are dropped.
pub fn summarize(values: impl IntoIterator<Item = f64>) -> IndexResult {
    let finite: Array1<f64> = values.into_iter().filter(|value| value.is_finite()).collect();
    match finite.mean() {
        Some(mean) => IndexResult::Computed(IndexStats {
            mean,
            std: finite.std(0.),
            min: finite.iter().copied().fold(f64::INFINITY, f64::min),
            max: finite.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            valid_pixel_count: finite.len(),
        }),
        None => IndexResult::NotComputable,
    }
}

fn check_shapes(left: &ArrayView2<f64>, right: &ArrayView2<f64>) -> Result<()> {
    if left.dim() != right.dim() {
        return Err(SpectrascanError::ShapeMismatch {
            left: left.dim(),
            right: right.dim(),
        });
    }
    Ok(())
}

/// Apply `formula` pixel by pixel over two bands and summarize the finite results.
pub fn safe_binary_index<F>(a: ArrayView2<f64>, b: ArrayView2<f64>, formula: F) -> Result<IndexResult>
where
    F: Fn(f64, f64) -> f64,
{
    check_shapes(&a, &b)?;
    let values = Zip::from(&a).and(&b).map_collect(|&a, &b| formula(a, b));
    Ok(summarize(values.iter().copied()))
}

/// Three band variant of [safe_binary_index].
pub fn safe_ternary_index<F>(
    a: ArrayView2<f64>,
    b: ArrayView2<f64>,
    c: ArrayView2<f64>,
    formula: F,
) -> Result<IndexResult>
where
    F: Fn(f64, f64, f64) -> f64,
{
    check_shapes(&a, &b)?;
    check_shapes(&a, &c)?;
    let values = Zip::from(&a)
        .and(&b)
        .and(&c)
        .map_collect(|&a, &b, &c| formula(a, b, c));
    Ok(summarize(values.iter().copied()))
}

pub fn normalized_difference(a: f64, b: f64) -> f64 {
    (a - b) / (a + b)
}

pub fn ratio(a: f64, b: f64) -> f64 {
    a / b
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{array, Array2};
    use rstest::rstest;

    #[rstest]
    fn ndvi_of_full_nir_and_dark_red() {
        let nir = array![[1., 1., 1.]];
        let red = array![[0., 0., 0.]];
        let result = safe_binary_index(nir.view(), red.view(), normalized_difference).unwrap();
        assert_eq!(
            result,
            IndexResult::Computed(IndexStats {
                mean: 1.,
                std: 0.,
                min: 1.,
                max: 1.,
                valid_pixel_count: 3,
            })
        );
    }

    #[rstest]
    fn zero_denominators_are_filtered() {
        let a = array![[0., 2., 4.], [0., 1., 3.]];
        let b = array![[0., 1., 2.], [0., 1., 1.]];
        let result = safe_binary_index(a.view(), b.view(), ratio).unwrap();
        let stats = result.stats().unwrap();
        assert_eq!(stats.valid_pixel_count, 4);
        assert!(stats.valid_pixel_count <= a.len());
        assert_relative_eq!(stats.mean, (2. + 2. + 1. + 3.) / 4.);
        assert_relative_eq!(stats.min, 1.);
        assert_relative_eq!(stats.max, 3.);
    }

    #[rstest]
    fn all_non_finite_is_not_computable() {
        let zeros = Array2::<f64>::zeros((2, 2));
        let result = safe_binary_index(zeros.view(), zeros.view(), ratio).unwrap();
        assert_eq!(result, IndexResult::NotComputable);
        assert_eq!(serde_json::to_string(&result).unwrap(), "null");
    }

    #[rstest]
    fn population_standard_deviation() {
        let a = array![[1., 2., 3., 4.]];
        let ones = Array2::<f64>::ones((1, 4));
        let stats = *safe_binary_index(a.view(), ones.view(), |a, b| a * b)
            .unwrap()
            .stats()
            .unwrap();
        assert_relative_eq!(stats.std, 1.25f64.sqrt());
    }

    #[rstest]
    fn mismatched_shapes_are_an_error() {
        let a = Array2::<f64>::ones((2, 2));
        let b = Array2::<f64>::ones((3, 2));
        assert!(matches!(
            safe_binary_index(a.view(), b.view(), ratio),
            Err(SpectrascanError::ShapeMismatch { .. })
        ));
    }

    #[rstest]
    fn ternary_formula_sees_all_bands() {
        let a = array![[1., 2.]];
        let b = array![[3., 4.]];
        let c = array![[5., f64::NAN]];
        let stats = *safe_ternary_index(a.view(), b.view(), c.view(), |a, b, c| a + b + c)
            .unwrap()
            .stats()
            .unwrap();
        assert_eq!(stats.valid_pixel_count, 1);
        assert_relative_eq!(stats.mean, 9.);
    }
}

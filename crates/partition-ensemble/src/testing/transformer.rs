use std::collections::HashMap;

use ndarray::{Array1, Array2, Axis};

use crate::frame::{Column, ColumnKind, Frame, FrameError};
use crate::transform::{FeatureTransformer, Scaler, TransformError, TransformOptions};

/// Uses every non-label column as a feature.
///
/// Numeric columns pass through. Text columns become ordinal codes in order
/// of first appearance, with missing values as `NaN`. A frame without the
/// label column yields an all-`NaN` target.
#[derive(Debug, Clone)]
pub struct ColumnTransformer {
    label: String,
}

impl ColumnTransformer {
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into() }
    }

    fn targets(&self, data: &Frame, binary: bool) -> Result<Array1<f64>, TransformError> {
        if !data.has_column(&self.label) {
            return Ok(Array1::from_elem(data.n_rows(), f64::NAN));
        }
        let column = data.column(&self.label)?;
        let values = column.as_numeric().ok_or_else(|| FrameError::ColumnTypeMismatch {
            column: self.label.clone(),
            expected: ColumnKind::Numeric,
            got: column.kind(),
        })?;
        if !binary {
            return Ok(values.to_owned());
        }
        Ok(values.mapv(|v| {
            if v.is_nan() {
                f64::NAN
            } else if v > 0.0 {
                1.0
            } else {
                0.0
            }
        }))
    }
}

fn encode(column: &Column) -> Array1<f64> {
    match column {
        Column::Numeric(values) => values.clone(),
        Column::Text(values) => {
            let mut codes: HashMap<&str, f64> = HashMap::new();
            values
                .iter()
                .map(|v| match v {
                    Some(s) => {
                        let next = codes.len() as f64;
                        *codes.entry(s.as_str()).or_insert(next)
                    }
                    None => f64::NAN,
                })
                .collect()
        }
    }
}

impl FeatureTransformer for ColumnTransformer {
    fn transform(
        &self,
        data: &Frame,
        options: &TransformOptions<'_>,
    ) -> Result<(Array2<f64>, Array1<f64>), TransformError> {
        let ignored = options.ignore_features.unwrap_or(&[]);
        let features: Vec<Array1<f64>> = data
            .columns()
            .filter(|(name, _)| *name != self.label && !ignored.iter().any(|i| i == name))
            .map(|(_, column)| encode(column))
            .collect();

        let mut matrix = Array2::from_shape_fn((data.n_rows(), features.len()), |(r, c)| features[c][r]);
        if let Some(scaler) = options.scaler {
            matrix = scaler.fit_transform(matrix);
        }
        Ok((matrix, self.targets(data, options.binary_target)?))
    }
}

/// Centers every column to mean 0 and scales to unit variance, ignoring
/// `NaN`. Constant columns are only centered.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardScaler;

impl Scaler for StandardScaler {
    fn fit_transform(&self, mut features: Array2<f64>) -> Array2<f64> {
        for mut column in features.axis_iter_mut(Axis(1)) {
            let present: Vec<f64> = column.iter().copied().filter(|v| !v.is_nan()).collect();
            if present.is_empty() {
                continue;
            }
            let n = present.len() as f64;
            let mean = present.iter().sum::<f64>() / n;
            let var = present.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            let std = if var > 0.0 { var.sqrt() } else { 1.0 };
            column.mapv_inplace(|v| (v - mean) / std);
        }
        features
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn frame() -> Frame {
        Frame::builder()
            .text("articleID", [Some("b"), Some("a"), Some("b"), None])
            .numeric("price", array![1.0, 2.0, 3.0, 4.0])
            .numeric("returnQuantity", array![0.0, 2.0, 1.0, f64::NAN])
            .build()
            .unwrap()
    }

    fn options(binary_target: bool) -> TransformOptions<'static> {
        TransformOptions {
            binary_target,
            scaler: None,
            ignore_features: None,
        }
    }

    #[test]
    fn encodes_text_and_binarizes_target() {
        let (x, y) = ColumnTransformer::new("returnQuantity")
            .transform(&frame(), &options(true))
            .unwrap();
        assert_eq!(x.shape(), &[4, 2]);
        assert_eq!(x.column(0).slice(ndarray::s![..3]).to_vec(), vec![0.0, 1.0, 0.0]);
        assert!(x[[3, 0]].is_nan());
        assert_eq!(y.slice(ndarray::s![..3]).to_vec(), vec![0.0, 1.0, 1.0]);
        assert!(y[3].is_nan());
    }

    #[test]
    fn raw_target_when_not_binary() {
        let (_, y) = ColumnTransformer::new("returnQuantity")
            .transform(&frame(), &options(false))
            .unwrap();
        assert_eq!(y[1], 2.0);
    }

    #[test]
    fn ignores_features() {
        let ignore = vec!["articleID".to_string()];
        let opts = TransformOptions {
            ignore_features: Some(&ignore),
            ..options(true)
        };
        let (x, _) = ColumnTransformer::new("returnQuantity").transform(&frame(), &opts).unwrap();
        assert_eq!(x.column(0).to_vec(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn missing_label_gives_nan_targets() {
        let data = frame().drop_columns(&["returnQuantity"]);
        let (_, y) = ColumnTransformer::new("returnQuantity")
            .transform(&data, &options(true))
            .unwrap();
        assert!(y.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn standard_scaler_normalizes_columns() {
        let scaled = StandardScaler.fit_transform(array![[1.0, 5.0], [3.0, 5.0], [f64::NAN, 5.0]]);
        assert_abs_diff_eq!(scaled[[0, 0]], -1.0);
        assert_abs_diff_eq!(scaled[[1, 0]], 1.0);
        assert!(scaled[[2, 0]].is_nan());
        assert_abs_diff_eq!(scaled[[0, 1]], 0.0);
    }
}

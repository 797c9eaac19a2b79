//! Per-partition training and prediction.

use ndarray::{Array1, ArrayView2, Axis};

use crate::error::EnsembleError;
use crate::key::PartitionKey;
use crate::model::ClassifierError;
use crate::transform::{TargetFrame, TransformedPartition};

/// A partition with predictions for its test rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedPartition {
    pub key: PartitionKey,
    pub name: String,
    /// Name of the factory that trained this partition's classifier.
    pub classifier: String,
    pub target: TargetFrame,
}

impl ClassifiedPartition {
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.target.n_rows()
    }
}

/// Train the partition's classifier and predict its test rows.
///
/// Confidence is the maximum class probability per row. It is `NaN` when the
/// factory has no probability support, or when probability estimation fails
/// or returns the wrong number of rows; neither case stops the pipeline.
///
/// # Errors
///
/// - [`EnsembleError::Classifier`] if training or prediction fails
/// - [`EnsembleError::PredictionLengthMismatch`] if the prediction count
///   differs from the number of test rows
pub fn classify_partition(partition: TransformedPartition) -> Result<ClassifiedPartition, EnsembleError> {
    let TransformedPartition {
        key,
        name,
        config,
        train,
        test,
        target,
    } = partition;
    let factory = config.classifier.as_ref();
    let classifier_name = factory.name().to_string();
    let classifier_error = |source: ClassifierError| EnsembleError::Classifier {
        key: key.clone(),
        classifier: classifier_name.clone(),
        source,
    };

    let model = factory
        .fit(train.features.view(), train.targets.view())
        .map_err(classifier_error)?;
    let prediction = model.predict(test.features.view()).map_err(classifier_error)?;
    if prediction.len() != test.n_samples() {
        return Err(EnsembleError::PredictionLengthMismatch {
            key,
            expected: test.n_samples(),
            got: prediction.len(),
        });
    }

    let n = test.n_samples();
    let confidence = if !factory.supports_probabilities() {
        tracing::info!(
            key = %key,
            classifier = %classifier_name,
            "classifier has no probability estimates, confidence left empty"
        );
        Array1::from_elem(n, f64::NAN)
    } else {
        match model.predict_proba(test.features.view()) {
            Ok(proba) if proba.nrows() == n => row_max(proba.view()),
            Ok(proba) => {
                tracing::warn!(
                    key = %key,
                    classifier = %classifier_name,
                    rows = proba.nrows(),
                    expected = n,
                    "probability estimates have the wrong shape, confidence left empty"
                );
                Array1::from_elem(n, f64::NAN)
            }
            Err(err) => {
                tracing::warn!(
                    key = %key,
                    classifier = %classifier_name,
                    error = %err,
                    "probability estimation failed, confidence left empty"
                );
                Array1::from_elem(n, f64::NAN)
            }
        }
    };

    tracing::debug!(key = %key, classifier = %classifier_name, rows = n, "classified partition");

    Ok(ClassifiedPartition {
        key,
        name,
        classifier: classifier_name,
        target: target.with_outputs(prediction, confidence),
    })
}

/// Maximum of each row. `NaN` for rows with no finite entry.
fn row_max(proba: ArrayView2<'_, f64>) -> Array1<f64> {
    proba.map_axis(Axis(1), |row| {
        row.iter()
            .copied()
            .filter(|p| !p.is_nan())
            .fold(f64::NAN, f64::max)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CellConfig;
    use crate::model::{Classifier, ClassifierFactory};
    use crate::testing::MajorityFactory;
    use crate::transform::FeatureSet;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2, ArrayView1};
    use std::sync::Arc;

    fn transformed(factory: Arc<dyn ClassifierFactory>) -> TransformedPartition {
        TransformedPartition {
            key: "ku".parse().unwrap(),
            name: "karticleIDucustomerID".into(),
            config: CellConfig::builder().classifier(factory).build(),
            train: FeatureSet {
                features: array![[1.0], [2.0], [3.0], [4.0]],
                targets: array![1.0, 1.0, 1.0, 0.0],
            },
            test: FeatureSet {
                features: array![[5.0], [6.0]],
                targets: array![1.0, 0.0],
            },
            target: TargetFrame::new(vec![10, 11], array![1.0, 0.0]),
        }
    }

    #[test]
    fn fills_prediction_and_confidence() {
        let out = classify_partition(transformed(Arc::new(MajorityFactory))).unwrap();
        assert_eq!(out.classifier, "majority");
        assert_eq!(out.target.prediction().to_vec(), vec![1.0, 1.0]);
        assert_abs_diff_eq!(out.target.confidence()[0], 0.75);
        assert_eq!(out.target.label().to_vec(), vec![1.0, 0.0]);
        assert_eq!(out.target.index(), &[10, 11]);
    }

    struct Constant {
        value: f64,
        proba: Option<Result<Array2<f64>, ClassifierError>>,
        len: Option<usize>,
    }

    impl Classifier for Constant {
        fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Array1<f64>, ClassifierError> {
            Ok(Array1::from_elem(self.len.unwrap_or(features.nrows()), self.value))
        }

        fn predict_proba(&self, _features: ArrayView2<'_, f64>) -> Result<Array2<f64>, ClassifierError> {
            self.proba.clone().unwrap_or(Err(ClassifierError::Unsupported))
        }
    }

    struct ConstantFactory {
        proba: Option<Result<Array2<f64>, ClassifierError>>,
        len: Option<usize>,
    }

    impl ClassifierFactory for ConstantFactory {
        fn name(&self) -> &str {
            "constant"
        }

        fn fit(
            &self,
            _features: ArrayView2<'_, f64>,
            _targets: ArrayView1<'_, f64>,
        ) -> Result<Box<dyn Classifier>, ClassifierError> {
            Ok(Box::new(Constant {
                value: 0.0,
                proba: self.proba.clone(),
                len: self.len,
            }))
        }

        fn supports_probabilities(&self) -> bool {
            self.proba.is_some()
        }
    }

    #[test]
    fn no_probability_support_leaves_confidence_empty() {
        let factory = ConstantFactory { proba: None, len: None };
        let out = classify_partition(transformed(Arc::new(factory))).unwrap();
        assert_eq!(out.target.prediction().to_vec(), vec![0.0, 0.0]);
        assert!(out.target.confidence().iter().all(|c| c.is_nan()));
    }

    #[test]
    fn failing_probabilities_are_recovered() {
        let factory = ConstantFactory {
            proba: Some(Err(ClassifierError::Predict("singular".into()))),
            len: None,
        };
        let out = classify_partition(transformed(Arc::new(factory))).unwrap();
        assert!(out.target.confidence().iter().all(|c| c.is_nan()));
    }

    #[test]
    fn misshapen_probabilities_are_recovered() {
        let factory = ConstantFactory {
            proba: Some(Ok(array![[0.2, 0.8]])),
            len: None,
        };
        let out = classify_partition(transformed(Arc::new(factory))).unwrap();
        assert!(out.target.confidence().iter().all(|c| c.is_nan()));
    }

    #[test]
    fn confidence_is_row_max() {
        let factory = ConstantFactory {
            proba: Some(Ok(array![[0.3, 0.7], [0.9, 0.1]])),
            len: None,
        };
        let out = classify_partition(transformed(Arc::new(factory))).unwrap();
        assert_eq!(out.target.confidence().to_vec(), vec![0.7, 0.9]);
    }

    #[test]
    fn short_prediction_is_an_error() {
        let factory = ConstantFactory { proba: None, len: Some(1) };
        let err = classify_partition(transformed(Arc::new(factory))).unwrap_err();
        assert!(matches!(
            err,
            EnsembleError::PredictionLengthMismatch { expected: 2, got: 1, .. }
        ));
    }
}

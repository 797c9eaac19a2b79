//! Classifier seams.
//!
//! The pipeline does not ship models of its own. Each partition is handed to
//! a [`ClassifierFactory`], which trains a [`Classifier`] on the partition's
//! transformed training features and targets.
//!
//! # Probability support
//!
//! Confidence scores are only requested from factories that report
//! [`ClassifierFactory::supports_probabilities`]. The answer is a property of
//! the model type and is asked once per partition before prediction.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

/// Errors raised by classifiers.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClassifierError {
    #[error("probability estimation is not supported")]
    Unsupported,

    #[error("training failed: {0}")]
    Fit(String),

    #[error("prediction failed: {0}")]
    Predict(String),
}

/// A trained model.
pub trait Classifier: Send + Sync {
    /// Predict a class for every row of `features` (`[n_samples, n_features]`).
    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Array1<f64>, ClassifierError>;

    /// Class probabilities, `[n_samples, n_classes]`.
    ///
    /// Only called when the producing factory reports probability support.
    fn predict_proba(&self, _features: ArrayView2<'_, f64>) -> Result<Array2<f64>, ClassifierError> {
        Err(ClassifierError::Unsupported)
    }
}

/// Trains classifiers. One factory is configured per partition key.
pub trait ClassifierFactory: Send + Sync {
    /// Short name for logs and reports.
    fn name(&self) -> &str;

    /// Train on `features` (`[n_samples, n_features]`) and `targets`.
    fn fit(
        &self,
        features: ArrayView2<'_, f64>,
        targets: ArrayView1<'_, f64>,
    ) -> Result<Box<dyn Classifier>, ClassifierError>;

    /// Whether classifiers produced by this factory implement
    /// [`Classifier::predict_proba`].
    fn supports_probabilities(&self) -> bool {
        false
    }
}

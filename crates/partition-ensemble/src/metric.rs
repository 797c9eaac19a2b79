//! Evaluation metric seam.
//!
//! The reporter scores every labeled partition with one [`Metric`]. Metrics
//! are plain functions of ground truth and predictions; wrap a closure with
//! [`CustomMetric`] to supply one inline.

use std::fmt;

use ndarray::ArrayView1;

/// Scores predictions against ground truth. Higher is better.
pub trait Metric: Send + Sync {
    /// `truth` and `predictions` have equal length.
    fn compute(&self, truth: ArrayView1<'_, f64>, predictions: ArrayView1<'_, f64>) -> f64;

    /// Name used in logs and reports.
    fn name(&self) -> &str {
        "precision"
    }
}

/// Type alias for the custom metric compute function.
pub type CustomMetricFn =
    Box<dyn Fn(ArrayView1<'_, f64>, ArrayView1<'_, f64>) -> f64 + Send + Sync + 'static>;

/// A user-provided metric.
///
/// # Example
///
/// ```
/// use partition_ensemble::metric::{CustomMetric, Metric};
/// use ndarray::array;
///
/// let hits = CustomMetric::new("hits", |truth, pred| {
///     truth.iter().zip(pred.iter()).filter(|(t, p)| t == p).count() as f64
/// });
/// assert_eq!(hits.compute(array![1.0, 0.0].view(), array![1.0, 1.0].view()), 1.0);
/// ```
pub struct CustomMetric {
    name: &'static str,
    compute_fn: CustomMetricFn,
}

impl CustomMetric {
    pub fn new(
        name: &'static str,
        compute_fn: impl Fn(ArrayView1<'_, f64>, ArrayView1<'_, f64>) -> f64 + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            compute_fn: Box::new(compute_fn),
        }
    }
}

impl Metric for CustomMetric {
    fn compute(&self, truth: ArrayView1<'_, f64>, predictions: ArrayView1<'_, f64>) -> f64 {
        (self.compute_fn)(truth, predictions)
    }

    fn name(&self) -> &str {
        self.name
    }
}

impl fmt::Debug for CustomMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomMetric").field("name", &self.name).finish()
    }
}

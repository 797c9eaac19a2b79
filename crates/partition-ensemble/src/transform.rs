//! Per-partition feature transformation.
//!
//! Each partition's (optionally subsampled) training rows and its test rows
//! are concatenated and transformed by a single [`FeatureTransformer`] call,
//! so both sides share the same fitted parameters (e.g. scaling). The result
//! is split back by position, which requires the transformer to keep every
//! row in order. `transform_partition` checks the row count and fails instead
//! of silently misaligning predictions.

use ndarray::{s, Array1, Array2, ArrayView1};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::config::CellConfig;
use crate::error::EnsembleError;
use crate::frame::{Frame, FrameError};
use crate::key::PartitionKey;
use crate::partition::{ConfiguredPartition, Partition};

// =============================================================================
// Collaborator seams
// =============================================================================

/// Transform applied to the feature matrix, fitted on the rows it is given.
pub trait Scaler: Send + Sync {
    /// `features` is `[n_samples, n_features]`.
    fn fit_transform(&self, features: Array2<f64>) -> Array2<f64>;
}

/// Options passed to every [`FeatureTransformer::transform`] call.
#[derive(Clone, Copy)]
pub struct TransformOptions<'a> {
    /// Collapse the label into a 0/1 target.
    pub binary_target: bool,
    pub scaler: Option<&'a dyn Scaler>,
    pub ignore_features: Option<&'a [String]>,
}

/// Errors raised by feature transformers.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransformError {
    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error("{0}")]
    Invalid(String),
}

/// Turns a frame into a numeric feature matrix and target vector.
///
/// Implementations must return exactly one feature row and one target value
/// per input row, in input order.
pub trait FeatureTransformer: Send + Sync {
    fn transform(
        &self,
        data: &Frame,
        options: &TransformOptions<'_>,
    ) -> Result<(Array2<f64>, Array1<f64>), TransformError>;
}

// =============================================================================
// Stage values
// =============================================================================

/// Transformed features with their targets.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSet {
    /// `[n_samples, n_features]`.
    pub features: Array2<f64>,
    pub targets: Array1<f64>,
}

impl FeatureSet {
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.targets.len()
    }
}

/// Per-row outcome of a partition's test rows, keyed by original index label.
///
/// Created with the true labels by the transformer; prediction and
/// confidence are `NaN` until the classifier fills them.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetFrame {
    index: Vec<usize>,
    label: Array1<f64>,
    prediction: Array1<f64>,
    confidence: Array1<f64>,
}

impl TargetFrame {
    pub fn new(index: Vec<usize>, label: Array1<f64>) -> Self {
        debug_assert_eq!(index.len(), label.len(), "one label per index entry");
        let n = index.len();
        Self {
            index,
            label,
            prediction: Array1::from_elem(n, f64::NAN),
            confidence: Array1::from_elem(n, f64::NAN),
        }
    }

    /// Attach predictions and confidences.
    pub fn with_outputs(mut self, prediction: Array1<f64>, confidence: Array1<f64>) -> Self {
        debug_assert_eq!(prediction.len(), self.n_rows());
        debug_assert_eq!(confidence.len(), self.n_rows());
        self.prediction = prediction;
        self.confidence = confidence;
        self
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.index.len()
    }

    pub fn index(&self) -> &[usize] {
        &self.index
    }

    /// True labels. `NaN` where unlabeled.
    pub fn label(&self) -> ArrayView1<'_, f64> {
        self.label.view()
    }

    pub fn prediction(&self) -> ArrayView1<'_, f64> {
        self.prediction.view()
    }

    /// Maximum class probability. `NaN` where unavailable.
    pub fn confidence(&self) -> ArrayView1<'_, f64> {
        self.confidence.view()
    }

    /// Whether any row lacks a true label.
    pub fn has_missing_labels(&self) -> bool {
        self.label.iter().any(|v| v.is_nan())
    }
}

/// A partition after feature transformation.
#[derive(Debug, Clone)]
pub struct TransformedPartition {
    pub key: PartitionKey,
    pub name: String,
    pub config: CellConfig,
    pub train: FeatureSet,
    pub test: FeatureSet,
    pub target: TargetFrame,
}

// =============================================================================
// Sampling
// =============================================================================

/// Keep `min(size, n_rows)` training rows drawn from a uniform random
/// permutation. Not stratified.
pub fn subsample<R: Rng + ?Sized>(train: &Frame, size: usize, rng: &mut R) -> Frame {
    let mut order: Vec<usize> = (0..train.n_rows()).collect();
    order.shuffle(rng);
    order.truncate(size.min(order.len()));
    train.take_rows(&order)
}

/// Deterministic per-partition generator. Independent of the order in which
/// partitions are scheduled.
pub fn partition_rng(seed: u64, key: &PartitionKey) -> Xoshiro256PlusPlus {
    Xoshiro256PlusPlus::seed_from_u64(seed ^ key.bits().wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

// =============================================================================
// Stage
// =============================================================================

/// Subsample, concatenate, transform once, and split one partition.
///
/// # Errors
///
/// - [`EnsembleError::Frame`] if train and test columns differ
/// - [`EnsembleError::Transform`] if the transformer fails
/// - [`EnsembleError::RowCountMismatch`] if the transformer drops or adds rows
pub fn transform_partition<R: Rng + ?Sized>(
    partition: ConfiguredPartition,
    transformer: &dyn FeatureTransformer,
    rng: &mut R,
) -> Result<TransformedPartition, EnsembleError> {
    let ConfiguredPartition { partition, config } = partition;
    let Partition {
        key, name, train, test, ..
    } = partition;

    let train = match config.sample {
        Some(size) => subsample(&train, size, rng),
        None => train,
    };
    let offset = train.n_rows();
    let expected = offset + test.n_rows();

    let data = Frame::concat(&[&train, &test])?;
    let options = TransformOptions {
        binary_target: true,
        scaler: config.scaler.as_deref(),
        ignore_features: config.ignore_features.as_deref(),
    };
    let (features, targets) = transformer
        .transform(&data, &options)
        .map_err(|source| EnsembleError::Transform {
            key: key.clone(),
            source,
        })?;

    if features.nrows() != expected || targets.len() != expected {
        return Err(EnsembleError::RowCountMismatch {
            key,
            expected,
            features: features.nrows(),
            targets: targets.len(),
        });
    }

    let train_set = FeatureSet {
        features: features.slice(s![..offset, ..]).to_owned(),
        targets: targets.slice(s![..offset]).to_owned(),
    };
    let test_set = FeatureSet {
        features: features.slice(s![offset.., ..]).to_owned(),
        targets: targets.slice(s![offset..]).to_owned(),
    };
    let target = TargetFrame::new(test.index().to_vec(), test_set.targets.clone());

    tracing::debug!(
        key = %key,
        train_rows = train_set.n_samples(),
        test_rows = test_set.n_samples(),
        n_features = train_set.features.ncols(),
        "transformed partition"
    );

    Ok(TransformedPartition {
        key,
        name,
        config,
        train: train_set,
        test: test_set,
        target,
    })
}

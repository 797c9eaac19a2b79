//! Pipeline-level errors.

use crate::config::ConfigError;
use crate::frame::FrameError;
use crate::io::FrameLoadError;
use crate::key::PartitionKey;
use crate::model::ClassifierError;
use crate::report::ExportError;
use crate::transform::TransformError;

/// Errors raised while running the ensemble.
#[derive(Debug, thiserror::Error)]
pub enum EnsembleError {
    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Load(#[from] FrameLoadError),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("no configuration for partition {key}")]
    UnconfiguredPartition { key: PartitionKey },

    #[error("partition {key}: feature transformation failed: {source}")]
    Transform {
        key: PartitionKey,
        #[source]
        source: TransformError,
    },

    #[error(
        "partition {key}: transformer returned {features} feature rows and {targets} targets, expected {expected}"
    )]
    RowCountMismatch {
        key: PartitionKey,
        expected: usize,
        features: usize,
        targets: usize,
    },

    #[error("partition {key}: classifier {classifier}: {source}")]
    Classifier {
        key: PartitionKey,
        classifier: String,
        #[source]
        source: ClassifierError,
    },

    #[error("partition {key}: classifier returned {got} predictions, expected {expected}")]
    PredictionLengthMismatch {
        key: PartitionKey,
        expected: usize,
        got: usize,
    },

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("failed to build thread pool: {0}")]
    ThreadPool(String),
}

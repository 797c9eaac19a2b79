//! partition-ensemble: known/unknown partitioned classifier ensembles.
//!
//! Test rows of a tabular classification problem may reference categorical
//! identifiers that never occurred in training. This crate partitions the
//! test set by which tracked identifiers are known, trains one separately
//! configured classifier per partition, and combines per-partition scores
//! into one size-weighted overall score.
//!
//! # Key Types
//!
//! - [`Frame`] - Named-column table with index labels
//! - [`PartitionKey`] - Known/unknown pattern, displayed as `k`/`u`
//! - [`EnsembleConfig`] / [`CellConfig`] - Exhaustive per-key configuration
//! - [`EnsembleParams`] - Tracked columns, label, seed, threads
//! - [`Ensemble`] - The pipeline, stage by stage
//! - [`Report`] - Per-partition and overall scores
//!
//! # Collaborators
//!
//! Models, feature transformation, and the metric are supplied through
//! [`ClassifierFactory`], [`FeatureTransformer`], [`Scaler`], and [`Metric`].
//! The [`testing`] module has small reference implementations.

pub mod classify;
pub mod config;
pub mod ensemble;
pub mod error;
pub mod frame;
pub mod io;
pub mod key;
pub mod knownness;
pub mod metric;
pub mod model;
pub mod partition;
pub mod report;
pub mod testing;
pub mod transform;
pub mod utils;

// =============================================================================
// Convenience Re-exports
// =============================================================================

// Pipeline
pub use ensemble::{ClassifiedEnsemble, Ensemble, TransformedEnsemble};
pub use error::EnsembleError;

// Configuration
pub use config::{CellConfig, ConfigError, EnsembleConfig, EnsembleParams};
pub use key::PartitionKey;

// Data
pub use frame::{Column, Frame, FrameError};
pub use io::{read_frame, FrameLoadError};

// Collaborator seams
pub use metric::{CustomMetric, Metric};
pub use model::{Classifier, ClassifierError, ClassifierFactory};
pub use transform::{FeatureTransformer, Scaler, TransformError, TransformOptions};

// Results
pub use report::{ExportOptions, Report};

// Shared utilities
pub use utils::{run_with_threads, Parallelism};

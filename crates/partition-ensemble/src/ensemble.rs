//! The partitioned ensemble pipeline.
//!
//! Stages run in order, each consuming the previous stage's value:
//!
//! 1. [`Ensemble::new`]: knownness detection, partitioning, configuration
//! 2. [`Ensemble::transform`]: per-partition subsampling and features
//! 3. [`TransformedEnsemble::classify`]: per-partition training and prediction
//! 4. [`ClassifiedEnsemble::report`] / [`ClassifiedEnsemble::dump_results`]
//!
//! Stages 2 and 3 fan out over partitions according to
//! [`EnsembleParams::n_threads`]. Every partition is processed by exactly one
//! worker and results are collected in key order before the next stage.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use ndarray::array;
//! use partition_ensemble::config::{CellConfig, EnsembleConfig, EnsembleParams};
//! use partition_ensemble::frame::Frame;
//! use partition_ensemble::testing::{ColumnTransformer, MajorityFactory, MatchRate};
//! use partition_ensemble::Ensemble;
//!
//! let train = Frame::builder()
//!     .text("articleID", [Some("a"), Some("b"), Some("a")])
//!     .numeric("returnQuantity", array![1.0, 0.0, 1.0])
//!     .build()
//!     .unwrap();
//! let test = Frame::builder()
//!     .text("articleID", [Some("a"), Some("z")])
//!     .numeric("returnQuantity", array![1.0, 0.0])
//!     .build()
//!     .unwrap();
//!
//! let params = EnsembleParams::builder()
//!     .tracked_columns(vec!["articleID".into()])
//!     .build()
//!     .unwrap();
//! let cell = CellConfig::builder().classifier(Arc::new(MajorityFactory)).build();
//! let config = EnsembleConfig::uniform(1, cell).unwrap();
//!
//! let classified = Ensemble::new(&train, &test, &config, params)
//!     .unwrap()
//!     .transform(&ColumnTransformer::new("returnQuantity"))
//!     .unwrap()
//!     .classify()
//!     .unwrap();
//! let report = classified.report(&MatchRate);
//! assert_eq!(report.partitions.len(), 2);
//! assert_eq!(report.overall, Some(0.5));
//! ```

use std::path::Path;

use crate::classify::{classify_partition, ClassifiedPartition};
use crate::config::{ConfigError, EnsembleConfig, EnsembleParams};
use crate::error::EnsembleError;
use crate::frame::Frame;
use crate::io::read_frame;
use crate::key::PartitionKey;
use crate::metric::Metric;
use crate::partition::{configure, ConfiguredPartition, Partitioner};
use crate::report::{self, ExportOptions, Report};
use crate::transform::{partition_rng, transform_partition, FeatureTransformer, TransformedPartition};
use crate::utils::run_with_threads;

/// A partitioned and configured test set.
#[derive(Debug, Clone)]
pub struct Ensemble {
    params: EnsembleParams,
    test: Frame,
    partitions: Vec<ConfiguredPartition>,
}

impl Ensemble {
    /// Partition `test` by knownness against `train` and attach each
    /// partition's cell from `config`.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::WidthMismatch`] if `config` keys and the tracked
    ///   columns differ in width
    /// - [`EnsembleError::Frame`] for absent or mistyped tracked columns
    /// - [`EnsembleError::UnconfiguredPartition`] for a key without a cell
    pub fn new(
        train: &Frame,
        test: &Frame,
        config: &EnsembleConfig,
        params: EnsembleParams,
    ) -> Result<Self, EnsembleError> {
        if config.width() != params.width() {
            return Err(ConfigError::WidthMismatch {
                config: config.width(),
                tracked: params.width(),
            }
            .into());
        }

        let partitions = Partitioner::from_params(&params).split(train, test)?;
        tracing::info!(
            partitions = partitions.len(),
            train_rows = train.n_rows(),
            test_rows = test.n_rows(),
            "partitioned test set"
        );
        let partitions = configure(partitions, config)?;

        Ok(Self {
            params,
            test: test.clone(),
            partitions,
        })
    }

    /// Read train and test frames from delimited files, then call
    /// [`Ensemble::new`].
    pub fn from_files(
        train_path: impl AsRef<Path>,
        test_path: impl AsRef<Path>,
        delimiter: u8,
        config: &EnsembleConfig,
        params: EnsembleParams,
    ) -> Result<Self, EnsembleError> {
        let train = read_frame(train_path, delimiter)?;
        let test = read_frame(test_path, delimiter)?;
        Self::new(&train, &test, config, params)
    }

    pub fn params(&self) -> &EnsembleParams {
        &self.params
    }

    pub fn test(&self) -> &Frame {
        &self.test
    }

    /// Partitions in key order.
    pub fn partitions(&self) -> &[ConfiguredPartition] {
        &self.partitions
    }

    pub fn keys(&self) -> impl Iterator<Item = &PartitionKey> {
        self.partitions.iter().map(|p| &p.partition.key)
    }

    /// Transform every partition.
    ///
    /// Subsampling draws from a generator derived from
    /// [`EnsembleParams::seed`] and the partition key, so the result does
    /// not depend on scheduling.
    pub fn transform(self, transformer: &dyn FeatureTransformer) -> Result<TransformedEnsemble, EnsembleError> {
        let Self {
            params,
            test,
            partitions,
        } = self;
        let seed = params.seed;

        let partitions = run_with_threads(params.n_threads, |parallelism| {
            parallelism.maybe_par_try_map(partitions, |partition| {
                let mut rng = partition_rng(seed, &partition.partition.key);
                transform_partition(partition, transformer, &mut rng)
            })
        })
        .map_err(EnsembleError::ThreadPool)??;

        Ok(TransformedEnsemble {
            params,
            test,
            partitions,
        })
    }

    /// Run every stage and score the result.
    pub fn run(
        self,
        transformer: &dyn FeatureTransformer,
        metric: &dyn Metric,
    ) -> Result<(ClassifiedEnsemble, Report), EnsembleError> {
        let classified = self.transform(transformer)?.classify()?;
        let report = classified.report(metric);
        Ok((classified, report))
    }
}

/// Partitions with transformed features.
#[derive(Debug, Clone)]
pub struct TransformedEnsemble {
    params: EnsembleParams,
    test: Frame,
    partitions: Vec<TransformedPartition>,
}

impl TransformedEnsemble {
    pub fn partitions(&self) -> &[TransformedPartition] {
        &self.partitions
    }

    /// Train and predict every partition.
    pub fn classify(self) -> Result<ClassifiedEnsemble, EnsembleError> {
        let Self {
            params,
            test,
            partitions,
        } = self;

        let partitions = run_with_threads(params.n_threads, |parallelism| {
            parallelism.maybe_par_try_map(partitions, classify_partition)
        })
        .map_err(EnsembleError::ThreadPool)??;

        Ok(ClassifiedEnsemble {
            params,
            test,
            partitions,
        })
    }
}

/// Partitions with predictions.
#[derive(Debug, Clone)]
pub struct ClassifiedEnsemble {
    params: EnsembleParams,
    test: Frame,
    partitions: Vec<ClassifiedPartition>,
}

impl ClassifiedEnsemble {
    pub fn params(&self) -> &EnsembleParams {
        &self.params
    }

    pub fn test(&self) -> &Frame {
        &self.test
    }

    /// Partitions in key order.
    pub fn partitions(&self) -> &[ClassifiedPartition] {
        &self.partitions
    }

    pub fn partition(&self, key: &PartitionKey) -> Option<&ClassifiedPartition> {
        self.partitions.iter().find(|p| &p.key == key)
    }

    /// Score every labeled partition and weight by share of the test set.
    pub fn report(&self, metric: &dyn Metric) -> Report {
        report::report(&self.partitions, self.test.n_rows(), metric)
    }

    /// [`ClassifiedEnsemble::report`], printed to stdout.
    pub fn print_report(&self, metric: &dyn Metric) -> Report {
        let report = self.report(metric);
        println!("{}", report);
        report
    }

    /// Write predictions aligned to the test frame.
    pub fn dump_results(&self, path: impl AsRef<Path>, options: &ExportOptions) -> Result<(), EnsembleError> {
        report::dump_results(&self.test, &self.partitions, path, options)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CellConfig;
    use crate::testing::{retail_frames, ColumnTransformer, MajorityFactory, MatchRate};
    use rstest::rstest;
    use std::sync::Arc;

    fn uniform(width: usize) -> EnsembleConfig {
        let cell = CellConfig::builder()
            .classifier(Arc::new(MajorityFactory))
            .sample(50)
            .build();
        EnsembleConfig::uniform(width, cell).unwrap()
    }

    #[test]
    fn width_must_match_tracked_columns() {
        let (train, test) = retail_frames(40, 20, 1).unwrap();
        let err = Ensemble::new(&train, &test, &uniform(2), EnsembleParams::default()).unwrap_err();
        assert!(matches!(
            err,
            EnsembleError::Config(ConfigError::WidthMismatch { config: 2, tracked: 4 })
        ));
    }

    #[test]
    fn partitions_cover_test_rows() {
        let (train, test) = retail_frames(60, 30, 3).unwrap();
        let ensemble = Ensemble::new(&train, &test, &uniform(4), EnsembleParams::default()).unwrap();
        let total: usize = ensemble.partitions().iter().map(|p| p.partition.n_rows()).sum();
        assert_eq!(total, test.n_rows());

        let keys: Vec<_> = ensemble.keys().cloned().collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(0)]
    fn thread_count_does_not_change_results(#[case] n_threads: usize) {
        let (train, test) = retail_frames(80, 40, 5).unwrap();
        let transformer = ColumnTransformer::new("returnQuantity");

        let run = |n_threads| {
            let params = EnsembleParams::builder().n_threads(n_threads).build().unwrap();
            Ensemble::new(&train, &test, &uniform(4), params)
                .unwrap()
                .run(&transformer, &MatchRate)
                .unwrap()
        };
        let (sequential, seq_report) = run(1);
        let (other, other_report) = run(n_threads);

        assert_eq!(sequential.partitions(), other.partitions());
        assert_eq!(seq_report, other_report);
    }
}

//! Partitioning of the test set by known/unknown pattern.
//!
//! Every test row is assigned to exactly one [`Partition`], determined by the
//! knownness of its tracked identifiers. Within a partition, columns that
//! cannot be modeled are pruned from both sides:
//!
//! - tracked columns marked unknown for the partition,
//! - any other column with a missing value among the partition's test rows.
//!
//! The label column is never pruned. Pruning is per partition, so two
//! partitions may keep different feature sets.

use std::collections::BTreeMap;

use ndarray::Array1;

use crate::config::{CellConfig, EnsembleConfig, EnsembleParams};
use crate::error::EnsembleError;
use crate::frame::{Column, Frame, FrameError};
use crate::key::PartitionKey;
use crate::knownness::known_mask;

/// Identifier columns tracked by default, in key order.
pub const DEFAULT_TRACKED_COLUMNS: [&str; 4] =
    ["articleID", "customerID", "voucherID", "productGroup"];

/// Default label column.
pub const DEFAULT_LABEL_COLUMN: &str = "returnQuantity";

/// Test rows sharing one knownness pattern, with pruned train and test frames.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub key: PartitionKey,
    /// Specifier such as `karticleIDucustomerID`, for logs and reports.
    pub name: String,
    pub train: Frame,
    pub test: Frame,
    /// Columns pruned from both frames, unknown tracked columns first.
    pub dropped: Vec<String>,
}

impl Partition {
    /// Number of test rows.
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.test.n_rows()
    }
}

/// Partitions keyed by pattern, in key order.
pub type Partitions = BTreeMap<PartitionKey, Partition>;

/// Splits a test set into partitions.
#[derive(Debug, Clone)]
pub struct Partitioner {
    tracked_columns: Vec<String>,
    label_column: String,
}

impl Partitioner {
    pub fn new(
        tracked_columns: impl IntoIterator<Item = impl Into<String>>,
        label_column: impl Into<String>,
    ) -> Self {
        Self {
            tracked_columns: tracked_columns.into_iter().map(Into::into).collect(),
            label_column: label_column.into(),
        }
    }

    pub fn from_params(params: &EnsembleParams) -> Self {
        Self::new(params.tracked_columns.iter().cloned(), params.label_column.clone())
    }

    pub fn tracked_columns(&self) -> &[String] {
        &self.tracked_columns
    }

    pub fn label_column(&self) -> &str {
        &self.label_column
    }

    /// Group test rows by known/unknown pattern.
    ///
    /// Only observed patterns produce partitions. A test frame without the
    /// label column is treated as unlabeled: an all-`NaN` label column is
    /// added to every partition's test rows.
    ///
    /// # Errors
    ///
    /// Propagates [`FrameError`] for tracked columns that are absent or whose
    /// kinds differ between train and test.
    pub fn split(&self, train: &Frame, test: &Frame) -> Result<Partitions, FrameError> {
        let mask = known_mask(train, test, &self.tracked_columns)?;

        let mut groups: BTreeMap<PartitionKey, Vec<usize>> = BTreeMap::new();
        for row in 0..mask.n_rows() {
            groups.entry(mask.pattern(row)).or_default().push(row);
        }

        let mut partitions = Partitions::new();
        for (key, rows) in groups {
            let mut test_rows = test.take_rows(&rows);
            if !test_rows.has_column(&self.label_column) {
                let unlabeled = Column::Numeric(Array1::from_elem(rows.len(), f64::NAN));
                test_rows = test_rows.with_column(self.label_column.clone(), unlabeled)?;
            }

            let mut dropped: Vec<String> = key
                .unknown_positions()
                .map(|i| self.tracked_columns[i].clone())
                .collect();
            for (name, column) in test_rows.columns() {
                let prunable = name != self.label_column && column.has_missing();
                if prunable && !dropped.iter().any(|d| d == name) {
                    dropped.push(name.to_string());
                }
            }

            let partition = Partition {
                name: key.specifier(&self.tracked_columns),
                train: train.drop_columns(&dropped),
                test: test_rows.drop_columns(&dropped),
                key: key.clone(),
                dropped,
            };
            tracing::debug!(
                key = %partition.key,
                name = %partition.name,
                test_rows = partition.n_rows(),
                train_rows = partition.train.n_rows(),
                dropped = ?partition.dropped,
                "created partition"
            );
            partitions.insert(key, partition);
        }
        Ok(partitions)
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// A partition with its modeling parameters.
#[derive(Debug, Clone)]
pub struct ConfiguredPartition {
    pub partition: Partition,
    pub config: CellConfig,
}

/// Attach each partition's cell.
///
/// # Errors
///
/// [`EnsembleError::UnconfiguredPartition`] for a partition key without a
/// cell. There is no implicit default model.
pub fn configure(
    partitions: Partitions,
    config: &EnsembleConfig,
) -> Result<Vec<ConfiguredPartition>, EnsembleError> {
    partitions
        .into_values()
        .map(|partition| {
            let cell = config
                .get(&partition.key)
                .ok_or_else(|| EnsembleError::UnconfiguredPartition {
                    key: partition.key.clone(),
                })?;
            Ok(ConfiguredPartition {
                config: cell.clone(),
                partition,
            })
        })
        .collect()
}

//! Ensemble configuration.
//!
//! Two layers:
//!
//! - [`EnsembleConfig`]: one [`CellConfig`] per partition key. It is validated
//!   at construction to cover all `2^k` keys, so a pattern that never occurs
//!   in the current test set still has a model ready when it appears in the
//!   next one. There is no fallback cell.
//! - [`EnsembleParams`]: pipeline-wide settings (tracked columns, label,
//!   seed, threads) built with `bon` and validated at build time, or read
//!   from JSON.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use partition_ensemble::config::{CellConfig, EnsembleConfig, EnsembleParams};
//! use partition_ensemble::testing::MajorityFactory;
//!
//! let params = EnsembleParams::builder().seed(7).build().unwrap();
//! let cell = CellConfig::builder().classifier(Arc::new(MajorityFactory)).build();
//! let config = EnsembleConfig::uniform(params.tracked_columns.len(), cell).unwrap();
//! assert_eq!(config.len(), 16);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::key::{KeyParseError, PartitionKey, MAX_TRACKED_COLUMNS};
use crate::model::ClassifierFactory;
use crate::partition::{DEFAULT_LABEL_COLUMN, DEFAULT_TRACKED_COLUMNS};
use crate::transform::Scaler;

// =============================================================================
// ConfigError
// =============================================================================

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing configuration for partition keys: {}", join_keys(.0))]
    MissingKeys(Vec<PartitionKey>),

    #[error("partition key {key} has width {}, expected {expected}", .key.width())]
    KeyWidth { key: PartitionKey, expected: usize },

    #[error("partition key {0} is configured twice")]
    DuplicateKey(PartitionKey),

    #[error("invalid partition key: {0}")]
    InvalidKey(#[from] KeyParseError),

    #[error("number of tracked columns must be in 1..={max}, got {0}", max = MAX_TRACKED_COLUMNS)]
    WidthOutOfRange(usize),

    #[error("tracked column {0} is listed twice")]
    DuplicateTrackedColumn(String),

    #[error("label column {0} cannot be a tracked column")]
    LabelIsTracked(String),

    #[error("configuration has keys of width {config}, but {tracked} columns are tracked")]
    WidthMismatch { config: usize, tracked: usize },

    #[error("failed to parse parameters: {0}")]
    Parse(#[from] serde_json::Error),
}

fn join_keys(keys: &[PartitionKey]) -> String {
    keys.iter().map(|k| k.to_string()).collect::<Vec<_>>().join(", ")
}

// =============================================================================
// CellConfig
// =============================================================================

/// Modeling parameters of one partition key.
#[derive(Clone, Builder)]
pub struct CellConfig {
    /// Training rows to subsample. `None` trains on the whole partition.
    pub sample: Option<usize>,

    /// Scaler handed to the feature transformer.
    pub scaler: Option<Arc<dyn Scaler>>,

    /// Columns the feature transformer should leave out.
    pub ignore_features: Option<Vec<String>>,

    /// Trains this cell's classifier.
    pub classifier: Arc<dyn ClassifierFactory>,
}

impl fmt::Debug for CellConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellConfig")
            .field("sample", &self.sample)
            .field("scaler", &self.scaler.is_some())
            .field("ignore_features", &self.ignore_features)
            .field("classifier", &self.classifier.name())
            .finish()
    }
}

// =============================================================================
// EnsembleConfig
// =============================================================================

/// Exhaustive mapping from partition key to [`CellConfig`].
#[derive(Clone, Debug)]
pub struct EnsembleConfig {
    width: usize,
    cells: BTreeMap<PartitionKey, CellConfig>,
}

impl EnsembleConfig {
    /// Build from explicit cells.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::WidthOutOfRange`] for `width` outside `1..=16`
    /// - [`ConfigError::KeyWidth`] for a key of another width
    /// - [`ConfigError::DuplicateKey`] for a key given twice
    /// - [`ConfigError::MissingKeys`] listing every key without a cell
    pub fn new(
        width: usize,
        cells: impl IntoIterator<Item = (PartitionKey, CellConfig)>,
    ) -> Result<Self, ConfigError> {
        check_width(width)?;
        let mut map = BTreeMap::new();
        for (key, cell) in cells {
            if key.width() != width {
                return Err(ConfigError::KeyWidth { key, expected: width });
            }
            if map.contains_key(&key) {
                return Err(ConfigError::DuplicateKey(key));
            }
            map.insert(key, cell);
        }

        let missing: Vec<PartitionKey> = PartitionKey::enumerate(width)
            .filter(|k| !map.contains_key(k))
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingKeys(missing));
        }

        Ok(Self { width, cells: map })
    }

    /// Build from `k`/`u` string keys such as `"kkuk"`.
    pub fn from_named<S: AsRef<str>>(
        width: usize,
        cells: impl IntoIterator<Item = (S, CellConfig)>,
    ) -> Result<Self, ConfigError> {
        let cells = cells
            .into_iter()
            .map(|(key, cell)| Ok((key.as_ref().parse::<PartitionKey>()?, cell)))
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Self::new(width, cells)
    }

    /// Use the same cell for every key.
    pub fn uniform(width: usize, cell: CellConfig) -> Result<Self, ConfigError> {
        check_width(width)?;
        Self::new(width, PartitionKey::enumerate(width).map(|k| (k, cell.clone())))
    }

    /// Replace the cell of one key.
    pub fn with_cell(mut self, key: PartitionKey, cell: CellConfig) -> Result<Self, ConfigError> {
        if key.width() != self.width {
            return Err(ConfigError::KeyWidth {
                key,
                expected: self.width,
            });
        }
        self.cells.insert(key, cell);
        Ok(self)
    }

    /// Number of tracked columns covered.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, key: &PartitionKey) -> Option<&CellConfig> {
        self.cells.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PartitionKey, &CellConfig)> {
        self.cells.iter()
    }
}

fn check_width(width: usize) -> Result<(), ConfigError> {
    if width == 0 || width > MAX_TRACKED_COLUMNS {
        return Err(ConfigError::WidthOutOfRange(width));
    }
    Ok(())
}

// =============================================================================
// EnsembleParams
// =============================================================================

fn default_tracked_columns() -> Vec<String> {
    DEFAULT_TRACKED_COLUMNS.iter().map(|c| c.to_string()).collect()
}

fn default_label_column() -> String {
    DEFAULT_LABEL_COLUMN.to_string()
}

/// Pipeline-wide parameters.
///
/// # Example
///
/// ```
/// use partition_ensemble::config::EnsembleParams;
///
/// let params = EnsembleParams::builder()
///     .tracked_columns(vec!["articleID".into(), "customerID".into()])
///     .n_threads(0)
///     .build()
///     .unwrap();
/// assert_eq!(params.label_column, "returnQuantity");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(finish_fn(vis = "", name = __build_internal))]
#[serde(default)]
pub struct EnsembleParams {
    /// Identifier columns whose knownness defines the partitions, in key order.
    #[builder(default = default_tracked_columns())]
    pub tracked_columns: Vec<String>,

    /// True label. Exempt from missing-value pruning.
    #[builder(default = default_label_column(), into)]
    pub label_column: String,

    /// Seed for training-set subsampling. Default: 42.
    #[builder(default = 42)]
    pub seed: u64,

    /// Number of threads. `0` = all cores, `1` = sequential (default).
    #[builder(default = 1)]
    pub n_threads: usize,
}

impl Default for EnsembleParams {
    fn default() -> Self {
        Self {
            tracked_columns: default_tracked_columns(),
            label_column: default_label_column(),
            seed: 42,
            n_threads: 1,
        }
    }
}

/// Custom finishing function that validates the parameters.
impl<S: ensemble_params_builder::IsComplete> EnsembleParamsBuilder<S> {
    /// Build and validate the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the tracked columns are empty, too many,
    /// repeated, or include the label column.
    pub fn build(self) -> Result<EnsembleParams, ConfigError> {
        let params = self.__build_internal();
        params.validate()?;
        Ok(params)
    }
}

impl EnsembleParams {
    /// Parse and validate parameters from JSON. Absent fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let params: EnsembleParams = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    /// Number of tracked columns, i.e. the width of every partition key.
    pub fn width(&self) -> usize {
        self.tracked_columns.len()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        check_width(self.tracked_columns.len())?;
        for (i, column) in self.tracked_columns.iter().enumerate() {
            if self.tracked_columns[..i].contains(column) {
                return Err(ConfigError::DuplicateTrackedColumn(column.clone()));
            }
        }
        if self.tracked_columns.contains(&self.label_column) {
            return Err(ConfigError::LabelIsTracked(self.label_column.clone()));
        }
        Ok(())
    }
}

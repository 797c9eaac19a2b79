//! Detection of test values that were seen during training.

use std::collections::HashSet;

use ndarray::{Array2, ArrayView1};

use crate::frame::{CategoryKey, Column, Frame, FrameError};
use crate::key::PartitionKey;

/// Prefix of mask column names: `known_articleID`.
pub const MASK_PREFIX: &str = "known_";

/// Name of the mask column for a source column.
pub fn mask_column_name(column: &str) -> String {
    format!("{}{}", MASK_PREFIX, column)
}

/// Row-aligned membership of test values in the training values, one boolean
/// column per tracked column.
#[derive(Debug, Clone, PartialEq)]
pub struct KnownnessMask {
    columns: Vec<String>,
    /// `[n_rows, n_columns]`.
    known: Array2<bool>,
}

impl KnownnessMask {
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.known.nrows()
    }

    #[inline]
    pub fn n_columns(&self) -> usize {
        self.known.ncols()
    }

    /// Mask column names (`known_<column>`), in tracked order.
    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|c| mask_column_name(c)).collect()
    }

    /// Membership of every test row for the column at `position`.
    pub fn column(&self, position: usize) -> ArrayView1<'_, bool> {
        self.known.column(position)
    }

    /// Partition key of one test row.
    pub fn pattern(&self, row: usize) -> PartitionKey {
        PartitionKey::new(self.known.row(row).to_vec())
    }
}

/// Mark which test values occur among the training values of each column.
///
/// Missing test values (`NaN`, `None`) are never known. Both frames must carry
/// every column and agree on its kind, unless one side has no values at all:
/// such a column is compatible with either kind and marks every row unknown.
///
/// # Example
///
/// ```
/// use partition_ensemble::frame::Frame;
/// use partition_ensemble::knownness::known_mask;
///
/// let train = Frame::builder().text("articleID", [Some("A1"), Some("A2")]).build().unwrap();
/// let test = Frame::builder().text("articleID", [Some("A1"), Some("A3")]).build().unwrap();
///
/// let mask = known_mask(&train, &test, &["articleID"]).unwrap();
/// assert_eq!(mask.column(0).to_vec(), vec![true, false]);
/// ```
pub fn known_mask<S: AsRef<str>>(
    train: &Frame,
    test: &Frame,
    columns: &[S],
) -> Result<KnownnessMask, FrameError> {
    let mut known = Array2::from_elem((test.n_rows(), columns.len()), false);

    for (j, name) in columns.iter().enumerate() {
        let name = name.as_ref();
        let train_column = train.column(name)?;
        let test_column = test.column(name)?;
        if train_column.is_all_missing() || test_column.is_all_missing() {
            continue;
        }
        if train_column.kind() != test_column.kind() {
            return Err(FrameError::ColumnTypeMismatch {
                column: name.to_string(),
                expected: train_column.kind(),
                got: test_column.kind(),
            });
        }

        let seen = distinct_values(train_column);
        for (row, cell) in known.column_mut(j).iter_mut().enumerate() {
            *cell = test_column.key(row).is_some_and(|k| seen.contains(&k));
        }
    }

    Ok(KnownnessMask {
        columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
        known,
    })
}

fn distinct_values(column: &Column) -> HashSet<CategoryKey> {
    (0..column.len()).filter_map(|row| column.key(row)).collect()
}

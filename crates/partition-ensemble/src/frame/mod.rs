//! Named-column tables.
//!
//! A [`Frame`] is the unit of data that flows into the partitioner: an ordered
//! set of named [`Column`]s plus one index label per row. Index labels survive
//! row selection and concatenation, which is how predictions computed per
//! partition find their way back to the original test rows.
//!
//! # Missing Values
//!
//! Numeric columns use `f64::NAN`; text columns use `None`.

mod column;
mod error;

pub use column::{CategoryKey, Column, ColumnKind};
pub use error::FrameError;

use std::collections::HashSet;

use ndarray::Array1;

/// Table of named, equally long columns with per-row index labels.
///
/// # Example
///
/// ```
/// use partition_ensemble::frame::Frame;
///
/// let frame = Frame::builder()
///     .text("articleID", [Some("A1"), Some("A2")])
///     .numeric("price", vec![9.5, 12.0])
///     .build()
///     .unwrap();
///
/// assert_eq!(frame.n_rows(), 2);
/// assert_eq!(frame.index(), &[0, 1]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    index: Vec<usize>,
    names: Vec<String>,
    columns: Vec<Column>,
}

impl Frame {
    /// Create a builder.
    pub fn builder() -> FrameBuilder {
        FrameBuilder::default()
    }

    /// Create a frame from named columns with a default `0..n` index.
    pub fn from_columns<S: Into<String>>(
        columns: impl IntoIterator<Item = (S, Column)>,
    ) -> Result<Self, FrameError> {
        let mut builder = FrameBuilder::default();
        for (name, column) in columns {
            builder = builder.column(name, column);
        }
        builder.build()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.index.len()
    }

    #[inline]
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Row index labels.
    pub fn index(&self) -> &[usize] {
        &self.index
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Result<&Column, FrameError> {
        self.position(name)
            .map(|i| &self.columns[i])
            .ok_or_else(|| FrameError::MissingColumn(name.to_string()))
    }

    /// Iterate `(name, column)` pairs in column order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.names.iter().map(String::as_str).zip(self.columns.iter())
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    // =========================================================================
    // Derived frames
    // =========================================================================

    /// Add or replace a column.
    pub fn with_column(mut self, name: impl Into<String>, column: Column) -> Result<Self, FrameError> {
        let name = name.into();
        if column.len() != self.n_rows() {
            return Err(FrameError::LengthMismatch {
                column: name,
                expected: self.n_rows(),
                got: column.len(),
            });
        }
        match self.position(&name) {
            Some(i) => self.columns[i] = column,
            None => {
                self.names.push(name);
                self.columns.push(column);
            }
        }
        Ok(self)
    }

    /// Copy of this frame without the named columns. Names that are not
    /// present are ignored.
    pub fn drop_columns<S: AsRef<str>>(&self, names: &[S]) -> Frame {
        let (names, columns): (Vec<String>, Vec<Column>) = self
            .columns()
            .filter(|(name, _)| !names.iter().any(|d| d.as_ref() == *name))
            .map(|(name, column)| (name.to_string(), column.clone()))
            .unzip();
        Frame {
            index: self.index.clone(),
            names,
            columns,
        }
    }

    /// Copy of the rows at the given positions, in the given order.
    pub fn take_rows(&self, positions: &[usize]) -> Frame {
        Frame {
            index: positions.iter().map(|&p| self.index[p]).collect(),
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c.take(positions)).collect(),
        }
    }

    /// Stack frames vertically.
    ///
    /// All frames must carry the same set of column names with matching kinds.
    /// The output uses the column order of the first frame and keeps every
    /// frame's index labels.
    pub fn concat(frames: &[&Frame]) -> Result<Frame, FrameError> {
        let Some((first, rest)) = frames.split_first() else {
            return Ok(Frame::default());
        };
        let mut out = (*first).clone();
        for frame in rest {
            if frame.n_columns() != out.n_columns() {
                return Err(FrameError::SchemaMismatch(format!(
                    "{} columns vs {}",
                    out.n_columns(),
                    frame.n_columns()
                )));
            }
            for (name, column) in out.names.iter().zip(out.columns.iter_mut()) {
                let other = frame
                    .column(name)
                    .map_err(|_| FrameError::SchemaMismatch(format!("{} is not in every frame", name)))?;
                let (expected, got) = (column.kind(), other.kind());
                if !column.extend_from(other) {
                    return Err(FrameError::ColumnTypeMismatch {
                        column: name.clone(),
                        expected,
                        got,
                    });
                }
            }
            out.index.extend_from_slice(&frame.index);
        }
        Ok(out)
    }
}

// =============================================================================
// FrameBuilder
// =============================================================================

/// Builder for [`Frame`].
///
/// Validation (duplicate names, ragged columns, index length, duplicate index
/// labels) happens in [`FrameBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct FrameBuilder {
    index: Option<Vec<usize>>,
    columns: Vec<(String, Column)>,
}

impl FrameBuilder {
    /// Add a column.
    pub fn column(mut self, name: impl Into<String>, column: Column) -> Self {
        self.columns.push((name.into(), column));
        self
    }

    /// Add a numeric column.
    pub fn numeric(self, name: impl Into<String>, values: impl Into<Array1<f64>>) -> Self {
        self.column(name, Column::numeric(values))
    }

    /// Add a text column.
    pub fn text<I, S>(self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        self.column(name, Column::text(values))
    }

    /// Set explicit row index labels. Defaults to `0..n_rows`.
    pub fn index(mut self, labels: impl IntoIterator<Item = usize>) -> Self {
        self.index = Some(labels.into_iter().collect());
        self
    }

    pub fn build(self) -> Result<Frame, FrameError> {
        let n_rows = match self.columns.first() {
            Some((_, column)) => column.len(),
            None => self.index.as_ref().map_or(0, Vec::len),
        };

        if let Some(index) = &self.index {
            if index.len() != n_rows {
                return Err(FrameError::IndexLength {
                    expected: n_rows,
                    got: index.len(),
                });
            }
            let mut seen = HashSet::with_capacity(index.len());
            if let Some(&label) = index.iter().find(|&&label| !seen.insert(label)) {
                return Err(FrameError::DuplicateIndex(label));
            }
        }

        let mut names: Vec<String> = Vec::with_capacity(self.columns.len());
        let mut columns = Vec::with_capacity(self.columns.len());
        for (name, column) in self.columns {
            if names.contains(&name) {
                return Err(FrameError::DuplicateColumn(name));
            }
            if column.len() != n_rows {
                return Err(FrameError::LengthMismatch {
                    column: name,
                    expected: n_rows,
                    got: column.len(),
                });
            }
            names.push(name);
            columns.push(column);
        }

        Ok(Frame {
            index: self.index.unwrap_or_else(|| (0..n_rows).collect()),
            names,
            columns,
        })
    }
}

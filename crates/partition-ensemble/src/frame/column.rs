//! Column storage types.

use std::fmt;

use ndarray::{Array1, ArrayView1};

/// Kind of values a column stores.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    /// `f64` values, `NaN` is missing.
    Numeric,
    /// String values, `None` is missing.
    Text,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Numeric => f.write_str("numeric"),
            ColumnKind::Text => f.write_str("text"),
        }
    }
}

/// Hashable identity of a present (non-missing) cell value.
///
/// Numeric values compare bit-exactly after folding `-0.0` into `0.0`, so
/// integer identifiers read as floats behave like the integers they are.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CategoryKey {
    Numeric(u64),
    Text(String),
}

impl CategoryKey {
    fn numeric(value: f64) -> Self {
        let value = if value == 0.0 { 0.0 } else { value };
        CategoryKey::Numeric(value.to_bits())
    }
}

/// Single named column of a [`Frame`](super::Frame).
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Numeric(Array1<f64>),
    Text(Vec<Option<String>>),
}

impl Column {
    /// Create a numeric column.
    pub fn numeric(values: impl Into<Array1<f64>>) -> Self {
        Column::Numeric(values.into())
    }

    /// Create a text column. `None` entries are missing.
    pub fn text<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Column::Text(values.into_iter().map(|v| v.map(Into::into)).collect())
    }

    /// Column of `len` missing values.
    pub fn missing(kind: ColumnKind, len: usize) -> Self {
        match kind {
            ColumnKind::Numeric => Column::Numeric(Array1::from_elem(len, f64::NAN)),
            ColumnKind::Text => Column::Text(vec![None; len]),
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(values) => values.len(),
            Column::Text(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            Column::Numeric(_) => ColumnKind::Numeric,
            Column::Text(_) => ColumnKind::Text,
        }
    }

    /// Numeric values, or `None` for a text column.
    pub fn as_numeric(&self) -> Option<ArrayView1<'_, f64>> {
        match self {
            Column::Numeric(values) => Some(values.view()),
            Column::Text(_) => None,
        }
    }

    #[inline]
    pub fn is_missing(&self, row: usize) -> bool {
        match self {
            Column::Numeric(values) => values[row].is_nan(),
            Column::Text(values) => values[row].is_none(),
        }
    }

    /// Returns true if any row is missing.
    pub fn has_missing(&self) -> bool {
        match self {
            Column::Numeric(values) => values.iter().any(|v| v.is_nan()),
            Column::Text(values) => values.iter().any(Option::is_none),
        }
    }

    /// Returns true if no row has a value. Such a column carries no evidence
    /// of its kind.
    pub fn is_all_missing(&self) -> bool {
        match self {
            Column::Numeric(values) => values.iter().all(|v| v.is_nan()),
            Column::Text(values) => values.iter().all(Option::is_none),
        }
    }

    /// Identity of the value at `row`, `None` if it is missing.
    pub fn key(&self, row: usize) -> Option<CategoryKey> {
        match self {
            Column::Numeric(values) => {
                let v = values[row];
                (!v.is_nan()).then(|| CategoryKey::numeric(v))
            }
            Column::Text(values) => values[row].clone().map(CategoryKey::Text),
        }
    }

    /// Render the value at `row` for delimited output. Missing is empty.
    pub fn cell(&self, row: usize) -> String {
        match self {
            Column::Numeric(values) => {
                let v = values[row];
                if v.is_nan() { String::new() } else { v.to_string() }
            }
            Column::Text(values) => values[row].clone().unwrap_or_default(),
        }
    }

    /// Gather rows by position.
    pub fn take(&self, rows: &[usize]) -> Column {
        match self {
            Column::Numeric(values) => Column::Numeric(rows.iter().map(|&r| values[r]).collect()),
            Column::Text(values) => Column::Text(rows.iter().map(|&r| values[r].clone()).collect()),
        }
    }

    /// Append `other` below `self`.
    ///
    /// When the kinds differ, an all-missing side takes the kind of the
    /// other. Returns `false` if both sides have values of different kinds.
    pub(crate) fn extend_from(&mut self, other: &Column) -> bool {
        if self.kind() != other.kind() {
            if self.is_all_missing() {
                *self = Column::missing(other.kind(), self.len());
            } else if other.is_all_missing() {
                let padding = Column::missing(self.kind(), other.len());
                return self.extend_from(&padding);
            } else {
                return false;
            }
        }
        match (self, other) {
            (Column::Numeric(values), Column::Numeric(more)) => {
                let mut joined = values.to_vec();
                joined.extend(more.iter().copied());
                *values = Array1::from(joined);
                true
            }
            (Column::Text(values), Column::Text(more)) => {
                values.extend(more.iter().cloned());
                true
            }
            _ => false,
        }
    }
}

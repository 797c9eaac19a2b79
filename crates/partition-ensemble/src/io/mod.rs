//! Delimited-file loading for [`Frame`]s.
//!
//! Each column's kind is inferred: a column is numeric when every non-empty
//! cell parses as `f64` (empty cells become `NaN`), otherwise it is text
//! (empty cells become `None`).
//!
//! A header whose first field is empty marks an index column, as written by
//! dataframe libraries; its cells are parsed as the frame's row labels.

mod error;

pub use error::FrameLoadError;

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use ndarray::Array1;

use crate::frame::{Column, Frame};

/// Load a delimited file with a header row into a [`Frame`].
pub fn read_frame(path: impl AsRef<Path>, delimiter: u8) -> Result<Frame, FrameLoadError> {
    let file = File::open(path.as_ref())?;
    read_frame_from(file, delimiter)
}

/// Load delimited data with a header row from any reader.
pub fn read_frame_from<R: Read>(reader: R, delimiter: u8) -> Result<Frame, FrameLoadError> {
    let mut rdr = ReaderBuilder::new().delimiter(delimiter).from_reader(reader);
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for record in rdr.records() {
        let record = record?;
        for (column, value) in cells.iter_mut().zip(record.iter()) {
            column.push(value.to_string());
        }
    }

    let has_index = headers.first().is_some_and(|h| h.is_empty());
    let mut builder = Frame::builder();
    let mut columns = headers.into_iter().zip(cells);

    if has_index {
        if let Some((_, labels)) = columns.next() {
            let index = labels
                .iter()
                .enumerate()
                .map(|(row, label)| {
                    label.trim().parse::<usize>().map_err(|_| FrameLoadError::InvalidIndex {
                        row,
                        value: label.clone(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            builder = builder.index(index);
        }
    }

    for (name, values) in columns {
        builder = builder.column(name, infer_column(values));
    }
    Ok(builder.build()?)
}

fn infer_column(values: Vec<String>) -> Column {
    let parsed: Option<Vec<f64>> = values
        .iter()
        .map(|v| {
            let v = v.trim();
            if v.is_empty() { Some(f64::NAN) } else { v.parse::<f64>().ok() }
        })
        .collect();

    match parsed {
        Some(numbers) => Column::Numeric(Array1::from(numbers)),
        None => Column::Text(
            values
                .into_iter()
                .map(|v| if v.is_empty() { None } else { Some(v) })
                .collect(),
        ),
    }
}

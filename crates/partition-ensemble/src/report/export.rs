//! Flat export of per-row predictions.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};

use crate::classify::ClassifiedPartition;
use crate::frame::{Frame, FrameError};

/// Test columns copied into the export by default. `confidence` and
/// `prediction` are always appended after them.
pub const DEFAULT_EXPORT_COLUMNS: [&str; 5] =
    ["orderID", "articleID", "colorCode", "sizeCode", "quantity"];

const CONFIDENCE_COLUMN: &str = "confidence";
const PREDICTION_COLUMN: &str = "prediction";

/// Errors raised while writing or reading an export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error("test row {index} has no prediction")]
    MissingPrediction { index: usize },

    #[error("test row {index} is predicted by more than one partition")]
    DuplicatePrediction { index: usize },

    #[error("prediction for index {index} matches no test row")]
    UnmatchedPrediction { index: usize },

    #[error("test row {index} has non-finite prediction {value}")]
    NonFinitePrediction { index: usize, value: f64 },

    #[error("malformed result record {record}: {reason}")]
    Malformed { record: usize, reason: String },
}

/// Export layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// Test columns to copy, in output order.
    pub columns: Vec<String>,
    pub delimiter: u8,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            columns: DEFAULT_EXPORT_COLUMNS.iter().map(|c| c.to_string()).collect(),
            delimiter: b';',
        }
    }
}

/// Write one line per test row to `path`.
///
/// See [`write_results`].
pub fn dump_results<'a>(
    test: &Frame,
    partitions: impl IntoIterator<Item = &'a ClassifiedPartition>,
    path: impl AsRef<Path>,
    options: &ExportOptions,
) -> Result<(), ExportError> {
    let path = path.as_ref();
    let file = File::create(path)?;
    write_results(file, test, partitions, options)?;
    tracing::info!(path = %path.display(), rows = test.n_rows(), "wrote results");
    Ok(())
}

/// Re-align partition predictions to the test frame by index label and write
/// them, in test row order, after the configured test columns.
///
/// Predictions are written as integers (truncated). Confidence is empty where
/// it is `NaN`.
///
/// # Errors
///
/// An export column missing from `test`, a test row predicted zero or several
/// times, a prediction for an unknown index label, or a non-finite prediction.
pub fn write_results<'a, W: Write>(
    writer: W,
    test: &Frame,
    partitions: impl IntoIterator<Item = &'a ClassifiedPartition>,
    options: &ExportOptions,
) -> Result<(), ExportError> {
    let columns = options
        .columns
        .iter()
        .map(|name| test.column(name))
        .collect::<Result<Vec<_>, FrameError>>()?;

    let rows: HashMap<usize, usize> = test
        .index()
        .iter()
        .enumerate()
        .map(|(row, &label)| (label, row))
        .collect();

    let mut outputs: Vec<Option<(f64, f64)>> = vec![None; test.n_rows()];
    for partition in partitions {
        let target = &partition.target;
        let predictions = target.prediction();
        let confidences = target.confidence();
        for (i, &index) in target.index().iter().enumerate() {
            let row = *rows
                .get(&index)
                .ok_or(ExportError::UnmatchedPrediction { index })?;
            if outputs[row].is_some() {
                return Err(ExportError::DuplicatePrediction { index });
            }
            outputs[row] = Some((predictions[i], confidences[i]));
        }
    }

    let mut writer = WriterBuilder::new()
        .delimiter(options.delimiter)
        .from_writer(writer);

    let mut header: Vec<&str> = options.columns.iter().map(String::as_str).collect();
    header.extend([CONFIDENCE_COLUMN, PREDICTION_COLUMN]);
    writer.write_record(&header)?;

    for (row, output) in outputs.into_iter().enumerate() {
        let index = test.index()[row];
        let (prediction, confidence) = output.ok_or(ExportError::MissingPrediction { index })?;
        if !prediction.is_finite() {
            return Err(ExportError::NonFinitePrediction {
                index,
                value: prediction,
            });
        }

        let mut record: Vec<String> = columns.iter().map(|c| c.cell(row)).collect();
        record.push(if confidence.is_nan() {
            String::new()
        } else {
            confidence.to_string()
        });
        record.push((prediction.trunc() as i64).to_string());
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// One exported line.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    /// Copied test columns, as written.
    pub fields: Vec<String>,
    pub confidence: Option<f64>,
    pub prediction: i64,
}

/// Read an export back.
pub fn read_results(path: impl AsRef<Path>, delimiter: u8) -> Result<Vec<ResultRow>, ExportError> {
    read_results_from(File::open(path)?, delimiter)
}

/// Read an export from any reader. The header row is skipped.
pub fn read_results_from<R: Read>(reader: R, delimiter: u8) -> Result<Vec<ResultRow>, ExportError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (record_no, record) in reader.records().enumerate() {
        let record = record?;
        let malformed = |reason: String| ExportError::Malformed {
            record: record_no,
            reason,
        };

        let n = record.len();
        if n < 2 {
            return Err(malformed(format!("expected at least 2 fields, got {}", n)));
        }
        let confidence = match record.get(n - 2).unwrap_or_default() {
            "" => None,
            value => Some(
                value
                    .parse::<f64>()
                    .map_err(|e| malformed(format!("confidence {:?}: {}", value, e)))?,
            ),
        };
        let value = record.get(n - 1).unwrap_or_default();
        let prediction = value
            .parse::<i64>()
            .map_err(|e| malformed(format!("prediction {:?}: {}", value, e)))?;

        rows.push(ResultRow {
            fields: record.iter().take(n - 2).map(str::to_string).collect(),
            confidence,
            prediction,
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::TargetFrame;
    use ndarray::{array, Array1};

    fn test_frame() -> Frame {
        Frame::builder()
            .numeric("orderID", array![1.0, 1.0, 2.0])
            .text("articleID", [Some("A1"), Some("A2"), None])
            .numeric("quantity", array![1.0, 2.0, 1.0])
            .index([7, 8, 9])
            .build()
            .unwrap()
    }

    fn classified(index: Vec<usize>, prediction: Array1<f64>, confidence: Array1<f64>) -> ClassifiedPartition {
        let n = index.len();
        ClassifiedPartition {
            key: "k".parse().unwrap(),
            name: "karticleID".into(),
            classifier: "fixed".into(),
            target: TargetFrame::new(index, Array1::zeros(n)).with_outputs(prediction, confidence),
        }
    }

    fn options() -> ExportOptions {
        ExportOptions {
            columns: vec!["orderID".into(), "articleID".into(), "quantity".into()],
            ..ExportOptions::default()
        }
    }

    #[test]
    fn realigns_by_index_label() {
        let parts = [
            classified(vec![9, 7], array![1.0, 0.0], array![0.8, f64::NAN]),
            classified(vec![8], array![1.9], array![0.6]),
        ];
        let mut out = Vec::new();
        write_results(&mut out, &test_frame(), &parts, &options()).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "orderID;articleID;quantity;confidence;prediction\n\
             1;A1;1;;0\n\
             1;A2;2;0.6;1\n\
             2;;1;0.8;1\n"
        );
    }

    #[test]
    fn missing_prediction_is_an_error() {
        let parts = [classified(vec![7, 8], array![0.0, 1.0], array![0.5, 0.5])];
        let err = write_results(Vec::new(), &test_frame(), &parts, &options()).unwrap_err();
        assert!(matches!(err, ExportError::MissingPrediction { index: 9 }));
    }

    #[test]
    fn duplicate_prediction_is_an_error() {
        let parts = [
            classified(vec![7, 8, 9], array![0.0, 1.0, 1.0], array![0.5, 0.5, 0.5]),
            classified(vec![8], array![1.0], array![0.5]),
        ];
        let err = write_results(Vec::new(), &test_frame(), &parts, &options()).unwrap_err();
        assert!(matches!(err, ExportError::DuplicatePrediction { index: 8 }));
    }

    #[test]
    fn nan_prediction_is_an_error() {
        let parts = [classified(vec![7, 8, 9], array![0.0, f64::NAN, 1.0], array![0.5, 0.5, 0.5])];
        let err = write_results(Vec::new(), &test_frame(), &parts, &options()).unwrap_err();
        assert!(matches!(err, ExportError::NonFinitePrediction { index: 8, .. }));
    }

    #[test]
    fn missing_export_column_is_an_error() {
        let parts = [classified(vec![7, 8, 9], array![0.0, 1.0, 1.0], array![0.5, 0.5, 0.5])];
        let err = write_results(Vec::new(), &test_frame(), &parts, &ExportOptions::default()).unwrap_err();
        assert!(matches!(err, ExportError::Frame(FrameError::MissingColumn(_))));
    }

    #[test]
    fn reads_back_what_was_written() {
        let parts = [classified(vec![7, 8, 9], array![0.0, 1.0, 1.0], array![f64::NAN, 0.25, 1.0])];
        let mut out = Vec::new();
        write_results(&mut out, &test_frame(), &parts, &options()).unwrap();

        let rows = read_results_from(out.as_slice(), b';').unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].confidence, None);
        assert_eq!(rows[1].confidence, Some(0.25));
        assert_eq!(rows[2].fields, vec!["2", "", "1"]);
        assert_eq!(rows.iter().map(|r| r.prediction).collect::<Vec<_>>(), vec![0, 1, 1]);
    }

    #[test]
    fn malformed_prediction_is_reported() {
        let data = "a;confidence;prediction\nx;0.5;yes\n";
        let err = read_results_from(data.as_bytes(), b';').unwrap_err();
        assert!(matches!(err, ExportError::Malformed { record: 0, .. }));
    }
}

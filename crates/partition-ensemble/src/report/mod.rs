//! Scoring, aggregation, and export of classified partitions.
//!
//! Each partition whose true labels are complete is scored with the
//! configured [`Metric`]. Partitions with any missing label are listed as
//! unscored. The overall score is the weighted sum of partition scores with
//! weight `partition rows / total test rows`; the denominator is the full
//! test size, so unscored partitions lower the total weight rather than being
//! renormalized away.

mod export;

use std::fmt;

use serde::Serialize;

use crate::classify::ClassifiedPartition;
use crate::key::PartitionKey;
use crate::metric::Metric;

pub use export::{
    dump_results, read_results, read_results_from, write_results, ExportError, ExportOptions,
    ResultRow, DEFAULT_EXPORT_COLUMNS,
};

/// Outcome of one partition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartitionScore {
    pub key: PartitionKey,
    pub name: String,
    pub size: usize,
    /// `size / total_rows`.
    pub weight: f64,
    /// `None` when the partition has missing labels.
    pub score: Option<f64>,
}

impl PartitionScore {
    #[inline]
    pub fn is_scored(&self) -> bool {
        self.score.is_some()
    }
}

/// Per-partition scores and the weighted overall score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// Metric name, `precision` by default.
    pub metric: String,
    pub total_rows: usize,
    /// In partition key order.
    pub partitions: Vec<PartitionScore>,
    /// `None` when no partition could be scored.
    pub overall: Option<f64>,
}

impl Report {
    pub fn scored(&self) -> impl Iterator<Item = &PartitionScore> {
        self.partitions.iter().filter(|p| p.is_scored())
    }

    pub fn unscored(&self) -> impl Iterator<Item = &PartitionScore> {
        self.partitions.iter().filter(|p| !p.is_scored())
    }

    /// Sum of the weights that contributed to [`Report::overall`].
    pub fn scored_weight(&self) -> f64 {
        self.scored().map(|p| p.weight).sum()
    }

    /// Report as pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for p in &self.partitions {
            match p.score {
                Some(score) => writeln!(f, "{} {} {} size {}", p.key, self.metric, score, p.size)?,
                None => writeln!(f, "{} no evaluation labels size {}", p.key, p.size)?,
            }
        }
        match self.overall {
            Some(overall) => write!(f, "OVERALL: {}", overall),
            None => write!(f, "Target set has no evaluation labels"),
        }
    }
}

/// Score classified partitions against their true labels.
///
/// `total_rows` is the size of the whole test set.
pub fn report<'a>(
    partitions: impl IntoIterator<Item = &'a ClassifiedPartition>,
    total_rows: usize,
    metric: &dyn Metric,
) -> Report {
    let mut scores = Vec::new();
    let mut overall = 0.0;
    let mut any_scored = false;

    for partition in partitions {
        let target = &partition.target;
        let size = target.n_rows();
        let weight = if total_rows == 0 {
            0.0
        } else {
            size as f64 / total_rows as f64
        };

        let score = if target.has_missing_labels() {
            tracing::warn!(
                key = %partition.key,
                name = %partition.name,
                size,
                "partition has no evaluation labels"
            );
            None
        } else {
            let score = metric.compute(target.label(), target.prediction());
            tracing::info!(
                key = %partition.key,
                name = %partition.name,
                metric = metric.name(),
                score,
                size,
                "scored partition"
            );
            overall += weight * score;
            any_scored = true;
            Some(score)
        };

        scores.push(PartitionScore {
            key: partition.key.clone(),
            name: partition.name.clone(),
            size,
            weight,
            score,
        });
    }

    let overall = any_scored.then_some(overall);
    match overall {
        Some(value) => tracing::info!(metric = metric.name(), overall = value, "overall score"),
        None => tracing::warn!("target set has no evaluation labels"),
    }

    Report {
        metric: metric.name().to_string(),
        total_rows,
        partitions: scores,
        overall,
    }
}

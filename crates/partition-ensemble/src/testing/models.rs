use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::metric::Metric;
use crate::model::{Classifier, ClassifierError, ClassifierFactory};

/// Distinct non-`NaN` targets with their frequencies, ordered by class value.
fn class_frequencies(targets: ArrayView1<'_, f64>) -> Vec<(f64, f64)> {
    let mut classes: Vec<f64> = targets.iter().copied().filter(|t| !t.is_nan()).collect();
    let n = classes.len() as f64;
    classes.sort_by(f64::total_cmp);

    let mut freqs: Vec<(f64, f64)> = Vec::new();
    for class in classes {
        match freqs.last_mut() {
            Some((c, count)) if *c == class => *count += 1.0,
            _ => freqs.push((class, 1.0)),
        }
    }
    for (_, count) in &mut freqs {
        *count /= n;
    }
    freqs
}

/// Most frequent class. Ties go to the smaller class.
fn majority(freqs: &[(f64, f64)]) -> f64 {
    let mut best = freqs[0];
    for &(class, freq) in &freqs[1..] {
        if freq > best.1 {
            best = (class, freq);
        }
    }
    best.0
}

// =============================================================================
// Majority
// =============================================================================

/// Predicts the most frequent training class for every row. Probabilities
/// are the training class frequencies.
#[derive(Debug, Clone, Copy, Default)]
pub struct MajorityFactory;

struct Majority {
    class: f64,
    freqs: Array1<f64>,
}

impl Classifier for Majority {
    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Array1<f64>, ClassifierError> {
        Ok(Array1::from_elem(features.nrows(), self.class))
    }

    fn predict_proba(&self, features: ArrayView2<'_, f64>) -> Result<Array2<f64>, ClassifierError> {
        let n_classes = self.freqs.len();
        Ok(Array2::from_shape_fn((features.nrows(), n_classes), |(_, c)| self.freqs[c]))
    }
}

impl ClassifierFactory for MajorityFactory {
    fn name(&self) -> &str {
        "majority"
    }

    fn fit(
        &self,
        _features: ArrayView2<'_, f64>,
        targets: ArrayView1<'_, f64>,
    ) -> Result<Box<dyn Classifier>, ClassifierError> {
        let freqs = class_frequencies(targets);
        if freqs.is_empty() {
            return Err(ClassifierError::Fit("no labeled training rows".into()));
        }
        Ok(Box::new(Majority {
            class: majority(&freqs),
            freqs: freqs.iter().map(|&(_, f)| f).collect(),
        }))
    }

    fn supports_probabilities(&self) -> bool {
        true
    }
}

// =============================================================================
// Stump
// =============================================================================

/// Binary decision stump on one feature: `x > threshold` predicts
/// `above`, anything else (including `NaN`) predicts `below`. Falls back to
/// the majority class when no split beats it. No probability estimates.
#[derive(Debug, Clone, Copy, Default)]
pub struct StumpFactory;

#[derive(Debug, Clone, Copy)]
struct Stump {
    feature: Option<usize>,
    threshold: f64,
    below: f64,
    above: f64,
}

impl Classifier for Stump {
    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Array1<f64>, ClassifierError> {
        let Some(feature) = self.feature else {
            return Ok(Array1::from_elem(features.nrows(), self.below));
        };
        if feature >= features.ncols() {
            return Err(ClassifierError::Predict(format!(
                "stump splits on feature {}, input has {}",
                feature,
                features.ncols()
            )));
        }
        Ok(features
            .column(feature)
            .mapv(|x| if x > self.threshold { self.above } else { self.below }))
    }
}

/// Majority 0/1 class of the selected targets and the number of rows it gets
/// right.
fn side(targets: &[f64]) -> (f64, usize) {
    let ones = targets.iter().filter(|&&t| t > 0.0).count();
    let zeros = targets.len() - ones;
    if ones > zeros {
        (1.0, ones)
    } else {
        (0.0, zeros)
    }
}

impl ClassifierFactory for StumpFactory {
    fn name(&self) -> &str {
        "stump"
    }

    fn fit(
        &self,
        features: ArrayView2<'_, f64>,
        targets: ArrayView1<'_, f64>,
    ) -> Result<Box<dyn Classifier>, ClassifierError> {
        let labeled: Vec<usize> = (0..targets.len()).filter(|&i| !targets[i].is_nan()).collect();
        if labeled.is_empty() {
            return Err(ClassifierError::Fit("no labeled training rows".into()));
        }

        let all: Vec<f64> = labeled.iter().map(|&i| targets[i]).collect();
        let (base, mut best_hits) = side(&all);
        let mut best = Stump {
            feature: None,
            threshold: f64::NAN,
            below: base,
            above: base,
        };

        for feature in 0..features.ncols() {
            let column = features.column(feature);
            let mut thresholds: Vec<f64> = labeled.iter().map(|&i| column[i]).filter(|x| !x.is_nan()).collect();
            thresholds.sort_by(f64::total_cmp);
            thresholds.dedup();

            for &threshold in &thresholds {
                let (above, below): (Vec<usize>, Vec<usize>) =
                    labeled.iter().partition(|&&i| column[i] > threshold);
                let above: Vec<f64> = above.iter().map(|&i| targets[i]).collect();
                let below: Vec<f64> = below.iter().map(|&i| targets[i]).collect();
                let (above_class, above_hits) = side(&above);
                let (below_class, below_hits) = side(&below);
                if above_hits + below_hits > best_hits {
                    best_hits = above_hits + below_hits;
                    best = Stump {
                        feature: Some(feature),
                        threshold,
                        below: below_class,
                        above: above_class,
                    };
                }
            }
        }
        Ok(Box::new(best))
    }
}

// =============================================================================
// Metrics
// =============================================================================

/// Fraction of rows where the prediction equals the truth.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchRate;

impl Metric for MatchRate {
    fn compute(&self, truth: ArrayView1<'_, f64>, predictions: ArrayView1<'_, f64>) -> f64 {
        if truth.is_empty() {
            return 0.0;
        }
        let hits = truth.iter().zip(predictions.iter()).filter(|(t, p)| t == p).count();
        hits as f64 / truth.len() as f64
    }

    fn name(&self) -> &str {
        "match_rate"
    }
}

/// Binary precision: true positives over predicted positives, with any value
/// above zero counted as positive. `0.0` when nothing is predicted positive.
#[derive(Debug, Clone, Copy, Default)]
pub struct Precision;

impl Metric for Precision {
    fn compute(&self, truth: ArrayView1<'_, f64>, predictions: ArrayView1<'_, f64>) -> f64 {
        let mut predicted = 0usize;
        let mut correct = 0usize;
        for (&t, &p) in truth.iter().zip(predictions.iter()) {
            if p > 0.0 {
                predicted += 1;
                if t > 0.0 {
                    correct += 1;
                }
            }
        }
        if predicted == 0 {
            0.0
        } else {
            correct as f64 / predicted as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn majority_predicts_most_frequent_class() {
        let x = Array2::<f64>::zeros((5, 1));
        let model = MajorityFactory
            .fit(x.view(), array![0.0, 1.0, 1.0, f64::NAN, 1.0].view())
            .unwrap();
        assert_eq!(model.predict(x.view()).unwrap().to_vec(), vec![1.0; 5]);

        let proba = model.predict_proba(x.view()).unwrap();
        assert_eq!(proba.shape(), &[5, 2]);
        assert_abs_diff_eq!(proba[[0, 0]], 0.25);
        assert_abs_diff_eq!(proba[[0, 1]], 0.75);
    }

    #[test]
    fn majority_needs_labels() {
        let x = Array2::<f64>::zeros((2, 0));
        let err = MajorityFactory.fit(x.view(), array![f64::NAN, f64::NAN].view());
        assert!(matches!(err, Err(ClassifierError::Fit(_))));
    }

    #[test]
    fn stump_finds_separating_threshold() {
        let x = array![[1.0, 9.0], [2.0, 1.0], [8.0, 9.0], [9.0, 1.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];
        let model = StumpFactory.fit(x.view(), y.view()).unwrap();
        assert_eq!(model.predict(x.view()).unwrap(), y);
        assert!(model.predict_proba(x.view()).is_err());
        assert!(!StumpFactory.supports_probabilities());
    }

    #[test]
    fn stump_without_features_is_constant() {
        let x = Array2::<f64>::zeros((3, 0));
        let model = StumpFactory.fit(x.view(), array![1.0, 1.0, 0.0].view()).unwrap();
        assert_eq!(model.predict(x.view()).unwrap().to_vec(), vec![1.0; 3]);
    }

    #[test]
    fn metrics() {
        let truth = array![1.0, 0.0, 1.0, 0.0];
        let pred = array![1.0, 1.0, 1.0, 0.0];
        assert_abs_diff_eq!(MatchRate.compute(truth.view(), pred.view()), 0.75);
        assert_abs_diff_eq!(Precision.compute(truth.view(), pred.view()), 2.0 / 3.0);
        assert_eq!(Precision.name(), "precision");
        assert_eq!(Precision.compute(truth.view(), array![0.0, 0.0, 0.0, 0.0].view()), 0.0);
    }
}

//! Classification metrics.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Metrics for evaluating classification models on class indices.
pub struct Metrics;

impl Metrics {
    /// Fraction of predictions equal to the ground truth.
    ///
    /// # Arguments
    ///
    /// * `y_true` - Ground truth class indices
    /// * `y_pred` - Predicted class indices
    ///
    /// # Returns
    ///
    /// Accuracy in `[0, 1]`; `0.0` for empty input.
    pub fn accuracy(y_true: &[usize], y_pred: &[usize]) -> f64 {
        assert_eq!(
            y_true.len(),
            y_pred.len(),
            "Arrays must have the same length"
        );

        if y_true.is_empty() {
            return 0.0;
        }

        let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
        correct as f64 / y_true.len() as f64
    }

    /// Precision for `pos_label`: TP / (TP + FP).
    ///
    /// Returns `0.0` when nothing was predicted as `pos_label`.
    pub fn precision(y_true: &[usize], y_pred: &[usize], pos_label: usize) -> f64 {
        let counts = Confusion::for_label(y_true, y_pred, pos_label);
        ratio(counts.tp, counts.tp + counts.fp)
    }

    /// Recall for `pos_label`: TP / (TP + FN).
    ///
    /// Returns `0.0` when `pos_label` never occurs in `y_true`.
    pub fn recall(y_true: &[usize], y_pred: &[usize], pos_label: usize) -> f64 {
        let counts = Confusion::for_label(y_true, y_pred, pos_label);
        ratio(counts.tp, counts.tp + counts.fn_)
    }

    /// Harmonic mean of precision and recall for `pos_label`.
    pub fn f1(y_true: &[usize], y_pred: &[usize], pos_label: usize) -> f64 {
        let p = Self::precision(y_true, y_pred, pos_label);
        let r = Self::recall(y_true, y_pred, pos_label);
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }
}

struct Confusion {
    tp: usize,
    fp: usize,
    fn_: usize,
}

impl Confusion {
    fn for_label(y_true: &[usize], y_pred: &[usize], pos_label: usize) -> Self {
        assert_eq!(
            y_true.len(),
            y_pred.len(),
            "Arrays must have the same length"
        );
        let mut counts = Confusion { tp: 0, fp: 0, fn_: 0 };
        for (&t, &p) in y_true.iter().zip(y_pred) {
            match (t == pos_label, p == pos_label) {
                (true, true) => counts.tp += 1,
                (false, true) => counts.fp += 1,
                (true, false) => counts.fn_ += 1,
                (false, false) => {}
            }
        }
        counts
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Per-class scores.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassScores {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Evaluation summary stored with a trained model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub accuracy: f64,
    /// Label treated as the positive class for the headline scores.
    pub positive_label: String,
    pub precision: f64,
    pub recall: f64,
    pub classes: Vec<ClassScores>,
    pub n_samples: usize,
}

impl ClassificationReport {
    /// Score `y_pred` against `y_true`; `classes[i]` names class index `i`.
    pub fn new(
        y_true: &[usize],
        y_pred: &[usize],
        classes: &[String],
        positive: usize,
    ) -> Self {
        let per_class = classes
            .iter()
            .enumerate()
            .map(|(idx, label)| ClassScores {
                label: label.clone(),
                precision: Metrics::precision(y_true, y_pred, idx),
                recall: Metrics::recall(y_true, y_pred, idx),
                f1: Metrics::f1(y_true, y_pred, idx),
                support: y_true.iter().filter(|&&t| t == idx).count(),
            })
            .collect();

        Self {
            accuracy: Metrics::accuracy(y_true, y_pred),
            positive_label: classes.get(positive).cloned().unwrap_or_default(),
            precision: Metrics::precision(y_true, y_pred, positive),
            recall: Metrics::recall(y_true, y_pred, positive),
            classes: per_class,
            n_samples: y_true.len(),
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|c| c.label.len())
            .max()
            .unwrap_or(0)
            .max("accuracy".len());

        writeln!(
            f,
            "{:>width$}  {:>9}  {:>9}  {:>9}  {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        for c in &self.classes {
            writeln!(
                f,
                "{:>width$}  {:>9.4}  {:>9.4}  {:>9.4}  {:>9}",
                c.label, c.precision, c.recall, c.f1, c.support
            )?;
        }
        writeln!(
            f,
            "{:>width$}  {:>9}  {:>9}  {:>9.4}  {:>9}",
            "accuracy", "", "", self.accuracy, self.n_samples
        )?;
        write!(
            f,
            "positive class {}: precision {:.4}, recall {:.4}",
            self.positive_label, self.precision, self.recall
        )
    }
}

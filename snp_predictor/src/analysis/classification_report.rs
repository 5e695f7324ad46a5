use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    pub true_negative: usize,
    pub false_positive: usize,
    pub false_negative: usize,
    pub true_positive: usize,
}

impl ConfusionMatrix {
    pub fn from_predictions(actual: &[bool], predicted: &[bool]) -> Self {
        let mut cm = ConfusionMatrix::default();
        for (&truth, &pred) in actual.iter().zip(predicted) {
            match (pred, truth) {
                (true, true) => cm.true_positive += 1,
                (true, false) => cm.false_positive += 1,
                (false, true) => cm.false_negative += 1,
                (false, false) => cm.true_negative += 1,
            }
        }
        cm
    }

    pub fn total(&self) -> usize {
        self.true_negative + self.false_positive + self.false_negative + self.true_positive
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

impl ClassMetrics {
    fn new(tp: usize, fp: usize, fn_: usize) -> Self {
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        ClassMetrics { precision, recall, f1, support: tp + fn_ }
    }
}

/// Zero when the denominator is empty (undefined precision/recall).
fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

/// Held-out performance of the binary classifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub accuracy: f64,
    pub benign: ClassMetrics,
    pub pathogenic: ClassMetrics,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
    pub confusion: ConfusionMatrix,
    pub roc_auc: f64,
}

impl ClassificationReport {
    pub fn new(actual: &[bool], predicted: &[bool], roc_auc: f64) -> Self {
        let confusion = ConfusionMatrix::from_predictions(actual, predicted);
        let ConfusionMatrix { true_negative: tn, false_positive: fp, false_negative: fn_, true_positive: tp } =
            confusion;

        let pathogenic = ClassMetrics::new(tp, fp, fn_);
        // benign is the positive class of the mirrored problem
        let benign = ClassMetrics::new(tn, fn_, fp);
        let total = confusion.total();

        let macro_avg = ClassMetrics {
            precision: (benign.precision + pathogenic.precision) / 2.0,
            recall: (benign.recall + pathogenic.recall) / 2.0,
            f1: (benign.f1 + pathogenic.f1) / 2.0,
            support: total,
        };
        let weighted = |f: fn(&ClassMetrics) -> f64| {
            if total == 0 {
                0.0
            } else {
                (f(&benign) * benign.support as f64 + f(&pathogenic) * pathogenic.support as f64) / total as f64
            }
        };
        let weighted_avg = ClassMetrics {
            precision: weighted(|m| m.precision),
            recall: weighted(|m| m.recall),
            f1: weighted(|m| m.f1),
            support: total,
        };

        ClassificationReport {
            accuracy: ratio(tp + tn, total),
            benign,
            pathogenic,
            macro_avg,
            weighted_avg,
            confusion,
            roc_auc,
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>14} {:>10} {:>10} {:>10} {:>10}", "", "precision", "recall", "f1-score", "support")?;
        for (name, m) in [("benign (0)", &self.benign), ("pathogenic (1)", &self.pathogenic)] {
            writeln!(f, "{:>14} {:>10.2} {:>10.2} {:>10.2} {:>10}", name, m.precision, m.recall, m.f1, m.support)?;
        }
        writeln!(f)?;
        writeln!(f, "{:>14} {:>10} {:>10} {:>10.2} {:>10}", "accuracy", "", "", self.accuracy, self.confusion.total())?;
        for (name, m) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(f, "{:>14} {:>10.2} {:>10.2} {:>10.2} {:>10}", name, m.precision, m.recall, m.f1, m.support)?;
        }
        writeln!(f)?;
        writeln!(f, "Confusion matrix (rows = actual, cols = predicted):")?;
        writeln!(f, "  [[{:>8} {:>8}]", self.confusion.true_negative, self.confusion.false_positive)?;
        writeln!(f, "   [{:>8} {:>8}]]", self.confusion.false_negative, self.confusion.true_positive)?;
        write!(f, "ROC AUC: {:.3}", self.roc_auc)
    }
}

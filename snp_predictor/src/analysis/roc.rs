use std::cmp::Ordering;

use tracing::warn;

/// ROC curve points (FPR, TPR) for scores against boolean ground truth.
///
/// Tied scores are stepped through together, so the curve does not depend on
/// the order of equal predictions.
pub fn calculate_roc(actual: &[bool], predicted: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let positive_count = actual.iter().filter(|&&x| x).count();
    let negative_count = actual.len() - positive_count;

    if positive_count == 0 || negative_count == 0 {
        warn!("All instances are in one class, ROC curve is degenerate");
        return (vec![0.0, 1.0], vec![0.0, 1.0]);
    }

    // Pair predictions with actual labels and sort by prediction (descending)
    let mut paired_data: Vec<(f64, bool)> = predicted.iter().cloned().zip(actual.iter().cloned()).collect();
    paired_data.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

    let mut tpr_values = vec![0.0];
    let mut fpr_values = vec![0.0];

    let mut tp = 0;
    let mut fp = 0;

    for (i, &(score, is_positive)) in paired_data.iter().enumerate() {
        if is_positive {
            tp += 1;
        } else {
            fp += 1;
        }

        let next_is_tie = paired_data.get(i + 1).is_some_and(|next| next.0 == score);
        if next_is_tie {
            continue;
        }

        tpr_values.push(tp as f64 / positive_count as f64);
        fpr_values.push(fp as f64 / negative_count as f64);
    }

    (fpr_values, tpr_values)
}

/// Calculate Area Under ROC Curve using trapezoidal rule
pub fn calculate_auc(fpr: &[f64], tpr: &[f64]) -> f64 {
    if fpr.len() != tpr.len() || fpr.len() < 2 {
        return 0.0;
    }

    let mut auc = 0.0;
    for i in 1..fpr.len() {
        let width = fpr[i] - fpr[i - 1];
        let height = (tpr[i] + tpr[i - 1]) / 2.0;
        auc += width * height;
    }

    auc
}

pub fn roc_auc(actual: &[bool], predicted: &[f64]) -> f64 {
    let (fpr, tpr) = calculate_roc(actual, predicted);
    calculate_auc(&fpr, &tpr)
}

pub mod classification_report;
pub mod roc;

pub use classification_report::{ClassMetrics, ClassificationReport, ConfusionMatrix};

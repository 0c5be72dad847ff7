// ============================================================
// Layer 6 — Classification Metrics & Validation Logger
// ============================================================
// Per-batch scores for the binary caller (positive class = 1):
//
//   accuracy  = correct / total
//   precision = TP / (TP + FP)
//   recall    = TP / (TP + FN)
//
// A zero denominator scores 0.0, the same default scikit-learn
// uses for ill-defined precision/recall.
//
// The ValidationLogger appends one CSV row per validation round
// to <model_dir>/validation.csv:
//
//   epoch,step,loss,accuracy,precision,recall,epoch_best_accuracy
//   1,100,0.412300,0.861000,0.870100,0.845500,0.861000
//   ...
//
// Reference: Rust Book §12 (I/O and File Handling)

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::domain::error::TrainError;
use crate::domain::state::{BatchScore, ValidationSummary};

const POSITIVE: i64 = 1;

pub fn accuracy(labels: &[i64], predicted: &[i64]) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    let correct = labels.iter().zip(predicted).filter(|(l, p)| l == p).count();
    correct as f64 / labels.len() as f64
}

pub fn precision(labels: &[i64], predicted: &[i64]) -> f64 {
    let (tp, fp, _) = confusion(labels, predicted);
    ratio(tp, tp + fp)
}

pub fn recall(labels: &[i64], predicted: &[i64]) -> f64 {
    let (tp, _, fn_) = confusion(labels, predicted);
    ratio(tp, tp + fn_)
}

/// (true positives, false positives, false negatives)
fn confusion(labels: &[i64], predicted: &[i64]) -> (usize, usize, usize) {
    labels.iter().zip(predicted).fold((0, 0, 0), |(tp, fp, fn_), (&l, &p)| {
        match (l == POSITIVE, p == POSITIVE) {
            (true, true) => (tp + 1, fp, fn_),
            (false, true) => (tp, fp + 1, fn_),
            (true, false) => (tp, fp, fn_ + 1),
            (false, false) => (tp, fp, fn_),
        }
    })
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

impl BatchScore {
    pub fn from_predictions(loss: f64, labels: &[i64], predicted: &[i64]) -> Self {
        Self {
            loss,
            accuracy: accuracy(labels, predicted),
            precision: precision(labels, predicted),
            recall: recall(labels, predicted),
        }
    }
}

// ─── ValidationLogger ─────────────────────────────────────────────────────────
pub struct ValidationLogger {
    csv_path: PathBuf,
}

impl ValidationLogger {
    /// Start a fresh `validation.csv` in `dir`, replacing one left by an
    /// earlier run.
    pub fn create(dir: &Path) -> Result<Self, TrainError> {
        let csv_path = dir.join("validation.csv");
        let mut f = fs::File::create(&csv_path)
            .map_err(|e| TrainError::persistence(&csv_path, e))?;
        writeln!(f, "epoch,step,loss,accuracy,precision,recall,epoch_best_accuracy")
            .map_err(|e| TrainError::persistence(&csv_path, e))?;
        tracing::debug!("Created validation log '{}'", csv_path.display());
        Ok(Self { csv_path })
    }

    /// Append one validation round. `epoch` is 1-based, as printed.
    pub fn log(
        &self,
        epoch: usize,
        step: usize,
        summary: &ValidationSummary,
        epoch_best: f64,
    ) -> Result<(), TrainError> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .map_err(|e| TrainError::persistence(&self.csv_path, e))?;

        writeln!(
            f,
            "{},{},{:.6},{:.6},{:.6},{:.6},{:.6}",
            epoch,
            step,
            summary.mean_loss,
            summary.mean_accuracy,
            summary.mean_precision,
            summary.mean_recall,
            epoch_best,
        )
        .map_err(|e| TrainError::persistence(&self.csv_path, e))
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

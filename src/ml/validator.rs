// ============================================================
// Layer 5 — Validation Scorer
// ============================================================
// One full pass over the validation stream with an eval-mode
// snapshot of the classifier. Each batch contributes a loss,
// accuracy, precision and recall; the summary is their plain
// mean over batches (a short final batch counts the same as a
// full one).

use crate::domain::error::TrainError;
use crate::domain::state::ValidationSummary;
use crate::domain::traits::{BatchSource, Evaluator};

pub struct ValidationScorer<'a, V> {
    source: &'a V,
}

impl<'a, V: BatchSource> ValidationScorer<'a, V> {
    pub fn new(source: &'a V) -> Self {
        Self { source }
    }

    /// Score every validation batch. A pass that yields no batches is a
    /// data error: there is nothing to average.
    pub fn score<E>(&self, evaluator: &E) -> Result<ValidationSummary, TrainError>
    where
        E: Evaluator<Batch = V::Batch>,
    {
        let (mut loss, mut acc, mut prec, mut rec) = (0.0, 0.0, 0.0, 0.0);
        let mut batches = 0usize;

        for batch in self.source.iter() {
            let s = evaluator.score(batch)?;
            loss += s.loss;
            acc += s.accuracy;
            prec += s.precision;
            rec += s.recall;
            batches += 1;
        }

        if batches == 0 {
            return Err(TrainError::Data("validation stream yielded no batches".into()));
        }

        let n = batches as f64;
        Ok(ValidationSummary {
            mean_loss: loss / n,
            mean_accuracy: acc / n,
            mean_precision: prec / n,
            mean_recall: rec / n,
            batches,
        })
    }
}

//! Scripted stand-ins for the Burn classifier and data loaders, used by the
//! training loop, validation and checkpoint tests.

use std::cell::Cell;

use crate::domain::error::TrainError;
use crate::domain::state::BatchScore;
use crate::domain::traits::{BatchSource, Evaluator, TrainableClassifier};

/// Yields batch indices `0..n` on every pass.
pub struct CountSource {
    pub batches: usize,
}

impl BatchSource for CountSource {
    type Batch = usize;

    fn num_batches(&self) -> usize {
        self.batches
    }

    fn iter(&self) -> Box<dyn Iterator<Item = usize> + '_> {
        Box::new(0..self.batches)
    }
}

/// Scores batch `i` with `accuracies[i % len]`.
pub struct ScriptedEvaluator {
    accuracies: Vec<f64>,
}

impl ScriptedEvaluator {
    pub fn per_batch(accuracies: Vec<f64>) -> Self {
        Self { accuracies }
    }
}

impl Evaluator for ScriptedEvaluator {
    type Batch = usize;

    fn score(&self, batch: usize) -> Result<BatchScore, TrainError> {
        let accuracy = self.accuracies[batch % self.accuracies.len()];
        Ok(BatchScore { loss: 1.0 - accuracy, accuracy, precision: accuracy, recall: accuracy })
    }
}

/// Every batch of validation round `r` scores `rounds[r]`; once the script
/// runs out the last value repeats.
pub struct ScriptedClassifier {
    rounds: Vec<f64>,
    round: Cell<usize>,
    snapshots: Cell<usize>,
    pub steps: usize,
    pub decays: usize,
    pub fail_at_step: Option<usize>,
}

impl ScriptedClassifier {
    pub fn new(rounds: Vec<f64>) -> Self {
        Self {
            rounds,
            round: Cell::new(0),
            snapshots: Cell::new(0),
            steps: 0,
            decays: 0,
            fail_at_step: None,
        }
    }

    pub fn rounds_run(&self) -> usize {
        self.round.get()
    }

    pub fn snapshots_taken(&self) -> usize {
        self.snapshots.get()
    }
}

impl TrainableClassifier for ScriptedClassifier {
    type Batch = usize;
    type Evaluator = ScriptedEvaluator;

    fn train_step(&mut self, _batch: usize) -> Result<f64, TrainError> {
        self.steps += 1;
        if self.fail_at_step == Some(self.steps) {
            return Err(TrainError::Computation("loss is NaN".into()));
        }
        Ok(0.5)
    }

    fn evaluator(&self) -> ScriptedEvaluator {
        let r = self.round.get();
        self.round.set(r + 1);
        let accuracy = match self.rounds.get(r).or(self.rounds.last()) {
            Some(&acc) => acc,
            None => 0.0,
        };
        ScriptedEvaluator::per_batch(vec![accuracy])
    }

    fn decay_learning_rate(&mut self) {
        self.decays += 1;
    }

    fn learning_rate(&self) -> f64 {
        1e-3 * 0.1f64.powi(self.decays as i32)
    }

    fn state_bytes(&self) -> Result<Vec<u8>, TrainError> {
        self.snapshots.set(self.snapshots.get() + 1);
        Ok(format!("state after {} steps", self.steps).into_bytes())
    }
}

// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The training loop is written against these traits, never
// against Burn types directly:
//
//   BatchSource          — a finite, restartable batch stream
//   TrainableClassifier  — model + optimizer + LR schedule
//   Evaluator            — a frozen, eval-mode view of a model
//
// The Burn implementations live in data::source and ml::learner;
// the training loop tests use scripted fakes.

use crate::domain::error::TrainError;
use crate::domain::state::BatchScore;

/// Dropout and other regularisation layers only act in `Train`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Train,
    Eval,
}

// ─── BatchSource ──────────────────────────────────────────────────────────────
/// A finite stream of batches. Every call to `iter` starts a new full pass.
pub trait BatchSource {
    type Batch;

    /// Number of batches one pass yields.
    fn num_batches(&self) -> usize;

    fn iter(&self) -> Box<dyn Iterator<Item = Self::Batch> + '_>;
}

// ─── Evaluator ────────────────────────────────────────────────────────────────
/// Scores one batch without touching parameters. Implementations run the
/// model in `Mode::Eval`, so scoring the same batch twice agrees.
pub trait Evaluator {
    type Batch;

    fn score(&self, batch: Self::Batch) -> Result<BatchScore, TrainError>;
}

// ─── TrainableClassifier ──────────────────────────────────────────────────────
pub trait TrainableClassifier {
    type Batch;
    type Evaluator: Evaluator;

    /// Forward in `Mode::Train`, loss, backward and one optimizer update.
    /// Returns the batch loss.
    fn train_step(&mut self, batch: Self::Batch) -> Result<f64, TrainError>;

    /// Snapshot the current parameters in `Mode::Eval` for a validation round.
    fn evaluator(&self) -> Self::Evaluator;

    /// Advance the learning-rate schedule by one epoch.
    fn decay_learning_rate(&mut self);

    fn learning_rate(&self) -> f64;

    /// Serialised parameter state, written verbatim as a checkpoint.
    fn state_bytes(&self) -> Result<Vec<u8>, TrainError>;
}

// ============================================================
// Layer 3 — Training State
// ============================================================
// The two accuracy counters that drive checkpointing and early
// stopping, owned by the training loop and lent to the
// checkpoint manager:
//
//   EpochState.best_accuracy — best validation accuracy seen in
//                              the current epoch, starts at 0
//   RunState.best_accuracy   — best epoch-level accuracy of the
//                              whole run, starts at 0
//
// Both only ever move up.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochState {
    pub epoch_index: usize,
    best_accuracy: f64,
}

impl EpochState {
    pub fn new(epoch_index: usize) -> Self {
        Self { epoch_index, best_accuracy: 0.0 }
    }

    pub fn best_accuracy(&self) -> f64 {
        self.best_accuracy
    }

    /// Raise the epoch best if `accuracy` beats it. Returns whether it did.
    pub fn observe(&mut self, accuracy: f64) -> bool {
        if accuracy > self.best_accuracy {
            self.best_accuracy = accuracy;
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunState {
    best_accuracy: f64,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn best_accuracy(&self) -> f64 {
        self.best_accuracy
    }

    /// Fold a finished epoch into the run. Returns true only on strict
    /// improvement; a tie leaves the run best unchanged and counts as no
    /// improvement.
    pub fn absorb(&mut self, epoch: &EpochState) -> bool {
        if epoch.best_accuracy() > self.best_accuracy {
            self.best_accuracy = epoch.best_accuracy();
            true
        } else {
            false
        }
    }
}

/// Scores for a single validation batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchScore {
    pub loss: f64,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
}

/// Unweighted per-batch means over one full validation pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationSummary {
    pub mean_loss: f64,
    pub mean_accuracy: f64,
    pub mean_precision: f64,
    pub mean_recall: f64,
    pub batches: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    /// All `max_epoch_num` epochs ran.
    Completed,
    /// An epoch past the minimum failed to beat the run best.
    StoppedEarly,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunOutcome {
    pub terminal: Terminal,
    pub epochs_run: usize,
    pub best_accuracy: f64,
}

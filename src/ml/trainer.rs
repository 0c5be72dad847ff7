// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Drives a whole run:
//
//   for epoch in 0..max_epoch_num
//     epoch best ← 0
//     for step in 1..=batches          (one full training pass)
//       train_step(batch)
//       every step_interval steps:
//         validate over the whole validation stream
//         checkpoint gate (may raise epoch best / write file)
//         progress line, flushed
//     decay learning rate
//     epoch best > run best  → run best ← epoch best, continue
//     else epoch+1 >= min    → STOPPED_EARLY
//     else                   → continue
//   → COMPLETED
//
// Ties at the end of an epoch count as no improvement. The loop
// is generic over the domain traits so the same code runs the
// Burn classifier and the scripted fakes in the tests below.

use std::{
    cell::RefCell,
    io::{self, Write},
    time::Instant,
};

use crate::domain::error::TrainError;
use crate::domain::state::{EpochState, RunOutcome, RunState, Terminal};
use crate::domain::traits::{BatchSource, Evaluator, TrainableClassifier};
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::metrics::ValidationLogger;
use crate::ml::validator::ValidationScorer;

#[derive(Debug, Clone, Copy)]
pub struct LoopConfig {
    pub max_epoch_num: usize,
    pub min_epoch_num: usize,
    pub step_interval: usize,
}

/// End-of-epoch decision. Folds the epoch into the run and returns true when
/// the run should stop: no strict improvement and at least `min_epoch_num`
/// epochs done.
pub fn should_stop(run: &mut RunState, epoch: &EpochState, min_epoch_num: usize) -> bool {
    if run.absorb(epoch) {
        false
    } else {
        epoch.epoch_index + 1 >= min_epoch_num
    }
}

/// Label used in persistence errors raised while writing progress lines.
const PROGRESS_SINK: &str = "<progress output>";

pub struct TrainingOrchestrator<'a> {
    cfg: LoopConfig,
    checkpoints: &'a CheckpointManager,
    logger: Option<&'a ValidationLogger>,
    progress: RefCell<Box<dyn Write + 'a>>,
}

impl<'a> TrainingOrchestrator<'a> {
    /// Progress lines go to stdout unless `with_progress` replaces it.
    pub fn new(cfg: LoopConfig, checkpoints: &'a CheckpointManager) -> Self {
        Self {
            cfg,
            checkpoints,
            logger: None,
            progress: RefCell::new(Box::new(io::stdout())),
        }
    }

    pub fn with_logger(mut self, logger: &'a ValidationLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_progress(mut self, sink: impl Write + 'a) -> Self {
        self.progress = RefCell::new(Box::new(sink));
        self
    }

    /// Write one line and flush. A failing sink aborts the run.
    fn report(&self, line: &str) -> Result<(), TrainError> {
        let mut out = self.progress.borrow_mut();
        writeln!(out, "{line}")
            .and_then(|_| out.flush())
            .map_err(|e| TrainError::persistence(PROGRESS_SINK, e))
    }

    pub fn run<C, T, V>(
        &self,
        classifier: &mut C,
        train: &T,
        valid: &V,
    ) -> Result<RunOutcome, TrainError>
    where
        C: TrainableClassifier,
        T: BatchSource<Batch = C::Batch>,
        V: BatchSource<Batch = <C::Evaluator as Evaluator>::Batch>,
    {
        let cfg = self.cfg;
        if cfg.step_interval == 0 {
            return Err(TrainError::Configuration("step_interval must be at least 1".into()));
        }

        let total_step = train.num_batches();
        let scorer = ValidationScorer::new(valid);
        let mut run = RunState::new();
        let mut round_start = Instant::now();

        self.report(&format!("total_step: {total_step}"))?;

        for epoch_index in 0..cfg.max_epoch_num {
            let mut epoch = EpochState::new(epoch_index);
            let mut loss_sum = 0.0;
            let mut steps = 0usize;

            for (i, batch) in train.iter().enumerate() {
                let step = i + 1;
                loss_sum += classifier.train_step(batch)?;
                steps += 1;

                if step % cfg.step_interval != 0 {
                    continue;
                }

                let summary = scorer.score(&classifier.evaluator())?;
                let decision = self.checkpoints.record_round(
                    summary.mean_accuracy,
                    &mut epoch,
                    &run,
                    &*classifier,
                )?;
                tracing::debug!("epoch {} step {}: {:?}", epoch_index, step, decision);

                if let Some(logger) = self.logger {
                    logger.log(epoch_index + 1, step, &summary, epoch.best_accuracy())?;
                }

                self.report(&format!(
                    "Epoch [{}/{}], Step [{}/{}], ValidSet Loss: {:.4}, \
                     Accuracy: {:.4}, Precision: {:.4}, Recall: {:.4}, \
                     curr_epoch_best_accuracy: {:.4}, Time: {:.2}s",
                    epoch_index + 1,
                    cfg.max_epoch_num,
                    step,
                    total_step,
                    summary.mean_loss,
                    summary.mean_accuracy,
                    summary.mean_precision,
                    summary.mean_recall,
                    epoch.best_accuracy(),
                    round_start.elapsed().as_secs_f64(),
                ))?;
                round_start = Instant::now();
            }

            classifier.decay_learning_rate();
            tracing::debug!(
                "epoch {} done: mean train loss {:.4}, epoch best {:.4}, next lr {:e}",
                epoch_index,
                if steps > 0 { loss_sum / steps as f64 } else { f64::NAN },
                epoch.best_accuracy(),
                classifier.learning_rate(),
            );

            if should_stop(&mut run, &epoch, cfg.min_epoch_num) {
                self.report(&format!("best accuracy: {}, early stop!", run.best_accuracy()))?;
                return Ok(RunOutcome {
                    terminal: Terminal::StoppedEarly,
                    epochs_run: epoch_index + 1,
                    best_accuracy: run.best_accuracy(),
                });
            }
        }

        Ok(RunOutcome {
            terminal: Terminal::Completed,
            epochs_run: cfg.max_epoch_num,
            best_accuracy: run.best_accuracy(),
        })
    }
}

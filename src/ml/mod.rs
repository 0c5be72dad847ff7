// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Everything that touches Burn tensors, modules or optimizers
// lives here or in data::batcher / data::source. The training
// loop itself only sees the domain traits, so it runs the same
// against the Burn classifier and against scripted fakes.
//
//   model.rs     — EncoderClassifier: sequence and signal
//                  encoder branches, mean pooling, linear head
//   learner.rs   — BurnClassifier: train step, eval view,
//                  weighted cross-entropy, record snapshots
//   scheduler.rs — StepDecay learning-rate schedule
//   validator.rs — mean loss/accuracy/precision/recall over
//                  one validation pass
//   trainer.rs   — epochs, validation cadence, checkpoint
//                  feeding, early stopping
//   device.rs    — backend selection (wgpu or ndarray)
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Vaswani et al. (2017) Attention Is All You Need

/// Transformer encoder classifier architecture
pub mod model;

/// Burn-backed implementation of the classifier traits
pub mod learner;

/// Step-decay learning-rate schedule
pub mod scheduler;

/// Validation pass averaging
pub mod validator;

/// Training loop with periodic validation and early stopping
pub mod trainer;

/// Compute device / backend selection
pub mod device;

#[cfg(test)]
pub(crate) mod fakes;

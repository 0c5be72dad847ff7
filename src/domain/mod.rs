// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits that describe a training
// run without depending on Burn:
//
//   feature.rs — one parsed sample from a feature file
//   state.rs   — epoch/run accuracy bookkeeping, validation
//                summaries and the run's terminal outcome
//   traits.rs  — the seams the training loop is written against
//                (batch sources, trainable classifiers, evaluators)
//   error.rs   — the error taxonomy shared by every layer below
//                the CLI
//
// Nothing here touches tensors or the file system, so the
// training loop can be tested with scripted fakes.

/// A labelled signal feature record
pub mod feature;

/// Epoch / run state and validation summaries
pub mod state;

/// Core abstractions the training loop is generic over
pub mod traits;

/// Error taxonomy
pub mod error;

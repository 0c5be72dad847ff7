// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns that touch the file system or score
// predictions:
//
//   checkpoint.rs — model directory setup, stale checkpoint
//                   purge, the per-round checkpoint gate and
//                   train_config.json
//
//   metrics.rs    — accuracy / precision / recall for the
//                   positive class, and the per-round
//                   validation.csv logger
//
// Reference: Rust Book §9 (Error Handling)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint directory management and write policy
pub mod checkpoint;

/// Classification metrics and validation CSV logger
pub mod metrics;

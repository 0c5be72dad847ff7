// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers to accomplish one training run.
//
// Rules for this layer:
//   - No model math or tensor code here
//   - No argument parsing here (that's Layer 1)
//   - File access only through Layer 4 (data) and Layer 6 (infra)
//   - Only workflow coordination and device dispatch
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// The training workflow
pub mod train_use_case;

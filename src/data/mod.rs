// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Feature file to device-ready batches:
//
//   feature file (.tsv)
//       │
//       ▼
//   FeatureFileLoader    → parses and validates every line
//       │
//       ▼
//   SignalFeatureDataset → implements Burn's Dataset trait
//       │
//       ▼
//   FeatureBatcher       → stacks samples into tensors
//       │
//       ▼
//   LoaderSource         → shuffled DataLoader behind BatchSource
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Parses tab-separated signal feature files
pub mod loader;

/// Implements Burn's Dataset trait for parsed samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Restartable, shuffled batch stream for the training loop
pub mod source;

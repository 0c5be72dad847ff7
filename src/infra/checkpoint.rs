// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Owns the model directory for one training run.
//
// At startup:
//   - the directory is made absolute and created if missing
//   - checkpoint files left by an earlier run are deleted, so
//     every epochN.ckpt present afterwards belongs to this run
//
// After every validation round:
//   1. if the round's mean accuracy beats the epoch best, the
//      epoch best is raised
//   2. the model is then written only if the new epoch best is
//      above (run best - 0.001)
//
// File naming convention:
//   <model_dir>/
//     epoch0.ckpt          ← last qualifying round of epoch 0
//     epoch1.ckpt
//     ...
//     train_config.json    ← hyper-parameters of this run
//     validation.csv       ← written by ValidationLogger
//
// A later qualifying round in the same epoch overwrites that
// epoch's file. Every file system failure is returned as
// TrainError::Persistence; nothing is retried.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use std::{
    fs,
    io,
    path::{Path, PathBuf},
};

use serde::Serialize;

use crate::domain::error::TrainError;
use crate::domain::state::{EpochState, RunState};
use crate::domain::traits::TrainableClassifier;

/// Width of the band below the run best in which a new epoch best still
/// earns a checkpoint.
pub const CHECKPOINT_TOLERANCE: f64 = 0.001;

const CONFIG_FILE: &str = "train_config.json";

/// Allow-list for stale files: `epoch<digits>.ckpt` followed by anything.
pub fn is_checkpoint_file(name: &str) -> bool {
    let Some(rest) = name.strip_prefix("epoch") else {
        return false;
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    digits > 0 && rest[digits..].starts_with(".ckpt")
}

/// Whether an epoch best is close enough to the run best to be persisted.
pub fn within_band(epoch_best: f64, run_best: f64) -> bool {
    epoch_best > run_best - CHECKPOINT_TOLERANCE
}

#[derive(Debug, Clone, PartialEq)]
pub enum CheckpointDecision {
    /// Accuracy improved and the model was written here.
    Saved(PathBuf),
    /// Accuracy improved within the epoch but stayed below the band.
    BelowBand,
    /// Accuracy did not beat the epoch best; nothing changed.
    NotImproved,
}

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Normalise `dir`, create it if needed and purge stale checkpoints.
    pub fn prepare(dir: impl AsRef<Path>) -> Result<Self, TrainError> {
        let raw = dir.as_ref();
        let dir = std::path::absolute(raw).map_err(|e| TrainError::persistence(raw, e))?;
        let manager = Self { dir };

        if manager.dir.parent().is_none() {
            tracing::warn!("Model dir is the filesystem root; stale checkpoints are left alone");
            return Ok(manager);
        }

        if manager.dir.is_dir() {
            let removed = manager.purge_stale()?;
            if removed > 0 {
                tracing::info!(
                    "Removed {} stale checkpoint(s) from '{}'",
                    removed,
                    manager.dir.display()
                );
            }
        } else {
            fs::create_dir_all(&manager.dir)
                .map_err(|e| TrainError::persistence(&manager.dir, e))?;
            tracing::debug!("Created model dir '{}'", manager.dir.display());
        }

        Ok(manager)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn checkpoint_path(&self, epoch_index: usize) -> PathBuf {
        self.dir.join(format!("epoch{epoch_index}.ckpt"))
    }

    /// Delete every non-directory entry whose name passes
    /// [`is_checkpoint_file`]. Returns how many were removed.
    fn purge_stale(&self) -> Result<usize, TrainError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| TrainError::persistence(&self.dir, e))?;

        let mut removed = 0;
        for entry in entries {
            let entry = entry.map_err(|e| TrainError::persistence(&self.dir, e))?;
            let path = entry.path();
            let is_dir = entry
                .file_type()
                .map_err(|e| TrainError::persistence(&path, e))?
                .is_dir();
            let matches = entry.file_name().to_str().is_some_and(is_checkpoint_file);

            if matches && !is_dir {
                fs::remove_file(&path).map_err(|e| TrainError::persistence(&path, e))?;
                tracing::debug!("Removed stale checkpoint '{}'", path.display());
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Feed one validation round's mean accuracy through the
    /// improve-then-gate rule, writing the classifier's state if it passes.
    pub fn record_round<C: TrainableClassifier>(
        &self,
        mean_accuracy: f64,
        epoch: &mut EpochState,
        run: &RunState,
        classifier: &C,
    ) -> Result<CheckpointDecision, TrainError> {
        if !epoch.observe(mean_accuracy) {
            return Ok(CheckpointDecision::NotImproved);
        }
        if !within_band(epoch.best_accuracy(), run.best_accuracy()) {
            return Ok(CheckpointDecision::BelowBand);
        }

        let path = self.checkpoint_path(epoch.epoch_index);
        let bytes = classifier.state_bytes()?;
        fs::write(&path, bytes).map_err(|e| TrainError::persistence(&path, e))?;
        tracing::debug!(
            "Saved checkpoint '{}' (epoch best {:.4})",
            path.display(),
            epoch.best_accuracy()
        );
        Ok(CheckpointDecision::Saved(path))
    }

    /// Write the run's configuration next to its checkpoints.
    pub fn save_config<T: Serialize>(&self, cfg: &T) -> Result<(), TrainError> {
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)
            .map_err(|e| TrainError::persistence(&path, io::Error::from(e)))?;
        fs::write(&path, json).map_err(|e| TrainError::persistence(&path, e))?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::fakes::ScriptedClassifier;

    fn names_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn predicate_accepts_only_epoch_checkpoints() {
        for name in ["epoch0.ckpt", "epoch3.ckpt", "epoch10.ckpt", "epoch7.ckpt.bak"] {
            assert!(is_checkpoint_file(name), "{name}");
        }
        for name in [
            "notes.txt",
            "epoch.ckpt",
            "epochX.ckpt",
            "my_epoch3.ckpt",
            "epoch3.pt",
            "train_config.json",
            "validation.csv",
        ] {
            assert!(!is_checkpoint_file(name), "{name}");
        }
    }

    #[test]
    fn prepare_removes_only_stale_checkpoints() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["epoch3.ckpt", "epoch10.ckpt", "notes.txt"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }

        let manager = CheckpointManager::prepare(dir.path()).unwrap();

        assert_eq!(names_in(manager.dir()), vec!["notes.txt".to_string()]);
    }

    #[test]
    fn prepare_creates_missing_nested_dir() {
        let root = tempfile::tempdir().unwrap();
        let target = root.path().join("runs").join("a");

        let manager = CheckpointManager::prepare(&target).unwrap();

        assert!(target.is_dir());
        assert!(manager.dir().is_absolute());
        assert_eq!(manager.checkpoint_path(4), manager.dir().join("epoch4.ckpt"));
    }

    #[test]
    fn prepare_fails_when_path_is_a_file() {
        let root = tempfile::tempdir().unwrap();
        let file = root.path().join("occupied");
        fs::write(&file, b"x").unwrap();

        let err = CheckpointManager::prepare(file.join("models")).err().unwrap();
        assert!(matches!(err, TrainError::Persistence { .. }));
    }

    #[test]
    fn band_gate_uses_exact_tolerance() {
        assert!(within_band(0.8995, 0.9));
        assert!(!within_band(0.899, 0.9));
        assert!(within_band(0.95, 0.9));
        assert!(within_band(0.0001, 0.0));
    }

    #[test]
    fn write_decisions_follow_improve_then_gate() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::prepare(dir.path()).unwrap();
        let classifier = ScriptedClassifier::new(vec![]);

        let mut run = RunState::new();
        let mut best = EpochState::new(0);
        best.observe(0.9);
        run.absorb(&best);

        let mut epoch = EpochState::new(1);
        let rounds = [0.5, 0.6, 0.8995, 0.95, 0.93, 0.95];
        let decisions: Vec<&str> = rounds
            .iter()
            .map(|&acc| {
                match manager.record_round(acc, &mut epoch, &run, &classifier).unwrap() {
                    CheckpointDecision::Saved(_) => "saved",
                    CheckpointDecision::BelowBand => "below",
                    CheckpointDecision::NotImproved => "none",
                }
            })
            .collect();

        assert_eq!(decisions, vec!["below", "below", "saved", "saved", "none", "none"]);
        assert_eq!(epoch.best_accuracy(), 0.95);
        assert_eq!(names_in(dir.path()), vec!["epoch1.ckpt".to_string()]);
        assert_eq!(classifier.snapshots_taken(), 2);
    }

    #[test]
    fn first_round_of_a_run_always_checkpoints() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::prepare(dir.path()).unwrap();
        let classifier = ScriptedClassifier::new(vec![]);

        let decision = manager
            .record_round(0.01, &mut EpochState::new(0), &RunState::new(), &classifier)
            .unwrap();

        let path = manager.checkpoint_path(0);
        assert_eq!(decision, CheckpointDecision::Saved(path.clone()));
        assert!(!fs::read(path).unwrap().is_empty());
    }

    #[test]
    fn config_is_written_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::prepare(dir.path()).unwrap();

        manager.save_config(&serde_json::json!({ "lr": 0.001 })).unwrap();

        let text = fs::read_to_string(dir.path().join(CONFIG_FILE)).unwrap();
        assert!(text.contains("\"lr\": 0.001"));
    }
}
